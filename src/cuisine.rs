use crate::rules::{KeywordRule, RuleTable};

/// 料理ジャンルの検出器
///
/// 抽出器と同じルールテーブルのジャンル別キーワードを使い、
/// 出現キーワード数のスコアリングで判定する。属性抽出と違い
/// 「最初の一致」ではなく最多得点のジャンルが勝つ。
///
/// # Examples
///
/// ```
/// # use flavorcraft_transcribe::cuisine::CuisineDetector;
/// # use flavorcraft_transcribe::rules::RuleTable;
/// let detector = CuisineDetector::new(&RuleTable::default());
/// let cuisine = detector.detect("chicken tikka masala with naan");
/// assert_eq!(cuisine.as_deref(), Some("Indian"));
/// ```
pub struct CuisineDetector {
    cuisines: Vec<KeywordRule>,
}

impl CuisineDetector {
    pub fn new(table: &RuleTable) -> Self {
        Self {
            cuisines: table.cuisines.clone(),
        }
    }

    /// テキストから料理ジャンルを検出する
    ///
    /// 1つもキーワードが出現しなければ None。同点の場合は
    /// テーブルで先に定義されたジャンルが勝つ（決定的）。
    pub fn detect(&self, text: &str) -> Option<String> {
        let text = text.to_lowercase();

        let mut best: Option<(&str, usize)> = None;
        for rule in &self.cuisines {
            let score = rule
                .keywords
                .iter()
                .filter(|keyword| text.contains(keyword.as_str()))
                .count();
            if score == 0 {
                continue;
            }
            log::debug!("ジャンル候補 {}: スコア {}", rule.value, score);
            // 同点では先勝ちにするため、真に大きい場合のみ更新
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((&rule.value, score)),
            }
        }

        best.map(|(value, _)| value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> CuisineDetector {
        CuisineDetector::new(&RuleTable::default())
    }

    #[test]
    fn test_detects_indian() {
        let cuisine = detector().detect("a curry with garam masala and naan");
        assert_eq!(cuisine.as_deref(), Some("Indian"));
    }

    #[test]
    fn test_detects_italian() {
        let cuisine = detector().detect("spaghetti with marinara and parmesan");
        assert_eq!(cuisine.as_deref(), Some("Italian"));
    }

    #[test]
    fn test_highest_score_wins() {
        // Thaiのキーワードが2つ、Chineseが1つ → Thai
        let cuisine = detector().detect("green curry with coconut milk and noodles");
        assert_eq!(cuisine.as_deref(), Some("Thai"));
    }

    #[test]
    fn test_no_keywords_gives_none() {
        assert_eq!(detector().detect("a bowl of plain porridge"), None);
        assert_eq!(detector().detect(""), None);
    }

    #[test]
    fn test_tie_breaks_by_table_order() {
        // "wok" はChinese、"taco" はMexicanで各1点。
        // テーブル定義順 (Chinese が先) で決定的に解決される
        let cuisine = detector().detect("taco night but use the wok");
        assert_eq!(cuisine.as_deref(), Some("Chinese"));
    }

    #[test]
    fn test_detection_is_case_insensitive() {
        let cuisine = detector().detect("PAD THAI with LEMONGRASS");
        assert_eq!(cuisine.as_deref(), Some("Thai"));
    }
}
