use crate::rules::RuleTable;
use crate::types::RecipePreferences;
use anyhow::{Context, Result};
use regex_lite::Regex;

/// 人数として妥当とみなす範囲
const SERVING_RANGE: std::ops::RangeInclusive<u32> = 1..=20;

/// トランスクリプトから調理の好みを抽出する
///
/// ルールテーブル駆動の純粋関数。同じ入力には必ず同じ出力を返し、
/// 内部状態を持たない。マッチングは小文字化したトランスクリプトへの
/// 部分一致で行う。
///
/// # カテゴリ毎のセマンティクス
///
/// - 人数・辛さ・調理時間: 優先度順で最初の一致のみ採用
/// - 食事制限・調理方法・スタイル: 一致した全てを集合へ収集
/// - どのカテゴリも一致がなければ既定値のまま
///
/// # Examples
///
/// ```
/// # use flavorcraft_transcribe::extractor::AttributeExtractor;
/// # use flavorcraft_transcribe::rules::RuleTable;
/// let extractor = AttributeExtractor::new(&RuleTable::default()).unwrap();
/// let prefs = extractor.extract("make this vegan and spicy for 6 people");
/// assert_eq!(prefs.serving_size, 6);
/// ```
pub struct AttributeExtractor {
    serving_patterns: Vec<Regex>,
    rules: RuleTable,
}

impl AttributeExtractor {
    /// ルールテーブルから抽出器を構築
    ///
    /// 正規表現はここで一度だけコンパイルされる。以降の `extract` は
    /// 失敗しない。
    ///
    /// # Errors
    ///
    /// テーブル内の正規表現が不正な場合にエラーを返す。
    pub fn new(table: &RuleTable) -> Result<Self> {
        let mut serving_patterns = Vec::with_capacity(table.serving_patterns.len());
        for pattern in &table.serving_patterns {
            let regex = Regex::new(pattern)
                .with_context(|| format!("人数抽出パターンのコンパイルに失敗: {}", pattern))?;
            serving_patterns.push(regex);
        }

        Ok(Self {
            serving_patterns,
            rules: table.clone(),
        })
    }

    /// トランスクリプトから調理の好みを抽出する
    ///
    /// どのような入力に対しても必ず完全な `RecipePreferences` を返す。
    /// 一致しなかったカテゴリは既定値のまま。
    pub fn extract(&self, transcript: &str) -> RecipePreferences {
        let text = transcript.to_lowercase();
        let mut prefs = RecipePreferences::default();

        if let Some(serving) = self.extract_serving_size(&text) {
            prefs.serving_size = serving;
        }

        for rule in &self.rules.dietary {
            if contains_any(&text, &rule.keywords) {
                log::debug!("食事制限を検出: {:?}", rule.restriction);
                prefs.dietary_restrictions.insert(rule.restriction);
            }
        }

        // 単一値カテゴリはテーブルの並び順＝優先順位で最初の一致のみ
        for rule in &self.rules.spice {
            if contains_any(&text, &rule.keywords) {
                log::debug!("辛さレベルを検出: {:?}", rule.level);
                prefs.spice_level = rule.level;
                break;
            }
        }

        for rule in &self.rules.time {
            if contains_any(&text, &rule.keywords) {
                log::debug!("調理時間の好みを検出: {:?}", rule.preference);
                prefs.cooking_time_preference = rule.preference;
                break;
            }
        }

        for rule in &self.rules.methods {
            if contains_any(&text, &rule.keywords) {
                log::debug!("調理方法を検出: {}", rule.value);
                prefs.cooking_methods.insert(rule.value.clone());
            }
        }

        for rule in &self.rules.styles {
            if contains_any(&text, &rule.keywords) {
                log::debug!("調理スタイルを検出: {}", rule.value);
                prefs.preparation_styles.insert(rule.value.clone());
            }
        }

        prefs
    }

    /// 人数を抽出する
    ///
    /// パターンを先頭から順に試し、1..=20 に収まる最初の値を返す。
    /// 範囲外やパース不能な値はエラーにせず、後続パターンの評価を
    /// 続ける（どれも該当しなければ None = 既定値のまま）。
    fn extract_serving_size(&self, text: &str) -> Option<u32> {
        for regex in &self.serving_patterns {
            let Some(captures) = regex.captures(text) else {
                continue;
            };
            let Some(group) = captures.get(1) else {
                continue;
            };
            let Ok(value) = group.as_str().parse::<u32>() else {
                continue;
            };
            if SERVING_RANGE.contains(&value) {
                log::debug!("人数を検出: {}", value);
                return Some(value);
            }
            log::debug!("人数 {} は範囲外、後続パターンを継続", value);
        }
        None
    }
}

/// いずれかのキーワードが部分一致するか
fn contains_any(text: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|keyword| text.contains(keyword.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DietaryRestriction, SpiceLevel, TimePreference};

    fn extractor() -> AttributeExtractor {
        AttributeExtractor::new(&RuleTable::default()).unwrap()
    }

    #[test]
    fn test_serving_size_extraction() {
        let prefs = extractor().extract("make this for 6 people");
        assert_eq!(prefs.serving_size, 6);
    }

    #[test]
    fn test_serving_size_out_of_range_keeps_default() {
        // 範囲外の人数は既定値に戻る
        let prefs = extractor().extract("serves 25");
        assert_eq!(prefs.serving_size, 4);
    }

    #[test]
    fn test_serving_size_always_in_range() {
        let transcripts = [
            "",
            "serves 0",
            "serves 999",
            "for 100 people",
            "for 20 people",
            "2 servings please",
            "make it for 1",
        ];
        let extractor = extractor();
        for transcript in transcripts {
            let prefs = extractor.extract(transcript);
            assert!(
                (1..=20).contains(&prefs.serving_size),
                "transcript {:?} -> {}",
                transcript,
                prefs.serving_size
            );
        }
    }

    #[test]
    fn test_serving_size_pattern_variants() {
        let extractor = extractor();
        assert_eq!(extractor.extract("give me 3 servings").serving_size, 3);
        assert_eq!(extractor.extract("it serves 8").serving_size, 8);
        assert_eq!(extractor.extract("make it for 2").serving_size, 2);
        assert_eq!(extractor.extract("5 portions").serving_size, 5);
    }

    #[test]
    fn test_spice_priority_mild_wins() {
        // "mild" と "very spicy" の両方を含む場合、
        // 文書化された優先順位 (Mild → ExtraHot → Hot → Medium) で
        // Mild が決定的に勝つ
        let prefs = extractor().extract("keep it mild but my friend wants it very spicy");
        assert_eq!(prefs.spice_level, SpiceLevel::Mild);
    }

    #[test]
    fn test_spice_extra_hot_reachable() {
        // "extra hot" は "hot" にも部分一致するが、ExtraHot が先に
        // 評価されるため正しく ExtraHot になる
        let prefs = extractor().extract("make it extra hot");
        assert_eq!(prefs.spice_level, SpiceLevel::ExtraHot);

        let prefs = extractor().extract("extremely spicy please");
        assert_eq!(prefs.spice_level, SpiceLevel::ExtraHot);
    }

    #[test]
    fn test_spice_hot() {
        let prefs = extractor().extract("i want it spicy");
        assert_eq!(prefs.spice_level, SpiceLevel::Hot);
    }

    #[test]
    fn test_spice_default_medium() {
        let prefs = extractor().extract("just a plain dish");
        assert_eq!(prefs.spice_level, SpiceLevel::Medium);
    }

    #[test]
    fn test_dietary_restrictions_accumulate() {
        let prefs = extractor().extract("vegan and gluten free please");
        assert!(prefs
            .dietary_restrictions
            .contains(&DietaryRestriction::Vegan));
        assert!(prefs
            .dietary_restrictions
            .contains(&DietaryRestriction::GlutenFree));
        assert_eq!(prefs.dietary_restrictions.len(), 2);
    }

    #[test]
    fn test_multi_valued_empty_without_keywords() {
        // キーワードが1つも現れないカテゴリの集合は空のまま
        let prefs = extractor().extract("nothing interesting here");
        assert!(prefs.dietary_restrictions.is_empty());
        assert!(prefs.cooking_methods.is_empty());
        assert!(prefs.preparation_styles.is_empty());
    }

    #[test]
    fn test_cooking_methods_accumulate() {
        let prefs = extractor().extract("grill the chicken and bake the potatoes");
        assert!(prefs.cooking_methods.contains("grilled"));
        assert!(prefs.cooking_methods.contains("baked"));
    }

    #[test]
    fn test_time_preference_quick() {
        let prefs = extractor().extract("something quick for dinner");
        assert_eq!(prefs.cooking_time_preference, TimePreference::Quick);
    }

    #[test]
    fn test_preparation_styles() {
        let prefs = extractor().extract("a simple and healthy meal");
        assert!(prefs.preparation_styles.contains("easy"));
        assert!(prefs.preparation_styles.contains("healthy"));
    }

    #[test]
    fn test_case_insensitive() {
        let prefs = extractor().extract("VEGAN dish, GRILLED, for 6 PEOPLE");
        assert!(prefs
            .dietary_restrictions
            .contains(&DietaryRestriction::Vegan));
        assert!(prefs.cooking_methods.contains("grilled"));
        assert_eq!(prefs.serving_size, 6);
    }

    #[test]
    fn test_idempotence() {
        // 純粋関数であること: 同じ入力は常に同じ出力
        let extractor = extractor();
        let transcript = "vegan stir fry, extra hot, serves 12, make it quick";
        let first = extractor.extract(transcript);
        let second = extractor.extract(transcript);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_transcript_gives_defaults() {
        let prefs = extractor().extract("");
        assert_eq!(prefs, RecipePreferences::default());
    }

    #[test]
    fn test_placeholder_text_extraction() {
        // プレースホルダエンジンの定型文からも既定相当の好みが出る
        let prefs = extractor().extract("make it delicious with good spices for 4 people");
        assert_eq!(prefs.serving_size, 4);
        assert_eq!(prefs.spice_level, SpiceLevel::Medium);
    }
}
