use crate::types::{DietaryRestriction, SpiceLevel, TimePreference};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 汎用のキーワードルール
///
/// `value` はカテゴリ内の値（調理方法名など）、`keywords` は
/// トランスクリプト（小文字化済み）に部分一致させる語のリスト。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KeywordRule {
    pub value: String,
    pub keywords: Vec<String>,
}

/// 食事制限のルール
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DietaryRule {
    pub restriction: DietaryRestriction,
    pub keywords: Vec<String>,
}

/// 辛さレベルのルール
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpiceRule {
    pub level: SpiceLevel,
    pub keywords: Vec<String>,
}

/// 調理時間のルール
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimeRule {
    pub preference: TimePreference,
    pub keywords: Vec<String>,
}

/// 抽出ルールテーブル
///
/// 属性抽出と料理ジャンル検出が共有する、バージョン付きの
/// 設定テーブル。各カテゴリは優先度順のルールリストで、
/// 単一値カテゴリ（辛さ・調理時間）はリストの並び順が
/// そのまま優先順位になる。
///
/// # 優先順位の規約
///
/// - 辛さレベル: Mild → ExtraHot → Hot → Medium。
///   ExtraHot を Hot より先に評価するのは、"extra hot" や
///   "very hot" が "hot" キーワードにも部分一致してしまうため。
/// - 調理時間: Quick → Normal → Slow。
/// - 人数の正規表現は先頭から順に試行し、1..=20 に収まる
///   最初の値を採用する。
///
/// # Examples
///
/// ```
/// # use flavorcraft_transcribe::rules::RuleTable;
/// let table = RuleTable::default();
/// assert_eq!(table.version, 1);
/// assert!(!table.serving_patterns.is_empty());
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RuleTable {
    /// テーブルのバージョン番号
    #[serde(default = "default_version")]
    pub version: u32,

    /// 人数抽出の正規表現（グループ1が数値）
    #[serde(default = "default_serving_patterns")]
    pub serving_patterns: Vec<String>,

    /// 食事制限（全一致を収集）
    #[serde(default = "default_dietary")]
    pub dietary: Vec<DietaryRule>,

    /// 辛さレベル（最初の一致のみ）
    #[serde(default = "default_spice")]
    pub spice: Vec<SpiceRule>,

    /// 調理時間の好み（最初の一致のみ）
    #[serde(default = "default_time")]
    pub time: Vec<TimeRule>,

    /// 調理方法（全一致を収集）
    #[serde(default = "default_methods")]
    pub methods: Vec<KeywordRule>,

    /// 調理スタイル（全一致を収集）
    #[serde(default = "default_styles")]
    pub styles: Vec<KeywordRule>,

    /// 料理ジャンル（スコアリング方式）
    #[serde(default = "default_cuisines")]
    pub cuisines: Vec<KeywordRule>,
}

fn default_version() -> u32 {
    1
}

fn default_serving_patterns() -> Vec<String> {
    [
        r"for (\d+) people",
        r"(\d+) servings?",
        r"serves? (\d+)",
        r"make it for (\d+)",
        r"(\d+) portions?",
        r"(\d+) person",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn keyword_rule(value: &str, keywords: &[&str]) -> KeywordRule {
    KeywordRule {
        value: value.to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
    }
}

fn default_dietary() -> Vec<DietaryRule> {
    let rule = |restriction, keywords: &[&str]| DietaryRule {
        restriction,
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
    };
    vec![
        rule(
            DietaryRestriction::Vegetarian,
            &["vegetarian", "veggie", "no meat", "veg only"],
        ),
        rule(
            DietaryRestriction::Vegan,
            &["vegan", "plant based", "plant-based"],
        ),
        rule(
            DietaryRestriction::GlutenFree,
            &["gluten free", "gluten-free", "no gluten"],
        ),
        rule(
            DietaryRestriction::DairyFree,
            &["dairy free", "dairy-free", "no dairy", "lactose free"],
        ),
        rule(
            DietaryRestriction::LowCarb,
            &["low carb", "low-carb", "keto", "ketogenic"],
        ),
        rule(DietaryRestriction::LowFat, &["low fat", "low-fat"]),
        rule(DietaryRestriction::Halal, &["halal"]),
        rule(DietaryRestriction::Kosher, &["kosher"]),
    ]
}

fn default_spice() -> Vec<SpiceRule> {
    let rule = |level, keywords: &[&str]| SpiceRule {
        level,
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
    };
    // ExtraHot は Hot より先。"extra hot" が "hot" に部分一致するため
    vec![
        rule(
            SpiceLevel::Mild,
            &[
                "mild",
                "not spicy",
                "no spice",
                "gentle",
                "light spice",
                "less spicy",
            ],
        ),
        rule(
            SpiceLevel::ExtraHot,
            &[
                "extra hot",
                "very hot",
                "extremely spicy",
                "super spicy",
                "really spicy",
            ],
        ),
        rule(
            SpiceLevel::Hot,
            &["hot", "spicy", "extra spice", "very spicy", "more spicy"],
        ),
        rule(
            SpiceLevel::Medium,
            &["medium", "moderate", "normal spice", "regular spice"],
        ),
    ]
}

fn default_time() -> Vec<TimeRule> {
    let rule = |preference, keywords: &[&str]| TimeRule {
        preference,
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
    };
    vec![
        rule(
            TimePreference::Quick,
            &[
                "quick",
                "fast",
                "rapid",
                "15 minutes",
                "10 minutes",
                "short time",
                "quickly",
            ],
        ),
        rule(
            TimePreference::Normal,
            &["normal", "regular", "standard", "usual time"],
        ),
        rule(
            TimePreference::Slow,
            &["slow", "long time", "take time", "slow cook", "hours", "slowly"],
        ),
    ]
}

fn default_methods() -> Vec<KeywordRule> {
    vec![
        keyword_rule("grilled", &["grill", "grilled", "barbecue", "bbq"]),
        keyword_rule("fried", &["fry", "fried", "deep fry", "pan fry"]),
        keyword_rule("baked", &["bake", "baked", "oven", "roast"]),
        keyword_rule("steamed", &["steam", "steamed"]),
        keyword_rule("boiled", &["boil", "boiled"]),
        keyword_rule("sauteed", &["saute", "sauteed", "pan cook"]),
        keyword_rule("stir_fried", &["stir fry", "stir-fry", "wok"]),
    ]
}

fn default_styles() -> Vec<KeywordRule> {
    vec![
        keyword_rule("easy", &["easy", "simple", "basic", "simple recipe"]),
        keyword_rule("traditional", &["traditional", "authentic", "classic"]),
        keyword_rule("modern", &["modern", "contemporary", "new style"]),
        keyword_rule("healthy", &["healthy", "nutritious", "good for you"]),
        keyword_rule("comfort", &["comfort food", "hearty", "filling"]),
    ]
}

fn default_cuisines() -> Vec<KeywordRule> {
    vec![
        keyword_rule(
            "Indian",
            &[
                "curry",
                "masala",
                "garam masala",
                "turmeric",
                "cumin",
                "coriander",
                "cardamom",
                "ghee",
                "basmati",
                "naan",
                "tandoori",
                "biryani",
                "dal",
                "paneer",
                "tikka",
                "vindaloo",
                "korma",
            ],
        ),
        keyword_rule(
            "Italian",
            &[
                "pasta",
                "spaghetti",
                "linguine",
                "penne",
                "lasagna",
                "risotto",
                "parmesan",
                "mozzarella",
                "basil",
                "oregano",
                "tomato sauce",
                "olive oil",
                "pizza",
                "bruschetta",
                "marinara",
                "carbonara",
                "pesto",
            ],
        ),
        keyword_rule(
            "Chinese",
            &[
                "soy sauce",
                "ginger",
                "scallions",
                "sesame oil",
                "rice wine",
                "hoisin sauce",
                "oyster sauce",
                "five spice",
                "bok choy",
                "shiitake",
                "stir fry",
                "wok",
                "noodles",
            ],
        ),
        keyword_rule(
            "Mexican",
            &[
                "chili",
                "jalapeno",
                "cilantro",
                "lime",
                "avocado",
                "tortilla",
                "salsa",
                "guacamole",
                "enchilada",
                "quesadilla",
                "taco",
                "burrito",
            ],
        ),
        keyword_rule(
            "Thai",
            &[
                "coconut milk",
                "lemongrass",
                "thai basil",
                "fish sauce",
                "lime leaves",
                "galangal",
                "pad thai",
                "green curry",
                "red curry",
            ],
        ),
    ]
}

impl Default for RuleTable {
    fn default() -> Self {
        Self {
            version: default_version(),
            serving_patterns: default_serving_patterns(),
            dietary: default_dietary(),
            spice: default_spice(),
            time: default_time(),
            methods: default_methods(),
            styles: default_styles(),
            cuisines: default_cuisines(),
        }
    }
}

impl RuleTable {
    /// ルールテーブルをファイルから読み込み
    ///
    /// # Errors
    ///
    /// ファイルの読み込みまたはTOMLのパースに失敗した場合にエラーを返す。
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("ルールテーブルの読み込みに失敗: {:?}", path.as_ref()))?;
        let table: RuleTable =
            toml::from_str(&content).with_context(|| "ルールテーブルのパースに失敗")?;
        Ok(table)
    }

    /// 既定のルールテーブルをファイルに書き出し
    pub fn write_default<P: AsRef<Path>>(path: P) -> Result<()> {
        let table = RuleTable::default();
        let content =
            toml::to_string_pretty(&table).with_context(|| "ルールテーブルのシリアライズに失敗")?;
        fs::write(path.as_ref(), content)
            .with_context(|| format!("ルールテーブルの書き込みに失敗: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// ファイルがあれば読み込み、なければ既定テーブルを使用
    pub fn load_or_default(path: Option<&str>) -> Result<Self> {
        match path {
            Some(p) if Path::new(p).exists() => Self::from_file(p),
            Some(p) => {
                log::warn!("ルールテーブルが見つかりません。既定テーブルを使用します: {}", p);
                Ok(RuleTable::default())
            }
            None => Ok(RuleTable::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_table() {
        let table = RuleTable::default();
        assert_eq!(table.version, 1);
        assert_eq!(table.serving_patterns.len(), 6);
        assert_eq!(table.dietary.len(), 8);
        assert_eq!(table.spice.len(), 4);
        assert_eq!(table.time.len(), 3);
        assert_eq!(table.methods.len(), 7);
        assert_eq!(table.styles.len(), 5);
        assert_eq!(table.cuisines.len(), 5);
    }

    #[test]
    fn test_spice_priority_order() {
        // 並び順がそのまま優先順位になるため、ここで固定する
        let table = RuleTable::default();
        let order: Vec<_> = table.spice.iter().map(|r| r.level).collect();
        assert_eq!(
            order,
            vec![
                SpiceLevel::Mild,
                SpiceLevel::ExtraHot,
                SpiceLevel::Hot,
                SpiceLevel::Medium,
            ]
        );
    }

    #[test]
    fn test_write_and_read_table() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path();

        RuleTable::write_default(path).unwrap();

        let table = RuleTable::from_file(path).unwrap();
        assert_eq!(table.version, 1);
        assert_eq!(table.methods.len(), 7);
    }

    #[test]
    fn test_partial_table_overrides() {
        // 一部のカテゴリのみ記述した場合、残りは既定値が使われる
        let toml_content = r#"
version = 2

[[spice]]
level = "hot"
keywords = ["atsui"]
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let table = RuleTable::from_file(temp_file.path()).unwrap();
        assert_eq!(table.version, 2);
        assert_eq!(table.spice.len(), 1);
        assert_eq!(table.spice[0].level, SpiceLevel::Hot);
        // 既定値
        assert_eq!(table.dietary.len(), 8);
        assert_eq!(table.serving_patterns.len(), 6);
    }

    #[test]
    fn test_load_or_default_nonexistent() {
        let table = RuleTable::load_or_default(Some("nonexistent_rules.toml")).unwrap();
        assert_eq!(table.version, 1);

        let table = RuleTable::load_or_default(None).unwrap();
        assert_eq!(table.spice.len(), 4);
    }
}
