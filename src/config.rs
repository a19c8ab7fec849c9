use crate::types::EngineKind;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub engines: EnginesConfig,
    pub remote: Option<RemoteConfig>,
    #[serde(default)]
    pub local_ml: LocalMlConfig,
    #[serde(default)]
    pub offline: OfflineConfig,
    #[serde(default)]
    pub placeholder: PlaceholderConfig,
    #[serde(default)]
    pub ffmpeg: FfmpegConfig,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// 音声処理設定
///
/// 正規化と一時ファイルに関する設定。
///
/// # デフォルト値
///
/// - `scratch_dir`: "./scratch" (デコード済み音声の一時置き場)
/// - `sample_rate`: 16000 Hz (16kHz - 各エンジンの前提形式)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AudioConfig {
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: String,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

/// エンジン試行順の設定
///
/// フォールバックチェーンはこのリストの並び順で試行する。
/// プローブで使用不可と判定されたエンジンは飛ばされる。
///
/// # デフォルト値
///
/// local_ml → remote → offline → placeholder
/// （精度が高いと期待できる順）
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EnginesConfig {
    #[serde(default = "default_priority")]
    pub priority: Vec<EngineKind>,
}

/// リモート音声認識API設定
///
/// OpenAI互換の音声文字起こしエンドポイントを想定。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteConfig {
    /// API Key
    pub api_key: String,
    /// エンドポイントURL
    #[serde(default = "default_remote_endpoint")]
    pub endpoint: String,
    /// モデル名（通常 "whisper-1"）
    #[serde(default = "default_remote_model")]
    pub model: String,
    /// 言語コード（"en", "ja" など）。省略可能
    pub language: Option<String>,
    /// HTTPタイムアウト（秒）
    #[serde(default = "default_remote_timeout_seconds")]
    pub timeout_seconds: u64,
}

/// ローカルML文字起こしエンジン設定
///
/// whisper.cpp系のCLIバイナリを外部プロセスとして起動する。
///
/// # デフォルト値
///
/// - `binary`: "whisper-cli"
/// - `model_path`: なし（未設定の場合このエンジンは使用不可）
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocalMlConfig {
    #[serde(default = "default_local_ml_binary")]
    pub binary: String,
    pub model_path: Option<String>,
    pub language: Option<String>,
}

/// オフラインデコーダ設定
///
/// pocketsphinx系のCLIバイナリを外部プロセスとして起動する。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OfflineConfig {
    #[serde(default = "default_offline_binary")]
    pub binary: String,
}

/// プレースホルダエンジン設定
///
/// 全エンジンが失敗した場合の最終手段。入力が一定サイズを
/// 超えていれば定型文を返す。
///
/// # デフォルト値
///
/// - `enabled`: true
/// - `min_input_bytes`: 1000 (これ以下の入力は音声なしとみなす)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaceholderConfig {
    #[serde(default = "default_placeholder_enabled")]
    pub enabled: bool,
    #[serde(default = "default_min_input_bytes")]
    pub min_input_bytes: u64,
    #[serde(default = "default_placeholder_text")]
    pub text: String,
}

/// ffmpeg変換設定
///
/// WAV/FLAC以外のコンテナをデコードするための外部コンバータ。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FfmpegConfig {
    #[serde(default = "default_ffmpeg_binary")]
    pub binary: String,
    #[serde(default = "default_ffmpeg_enabled")]
    pub enabled: bool,
}

/// 抽出ルールテーブル設定
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RulesConfig {
    /// ルールテーブルTOMLのパス。省略時は組み込みの既定テーブル
    pub path: Option<String>,
}

/// 出力設定
///
/// # デフォルト値
///
/// - `log_level`: "info"
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// Default functions
fn default_scratch_dir() -> String {
    "./scratch".to_string()
}

fn default_sample_rate() -> u32 {
    16000 // 16kHz - 各エンジンの前提形式
}

fn default_priority() -> Vec<EngineKind> {
    vec![
        EngineKind::LocalMl,
        EngineKind::Remote,
        EngineKind::Offline,
        EngineKind::Placeholder,
    ]
}

fn default_remote_endpoint() -> String {
    "https://api.openai.com/v1/audio/transcriptions".to_string()
}

fn default_remote_model() -> String {
    "whisper-1".to_string()
}

fn default_remote_timeout_seconds() -> u64 {
    30
}

fn default_local_ml_binary() -> String {
    "whisper-cli".to_string()
}

fn default_offline_binary() -> String {
    "pocketsphinx_continuous".to_string()
}

fn default_placeholder_enabled() -> bool {
    true
}

fn default_min_input_bytes() -> u64 {
    1000 // 1KB以下の入力は実音声なしとみなす
}

fn default_placeholder_text() -> String {
    "make it delicious with good spices for 4 people".to_string()
}

fn default_ffmpeg_binary() -> String {
    "ffmpeg".to_string()
}

fn default_ffmpeg_enabled() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            audio: AudioConfig::default(),
            engines: EnginesConfig::default(),
            remote: None, // デフォルトではリモートAPI設定なし
            local_ml: LocalMlConfig::default(),
            offline: OfflineConfig::default(),
            placeholder: PlaceholderConfig::default(),
            ffmpeg: FfmpegConfig::default(),
            rules: RulesConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            scratch_dir: default_scratch_dir(),
            sample_rate: default_sample_rate(),
        }
    }
}

impl Default for EnginesConfig {
    fn default() -> Self {
        Self {
            priority: default_priority(),
        }
    }
}

impl Default for LocalMlConfig {
    fn default() -> Self {
        Self {
            binary: default_local_ml_binary(),
            model_path: None,
            language: None,
        }
    }
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            binary: default_offline_binary(),
        }
    }
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        Self {
            enabled: default_placeholder_enabled(),
            min_input_bytes: default_min_input_bytes(),
            text: default_placeholder_text(),
        }
    }
}

impl Default for FfmpegConfig {
    fn default() -> Self {
        Self {
            binary: default_ffmpeg_binary(),
            enabled: default_ffmpeg_enabled(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// 設定ファイルから読み込み
    ///
    /// TOML形式の設定ファイルをパースしてConfig構造体を生成する。
    ///
    /// # Arguments
    ///
    /// * `path` - 設定ファイルのパス
    ///
    /// # Errors
    ///
    /// ファイルの読み込みまたはパースに失敗した場合にエラーを返す。
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use flavorcraft_transcribe::config::Config;
    /// let config = Config::from_file("config.toml").unwrap();
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("設定ファイルの読み込みに失敗: {:?}", path.as_ref()))?;
        let config: Config =
            toml::from_str(&content).with_context(|| "設定ファイルのパースに失敗")?;
        Ok(config)
    }

    /// デフォルト設定をファイルに書き出し
    ///
    /// デフォルト値を持つ設定ファイルを生成する。
    /// 既存のファイルは上書きされる。
    ///
    /// # Errors
    ///
    /// ファイルの書き込みに失敗した場合にエラーを返す。
    pub fn write_default<P: AsRef<Path>>(path: P) -> Result<()> {
        let config = Config::default();
        let content =
            toml::to_string_pretty(&config).with_context(|| "設定のシリアライズに失敗")?;
        fs::write(path.as_ref(), content)
            .with_context(|| format!("設定ファイルの書き込みに失敗: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// 設定ファイルがあれば読み込み、なければデフォルトを使用
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use flavorcraft_transcribe::config::Config;
    /// let config = Config::load_or_default("config.toml").unwrap();
    /// ```
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            log::warn!(
                "設定ファイルが見つかりません。デフォルト設定を使用します: {:?}",
                path.as_ref()
            );
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.audio.sample_rate, 16000);
        assert_eq!(config.audio.scratch_dir, "./scratch");
        assert_eq!(config.engines.priority.len(), 4);
        assert_eq!(config.engines.priority[0], EngineKind::LocalMl);
        assert_eq!(config.engines.priority[3], EngineKind::Placeholder);
        assert!(config.remote.is_none());
        assert!(config.placeholder.enabled);
        assert_eq!(config.placeholder.min_input_bytes, 1000);
        assert_eq!(config.ffmpeg.binary, "ffmpeg");
        assert_eq!(config.output.log_level, "info");
    }

    #[test]
    fn test_write_and_read_config() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path();

        // デフォルト設定を書き込み
        Config::write_default(path).unwrap();

        // 読み込み
        let config = Config::from_file(path).unwrap();
        assert_eq!(config.audio.sample_rate, 16000);
        assert_eq!(config.local_ml.binary, "whisper-cli");
    }

    #[test]
    fn test_custom_config() {
        let toml_content = r#"
[audio]
scratch_dir = "/tmp/fc-scratch"
sample_rate = 16000

[engines]
priority = ["remote", "placeholder"]

[remote]
api_key = "sk-test"
model = "whisper-1"
language = "en"
timeout_seconds = 20

[local_ml]
binary = "/opt/whisper/main"
model_path = "/opt/whisper/ggml-base.bin"

[placeholder]
enabled = false
min_input_bytes = 2048
text = "something generic"

[output]
log_level = "debug"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::from_file(temp_file.path()).unwrap();

        assert_eq!(config.audio.scratch_dir, "/tmp/fc-scratch");
        assert_eq!(
            config.engines.priority,
            vec![EngineKind::Remote, EngineKind::Placeholder]
        );
        let remote = config.remote.unwrap();
        assert_eq!(remote.api_key, "sk-test");
        assert_eq!(remote.timeout_seconds, 20);
        // endpoint は省略したのでデフォルト値
        assert_eq!(remote.endpoint, "https://api.openai.com/v1/audio/transcriptions");
        assert_eq!(config.local_ml.binary, "/opt/whisper/main");
        assert_eq!(
            config.local_ml.model_path.as_deref(),
            Some("/opt/whisper/ggml-base.bin")
        );
        assert!(!config.placeholder.enabled);
        assert_eq!(config.placeholder.min_input_bytes, 2048);
        assert_eq!(config.output.log_level, "debug");
    }

    #[test]
    fn test_load_or_default_nonexistent() {
        let config = Config::load_or_default("nonexistent_file.toml").unwrap();
        // デフォルト設定が返されることを確認
        assert_eq!(config.audio.sample_rate, 16000);
    }

    #[test]
    fn test_partial_config() {
        // 一部の設定のみ記述した場合、残りはデフォルト値が使われる
        let toml_content = r#"
[placeholder]
min_input_bytes = 500
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::from_file(temp_file.path()).unwrap();

        // 指定した値
        assert_eq!(config.placeholder.min_input_bytes, 500);

        // デフォルト値
        assert!(config.placeholder.enabled);
        assert_eq!(config.audio.scratch_dir, "./scratch");
        assert_eq!(config.engines.priority.len(), 4);
    }
}
