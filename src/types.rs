use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use thiserror::Error;

/// 16ビット整数型のオーディオサンプル
///
/// PCM形式の音声データを表現するための型エイリアス。
/// -32768 から 32767 の範囲の値を取る。
pub type SampleI16 = i16;

/// 音声入力ソース
///
/// リクエスト境界で一度だけ解決される入力の直和型。
/// 以降の処理はファイルパスかバイト列かを実行時に判別しない。
///
/// # Examples
///
/// ```
/// # use flavorcraft_transcribe::types::AudioSource;
/// let from_file = AudioSource::from_path("voice.wav");
/// let from_bytes = AudioSource::from_bytes(vec![0u8; 128], "wav");
/// assert_eq!(from_file.extension().as_deref(), Some("wav"));
/// assert_eq!(from_bytes.extension().as_deref(), Some("wav"));
/// ```
#[derive(Clone, Debug)]
pub enum AudioSource {
    /// ファイルシステム上の音声ファイル
    FilePath(PathBuf),

    /// メモリ上の音声データと宣言された拡張子
    ByteBuffer {
        data: Vec<u8>,
        /// 拡張子（ドットなし、例: "wav"）
        extension: String,
    },
}

impl AudioSource {
    pub fn from_path<P: Into<PathBuf>>(path: P) -> Self {
        AudioSource::FilePath(path.into())
    }

    pub fn from_bytes(data: Vec<u8>, extension: &str) -> Self {
        AudioSource::ByteBuffer {
            data,
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    /// 宣言された拡張子を小文字で返す
    ///
    /// ファイルパスの場合はパスから取得する。拡張子がない場合は None。
    pub fn extension(&self) -> Option<String> {
        match self {
            AudioSource::FilePath(path) => path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_ascii_lowercase()),
            AudioSource::ByteBuffer { extension, .. } => {
                if extension.is_empty() {
                    None
                } else {
                    Some(extension.to_ascii_lowercase())
                }
            }
        }
    }
}

/// 正規化済み音声データ
///
/// モノラル・16kHz・16ビット線形PCM。全エンジンが前提とする
/// 基準形式で、1回の文字起こし試行の間だけ存在する。
#[derive(Clone, Debug)]
pub struct NormalizedAudio {
    /// PCM音声サンプルの配列（モノラル）
    pub samples: Vec<SampleI16>,

    /// サンプリングレート (Hz)。正規化後は常に16000
    pub sample_rate: u32,

    /// 正規化前の入力データのバイト数
    ///
    /// プレースホルダエンジンの閾値判定に使用する
    pub source_len: u64,
}

impl NormalizedAudio {
    /// 音声の長さ（秒）
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// 文字起こしエンジンの種類
///
/// フォールバックチェーンが優先度順に試行するエンジンの識別子。
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    /// ローカルのMLベース文字起こし（whisper.cpp系CLI）
    LocalMl,
    /// リモートのクラウド音声認識API
    Remote,
    /// オフラインのローカルデコーダ
    Offline,
    /// 最終手段のプレースホルダ
    Placeholder,
}

impl EngineKind {
    /// ログ・表示用の識別子
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::LocalMl => "local_ml",
            EngineKind::Remote => "remote",
            EngineKind::Offline => "offline",
            EngineKind::Placeholder => "placeholder",
        }
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 音声正規化のエラー
///
/// エンジンを1つも呼び出す前に入力検証で弾かれた場合のみ
/// 呼び出し元へ伝播する。エンジン側の失敗はここには含まれない。
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    /// 入力が0バイト
    #[error("音声データが空です")]
    EmptyInput,

    /// 宣言された拡張子が対応外
    #[error("未対応の音声フォーマット: {0}")]
    UnsupportedFormat(String),

    /// 全デコードバックエンドが失敗
    #[error("音声データのデコードに失敗: {0}")]
    DecodeFailed(String),
}

/// 文字起こし結果
///
/// 1つの音声入力につき1回だけ生成され、以後変更されない。
/// チェーンが全エンジンを使い果たした場合も必ずこの形で返る。
#[derive(Clone, Debug, Serialize)]
pub struct TranscriptionResult {
    /// 文字起こしに成功したかどうか
    pub success: bool,

    /// 文字起こしテキスト（失敗時は空文字列）
    pub transcript: String,

    /// 成功したエンジン（失敗時は None）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_used: Option<EngineKind>,

    /// エラーメッセージ（成功時は None）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TranscriptionResult {
    /// 成功結果を作成
    pub fn succeeded(transcript: String, engine: EngineKind) -> Self {
        Self {
            success: true,
            transcript,
            engine_used: Some(engine),
            error: None,
        }
    }

    /// 失敗結果を作成
    pub fn failed<S: Into<String>>(error: S) -> Self {
        Self {
            success: false,
            transcript: String::new(),
            engine_used: None,
            error: Some(error.into()),
        }
    }
}

/// 辛さレベル
///
/// 抽出の優先順位はルールテーブルの並び順で決まる
/// （既定: Mild → ExtraHot → Hot → Medium、最初に一致したものが勝つ）。
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SpiceLevel {
    Mild,
    Medium,
    Hot,
    ExtraHot,
}

/// 調理時間の好み
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimePreference {
    Quick,
    Normal,
    Slow,
}

/// 食事制限の種類
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum DietaryRestriction {
    Vegetarian,
    Vegan,
    GlutenFree,
    DairyFree,
    LowCarb,
    LowFat,
    Halal,
    Kosher,
}

/// トランスクリプトから抽出した調理の好み
///
/// 純粋関数の出力であり、1リクエストのレスポンスを超えて
/// 保持されることはない。
///
/// # 不変条件
///
/// `serving_size` は常に 1..=20 の範囲に収まる。抽出が範囲外や
/// パース不能な値を拾った場合は既定値の 4 に戻る。
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct RecipePreferences {
    /// 人数（1..=20、既定値 4）
    pub serving_size: u32,

    /// 食事制限（複数可、重複は集合として潰れる）
    pub dietary_restrictions: BTreeSet<DietaryRestriction>,

    /// 辛さレベル（既定値 Medium）
    pub spice_level: SpiceLevel,

    /// 調理時間の好み（既定値 Normal）
    pub cooking_time_preference: TimePreference,

    /// 調理方法（複数可）
    pub cooking_methods: BTreeSet<String>,

    /// 調理スタイル（複数可）
    pub preparation_styles: BTreeSet<String>,
}

impl Default for RecipePreferences {
    fn default() -> Self {
        Self {
            serving_size: 4,
            dietary_restrictions: BTreeSet::new(),
            spice_level: SpiceLevel::Medium,
            cooking_time_preference: TimePreference::Normal,
            cooking_methods: BTreeSet::new(),
            preparation_styles: BTreeSet::new(),
        }
    }
}

/// パイプライン全体の処理レポート
///
/// CLIが標準出力へJSON形式で出力する最終的な応答。
/// HTTP層を被せる場合もこの構造をそのまま直列化すればよい。
///
/// # JSON出力例
///
/// ```json
/// {
///   "success": true,
///   "transcript": "make it spicy for 6 people",
///   "engine_used": "local_ml",
///   "preferences": { "serving_size": 6, "spice_level": "hot" },
///   "timestamp": "2025-01-02T14:30:15+00:00",
///   "engines_available": ["local_ml", "placeholder"]
/// }
/// ```
#[derive(Clone, Debug, Serialize)]
pub struct TranscriptionReport {
    pub success: bool,

    pub transcript: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_used: Option<EngineKind>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// 抽出した調理の好み（失敗時は既定値）
    pub preferences: RecipePreferences,

    /// 検出した料理ジャンル
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<String>,

    /// ISO 8601形式のタイムスタンプ
    pub timestamp: String,

    /// プローブ時点で使用可能だったエンジン一覧
    pub engines_available: Vec<EngineKind>,
}

impl TranscriptionReport {
    /// 文字起こし結果と抽出結果からレポートを組み立てる
    pub fn new(
        result: TranscriptionResult,
        preferences: RecipePreferences,
        cuisine: Option<String>,
        engines_available: Vec<EngineKind>,
    ) -> Self {
        Self {
            success: result.success,
            transcript: result.transcript,
            engine_used: result.engine_used,
            error: result.error,
            preferences,
            cuisine,
            timestamp: chrono::Utc::now().to_rfc3339(),
            engines_available,
        }
    }
}
