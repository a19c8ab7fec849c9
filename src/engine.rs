use crate::types::{EngineKind, NormalizedAudio};
use async_trait::async_trait;

/// 1回のエンジン試行の結果
///
/// エンジン内部の失敗は種類ごとにタグ付けされ、チェーンの
/// 状態遷移としてのみ扱われる。生のエラーがチェーンの外へ
/// 漏れることはない。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineOutcome {
    /// 音声を認識し、テキストを得た
    Understood(String),

    /// エンジンは動いたが、聞き取れる音声がなかった
    NoSpeechFound,

    /// エンジン自体が使用できない（依存物の欠落、接続失敗など）
    EngineUnavailable(String),

    /// 上記以外の予期しない失敗
    UnexpectedFailure(String),
}

/// 文字起こしエンジンの共通トレイト
///
/// 各エンジンは正規化済み音声（モノラル16kHz PCM）を受け取り、
/// 1回だけ試行して結果を返す。リトライやタイムアウトの制御は
/// エンジン呼び出し自身が行うもの以外は持たない。
///
/// # 実装上の規約
///
/// - `transcribe` は決してパニックやエラー伝播をせず、失敗は
///   必ず `EngineOutcome` のいずれかにマップする。
/// - 一時ファイルを作る場合は試行のスコープ内で破棄する。
#[async_trait]
pub trait TranscriptionEngine: Send + Sync {
    /// エンジンの種類
    fn kind(&self) -> EngineKind;

    /// ログ・表示用のエンジン名
    fn name(&self) -> &'static str;

    /// 音声を文字起こしする
    async fn transcribe(&self, audio: &NormalizedAudio) -> EngineOutcome;
}
