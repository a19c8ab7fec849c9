use crate::config::PlaceholderConfig;
use crate::engine::{EngineOutcome, TranscriptionEngine};
use crate::types::{EngineKind, NormalizedAudio};
use async_trait::async_trait;

/// 最終手段のプレースホルダエンジン
///
/// 実際の音声認識は行わない。入力が閾値を超えるサイズを持つ、
/// つまり「何か話している可能性が高い」場合にのみ定型文を返し、
/// それ以外は音声なしとして扱う。全エンジンが落ちた環境でも
/// パイプラインが構造化された応答を返し続けるための安全網。
pub struct PlaceholderEngine {
    config: PlaceholderConfig,
}

impl PlaceholderEngine {
    pub fn new(config: PlaceholderConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl TranscriptionEngine for PlaceholderEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Placeholder
    }

    fn name(&self) -> &'static str {
        "placeholder"
    }

    async fn transcribe(&self, audio: &NormalizedAudio) -> EngineOutcome {
        if audio.source_len > self.config.min_input_bytes {
            log::info!(
                "placeholder: 入力 {} バイト > 閾値 {} バイト、定型文を返します",
                audio.source_len,
                self.config.min_input_bytes
            );
            EngineOutcome::Understood(self.config.text.clone())
        } else {
            EngineOutcome::NoSpeechFound
        }
    }
}
