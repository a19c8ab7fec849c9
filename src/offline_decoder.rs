use crate::config::OfflineConfig;
use crate::engine::{EngineOutcome, TranscriptionEngine};
use crate::normalizer;
use crate::types::{EngineKind, NormalizedAudio};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;

/// オフラインのローカルデコーダエンジン
///
/// pocketsphinx系のCLIを外部プロセスとして起動する。ネットワーク
/// 不要で動く代わりに認識精度は低く、チェーンの後段に置かれる。
pub struct OfflineDecoderEngine {
    config: OfflineConfig,
    scratch_dir: PathBuf,
}

impl OfflineDecoderEngine {
    pub fn new(config: OfflineConfig, scratch_dir: PathBuf) -> Self {
        Self {
            config,
            scratch_dir,
        }
    }
}

#[async_trait]
impl TranscriptionEngine for OfflineDecoderEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Offline
    }

    fn name(&self) -> &'static str {
        "offline-decoder"
    }

    async fn transcribe(&self, audio: &NormalizedAudio) -> EngineOutcome {
        let wav_path = match normalizer::write_temp_wav(audio, &self.scratch_dir) {
            Ok(path) => path,
            Err(e) => {
                return EngineOutcome::UnexpectedFailure(format!("一時WAVの書き出しに失敗: {}", e))
            }
        };

        log::debug!(
            "offline-decoder 実行: {} ({:.2}秒の音声)",
            self.config.binary,
            audio.duration_seconds()
        );

        // デコーダのログはstderrへ、認識結果はstdoutへ出る
        let output = match Command::new(&self.config.binary)
            .arg("-infile")
            .arg(&*wav_path)
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) => {
                return EngineOutcome::EngineUnavailable(format!("バイナリの起動に失敗: {}", e))
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return EngineOutcome::UnexpectedFailure(format!(
                "非0終了 ({}): {}",
                output.status,
                stderr.trim()
            ));
        }

        let transcript = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if transcript.is_empty() {
            EngineOutcome::NoSpeechFound
        } else {
            EngineOutcome::Understood(transcript)
        }
    }
}
