use crate::config::LocalMlConfig;
use crate::engine::{EngineOutcome, TranscriptionEngine};
use crate::normalizer;
use crate::types::{EngineKind, NormalizedAudio};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// ローカルのMLベース文字起こしエンジン
///
/// whisper.cpp系のCLIバイナリを外部プロセスとして起動する。
/// 正規化済み音声をスコープ付き一時WAVファイルへ書き出し、
/// パスで渡して標準出力をトランスクリプトとして回収する。
pub struct LocalWhisperEngine {
    config: LocalMlConfig,
    scratch_dir: PathBuf,
}

impl LocalWhisperEngine {
    pub fn new(config: LocalMlConfig, scratch_dir: PathBuf) -> Self {
        Self {
            config,
            scratch_dir,
        }
    }
}

#[async_trait]
impl TranscriptionEngine for LocalWhisperEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::LocalMl
    }

    fn name(&self) -> &'static str {
        "local-whisper"
    }

    async fn transcribe(&self, audio: &NormalizedAudio) -> EngineOutcome {
        let model = match self.config.model_path.as_deref() {
            Some(path) if Path::new(path).exists() => path.to_string(),
            Some(path) => {
                return EngineOutcome::EngineUnavailable(format!("モデルが見つかりません: {}", path))
            }
            None => return EngineOutcome::EngineUnavailable("モデル未設定".to_string()),
        };

        // 一時WAVは wav_path のドロップで削除される
        let wav_path = match normalizer::write_temp_wav(audio, &self.scratch_dir) {
            Ok(path) => path,
            Err(e) => {
                return EngineOutcome::UnexpectedFailure(format!("一時WAVの書き出しに失敗: {}", e))
            }
        };

        let mut command = Command::new(&self.config.binary);
        command
            .arg("-m")
            .arg(&model)
            .arg("-f")
            .arg(&*wav_path)
            .arg("--no-timestamps");
        if let Some(ref language) = self.config.language {
            command.arg("-l").arg(language);
        }

        log::debug!(
            "local-whisper 実行: {} ({:.2}秒の音声)",
            self.config.binary,
            audio.duration_seconds()
        );

        let output = match command.output().await {
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
