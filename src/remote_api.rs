use crate::config::RemoteConfig;
use crate::engine::{EngineOutcome, TranscriptionEngine};
use crate::normalizer;
use crate::types::{EngineKind, NormalizedAudio};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;

/// リモート音声認識APIのレスポンス
#[derive(Debug, Deserialize)]
struct RemoteResponse {
    text: String,
}

/// リモートのクラウド音声認識APIエンジン
///
/// 正規化済み音声をメモリ上でWAVに変換し、multipartでPOSTする。
/// OpenAI互換の文字起こしエンドポイントを想定している。
pub struct RemoteApiEngine {
    config: RemoteConfig,
    client: reqwest::Client,
}

impl RemoteApiEngine {
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .context("リモートAPI HTTPクライアント作成失敗")?;

        Ok(Self { config, client })
    }

    /// APIを呼び出して文字起こし
    async fn request_transcription(&self, wav_data: Vec<u8>) -> EngineOutcome {
        let part = match multipart::Part::bytes(wav_data)
            .file_name("audio.wav")
            .mime_str("audio/wav")
        {
            Ok(part) => part,
            Err(e) => {
                return EngineOutcome::UnexpectedFailure(format!(
                    "multipartパートの作成に失敗: {}",
                    e
                ))
            }
        };

        let mut form = multipart::Form::new()
            .part("file", part)
            .text("model", self.config.model.clone());

        if let Some(ref language) = self.config.language {
            form = form.text("language", language.clone());
        }

        let response = match self
            .client
            .post(&self.config.endpoint)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .multipart(form)
            .send()
            .await
        {
            Ok(response) => response,
            // 接続失敗・タイムアウトはサービス到達不能として扱う
            Err(e) => return EngineOutcome::EngineUnavailable(format!("リクエスト失敗: {}", e)),
        };

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return EngineOutcome::EngineUnavailable(format!(
                "リモートAPIエラー: {} - {}",
                status, error_text
            ));
        }

        match response.json::<RemoteResponse>().await {
            Ok(body) => {
                let text = body.text.trim().to_string();
                if text.is_empty() {
                    EngineOutcome::NoSpeechFound
                } else {
                    EngineOutcome::Understood(text)
                }
            }
            Err(e) => {
                EngineOutcome::UnexpectedFailure(format!("レスポンスパース失敗: {}", e))
            }
        }
    }
}

#[async_trait]
impl TranscriptionEngine for RemoteApiEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Remote
    }

    fn name(&self) -> &'static str {
        "remote-api"
    }

    async fn transcribe(&self, audio: &NormalizedAudio) -> EngineOutcome {
        let wav_data = match normalizer::wav_bytes(audio) {
            Ok(data) => data,
            Err(e) => return EngineOutcome::UnexpectedFailure(format!("WAV変換失敗: {}", e)),
        };

        log::debug!(
            "リモートAPI: {} バイトのWAVを送信 ({:.2}秒)",
            wav_data.len(),
            audio.duration_seconds()
        );

        self.request_transcription(wav_data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(endpoint: &str) -> RemoteConfig {
        RemoteConfig {
            api_key: "sk-test".to_string(),
            endpoint: endpoint.to_string(),
            model: "whisper-1".to_string(),
            language: Some("en".to_string()),
            timeout_seconds: 2,
        }
    }

    #[test]
    fn test_engine_identity() {
        let engine = RemoteApiEngine::new(test_config("https://example.invalid/v1")).unwrap();
        assert_eq!(engine.kind(), EngineKind::Remote);
        assert_eq!(engine.name(), "remote-api");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_unavailable() {
        // 解決できないホストへの送信はサービス到達不能として扱われる
        let engine =
            RemoteApiEngine::new(test_config("https://nonexistent.invalid/v1/transcribe")).unwrap();
        let audio = NormalizedAudio {
            samples: vec![0i16; 1600],
            sample_rate: 16000,
            source_len: 3200,
        };

        match engine.transcribe(&audio).await {
            EngineOutcome::EngineUnavailable(_) => {}
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}
