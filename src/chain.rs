use crate::config::Config;
use crate::engine::{EngineOutcome, TranscriptionEngine};
use crate::local_whisper::LocalWhisperEngine;
use crate::offline_decoder::OfflineDecoderEngine;
use crate::placeholder::PlaceholderEngine;
use crate::probe::EngineCapabilities;
use crate::remote_api::RemoteApiEngine;
use crate::types::{EngineKind, NormalizedAudio, TranscriptionResult};
use anyhow::{Context, Result};
use std::path::PathBuf;

/// 全エンジン失敗時のエラーメッセージ
const EXHAUSTED_MESSAGE: &str = "no engine produced a transcript";

/// フォールバックチェーンの状態
///
/// 1回の文字起こし実行は必ず
/// `NotStarted → TryingEngine(i) → Succeeded | AllEnginesExhausted`
/// の順に遷移する。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChainState {
    NotStarted,
    /// i番目（0始まり）のエンジンを試行中
    TryingEngine(usize),
    Succeeded,
    AllEnginesExhausted,
}

/// 文字起こしフォールバックチェーン
///
/// エンジンを優先度順に1回ずつ試し、空でないトランスクリプトを
/// 得た時点で打ち切る。成功は常に1エンジンのみで、投票や並列
/// 実行は行わない。エンジン内の失敗はすべて次エンジンへの遷移に
/// 変換され、呼び出し元へ生のエラーが漏れることはない。
///
/// # 失敗時の動作
///
/// - `NoSpeechFound` - ログを出して次のエンジンへ
/// - `EngineUnavailable` - ログを出して次のエンジンへ（同一リクエスト内で再試行しない）
/// - `UnexpectedFailure` - ログを出して次のエンジンへ
/// - 全エンジンを使い果たした場合のみ `success: false` を返す
pub struct FallbackChain {
    engines: Vec<Box<dyn TranscriptionEngine>>,
}

impl FallbackChain {
    /// エンジンリストから直接チェーンを作成
    ///
    /// リストの並び順がそのまま試行順になる。テストでは
    /// ここへ偽エンジンを注入する。
    pub fn new(engines: Vec<Box<dyn TranscriptionEngine>>) -> Self {
        Self { engines }
    }

    /// 設定とプローブ結果からチェーンを構築
    ///
    /// 設定の優先度リストを順に見て、プローブで使用可と判定された
    /// エンジンだけを組み込む。
    pub fn from_config(config: &Config, caps: &EngineCapabilities) -> Result<Self> {
        let scratch_dir = PathBuf::from(&config.audio.scratch_dir);
        let mut engines: Vec<Box<dyn TranscriptionEngine>> = Vec::new();

        for &kind in &config.engines.priority {
            if !caps.is_available(kind) {
                log::debug!("エンジン {} はプローブで使用不可、スキップ", kind);
                continue;
            }

            match kind {
                EngineKind::LocalMl => {
                    engines.push(Box::new(LocalWhisperEngine::new(
                        config.local_ml.clone(),
                        scratch_dir.clone(),
                    )));
                }
                EngineKind::Remote => {
                    let remote = config
                        .remote
                        .clone()
                        .context("リモートエンジンが使用可なのに設定がありません")?;
                    engines.push(Box::new(RemoteApiEngine::new(remote)?));
                }
                EngineKind::Offline => {
                    engines.push(Box::new(OfflineDecoderEngine::new(
                        config.offline.clone(),
                        scratch_dir.clone(),
                    )));
                }
                EngineKind::Placeholder => {
                    engines.push(Box::new(PlaceholderEngine::new(config.placeholder.clone())));
                }
            }
        }

        log::info!(
            "フォールバックチェーン構築: {:?}",
            engines.iter().map(|e| e.kind()).collect::<Vec<_>>()
        );

        Ok(Self { engines })
    }

    /// チェーンに組み込まれたエンジンの種類（試行順）
    pub fn engine_kinds(&self) -> Vec<EngineKind> {
        self.engines.iter().map(|e| e.kind()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    /// 音声を文字起こしする
    ///
    /// どのような入力・環境でも必ず `TranscriptionResult` を返す。
    /// 内部タイムアウトは持たないため、総所要時間の上限は
    /// 呼び出し側で設けること。
    pub async fn transcribe(&self, audio: &NormalizedAudio) -> TranscriptionResult {
        let mut state = ChainState::NotStarted;
        log::debug!(
            "フォールバックチェーン開始 (状態: {:?}, エンジン {} 個)",
            state,
            self.engines.len()
        );

        for (index, engine) in self.engines.iter().enumerate() {
            state = ChainState::TryingEngine(index);
            log::info!(
                "状態遷移 {:?}: エンジン {}/{} ({})",
                state,
                index + 1,
                self.engines.len(),
                engine.name()
            );

            match engine.transcribe(audio).await {
                EngineOutcome::Understood(text) if !text.trim().is_empty() => {
                    state = ChainState::Succeeded;
                    log::info!(
                        "文字起こし成功: {} ({} 文字) 状態: {:?}",
                        engine.name(),
                        text.len(),
                        state
                    );
                    return TranscriptionResult::succeeded(text.trim().to_string(), engine.kind());
                }
                EngineOutcome::Understood(_) => {
                    // 空文字列は成功扱いにしない
                    log::warn!("{}: 空のトランスクリプト、次のエンジンへ", engine.name());
                }
                EngineOutcome::NoSpeechFound => {
                    log::warn!("{}: 聞き取れる音声なし、次のエンジンへ", engine.name());
                }
                EngineOutcome::EngineUnavailable(reason) => {
                    log::warn!("{}: 使用不可 ({})、次のエンジンへ", engine.name(), reason);
                }
                EngineOutcome::UnexpectedFailure(reason) => {
                    log::error!(
                        "{}: 予期しない失敗 ({})、次のエンジンへ",
                        engine.name(),
                        reason
                    );
                }
            }
        }

        state = ChainState::AllEnginesExhausted;
        log::warn!(
            "全エンジンを使い果たしました ({} 個試行) 状態: {:?}",
            self.engines.len(),
            state
        );
        TranscriptionResult::failed(EXHAUSTED_MESSAGE)
    }
}
