//! flavorcraft-transcribe - 音声からレシピの好みを取り出すシステム
//!
//! このクレートは、アップロードされた音声クリップを正規化し、複数の
//! 文字起こしエンジンを優先度順にフォールバックしながら試行し、得られた
//! トランスクリプトからルールベースで調理の好み（人数・食事制限・
//! 辛さ・調理時間・調理方法・スタイル）を抽出するパイプラインを提供します。
//!
//! # 主な機能
//!
//! - **音声正規化**: 任意のコンテナをモノラル16kHz 16bit PCMへ変換
//!   （hound → claxon → ffmpeg の順でデコードを試行）
//! - **エンジンプローブ**: 起動時に各エンジンの使用可否を一度だけ判定
//! - **フォールバックチェーン**: ローカルML → リモートAPI → オフライン
//!   デコーダ → プレースホルダの順で最初の成功を採用
//! - **属性抽出**: バージョン付きルールテーブルによる決定的な抽出
//! - **ジャンル検出**: 同じルールテーブルを共有するスコアリング方式
//!
//! # アーキテクチャ
//!
//! ```text
//! [AudioSource] → [AudioNormalizer] → [FallbackChain] → transcript
//!                                           │                │
//!                                     (エンジン群)            ↓
//!                                  local-whisper      [AttributeExtractor]
//!                                  remote-api         [CuisineDetector]
//!                                  offline-decoder          │
//!                                  placeholder              ↓
//!                                                 [TranscriptionReport]
//! ```
//!
//! # 使用例
//!
//! ```no_run
//! # use flavorcraft_transcribe::config::Config;
//! # use flavorcraft_transcribe::pipeline::Pipeline;
//! # use flavorcraft_transcribe::probe::EngineCapabilities;
//! # use flavorcraft_transcribe::types::AudioSource;
//! # async fn run() -> anyhow::Result<()> {
//! // 設定ファイルを読み込み（なければデフォルト）
//! let config = Config::load_or_default("config.toml")?;
//!
//! // エンジンの使用可否をプロセス起動時に一度だけ判定
//! let caps = EngineCapabilities::probe(&config).await;
//!
//! // パイプラインを構築して1リクエスト分を処理
//! let pipeline = Pipeline::new(&config, &caps)?;
//! let report = pipeline.process(&AudioSource::from_path("voice.wav")).await?;
//! println!("{}", serde_json::to_string(&report)?);
//! # Ok(())
//! # }
//! ```

pub mod chain;
pub mod config;
pub mod cuisine;
pub mod engine;
pub mod extractor;
pub mod local_whisper;
pub mod normalizer;
pub mod offline_decoder;
pub mod pipeline;
pub mod placeholder;
pub mod probe;
pub mod remote_api;
pub mod rules;
pub mod types;
