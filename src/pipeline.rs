use crate::chain::FallbackChain;
use crate::config::Config;
use crate::cuisine::CuisineDetector;
use crate::extractor::AttributeExtractor;
use crate::normalizer::AudioNormalizer;
use crate::probe::EngineCapabilities;
use crate::rules::RuleTable;
use crate::types::{
    AudioSource, EngineKind, NormalizeError, RecipePreferences, TranscriptionReport,
};
use anyhow::Result;

/// 音声からレシピの好みまでの処理パイプライン
///
/// 正規化 → フォールバックチェーン → 属性抽出 → ジャンル検出を
/// 直列に実行する。1回のリクエストにつき1回呼び出され、内部に
/// リクエストをまたぐ状態は持たない。
///
/// # エラーの扱い
///
/// - 入力不正（空・未対応フォーマット）のみ `Err` として返す
/// - エンジンの失敗はすべて `success: false` のレポートに畳み込む
///   （「必ず構造化された応答を返し、静かに品質を落とす」方針）
pub struct Pipeline {
    normalizer: AudioNormalizer,
    chain: FallbackChain,
    extractor: AttributeExtractor,
    cuisine: CuisineDetector,
    engines_available: Vec<EngineKind>,
}

impl Pipeline {
    /// 設定とプローブ結果からパイプラインを構築
    ///
    /// ルールテーブルは設定のパスから読み込み、なければ組み込みの
    /// 既定テーブルを使う。
    ///
    /// # Errors
    ///
    /// ルールテーブルの読み込み・コンパイル、またはエンジンの
    /// 構築に失敗した場合にエラーを返す。
    pub fn new(config: &Config, caps: &EngineCapabilities) -> Result<Self> {
        let table = RuleTable::load_or_default(config.rules.path.as_deref())?;
        log::info!("ルールテーブル読み込み完了 (version {})", table.version);

        Ok(Self {
            normalizer: AudioNormalizer::new(config, caps),
            chain: FallbackChain::from_config(config, caps)?,
            extractor: AttributeExtractor::new(&table)?,
            cuisine: CuisineDetector::new(&table),
            engines_available: caps.available(),
        })
    }

    /// 音声入力を処理してレポートを返す
    ///
    /// # Errors
    ///
    /// 入力検証エラー（`NormalizeError`）のみ。エンジンがすべて
    /// 失敗した場合もエラーにはならず、`success: false` の
    /// レポートが返る。
    pub async fn process(
        &self,
        source: &AudioSource,
    ) -> std::result::Result<TranscriptionReport, NormalizeError> {
        let audio = self.normalizer.normalize(source).await?;
        log::info!(
            "正規化完了: {:.2}秒 ({} サンプル, 元データ {} バイト)",
            audio.duration_seconds(),
            audio.samples.len(),
            audio.source_len
        );

        let result = self.chain.transcribe(&audio).await;

        let (preferences, cuisine) = if result.success {
            let preferences = self.extractor.extract(&result.transcript);
            let cuisine = self.cuisine.detect(&result.transcript);
            log::info!("抽出完了: {:?} / ジャンル: {:?}", preferences, cuisine);
            (preferences, cuisine)
        } else {
            // 失敗時は既定値で埋めた完全なレポートを返す
            (RecipePreferences::default(), None)
        };

        Ok(TranscriptionReport::new(
            result,
            preferences,
            cuisine,
            self.engines_available.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    /// 外部バイナリが全て不在の設定（プレースホルダのみ残る）
    fn offline_test_config(scratch: &Path) -> Config {
        let mut config = Config::default();
        config.audio.scratch_dir = scratch.to_string_lossy().to_string();
        config.local_ml.binary = "definitely-not-a-real-binary".to_string();
        config.offline.binary = "definitely-not-a-real-decoder".to_string();
        config.ffmpeg.binary = "definitely-not-ffmpeg".to_string();
        config
    }

    fn write_test_wav(path: &Path, frames: usize) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..frames {
            let sample = ((i as f32 * 0.05).sin() * 10000.0) as i16;
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[tokio::test]
    async fn test_placeholder_end_to_end() {
        let temp_dir = TempDir::new().unwrap();
        let config = offline_test_config(temp_dir.path());
        let caps = EngineCapabilities::probe(&config).await;
        let pipeline = Pipeline::new(&config, &caps).unwrap();

        let wav_path = temp_dir.path().join("voice.wav");
        write_test_wav(&wav_path, 16000); // 1秒分 = 32KB、閾値を超える

        let source = AudioSource::from_path(&wav_path);
        let report = pipeline.process(&source).await.unwrap();

        assert!(report.success);
        assert_eq!(report.engine_used, Some(EngineKind::Placeholder));
        assert_eq!(
            report.transcript,
            "make it delicious with good spices for 4 people"
        );
        // 定型文の "for 4 people" が抽出される
        assert_eq!(report.preferences.serving_size, 4);
        assert_eq!(report.engines_available, vec![EngineKind::Placeholder]);
    }

    #[tokio::test]
    async fn test_empty_input_is_error_before_engines() {
        let temp_dir = TempDir::new().unwrap();
        let config = offline_test_config(temp_dir.path());
        let caps = EngineCapabilities::probe(&config).await;
        let pipeline = Pipeline::new(&config, &caps).unwrap();

        let source = AudioSource::from_bytes(Vec::new(), "wav");
        let err = pipeline.process(&source).await.unwrap_err();
        assert_eq!(err, NormalizeError::EmptyInput);
    }

    #[tokio::test]
    async fn test_all_engines_exhausted_is_wellformed_report() {
        // プレースホルダすら無効な環境では success: false のレポートが返る
        let temp_dir = TempDir::new().unwrap();
        let mut config = offline_test_config(temp_dir.path());
        config.placeholder.enabled = false;

        let caps = EngineCapabilities::probe(&config).await;
        let pipeline = Pipeline::new(&config, &caps).unwrap();

        let wav_path = temp_dir.path().join("voice.wav");
        write_test_wav(&wav_path, 16000);

        let source = AudioSource::from_path(&wav_path);
        let report = pipeline.process(&source).await.unwrap();

        assert!(!report.success);
        assert!(report.transcript.is_empty());
        assert_eq!(report.engine_used, None);
        assert!(report.error.is_some());
        // 失敗時も好みは既定値で完全に埋まっている
        assert_eq!(report.preferences, RecipePreferences::default());
    }

    #[tokio::test]
    async fn test_tiny_input_exhausts_placeholder() {
        // 閾値以下の小さな入力ではプレースホルダも音声なしを返す
        let temp_dir = TempDir::new().unwrap();
        let config = offline_test_config(temp_dir.path());
        let caps = EngineCapabilities::probe(&config).await;
        let pipeline = Pipeline::new(&config, &caps).unwrap();

        let wav_path = temp_dir.path().join("tiny.wav");
        write_test_wav(&wav_path, 100); // 200バイト程度 + ヘッダ

        let source = AudioSource::from_path(&wav_path);
        let report = pipeline.process(&source).await.unwrap();

        assert!(!report.success);
        assert_eq!(report.engine_used, None);
    }
}
