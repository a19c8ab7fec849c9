use crate::config::Config;
use crate::probe::EngineCapabilities;
use crate::types::{AudioSource, NormalizeError, NormalizedAudio, SampleI16};
use anyhow::{Context, Result};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tokio::process::Command;

/// 対応する音声コンテナの拡張子
///
/// wav/flac は内蔵デコーダで直接デコードする。それ以外は
/// ffmpeg が使用可能な場合のみ変換を経由して受け付ける。
pub const SUPPORTED_EXTENSIONS: &[&str] = &["wav", "flac", "mp3", "ogg", "webm", "m4a", "aac"];

/// デコード直後の音声データ（正規化前）
struct DecodedAudio {
    /// インターリーブされたPCMサンプル
    samples: Vec<SampleI16>,
    channels: u16,
    sample_rate: u32,
}

/// 音声正規化器
///
/// 任意の入力コンテナをモノラル・16kHz・16ビット線形PCMへ変換する。
///
/// # デコードの試行順
///
/// 1. hound (WAV)
/// 2. claxon (FLAC)
/// 3. ffmpeg変換を経由して再度 hound（ffmpegが使用可能な場合のみ）
///
/// 中間ファイルはスコープ付き一時ファイルとして作られ、成功・失敗・
/// パニックのどの経路でも残らない。
pub struct AudioNormalizer {
    scratch_dir: PathBuf,
    target_sample_rate: u32,
    ffmpeg_binary: String,
    ffmpeg_available: bool,
}

impl AudioNormalizer {
    pub fn new(config: &Config, caps: &EngineCapabilities) -> Self {
        Self {
            scratch_dir: PathBuf::from(&config.audio.scratch_dir),
            target_sample_rate: config.audio.sample_rate,
            ffmpeg_binary: config.ffmpeg.binary.clone(),
            ffmpeg_available: caps.ffmpeg,
        }
    }

    /// 音声入力を正規化する
    ///
    /// # Errors
    ///
    /// - `EmptyInput` - 入力が0バイト（エンジンは1つも呼ばれない）
    /// - `UnsupportedFormat` - 宣言された拡張子が対応外
    /// - `DecodeFailed` - 全デコードバックエンドが失敗
    pub async fn normalize(
        &self,
        source: &AudioSource,
    ) -> std::result::Result<NormalizedAudio, NormalizeError> {
        let data = self.read_bytes(source)?;
        if data.is_empty() {
            return Err(NormalizeError::EmptyInput);
        }

        let extension = source
            .extension()
            .ok_or_else(|| NormalizeError::UnsupportedFormat("(拡張子なし)".to_string()))?;
        if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(NormalizeError::UnsupportedFormat(extension));
        }

        let decoded = self.decode(&data, &extension).await?;
        log::debug!(
            "デコード完了: {} ch / {} Hz / {} サンプル",
            decoded.channels,
            decoded.sample_rate,
            decoded.samples.len()
        );

        let mono = downmix(decoded.samples, decoded.channels);
        let samples = resample_linear(&mono, decoded.sample_rate, self.target_sample_rate);

        Ok(NormalizedAudio {
            samples,
            sample_rate: self.target_sample_rate,
            source_len: data.len() as u64,
        })
    }

    /// 入力ソースからバイト列を取り出す
    fn read_bytes(&self, source: &AudioSource) -> std::result::Result<Vec<u8>, NormalizeError> {
        match source {
            AudioSource::FilePath(path) => fs::read(path).map_err(|e| {
                NormalizeError::DecodeFailed(format!("入力ファイルの読み込みに失敗 {:?}: {}", path, e))
            }),
            AudioSource::ByteBuffer { data, .. } => Ok(data.clone()),
        }
    }

    /// デコードバックエンドを順に試す
    async fn decode(
        &self,
        data: &[u8],
        extension: &str,
    ) -> std::result::Result<DecodedAudio, NormalizeError> {
        let wav_err = match decode_wav(data) {
            Ok(decoded) => return Ok(decoded),
            Err(e) => e,
        };
        let flac_err = match decode_flac(data) {
            Ok(decoded) => return Ok(decoded),
            Err(e) => e,
        };

        if self.ffmpeg_available {
            log::debug!("内蔵デコーダが失敗。ffmpeg変換を試行: .{}", extension);
            return self.convert_with_ffmpeg(data, extension).await;
        }

        Err(NormalizeError::DecodeFailed(format!(
            "wav: {} / flac: {} (ffmpegは使用不可)",
            wav_err, flac_err
        )))
    }

    /// ffmpegでWAVへ変換してからデコードする
    ///
    /// 入力・出力ともスコープ付き一時ファイルで、この関数を抜けた
    /// 時点で削除される。
    async fn convert_with_ffmpeg(
        &self,
        data: &[u8],
        extension: &str,
    ) -> std::result::Result<DecodedAudio, NormalizeError> {
        fs::create_dir_all(&self.scratch_dir).map_err(|e| {
            NormalizeError::DecodeFailed(format!("一時ディレクトリの作成に失敗: {}", e))
        })?;

        let input_path = scoped_temp_path(&self.scratch_dir, &format!(".{}", extension))
            .map_err(|e| NormalizeError::DecodeFailed(format!("一時ファイルの作成に失敗: {}", e)))?;
        fs::write(&input_path, data).map_err(|e| {
            NormalizeError::DecodeFailed(format!("一時ファイルへの書き込みに失敗: {}", e))
        })?;

        let output_path = scoped_temp_path(&self.scratch_dir, ".wav")
            .map_err(|e| NormalizeError::DecodeFailed(format!("一時ファイルの作成に失敗: {}", e)))?;

        // 元実装と同じ変換指定: 16bit PCM / モノラル / 16kHz
        let output = Command::new(&self.ffmpeg_binary)
            .arg("-i")
            .arg(&*input_path)
            .args(["-acodec", "pcm_s16le", "-ac", "1"])
            .args(["-ar", &self.target_sample_rate.to_string()])
            .arg("-y")
            .arg(&*output_path)
            .output()
            .await
            .map_err(|e| NormalizeError::DecodeFailed(format!("ffmpegの起動に失敗: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(NormalizeError::DecodeFailed(format!(
                "ffmpeg変換に失敗: {}",
                stderr.trim()
            )));
        }

        let converted = fs::read(&*output_path).map_err(|e| {
            NormalizeError::DecodeFailed(format!("変換結果の読み込みに失敗: {}", e))
        })?;
        decode_wav(&converted)
            .map_err(|e| NormalizeError::DecodeFailed(format!("変換後WAVのデコードに失敗: {}", e)))
    }
}

/// WAVデータをデコードする（プライマリバックエンド）
fn decode_wav(data: &[u8]) -> std::result::Result<DecodedAudio, String> {
    let mut reader = hound::WavReader::new(Cursor::new(data)).map_err(|e| e.to_string())?;
    let spec = reader.spec();

    let samples: Vec<SampleI16> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * i16::MAX as f32) as i16))
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| e.to_string())?,
        hound::SampleFormat::Int => {
            if spec.bits_per_sample <= 16 {
                reader
                    .samples::<i16>()
                    .collect::<std::result::Result<_, _>>()
                    .map_err(|e| e.to_string())?
            } else {
                // 24/32bitは上位16bitへ丸める
                let shift = spec.bits_per_sample - 16;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| (v >> shift) as i16))
                    .collect::<std::result::Result<_, _>>()
                    .map_err(|e| e.to_string())?
            }
        }
    };

    Ok(DecodedAudio {
        samples,
        channels: spec.channels,
        sample_rate: spec.sample_rate,
    })
}

/// FLACデータをデコードする（セカンダリバックエンド）
fn decode_flac(data: &[u8]) -> std::result::Result<DecodedAudio, String> {
    let mut reader = claxon::FlacReader::new(Cursor::new(data)).map_err(|e| e.to_string())?;
    let info = reader.streaminfo();
    let bits = info.bits_per_sample;
    let channels = info.channels as u16;
    let sample_rate = info.sample_rate;

    let mut samples = Vec::new();
    for sample in reader.samples() {
        let value = sample.map_err(|e| e.to_string())?;
        let value16 = if bits > 16 {
            (value >> (bits - 16)) as i16
        } else if bits < 16 {
            (value << (16 - bits)) as i16
        } else {
            value as i16
        };
        samples.push(value16);
    }

    Ok(DecodedAudio {
        samples,
        channels,
        sample_rate,
    })
}

/// インターリーブされたマルチチャンネル音声をモノラルへ落とす
///
/// フレーム内の全チャンネルを平均する。
pub fn downmix(samples: Vec<SampleI16>, channels: u16) -> Vec<SampleI16> {
    if channels <= 1 {
        return samples;
    }
    samples
        .chunks(channels as usize)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / frame.len() as i32) as SampleI16
        })
        .collect()
}

/// 線形補間による単純なリサンプリング
///
/// 音声認識用途では十分な品質で、依存も増やさない。
pub fn resample_linear(samples: &[SampleI16], from_rate: u32, to_rate: u32) -> Vec<SampleI16> {
    if from_rate == to_rate || samples.is_empty() || from_rate == 0 {
        return samples.to_vec();
    }

    let out_len = ((samples.len() as u64 * to_rate as u64) / from_rate as u64) as usize;
    let step = from_rate as f64 / to_rate as f64;
    let mut out = Vec::with_capacity(out_len);

    for i in 0..out_len {
        let pos = i as f64 * step;
        let i0 = (pos.floor() as usize).min(samples.len() - 1);
        let frac = pos - i0 as f64;
        let s0 = samples[i0] as f64;
        let s1 = if i0 + 1 < samples.len() {
            samples[i0 + 1] as f64
        } else {
            s0
        };
        out.push((s0 + (s1 - s0) * frac).round() as SampleI16);
    }

    out
}

/// 正規化済み音声をメモリ上のWAVデータへ変換
///
/// リモートAPIエンジンがmultipart送信に使用する。
pub fn wav_bytes(audio: &NormalizedAudio) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: audio.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).with_context(|| "WAVライター作成失敗")?;
        for &sample in &audio.samples {
            writer.write_sample(sample).with_context(|| "WAV書き込み失敗")?;
        }
        writer.finalize().with_context(|| "WAV finalize失敗")?;
    }

    Ok(cursor.into_inner())
}

/// 正規化済み音声をスコープ付き一時WAVファイルへ書き出す
///
/// 返された `TempPath` がドロップされた時点でファイルは削除される。
/// 外部プロセスを起動するエンジンがファイルパス渡しに使用する。
pub fn write_temp_wav(audio: &NormalizedAudio, scratch_dir: &Path) -> Result<TempPath> {
    fs::create_dir_all(scratch_dir)
        .with_context(|| format!("一時ディレクトリの作成に失敗: {:?}", scratch_dir))?;

    let path = scoped_temp_path(scratch_dir, ".wav")?;

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: audio.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec)
        .with_context(|| format!("一時WAVファイルの作成に失敗: {:?}", &*path))?;
    for &sample in &audio.samples {
        writer
            .write_sample(sample)
            .with_context(|| "一時WAVファイルへの書き込みに失敗")?;
    }
    writer.finalize().with_context(|| "一時WAVファイルのファイナライズに失敗")?;

    Ok(path)
}

/// スコープ付き一時ファイルのパスを確保する
fn scoped_temp_path(dir: &Path, suffix: &str) -> Result<TempPath> {
    let file = tempfile::Builder::new()
        .prefix("fc_audio_")
        .suffix(suffix)
        .tempfile_in(dir)
        .with_context(|| format!("一時ファイルの作成に失敗: {:?}", dir))?;
    Ok(file.into_temp_path())
}
