use crate::config::Config;
use crate::types::EngineKind;
use std::collections::BTreeSet;
use std::path::Path;
use tokio::process::Command;

/// プロセス起動時に判定したエンジンの使用可否
///
/// 起動時に一度だけ構築され、以後は読み取り専用の共有状態として
/// 呼び出し元からパイプラインへ渡される（グローバル変数にはしない）。
/// 判定はあくまで参考情報であり、プローブで使用可と出たエンジンが
/// 実呼び出しで失敗するケースはチェーン側が処理する。
///
/// # Examples
///
/// ```no_run
/// # use flavorcraft_transcribe::config::Config;
/// # use flavorcraft_transcribe::probe::EngineCapabilities;
/// # use flavorcraft_transcribe::types::EngineKind;
/// # async fn run() {
/// let config = Config::default();
/// let caps = EngineCapabilities::probe(&config).await;
/// if caps.is_available(EngineKind::Placeholder) {
///     println!("placeholder engine is usable");
/// }
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct EngineCapabilities {
    /// 使用可能なエンジンの集合
    pub engines: BTreeSet<EngineKind>,

    /// ffmpegによる音声変換が使用可能かどうか
    pub ffmpeg: bool,
}

impl EngineCapabilities {
    /// 全エンジンの使用可否を判定
    ///
    /// 各チェックは失敗してもそのエンジンを使用不可と記録するだけで、
    /// この関数自体は決してエラーを返さない。
    pub async fn probe(config: &Config) -> Self {
        let mut engines = BTreeSet::new();

        if probe_local_ml(config).await {
            engines.insert(EngineKind::LocalMl);
        }
        if probe_remote(config) {
            engines.insert(EngineKind::Remote);
        }
        if probe_offline(config).await {
            engines.insert(EngineKind::Offline);
        }
        if config.placeholder.enabled {
            engines.insert(EngineKind::Placeholder);
        }

        let ffmpeg = config.ffmpeg.enabled && probe_ffmpeg(&config.ffmpeg.binary).await;

        let caps = Self { engines, ffmpeg };
        log::info!(
            "エンジンプローブ完了: {:?} (ffmpeg: {})",
            caps.engines,
            caps.ffmpeg
        );
        caps
    }

    /// 指定したエンジンが使用可能かどうか
    pub fn is_available(&self, kind: EngineKind) -> bool {
        self.engines.contains(&kind)
    }

    /// 使用可能なエンジンの一覧（優先度とは無関係の定義順）
    pub fn available(&self) -> Vec<EngineKind> {
        self.engines.iter().copied().collect()
    }

    /// 使用可能なエンジンが1つもないかどうか
    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}

/// ローカルMLエンジンのチェック
///
/// バイナリが起動でき、かつモデルファイルが存在すれば使用可とする。
async fn probe_local_ml(config: &Config) -> bool {
    let model_ok = match config.local_ml.model_path.as_deref() {
        Some(path) => Path::new(path).exists(),
        None => false,
    };
    if !model_ok {
        log::debug!("local_ml: モデルファイル未設定または不在");
        return false;
    }
    binary_spawns(&config.local_ml.binary, &["--help"]).await
}

/// リモートAPIのチェック
///
/// 最小コストの判定としてAPI Keyの有無のみを見る。実際の到達性は
/// 呼び出し時にチェーンが処理する。
fn probe_remote(config: &Config) -> bool {
    match &config.remote {
        Some(remote) if !remote.api_key.is_empty() => true,
        Some(_) => {
            log::debug!("remote: API Keyが空");
            false
        }
        None => {
            log::debug!("remote: 設定なし");
            false
        }
    }
}

/// オフラインデコーダのチェック
async fn probe_offline(config: &Config) -> bool {
    binary_spawns(&config.offline.binary, &["-h"]).await
}

/// ffmpegのチェック（`ffmpeg -version` が正常終了するか）
async fn probe_ffmpeg(binary: &str) -> bool {
    match Command::new(binary).arg("-version").output().await {
        Ok(output) => output.status.success(),
        Err(e) => {
            log::warn!("ffmpegが見つかりません。音声変換は制限されます: {}", e);
            false
        }
    }
}

/// バイナリが起動できるかどうか
///
/// 終了コードは問わない（ヘルプ表示で非0を返すツールがあるため）。
/// 起動自体に失敗した場合のみ使用不可とみなす。
async fn binary_spawns(binary: &str, args: &[&str]) -> bool {
    match Command::new(binary).args(args).output().await {
        Ok(_) => true,
        Err(e) => {
            log::debug!("バイナリ起動失敗 {}: {}", binary, e);
            false
        }
    }
}
