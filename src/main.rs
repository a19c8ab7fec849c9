use anyhow::{Context, Result};
use env_logger::Env;
use flavorcraft_transcribe::config::Config;
use flavorcraft_transcribe::pipeline::Pipeline;
use flavorcraft_transcribe::probe::EngineCapabilities;
use flavorcraft_transcribe::rules::RuleTable;
use flavorcraft_transcribe::types::{AudioSource, EngineKind};

#[tokio::main]
async fn main() -> Result<()> {
    // コマンドライン引数をパース
    let args: Vec<String> = std::env::args().collect();

    // 設定ファイル生成モード
    if args.len() > 1 && args[1] == "--generate-config" {
        let config_path = if args.len() > 2 {
            &args[2]
        } else {
            "config.toml"
        };
        Config::write_default(config_path)?;
        println!("設定ファイルを生成しました: {}", config_path);
        return Ok(());
    }

    // ルールテーブル生成モード
    if args.len() > 1 && args[1] == "--generate-rules" {
        let rules_path = if args.len() > 2 { &args[2] } else { "rules.toml" };
        RuleTable::write_default(rules_path)?;
        println!("ルールテーブルを生成しました: {}", rules_path);
        return Ok(());
    }

    // エンジン一覧表示モード
    if args.len() > 1 && args[1] == "--show-engines" {
        let config_path = if args.len() > 2 {
            &args[2]
        } else {
            "config.toml"
        };
        let config = Config::load_or_default(config_path)?;
        init_logger(&config);
        show_engines(&config).await;
        return Ok(());
    }

    // 通常モード: <音声ファイル> [config.toml]
    let audio_path = match args.get(1) {
        Some(path) if !path.starts_with("--") => path.clone(),
        _ => {
            eprintln!("使い方: flavorcraft-transcribe <音声ファイル> [config.toml]");
            eprintln!("        flavorcraft-transcribe --generate-config [path]");
            eprintln!("        flavorcraft-transcribe --generate-rules [path]");
            eprintln!("        flavorcraft-transcribe --show-engines [config.toml]");
            std::process::exit(2);
        }
    };
    let config_path = args.get(2).map(|s| s.as_str()).unwrap_or("config.toml");

    // 設定を読み込み
    let config = Config::load_or_default(config_path)?;
    init_logger(&config);

    log::info!("flavorcraft-transcribe を起動します");
    log::debug!("設定: {:?}", config);

    // エンジンの使用可否を起動時に一度だけ判定
    let caps = EngineCapabilities::probe(&config).await;
    if caps.is_empty() {
        log::warn!("使用可能なエンジンがありません。文字起こしは必ず失敗します");
    }

    let pipeline = Pipeline::new(&config, &caps).context("パイプラインの初期化に失敗")?;

    let source = AudioSource::from_path(&audio_path);
    match pipeline.process(&source).await {
        Ok(report) => {
            // 結果をJSON形式で出力。エンジンレベルの失敗も
            // success: false の正常な応答として扱う
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(e) => {
            // 入力不正のみ異常終了
            log::error!("入力エラー: {}", e);
            anyhow::bail!("入力エラー: {}", e)
        }
    }
}

/// ロガーを初期化
///
/// RUST_LOG があればそちらを優先し、なければ設定ファイルの
/// log_level を使う。
fn init_logger(config: &Config) {
    env_logger::Builder::from_env(Env::default().default_filter_or(&config.output.log_level))
        .format_timestamp(None)
        .init();
}

/// プローブ結果を表示
async fn show_engines(config: &Config) {
    let caps = EngineCapabilities::probe(config).await;

    println!("エンジンの使用可否:");
    for kind in [
        EngineKind::LocalMl,
        EngineKind::Remote,
        EngineKind::Offline,
        EngineKind::Placeholder,
    ] {
        let mark = if caps.is_available(kind) { "o" } else { "x" };
        println!("  [{}] {}", mark, kind);
    }
    println!("  [{}] ffmpeg (音声変換)", if caps.ffmpeg { "o" } else { "x" });
}
