use std::fs::File;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use daemonize::Daemonize;
use log::{LevelFilter, info};
use syslog::{BasicLogger, Facility, Formatter3164};

use tempfaderd::{
    app_context::AppState, application::Application, cli::Cli, config::ConfigManager,
};

const DAEMON_LOG: &str = "/var/tmp/tempfaderd.log";

fn init_log(verbose: bool) -> Result<()> {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    syslog::unix(Formatter3164 {
        facility: Facility::LOG_USER,
        hostname: None,
        process: "tempfaderd".into(),
        pid: std::process::id(),
    })
    .map_err(|e| anyhow!("{e}"))
    .and_then(|logger| {
        log::set_boxed_logger(Box::new(BasicLogger::new(logger)))
            .map(|_| log::set_max_level(level))
            .map_err(|e| anyhow!("{e}"))
    })
}

fn into_daemon() -> Result<()> {
    File::create(DAEMON_LOG)
        .and_then(|out| Ok((out.try_clone()?, out)))
        .with_context(|| format!("Failed to open {DAEMON_LOG}"))
        .and_then(|(stderr, stdout)| {
            Daemonize::new()
                .stdout(stdout)
                .stderr(stderr)
                .start()
                .map_err(|e| anyhow!("{e}"))
        })
}

async fn check(config_manager: ConfigManager) -> Result<()> {
    let state = AppState::new(config_manager).await?;
    let summary = serde_json::to_string_pretty(&state.summary().await)
        .context("Failed to serialize fader summary")?;
    println!("{summary}");
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    #[cfg(feature = "tokio-console")]
    console_subscriber::init();

    let config_manager = ConfigManager::load(cli.config).await?;
    if cli.check {
        return check(config_manager).await;
    }

    info!("tempfaderd {} starting", env!("CARGO_PKG_VERSION"));
    Application::builder()
        .with_config_manager(config_manager)
        .build()?
        .run()
        .await
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_log(cli.verbose)?;

    // fork before the runtime spawns its worker threads
    if cli.daemonize && !cli.check {
        into_daemon()?;
    }

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?
        .block_on(run(cli))
}
