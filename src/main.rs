use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use suspect_watch_rs::backend::HttpBackend;
use suspect_watch_rs::clock::SystemClock;
use suspect_watch_rs::config::Config;
use suspect_watch_rs::server::{self, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "suspect_watch_rs=info,tower_http=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = Config::parse();
    cfg.validate().context("invalid configuration")?;

    tracing::info!(
        backend = %cfg.backend_url,
        bind = %cfg.bind,
        auto_scan_ms = cfg.auto_scan_ms,
        roster_ms = cfg.roster_ms,
        request_timeout_ms = cfg.request_timeout_ms,
        ui_dir = %cfg.ui_dir.display(),
        "suspect-watch-rs configuration"
    );

    let backend = Arc::new(
        HttpBackend::new(&cfg.backend_url, cfg.request_timeout())
            .context("failed to build backend client")?,
    );
    let video_url = backend.video_url();
    let state = AppState::new(backend, &cfg, Arc::new(SystemClock), video_url);

    if cfg.no_roster {
        tracing::info!("background roster polling disabled");
    } else {
        state.roster.start(cfg.roster_period()).await;
    }

    server::spawn_server(&cfg.bind, state.clone(), &cfg.ui_dir).await?;

    // Let an in-flight scan settle its own state; only future ticks stop here.
    state.controller.set_auto_scan(false).await;
    state.roster.stop().await;
    Ok(())
}
