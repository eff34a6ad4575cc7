mod action;
mod app;
mod app_state;
mod component;
mod components;
mod focus;
mod intent;
mod mpv;
mod player;
mod theme;
mod widgets;

use std::sync::Arc;

use tube_core::ready_signal;

use crate::player::{MpvLibrary, SharedLibrary};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = tube_core::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;

    let log_path = data_dir.join("searchtube.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override; default to debug.
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    // Print log path to stderr so the operator can tail it immediately.
    eprintln!("searchtube log: {}", log_path.display());

    tracing::info!("searchtube starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let config = match tube_core::config::Config::load() {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("config unreadable, using defaults: {}", e);
            tube_core::config::Config::default()
        }
    };

    // ── Player library loader ────────────────────────────────────────────────
    // Resolves readiness once mpv is up.  On failure the resolver is dropped
    // and every waiter sees `None`.
    let (resolver, library_signal) = ready_signal::<SharedLibrary>();
    let loader_config = config.clone();
    tokio::spawn(async move {
        match MpvLibrary::launch(&loader_config).await {
            Ok(lib) => {
                resolver.resolve(Arc::new(lib));
            }
            Err(e) => {
                tracing::error!("mpv library failed to load: {:#}", e);
                drop(resolver);
            }
        }
    });

    // ── Run TUI ──────────────────────────────────────────────────────────────
    let app = app::App::new(&config, library_signal);
    app.run().await?;

    Ok(())
}
