mod bootstrap;
mod config;
mod coordinator;
mod deck_menu;
mod error;
mod event;
mod hub;
mod logging;
mod overlay;
mod paths;
mod process_monitor;
mod restart;
mod shell;
mod store;
mod watch;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, RwLock};
use tracing::{error, info};

use crate::bootstrap::{BootContext, Bootstrapper, GameCheck, LogSplash};
use crate::event::ShellEvent;
use crate::restart::{RestartManager, StdinConfirmation, SystemProcess};
use crate::shell::Flow;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        error!("{e:#}");
        eprintln!("deckwatch-shell: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // ── App data directory ────────────────────────────────────────────────────
    let app_dir = paths::app_data_dir()?;
    std::fs::create_dir_all(&app_dir)
        .with_context(|| format!("Failed to create app data directory {}", app_dir.display()))?;

    // ── Logging ───────────────────────────────────────────────────────────────
    let log_dir = paths::log_dir()?;
    let _log_guard = logging::init(Some(log_dir.as_path()));

    // ── Configuration ─────────────────────────────────────────────────────────
    let config_path = paths::config_file_path()?;
    let initial_config = config::load_or_default(&config_path).unwrap_or_else(|e| {
        error!("[config] Error (using defaults): {e:#}");
        config::Config::default()
    });
    let initial_locale = initial_config.general.locale.clone();
    let game_executable = initial_config.general.game_executable.clone();
    let launcher = initial_config
        .relaunch
        .launcher
        .clone()
        .or_else(restart::default_launcher);
    let shared_config = Arc::new(RwLock::new(initial_config));

    let (event_tx, mut event_rx) = mpsc::channel::<ShellEvent>(32);
    // Restart requests bypass the bounded queue so they are never dropped.
    let (terminate_tx, mut terminate_rx) = tokio::sync::watch::channel(false);

    // ── Bootstrap: loading indicator, then wait for the store ─────────────────
    let mut bootstrapper = Bootstrapper::new(Box::new(LogSplash));
    let booting = bootstrapper.start()?;

    let store_path = paths::store_file_path()?;
    let (store, ready) = store::initialize(store_path.clone());

    let restart = RestartManager::new(
        restart::bundle_path()?,
        launcher,
        Box::new(StdinConfirmation),
        Box::new(SystemProcess::new(terminate_tx)),
    );
    let check_game: GameCheck = Box::new(move || process_monitor::is_running(&game_executable));

    let mut shell = booting
        .wait(ready, BootContext { store, check_game, restart })
        .await?;
    let game_running = shell.hub().is_tracking();

    // ── Background producers ──────────────────────────────────────────────────
    tokio::spawn(config::watch_config(config_path, initial_locale, event_tx.clone()));
    tokio::spawn(store::watch_store(store_path, event_tx.clone()));
    tokio::spawn(process_monitor::run(
        Arc::clone(&shared_config),
        game_running,
        event_tx.clone(),
    ));

    // Graceful shutdown on Ctrl+C.
    {
        let tx = event_tx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = tx.send(ShellEvent::Shutdown).await;
            }
        });
    }

    info!("deckwatch-shell v{} started", env!("CARGO_PKG_VERSION"));

    // ── Event loop ────────────────────────────────────────────────────────────
    loop {
        let evt = tokio::select! {
            biased;
            Ok(()) = terminate_rx.changed() => ShellEvent::Shutdown,
            Some(evt) = event_rx.recv() => evt,
            else => break,
        };
        if let ShellEvent::ConfigReloaded(new_config) = &evt {
            info!("[config] Reloaded");
            *shared_config.write().await = new_config.clone();
        }
        if shell.handle(evt) == Flow::Exit {
            break;
        }
    }

    Ok(())
}
