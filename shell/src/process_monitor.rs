use std::sync::Arc;
use sysinfo::{ProcessesToUpdate, System};
use tokio::sync::{mpsc, RwLock};
use tokio::time::{interval, Duration};
use tracing::info;

use crate::config::Config;
use crate::event::ShellEvent;

fn game_present(sys: &System, executable: &str) -> bool {
    let target = executable.to_lowercase();
    sys.processes()
        .values()
        .any(|p| p.name().to_string_lossy().to_lowercase() == target)
}

/// One-off check used at bootstrap: is a process named `executable` running?
pub fn is_running(executable: &str) -> bool {
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::All, false);
    game_present(&sys, executable)
}

/// Polls the OS process list and emits [`ShellEvent::GameRunning`] on every
/// start/stop edge of the configured game executable.
///
/// `initially_running` is the answer the bootstrap already acted on, so the
/// first poll does not repeat it.
pub async fn run(config: Arc<RwLock<Config>>, initially_running: bool, tx: mpsc::Sender<ShellEvent>) {
    let mut sys = System::new();
    let mut running = initially_running;
    let mut period = config.read().await.general.effective_poll_interval();
    let mut ticker = interval(Duration::from_secs(period));

    loop {
        ticker.tick().await;

        sys.refresh_processes(ProcessesToUpdate::All, false);

        let (found, new_period) = {
            let config = config.read().await;
            (
                game_present(&sys, &config.general.game_executable),
                config.general.effective_poll_interval(),
            )
        };

        if new_period != period {
            period = new_period;
            ticker = interval(Duration::from_secs(period));
        }

        if found != running {
            running = found;
            info!("[monitor] Game {}", if found { "detected" } else { "exited" });
            if tx.send(ShellEvent::GameRunning(found)).await.is_err() {
                break;
            }
        }
    }
}
