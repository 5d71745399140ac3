use notify::{Config as NotifyConfig, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::error;

use crate::event::ShellEvent;

/// Watches the parent directory of `path` and, whenever the file is created
/// or modified, calls `on_change` and forwards the events it returns.
///
/// Runs until the event channel closes. Watcher setup failures are logged and
/// end the task; the shell keeps running without hot reload.
pub async fn watch_file<F>(path: PathBuf, tx: mpsc::Sender<ShellEvent>, mut on_change: F)
where
    F: FnMut() -> Vec<ShellEvent> + Send,
{
    let (watch_tx, mut watch_rx) = mpsc::channel::<notify::Event>(16);

    let mut watcher = match RecommendedWatcher::new(
        move |res: notify::Result<notify::Event>| {
            if let Ok(event) = res {
                let _ = watch_tx.blocking_send(event);
            }
        },
        NotifyConfig::default(),
    ) {
        Ok(w) => w,
        Err(e) => {
            error!("[watch] Failed to create file watcher: {e}");
            return;
        }
    };

    // Watch the parent directory rather than the file directly so we catch
    // editor-style atomic saves (write-new + rename).
    let watch_dir = match path.parent() {
        Some(d) => d.to_path_buf(),
        None => {
            error!("[watch] {} has no parent directory", path.display());
            return;
        }
    };

    if let Err(e) = watcher.watch(&watch_dir, RecursiveMode::NonRecursive) {
        error!("[watch] Failed to watch {}: {e}", watch_dir.display());
        return;
    }

    while let Some(event) = watch_rx.recv().await {
        let affects_file = event.paths.iter().any(|p| p == path.as_path());
        let is_write = matches!(
            event.kind,
            notify::EventKind::Create(_) | notify::EventKind::Modify(_)
        );

        if affects_file && is_write {
            for evt in on_change() {
                if tx.send(evt).await.is_err() {
                    return;
                }
            }
        }
    }
}
