/// Confirm-then-relaunch flow triggered by a locale change.
///
/// ```text
/// Idle ──locale_changed──▶ PendingConfirmation ──confirm──▶ Terminating ──▶ exit + relaunch
///                                   │
///                                   └──cancel──▶ Idle
/// ```
///
/// Only this module touches the state and the restart-requested flag.
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::error::ShellError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartState {
    Idle,
    PendingConfirmation,
    Terminating,
}

impl RestartState {
    fn can_become(self, next: RestartState) -> bool {
        matches!(
            (self, next),
            (RestartState::Idle, RestartState::PendingConfirmation)
                | (RestartState::PendingConfirmation, RestartState::Terminating)
                | (RestartState::PendingConfirmation, RestartState::Idle)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Confirm,
    Cancel,
}

/// Text of the blocking confirmation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartPrompt {
    pub title: &'static str,
    pub message: &'static str,
    pub confirm_label: &'static str,
    pub cancel_label: &'static str,
}

pub const LOCALE_RESTART_PROMPT: RestartPrompt = RestartPrompt {
    title: "Language change",
    message: "You must restart for the language change to take effect",
    confirm_label: "OK",
    cancel_label: "Cancel",
};

/// Presents a prompt and blocks until the user picks one of the two outcomes.
pub trait Confirmation: Send {
    fn confirm(&mut self, prompt: &RestartPrompt) -> ConfirmOutcome;
}

/// Process-level side effects of a restart.
pub trait ProcessControl: Send {
    /// Asks for orderly termination. Must not terminate synchronously.
    fn request_termination(&self);

    /// Starts `target` through `launcher` (or directly when `None`).
    fn launch(&self, launcher: Option<&Path>, target: &Path) -> Result<()>;
}

pub struct RestartManager {
    state: RestartState,
    restart_requested: bool,
    bundle_path: PathBuf,
    launcher: Option<PathBuf>,
    confirmation: Box<dyn Confirmation>,
    process: Box<dyn ProcessControl>,
}

impl RestartManager {
    pub fn new(
        bundle_path: PathBuf,
        launcher: Option<PathBuf>,
        confirmation: Box<dyn Confirmation>,
        process: Box<dyn ProcessControl>,
    ) -> Self {
        Self {
            state: RestartState::Idle,
            restart_requested: false,
            bundle_path,
            launcher,
            confirmation,
            process,
        }
    }

    pub fn state(&self) -> RestartState {
        self.state
    }

    pub fn restart_requested(&self) -> bool {
        self.restart_requested
    }

    fn transition(&mut self, next: RestartState) -> Result<(), ShellError> {
        if !self.state.can_become(next) {
            return Err(ShellError::InvalidTransition {
                from: format!("{:?}", self.state),
                to: format!("{next:?}"),
            });
        }
        debug!(from = ?self.state, to = ?next, "restart state");
        self.state = next;
        Ok(())
    }

    /// Handles a `locale_changed` signal: asks for confirmation and, if
    /// granted, requests termination. Rejected unless currently idle.
    pub fn on_locale_changed(&mut self) -> Result<RestartState, ShellError> {
        self.transition(RestartState::PendingConfirmation)?;
        info!("locale changed, restart confirmation requested");

        match self.confirmation.confirm(&LOCALE_RESTART_PROMPT) {
            ConfirmOutcome::Confirm => {
                self.transition(RestartState::Terminating)?;
                self.restart_requested = true;
                info!("restart confirmed, terminating");
                self.process.request_termination();
            }
            ConfirmOutcome::Cancel => {
                self.transition(RestartState::Idle)?;
                info!("restart declined");
            }
        }
        Ok(self.state)
    }

    /// Terminate hook. Relaunches the application when a restart was
    /// confirmed; a failed launch is logged and not retried. Returns whether
    /// a launch was attempted.
    pub fn on_terminate(&self) -> bool {
        if !self.restart_requested {
            return false;
        }
        info!(bundle = %self.bundle_path.display(), "relaunching");
        if let Err(e) = self.process.launch(self.launcher.as_deref(), &self.bundle_path) {
            error!("relaunch failed: {e:#}");
        }
        true
    }
}

// ── Host implementations ──────────────────────────────────────────────────────

/// Terminal prompt. Anything other than an explicit yes/ok cancels.
pub struct StdinConfirmation;

impl Confirmation for StdinConfirmation {
    fn confirm(&mut self, prompt: &RestartPrompt) -> ConfirmOutcome {
        let mut stdout = std::io::stdout().lock();
        let _ = write!(
            stdout,
            "{}\n{}\n[{} = y / {} = n] ",
            prompt.title, prompt.message, prompt.confirm_label, prompt.cancel_label
        );
        let _ = stdout.flush();

        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return ConfirmOutcome::Cancel;
        }
        parse_answer(&answer)
    }
}

fn parse_answer(answer: &str) -> ConfirmOutcome {
    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" | "ok" => ConfirmOutcome::Confirm,
        _ => ConfirmOutcome::Cancel,
    }
}

/// Real process control: termination raises a flag the event loop selects
/// on, launches spawn a detached child.
pub struct SystemProcess {
    terminate: watch::Sender<bool>,
}

impl SystemProcess {
    pub fn new(terminate: watch::Sender<bool>) -> Self {
        Self { terminate }
    }
}

impl ProcessControl for SystemProcess {
    fn request_termination(&self) {
        // Never blocks and never drops the request, even with a busy loop.
        self.terminate.send_replace(true);
    }

    fn launch(&self, launcher: Option<&Path>, target: &Path) -> Result<()> {
        let mut command = match launcher {
            Some(launcher) => {
                let mut c = Command::new(launcher);
                c.arg(target);
                c
            }
            None => Command::new(target),
        };
        command
            .spawn()
            .with_context(|| format!("Failed to launch {}", target.display()))?;
        Ok(())
    }
}

/// OS launcher used when the config does not name one.
pub fn default_launcher() -> Option<PathBuf> {
    if cfg!(target_os = "macos") {
        Some(PathBuf::from("/usr/bin/open"))
    } else {
        None
    }
}

/// Path of the running application: the enclosing `.app` bundle when there
/// is one, the executable otherwise.
pub fn bundle_path() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Failed to locate the running executable")?;
    Ok(enclosing_bundle(&exe).unwrap_or(exe))
}

fn enclosing_bundle(exe: &Path) -> Option<PathBuf> {
    exe.ancestors()
        .find(|p| p.extension().is_some_and(|ext| ext == "app"))
        .map(Path::to_path_buf)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Always answers with the same outcome.
    pub struct Scripted(pub ConfirmOutcome);

    impl Confirmation for Scripted {
        fn confirm(&mut self, _prompt: &RestartPrompt) -> ConfirmOutcome {
            self.0
        }
    }

    /// Counts termination requests and launches instead of performing them.
    #[derive(Default, Clone)]
    pub struct CountingProcess {
        pub terminations: Arc<AtomicUsize>,
        pub launches: Arc<AtomicUsize>,
    }

    impl CountingProcess {
        pub fn terminations(&self) -> usize {
            self.terminations.load(Ordering::SeqCst)
        }

        pub fn launches(&self) -> usize {
            self.launches.load(Ordering::SeqCst)
        }
    }

    impl ProcessControl for CountingProcess {
        fn request_termination(&self) {
            self.terminations.fetch_add(1, Ordering::SeqCst);
        }

        fn launch(&self, _launcher: Option<&Path>, _target: &Path) -> Result<()> {
            self.launches.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    pub fn manager(outcome: ConfirmOutcome) -> (RestartManager, CountingProcess) {
        let process = CountingProcess::default();
        let m = RestartManager::new(
            PathBuf::from("/tmp/Deckwatch.app"),
            None,
            Box::new(Scripted(outcome)),
            Box::new(process.clone()),
        );
        (m, process)
    }
}
