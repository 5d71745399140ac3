/// One-shot startup.
///
/// [`Bootstrapper::start`] shows the loading indicator and hands back a
/// [`Booting`] handle. [`Booting::wait`] suspends on the store's readiness
/// signal and only then builds the hub, the overlay windows, their
/// subscriptions and the deck menu. Nothing is constructed before readiness.
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::oneshot;
use tracing::{error, info};

use crate::coordinator::WindowCoordinator;
use crate::deck_menu::{lock_windows_title, DeckMenuSync};
use crate::error::ShellError;
use crate::hub::{EventHub, Role};
use crate::overlay::{CardCountWindow, TrackerWindow};
use crate::restart::RestartManager;
use crate::shell::Shell;
use crate::store::SharedStore;

/// Loading indicator shown while storage initializes.
pub trait LoadingIndicator: Send {
    fn show(&mut self);
    fn hide(&mut self);
}

/// Indicator that only reports progress in the log.
pub struct LogSplash;

impl LoadingIndicator for LogSplash {
    fn show(&mut self) {
        info!("loading card database…");
    }

    fn hide(&mut self) {
        info!("card database ready");
    }
}

/// Answers whether the game is running right now.
pub type GameCheck = Box<dyn FnOnce() -> bool + Send>;

/// Everything the wiring step needs besides the indicator.
pub struct BootContext {
    pub store: SharedStore,
    /// Asked once the store is ready, so tracking starts from a fresh answer.
    pub check_game: GameCheck,
    pub restart: RestartManager,
}

pub struct Bootstrapper {
    splash: Option<Box<dyn LoadingIndicator>>,
}

impl Bootstrapper {
    pub fn new(splash: Box<dyn LoadingIndicator>) -> Self {
        Self { splash: Some(splash) }
    }

    /// Shows the loading indicator. Fails on every call after the first.
    pub fn start(&mut self) -> Result<Booting, ShellError> {
        let mut splash = self.splash.take().ok_or(ShellError::AlreadyStarted)?;
        splash.show();
        Ok(Booting { splash })
    }
}

/// Startup in progress: the indicator is up, nothing else exists yet.
pub struct Booting {
    splash: Box<dyn LoadingIndicator>,
}

impl Booting {
    /// Waits for the store and wires the shell. Fails without building
    /// anything if the store drops its readiness signal.
    pub async fn wait(
        self,
        ready: oneshot::Receiver<()>,
        ctx: BootContext,
    ) -> Result<Shell, ShellError> {
        if ready.await.is_err() {
            error!("configuration store never became ready");
            return Err(ShellError::StoreUnavailable);
        }
        Ok(self.finish(ctx))
    }

    fn finish(mut self, ctx: BootContext) -> Shell {
        self.splash.hide();

        let mut hub = EventHub::new();

        let player = Arc::new(Mutex::new(TrackerWindow::new(Role::Player)));
        let opponent = Arc::new(Mutex::new(TrackerWindow::new(Role::Opponent)));
        let player_count = Arc::new(Mutex::new(CardCountWindow::new(Role::Player)));
        let opponent_count = Arc::new(Mutex::new(CardCountWindow::new(Role::Opponent)));

        for tracker in [&player, &opponent] {
            tracker.lock().unwrap_or_else(PoisonError::into_inner).window.show();
        }
        for hud in [&player_count, &opponent_count] {
            hud.lock().unwrap_or_else(PoisonError::into_inner).window.show();
        }

        hub.register(player.clone(), Role::Player);
        hub.register(player_count.clone(), Role::Player);
        hub.register(opponent_count.clone(), Role::Opponent);
        hub.register(opponent.clone(), Role::Opponent);

        let coordinator = WindowCoordinator::new(
            player.clone(),
            opponent.clone(),
            vec![player_count.clone(), opponent_count.clone()],
        );
        let locked = ctx
            .store
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .windows_locked();
        coordinator.apply_lock(locked);

        if (ctx.check_game)() {
            hub.start_tracking();
        }

        let mut shell = Shell {
            hub,
            player,
            opponent,
            player_count,
            opponent_count,
            coordinator,
            deck_menu: DeckMenuSync::new(),
            restart: ctx.restart,
            store: ctx.store,
            lock_title: lock_windows_title(locked),
        };
        shell.rebuild_deck_menu();
        info!(subscriptions = shell.hub().subscription_count(), "shell wired");
        shell
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::restart::{testing as restart_testing, ConfirmOutcome};
    use crate::restart::testing::CountingProcess;
    use crate::store::{DeckStore, StoreData};
    use std::sync::RwLock;

    pub struct Silent;

    impl LoadingIndicator for Silent {
        fn show(&mut self) {}
        fn hide(&mut self) {}
    }

    /// A fully wired shell over an in-memory store.
    pub fn shell(data: StoreData, outcome: ConfirmOutcome) -> (Shell, CountingProcess) {
        shell_over(Arc::new(RwLock::new(DeckStore::in_memory(data))), outcome)
    }

    /// A fully wired shell over an existing store.
    pub fn shell_over(store: SharedStore, outcome: ConfirmOutcome) -> (Shell, CountingProcess) {
        let (restart, process) = restart_testing::manager(outcome);
        let ctx = BootContext { store, check_game: Box::new(|| false), restart };
        (Booting { splash: Box::new(Silent) }.finish(ctx), process)
    }
}
