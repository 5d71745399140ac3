/// The wired application: every component the bootstrap builds, plus the
/// dispatch from [`ShellEvent`]s to them.
use std::sync::PoisonError;

use tracing::{debug, info, warn};

use crate::coordinator::WindowCoordinator;
use crate::deck_menu::{lock_windows_title, DeckMenuSync, MenuCommand};
use crate::event::ShellEvent;
use crate::hub::{EventHub, HubEvent, Role, SharedObserver};
use crate::overlay::{SharedCardCount, SharedTracker};
use crate::restart::RestartManager;
use crate::store::{self, SharedStore};

/// What the event loop should do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct Shell {
    pub(crate) hub: EventHub,
    pub(crate) player: SharedTracker,
    pub(crate) opponent: SharedTracker,
    pub(crate) player_count: SharedCardCount,
    pub(crate) opponent_count: SharedCardCount,
    pub(crate) coordinator: WindowCoordinator,
    pub(crate) deck_menu: DeckMenuSync,
    pub(crate) restart: RestartManager,
    pub(crate) store: SharedStore,
    pub(crate) lock_title: &'static str,
}

impl Shell {
    pub fn hub(&self) -> &EventHub {
        &self.hub
    }

    pub fn player(&self) -> &SharedTracker {
        &self.player
    }

    pub fn opponent(&self) -> &SharedTracker {
        &self.opponent
    }

    pub fn card_count(&self, role: Role) -> &SharedCardCount {
        match role {
            Role::Player => &self.player_count,
            Role::Opponent => &self.opponent_count,
        }
    }

    /// All overlay windows with the role each one is registered under.
    pub fn overlays(&self) -> Vec<(SharedObserver, Role)> {
        let player: SharedObserver = self.player.clone();
        let player_count: SharedObserver = self.player_count.clone();
        let opponent_count: SharedObserver = self.opponent_count.clone();
        let opponent: SharedObserver = self.opponent.clone();
        vec![
            (player, Role::Player),
            (player_count, Role::Player),
            (opponent_count, Role::Opponent),
            (opponent, Role::Opponent),
        ]
    }

    pub fn deck_menu(&self) -> &DeckMenuSync {
        &self.deck_menu
    }

    pub fn restart(&self) -> &RestartManager {
        &self.restart
    }

    /// Current label of the lock/unlock toggle.
    pub fn lock_title(&self) -> &'static str {
        self.lock_title
    }

    pub fn handle(&mut self, event: ShellEvent) -> Flow {
        match event {
            ShellEvent::GameRunning(running) => {
                self.hub.set_running(running);
            }
            ShellEvent::GameState { role, event } => {
                self.hub.publish(role, &HubEvent::State(event));
            }
            ShellEvent::DeckChange => {
                store::reload_shared(&self.store);
                self.rebuild_deck_menu();
            }
            ShellEvent::LocaleChanged => {
                if let Err(e) = self.restart.on_locale_changed() {
                    warn!("locale change ignored: {e}");
                }
            }
            ShellEvent::ConfigReloaded(_) => {
                // Applied to the shared config by the event loop.
                debug!("config reloaded");
            }
            ShellEvent::Menu(command) => self.dispatch(command),
            ShellEvent::ManagementSurfaceOpened => self.coordinator.on_management_surface_opened(),
            ShellEvent::ManagementSurfaceClosed => self.coordinator.on_management_surface_closed(),
            ShellEvent::Shutdown => {
                self.restart.on_terminate();
                info!("shutting down");
                return Flow::Exit;
            }
        }
        Flow::Continue
    }

    fn dispatch(&mut self, command: MenuCommand) {
        match command {
            MenuCommand::Reset => self.coordinator.reset(),
            MenuCommand::OpenDeck(name) => {
                let store = self.store.read().unwrap_or_else(PoisonError::into_inner);
                self.deck_menu.on_deck_selected(&name, &*store, &self.player);
            }
            MenuCommand::ToggleWindowsLock => self.toggle_windows_lock(),
        }
    }

    pub(crate) fn rebuild_deck_menu(&mut self) {
        let store = self.store.read().unwrap_or_else(PoisonError::into_inner);
        self.deck_menu.rebuild(&*store);
    }

    fn toggle_windows_lock(&mut self) {
        let locked = {
            let mut store = self.store.write().unwrap_or_else(PoisonError::into_inner);
            let locked = !store.windows_locked();
            if let Err(e) = store.set_windows_locked(locked) {
                warn!("windows lock not persisted: {e:#}");
            }
            locked
        };
        self.coordinator.apply_lock(locked);
        self.lock_title = lock_windows_title(locked);
        info!(locked, "windows lock toggled");
    }
}
