/// Keeps the two tracker windows' stacking level in lock-step with the deck
/// management surface: lowered to `Normal` while it is open so the modal is
/// not trapped beneath them, restored to `AlwaysOnTop` once it closes.
use std::sync::{MutexGuard, PoisonError};

use tracing::info;

use crate::overlay::{
    CardCountWindow, SharedCardCount, SharedTracker, TrackerWindow, WindowLevel,
};

pub struct WindowCoordinator {
    player: SharedTracker,
    opponent: SharedTracker,
    card_counts: Vec<SharedCardCount>,
}

fn tracker(shared: &SharedTracker) -> MutexGuard<'_, TrackerWindow> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

fn card_count(shared: &SharedCardCount) -> MutexGuard<'_, CardCountWindow> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

impl WindowCoordinator {
    pub fn new(
        player: SharedTracker,
        opponent: SharedTracker,
        card_counts: Vec<SharedCardCount>,
    ) -> Self {
        Self { player, opponent, card_counts }
    }

    pub fn on_management_surface_opened(&self) {
        if self.set_tracker_level(WindowLevel::Normal) {
            info!("management surface opened, trackers lowered");
        }
    }

    pub fn on_management_surface_closed(&self) {
        if self.set_tracker_level(WindowLevel::AlwaysOnTop) {
            info!("management surface closed, trackers restored");
        }
    }

    /// Returns whether at least one tracker actually moved.
    fn set_tracker_level(&self, level: WindowLevel) -> bool {
        let player = tracker(&self.player).window.set_level(level);
        let opponent = tracker(&self.opponent).window.set_level(level);
        player || opponent
    }

    /// Clears per-game state on both trackers.
    pub fn reset(&self) {
        tracker(&self.player).game_start();
        tracker(&self.opponent).game_start();
        info!("trackers reset");
    }

    /// Applies the persisted lock flag to every overlay window.
    pub fn apply_lock(&self, locked: bool) {
        tracker(&self.player).window.set_locked(locked);
        tracker(&self.opponent).window.set_locked(locked);
        for hud in &self.card_counts {
            card_count(hud).window.set_locked(locked);
        }
    }
}
