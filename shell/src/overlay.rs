/// Overlay windows and their observer state.
///
/// Rendering belongs to the host UI; what lives here is the part the shell
/// coordinates: stacking level, visibility, lock state, and the per-role state
/// each window keeps in response to hub events.
use std::sync::{Arc, Mutex};

use anyhow::Result;
use tracing::debug;

use crate::hub::{Observer, Role, StateEvent};

/// Stacking tier of an overlay window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowLevel {
    /// Standard window layering.
    Normal,
    /// Stays visible above full-screen applications.
    AlwaysOnTop,
}

impl WindowLevel {
    /// Value handed to the platform windowing layer (normal vs. screen-saver tier).
    pub fn platform_value(self) -> i64 {
        match self {
            WindowLevel::Normal => 0,
            WindowLevel::AlwaysOnTop => 1000,
        }
    }
}

/// Host-independent state of one overlay window.
#[derive(Debug)]
pub struct OverlayWindow {
    title: String,
    level: WindowLevel,
    visible: bool,
    locked: bool,
    /// Number of times a level was actually pushed to the windowing layer.
    level_applications: u32,
}

impl OverlayWindow {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            level: WindowLevel::AlwaysOnTop,
            visible: false,
            locked: false,
            level_applications: 0,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn level(&self) -> WindowLevel {
        self.level
    }

    /// Applies `level` unless the window is already there. Returns whether
    /// anything changed.
    pub fn set_level(&mut self, level: WindowLevel) -> bool {
        if self.level == level {
            return false;
        }
        debug!(window = %self.title, ?level, value = level.platform_value(), "window level");
        self.level = level;
        self.level_applications += 1;
        true
    }

    pub fn level_applications(&self) -> u32 {
        self.level_applications
    }

    /// Shows the window and orders it in front of everything else.
    pub fn show(&mut self) {
        self.visible = true;
        debug!(window = %self.title, "shown and ordered front");
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }
}

/// Primary tracker: the full card list for one side of the game.
#[derive(Debug)]
pub struct TrackerWindow {
    pub window: OverlayWindow,
    role: Role,
    game_running: bool,
    deck_name: Option<String>,
    /// Cards still expected in the deck, in list order.
    cards: Vec<String>,
    /// Cards seen leaving the deck or being played this game.
    seen: Vec<String>,
}

impl TrackerWindow {
    pub fn new(role: Role) -> Self {
        let title = match role {
            Role::Player => "Player tracker",
            Role::Opponent => "Opponent tracker",
        };
        Self {
            window: OverlayWindow::new(title),
            role,
            game_running: false,
            deck_name: None,
            cards: Vec::new(),
            seen: Vec::new(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Replaces the displayed list with `cards` under `name`.
    pub fn show_deck(&mut self, cards: Vec<String>, name: &str) {
        debug!(role = %self.role, deck = name, cards = cards.len(), "showing deck");
        self.deck_name = Some(name.to_string());
        self.cards = cards;
        self.seen.clear();
    }

    /// Clears per-game state. The selected deck list stays loaded.
    pub fn game_start(&mut self) {
        self.seen.clear();
    }

    pub fn deck_name(&self) -> Option<&str> {
        self.deck_name.as_deref()
    }

    pub fn cards(&self) -> &[String] {
        &self.cards
    }

    pub fn seen(&self) -> &[String] {
        &self.seen
    }

    /// Cards from the loaded list not yet seen this game.
    pub fn remaining(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = self.seen.iter().map(String::as_str).collect();
        self.cards
            .iter()
            .filter(|c| match seen.iter().position(|s| *s == c.as_str()) {
                Some(i) => {
                    seen.swap_remove(i);
                    false
                }
                None => true,
            })
            .map(String::as_str)
            .collect()
    }

    pub fn is_game_running(&self) -> bool {
        self.game_running
    }
}

impl Observer for TrackerWindow {
    fn name(&self) -> String {
        format!("{} tracker", self.role)
    }

    fn on_lifecycle(&mut self, running: bool) -> Result<()> {
        self.game_running = running;
        Ok(())
    }

    fn on_state(&mut self, _role: Role, event: &StateEvent) -> Result<()> {
        match event {
            StateEvent::GameStart => self.game_start(),
            StateEvent::Draw { card_id } | StateEvent::Play { card_id } => {
                self.seen.push(card_id.clone())
            }
            StateEvent::HandCount(_) | StateEvent::DeckCount(_) => {}
        }
        Ok(())
    }
}

/// Small HUD showing hand and deck counts for one role.
#[derive(Debug)]
pub struct CardCountWindow {
    pub window: OverlayWindow,
    role: Role,
    game_running: bool,
    hand: u32,
    deck: u32,
}

impl CardCountWindow {
    pub fn new(role: Role) -> Self {
        let title = match role {
            Role::Player => "Player card count",
            Role::Opponent => "Opponent card count",
        };
        Self {
            window: OverlayWindow::new(title),
            role,
            game_running: false,
            hand: 0,
            deck: 0,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn counts(&self) -> (u32, u32) {
        (self.hand, self.deck)
    }

    pub fn is_game_running(&self) -> bool {
        self.game_running
    }
}

impl Observer for CardCountWindow {
    fn name(&self) -> String {
        format!("{} card count", self.role)
    }

    fn on_lifecycle(&mut self, running: bool) -> Result<()> {
        self.game_running = running;
        if !running {
            self.hand = 0;
            self.deck = 0;
        }
        Ok(())
    }

    fn on_state(&mut self, _role: Role, event: &StateEvent) -> Result<()> {
        match event {
            StateEvent::GameStart => {
                self.hand = 0;
                self.deck = 0;
            }
            StateEvent::HandCount(n) => self.hand = *n,
            StateEvent::DeckCount(n) => self.deck = *n,
            StateEvent::Draw { .. } | StateEvent::Play { .. } => {}
        }
        Ok(())
    }
}

pub type SharedTracker = Arc<Mutex<TrackerWindow>>;
pub type SharedCardCount = Arc<Mutex<CardCountWindow>>;
