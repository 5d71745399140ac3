/// The "Decks" menu, rebuilt from the deck catalog on every `deck_change`.
///
/// Entries carry a [`MenuCommand`] rather than a handler name, so activation
/// is a plain match in the shell.
use std::fmt::Write as _;
use std::sync::PoisonError;

use tracing::{debug, info};

use crate::overlay::SharedTracker;
use crate::store::DeckCatalog;

pub const DECKS_MENU_TITLE: &str = "Decks";
pub const RESET_TITLE: &str = "Reset";
pub const RESET_KEY: char = 'r';
pub const LOCK_WINDOWS_TITLE: &str = "Lock Windows";
pub const UNLOCK_WINDOWS_TITLE: &str = "Unlock Windows";

/// Stable identifier of everything a menu entry can trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuCommand {
    /// Clear per-game state on both trackers.
    Reset,
    /// Load the named deck into the player tracker.
    OpenDeck(String),
    /// Flip the persisted windows-locked flag.
    ToggleWindowsLock,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuEntry {
    Item {
        title: String,
        command: MenuCommand,
        key_equivalent: Option<char>,
    },
    Separator,
}

impl MenuEntry {
    fn item(title: &str, command: MenuCommand, key_equivalent: Option<char>) -> Self {
        MenuEntry::Item { title: title.to_string(), command, key_equivalent }
    }
}

/// Label of the lock toggle for the current flag value.
pub fn lock_windows_title(locked: bool) -> &'static str {
    if locked {
        UNLOCK_WINDOWS_TITLE
    } else {
        LOCK_WINDOWS_TITLE
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    title: String,
    entries: Vec<MenuEntry>,
}

impl Menu {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn entries(&self) -> &[MenuEntry] {
        &self.entries
    }

    /// Plain-text form of the menu, one line per entry.
    pub fn render(&self) -> String {
        let mut out = format!("{}\n", self.title);
        for entry in &self.entries {
            match entry {
                MenuEntry::Separator => out.push_str("---\n"),
                MenuEntry::Item { title, key_equivalent, .. } => {
                    let _ = match key_equivalent {
                        Some(key) => writeln!(out, "{title}\t[{key}]"),
                        None => writeln!(out, "{title}"),
                    };
                }
            }
        }
        out
    }
}

fn header() -> Vec<MenuEntry> {
    vec![
        MenuEntry::item(RESET_TITLE, MenuCommand::Reset, Some(RESET_KEY)),
        MenuEntry::Separator,
    ]
}

pub struct DeckMenuSync {
    menu: Menu,
}

impl Default for DeckMenuSync {
    fn default() -> Self {
        Self::new()
    }
}

impl DeckMenuSync {
    pub fn new() -> Self {
        Self {
            menu: Menu { title: DECKS_MENU_TITLE.to_string(), entries: header() },
        }
    }

    pub fn menu(&self) -> &Menu {
        &self.menu
    }

    /// Deck entries below the fixed header, in display order.
    pub fn deck_titles(&self) -> Vec<&str> {
        self.menu.entries[header().len()..]
            .iter()
            .filter_map(|e| match e {
                MenuEntry::Item { title, command: MenuCommand::OpenDeck(_), .. } => {
                    Some(title.as_str())
                }
                _ => None,
            })
            .collect()
    }

    /// Replaces every entry below the header with one entry per deck,
    /// sorted case-insensitively by name.
    pub fn rebuild(&mut self, catalog: &dyn DeckCatalog) {
        let mut names: Vec<&str> = catalog.decks().iter().map(|d| d.name.as_str()).collect();
        names.sort_by_cached_key(|name| (name.to_lowercase(), *name));
        names.dedup();

        let mut entries = header();
        entries.extend(
            names
                .iter()
                .map(|name| MenuEntry::item(name, MenuCommand::OpenDeck(name.to_string()), None)),
        );
        self.menu.entries = entries;
        debug!(decks = names.len(), "deck menu rebuilt");
    }

    /// Shows the named deck in the player tracker. An unknown name (a stale
    /// entry for a deleted deck) does nothing. Returns whether a deck was shown.
    pub fn on_deck_selected(
        &self,
        deck_name: &str,
        catalog: &dyn DeckCatalog,
        player: &SharedTracker,
    ) -> bool {
        let Some(deck) = catalog.deck_by_name(deck_name) else {
            debug!(deck = deck_name, "selected deck no longer exists");
            return false;
        };
        player
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .show_deck(deck.playable_cards(), &deck.name);
        info!(deck = %deck.name, "deck selected");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::Role;
    use crate::overlay::TrackerWindow;
    use crate::store::{Deck, DeckCard, DeckStore, StoreData};
    use std::sync::{Arc, Mutex};

    fn catalog(names: &[&str]) -> DeckStore {
        DeckStore::in_memory(StoreData {
            windows_locked: false,
            decks: names
                .iter()
                .map(|n| Deck {
                    name: n.to_string(),
                    cards: vec![DeckCard { id: format!("{n}-card"), count: 2 }],
                })
                .collect(),
        })
    }

    fn player() -> SharedTracker {
        Arc::new(Mutex::new(TrackerWindow::new(Role::Player)))
    }

    // ── rebuild ───────────────────────────────────────────────────────────────

    #[test]
    fn new_menu_has_only_header() {
        let sync = DeckMenuSync::new();
        assert_eq!(sync.menu().entries(), &header()[..]);
        assert!(sync.deck_titles().is_empty());
    }

    #[test]
    fn rebuild_sorts_case_insensitively() {
        let mut sync = DeckMenuSync::new();
        sync.rebuild(&catalog(&["Zoo Warlock", "aggro Druid"]));
        assert_eq!(sync.deck_titles(), vec!["aggro Druid", "Zoo Warlock"]);
    }

    #[test]
    fn rebuild_keeps_header_first() {
        let mut sync = DeckMenuSync::new();
        sync.rebuild(&catalog(&["b", "a"]));
        let entries = sync.menu().entries();
        assert_eq!(
            entries[0],
            MenuEntry::item(RESET_TITLE, MenuCommand::Reset, Some(RESET_KEY))
        );
        assert_eq!(entries[1], MenuEntry::Separator);
        assert_eq!(
            entries[2],
            MenuEntry::item("a", MenuCommand::OpenDeck("a".to_string()), None)
        );
    }

    #[test]
    fn rebuild_drops_removed_decks() {
        let mut sync = DeckMenuSync::new();
        sync.rebuild(&catalog(&["Miracle Rogue", "Face Hunter", "Control Warrior"]));
        sync.rebuild(&catalog(&["Face Hunter"]));
        assert_eq!(sync.deck_titles(), vec!["Face Hunter"]);
        assert_eq!(sync.menu().entries().len(), 3);
    }

    #[test]
    fn rebuild_is_idempotent() {
        let c = catalog(&["Mech Mage", "handlock", "Midrange Paladin"]);
        let mut sync = DeckMenuSync::new();
        sync.rebuild(&c);
        let first = sync.menu().render();
        sync.rebuild(&c);
        sync.rebuild(&c);
        assert_eq!(sync.menu().render(), first);
    }

    #[test]
    fn rebuild_collapses_duplicate_names_and_orders_case_ties() {
        let mut sync = DeckMenuSync::new();
        sync.rebuild(&catalog(&["ramp", "Ramp", "ramp"]));
        assert_eq!(sync.deck_titles(), vec!["Ramp", "ramp"]);
    }

    #[test]
    fn render_shows_key_equivalent_and_separator() {
        let mut sync = DeckMenuSync::new();
        sync.rebuild(&catalog(&["Tempo Mage"]));
        assert_eq!(sync.menu().render(), "Decks\nReset\t[r]\n---\nTempo Mage\n");
    }

    // ── on_deck_selected ──────────────────────────────────────────────────────

    #[test]
    fn selecting_deck_loads_player_tracker() {
        let sync = DeckMenuSync::new();
        let p = player();
        assert!(sync.on_deck_selected("Zoo Warlock", &catalog(&["Zoo Warlock"]), &p));
        let p = p.lock().unwrap();
        assert_eq!(p.deck_name(), Some("Zoo Warlock"));
        assert_eq!(p.cards(), &["Zoo Warlock-card".to_string(), "Zoo Warlock-card".to_string()]);
    }

    #[test]
    fn selecting_missing_deck_is_noop() {
        let sync = DeckMenuSync::new();
        let p = player();
        assert!(!sync.on_deck_selected("NonexistentDeck", &catalog(&["Zoo Warlock"]), &p));
        let p = p.lock().unwrap();
        assert!(p.deck_name().is_none());
        assert!(p.cards().is_empty());
    }

    // ── lock label ────────────────────────────────────────────────────────────

    #[test]
    fn lock_title_follows_flag() {
        assert_eq!(lock_windows_title(true), UNLOCK_WINDOWS_TITLE);
        assert_eq!(lock_windows_title(false), LOCK_WINDOWS_TITLE);
    }
}
