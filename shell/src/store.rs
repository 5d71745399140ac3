/// Configuration Store: the persisted deck catalog and the windows-locked flag.
///
/// Backed by `decks.toml` in the app data directory. The file is loaded off
/// the event loop by [`initialize`], which fires a one-shot readiness signal
/// once the catalog is usable, and watched afterwards so edits surface as
/// `deck_change` signals.
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::event::ShellEvent;
use crate::watch;

/// One card entry of a deck list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckCard {
    /// Card identifier understood by the tracker windows (e.g. "EX1_319").
    pub id: String,
    #[serde(default = "default_count", deserialize_with = "clamped_count")]
    pub count: u32,
}

/// Upper bound on copies of one card in a deck list.
pub const MAX_CARD_COPIES: u32 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    pub name: String,
    #[serde(default)]
    pub cards: Vec<DeckCard>,
}

impl Deck {
    /// Expands counts into the ordered sequence the tracker displays.
    pub fn playable_cards(&self) -> Vec<String> {
        self.cards
            .iter()
            .flat_map(|c| std::iter::repeat(c.id.clone()).take(c.count as usize))
            .collect()
    }
}

/// On-disk layout of `decks.toml`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreData {
    #[serde(default)]
    pub windows_locked: bool,
    #[serde(default)]
    pub decks: Vec<Deck>,
}

/// Read side of the store, as seen by the menu and the shell.
pub trait DeckCatalog {
    fn decks(&self) -> &[Deck];

    /// Exact-name lookup.
    fn deck_by_name(&self, name: &str) -> Option<&Deck> {
        self.decks().iter().find(|d| d.name == name)
    }
}

#[derive(Debug, Default)]
pub struct DeckStore {
    /// `None` keeps the store in memory only.
    path: Option<PathBuf>,
    data: StoreData,
    /// False until the backing file has been read successfully.
    writable: bool,
}

pub type SharedStore = Arc<RwLock<DeckStore>>;

impl DeckCatalog for DeckStore {
    fn decks(&self) -> &[Deck] {
        &self.data.decks
    }
}

impl DeckStore {
    pub fn in_memory(data: StoreData) -> Self {
        Self { path: None, data, writable: true }
    }

    /// Empty store bound to a file that failed to load. Reloads keep reading
    /// `path`; saving stays off until one of them succeeds.
    pub fn unloaded(path: PathBuf) -> Self {
        Self { path: Some(path), data: StoreData::default(), writable: false }
    }

    /// Loads `path`, returning an empty store bound to `path` if the file does
    /// not exist. Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        Ok(Self {
            path: Some(path.to_path_buf()),
            data: read_data(path)?,
            writable: true,
        })
    }

    /// Re-reads the backing file. In-memory stores are left untouched.
    pub fn reload(&mut self) -> Result<()> {
        if let Some(path) = &self.path {
            self.data = read_data(path)?;
            self.writable = true;
            debug!(decks = self.data.decks.len(), "[store] Reloaded");
        }
        Ok(())
    }

    pub fn windows_locked(&self) -> bool {
        self.data.windows_locked
    }

    /// Updates the flag and writes the store back to disk.
    pub fn set_windows_locked(&mut self, locked: bool) -> Result<()> {
        self.data.windows_locked = locked;
        self.save()
    }

    fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if !self.writable {
            debug!("[store] Not saving over a file that failed to load");
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(&self.data).context("Failed to serialize store")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write store file: {}", path.display()))
    }
}

fn read_data(path: &Path) -> Result<StoreData> {
    if !path.exists() {
        return Ok(StoreData::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read store file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse store file: {}", path.display()))
}

fn default_count() -> u32 {
    1
}

fn clamped_count<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(u32::deserialize(deserializer)?.min(MAX_CARD_COPIES))
}

/// Starts loading the store at `path` in the background.
///
/// The returned receiver resolves once the catalog is usable. A file that
/// fails to load is reported here and leaves an empty store that still reloads
/// from `path` but never writes to it until a reload succeeds. Readiness fires
/// either way.
pub fn initialize(path: PathBuf) -> (SharedStore, oneshot::Receiver<()>) {
    let store: SharedStore = Arc::new(RwLock::new(DeckStore::default()));
    let (ready_tx, ready_rx) = oneshot::channel();

    let shared = Arc::clone(&store);
    tokio::spawn(async move {
        let file = path.clone();
        let loaded = tokio::task::spawn_blocking(move || DeckStore::load_or_default(&file)).await;
        let next = match loaded {
            Ok(Ok(loaded)) => {
                info!(decks = loaded.decks().len(), file = %path.display(), "[store] Ready");
                loaded
            }
            Ok(Err(e)) => {
                error!("[store] {e:#}; continuing with an empty catalog until the file is fixed");
                DeckStore::unloaded(path)
            }
            Err(e) => {
                error!("[store] Loader task failed: {e}");
                DeckStore::unloaded(path)
            }
        };
        *shared.write().unwrap_or_else(PoisonError::into_inner) = next;
        let _ = ready_tx.send(());
    });

    (store, ready_rx)
}

/// Emits [`ShellEvent::DeckChange`] whenever the store file changes on disk.
pub async fn watch_store(path: PathBuf, tx: mpsc::Sender<ShellEvent>) {
    watch::watch_file(path, tx, || vec![ShellEvent::DeckChange]).await
}

/// Reloads `store` from disk, keeping the previous catalog on failure.
pub fn reload_shared(store: &SharedStore) {
    let mut guard = store.write().unwrap_or_else(PoisonError::into_inner);
    if let Err(e) = guard.reload() {
        warn!("[store] Keeping previous catalog: {e:#}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
windows_locked = true

[[decks]]
name = "Zoo Warlock"
cards = [
    { id = "EX1_319", count = 2 },
    { id = "CS2_065" },
]

[[decks]]
name = "aggro Druid"
"#;

    fn deck(name: &str) -> Deck {
        Deck { name: name.to_string(), cards: Vec::new() }
    }

    // ── Deck ──────────────────────────────────────────────────────────────────

    #[test]
    fn playable_cards_expands_counts_in_order() {
        let d = Deck {
            name: "d".to_string(),
            cards: vec![
                DeckCard { id: "a".to_string(), count: 2 },
                DeckCard { id: "b".to_string(), count: 1 },
                DeckCard { id: "c".to_string(), count: 0 },
            ],
        };
        assert_eq!(d.playable_cards(), vec!["a", "a", "b"]);
    }

    #[test]
    fn deck_by_name_is_exact() {
        let store = DeckStore::in_memory(StoreData {
            windows_locked: false,
            decks: vec![deck("Zoo Warlock")],
        });
        assert!(store.deck_by_name("Zoo Warlock").is_some());
        assert!(store.deck_by_name("zoo warlock").is_none());
    }

    // ── load_or_default ───────────────────────────────────────────────────────

    #[test]
    fn missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = DeckStore::load_or_default(&dir.path().join("decks.toml")).unwrap();
        assert!(store.decks().is_empty());
        assert!(!store.windows_locked());
    }

    #[test]
    fn parses_decks_and_flag() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("decks.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let store = DeckStore::load_or_default(&path).unwrap();
        assert!(store.windows_locked());
        assert_eq!(store.decks().len(), 2);
        let zoo = store.deck_by_name("Zoo Warlock").unwrap();
        assert_eq!(zoo.playable_cards(), vec!["EX1_319", "EX1_319", "CS2_065"]);
        assert!(store.deck_by_name("aggro Druid").unwrap().cards.is_empty());
    }

    #[test]
    fn invalid_toml_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("decks.toml");
        std::fs::write(&path, "[[decks]\nname = ").unwrap();
        assert!(DeckStore::load_or_default(&path).is_err());
    }

    // ── persistence ───────────────────────────────────────────────────────────

    #[test]
    fn set_windows_locked_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("decks.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let mut store = DeckStore::load_or_default(&path).unwrap();
        store.set_windows_locked(false).unwrap();

        let reread = DeckStore::load_or_default(&path).unwrap();
        assert!(!reread.windows_locked());
        assert_eq!(reread.decks().len(), 2);
    }

    #[test]
    fn reload_picks_up_new_decks_and_keeps_old_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("decks.toml");
        std::fs::write(&path, "[[decks]]\nname = \"One\"\n").unwrap();
        let shared: SharedStore = Arc::new(RwLock::new(DeckStore::load_or_default(&path).unwrap()));

        std::fs::write(&path, "[[decks]]\nname = \"One\"\n[[decks]]\nname = \"Two\"\n").unwrap();
        reload_shared(&shared);
        assert_eq!(shared.read().unwrap().decks().len(), 2);

        std::fs::write(&path, "not toml ][").unwrap();
        reload_shared(&shared);
        assert_eq!(shared.read().unwrap().decks().len(), 2);
    }

    // ── initialize ────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn initialize_fires_readiness_after_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("decks.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let (store, ready) = initialize(path);
        ready.await.unwrap();
        assert_eq!(store.read().unwrap().decks().len(), 2);
    }

    #[tokio::test]
    async fn initialize_with_broken_file_still_fires_and_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("decks.toml");
        std::fs::write(&path, "garbage ][").unwrap();

        let (store, ready) = initialize(path.clone());
        ready.await.unwrap();
        store.write().unwrap().set_windows_locked(true).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "garbage ][");
    }

    #[tokio::test]
    async fn broken_file_recovers_once_fixed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("decks.toml");
        std::fs::write(&path, "garbage ][").unwrap();

        let (store, ready) = initialize(path.clone());
        ready.await.unwrap();
        assert!(store.read().unwrap().decks().is_empty());

        std::fs::write(&path, "[[decks]]\nname = \"Zoo Warlock\"\n").unwrap();
        reload_shared(&store);
        assert_eq!(store.read().unwrap().decks().len(), 1);

        store.write().unwrap().set_windows_locked(true).unwrap();
        let reread = DeckStore::load_or_default(&path).unwrap();
        assert!(reread.windows_locked());
        assert_eq!(reread.decks().len(), 1);
    }

    #[test]
    fn oversized_count_is_clamped() {
        let data: StoreData = toml::from_str(
            "[[decks]]\nname = \"d\"\ncards = [{ id = \"a\", count = 4000000000 }]\n",
        )
        .unwrap();
        assert_eq!(data.decks[0].cards[0].count, MAX_CARD_COPIES);
        assert_eq!(data.decks[0].playable_cards().len(), MAX_CARD_COPIES as usize);
    }
}
