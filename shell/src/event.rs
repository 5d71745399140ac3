use crate::config::Config;
use crate::deck_menu::MenuCommand;
use crate::hub::{Role, StateEvent};

/// Everything the shell's event loop reacts to. Background producers only
/// ever send these; all component state is mutated by the loop itself.
#[derive(Debug)]
pub enum ShellEvent {
    /// The game process appeared in (`true`) or left (`false`) the process list.
    GameRunning(bool),
    /// Role-scoped state from the state inference engine.
    GameState { role: Role, event: StateEvent },
    /// The deck catalog changed; rebuild the deck menu.
    DeckChange,
    /// The configured locale changed; a restart is needed.
    LocaleChanged,
    /// The config file changed on disk and was successfully re-parsed.
    ConfigReloaded(Config),
    /// A menu entry was activated.
    Menu(MenuCommand),
    /// The deck management window was shown.
    ManagementSurfaceOpened,
    /// The deck management window was closed.
    ManagementSurfaceClosed,
    /// Orderly termination was requested (restart confirmed or Ctrl+C).
    Shutdown,
}
