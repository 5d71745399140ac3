/// Fan-out point for everything known about the running game process.
///
/// Observers register under a [`Role`]; state events reach only the
/// subscribers of that role while lifecycle events reach every observer once.
/// The hub is owned by the shell and handed out by reference, there is no
/// global instance.
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::error::ShellError;

/// Which side of the tracked game an observer cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Player,
    Opponent,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Player, Role::Opponent];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Player => "player",
            Role::Opponent => "opponent",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role-scoped game state produced by the state inference engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateEvent {
    /// A new game began; per-game state should be cleared.
    GameStart,
    /// A card moved from the deck into the hand.
    Draw { card_id: String },
    /// A card was played from the hand.
    Play { card_id: String },
    HandCount(u32),
    DeckCount(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubEvent {
    /// The game process started or stopped. Delivered to every observer.
    Lifecycle { running: bool },
    /// Delivered only to subscribers of the published role.
    State(StateEvent),
}

/// Capability of anything that wants to hear from the hub.
pub trait Observer: Send {
    /// Short label used in log lines.
    fn name(&self) -> String;

    fn on_lifecycle(&mut self, running: bool) -> Result<()>;

    fn on_state(&mut self, role: Role, event: &StateEvent) -> Result<()>;
}

pub type SharedObserver = Arc<Mutex<dyn Observer>>;

/// Outcome of one publish: how many subscribers handled the event and how
/// many failed. Failures never stop delivery to the remaining subscribers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    pub delivered: usize,
    pub failed: usize,
}

struct Subscription {
    observer: SharedObserver,
    role: Role,
}

#[derive(Default)]
pub struct EventHub {
    subscriptions: Vec<Subscription>,
    running: bool,
    tracking: bool,
}

/// Identity of a shared observer, ignoring the vtable half of the pointer.
fn observer_addr(observer: &SharedObserver) -> *const () {
    Arc::as_ptr(observer) as *const ()
}

fn deliver<F>(observer: &SharedObserver, f: F) -> Result<()>
where
    F: FnOnce(&mut dyn Observer) -> Result<()>,
{
    let mut guard = observer
        .lock()
        .map_err(|_| ShellError::ObserverUnavailable("observer lock poisoned".to_string()))?;
    f(&mut *guard).with_context(|| guard.name())
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `observer` as a subscriber of `role`. Registering the same
    /// observer for the same role again is a no-op.
    pub fn register(&mut self, observer: SharedObserver, role: Role) {
        let addr = observer_addr(&observer);
        let already = self
            .subscriptions
            .iter()
            .any(|s| s.role == role && observer_addr(&s.observer) == addr);
        if already {
            debug!(%role, "observer already registered");
            return;
        }
        self.subscriptions.push(Subscription { observer, role });
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn subscribers_of(&self, role: Role) -> usize {
        self.subscriptions.iter().filter(|s| s.role == role).count()
    }

    pub fn is_subscribed(&self, observer: &SharedObserver, role: Role) -> bool {
        let addr = observer_addr(observer);
        self.subscriptions
            .iter()
            .any(|s| s.role == role && observer_addr(&s.observer) == addr)
    }

    /// Delivers `event` synchronously. State events go to the subscribers of
    /// `role` in registration order; lifecycle events go to every distinct
    /// observer whatever its role.
    pub fn publish(&self, role: Role, event: &HubEvent) -> Delivery {
        match event {
            HubEvent::Lifecycle { running } => self.broadcast_lifecycle(*running),
            HubEvent::State(state) => {
                let mut tally = Delivery::default();
                for (index, sub) in self.subscriptions.iter().enumerate() {
                    if sub.role != role {
                        continue;
                    }
                    match deliver(&sub.observer, |o| o.on_state(role, state)) {
                        Ok(()) => tally.delivered += 1,
                        Err(e) => {
                            warn!(%role, subscriber = index, "state delivery failed: {e:#}");
                            tally.failed += 1;
                        }
                    }
                }
                tally
            }
        }
    }

    fn broadcast_lifecycle(&self, running: bool) -> Delivery {
        let mut tally = Delivery::default();
        let mut seen: Vec<*const ()> = Vec::with_capacity(self.subscriptions.len());
        for (index, sub) in self.subscriptions.iter().enumerate() {
            let addr = observer_addr(&sub.observer);
            if seen.contains(&addr) {
                continue;
            }
            seen.push(addr);
            match deliver(&sub.observer, |o| o.on_lifecycle(running)) {
                Ok(()) => tally.delivered += 1,
                Err(e) => {
                    warn!(subscriber = index, "lifecycle delivery failed: {e:#}");
                    tally.failed += 1;
                }
            }
        }
        tally
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    /// Records a running/stopped edge from the process monitor. Returns
    /// `None` when the flag did not change.
    pub fn set_running(&mut self, running: bool) -> Option<Delivery> {
        if self.running == running {
            return None;
        }
        self.running = running;
        self.tracking = running;
        info!("game running: {running}");
        Some(self.broadcast_lifecycle(running))
    }

    /// Begins active tracking of a game that was already running when the
    /// shell came up.
    pub fn start_tracking(&mut self) -> Delivery {
        self.tracking = true;
        self.running = true;
        info!("game running: true, tracking started");
        self.broadcast_lifecycle(true)
    }
}
