use crate::models::MatchEvent;
use serde::Deserialize;
use std::collections::VecDeque;
use tokio::sync::watch;

/// What happens to a match that arrives while another is on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// The newcomer replaces the displayed match, which is discarded
    #[default]
    LatestWins,
    /// The newcomer waits behind the displayed match until it is dismissed
    Fifo,
}

/// Contents of the active-match slot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchSlotState {
    pub active: Option<MatchEvent>,
    /// Waiting matches, only ever populated under [`MatchPolicy::Fifo`]
    pub pending: VecDeque<MatchEvent>,
}

/// Outcome of handing a match to the slot
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Activated,
    Superseded(MatchEvent),
    Queued { position: usize },
    /// Queued, but the pending list was full and its oldest entry was dropped
    Overflowed(MatchEvent),
}

/// Single "currently displayed" match cell
///
/// Backed by a watch channel so the shell can await changes. Mutations happen
/// inside the channel's lock, so observers never see a half-applied update.
#[derive(Debug)]
pub struct MatchSlot {
    state: watch::Sender<MatchSlotState>,
    policy: MatchPolicy,
    pending_capacity: usize,
}

impl MatchSlot {
    pub fn new(policy: MatchPolicy, pending_capacity: usize) -> Self {
        let (state, _) = watch::channel(MatchSlotState::default());
        Self {
            state,
            policy,
            pending_capacity: pending_capacity.max(1),
        }
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    pub fn deliver(&self, event: MatchEvent) -> Delivery {
        let mut delivery = Delivery::Activated;
        self.state.send_modify(|state| {
            let Some(current) = state.active.take() else {
                state.active = Some(event);
                return;
            };

            match self.policy {
                MatchPolicy::LatestWins => {
                    state.active = Some(event);
                    delivery = Delivery::Superseded(current);
                }
                MatchPolicy::Fifo => {
                    state.active = Some(current);
                    let dropped = if state.pending.len() >= self.pending_capacity {
                        state.pending.pop_front()
                    } else {
                        None
                    };
                    state.pending.push_back(event);
                    delivery = match dropped {
                        Some(oldest) => Delivery::Overflowed(oldest),
                        None => Delivery::Queued {
                            position: state.pending.len(),
                        },
                    };
                }
            }
        });
        delivery
    }

    /// Clear the displayed match, promoting the next pending one if any
    ///
    /// Returns the dismissed match; a no-op when nothing is displayed.
    pub fn dismiss(&self) -> Option<MatchEvent> {
        let mut dismissed = None;
        self.state.send_if_modified(|state| {
            dismissed = state.active.take();
            if dismissed.is_some() {
                state.active = state.pending.pop_front();
            }
            dismissed.is_some()
        });
        dismissed
    }

    pub fn active(&self) -> Option<MatchEvent> {
        self.state.borrow().active.clone()
    }

    pub fn pending_len(&self) -> usize {
        self.state.borrow().pending.len()
    }

    /// Forget everything, e.g. when the session identity changes
    pub fn clear(&self) {
        self.state.send_if_modified(|state| {
            let changed = state.active.is_some() || !state.pending.is_empty();
            *state = MatchSlotState::default();
            changed
        });
    }

    pub fn subscribe(&self) -> watch::Receiver<MatchSlotState> {
        self.state.subscribe()
    }
}

impl Default for MatchSlot {
    fn default() -> Self {
        Self::new(MatchPolicy::LatestWins, 1)
    }
}
