//! Live match subscription.
//!
//! A [`MatchChannel`] owns at most one subscription task at a time. The task
//! reads the transport stream, drops redeliveries of matches already shown this
//! session, writes new ones into the [`MatchSlot`] and forwards them to the
//! `onMatch` stream handed out by [`MatchChannel::open`]. Lost connections are
//! re-established with exponential backoff; the shell only hears about it when
//! the configured attempts run out.

use crate::core::slot::{Delivery, MatchPolicy, MatchSlot, MatchSlotState};
use crate::models::MatchEvent;
use crate::services::{EventStream, EventTransport, TransportError};
use futures_util::StreamExt;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("match channel unavailable for {identity}: {source}")]
    Unavailable {
        identity: String,
        #[source]
        source: TransportError,
    },
}

/// Connection state as seen by the shell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelStatus {
    Idle,
    Connected,
    Reconnecting { attempt: u32 },
    /// Reconnection gave up; call `open` again to retry
    Abandoned { attempts: u32 },
    Closed,
}

/// Lazily-filled, non-restartable stream of matches for one subscription
pub type MatchStream = UnboundedReceiverStream<MatchEvent>;

#[derive(Debug, Clone)]
pub struct ChannelSettings {
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// `None` retries forever
    pub max_reconnect_attempts: Option<u32>,
    pub policy: MatchPolicy,
    pub pending_capacity: usize,
    /// How many matched identities are remembered for de-duplication
    pub seen_capacity: usize,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            max_reconnect_attempts: None,
            policy: MatchPolicy::LatestWins,
            pending_capacity: 16,
            seen_capacity: 256,
        }
    }
}

/// State shared between the channel handle and its subscription task
struct Shared {
    slot: MatchSlot,
    status: watch::Sender<ChannelStatus>,
    seen: Mutex<LruCache<String, ()>>,
}

impl Shared {
    fn set_status(&self, status: ChannelStatus) {
        self.status.send_if_modified(|current| {
            let changed = *current != status;
            *current = status;
            changed
        });
    }

    /// Remember `profile_id`; false if it was already seen
    fn first_sighting(&self, profile_id: &str) -> bool {
        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        seen.put(profile_id.to_string(), ()).is_none()
    }

    fn forget_seen(&self) {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

struct Subscription {
    identity: String,
    handle: JoinHandle<()>,
}

impl Subscription {
    async fn stop(&mut self) {
        self.handle.abort();
        let _ = (&mut self.handle).await;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Identity-scoped match subscription plus the active-match slot
pub struct MatchChannel {
    transport: Arc<dyn EventTransport>,
    settings: ChannelSettings,
    shared: Arc<Shared>,
    identity: Option<String>,
    subscription: Option<Subscription>,
}

impl MatchChannel {
    pub fn new(transport: Arc<dyn EventTransport>, settings: ChannelSettings) -> Self {
        let seen_capacity = NonZeroUsize::new(settings.seen_capacity).unwrap_or(NonZeroUsize::MIN);
        let (status, _) = watch::channel(ChannelStatus::Idle);
        let shared = Arc::new(Shared {
            slot: MatchSlot::new(settings.policy, settings.pending_capacity),
            status,
            seen: Mutex::new(LruCache::new(seen_capacity)),
        });

        Self {
            transport,
            settings,
            shared,
            identity: None,
            subscription: None,
        }
    }

    /// Subscribe to matches for `identity`
    ///
    /// Replaces any existing subscription once the new connection is up. When
    /// the connection cannot be established the previous subscription, if
    /// any, is left running. Switching to a different identity clears the
    /// slot and the seen-match memory.
    pub async fn open(&mut self, identity: &str) -> Result<MatchStream, ChannelError> {
        let stream = self.transport.connect(identity).await.map_err(|source| {
            tracing::warn!("Failed to open match channel for {}: {}", identity, source);
            ChannelError::Unavailable {
                identity: identity.to_string(),
                source,
            }
        })?;

        if let Some(mut previous) = self.subscription.take() {
            tracing::debug!("Replacing match subscription for {}", previous.identity);
            previous.stop().await;
        }

        if self.identity.as_deref() != Some(identity) {
            self.shared.slot.clear();
            self.shared.forget_seen();
            self.identity = Some(identity.to_string());
        }

        let (events, events_rx) = mpsc::unbounded_channel();
        let task = SubscriptionTask {
            identity: identity.to_string(),
            transport: self.transport.clone(),
            settings: self.settings.clone(),
            shared: self.shared.clone(),
            events,
        };

        self.shared.set_status(ChannelStatus::Connected);
        let handle = tokio::spawn(task.run(stream));
        self.subscription = Some(Subscription {
            identity: identity.to_string(),
            handle,
        });

        tracing::info!("Match channel open for {}", identity);

        Ok(UnboundedReceiverStream::new(events_rx))
    }

    /// End the subscription; the slot keeps its contents
    pub async fn close(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.stop().await;
            self.shared.set_status(ChannelStatus::Closed);
            tracing::info!("Match channel closed for {}", subscription.identity);
        }
    }

    /// True while a subscription task is alive (connected or reconnecting)
    pub fn is_open(&self) -> bool {
        self.subscription
            .as_ref()
            .is_some_and(|s| !s.handle.is_finished())
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    pub fn active_match(&self) -> Option<MatchEvent> {
        self.shared.slot.active()
    }

    /// Clear the displayed match; idempotent
    pub fn dismiss(&self) -> Option<MatchEvent> {
        let dismissed = self.shared.slot.dismiss();
        if let Some(event) = &dismissed {
            tracing::debug!("Dismissed match with {}", event.profile_id());
        }
        dismissed
    }

    pub fn watch_active(&self) -> watch::Receiver<MatchSlotState> {
        self.shared.slot.subscribe()
    }

    pub fn status(&self) -> watch::Receiver<ChannelStatus> {
        self.shared.status.subscribe()
    }

    pub fn current_status(&self) -> ChannelStatus {
        *self.shared.status.borrow()
    }

    pub fn settings(&self) -> &ChannelSettings {
        &self.settings
    }
}

struct SubscriptionTask {
    identity: String,
    transport: Arc<dyn EventTransport>,
    settings: ChannelSettings,
    shared: Arc<Shared>,
    events: mpsc::UnboundedSender<MatchEvent>,
}

impl SubscriptionTask {
    async fn run(self, mut stream: EventStream) {
        loop {
            while let Some(item) = stream.next().await {
                match item {
                    Ok(event) => self.handle(event),
                    Err(e) => {
                        tracing::warn!("Match channel for {} lost: {}", self.identity, e);
                        break;
                    }
                }
            }

            match self.reconnect().await {
                Some(next) => stream = next,
                None => return,
            }
        }
    }

    fn handle(&self, event: MatchEvent) {
        if !self.shared.first_sighting(event.profile_id()) {
            tracing::debug!("Ignoring repeated match with {}", event.profile_id());
            return;
        }

        match self.shared.slot.deliver(event.clone()) {
            Delivery::Activated => {
                tracing::info!("New match with {}", event.profile_id());
            }
            Delivery::Superseded(previous) => {
                tracing::info!(
                    "New match with {} replaces undismissed {}",
                    event.profile_id(),
                    previous.profile_id()
                );
            }
            Delivery::Queued { position } => {
                tracing::info!("New match with {} queued at {}", event.profile_id(), position);
            }
            Delivery::Overflowed(dropped) => {
                tracing::warn!(
                    "Pending matches full, dropped {} for {}",
                    dropped.profile_id(),
                    event.profile_id()
                );
            }
        }

        // The shell may have dropped the stream and rely on the slot alone.
        let _ = self.events.send(event);
    }

    async fn reconnect(&self) -> Option<EventStream> {
        let mut delay = self.settings.initial_backoff;
        let mut attempt: u32 = 0;

        loop {
            if let Some(max) = self.settings.max_reconnect_attempts {
                if attempt >= max {
                    tracing::error!(
                        "Giving up on match channel for {} after {} attempts",
                        self.identity,
                        attempt
                    );
                    self.shared.set_status(ChannelStatus::Abandoned { attempts: attempt });
                    return None;
                }
            }

            attempt += 1;
            self.shared.set_status(ChannelStatus::Reconnecting { attempt });
            tokio::time::sleep(delay).await;

            match self.transport.connect(&self.identity).await {
                Ok(stream) => {
                    tracing::info!("Match channel for {} reconnected after {} attempts", self.identity, attempt);
                    self.shared.set_status(ChannelStatus::Connected);
                    return Some(stream);
                }
                Err(e) => {
                    tracing::warn!("Reconnect attempt {} for {} failed: {}", attempt, self.identity, e);
                }
            }

            delay = (delay * 2).min(self.settings.max_backoff);
        }
    }
}
