use crate::core::queue::{CandidateQueue, QueueError};
use crate::models::{CurrentUser, Profile, SwipeDirection, SwipeRequest};
use crate::services::{DecisionRecorder, RecordError};
use futures_util::future::BoxFuture;
use futures_util::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::task::Poll;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwipeError {
    #[error("nothing left to swipe")]
    EmptyQueue,

    #[error("decision dispatcher is no longer running")]
    DispatcherClosed,
}

impl From<QueueError> for SwipeError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::EmptyQueue => SwipeError::EmptyQueue,
        }
    }
}

/// Immediate result of a swipe: the queue has already moved on
#[derive(Debug, Clone)]
pub struct SwipeTicket {
    pub request: SwipeRequest,
    pub profile: Profile,
}

/// Completion of the remote record call for one swipe
#[derive(Debug, Clone)]
pub struct SwipeNotification {
    pub request: SwipeRequest,
    pub outcome: Result<(), RecordError>,
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

impl SwipeNotification {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Receiver side of the per-swipe completion notifications
pub type SwipeNotifications = mpsc::UnboundedReceiver<SwipeNotification>;

/// Turns swipe gestures into an optimistic queue pop plus a remote record call
///
/// The queue is owned here and only mutated through `swipe`. Record calls are
/// handed to a single dispatcher task which starts them strictly in swipe
/// order and reports each completion, whatever order they finish in.
pub struct SwipeCoordinator {
    actor: CurrentUser,
    queue: CandidateQueue,
    requests: mpsc::UnboundedSender<SwipeRequest>,
    next_sequence: u64,
}

impl SwipeCoordinator {
    /// Build the coordinator and start its dispatcher.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(
        actor: CurrentUser,
        queue: CandidateQueue,
        recorder: Arc<dyn DecisionRecorder>,
    ) -> (Self, SwipeNotifications) {
        let (requests_tx, requests_rx) = mpsc::unbounded_channel();
        let (notify_tx, notify_rx) = mpsc::unbounded_channel();

        tokio::spawn(dispatch(recorder, requests_rx, notify_tx));

        let coordinator = Self {
            actor,
            queue,
            requests: requests_tx,
            next_sequence: 0,
        };

        (coordinator, notify_rx)
    }

    /// Swipe the front card
    ///
    /// Returns as soon as the queue has advanced; the record call's outcome
    /// arrives later on the notification channel. Nothing is popped or sent
    /// when the queue is empty.
    pub fn swipe(&mut self, direction: SwipeDirection) -> Result<SwipeTicket, SwipeError> {
        let target_id = match self.queue.peek_front() {
            Some(profile) => profile.id.clone(),
            None => return Err(SwipeError::EmptyQueue),
        };

        let request = SwipeRequest {
            sequence: self.next_sequence,
            request_id: uuid::Uuid::new_v4(),
            actor_id: self.actor.id.clone(),
            target_id,
            direction,
        };

        self.requests
            .send(request.clone())
            .map_err(|_| SwipeError::DispatcherClosed)?;

        let profile = self.queue.pop_front()?;
        self.next_sequence += 1;

        tracing::debug!(
            "Swiped {} on {} (#{}, {} left)",
            direction,
            profile.id,
            request.sequence,
            self.queue.len()
        );

        Ok(SwipeTicket { request, profile })
    }

    pub fn like(&mut self) -> Result<SwipeTicket, SwipeError> {
        self.swipe(SwipeDirection::Like)
    }

    pub fn dislike(&mut self) -> Result<SwipeTicket, SwipeError> {
        self.swipe(SwipeDirection::Dislike)
    }

    pub fn queue(&self) -> &CandidateQueue {
        &self.queue
    }

    pub fn actor(&self) -> &CurrentUser {
        &self.actor
    }

    /// Add a further page of candidates; see [`CandidateQueue::append`]
    pub fn append_candidates(&mut self, profiles: Vec<Profile>) -> usize {
        self.queue.append(profiles)
    }
}

/// Starts record calls in arrival order and publishes completions.
///
/// Each call runs in its own task so a panicking recorder only fails that
/// one swipe. The next request is not taken until the current call has been
/// polled once, which keeps calls issued in swipe order. Exits once the
/// coordinator is dropped and every call has finished.
async fn dispatch(
    recorder: Arc<dyn DecisionRecorder>,
    mut requests: mpsc::UnboundedReceiver<SwipeRequest>,
    notify: mpsc::UnboundedSender<SwipeNotification>,
) {
    let mut in_flight: FuturesUnordered<BoxFuture<'static, SwipeNotification>> =
        FuturesUnordered::new();

    loop {
        tokio::select! {
            biased;

            Some(done) = in_flight.next(), if !in_flight.is_empty() => {
                publish(&notify, done);
            }

            next = requests.recv() => match next {
                Some(request) => {
                    let (started_tx, started_rx) = oneshot::channel();
                    let handle = tokio::spawn(record_one(recorder.clone(), request.clone(), started_tx));
                    in_flight.push(Box::pin(supervise(request, handle)));
                    // Err means the call panicked before it got going
                    let _ = started_rx.await;
                }
                None => break,
            }
        }
    }

    while let Some(done) = in_flight.next().await {
        publish(&notify, done);
    }

    tracing::debug!("Decision dispatcher stopped");
}

async fn record_one(
    recorder: Arc<dyn DecisionRecorder>,
    request: SwipeRequest,
    started: oneshot::Sender<()>,
) -> SwipeNotification {
    let outcome = {
        let mut call = recorder.record(&request);
        let first = futures_util::poll!(call.as_mut());
        let _ = started.send(());
        match first {
            Poll::Ready(outcome) => outcome,
            Poll::Pending => call.await,
        }
    };

    SwipeNotification {
        request,
        outcome,
        completed_at: chrono::Utc::now(),
    }
}

/// Turn a crashed record task into a failed notification
async fn supervise(request: SwipeRequest, handle: JoinHandle<SwipeNotification>) -> SwipeNotification {
    match handle.await {
        Ok(done) => done,
        Err(e) => {
            tracing::error!("Record call #{} on {} crashed: {}", request.sequence, request.target_id, e);
            SwipeNotification {
                request,
                outcome: Err(RecordError::Transport(format!("record call crashed: {}", e))),
                completed_at: chrono::Utc::now(),
            }
        }
    }
}

fn publish(notify: &mpsc::UnboundedSender<SwipeNotification>, done: SwipeNotification) {
    match &done.outcome {
        Ok(()) => tracing::debug!("Decision #{} recorded", done.request.sequence),
        Err(e) => tracing::warn!(
            "Failed to record {} on {} (#{}): {}",
            done.request.direction,
            done.request.target_id,
            done.request.sequence,
            e
        ),
    }
    // Nobody listening is fine; the queue has moved on regardless.
    let _ = notify.send(done);
}
