use crate::models::Profile;
use std::collections::{HashSet, VecDeque};
use thiserror::Error;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("candidate queue is empty")]
    EmptyQueue,
}

/// What observers see of the queue after every mutation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueView {
    pub front: Option<Profile>,
    pub remaining: usize,
}

/// Ordered swipe stack, consumed strictly from the front
///
/// An identity enters the queue at most once per session: duplicates in the
/// initial batch are dropped, and popped profiles can never be appended back.
#[derive(Debug)]
pub struct CandidateQueue {
    items: VecDeque<Profile>,
    known: HashSet<String>,
    swiped: usize,
    view: watch::Sender<QueueView>,
}

impl CandidateQueue {
    pub fn new(profiles: Vec<Profile>) -> Self {
        let (view, _) = watch::channel(QueueView::default());
        let mut queue = Self {
            items: VecDeque::with_capacity(profiles.len()),
            known: HashSet::with_capacity(profiles.len()),
            swiped: 0,
            view,
        };
        queue.push_unique(profiles);
        queue.publish();
        queue
    }

    /// Profile currently eligible for swiping
    pub fn peek_front(&self) -> Option<&Profile> {
        self.items.front()
    }

    /// Remove and return the front profile
    pub fn pop_front(&mut self) -> Result<Profile, QueueError> {
        let profile = self.items.pop_front().ok_or(QueueError::EmptyQueue)?;
        self.swiped += 1;
        self.publish();
        Ok(profile)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Number of profiles popped so far this session
    pub fn swiped(&self) -> usize {
        self.swiped
    }

    /// Append a further page of candidates behind the current ones
    ///
    /// Returns how many were actually added.
    pub fn append(&mut self, profiles: Vec<Profile>) -> usize {
        let added = self.push_unique(profiles);
        if added > 0 {
            self.publish();
        }
        added
    }

    /// Watch the front of the queue
    pub fn observe(&self) -> watch::Receiver<QueueView> {
        self.view.subscribe()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Profile> {
        self.items.iter()
    }

    fn push_unique(&mut self, profiles: Vec<Profile>) -> usize {
        let mut added = 0;
        for profile in profiles {
            if self.known.insert(profile.id.clone()) {
                self.items.push_back(profile);
                added += 1;
            } else {
                tracing::debug!("Skipping duplicate candidate {}", profile.id);
            }
        }
        added
    }

    fn publish(&self) {
        self.view.send_replace(QueueView {
            front: self.items.front().cloned(),
            remaining: self.items.len(),
        });
    }
}
