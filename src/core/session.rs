use crate::core::channel::{ChannelError, ChannelSettings, MatchChannel, MatchStream};
use crate::core::coordinator::{SwipeCoordinator, SwipeNotifications};
use crate::core::queue::CandidateQueue;
use crate::models::CurrentUser;
use crate::services::{DecisionRecorder, EventTransport, ProfileSource, SourceError};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to load profiles: {0}")]
    Load(#[from] SourceError),

    #[error(transparent)]
    Channel(#[from] ChannelError),
}

/// One signed-in swipe session
///
/// The coordinator and the channel are independent: each owns its own state
/// and closing one never touches the other's in-flight work.
pub struct Session {
    pub user: CurrentUser,
    pub swipes: SwipeCoordinator,
    pub matches: MatchChannel,
}

impl Session {
    /// Load the user and their stack, then wire up coordinator and channel.
    ///
    /// The channel is created but not opened; see [`Session::open_channel`].
    pub async fn start(
        identity: &str,
        source: Arc<dyn ProfileSource>,
        recorder: Arc<dyn DecisionRecorder>,
        transport: Arc<dyn EventTransport>,
        channel_settings: ChannelSettings,
    ) -> Result<(Self, SwipeNotifications), SessionError> {
        let initial = source.fetch_initial(identity).await?;

        tracing::info!(
            "Session started for {} with {} candidates",
            initial.user.id,
            initial.candidates.len()
        );

        let queue = CandidateQueue::new(initial.candidates);
        let (swipes, notifications) = SwipeCoordinator::new(initial.user.clone(), queue, recorder);
        let matches = MatchChannel::new(transport, channel_settings);

        let session = Self {
            user: initial.user,
            swipes,
            matches,
        };

        Ok((session, notifications))
    }

    /// Open (or reopen) the match channel for the session user
    pub async fn open_channel(&mut self) -> Result<MatchStream, SessionError> {
        Ok(self.matches.open(&self.user.id).await?)
    }

    pub async fn end(mut self) {
        self.matches.close().await;
        tracing::info!(
            "Session ended for {} ({} swiped, {} left)",
            self.user.id,
            self.swipes.queue().swiped(),
            self.swipes.queue().len()
        );
    }
}
