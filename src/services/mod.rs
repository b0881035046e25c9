// Service exports
pub mod api;
pub mod socket;

pub use api::{ApiClient, ApiError};
pub use socket::SocketTransport;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use thiserror::Error;

use crate::models::{InitialProfiles, MatchEvent, SwipeRequest};

/// Errors from loading the initial profile batch
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("profile request failed: {0}")]
    Request(String),

    #[error("user not found: {0}")]
    NotFound(String),

    #[error("invalid profile response: {0}")]
    InvalidResponse(String),
}

/// Errors from recording a swipe decision
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("decision rejected with status {status}")]
    Rejected { status: u16 },

    #[error("decision request failed: {0}")]
    Transport(String),

    #[error("invalid decision: {0}")]
    Invalid(String),
}

/// Errors from the push transport
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("could not connect: {0}")]
    Connect(String),

    #[error("connection timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("closed by server (code {code}): {reason}")]
    Closed { code: u16, reason: String },
}

/// Stream of match events for one live connection
///
/// Ends (or yields an error) when the connection is lost.
pub type EventStream = BoxStream<'static, Result<MatchEvent, TransportError>>;

/// Supplies the signed-in user and the initial swipe stack
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn fetch_initial(&self, identity: &str) -> Result<InitialProfiles, SourceError>;
}

/// Records like/dislike decisions on the backend
#[async_trait]
pub trait DecisionRecorder: Send + Sync {
    async fn record(&self, request: &SwipeRequest) -> Result<(), RecordError>;
}

/// Subscribe-by-identity push primitive delivering match events
#[async_trait]
pub trait EventTransport: Send + Sync {
    /// Establish one connection for `identity`.
    async fn connect(&self, identity: &str) -> Result<EventStream, TransportError>;
}
