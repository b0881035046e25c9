//! Lume Swipe - swipe queue and match notification core for the Lume dating app
//!
//! The shell hands this crate a candidate stack and a user identity; it keeps
//! the visible stack moving optimistically while decisions are recorded in the
//! background, and surfaces mutual likes pushed over a separate live channel.

pub mod config;
pub mod core;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use self::core::{CandidateQueue, ChannelSettings, ChannelStatus, MatchChannel, MatchPolicy, Session, SwipeCoordinator, SwipeError};
pub use models::{CurrentUser, MatchEvent, Profile, SwipeDirection, SwipeRequest};
pub use services::{ApiClient, DecisionRecorder, EventTransport, ProfileSource, SocketTransport};
