// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{CurrentUser, InitialProfiles, MatchEvent, Profile, SwipeDirection, SwipeRequest};
pub use requests::RecordDecisionRequest;
pub use responses::{ChannelFrame, ProfilesResponse};
