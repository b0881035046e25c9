// Swipe/match synchronization core
pub mod channel;
pub mod coordinator;
pub mod queue;
pub mod session;
pub mod slot;

pub use channel::{ChannelError, ChannelSettings, ChannelStatus, MatchChannel, MatchStream};
pub use coordinator::{SwipeCoordinator, SwipeError, SwipeNotification, SwipeNotifications, SwipeTicket};
pub use queue::{CandidateQueue, QueueError, QueueView};
pub use session::{Session, SessionError};
pub use slot::{Delivery, MatchPolicy, MatchSlot, MatchSlotState};
