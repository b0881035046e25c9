use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::{SwipeDirection, SwipeRequest};

/// Body sent with a like/dislike call
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecordDecisionRequest {
    #[validate(length(min = 1))]
    #[serde(rename = "userId")]
    pub user_id: String,
    #[validate(length(min = 1))]
    #[serde(rename = "targetUserId")]
    pub target_user_id: String,
    pub direction: SwipeDirection,
    #[serde(rename = "requestId")]
    pub request_id: uuid::Uuid,
}

impl From<&SwipeRequest> for RecordDecisionRequest {
    fn from(request: &SwipeRequest) -> Self {
        Self {
            user_id: request.actor_id.clone(),
            target_user_id: request.target_id.clone(),
            direction: request.direction,
            request_id: request.request_id,
        }
    }
}
