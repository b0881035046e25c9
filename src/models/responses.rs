use serde::{Deserialize, Serialize};
use crate::models::domain::{CurrentUser, Profile};

/// Response for the candidate listing endpoint
///
/// `users` is kept as raw JSON so one malformed entry does not sink the batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilesResponse {
    pub user: CurrentUser,
    #[serde(default)]
    pub users: Vec<serde_json::Value>,
}

/// Frame pushed over the match socket
///
/// Tagged on `"type"`:
///
/// ```json
/// {"type":"match","profile":{"_id":"...","name":"...","avatar":"...","bio":"..."}}
/// {"type":"ping"}
/// {"type":"error","code":4001,"reason":"unknown user"}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelFrame {
    Match {
        #[serde(alias = "dev")]
        profile: Profile,
    },
    Ping,
    Error {
        code: u16,
        reason: String,
    },
}
