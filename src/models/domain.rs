use serde::{Deserialize, Serialize};
use validator::Validate;

/// Candidate profile shown on the swipe stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Profile {
    #[validate(length(min = 1))]
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub bio: String,
}

/// The signed-in user driving the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct CurrentUser {
    #[validate(length(min = 1))]
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub avatar: String,
}

/// Swipe decision on the card at the top of the stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeDirection {
    Like,
    Dislike,
}

impl SwipeDirection {
    /// Path segment the API uses for this decision
    pub fn endpoint(self) -> &'static str {
        match self {
            SwipeDirection::Like => "likes",
            SwipeDirection::Dislike => "dislikes",
        }
    }
}

impl std::fmt::Display for SwipeDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SwipeDirection::Like => f.write_str("like"),
            SwipeDirection::Dislike => f.write_str("dislike"),
        }
    }
}

impl std::str::FromStr for SwipeDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "like" | "l" | "yes" => Ok(SwipeDirection::Like),
            "dislike" | "d" | "pass" | "no" => Ok(SwipeDirection::Dislike),
            other => Err(format!("unknown swipe direction: {}", other)),
        }
    }
}

/// One swipe decision on its way to the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwipeRequest {
    /// Position of this swipe within the session, starting at 0
    pub sequence: u64,
    #[serde(rename = "requestId")]
    pub request_id: uuid::Uuid,
    #[serde(rename = "actorId")]
    pub actor_id: String,
    #[serde(rename = "targetId")]
    pub target_id: String,
    pub direction: SwipeDirection,
}

/// Mutual like announced by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchEvent {
    pub profile: Profile,
    pub received_at: chrono::DateTime<chrono::Utc>,
}

impl MatchEvent {
    pub fn new(profile: Profile) -> Self {
        Self {
            profile,
            received_at: chrono::Utc::now(),
        }
    }

    /// Identity of the matched profile
    pub fn profile_id(&self) -> &str {
        &self.profile.id
    }
}

/// Everything the session needs from the profile loader
#[derive(Debug, Clone)]
pub struct InitialProfiles {
    pub user: CurrentUser,
    pub candidates: Vec<Profile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_accepts_both_id_spellings() {
        let a: Profile = serde_json::from_str(r#"{"_id":"1","name":"Ana","avatar":"https://a/1.png","bio":"hi"}"#).unwrap();
        let b: Profile = serde_json::from_str(r#"{"id":"1","name":"Ana","avatar":"https://a/1.png","bio":"hi"}"#).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_profile_optional_fields_default() {
        let p: Profile = serde_json::from_str(r#"{"_id":"7","name":"Bo"}"#).unwrap();
        assert!(p.avatar.is_empty());
        assert!(p.bio.is_empty());
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_profile_validation_rejects_empty_id() {
        let p = Profile {
            id: String::new(),
            name: "Nameless".to_string(),
            avatar: String::new(),
            bio: String::new(),
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_direction_parsing() {
        assert_eq!("Like".parse::<SwipeDirection>().unwrap(), SwipeDirection::Like);
        assert_eq!("pass".parse::<SwipeDirection>().unwrap(), SwipeDirection::Dislike);
        assert!("maybe".parse::<SwipeDirection>().is_err());
        assert_eq!(SwipeDirection::Dislike.endpoint(), "dislikes");
    }
}
