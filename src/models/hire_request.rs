use std::fmt;
use std::str::FromStr;

use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars;
use rocket_okapi::okapi::schemars::JsonSchema;
use validator::Validate;

use crate::utils::{not_blank, valid_phone};

/// Lifecycle of a hire request.
///
/// `pending` is the initial state, `rejected` and `completed` absorb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum HireStatus {
    Pending,
    Accepted,
    Rejected,
    Hired,
    Completed,
}

impl HireStatus {
    pub const ALL: [HireStatus; 5] = [
        HireStatus::Pending,
        HireStatus::Accepted,
        HireStatus::Rejected,
        HireStatus::Hired,
        HireStatus::Completed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HireStatus::Pending => "pending",
            HireStatus::Accepted => "accepted",
            HireStatus::Rejected => "rejected",
            HireStatus::Hired => "hired",
            HireStatus::Completed => "completed",
        }
    }

    /// The only place the transition table lives. Every mutation path checks it.
    pub fn allowed_transitions(self) -> &'static [HireStatus] {
        match self {
            HireStatus::Pending => &[HireStatus::Accepted, HireStatus::Rejected, HireStatus::Hired],
            HireStatus::Accepted => &[HireStatus::Hired, HireStatus::Rejected],
            HireStatus::Hired => &[HireStatus::Completed, HireStatus::Rejected],
            HireStatus::Rejected | HireStatus::Completed => &[],
        }
    }

    pub fn can_transition_to(self, next: HireStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// Statuses that put a provider on the client's hired list.
    pub fn counts_as_hired(self) -> bool {
        matches!(self, HireStatus::Hired | HireStatus::Completed)
    }
}

impl fmt::Display for HireStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HireStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        HireStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| format!("Unknown status '{}'", s.trim()))
    }
}

impl From<HireStatus> for mongodb::bson::Bson {
    fn from(status: HireStatus) -> Self {
        mongodb::bson::Bson::String(status.as_str().to_string())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HireRequest {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub client_id: ObjectId,
    pub provider_id: ObjectId,
    pub title: String,
    pub event_date: Option<DateTime>,
    pub location: Option<String>,
    pub budget: Option<String>,
    pub phone: String,
    pub email: String,
    pub message: String,
    pub attachment: Option<String>,
    pub status: HireStatus,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl HireRequest {
    pub fn involves(&self, user_id: &ObjectId) -> bool {
        self.client_id == *user_id || self.provider_id == *user_id
    }
}

/// Free-form details a client fills in when hiring a provider.
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
pub struct HireRequestDetails {
    #[validate(custom = "not_blank")]
    pub title: String,
    #[validate(custom = "not_blank")]
    pub message: String,
    #[validate(custom = "valid_phone")]
    pub phone: String,
    #[validate(email(message = "A valid contact email is required"))]
    pub email: String,
    /// `YYYY-MM-DD`
    pub event_date: Option<String>,
    pub location: Option<String>,
    pub budget: Option<String>,
    pub attachment: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateHireRequestDto {
    pub provider_id: String,
    #[serde(flatten)]
    pub details: HireRequestDetails,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateHireStatusDto {
    pub status: String,
}

#[derive(Debug, FromForm, Deserialize, JsonSchema)]
pub struct HireListQuery {
    /// `provider` or `client`; defaults to `client`.
    pub role: Option<String>,
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HireRole {
    Client,
    Provider,
}

impl FromStr for HireRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "client" => Ok(HireRole::Client),
            "provider" => Ok(HireRole::Provider),
            other => Err(format!("Invalid role '{}'. Use 'provider' or 'client'", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct HireRequestResponse {
    pub id: String,
    pub client_id: String,
    pub provider_id: String,
    pub title: String,
    pub event_date: Option<String>,
    pub location: Option<String>,
    pub budget: Option<String>,
    pub phone: String,
    pub email: String,
    pub message: String,
    pub attachment: Option<String>,
    pub status: HireStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl From<HireRequest> for HireRequestResponse {
    fn from(request: HireRequest) -> Self {
        HireRequestResponse {
            id: request.id.map(|id| id.to_hex()).unwrap_or_default(),
            client_id: request.client_id.to_hex(),
            provider_id: request.provider_id.to_hex(),
            title: request.title,
            event_date: request.event_date.and_then(|date| {
                chrono::DateTime::from_timestamp_millis(date.timestamp_millis())
                    .map(|d| d.format("%Y-%m-%d").to_string())
            }),
            location: request.location,
            budget: request.budget,
            phone: request.phone,
            email: request.email,
            message: request.message,
            attachment: request.attachment,
            status: request.status,
            created_at: request.created_at.try_to_rfc3339_string().unwrap_or_default(),
            updated_at: request.updated_at.try_to_rfc3339_string().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct HiredProviderResponse {
    pub provider_id: String,
    pub name: Option<String>,
    pub profile_photo: Option<String>,
    pub rating: f64,
    pub total_reviews: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_table_matches_lifecycle() {
        use HireStatus::*;

        assert!(Pending.can_transition_to(Accepted));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Pending.can_transition_to(Hired));
        assert!(!Pending.can_transition_to(Completed));

        assert!(Accepted.can_transition_to(Hired));
        assert!(Accepted.can_transition_to(Rejected));
        assert!(!Accepted.can_transition_to(Completed));
        assert!(!Accepted.can_transition_to(Pending));

        assert!(Hired.can_transition_to(Completed));
        assert!(Hired.can_transition_to(Rejected));
        assert!(!Hired.can_transition_to(Accepted));
    }

    #[test]
    fn terminal_states_absorb() {
        for target in HireStatus::ALL {
            assert!(!HireStatus::Rejected.can_transition_to(target));
            assert!(!HireStatus::Completed.can_transition_to(target));
        }
        assert!(HireStatus::Rejected.is_terminal());
        assert!(HireStatus::Completed.is_terminal());
        assert!(!HireStatus::Hired.is_terminal());
    }

    #[test]
    fn no_status_loops_back_to_itself() {
        for status in HireStatus::ALL {
            assert!(!status.can_transition_to(status), "{} -> {}", status, status);
        }
    }

    #[test]
    fn parses_status_strings() {
        assert_eq!("Accepted".parse::<HireStatus>(), Ok(HireStatus::Accepted));
        assert_eq!(" hired ".parse::<HireStatus>(), Ok(HireStatus::Hired));
        assert!("done".parse::<HireStatus>().is_err());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&HireStatus::Completed).unwrap();
        assert_eq!(json, "\"completed\"");
    }
}
