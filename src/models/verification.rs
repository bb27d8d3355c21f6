use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::JsonSchema;
use validator::Validate;

use crate::utils::not_blank;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Pending,
    Approved,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Approved => "approved",
            VerificationStatus::Rejected => "rejected",
        }
    }
}

/// A provider's request for manual verification against their CAC registration.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VerificationRequest {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub cac_number: String,
    pub cac_document: String,
    pub status: VerificationStatus,
    pub rejection_reason: Option<String>,
    pub reviewed_by: Option<ObjectId>,
    pub reviewed_at: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Deserialize, JsonSchema, Validate)]
pub struct SubmitVerificationDto {
    #[validate(custom = "not_blank")]
    pub cac_number: String,
    #[validate(custom = "not_blank")]
    pub cac_document: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DecideVerificationDto {
    pub approve: bool,
    pub rejection_reason: Option<String>,
}

#[derive(FromForm, Deserialize, JsonSchema)]
pub struct VerificationListQuery {
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct VerificationResponse {
    pub id: String,
    pub user_id: String,
    pub cac_number: String,
    pub cac_document: String,
    pub status: VerificationStatus,
    pub rejection_reason: Option<String>,
    pub created_at: String,
}

impl From<VerificationRequest> for VerificationResponse {
    fn from(request: VerificationRequest) -> Self {
        VerificationResponse {
            id: request.id.map(|id| id.to_hex()).unwrap_or_default(),
            user_id: request.user_id.to_hex(),
            cac_number: request.cac_number,
            cac_document: request.cac_document,
            status: request.status,
            rejection_reason: request.rejection_reason,
            created_at: request.created_at.try_to_rfc3339_string().unwrap_or_default(),
        }
    }
}
