use std::sync::Arc;

use log::info;
use mongodb::bson::{oid::ObjectId, DateTime};
use validator::Validate;

use crate::db::{Decision, UserRepository, VerificationRepository};
use crate::models::{SubmitVerificationDto, VerificationRequest, VerificationStatus};
use crate::services::{ServiceError, ServiceResult};
use crate::utils::{page_window, validation_error, Page};

/// Manual business verification, open to badge holders and decided by admins.
#[derive(Clone)]
pub struct VerificationService {
    verifications: Arc<dyn VerificationRepository>,
    users: Arc<dyn UserRepository>,
}

impl VerificationService {
    pub fn new(verifications: Arc<dyn VerificationRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { verifications, users }
    }

    pub async fn submit(&self, user_id: ObjectId, dto: SubmitVerificationDto) -> ServiceResult<VerificationRequest> {
        dto.validate().map_err(validation_error)?;

        let user = self
            .users
            .find_by_id(&user_id)
            .await?
            .ok_or(ServiceError::NotFound("User"))?;

        let now = DateTime::now();
        if !user.is_badge_active(now) {
            return Err(ServiceError::Authorization);
        }

        if user.is_verified {
            return Err(ServiceError::Validation("Your account is already verified".to_string()));
        }

        if self.verifications.find_pending_for_user(&user_id).await?.is_some() {
            return Err(ServiceError::Validation(
                "You already have a pending verification request".to_string(),
            ));
        }

        let request = VerificationRequest {
            id: None,
            user_id,
            cac_number: dto.cac_number.trim().to_string(),
            cac_document: dto.cac_document.trim().to_string(),
            status: VerificationStatus::Pending,
            rejection_reason: None,
            reviewed_by: None,
            reviewed_at: None,
            created_at: now,
            updated_at: now,
        };

        let request = self.verifications.insert(request).await?;
        info!("Verification requested by {}", user_id);
        Ok(request)
    }

    pub async fn list(
        &self,
        status: Option<VerificationStatus>,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> ServiceResult<Page<VerificationRequest>> {
        let (page, limit, skip) = page_window(page, limit);
        let items = self.verifications.list(status, skip, limit).await?;
        let total = self.verifications.count(status).await?;
        Ok(Page { items, page, limit, total })
    }

    pub async fn decide(
        &self,
        id: &ObjectId,
        admin_id: ObjectId,
        approve: bool,
        rejection_reason: Option<String>,
    ) -> ServiceResult<VerificationRequest> {
        let existing = self
            .verifications
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("Verification request"))?;

        let already_decided = || ServiceError::Validation("Verification request already decided".to_string());
        if existing.status != VerificationStatus::Pending {
            return Err(already_decided());
        }

        let decision = Decision {
            status: if approve { VerificationStatus::Approved } else { VerificationStatus::Rejected },
            rejection_reason: if approve {
                None
            } else {
                rejection_reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty())
            },
            reviewed_by: admin_id,
            reviewed_at: DateTime::now(),
        };

        let decided = self
            .verifications
            .decide(id, decision)
            .await?
            .ok_or_else(already_decided)?;

        if approve {
            self.users.set_verified(&decided.user_id, true).await?;
        }

        info!("Verification {} {} by {}", id, decided.status.as_str(), admin_id);
        Ok(decided)
    }
}
