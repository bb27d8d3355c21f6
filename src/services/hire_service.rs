use std::sync::Arc;

use log::{info, warn};
use mongodb::bson::{oid::ObjectId, DateTime};
use validator::Validate;

use crate::db::{HireRequestFilter, HireRequestRepository, UserRepository};
use crate::models::{
    HireRequest, HireRequestDetails, HireRole, HireStatus, HiredProviderResponse,
};
use crate::services::email::Notifier;
use crate::services::{ServiceError, ServiceResult};
use crate::utils::{page_window, parse_date, validation_error, Page};

/// Owns the hire request lifecycle: creation, status transitions and the
/// per-role views derived from the stored requests.
#[derive(Clone)]
pub struct HireRequestService {
    requests: Arc<dyn HireRequestRepository>,
    users: Arc<dyn UserRepository>,
    notifier: Arc<dyn Notifier>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl HireRequestService {
    pub fn new(
        requests: Arc<dyn HireRequestRepository>,
        users: Arc<dyn UserRepository>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self { requests, users, notifier }
    }

    pub async fn create_request(
        &self,
        client_id: ObjectId,
        provider_id: ObjectId,
        details: HireRequestDetails,
    ) -> ServiceResult<HireRequest> {
        details.validate().map_err(validation_error)?;

        if client_id == provider_id {
            return Err(ServiceError::Validation("You cannot hire yourself".to_string()));
        }

        let event_date = match non_empty(details.event_date) {
            Some(raw) => Some(parse_date(&raw)?),
            None => None,
        };

        let provider = self
            .users
            .find_by_id(&provider_id)
            .await?
            .ok_or(ServiceError::NotFound("Provider"))?;

        let now = DateTime::now();
        let request = HireRequest {
            id: None,
            client_id,
            provider_id,
            title: details.title.trim().to_string(),
            event_date,
            location: non_empty(details.location),
            budget: non_empty(details.budget),
            phone: details.phone.trim().to_string(),
            email: details.email.trim().to_string(),
            message: details.message.trim().to_string(),
            attachment: non_empty(details.attachment),
            status: HireStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        let request = self.requests.insert(request).await?;
        info!(
            "Hire request {} created by {} for provider {}",
            request.id.map(|id| id.to_hex()).unwrap_or_default(),
            client_id,
            provider_id
        );

        self.notifier.hire_request_received(&provider, &request).await;
        Ok(request)
    }

    /// Only the two parties on a request may read it.
    pub async fn get_request(&self, id: &ObjectId, actor: &ObjectId) -> ServiceResult<HireRequest> {
        let request = self
            .requests
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("Hire request"))?;

        if !request.involves(actor) {
            return Err(ServiceError::Authorization);
        }
        Ok(request)
    }

    pub async fn update_status(
        &self,
        id: &ObjectId,
        actor: &ObjectId,
        next: HireStatus,
    ) -> ServiceResult<HireRequest> {
        let current = self
            .requests
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("Hire request"))?;

        if current.provider_id != *actor {
            warn!("User {} tried to change status of hire request {}", actor, id);
            return Err(ServiceError::Authorization);
        }

        if !current.status.can_transition_to(next) {
            return Err(ServiceError::InvalidTransition {
                current: current.status,
                attempted: next,
            });
        }

        let updated = match self
            .requests
            .update_status(id, current.status, next, DateTime::now())
            .await?
        {
            Some(updated) => updated,
            None => {
                // Lost a race with another writer: report against whatever is stored now.
                let latest = self
                    .requests
                    .find_by_id(id)
                    .await?
                    .ok_or(ServiceError::NotFound("Hire request"))?;
                return Err(ServiceError::InvalidTransition {
                    current: latest.status,
                    attempted: next,
                });
            }
        };

        info!(
            "Hire request {} moved {} -> {} by {}{}",
            id,
            current.status,
            next,
            actor,
            if next.is_terminal() { " (closed)" } else { "" }
        );
        self.notifier.hire_status_changed(&updated).await;
        Ok(updated)
    }

    pub async fn list_for_provider(
        &self,
        provider_id: ObjectId,
        status: Option<HireStatus>,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> ServiceResult<Page<HireRequest>> {
        self.list(HireRole::Provider, provider_id, status, page, limit).await
    }

    pub async fn list_for_client(
        &self,
        client_id: ObjectId,
        status: Option<HireStatus>,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> ServiceResult<Page<HireRequest>> {
        self.list(HireRole::Client, client_id, status, page, limit).await
    }

    async fn list(
        &self,
        role: HireRole,
        user_id: ObjectId,
        status: Option<HireStatus>,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> ServiceResult<Page<HireRequest>> {
        let (page, limit, skip) = page_window(page, limit);
        let filter = HireRequestFilter { role, user_id, status };

        let items = self.requests.list(&filter, skip, limit).await?;
        let total = self.requests.count(&filter).await?;

        Ok(Page { items, page, limit, total })
    }

    /// Providers the client has hired at least once. Computed from the
    /// stored statuses on every call.
    pub async fn hired_providers(&self, client_id: &ObjectId) -> ServiceResult<Vec<HiredProviderResponse>> {
        let ids = self.requests.hired_provider_ids(client_id).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let users = self.users.find_many(&ids).await?;

        Ok(ids
            .into_iter()
            .map(|id| match users.iter().find(|user| user.id == Some(id)) {
                Some(user) => HiredProviderResponse {
                    provider_id: id.to_hex(),
                    name: user.name.clone(),
                    profile_photo: user.profile_photo.clone(),
                    rating: user.rating,
                    total_reviews: user.total_reviews,
                },
                None => HiredProviderResponse {
                    provider_id: id.to_hex(),
                    name: None,
                    profile_photo: None,
                    rating: 0.0,
                    total_reviews: 0,
                },
            })
            .collect())
    }
}
