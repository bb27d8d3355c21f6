//! In-process repositories used by the test suites.

use std::cmp::Reverse;

use mongodb::bson::{oid::ObjectId, DateTime};
use tokio::sync::RwLock;

use super::{
    BadgePaymentRepository, Decision, HireRequestFilter, HireRequestRepository, ReviewRepository,
    UserRepository, VerificationRepository,
};
use crate::models::{
    BadgePayment, HireRequest, HireStatus, PaymentStatus, RatingSummary, Review, User,
    VerificationRequest, VerificationStatus,
};
use crate::services::ServiceResult;

fn page<T: Clone>(items: Vec<T>, skip: u64, limit: i64) -> Vec<T> {
    items
        .into_iter()
        .skip(skip as usize)
        .take(limit.max(0) as usize)
        .collect()
}

#[derive(Default)]
pub struct MemoryHireRequests {
    rows: RwLock<Vec<HireRequest>>,
}

#[rocket::async_trait]
impl HireRequestRepository for MemoryHireRequests {
    async fn insert(&self, mut request: HireRequest) -> ServiceResult<HireRequest> {
        request.id = Some(ObjectId::new());
        self.rows.write().await.push(request.clone());
        Ok(request)
    }

    async fn find_by_id(&self, id: &ObjectId) -> ServiceResult<Option<HireRequest>> {
        Ok(self.rows.read().await.iter().find(|r| r.id.as_ref() == Some(id)).cloned())
    }

    async fn update_status(
        &self,
        id: &ObjectId,
        expected: HireStatus,
        next: HireStatus,
        at: DateTime,
    ) -> ServiceResult<Option<HireRequest>> {
        let mut rows = self.rows.write().await;
        let row = rows
            .iter_mut()
            .find(|r| r.id.as_ref() == Some(id) && r.status == expected);

        Ok(row.map(|row| {
            row.status = next;
            row.updated_at = at;
            row.clone()
        }))
    }

    async fn list(&self, filter: &HireRequestFilter, skip: u64, limit: i64) -> ServiceResult<Vec<HireRequest>> {
        let mut matching: Vec<HireRequest> = self
            .rows
            .read()
            .await
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        matching.sort_by_key(|r| Reverse((r.created_at, r.id)));
        Ok(page(matching, skip, limit))
    }

    async fn count(&self, filter: &HireRequestFilter) -> ServiceResult<u64> {
        Ok(self.rows.read().await.iter().filter(|r| filter.matches(r)).count() as u64)
    }

    async fn hired_provider_ids(&self, client_id: &ObjectId) -> ServiceResult<Vec<ObjectId>> {
        let mut ids: Vec<ObjectId> = self
            .rows
            .read()
            .await
            .iter()
            .filter(|r| r.client_id == *client_id && r.status.counts_as_hired())
            .map(|r| r.provider_id)
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }
}

#[derive(Default)]
pub struct MemoryReviews {
    rows: RwLock<Vec<Review>>,
}

#[rocket::async_trait]
impl ReviewRepository for MemoryReviews {
    async fn insert(&self, mut review: Review) -> ServiceResult<Review> {
        review.id = Some(ObjectId::new());
        self.rows.write().await.push(review.clone());
        Ok(review)
    }

    async fn exists_for_service(&self, service_id: &ObjectId) -> ServiceResult<bool> {
        Ok(self.rows.read().await.iter().any(|r| r.service_id == *service_id))
    }

    async fn list_for_provider(&self, provider_id: &ObjectId, skip: u64, limit: i64) -> ServiceResult<Vec<Review>> {
        let mut matching: Vec<Review> = self
            .rows
            .read()
            .await
            .iter()
            .filter(|r| r.provider_id == *provider_id)
            .cloned()
            .collect();
        matching.sort_by_key(|r| Reverse((r.created_at, r.id)));
        Ok(page(matching, skip, limit))
    }

    async fn ratings_for_provider(&self, provider_id: &ObjectId) -> ServiceResult<Vec<i32>> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .filter(|r| r.provider_id == *provider_id)
            .map(|r| r.rating)
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryUsers {
    rows: RwLock<Vec<User>>,
}

impl MemoryUsers {
    pub async fn insert(&self, user: User) -> User {
        self.rows.write().await.push(user.clone());
        user
    }

    async fn modify<F>(&self, id: &ObjectId, f: F) -> bool
    where
        F: FnOnce(&mut User) -> bool + Send,
    {
        let mut rows = self.rows.write().await;
        match rows.iter_mut().find(|u| u.id.as_ref() == Some(id)) {
            Some(user) => f(user),
            None => false,
        }
    }
}

#[rocket::async_trait]
impl UserRepository for MemoryUsers {
    async fn find_by_id(&self, id: &ObjectId) -> ServiceResult<Option<User>> {
        Ok(self.rows.read().await.iter().find(|u| u.id.as_ref() == Some(id)).cloned())
    }

    async fn find_many(&self, ids: &[ObjectId]) -> ServiceResult<Vec<User>> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .filter(|u| u.id.is_some_and(|id| ids.contains(&id)))
            .cloned()
            .collect())
    }

    async fn update_rating(&self, id: &ObjectId, summary: RatingSummary) -> ServiceResult<()> {
        self.modify(id, |user| {
            user.rating = summary.average_rating;
            user.total_reviews = summary.total_reviews;
            true
        })
        .await;
        Ok(())
    }

    async fn activate_badge(&self, id: &ObjectId, subscription_end: DateTime) -> ServiceResult<()> {
        self.modify(id, |user| {
            user.has_badge = true;
            user.subscription_end = Some(subscription_end);
            true
        })
        .await;
        Ok(())
    }

    async fn set_verified(&self, id: &ObjectId, verified: bool) -> ServiceResult<()> {
        self.modify(id, |user| {
            user.is_verified = verified;
            true
        })
        .await;
        Ok(())
    }

    async fn push_portfolio_image(&self, id: &ObjectId, url: &str, limit: usize) -> ServiceResult<bool> {
        let url = url.to_string();
        Ok(self
            .modify(id, move |user| {
                if user.portfolio_images.len() >= limit {
                    return false;
                }
                user.portfolio_images.push(url);
                true
            })
            .await)
    }

    async fn pull_portfolio_image(&self, id: &ObjectId, url: &str) -> ServiceResult<bool> {
        Ok(self
            .modify(id, |user| {
                let before = user.portfolio_images.len();
                user.portfolio_images.retain(|image| image != url);
                user.portfolio_images.len() != before
            })
            .await)
    }
}

#[derive(Default)]
pub struct MemoryBadgePayments {
    rows: RwLock<Vec<BadgePayment>>,
}

#[rocket::async_trait]
impl BadgePaymentRepository for MemoryBadgePayments {
    async fn insert(&self, mut payment: BadgePayment) -> ServiceResult<BadgePayment> {
        payment.id = Some(ObjectId::new());
        self.rows.write().await.push(payment.clone());
        Ok(payment)
    }

    async fn find_by_tx_ref(&self, tx_ref: &str) -> ServiceResult<Option<BadgePayment>> {
        Ok(self.rows.read().await.iter().find(|p| p.tx_ref == tx_ref).cloned())
    }

    async fn settle(
        &self,
        tx_ref: &str,
        status: PaymentStatus,
        transaction_id: &str,
        subscription_end: Option<DateTime>,
    ) -> ServiceResult<Option<BadgePayment>> {
        let mut rows = self.rows.write().await;
        let row = rows
            .iter_mut()
            .find(|p| p.tx_ref == tx_ref && p.status == PaymentStatus::Pending);

        Ok(row.map(|row| {
            row.status = status;
            row.transaction_id = Some(transaction_id.to_string());
            row.subscription_end = subscription_end;
            row.updated_at = DateTime::now();
            row.clone()
        }))
    }
}

#[derive(Default)]
pub struct MemoryVerifications {
    rows: RwLock<Vec<VerificationRequest>>,
}

#[rocket::async_trait]
impl VerificationRepository for MemoryVerifications {
    async fn insert(&self, mut request: VerificationRequest) -> ServiceResult<VerificationRequest> {
        request.id = Some(ObjectId::new());
        self.rows.write().await.push(request.clone());
        Ok(request)
    }

    async fn find_by_id(&self, id: &ObjectId) -> ServiceResult<Option<VerificationRequest>> {
        Ok(self.rows.read().await.iter().find(|r| r.id.as_ref() == Some(id)).cloned())
    }

    async fn find_pending_for_user(&self, user_id: &ObjectId) -> ServiceResult<Option<VerificationRequest>> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .find(|r| r.user_id == *user_id && r.status == VerificationStatus::Pending)
            .cloned())
    }

    async fn list(
        &self,
        status: Option<VerificationStatus>,
        skip: u64,
        limit: i64,
    ) -> ServiceResult<Vec<VerificationRequest>> {
        let mut matching: Vec<VerificationRequest> = self
            .rows
            .read()
            .await
            .iter()
            .filter(|r| status.is_none_or(|s| s == r.status))
            .cloned()
            .collect();
        matching.sort_by_key(|r| Reverse((r.created_at, r.id)));
        Ok(page(matching, skip, limit))
    }

    async fn count(&self, status: Option<VerificationStatus>) -> ServiceResult<u64> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .filter(|r| status.is_none_or(|s| s == r.status))
            .count() as u64)
    }

    async fn decide(&self, id: &ObjectId, decision: Decision) -> ServiceResult<Option<VerificationRequest>> {
        let mut rows = self.rows.write().await;
        let row = rows
            .iter_mut()
            .find(|r| r.id.as_ref() == Some(id) && r.status == VerificationStatus::Pending);

        Ok(row.map(|row| {
            row.status = decision.status;
            row.rejection_reason = decision.rejection_reason;
            row.reviewed_by = Some(decision.reviewed_by);
            row.reviewed_at = Some(decision.reviewed_at);
            row.updated_at = decision.reviewed_at;
            row.clone()
        }))
    }
}
