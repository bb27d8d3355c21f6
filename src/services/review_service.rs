use std::sync::Arc;

use log::{info, warn};
use mongodb::bson::{oid::ObjectId, DateTime};
use validator::Validate;

use crate::db::{HireRequestRepository, ReviewRepository, UserRepository};
use crate::models::{CreateReviewDto, HireStatus, RatingSummary, Review};
use crate::services::{ServiceError, ServiceResult};
use crate::utils::{page_window, parse_object_id, validation_error, Page};

#[derive(Clone)]
pub struct ReviewService {
    reviews: Arc<dyn ReviewRepository>,
    requests: Arc<dyn HireRequestRepository>,
    users: Arc<dyn UserRepository>,
}

impl ReviewService {
    pub fn new(
        reviews: Arc<dyn ReviewRepository>,
        requests: Arc<dyn HireRequestRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self { reviews, requests, users }
    }

    /// A client reviews a completed hire request, at most once per request.
    pub async fn submit_review(&self, client_id: ObjectId, dto: CreateReviewDto) -> ServiceResult<Review> {
        dto.validate().map_err(validation_error)?;
        let service_id = parse_object_id(&dto.service_id, "service")?;

        let request = self
            .requests
            .find_by_id(&service_id)
            .await?
            .ok_or(ServiceError::NotFound("Hire request"))?;

        if request.client_id != client_id {
            return Err(ServiceError::Authorization);
        }

        if request.status != HireStatus::Completed {
            return Err(ServiceError::Validation(
                "Reviews can only be left for completed requests".to_string(),
            ));
        }

        if self.reviews.exists_for_service(&service_id).await? {
            return Err(ServiceError::Validation(
                "You have already reviewed this request".to_string(),
            ));
        }

        let review = Review {
            id: None,
            service_id,
            client_id,
            provider_id: request.provider_id,
            rating: dto.rating,
            comment: dto.comment.map(|c| c.trim().to_string()).unwrap_or_default(),
            created_at: DateTime::now(),
        };
        let review = self.reviews.insert(review).await?;
        info!("Review {} stored for provider {}", service_id, request.provider_id);

        // The review is already stored; a stale aggregate is corrected on the next write.
        if let Err(e) = self.refresh_rating(&request.provider_id).await {
            warn!("Failed to refresh rating for {}: {}", request.provider_id, e);
        }

        Ok(review)
    }

    async fn refresh_rating(&self, provider_id: &ObjectId) -> ServiceResult<RatingSummary> {
        let summary = self.provider_rating(provider_id).await?;
        self.users.update_rating(provider_id, summary).await?;
        Ok(summary)
    }

    pub async fn provider_rating(&self, provider_id: &ObjectId) -> ServiceResult<RatingSummary> {
        let ratings = self.reviews.ratings_for_provider(provider_id).await?;
        Ok(RatingSummary::from_ratings(&ratings))
    }

    pub async fn provider_reviews(
        &self,
        provider_id: &ObjectId,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> ServiceResult<(Page<Review>, RatingSummary)> {
        let (page, limit, skip) = page_window(page, limit);
        let items = self.reviews.list_for_provider(provider_id, skip, limit).await?;
        let summary = self.provider_rating(provider_id).await?;

        Ok((
            Page { items, page, limit, total: summary.total_reviews as u64 },
            summary,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::{MemoryHireRequests, MemoryReviews, MemoryUsers};
    use crate::models::{test_user, HireRequest, UserRole};

    struct Fixture {
        service: ReviewService,
        requests: Arc<MemoryHireRequests>,
        users: Arc<MemoryUsers>,
        client: ObjectId,
        provider: ObjectId,
    }

    async fn fixture() -> Fixture {
        let reviews = Arc::new(MemoryReviews::default());
        let requests = Arc::new(MemoryHireRequests::default());
        let users = Arc::new(MemoryUsers::default());

        let client = users.insert(test_user(UserRole::Client)).await.id.unwrap();
        let provider = users.insert(test_user(UserRole::Provider)).await.id.unwrap();

        let service = ReviewService::new(reviews, requests.clone(), users.clone());
        Fixture { service, requests, users, client, provider }
    }

    async fn request_in(f: &Fixture, status: HireStatus) -> ObjectId {
        let now = DateTime::now();
        let request = HireRequest {
            id: None,
            client_id: f.client,
            provider_id: f.provider,
            title: "Wedding Photoshoot".to_string(),
            event_date: None,
            location: None,
            budget: None,
            phone: "+2348031234567".to_string(),
            email: "client@example.com".to_string(),
            message: "Full day".to_string(),
            attachment: None,
            status,
            created_at: now,
            updated_at: now,
        };
        f.requests.insert(request).await.unwrap().id.unwrap()
    }

    fn dto(service_id: ObjectId, rating: i32) -> CreateReviewDto {
        CreateReviewDto {
            service_id: service_id.to_hex(),
            rating,
            comment: Some(" Great work ".to_string()),
        }
    }

    #[tokio::test]
    async fn completed_request_can_be_reviewed_once() {
        let f = fixture().await;
        let id = request_in(&f, HireStatus::Completed).await;

        let review = f.service.submit_review(f.client, dto(id, 5)).await.unwrap();
        assert_eq!(review.provider_id, f.provider);
        assert_eq!(review.comment, "Great work");

        let err = f.service.submit_review(f.client, dto(id, 4)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn unfinished_requests_cannot_be_reviewed() {
        let f = fixture().await;
        for status in [HireStatus::Pending, HireStatus::Accepted, HireStatus::Hired, HireStatus::Rejected] {
            let id = request_in(&f, status).await;
            let err = f.service.submit_review(f.client, dto(id, 5)).await.unwrap_err();
            assert!(matches!(
                err,
                ServiceError::Validation(ref m) if m == "Reviews can only be left for completed requests"
            ));
        }
    }

    #[tokio::test]
    async fn rating_must_be_in_range() {
        let f = fixture().await;
        let id = request_in(&f, HireStatus::Completed).await;

        for rating in [0, 6] {
            let err = f.service.submit_review(f.client, dto(id, rating)).await.unwrap_err();
            assert!(matches!(err, ServiceError::Validation(ref m) if m == "Rating must be between 1 and 5"));
        }
    }

    #[tokio::test]
    async fn only_the_client_reviews() {
        let f = fixture().await;
        let id = request_in(&f, HireStatus::Completed).await;

        let err = f.service.submit_review(f.provider, dto(id, 5)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Authorization));
    }

    #[tokio::test]
    async fn provider_rating_is_recomputed() {
        let f = fixture().await;
        let first = request_in(&f, HireStatus::Completed).await;
        let second = request_in(&f, HireStatus::Completed).await;

        f.service.submit_review(f.client, dto(first, 5)).await.unwrap();
        f.service.submit_review(f.client, dto(second, 4)).await.unwrap();

        let provider = f.users.find_by_id(&f.provider).await.unwrap().unwrap();
        assert_eq!(provider.total_reviews, 2);
        assert!((provider.rating - 4.5).abs() < f64::EPSILON);

        let (page, summary) = f.service.provider_reviews(&f.provider, None, None).await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].service_id, second);
        assert_eq!(summary.total_reviews, 2);
    }

    #[tokio::test]
    async fn provider_without_reviews_has_zero_rating() {
        let f = fixture().await;
        let summary = f.service.provider_rating(&f.provider).await.unwrap();
        assert_eq!(summary.total_reviews, 0);
        assert_eq!(summary.average_rating, 0.0);
    }

    #[tokio::test]
    async fn malformed_service_id_is_rejected() {
        let f = fixture().await;
        let bad = CreateReviewDto { service_id: "abc".to_string(), rating: 5, comment: None };
        let err = f.service.submit_review(f.client, bad).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }
}
