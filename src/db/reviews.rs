use mongodb::bson::{doc, oid::ObjectId};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::FindOptions;
use mongodb::{Collection, Database};
use rocket::futures::TryStreamExt;

use crate::models::Review;
use crate::services::{ServiceError, ServiceResult};

pub const COLLECTION: &str = "reviews";

#[rocket::async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn insert(&self, review: Review) -> ServiceResult<Review>;

    async fn exists_for_service(&self, service_id: &ObjectId) -> ServiceResult<bool>;

    /// Newest first.
    async fn list_for_provider(&self, provider_id: &ObjectId, skip: u64, limit: i64) -> ServiceResult<Vec<Review>>;

    async fn ratings_for_provider(&self, provider_id: &ObjectId) -> ServiceResult<Vec<i32>>;
}

pub struct MongoReviews {
    collection: Collection<Review>,
}

impl MongoReviews {
    pub fn new(db: &Database) -> Self {
        MongoReviews {
            collection: db.collection::<Review>(COLLECTION),
        }
    }
}

#[rocket::async_trait]
impl ReviewRepository for MongoReviews {
    async fn insert(&self, mut review: Review) -> ServiceResult<Review> {
        let result = self.collection.insert_one(&review, None).await.map_err(|e| {
            // The unique index on service_id catches concurrent duplicates.
            match e.kind.as_ref() {
                ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == 11000 => {
                    ServiceError::Validation("You have already reviewed this request".to_string())
                }
                _ => ServiceError::from(e),
            }
        })?;
        review.id = result.inserted_id.as_object_id();
        Ok(review)
    }

    async fn exists_for_service(&self, service_id: &ObjectId) -> ServiceResult<bool> {
        let count = self
            .collection
            .count_documents(doc! { "service_id": service_id }, None)
            .await?;
        Ok(count > 0)
    }

    async fn list_for_provider(&self, provider_id: &ObjectId, skip: u64, limit: i64) -> ServiceResult<Vec<Review>> {
        let find_options = FindOptions::builder()
            .skip(skip)
            .limit(limit)
            .sort(doc! { "created_at": -1, "_id": -1 })
            .build();

        let reviews = self
            .collection
            .find(doc! { "provider_id": provider_id }, find_options)
            .await?
            .try_collect()
            .await?;
        Ok(reviews)
    }

    async fn ratings_for_provider(&self, provider_id: &ObjectId) -> ServiceResult<Vec<i32>> {
        let reviews: Vec<Review> = self
            .collection
            .find(doc! { "provider_id": provider_id }, None)
            .await?
            .try_collect()
            .await?;
        Ok(reviews.into_iter().map(|review| review.rating).collect())
    }
}
