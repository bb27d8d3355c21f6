use mongodb::bson::{doc, oid::ObjectId, DateTime};
use mongodb::{Collection, Database};
use rocket::futures::TryStreamExt;

use crate::models::{RatingSummary, User};
use crate::services::ServiceResult;

pub const COLLECTION: &str = "users";

/// Read access to accounts owned by the auth service, plus the few
/// fields this server maintains on them.
#[rocket::async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &ObjectId) -> ServiceResult<Option<User>>;

    async fn find_many(&self, ids: &[ObjectId]) -> ServiceResult<Vec<User>>;

    async fn update_rating(&self, id: &ObjectId, summary: RatingSummary) -> ServiceResult<()>;

    async fn activate_badge(&self, id: &ObjectId, subscription_end: DateTime) -> ServiceResult<()>;

    async fn set_verified(&self, id: &ObjectId, verified: bool) -> ServiceResult<()>;

    /// Appends only while the portfolio holds fewer than `limit` images.
    /// Returns false when the user is missing or the portfolio is full.
    async fn push_portfolio_image(&self, id: &ObjectId, url: &str, limit: usize) -> ServiceResult<bool>;

    async fn pull_portfolio_image(&self, id: &ObjectId, url: &str) -> ServiceResult<bool>;
}

pub struct MongoUsers {
    collection: Collection<User>,
}

impl MongoUsers {
    pub fn new(db: &Database) -> Self {
        MongoUsers {
            collection: db.collection::<User>(COLLECTION),
        }
    }
}

#[rocket::async_trait]
impl UserRepository for MongoUsers {
    async fn find_by_id(&self, id: &ObjectId) -> ServiceResult<Option<User>> {
        Ok(self.collection.find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_many(&self, ids: &[ObjectId]) -> ServiceResult<Vec<User>> {
        let users = self
            .collection
            .find(doc! { "_id": { "$in": ids.to_vec() } }, None)
            .await?
            .try_collect()
            .await?;
        Ok(users)
    }

    async fn update_rating(&self, id: &ObjectId, summary: RatingSummary) -> ServiceResult<()> {
        self.collection
            .update_one(
                doc! { "_id": id },
                doc! {
                    "$set": {
                        "rating": summary.average_rating,
                        "total_reviews": summary.total_reviews,
                        "updated_at": DateTime::now()
                    }
                },
                None,
            )
            .await?;
        Ok(())
    }

    async fn activate_badge(&self, id: &ObjectId, subscription_end: DateTime) -> ServiceResult<()> {
        self.collection
            .update_one(
                doc! { "_id": id },
                doc! {
                    "$set": {
                        "has_badge": true,
                        "subscription_end": subscription_end,
                        "updated_at": DateTime::now()
                    }
                },
                None,
            )
            .await?;
        Ok(())
    }

    async fn set_verified(&self, id: &ObjectId, verified: bool) -> ServiceResult<()> {
        self.collection
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "is_verified": verified, "updated_at": DateTime::now() } },
                None,
            )
            .await?;
        Ok(())
    }

    async fn push_portfolio_image(&self, id: &ObjectId, url: &str, limit: usize) -> ServiceResult<bool> {
        if limit == 0 {
            return Ok(false);
        }

        // `portfolio_images.<limit-1>` exists exactly when the array is already full.
        let mut filter = doc! { "_id": id };
        filter.insert(format!("portfolio_images.{}", limit - 1), doc! { "$exists": false });

        let result = self
            .collection
            .update_one(
                filter,
                doc! {
                    "$push": { "portfolio_images": url },
                    "$set": { "updated_at": DateTime::now() }
                },
                None,
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn pull_portfolio_image(&self, id: &ObjectId, url: &str) -> ServiceResult<bool> {
        let result = self
            .collection
            .update_one(
                doc! { "_id": id },
                doc! {
                    "$pull": { "portfolio_images": url },
                    "$set": { "updated_at": DateTime::now() }
                },
                None,
            )
            .await?;
        Ok(result.modified_count > 0)
    }
}
