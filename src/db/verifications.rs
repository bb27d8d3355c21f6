use mongodb::bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::{Collection, Database};

use crate::models::{VerificationRequest, VerificationStatus};
use crate::services::ServiceResult;

pub const COLLECTION: &str = "verification_requests";

#[derive(Debug, Clone)]
pub struct Decision {
    pub status: VerificationStatus,
    pub rejection_reason: Option<String>,
    pub reviewed_by: ObjectId,
    pub reviewed_at: DateTime,
}

#[rocket::async_trait]
pub trait VerificationRepository: Send + Sync {
    async fn insert(&self, request: VerificationRequest) -> ServiceResult<VerificationRequest>;

    async fn find_by_id(&self, id: &ObjectId) -> ServiceResult<Option<VerificationRequest>>;

    async fn find_pending_for_user(&self, user_id: &ObjectId) -> ServiceResult<Option<VerificationRequest>>;

    /// Newest first.
    async fn list(
        &self,
        status: Option<VerificationStatus>,
        skip: u64,
        limit: i64,
    ) -> ServiceResult<Vec<VerificationRequest>>;

    async fn count(&self, status: Option<VerificationStatus>) -> ServiceResult<u64>;

    /// Records a decision on a request that is still pending. `None` when it was already decided.
    async fn decide(&self, id: &ObjectId, decision: Decision) -> ServiceResult<Option<VerificationRequest>>;
}

pub struct MongoVerifications {
    collection: Collection<VerificationRequest>,
}

impl MongoVerifications {
    pub fn new(db: &Database) -> Self {
        MongoVerifications {
            collection: db.collection::<VerificationRequest>(COLLECTION),
        }
    }

    fn status_filter(status: Option<VerificationStatus>) -> Document {
        match status {
            Some(status) => doc! { "status": status.as_str() },
            None => doc! {},
        }
    }
}

#[rocket::async_trait]
impl VerificationRepository for MongoVerifications {
    async fn insert(&self, mut request: VerificationRequest) -> ServiceResult<VerificationRequest> {
        let result = self.collection.insert_one(&request, None).await?;
        request.id = result.inserted_id.as_object_id();
        Ok(request)
    }

    async fn find_by_id(&self, id: &ObjectId) -> ServiceResult<Option<VerificationRequest>> {
        Ok(self.collection.find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_pending_for_user(&self, user_id: &ObjectId) -> ServiceResult<Option<VerificationRequest>> {
        Ok(self
            .collection
            .find_one(
                doc! { "user_id": user_id, "status": VerificationStatus::Pending.as_str() },
                None,
            )
            .await?)
    }

    async fn list(
        &self,
        status: Option<VerificationStatus>,
        skip: u64,
        limit: i64,
    ) -> ServiceResult<Vec<VerificationRequest>> {
        let find_options = FindOptions::builder()
            .skip(skip)
            .limit(limit)
            .sort(doc! { "created_at": -1, "_id": -1 })
            .build();

        let mut cursor = self
            .collection
            .find(Self::status_filter(status), find_options)
            .await?;

        let mut requests = Vec::new();
        while cursor.advance().await? {
            requests.push(cursor.deserialize_current()?);
        }
        Ok(requests)
    }

    async fn count(&self, status: Option<VerificationStatus>) -> ServiceResult<u64> {
        Ok(self.collection.count_documents(Self::status_filter(status), None).await?)
    }

    async fn decide(&self, id: &ObjectId, decision: Decision) -> ServiceResult<Option<VerificationRequest>> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        let updated = self
            .collection
            .find_one_and_update(
                doc! { "_id": id, "status": VerificationStatus::Pending.as_str() },
                doc! {
                    "$set": {
                        "status": decision.status.as_str(),
                        "rejection_reason": decision.rejection_reason,
                        "reviewed_by": decision.reviewed_by,
                        "reviewed_at": decision.reviewed_at,
                        "updated_at": decision.reviewed_at
                    }
                },
                options,
            )
            .await?;
        Ok(updated)
    }
}
