use mongodb::bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::{Collection, Database};

use crate::models::{HireRequest, HireRole, HireStatus};
use crate::services::ServiceResult;

pub const COLLECTION: &str = "hire_requests";

/// Which side of the request the caller is on, plus an optional status filter.
#[derive(Debug, Clone)]
pub struct HireRequestFilter {
    pub role: HireRole,
    pub user_id: ObjectId,
    pub status: Option<HireStatus>,
}

impl HireRequestFilter {
    pub fn to_document(&self) -> Document {
        let mut filter = match self.role {
            HireRole::Client => doc! { "client_id": self.user_id },
            HireRole::Provider => doc! { "provider_id": self.user_id },
        };
        if let Some(status) = self.status {
            filter.insert("status", status);
        }
        filter
    }

    pub fn matches(&self, request: &HireRequest) -> bool {
        let owner = match self.role {
            HireRole::Client => request.client_id,
            HireRole::Provider => request.provider_id,
        };
        owner == self.user_id && self.status.is_none_or(|status| status == request.status)
    }
}

#[rocket::async_trait]
pub trait HireRequestRepository: Send + Sync {
    /// Persists a new request and returns it with its id set.
    async fn insert(&self, request: HireRequest) -> ServiceResult<HireRequest>;

    async fn find_by_id(&self, id: &ObjectId) -> ServiceResult<Option<HireRequest>>;

    /// Writes `next` only while the stored status is still `expected`.
    /// `None` means no document matched: it is gone or another writer moved it first.
    async fn update_status(
        &self,
        id: &ObjectId,
        expected: HireStatus,
        next: HireStatus,
        at: DateTime,
    ) -> ServiceResult<Option<HireRequest>>;

    /// Newest first.
    async fn list(&self, filter: &HireRequestFilter, skip: u64, limit: i64) -> ServiceResult<Vec<HireRequest>>;

    async fn count(&self, filter: &HireRequestFilter) -> ServiceResult<u64>;

    /// Distinct providers the client has at least one hired or completed request with.
    async fn hired_provider_ids(&self, client_id: &ObjectId) -> ServiceResult<Vec<ObjectId>>;
}

pub struct MongoHireRequests {
    collection: Collection<HireRequest>,
}

impl MongoHireRequests {
    pub fn new(db: &Database) -> Self {
        MongoHireRequests {
            collection: db.collection::<HireRequest>(COLLECTION),
        }
    }
}

#[rocket::async_trait]
impl HireRequestRepository for MongoHireRequests {
    async fn insert(&self, mut request: HireRequest) -> ServiceResult<HireRequest> {
        let result = self.collection.insert_one(&request, None).await?;
        request.id = result.inserted_id.as_object_id();
        Ok(request)
    }

    async fn find_by_id(&self, id: &ObjectId) -> ServiceResult<Option<HireRequest>> {
        Ok(self.collection.find_one(doc! { "_id": id }, None).await?)
    }

    async fn update_status(
        &self,
        id: &ObjectId,
        expected: HireStatus,
        next: HireStatus,
        at: DateTime,
    ) -> ServiceResult<Option<HireRequest>> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        let updated = self
            .collection
            .find_one_and_update(
                doc! { "_id": id, "status": expected },
                doc! { "$set": { "status": next, "updated_at": at } },
                options,
            )
            .await?;

        Ok(updated)
    }

    async fn list(&self, filter: &HireRequestFilter, skip: u64, limit: i64) -> ServiceResult<Vec<HireRequest>> {
        let find_options = FindOptions::builder()
            .skip(skip)
            .limit(limit)
            .sort(doc! { "created_at": -1, "_id": -1 })
            .build();

        let mut cursor = self.collection.find(filter.to_document(), find_options).await?;

        let mut requests = Vec::new();
        while cursor.advance().await? {
            requests.push(cursor.deserialize_current()?);
        }
        Ok(requests)
    }

    async fn count(&self, filter: &HireRequestFilter) -> ServiceResult<u64> {
        Ok(self.collection.count_documents(filter.to_document(), None).await?)
    }

    async fn hired_provider_ids(&self, client_id: &ObjectId) -> ServiceResult<Vec<ObjectId>> {
        let hired: Vec<HireStatus> = HireStatus::ALL
            .into_iter()
            .filter(|status| status.counts_as_hired())
            .collect();

        let values = self
            .collection
            .distinct(
                "provider_id",
                doc! { "client_id": client_id, "status": { "$in": hired } },
                None,
            )
            .await?;

        Ok(values.into_iter().filter_map(|value| value.as_object_id()).collect())
    }
}
