use mongodb::bson::{doc, DateTime};
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};
use mongodb::{Collection, Database};

use crate::models::{BadgePayment, PaymentStatus};
use crate::services::ServiceResult;

pub const COLLECTION: &str = "badge_payments";

fn status_str(status: PaymentStatus) -> &'static str {
    match status {
        PaymentStatus::Pending => "pending",
        PaymentStatus::Successful => "successful",
        PaymentStatus::Failed => "failed",
    }
}

#[rocket::async_trait]
pub trait BadgePaymentRepository: Send + Sync {
    async fn insert(&self, payment: BadgePayment) -> ServiceResult<BadgePayment>;

    async fn find_by_tx_ref(&self, tx_ref: &str) -> ServiceResult<Option<BadgePayment>>;

    /// Settles a payment that is still pending, recording the badge end it
    /// grants. `None` when it was already settled.
    async fn settle(
        &self,
        tx_ref: &str,
        status: PaymentStatus,
        transaction_id: &str,
        subscription_end: Option<DateTime>,
    ) -> ServiceResult<Option<BadgePayment>>;
}

pub struct MongoBadgePayments {
    collection: Collection<BadgePayment>,
}

impl MongoBadgePayments {
    pub fn new(db: &Database) -> Self {
        MongoBadgePayments {
            collection: db.collection::<BadgePayment>(COLLECTION),
        }
    }
}

#[rocket::async_trait]
impl BadgePaymentRepository for MongoBadgePayments {
    async fn insert(&self, mut payment: BadgePayment) -> ServiceResult<BadgePayment> {
        let result = self.collection.insert_one(&payment, None).await?;
        payment.id = result.inserted_id.as_object_id();
        Ok(payment)
    }

    async fn find_by_tx_ref(&self, tx_ref: &str) -> ServiceResult<Option<BadgePayment>> {
        Ok(self.collection.find_one(doc! { "tx_ref": tx_ref }, None).await?)
    }

    async fn settle(
        &self,
        tx_ref: &str,
        status: PaymentStatus,
        transaction_id: &str,
        subscription_end: Option<DateTime>,
    ) -> ServiceResult<Option<BadgePayment>> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        let settled = self
            .collection
            .find_one_and_update(
                doc! { "tx_ref": tx_ref, "status": status_str(PaymentStatus::Pending) },
                doc! {
                    "$set": {
                        "status": status_str(status),
                        "transaction_id": transaction_id,
                        "subscription_end": subscription_end,
                        "updated_at": DateTime::now()
                    }
                },
                options,
            )
            .await?;
        Ok(settled)
    }
}
