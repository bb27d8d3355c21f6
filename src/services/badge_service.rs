use std::sync::Arc;

use log::{info, warn};
use mongodb::bson::{oid::ObjectId, DateTime};

use crate::db::{BadgePaymentRepository, UserRepository};
use crate::models::{
    BadgeCheckout, BadgePayment, BadgePlan, BadgeStatusResponse, CheckoutCustomer, PaymentStatus, User,
};
use crate::services::flutterwave::{GatewayTransaction, PaymentGateway};
use crate::services::{ServiceError, ServiceResult};

/// Paid badge subscriptions: checkout, gateway verification and activation.
#[derive(Clone)]
pub struct BadgeService {
    payments: Arc<dyn BadgePaymentRepository>,
    users: Arc<dyn UserRepository>,
    gateway: Arc<dyn PaymentGateway>,
    currency: String,
}

impl BadgeService {
    pub fn new(
        payments: Arc<dyn BadgePaymentRepository>,
        users: Arc<dyn UserRepository>,
        gateway: Arc<dyn PaymentGateway>,
        currency: String,
    ) -> Self {
        Self { payments, users, gateway, currency }
    }

    async fn user(&self, id: &ObjectId) -> ServiceResult<User> {
        self.users.find_by_id(id).await?.ok_or(ServiceError::NotFound("User"))
    }

    pub async fn initiate(&self, user_id: &ObjectId, plan: BadgePlan) -> ServiceResult<BadgeCheckout> {
        let user = self.user(user_id).await?;

        let now = DateTime::now();
        let payment = BadgePayment {
            id: None,
            tx_ref: format!("wifmart-badge-{}", uuid::Uuid::new_v4().simple()),
            user_id: *user_id,
            plan,
            amount: plan.price(),
            currency: self.currency.clone(),
            status: PaymentStatus::Pending,
            transaction_id: None,
            subscription_end: None,
            created_at: now,
            updated_at: now,
        };
        let payment = self.payments.insert(payment).await?;
        info!("Badge checkout {} opened for {} ({:?})", payment.tx_ref, user_id, plan);

        Ok(BadgeCheckout {
            tx_ref: payment.tx_ref,
            plan,
            amount: payment.amount,
            currency: payment.currency,
            customer: CheckoutCustomer {
                email: user.email,
                name: user.name,
            },
        })
    }

    fn confirms(payment: &BadgePayment, transaction: &GatewayTransaction) -> bool {
        transaction.tx_ref == payment.tx_ref
            && transaction.amount >= payment.amount
            && transaction.currency.eq_ignore_ascii_case(&payment.currency)
    }

    /// Confirms a payment with the gateway and activates or extends the
    /// badge. `caller` is `None` for gateway webhooks. Re-verifying a settled
    /// payment never extends the badge twice.
    pub async fn verify(
        &self,
        caller: Option<&ObjectId>,
        tx_ref: &str,
        transaction_id: &str,
    ) -> ServiceResult<BadgeStatusResponse> {
        let payment = self
            .payments
            .find_by_tx_ref(tx_ref)
            .await?
            .ok_or(ServiceError::NotFound("Payment"))?;

        if caller.is_some_and(|caller| *caller != payment.user_id) {
            return Err(ServiceError::Authorization);
        }

        match payment.status {
            PaymentStatus::Successful => return self.apply(&payment).await,
            PaymentStatus::Failed => {
                return Err(ServiceError::Validation("This payment has already failed".to_string()))
            }
            PaymentStatus::Pending => {}
        }

        let transaction = self.gateway.verify_transaction(transaction_id).await?;

        if transaction.status.eq_ignore_ascii_case("pending") {
            return Err(ServiceError::Validation("Payment is not complete yet".to_string()));
        }

        if !transaction.status.eq_ignore_ascii_case("successful") || !Self::confirms(&payment, &transaction) {
            warn!(
                "Badge payment {} rejected: gateway reported {:?}",
                payment.tx_ref, transaction
            );
            self.payments
                .settle(tx_ref, PaymentStatus::Failed, transaction_id, None)
                .await?;
            return Err(ServiceError::Validation("Payment verification failed".to_string()));
        }

        let user = self.user(&payment.user_id).await?;
        let subscription_end = payment.plan.extend(user.subscription_end, DateTime::now());

        let settled = match self
            .payments
            .settle(tx_ref, PaymentStatus::Successful, transaction_id, Some(subscription_end))
            .await?
        {
            Some(settled) => settled,
            // Settled concurrently, most likely by the webhook.
            None => self
                .payments
                .find_by_tx_ref(tx_ref)
                .await?
                .ok_or(ServiceError::NotFound("Payment"))?,
        };

        match settled.status {
            PaymentStatus::Successful => self.apply(&settled).await,
            _ => Err(ServiceError::Validation("Payment verification failed".to_string())),
        }
    }

    /// Writes the badge end recorded on a successful payment unless the user
    /// already holds it. Safe to repeat, so a failed write is repaired on the
    /// next verification of the same payment.
    async fn apply(&self, payment: &BadgePayment) -> ServiceResult<BadgeStatusResponse> {
        let user = self.user(&payment.user_id).await?;
        let Some(end) = payment.subscription_end else {
            return Ok(BadgeStatusResponse::for_user(&user, DateTime::now()));
        };

        if user.has_badge && user.subscription_end.is_some_and(|current| current >= end) {
            return Ok(BadgeStatusResponse::for_user(&user, DateTime::now()));
        }

        self.users.activate_badge(&payment.user_id, end).await?;
        info!(
            "Badge activated for {} until {}",
            payment.user_id,
            end.try_to_rfc3339_string().unwrap_or_default()
        );

        self.status(&payment.user_id).await
    }

    pub async fn status(&self, user_id: &ObjectId) -> ServiceResult<BadgeStatusResponse> {
        let user = self.user(user_id).await?;
        Ok(BadgeStatusResponse::for_user(&user, DateTime::now()))
    }
}
