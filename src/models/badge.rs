use std::str::FromStr;

use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::JsonSchema;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum BadgePlan {
    Monthly,
    Quarterly,
    Yearly,
}

impl BadgePlan {
    /// Price in the configured currency's major unit.
    pub fn price(self) -> f64 {
        match self {
            BadgePlan::Monthly => 5_000.0,
            BadgePlan::Quarterly => 13_500.0,
            BadgePlan::Yearly => 48_000.0,
        }
    }

    pub fn duration_days(self) -> i64 {
        match self {
            BadgePlan::Monthly => 30,
            BadgePlan::Quarterly => 90,
            BadgePlan::Yearly => 365,
        }
    }

    /// New subscription end. Time left on an active badge is kept.
    pub fn extend(self, current_end: Option<DateTime>, now: DateTime) -> DateTime {
        let base = match current_end {
            Some(end) if end > now => end,
            _ => now,
        };
        DateTime::from_millis(base.timestamp_millis() + self.duration_days() * DAY_MS)
    }
}

impl FromStr for BadgePlan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "monthly" => Ok(BadgePlan::Monthly),
            "quarterly" => Ok(BadgePlan::Quarterly),
            "yearly" => Ok(BadgePlan::Yearly),
            _ => Err("Invalid plan. Choose 'monthly', 'quarterly' or 'yearly'".to_string()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Successful,
    Failed,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BadgePayment {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub tx_ref: String,
    pub user_id: ObjectId,
    pub plan: BadgePlan,
    pub amount: f64,
    pub currency: String,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    /// Badge end this payment grants, fixed when it settles as successful.
    #[serde(default)]
    pub subscription_end: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct CheckoutCustomer {
    pub email: String,
    pub name: Option<String>,
}

/// Parameters the checkout widget is opened with.
#[derive(Debug, Serialize, JsonSchema)]
pub struct BadgeCheckout {
    pub tx_ref: String,
    pub plan: BadgePlan,
    pub amount: f64,
    pub currency: String,
    pub customer: CheckoutCustomer,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct VerifyBadgePaymentDto {
    pub tx_ref: String,
    pub transaction_id: String,
}
