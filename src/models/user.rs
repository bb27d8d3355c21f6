use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars;
use rocket_okapi::okapi::schemars::JsonSchema;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Client,
    Provider,
    Admin,
}

pub const PORTFOLIO_LIMIT_FREE: usize = 3;
pub const PORTFOLIO_LIMIT_BADGE: usize = 10;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub role: UserRole,
    pub profile_photo: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub portfolio_images: Vec<String>,
    #[serde(default)]
    pub has_badge: bool,
    pub subscription_end: Option<DateTime>,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub total_reviews: i32,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl User {
    /// Badge state is derived here and nowhere else.
    pub fn is_badge_active(&self, now: DateTime) -> bool {
        self.has_badge && self.subscription_end.is_some_and(|end| end > now)
    }

    pub fn portfolio_limit(&self, now: DateTime) -> usize {
        if self.is_badge_active(now) {
            PORTFOLIO_LIMIT_BADGE
        } else {
            PORTFOLIO_LIMIT_FREE
        }
    }
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct BadgeStatusResponse {
    pub has_badge: bool,
    pub badge_active: bool,
    pub subscription_end: Option<String>,
    pub is_verified: bool,
}

impl BadgeStatusResponse {
    pub fn for_user(user: &User, now: DateTime) -> Self {
        BadgeStatusResponse {
            has_badge: user.has_badge,
            badge_active: user.is_badge_active(now),
            subscription_end: user.subscription_end.and_then(|end| end.try_to_rfc3339_string().ok()),
            is_verified: user.is_verified,
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PortfolioImageDto {
    pub url: String,
}

#[cfg(test)]
pub fn test_user(role: UserRole) -> User {
    User {
        id: Some(ObjectId::new()),
        email: format!("{}@example.com", ObjectId::new().to_hex()),
        name: Some("Test User".to_string()),
        phone: None,
        role,
        profile_photo: None,
        skills: Vec::new(),
        location: None,
        portfolio_images: Vec::new(),
        has_badge: false,
        subscription_end: None,
        is_verified: false,
        rating: 0.0,
        total_reviews: 0,
        created_at: DateTime::now(),
        updated_at: DateTime::now(),
    }
}
