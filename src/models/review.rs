use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::JsonSchema;
use validator::Validate;

/// A client's rating of a finished engagement. `client_id` and `provider_id`
/// are copied from the hire request when the review is written.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Review {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub service_id: ObjectId,
    pub client_id: ObjectId,
    pub provider_id: ObjectId,
    pub rating: i32, // 1-5
    #[serde(default)]
    pub comment: String,
    pub created_at: DateTime,
}

#[derive(Debug, Deserialize, JsonSchema, Validate)]
pub struct CreateReviewDto {
    pub service_id: String,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ReviewResponse {
    pub id: String,
    pub service_id: String,
    pub client_id: String,
    pub provider_id: String,
    pub rating: i32,
    pub comment: String,
    pub created_at: String,
}

impl From<Review> for ReviewResponse {
    fn from(review: Review) -> Self {
        ReviewResponse {
            id: review.id.map(|id| id.to_hex()).unwrap_or_default(),
            service_id: review.service_id.to_hex(),
            client_id: review.client_id.to_hex(),
            provider_id: review.provider_id.to_hex(),
            rating: review.rating,
            comment: review.comment,
            created_at: review.created_at.try_to_rfc3339_string().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, JsonSchema)]
pub struct RatingSummary {
    pub average_rating: f64,
    pub total_reviews: i32,
}

impl RatingSummary {
    pub fn from_ratings(ratings: &[i32]) -> Self {
        let total_reviews = ratings.len() as i32;
        let average_rating = if total_reviews > 0 {
            ratings.iter().sum::<i32>() as f64 / total_reviews as f64
        } else {
            0.0
        };

        RatingSummary { average_rating, total_reviews }
    }
}

#[derive(FromForm, Deserialize, JsonSchema)]
pub struct ProviderReviewsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
