use rocket::serde::json::{self, Json};
use rocket::State;
use rocket_okapi::openapi;
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::Serialize;

use crate::guards::AuthGuard;
use crate::models::{CreateReviewDto, ProviderReviewsQuery, RatingSummary, ReviewResponse};
use crate::state::AppState;
use crate::utils::{json_body, parse_object_id, ApiError, ApiResponse, Pagination, Paginated};

#[derive(Serialize, JsonSchema)]
pub struct ProviderReviewsResponse {
    pub reviews: Vec<ReviewResponse>,
    pub summary: RatingSummary,
    pub pagination: Pagination,
}

#[openapi(tag = "Review")]
#[post("/reviews", data = "<dto>")]
pub async fn create_review(
    state: &State<AppState>,
    auth: AuthGuard,
    dto: Result<Json<CreateReviewDto>, json::Error<'_>>,
) -> Result<Json<ApiResponse<ReviewResponse>>, ApiError> {
    let review = state.reviews.submit_review(auth.user_id, json_body(dto)?).await?;

    Ok(Json(ApiResponse::success_with_message(
        "Review submitted successfully",
        review.into(),
    )))
}

#[openapi(tag = "Review")]
#[get("/reviews/provider/<provider_id>?<query..>")]
pub async fn get_provider_reviews(
    state: &State<AppState>,
    provider_id: String,
    query: ProviderReviewsQuery,
) -> Result<Json<ApiResponse<ProviderReviewsResponse>>, ApiError> {
    let provider_id = parse_object_id(&provider_id, "provider")?;

    let (page, summary) = state
        .reviews
        .provider_reviews(&provider_id, query.page, query.limit)
        .await?;
    let page: Paginated<ReviewResponse> = page.map(ReviewResponse::from).into();

    Ok(Json(ApiResponse::success(ProviderReviewsResponse {
        reviews: page.items,
        summary,
        pagination: page.pagination,
    })))
}

#[cfg(test)]
mod tests {
    use mongodb::bson::oid::ObjectId;
    use rocket::http::{ContentType, Status};
    use serde_json::{json, Value};

    use crate::models::UserRole;
    use crate::routes::testing::{bearer, client, seed};

    #[rocket::async_test]
    async fn review_after_completion_updates_summary() {
        let (client, handles) = client().await;
        let customer = seed(&handles, UserRole::Client).await;
        let provider = seed(&handles, UserRole::Provider).await;
        let provider_hex = provider.id.unwrap().to_hex();

        let res = client
            .post("/api/v1/hire-requests")
            .header(ContentType::JSON)
            .header(bearer(&customer))
            .body(
                json!({
                    "provider_id": provider_hex,
                    "title": "Wedding Photoshoot",
                    "message": "Full day coverage",
                    "phone": "+2348031234567",
                    "email": "client@example.com"
                })
                .to_string(),
            )
            .dispatch()
            .await;
        let created: Value = res.into_json().await.unwrap();
        let id = created["data"]["id"].as_str().unwrap().to_string();

        let review = json!({ "service_id": id, "rating": 5, "comment": "Great" }).to_string();

        // Not completed yet.
        let res = client
            .post("/api/v1/reviews")
            .header(ContentType::JSON)
            .header(bearer(&customer))
            .body(review.clone())
            .dispatch()
            .await;
        assert_eq!(res.status(), Status::BadRequest);

        for status in ["hired", "completed"] {
            client
                .patch(format!("/api/v1/hire-requests/{}/status", id))
                .header(ContentType::JSON)
                .header(bearer(&provider))
                .body(json!({ "status": status }).to_string())
                .dispatch()
                .await;
        }

        let res = client
            .post("/api/v1/reviews")
            .header(ContentType::JSON)
            .header(bearer(&customer))
            .body(review)
            .dispatch()
            .await;
        assert_eq!(res.status(), Status::Ok);

        let res = client
            .get(format!("/api/v1/reviews/provider/{}", provider_hex))
            .dispatch()
            .await;
        let listed: Value = res.into_json().await.unwrap();
        assert_eq!(listed["data"]["summary"]["total_reviews"], 1);
        assert_eq!(listed["data"]["summary"]["average_rating"], 5.0);
        assert_eq!(listed["data"]["reviews"][0]["comment"], "Great");
    }

    #[rocket::async_test]
    async fn out_of_range_or_fractional_ratings_are_bad_requests() {
        let (client, handles) = client().await;
        let customer = seed(&handles, UserRole::Client).await;
        let service_id = ObjectId::new().to_hex();

        for (rating, message) in [
            (json!(0), "Rating must be between 1 and 5"),
            (json!(6), "Rating must be between 1 and 5"),
        ] {
            let res = client
                .post("/api/v1/reviews")
                .header(ContentType::JSON)
                .header(bearer(&customer))
                .body(json!({ "service_id": service_id, "rating": rating }).to_string())
                .dispatch()
                .await;
            assert_eq!(res.status(), Status::BadRequest);
            let err: Value = res.into_json().await.unwrap();
            assert_eq!(err["message"], message);
        }

        for body in [
            json!({ "service_id": service_id, "rating": 4.5 }),
            json!({ "service_id": service_id, "rating": "five" }),
            json!({ "service_id": service_id }),
        ] {
            let res = client
                .post("/api/v1/reviews")
                .header(ContentType::JSON)
                .header(bearer(&customer))
                .body(body.to_string())
                .dispatch()
                .await;
            assert_eq!(res.status(), Status::BadRequest);
            let err: Value = res.into_json().await.unwrap();
            assert!(err["message"].as_str().unwrap().starts_with("Invalid request body"));
        }
    }

    #[rocket::async_test]
    async fn unknown_request_is_not_found() {
        let (client, handles) = client().await;
        let customer = seed(&handles, UserRole::Client).await;

        let res = client
            .post("/api/v1/reviews")
            .header(ContentType::JSON)
            .header(bearer(&customer))
            .body(json!({ "service_id": ObjectId::new().to_hex(), "rating": 4 }).to_string())
            .dispatch()
            .await;
        assert_eq!(res.status(), Status::NotFound);
    }
}
