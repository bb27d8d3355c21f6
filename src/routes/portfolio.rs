use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

use crate::guards::AuthGuard;
use crate::models::PortfolioImageDto;
use crate::state::AppState;
use crate::utils::{ApiError, ApiResponse};

#[openapi(tag = "Portfolio")]
#[post("/portfolio/images", data = "<dto>")]
pub async fn add_portfolio_image(
    state: &State<AppState>,
    auth: AuthGuard,
    dto: Json<PortfolioImageDto>,
) -> Result<Json<ApiResponse<Vec<String>>>, ApiError> {
    let images = state.profiles.add_portfolio_image(&auth.user_id, &dto.url).await?;
    Ok(Json(ApiResponse::success_with_message("Image added to portfolio", images)))
}

#[openapi(tag = "Portfolio")]
#[delete("/portfolio/images", data = "<dto>")]
pub async fn remove_portfolio_image(
    state: &State<AppState>,
    auth: AuthGuard,
    dto: Json<PortfolioImageDto>,
) -> Result<Json<ApiResponse<Vec<String>>>, ApiError> {
    let images = state.profiles.remove_portfolio_image(&auth.user_id, &dto.url).await?;
    Ok(Json(ApiResponse::success(images)))
}

#[cfg(test)]
mod tests {
    use rocket::http::{ContentType, Status};
    use serde_json::{json, Value};

    use crate::models::UserRole;
    use crate::routes::testing::{bearer, client, seed};

    #[rocket::async_test]
    async fn free_account_hits_limit_then_frees_a_slot() {
        let (client, handles) = client().await;
        let provider = seed(&handles, UserRole::Provider).await;

        for n in 0..3 {
            let res = client
                .post("/api/v1/portfolio/images")
                .header(ContentType::JSON)
                .header(bearer(&provider))
                .body(json!({ "url": format!("/uploads/attachments/{}.jpg", n) }).to_string())
                .dispatch()
                .await;
            assert_eq!(res.status(), Status::Ok);
        }

        let res = client
            .post("/api/v1/portfolio/images")
            .header(ContentType::JSON)
            .header(bearer(&provider))
            .body(json!({ "url": "/uploads/attachments/extra.jpg" }).to_string())
            .dispatch()
            .await;
        assert_eq!(res.status(), Status::BadRequest);

        let res = client
            .delete("/api/v1/portfolio/images")
            .header(ContentType::JSON)
            .header(bearer(&provider))
            .body(json!({ "url": "/uploads/attachments/0.jpg" }).to_string())
            .dispatch()
            .await;
        assert_eq!(res.status(), Status::Ok);
        let images: Value = res.into_json().await.unwrap();
        assert_eq!(images["data"].as_array().unwrap().len(), 2);
    }
}
