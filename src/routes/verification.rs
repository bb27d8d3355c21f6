use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

use crate::guards::{AdminGuard, BadgeGuard};
use crate::models::{
    DecideVerificationDto, SubmitVerificationDto, VerificationListQuery, VerificationResponse, VerificationStatus,
};
use crate::state::AppState;
use crate::utils::{parse_object_id, ApiError, ApiResponse, Paginated};

fn parse_status(raw: &str) -> Result<VerificationStatus, ApiError> {
    match raw.trim().to_lowercase().as_str() {
        "pending" => Ok(VerificationStatus::Pending),
        "approved" => Ok(VerificationStatus::Approved),
        "rejected" => Ok(VerificationStatus::Rejected),
        other => Err(ApiError::bad_request(format!("Invalid status '{}'", other))),
    }
}

#[openapi(tag = "Verification")]
#[post("/verification/request", data = "<dto>")]
pub async fn request_verification(
    state: &State<AppState>,
    badge: BadgeGuard,
    dto: Json<SubmitVerificationDto>,
) -> Result<Json<ApiResponse<VerificationResponse>>, ApiError> {
    let request = state
        .verifications
        .submit(badge.auth.user_id, dto.into_inner())
        .await?;

    Ok(Json(ApiResponse::success_with_message(
        "Verification request submitted",
        request.into(),
    )))
}

#[openapi(tag = "Admin")]
#[get("/admin/verifications?<query..>")]
pub async fn list_verifications(
    state: &State<AppState>,
    _admin: AdminGuard,
    query: VerificationListQuery,
) -> Result<Json<ApiResponse<Paginated<VerificationResponse>>>, ApiError> {
    let status = query.status.as_deref().map(parse_status).transpose()?;
    let page = state.verifications.list(status, query.page, query.limit).await?;
    Ok(Json(ApiResponse::success(page.map(VerificationResponse::from).into())))
}

#[openapi(tag = "Admin")]
#[put("/admin/verifications/<id>", data = "<dto>")]
pub async fn decide_verification(
    state: &State<AppState>,
    admin: AdminGuard,
    id: String,
    dto: Json<DecideVerificationDto>,
) -> Result<Json<ApiResponse<VerificationResponse>>, ApiError> {
    let id = parse_object_id(&id, "verification")?;
    let dto = dto.into_inner();

    let decided = state
        .verifications
        .decide(&id, admin.auth.user_id, dto.approve, dto.rejection_reason)
        .await?;

    Ok(Json(ApiResponse::success(decided.into())))
}
