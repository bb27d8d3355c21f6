use rocket::serde::json::{self, Json};
use rocket::State;
use rocket_okapi::openapi;

use crate::guards::AuthGuard;
use crate::models::{
    CreateHireRequestDto, HireListQuery, HireRequestResponse, HireRole, HireStatus, HiredProviderResponse,
    UpdateHireStatusDto,
};
use crate::services::ServiceError;
use crate::state::AppState;
use crate::utils::{json_body, parse_object_id, ApiError, ApiResponse, Paginated};

fn parse_status(raw: &str) -> Result<HireStatus, ServiceError> {
    raw.parse::<HireStatus>().map_err(ServiceError::Validation)
}

#[openapi(tag = "Hire Requests")]
#[post("/hire-requests", data = "<dto>")]
pub async fn create_hire_request(
    state: &State<AppState>,
    auth: AuthGuard,
    dto: Result<Json<CreateHireRequestDto>, json::Error<'_>>,
) -> Result<Json<ApiResponse<HireRequestResponse>>, ApiError> {
    let dto = json_body(dto)?;
    let provider_id = parse_object_id(&dto.provider_id, "provider")?;

    let request = state
        .hire_requests
        .create_request(auth.user_id, provider_id, dto.details)
        .await?;

    Ok(Json(ApiResponse::success_with_message(
        "Hire request sent",
        request.into(),
    )))
}

#[openapi(tag = "Hire Requests")]
#[get("/hire-requests?<query..>")]
pub async fn list_hire_requests(
    state: &State<AppState>,
    auth: AuthGuard,
    query: HireListQuery,
) -> Result<Json<ApiResponse<Paginated<HireRequestResponse>>>, ApiError> {
    let role = match query.role.as_deref() {
        Some(raw) => raw.parse::<HireRole>().map_err(ServiceError::Validation)?,
        None => HireRole::Client,
    };
    let status = query.status.as_deref().map(parse_status).transpose()?;

    let page = match role {
        HireRole::Provider => {
            state
                .hire_requests
                .list_for_provider(auth.user_id, status, query.page, query.limit)
                .await?
        }
        HireRole::Client => {
            state
                .hire_requests
                .list_for_client(auth.user_id, status, query.page, query.limit)
                .await?
        }
    };

    Ok(Json(ApiResponse::success(page.map(HireRequestResponse::from).into())))
}

#[openapi(tag = "Hire Requests")]
#[get("/hire-requests/hired-providers")]
pub async fn get_hired_providers(
    state: &State<AppState>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<Vec<HiredProviderResponse>>>, ApiError> {
    let providers = state.hire_requests.hired_providers(&auth.user_id).await?;
    Ok(Json(ApiResponse::success(providers)))
}

#[openapi(tag = "Hire Requests")]
#[get("/hire-requests/<id>")]
pub async fn get_hire_request(
    state: &State<AppState>,
    auth: AuthGuard,
    id: String,
) -> Result<Json<ApiResponse<HireRequestResponse>>, ApiError> {
    let id = parse_object_id(&id, "hire request")?;
    let request = state.hire_requests.get_request(&id, &auth.user_id).await?;
    Ok(Json(ApiResponse::success(request.into())))
}

#[openapi(tag = "Hire Requests")]
#[patch("/hire-requests/<id>/status", data = "<dto>")]
pub async fn update_hire_status(
    state: &State<AppState>,
    auth: AuthGuard,
    id: String,
    dto: Json<UpdateHireStatusDto>,
) -> Result<Json<ApiResponse<HireRequestResponse>>, ApiError> {
    let id = parse_object_id(&id, "hire request")?;
    let next = parse_status(&dto.status)?;

    let request = state.hire_requests.update_status(&id, &auth.user_id, next).await?;

    Ok(Json(ApiResponse::success_with_message(
        format!("Request marked as {}", next),
        request.into(),
    )))
}
