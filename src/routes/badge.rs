use log::{info, warn};
use rocket::request::{self, FromRequest, Outcome, Request};
use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::openapi;
use rocket_okapi::request::{OpenApiFromRequest, RequestHeaderInput};
use serde::Deserialize;

use crate::guards::AuthGuard;
use crate::models::{BadgeCheckout, BadgePlan, BadgeStatusResponse, VerifyBadgePaymentDto};
use crate::services::{FlutterwaveGateway, ServiceError};
use crate::state::AppState;
use crate::utils::{ApiError, ApiResponse};

/// Raw `flutterwave-signature` header, checked against the body in the handler.
pub struct WebhookSignature(Option<String>);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for WebhookSignature {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        Outcome::Success(WebhookSignature(
            req.headers().get_one("flutterwave-signature").map(str::to_string),
        ))
    }
}

impl<'a> OpenApiFromRequest<'a> for WebhookSignature {
    fn from_request_input(
        _gen: &mut OpenApiGenerator,
        _name: String,
        _required: bool,
    ) -> rocket_okapi::Result<RequestHeaderInput> {
        Ok(RequestHeaderInput::None)
    }
}

#[derive(Debug, Deserialize)]
struct WebhookEvent {
    event: String,
    data: WebhookCharge,
}

#[derive(Debug, Deserialize)]
struct WebhookCharge {
    id: serde_json::Value,
    tx_ref: String,
}

#[openapi(tag = "Badge")]
#[post("/badge/initiate/<plan>")]
pub async fn initiate_badge_payment(
    state: &State<AppState>,
    auth: AuthGuard,
    plan: String,
) -> Result<Json<ApiResponse<BadgeCheckout>>, ApiError> {
    let plan = plan.parse::<BadgePlan>().map_err(ApiError::bad_request)?;
    let checkout = state.badges.initiate(&auth.user_id, plan).await?;
    Ok(Json(ApiResponse::success(checkout)))
}

#[openapi(tag = "Badge")]
#[post("/badge/verify", data = "<dto>")]
pub async fn verify_badge_payment(
    state: &State<AppState>,
    auth: AuthGuard,
    dto: Json<VerifyBadgePaymentDto>,
) -> Result<Json<ApiResponse<BadgeStatusResponse>>, ApiError> {
    let status = state
        .badges
        .verify(Some(&auth.user_id), dto.tx_ref.trim(), dto.transaction_id.trim())
        .await?;

    Ok(Json(ApiResponse::success_with_message("Badge activated", status)))
}

#[openapi(tag = "Badge")]
#[post("/badge/webhook", data = "<body>")]
pub async fn badge_webhook(
    state: &State<AppState>,
    signature: WebhookSignature,
    body: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let valid = signature
        .0
        .as_deref()
        .is_some_and(|sig| FlutterwaveGateway::verify_webhook_signature(body.as_bytes(), sig));
    if !valid {
        warn!("Rejected Flutterwave webhook with bad signature");
        return Err(ApiError::unauthorized("Invalid webhook signature"));
    }

    let event: WebhookEvent = serde_json::from_str(&body)
        .map_err(|_| ApiError::bad_request("Malformed webhook payload"))?;

    if event.event != "charge.completed" {
        info!("Ignoring Flutterwave event {}", event.event);
        return Ok(Json(ApiResponse::success(serde_json::json!({ "handled": false }))));
    }

    let transaction_id = match &event.data.id {
        serde_json::Value::String(id) => id.clone(),
        other => other.to_string(),
    };

    match state.badges.verify(None, &event.data.tx_ref, &transaction_id).await {
        Ok(_) => {}
        // Retrying cannot fix these, so the gateway should stop redelivering.
        Err(e @ (ServiceError::Validation(_) | ServiceError::NotFound(_))) => {
            warn!("Webhook for {} not applied: {}", event.data.tx_ref, e);
        }
        Err(e) => return Err(e.into()),
    }

    Ok(Json(ApiResponse::success(serde_json::json!({ "handled": true }))))
}

#[openapi(tag = "Badge")]
#[get("/badge/status")]
pub async fn get_badge_status(
    state: &State<AppState>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<BadgeStatusResponse>>, ApiError> {
    let status = state.badges.status(&auth.user_id).await?;
    Ok(Json(ApiResponse::success(status)))
}
