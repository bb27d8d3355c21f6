use rocket_okapi::okapi::Map;
use serde::{Deserialize, Serialize};
use rocket::http::Status;
use rocket::response::{self, Responder, Response};
use rocket::Request;
use std::io::Cursor;
use rocket_okapi::okapi::schemars::JsonSchema;
use rocket_okapi::response::OpenApiResponderInner;
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::{MediaType, Response as OpenApiResponse, Responses};

use crate::services::ServiceError;

/// -----------------------------
/// Generic API response
/// -----------------------------
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        ApiResponse {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn success_with_message(message: impl Into<String>, data: T) -> Self {
        ApiResponse {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

impl ApiResponse<serde_json::Value> {
    pub fn error(message: String, data: Option<serde_json::Value>) -> Self {
        ApiResponse {
            success: false,
            message: Some(message),
            data,
        }
    }
}

/// One page of a newest-first listing.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub limit: i64,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn pages(&self) -> u64 {
        if self.limit <= 0 {
            return 0;
        }
        self.total.div_ceil(self.limit as u64)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total: self.total,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: u64,
    pub pages: u64,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> From<Page<T>> for Paginated<T> {
    fn from(page: Page<T>) -> Self {
        let pagination = Pagination {
            page: page.page,
            limit: page.limit,
            total: page.total,
            pages: page.pages(),
        };
        Paginated { items: page.items, pagination }
    }
}

/// -----------------------------
/// API Error
/// -----------------------------
#[derive(Debug, Serialize, JsonSchema)]
pub struct ApiError {
    #[schemars(skip)]
    #[serde(skip_serializing)]
    pub status: Status,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ApiError {
    fn new(status: Status, message: impl Into<String>) -> Self {
        ApiError {
            status,
            message: message.into(),
            data: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(Status::BadRequest, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(Status::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(Status::Forbidden, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(Status::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>, data: serde_json::Value) -> Self {
        ApiError {
            status: Status::Conflict,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(Status::BadGateway, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(Status::InternalServerError, message)
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(message) => ApiError::bad_request(message),
            ServiceError::Authorization => ApiError::forbidden(err.to_string()),
            ServiceError::NotFound(_) => ApiError::not_found(err.to_string()),
            ServiceError::InvalidTransition { current, attempted } => ApiError::conflict(
                err.to_string(),
                serde_json::json!({
                    "current_status": current,
                    "attempted_status": attempted,
                }),
            ),
            ServiceError::ExternalService(_) => ApiError::bad_gateway(err.to_string()),
            ServiceError::Database(detail) => {
                error!("Database error: {}", detail);
                ApiError::internal_error("Internal server error")
            }
        }
    }
}

/// -----------------------------
/// Rocket Responder
/// -----------------------------
impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let body = serde_json::to_string(&ApiResponse::error(self.message, self.data))
            .unwrap_or_else(|_| r#"{"success":false,"message":"Internal error"}"#.to_string());

        Response::build()
            .status(self.status)
            .header(rocket::http::ContentType::JSON)
            .sized_body(body.len(), Cursor::new(body))
            .ok()
    }
}

/// -----------------------------
/// OpenAPI integration
/// -----------------------------
impl OpenApiResponderInner for ApiError {
    fn responses(generator: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        let schema = generator.json_schema::<ApiResponse<serde_json::Value>>();

        let mut content = Map::new();
        content.insert(
            "application/json".to_owned(),
            MediaType {
                schema: Some(schema),
                ..Default::default()
            },
        );

        let mut responses = Responses::default();

        for (code, description) in [
            ("400", "Bad request"),
            ("401", "Unauthorized"),
            ("403", "Forbidden"),
            ("404", "Not found"),
            ("409", "Status conflict"),
            ("500", "Internal server error"),
            ("502", "Upstream service error"),
        ] {
            responses.responses.insert(
                code.to_string(),
                rocket_okapi::okapi::openapi3::RefOr::Object(OpenApiResponse {
                    description: description.to_string(),
                    content: content.clone(),
                    ..Default::default()
                }),
            );
        }

        Ok(responses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HireStatus;

    #[test]
    fn maps_taxonomy_to_status_codes() {
        let cases = [
            (ServiceError::Validation("x".into()), Status::BadRequest),
            (ServiceError::Authorization, Status::Forbidden),
            (ServiceError::NotFound("Hire request"), Status::NotFound),
            (ServiceError::ExternalService("down".into()), Status::BadGateway),
            (ServiceError::Database("boom".into()), Status::InternalServerError),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn transition_conflict_carries_both_statuses() {
        let err = ApiError::from(ServiceError::InvalidTransition {
            current: HireStatus::Rejected,
            attempted: HireStatus::Hired,
        });

        assert_eq!(err.status, Status::Conflict);
        let data = err.data.unwrap();
        assert_eq!(data["current_status"], "rejected");
        assert_eq!(data["attempted_status"], "hired");
    }

    #[test]
    fn page_counts_round_up() {
        let page = Page { items: vec![1, 2], page: 1, limit: 2, total: 5 };
        assert_eq!(page.pages(), 3);

        let paginated: Paginated<String> = page.map(|n| n.to_string()).into();
        assert_eq!(paginated.items, vec!["1", "2"]);
        assert_eq!(paginated.pagination.pages, 3);
    }

    #[test]
    fn database_detail_is_not_leaked() {
        let err = ApiError::from(ServiceError::Database("connection refused at 10.0.0.3".into()));
        assert_eq!(err.message, "Internal server error");
    }
}
