use std::borrow::Cow;

use mongodb::bson::oid::ObjectId;
use mongodb::bson::DateTime;
use regex::Regex;
use rocket::serde::json::{self, Json};
use validator::{ValidationError, ValidationErrors};

use crate::services::ServiceError;

/// Digits with an optional leading `+`; spaces, dashes, dots and parentheses are ignored.
pub fn validate_phone(phone: &str) -> bool {
    let compact: String = phone
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect();
    Regex::new(r"^\+?[0-9]{7,15}$")
        .map(|re| re.is_match(&compact))
        .unwrap_or(false)
}

pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

pub fn valid_phone(value: &str) -> Result<(), ValidationError> {
    not_blank(value)?;
    if !validate_phone(value) {
        let mut error = ValidationError::new("phone");
        error.message = Some(Cow::from("A valid phone number is required"));
        return Err(error);
    }
    Ok(())
}

/// Flattens `validator` output into the single message shown to the user.
pub fn first_validation_message(errors: &ValidationErrors) -> String {
    let field_errors = errors.field_errors();
    let mut fields: Vec<_> = field_errors.iter().collect();
    fields.sort_by_key(|(field, _)| **field);

    fields
        .into_iter()
        .find_map(|(field, errors)| {
            errors.first().map(|error| match (&error.message, error.code.as_ref()) {
                (Some(message), _) => message.to_string(),
                (None, "blank") => format!("{} is required", field),
                (None, "email") => format!("{} must be a valid email address", field),
                (None, _) => format!("{} is invalid", field),
            })
        })
        .unwrap_or_else(|| "Invalid request".to_string())
}

pub fn validation_error(errors: ValidationErrors) -> ServiceError {
    ServiceError::Validation(first_validation_message(&errors))
}

/// Unwraps a JSON body, reporting malformed or mistyped bodies as validation
/// failures instead of falling through to the 422 catcher.
pub fn json_body<T>(body: Result<Json<T>, json::Error<'_>>) -> Result<T, ServiceError> {
    match body {
        Ok(body) => Ok(body.into_inner()),
        Err(json::Error::Parse(_, e)) => Err(ServiceError::Validation(format!("Invalid request body: {}", e))),
        Err(json::Error::Io(e)) => Err(ServiceError::Validation(format!("Could not read request body: {}", e))),
    }
}

pub fn parse_object_id(raw: &str, what: &str) -> Result<ObjectId, ServiceError> {
    ObjectId::parse_str(raw.trim()).map_err(|_| ServiceError::Validation(format!("Invalid {} ID", what)))
}

/// Parses a `YYYY-MM-DD` calendar date into midnight UTC.
pub fn parse_date(raw: &str) -> Result<DateTime, ServiceError> {
    let date = chrono::NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ServiceError::Validation("Invalid date format. Use YYYY-MM-DD".to_string()))?;

    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| ServiceError::Validation("Invalid date".to_string()))?;

    Ok(DateTime::from_millis(midnight.and_utc().timestamp_millis()))
}

const MAX_PAGE: i64 = 1_000_000;

/// Normalised `(page, limit, skip)`: page starts at 1 and is capped at
/// `MAX_PAGE`, limit defaults to 20 and is capped at 100.
pub fn page_window(page: Option<i64>, limit: Option<i64>) -> (i64, i64, u64) {
    let page = page.unwrap_or(1).clamp(1, MAX_PAGE);
    let limit = limit.unwrap_or(20).clamp(1, 100);
    let skip = (page - 1).saturating_mul(limit).max(0) as u64;
    (page, limit, skip)
}
