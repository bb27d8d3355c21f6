use data_encoding::BASE64;
use log::{error, info};
use rocket::fs::TempFile;
use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::openapi;
use rocket_okapi::okapi::schemars;
use rocket_okapi::okapi::schemars::JsonSchema;
use std::path::Path;
use tokio::fs;
use uuid::Uuid;

use crate::guards::AuthGuard;
use crate::utils::{ApiError, ApiResponse};

pub const UPLOAD_DIR: &str = "uploads/attachments";
const MAX_ATTACHMENT_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct Base64UploadRequest {
    pub filename: String,
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct UploadedFile {
    pub url: String,
    pub filename: String,
    pub size: u64,
}

fn extension_from_filename(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

fn extension_from_mime(mime_type: &str) -> Option<&'static str> {
    match mime_type.trim().to_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "application/pdf" => Some("pdf"),
        _ => None,
    }
}

fn is_allowed_extension(ext: &str) -> bool {
    matches!(ext, "jpg" | "jpeg" | "png" | "webp" | "pdf")
}

/// Extension for a stored attachment: the file name wins, then the content type.
fn attachment_extension(name: Option<&str>, content_type: Option<&str>) -> Result<String, ApiError> {
    let extension = name
        .and_then(extension_from_filename)
        .or_else(|| content_type.and_then(extension_from_mime).map(str::to_string))
        .ok_or_else(|| ApiError::bad_request("Cannot determine file type from file name or content type"))?;

    if !is_allowed_extension(&extension) {
        return Err(ApiError::bad_request(format!(
            "Only JPEG, PNG, WebP and PDF files are allowed. Received: '{}'",
            extension
        )));
    }
    Ok(extension)
}

async fn storage_path(extension: &str) -> Result<(String, String), ApiError> {
    fs::create_dir_all(UPLOAD_DIR).await.map_err(|e| {
        error!("Failed to create {}: {}", UPLOAD_DIR, e);
        ApiError::internal_error("Failed to store file")
    })?;

    let filename = format!("{}_{}.{}", Uuid::new_v4(), chrono::Utc::now().timestamp(), extension);
    let filepath = format!("{}/{}", UPLOAD_DIR, filename);
    Ok((filename, filepath))
}

#[openapi(tag = "File Upload")]
#[post("/upload/attachment", data = "<file>")]
pub async fn upload_attachment(
    mut file: TempFile<'_>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<UploadedFile>>, ApiError> {
    let content_type = file.content_type().map(|ct| format!("{}/{}", ct.top(), ct.sub()));
    let extension = attachment_extension(file.name(), content_type.as_deref())?;

    let size = file.len();
    if size as usize > MAX_ATTACHMENT_BYTES {
        return Err(ApiError::bad_request("File size exceeds 10MB limit"));
    }

    let (filename, filepath) = storage_path(&extension).await?;
    file.persist_to(&filepath).await.map_err(|e| {
        error!("Failed to save upload {}: {}", filepath, e);
        ApiError::internal_error("Failed to store file")
    })?;

    info!("Stored attachment {} for {}", filename, auth.user_id);
    Ok(Json(ApiResponse::success_with_message(
        "File uploaded successfully",
        UploadedFile { url: format!("/{}", filepath), filename, size },
    )))
}

#[openapi(tag = "File Upload")]
#[post("/upload/attachment-base64", data = "<request>")]
pub async fn upload_attachment_base64(
    request: Json<Base64UploadRequest>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<UploadedFile>>, ApiError> {
    let extension = extension_from_mime(&request.mime_type).ok_or_else(|| {
        ApiError::bad_request(format!(
            "Invalid MIME type: {}. Allowed: image/jpeg, image/png, image/webp, application/pdf",
            request.mime_type
        ))
    })?;

    // Accept both bare base64 and data URLs.
    let encoded = request
        .data
        .split_once("base64,")
        .map(|(_, data)| data)
        .unwrap_or(&request.data);

    let bytes = BASE64
        .decode(encoded.trim().as_bytes())
        .map_err(|_| ApiError::bad_request("Invalid base64 data"))?;

    if bytes.len() > MAX_ATTACHMENT_BYTES {
        return Err(ApiError::bad_request("File size exceeds 10MB limit"));
    }

    let (filename, filepath) = storage_path(extension).await?;
    fs::write(&filepath, &bytes).await.map_err(|e| {
        error!("Failed to save upload {}: {}", filepath, e);
        ApiError::internal_error("Failed to store file")
    })?;

    info!("Stored attachment {} ({}) for {}", filename, request.filename, auth.user_id);
    Ok(Json(ApiResponse::success_with_message(
        "File uploaded successfully",
        UploadedFile { url: format!("/{}", filepath), filename, size: bytes.len() as u64 },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocket::http::{ContentType, Status};
    use serde_json::json;

    use crate::models::UserRole;
    use crate::routes::testing::{bearer, client, seed};

    #[test]
    fn extension_prefers_file_name() {
        assert_eq!(attachment_extension(Some("cac.PDF"), Some("image/png")).unwrap(), "pdf");
        assert_eq!(attachment_extension(None, Some("image/jpeg")).unwrap(), "jpg");
        assert!(attachment_extension(Some("run.exe"), None).is_err());
        assert!(attachment_extension(None, None).is_err());
    }

    #[rocket::async_test]
    async fn base64_upload_rejects_bad_input() {
        let (client, handles) = client().await;
        let user = seed(&handles, UserRole::Client).await;

        let res = client
            .post("/api/v1/upload/attachment-base64")
            .header(ContentType::JSON)
            .header(bearer(&user))
            .body(json!({ "filename": "x.exe", "mime_type": "application/x-msdownload", "data": "AAAA" }).to_string())
            .dispatch()
            .await;
        assert_eq!(res.status(), Status::BadRequest);

        let res = client
            .post("/api/v1/upload/attachment-base64")
            .header(ContentType::JSON)
            .header(bearer(&user))
            .body(json!({ "filename": "a.png", "mime_type": "image/png", "data": "***" }).to_string())
            .dispatch()
            .await;
        assert_eq!(res.status(), Status::BadRequest);
    }
}
