#[macro_use]
extern crate rocket;

mod config;
mod db;
mod guards;
mod models;
mod routes;
mod services;
mod state;
mod utils;

use dotenvy::dotenv;
use log::{error, info, warn};
use rocket::fairing::{AdHoc, Fairing, Info, Kind};
use rocket::fs::FileServer;
use rocket::http::Header;
use rocket::{Build, Request, Response, Rocket};
use rocket_okapi::openapi_get_routes;
use rocket_okapi::swagger_ui::{SwaggerUIConfig, make_swagger_ui};

/* ----------------------------- CORS ----------------------------- */

pub struct CORS;

#[rocket::async_trait]
impl Fairing for CORS {
    fn info(&self) -> Info {
        Info {
            name: "CORS",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        if let Some(origin) = request.headers().get_one("Origin") {
            response.set_header(Header::new("Access-Control-Allow-Origin", origin));
        }

        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "GET, POST, PUT, PATCH, DELETE, OPTIONS",
        ));

        response.set_header(Header::new(
            "Access-Control-Allow-Headers",
            "Content-Type, Authorization",
        ));

        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
    }
}

/* ----------------------------- OPTIONS ----------------------------- */

#[options("/<_..>")]
fn options_handler() {}

/* ----------------------------- ERRORS ----------------------------- */

#[catch(400)]
fn bad_request() -> rocket::serde::json::Value {
    rocket::serde::json::json!({
        "success": false,
        "message": "Malformed request"
    })
}

#[catch(401)]
fn unauthorized() -> rocket::serde::json::Value {
    rocket::serde::json::json!({
        "success": false,
        "message": "Authentication required",
        "data": { "redirect": "/login" }
    })
}

#[catch(403)]
fn forbidden() -> rocket::serde::json::Value {
    rocket::serde::json::json!({
        "success": false,
        "message": "You do not have permission to perform this action"
    })
}

#[catch(404)]
fn not_found() -> rocket::serde::json::Value {
    rocket::serde::json::json!({
        "success": false,
        "message": "Resource not found (check /api/v1 prefix)"
    })
}

#[catch(422)]
fn unprocessable() -> rocket::serde::json::Value {
    rocket::serde::json::json!({
        "success": false,
        "message": "Request body is missing required fields or has the wrong shape"
    })
}

#[catch(500)]
fn internal_error() -> rocket::serde::json::Value {
    rocket::serde::json::json!({
        "success": false,
        "message": "Internal server error"
    })
}

/* ----------------------------- SWAGGER ----------------------------- */

fn swagger_config() -> SwaggerUIConfig {
    SwaggerUIConfig {
        url: "/api/v1/openapi.json".to_string(),
        ..Default::default()
    }
}

/* ----------------------------- ROUTES ----------------------------- */

/// Everything except state: the launch path adds the MongoDB fairing, tests
/// manage in-memory state.
pub fn mount(rocket: Rocket<Build>) -> Rocket<Build> {
    if let Err(e) = std::fs::create_dir_all(routes::upload::UPLOAD_DIR) {
        warn!("Could not create upload directory: {}", e);
    }

    rocket
        .attach(CORS)
        .mount("/", routes![options_handler])
        .mount(
            "/api/v1",
            openapi_get_routes![
                // Hire requests
                routes::hire_request::create_hire_request,
                routes::hire_request::list_hire_requests,
                routes::hire_request::get_hired_providers,
                routes::hire_request::get_hire_request,
                routes::hire_request::update_hire_status,
                // Reviews
                routes::review::create_review,
                routes::review::get_provider_reviews,
                // Badge
                routes::badge::initiate_badge_payment,
                routes::badge::verify_badge_payment,
                routes::badge::badge_webhook,
                routes::badge::get_badge_status,
                // Verification
                routes::verification::request_verification,
                routes::verification::list_verifications,
                routes::verification::decide_verification,
                // Portfolio
                routes::portfolio::add_portfolio_image,
                routes::portfolio::remove_portfolio_image,
                // Uploads
                routes::upload::upload_attachment,
                routes::upload::upload_attachment_base64,
            ],
        )
        .mount("/uploads", FileServer::from("uploads"))
        .mount("/api/docs", make_swagger_ui(&swagger_config()))
        .register(
            "/",
            catchers![bad_request, unauthorized, forbidden, not_found, unprocessable, internal_error],
        )
}

/* ----------------------------- LAUNCH ----------------------------- */

/// Refuses to launch without a JWT secret; tokens could not be checked.
fn require_jwt_secret() -> AdHoc {
    AdHoc::try_on_ignite("JWT secret", |rocket| async move {
        if config::Config::jwt_secret().is_none() {
            error!("jwt_secret is not configured. Set ROCKET_JWT_SECRET");
            return Err(rocket);
        }
        Ok(rocket)
    })
}

#[launch]
fn rocket() -> Rocket<Build> {
    dotenv().ok();
    env_logger::init();

    info!("🚀 Wifmart API running");
    info!("📚 Swagger UI → http://localhost:8000/api/docs");

    if !config::Config::is_mail_enabled() {
        warn!("Mail credentials not configured. Hire request emails are disabled");
    }
    if !config::Config::is_flutterwave_enabled() {
        warn!("Flutterwave secret key not configured. Badge payments cannot be verified");
    }

    mount(rocket::build().attach(require_jwt_secret()).attach(db::init()))
}
