use log::{error, info};
use mongodb::bson::DateTime;
use rocket::request::{self, Request, FromRequest, Outcome};
use rocket::http::Status;
use rocket::State;
use rocket_okapi::request::{OpenApiFromRequest, RequestHeaderInput};
use rocket_okapi::r#gen::OpenApiGenerator;

use crate::guards::AuthGuard;
use crate::state::AppState;

/// Authenticated user holding a badge that has not expired.
pub struct BadgeGuard {
    pub auth: AuthGuard,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for BadgeGuard {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let auth = match req.guard::<AuthGuard>().await {
            Outcome::Success(auth) => auth,
            Outcome::Error(e) => return Outcome::Error(e),
            Outcome::Forward(f) => return Outcome::Forward(f),
        };

        let Outcome::Success(state) = req.guard::<&State<AppState>>().await else {
            return Outcome::Error((Status::InternalServerError, ()));
        };

        match state.users.find_by_id(&auth.user_id).await {
            Ok(Some(user)) if user.is_badge_active(DateTime::now()) => Outcome::Success(BadgeGuard { auth }),
            Ok(_) => {
                info!("Badge guard rejected {}: no active badge", auth.user_id);
                Outcome::Error((Status::Forbidden, ()))
            }
            Err(e) => {
                error!("Badge guard lookup failed: {}", e);
                Outcome::Error((Status::InternalServerError, ()))
            }
        }
    }
}

impl<'a> OpenApiFromRequest<'a> for BadgeGuard {
    fn from_request_input(
        _gen: &mut OpenApiGenerator,
        _name: String,
        _required: bool,
    ) -> rocket_okapi::Result<RequestHeaderInput> {
        Ok(RequestHeaderInput::None)
    }
}
