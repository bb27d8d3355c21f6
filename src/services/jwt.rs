use jsonwebtoken::errors::{Error, ErrorKind};
use jsonwebtoken::{encode, decode, Header, Validation, EncodingKey, DecodingKey};
use serde::{Deserialize, Serialize};
use mongodb::bson::oid::ObjectId;

use crate::models::UserRole;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // User ID
    pub email: String,
    pub role: UserRole,
    pub exp: i64,
    pub iat: i64,
}

pub struct JwtService;

fn signing_secret(secret: Option<String>) -> Result<String, Error> {
    secret.ok_or_else(|| ErrorKind::InvalidKeyFormat.into())
}

impl JwtService {
    pub fn generate_access_token(
        user_id: &ObjectId,
        email: &str,
        role: UserRole,
    ) -> Result<String, Error> {
        let expiry = crate::config::Config::jwt_expiry();
        let now = chrono::Utc::now().timestamp();

        let claims = Claims {
            sub: user_id.to_hex(),
            email: email.to_string(),
            role,
            exp: now + expiry,
            iat: now,
        };

        let secret = signing_secret(crate::config::Config::jwt_secret())?;
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    pub fn verify_token(token: &str) -> Result<Claims, Error> {
        Self::verify_with(token, crate::config::Config::jwt_secret())
    }

    /// Without a configured secret every token is refused.
    fn verify_with(token: &str, secret: Option<String>) -> Result<Claims, Error> {
        let secret = signing_secret(secret)?;

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;

        Ok(token_data.claims)
    }
}
