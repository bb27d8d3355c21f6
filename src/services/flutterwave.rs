use data_encoding::BASE64;
use hmac::{Hmac, Mac};
use log::{error, warn};
use reqwest::Client;
use serde::Deserialize;
use sha2::Sha256;

use crate::config::Config;
use crate::services::{ServiceError, ServiceResult};

/// What the gateway reports about a charge, reduced to the fields badge
/// activation checks.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayTransaction {
    pub status: String,
    pub tx_ref: String,
    pub amount: f64,
    pub currency: String,
}

#[rocket::async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn verify_transaction(&self, transaction_id: &str) -> ServiceResult<GatewayTransaction>;
}

#[derive(Debug, Deserialize)]
struct VerifyEnvelope {
    status: String,
    #[serde(default)]
    message: String,
    data: Option<VerifyData>,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    status: String,
    tx_ref: String,
    amount: f64,
    currency: String,
}

pub struct FlutterwaveGateway {
    client: Client,
}

impl FlutterwaveGateway {
    pub fn new() -> Self {
        FlutterwaveGateway { client: Client::new() }
    }

    /// Checks the `flutterwave-signature` header: base64 HMAC-SHA256 of the raw
    /// body keyed with the configured secret hash.
    pub fn verify_webhook_signature(body: &[u8], signature: &str) -> bool {
        let Some(secret) = Config::flutterwave_secret_hash() else {
            warn!("Flutterwave secret hash not configured. Rejecting webhook");
            return false;
        };
        Self::signature_matches(secret.as_bytes(), body, signature)
    }

    fn signature_matches(secret: &[u8], body: &[u8], signature: &str) -> bool {
        let Ok(expected) = BASE64.decode(signature.trim().as_bytes()) else {
            return false;
        };

        let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret) else {
            return false;
        };
        mac.update(body);
        mac.verify_slice(&expected).is_ok()
    }
}

impl Default for FlutterwaveGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[rocket::async_trait]
impl PaymentGateway for FlutterwaveGateway {
    async fn verify_transaction(&self, transaction_id: &str) -> ServiceResult<GatewayTransaction> {
        let secret = Config::flutterwave_secret_key()
            .ok_or_else(|| ServiceError::ExternalService("Payment gateway is not configured".to_string()))?;

        let url = format!(
            "{}/transactions/{}/verify",
            Config::flutterwave_base_url().trim_end_matches('/'),
            transaction_id
        );

        let res = self
            .client
            .get(&url)
            .bearer_auth(secret)
            .send()
            .await
            .map_err(|e| {
                error!("Flutterwave request failed: {}", e);
                ServiceError::ExternalService("Could not reach payment gateway".to_string())
            })?;

        let status = res.status();
        let envelope: VerifyEnvelope = res.json().await.map_err(|e| {
            error!("Unreadable Flutterwave response ({}): {}", status, e);
            ServiceError::ExternalService("Unexpected response from payment gateway".to_string())
        })?;

        match envelope.data {
            Some(data) if envelope.status == "success" => Ok(GatewayTransaction {
                status: data.status,
                tx_ref: data.tx_ref,
                amount: data.amount,
                currency: data.currency,
            }),
            _ if status.is_client_error() => Err(ServiceError::Validation(format!(
                "Payment could not be verified: {}",
                envelope.message
            ))),
            _ => Err(ServiceError::ExternalService(format!(
                "Payment verification failed: {}",
                envelope.message
            ))),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &[u8], body: &[u8]) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret).unwrap();
        mac.update(body);
        BASE64.encode(&mac.finalize().into_bytes())
    }

    #[test]
    fn accepts_matching_signature() {
        let body = br#"{"event":"charge.completed"}"#;
        let signature = sign(b"hash", body);
        assert!(FlutterwaveGateway::signature_matches(b"hash", body, &signature));
    }

    #[test]
    fn rejects_wrong_secret_or_body() {
        let body = br#"{"event":"charge.completed"}"#;
        let signature = sign(b"hash", body);
        assert!(!FlutterwaveGateway::signature_matches(b"other", body, &signature));
        assert!(!FlutterwaveGateway::signature_matches(b"hash", b"{}", &signature));
        assert!(!FlutterwaveGateway::signature_matches(b"hash", body, "%%not-base64%%"));
    }
}
