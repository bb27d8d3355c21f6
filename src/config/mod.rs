use rocket::figment::{Figment, providers::{Env, Format, Toml}};
use rocket::Config as RocketConfig;
use std::env;

pub struct Config;

impl Config {
    fn figment() -> Figment {
        // Get the current profile
        let profile = env::var("ROCKET_PROFILE").unwrap_or_else(|_| "development".to_string());

        Figment::from(RocketConfig::default())
            .merge(Toml::file("Rocket.toml").nested())
            .select(&profile)
            .merge(Env::prefixed("ROCKET_"))
    }

    /// `None` when unset or blank. There is no fallback secret.
    pub fn jwt_secret() -> Option<String> {
        Self::figment()
            .extract_inner::<String>("jwt_secret")
            .ok()
            .filter(|secret| !secret.trim().is_empty())
    }

    pub fn jwt_expiry() -> i64 {
        Self::figment()
            .extract_inner("jwt_expiry")
            .unwrap_or(900)
    }

    pub fn mongodb_uri() -> String {
        Self::figment()
            .extract_inner("mongodb_uri")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string())
    }

    pub fn mongodb_database() -> String {
        Self::figment()
            .extract_inner("mongodb_database")
            .unwrap_or_else(|_| "wifmart".to_string())
    }

    pub fn mail_host() -> String {
        Self::figment()
            .extract_inner("mail_host")
            .unwrap_or_else(|_| "smtp.gmail.com".to_string())
    }

    pub fn mail_port() -> u16 {
        Self::figment()
            .extract_inner("mail_port")
            .unwrap_or(587)
    }

    pub fn mail_user() -> String {
        Self::figment()
            .extract_inner("mail_user")
            .unwrap_or_default()
    }

    pub fn mail_password() -> String {
        Self::figment()
            .extract_inner("mail_password")
            .unwrap_or_default()
    }

    pub fn mail_from() -> String {
        Self::figment()
            .extract_inner("mail_from")
            .unwrap_or_else(|_| "Wifmart <noreply@wifmart.com>".to_string())
    }

    pub fn is_mail_enabled() -> bool {
        !Self::mail_user().is_empty() && !Self::mail_password().is_empty()
    }

    pub fn frontend_url() -> String {
        Self::figment()
            .extract_inner("frontend_url")
            .unwrap_or_else(|_| "http://localhost:5173".to_string())
    }

    pub fn flutterwave_secret_key() -> Option<String> {
        Self::figment()
            .extract_inner("flutterwave_secret_key")
            .ok()
    }

    pub fn flutterwave_secret_hash() -> Option<String> {
        Self::figment()
            .extract_inner("flutterwave_secret_hash")
            .ok()
    }

    pub fn flutterwave_base_url() -> String {
        Self::figment()
            .extract_inner("flutterwave_base_url")
            .unwrap_or_else(|_| "https://api.flutterwave.com/v3".to_string())
    }

    pub fn is_flutterwave_enabled() -> bool {
        Self::flutterwave_secret_key().is_some()
    }

    pub fn badge_currency() -> String {
        Self::figment()
            .extract_inner("badge_currency")
            .unwrap_or_else(|_| "NGN".to_string())
    }
}
