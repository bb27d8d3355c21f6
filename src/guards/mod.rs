pub mod admin;
pub mod auth;
pub mod badge;

pub use admin::AdminGuard;
pub use auth::AuthGuard;
pub use badge::BadgeGuard;
