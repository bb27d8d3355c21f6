pub mod badge_service;
pub mod email;
pub mod error;
pub mod flutterwave;
pub mod hire_service;
pub mod jwt;
pub mod profile_service;
pub mod review_service;
pub mod verification_service;

pub use badge_service::BadgeService;
pub use email::{EmailService, Notifier};
pub use error::{ServiceError, ServiceResult};
pub use flutterwave::{FlutterwaveGateway, GatewayTransaction, PaymentGateway};
pub use hire_service::HireRequestService;
pub use jwt::JwtService;
pub use profile_service::ProfileService;
pub use review_service::ReviewService;
pub use verification_service::VerificationService;
