pub mod user;
pub mod hire_request;
pub mod review;
pub mod badge;
pub mod verification;

pub use user::*;
pub use hire_request::*;
pub use review::*;
pub use badge::*;
pub use verification::*;
