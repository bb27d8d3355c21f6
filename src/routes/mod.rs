pub mod badge;
pub mod hire_request;
pub mod portfolio;
pub mod review;
pub mod upload;
pub mod verification;
