//! Structured error handling for API responses

pub mod codes;
pub mod report;
pub mod response;

pub use codes::ErrorCode;
pub use report::Error;
pub use response::{ErrorDetail, ErrorResponse};
