//! HTTP protocol layer module
//!
//! Status phrases and the `ApiResponse` value object, independent of the
//! transport that eventually writes them.

pub mod response;
pub mod status;

// Re-export commonly used types
pub use response::{ApiResponse, Headers, DEFAULT_CONTENT_TYPE};
pub use status::{status_line, status_meaning};
