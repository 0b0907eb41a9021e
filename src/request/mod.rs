//! Request pre-processing
//!
//! Path parsing, verb resolution and body extraction, all driven by an
//! explicit [`RequestContext`].

pub mod body;
pub mod context;
pub mod method;
pub mod path;

pub use body::{extract_body, FormFields, Payload, RawBody, JSON_CONTENT_TYPE};
pub use context::RequestContext;
pub use method::{extract_method, Method, MethodSet};
pub use path::{parse_request_path, resource_name};
