//! Validated value types.

mod serial;
mod service_url;

pub use serial::SerialNumber;
pub use service_url::ServiceUrl;
