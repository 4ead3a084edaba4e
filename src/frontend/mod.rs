//! The frontend role: a stateless-per-request quorum dispatcher over the
//! node replicas, plus the client-facing API service.

mod core;
mod service;

pub use self::core::Frontend;
pub use service::{FrontendApiService, FrontendConfig};
