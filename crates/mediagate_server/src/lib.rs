//! HTTP front end for the mediagate media scanning gateway.
//!
//! Exposes the report service under the `/_matrix/media_proxy/unstable`
//! prefix and loads its configuration from TOML plus environment overrides.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod api;
mod config;

pub use api::{ApiError, AppState, create_router};
pub use config::{MediagateConfig, ServerSettings};
