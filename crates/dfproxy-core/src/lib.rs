pub mod core;
pub mod cors;
pub mod error;
pub mod handler;

pub use crate::core::{Core, CoreState, PROXY_PATH, ProxySettings};
pub use cors::CorsConfig;
pub use error::ProxyError;
