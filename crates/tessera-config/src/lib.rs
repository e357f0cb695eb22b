//! Configuration, paths, and logging setup shared by Tessera binaries.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    Config, DEFAULT_ANONYMOUS_LANDING, DEFAULT_API_BASE_URL, DEFAULT_AUTHENTICATED_LANDING,
    DEFAULT_BROADCAST_CHANNEL, DEFAULT_CREDENTIAL_TTL_DAYS, DEFAULT_LOG_LEVEL,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level};
pub use paths::{Paths, HOME_ENV};
