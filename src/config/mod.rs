//! Configuration: CLI options, provider endpoints, credentials, constants.

pub mod constants;
mod types;

pub use constants::*;
pub use types::{AnalysisOptions, Config, Credentials, LogFormat, LogLevel, ProviderEndpoints};
