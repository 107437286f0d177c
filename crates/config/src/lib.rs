//! Layered configuration.
//!
//! Later layers override earlier ones:
//!
//! 1. built-in defaults;
//! 2. `folio.toml`, `folio.yaml` or `folio.json` in the platform config
//!    directory;
//! 3. an explicitly given file (format picked by extension);
//! 4. `FOLIO_` environment variables, with `__` between levels
//!    (`FOLIO_API__BASE_URL`).

pub mod error;
mod load;
mod models;

pub use crate::load::{ENV_PREFIX, config_dir};
pub use crate::models::{ApiConfig, CacheConfig, Config, LogConfig, TitlesConfig};
