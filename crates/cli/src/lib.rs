//! Interactive storefront shell.
//!
//! Seeds a catalog (built-in demo or a JSON file named by `STOREFRONT_CATALOG`)
//! and drives the store through a text menu.

pub mod config;
pub mod shell;

pub use config::{CatalogConfig, ConfigError};
pub use shell::Shell;
