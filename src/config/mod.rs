//! Configuration layer.
//!
//! This module provides:
//! - CLI argument parsing ([`Cli`], [`Command`])
//! - TOML configuration file parsing ([`TomlConfig`])
//! - Validated configuration ([`ValidatedConfig`])
//! - Configuration file generation ([`write_default_config`])
//! - Default values ([`defaults`])
//!
//! # Priority
//!
//! Values are resolved with the following priority (highest to lowest):
//!
//! 1. **Explicit CLI arguments**
//! 2. **TOML config file**
//! 3. **Built-in defaults**
//!
//! Every field has a default, so running without a config file fetches the
//! three built-in cities for 2010-2020.
//!
//! # List Semantics
//!
//! `--variable` **replaces** the TOML `request.variables` list entirely.
//! `--city` does not add cities: it selects, by case-insensitive name, which
//! of the configured cities (TOML `[[cities]]` or the built-in table) are
//! fetched. Coordinates can only be defined in the config file.
//!
//! Headers from TOML and CLI are merged; a CLI header replaces a TOML header
//! with the same name.

mod cli;
pub mod defaults;
mod error;
mod toml;
mod validated;


pub use cli::{Cli, Command};
pub use error::ConfigError;
pub use toml::{CitySection, RequestSection, RetrySection, TomlConfig, default_config_template};
pub use validated::{ValidatedConfig, write_default_config};
