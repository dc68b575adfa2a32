//! TOML configuration file parsing.
//!
//! Defines the structure of the configuration file with serde.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use super::ConfigError;

/// Root configuration structure from TOML file.
///
/// All fields are optional to allow partial configuration
/// that can be merged with CLI arguments.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Archive request configuration section
    #[serde(default)]
    pub request: RequestSection,

    /// Cities to fetch; the built-in table is used when empty
    #[serde(default)]
    pub cities: Vec<CitySection>,

    /// Retry policy configuration
    #[serde(default)]
    pub retry: RetrySection,
}

/// Archive request configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestSection {
    /// Archive API endpoint
    pub api_url: Option<String>,

    /// Timezone used to align daily values
    pub timezone: Option<String>,

    /// First day of the range (YYYY-MM-DD)
    pub start_date: Option<String>,

    /// Last day of the range (YYYY-MM-DD)
    pub end_date: Option<String>,

    /// Daily variables to request
    pub variables: Option<Vec<String>>,

    /// Output path for the statistics file
    pub output: Option<String>,

    /// Per-request timeout in seconds; timed-out attempts count toward the retry budget
    pub timeout: Option<u64>,

    /// HTTP headers as key-value pairs
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

/// One `[[cities]]` entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CitySection {
    /// City name
    pub name: String,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

/// Retry policy configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetrySection {
    /// Maximum number of attempts per request
    pub max_attempts: Option<u32>,

    /// Initial cooloff in seconds
    pub initial_delay: Option<u64>,
}

impl TomlConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }
}

/// Generates a default configuration file with comments.
#[must_use]
pub fn default_config_template() -> String {
    r#"# meteo-cooloff configuration file

[request]
# Archive API endpoint
# api_url = "https://archive-api.open-meteo.com/v1/archive"

# Timezone used to align daily values (default: Europe/Madrid)
# timezone = "Europe/Madrid"

# Date range, inclusive (YYYY-MM-DD)
start_date = "2010-01-01"
end_date = "2020-12-31"

# Daily variables to request
# Note: --variable on the CLI REPLACES this list entirely
variables = ["temperature_2m_mean", "precipitation_sum", "wind_speed_10m_max"]

# Output path for the statistics file (default: climate_stats.json)
# output = "climate_stats.json"

# Per-request timeout in seconds (default: 30)
# A timed-out attempt is retried and uses up one of [retry].max_attempts
# timeout = 30

# HTTP headers
# [request.headers]
# X-Custom-Header = "value"

# Cities to fetch. When no [[cities]] entry is present, Madrid, London and
# Rio are used. --city on the CLI selects among these by name.
[[cities]]
name = "Madrid"
latitude = 40.416775
longitude = -3.70379

[[cities]]
name = "London"
latitude = 51.507351
longitude = -0.127758

[[cities]]
name = "Rio"
latitude = -22.906847
longitude = -43.172896

[retry]
# Maximum number of attempts per request (default: 10)
# max_attempts = 10

# Initial cooloff in seconds, doubled after every failed attempt (default: 1)
# initial_delay = 1
"#
    .to_string()
}
