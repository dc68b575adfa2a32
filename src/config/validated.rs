//! Validated configuration after merging CLI and TOML sources.
//!
//! This module contains the final, validated configuration that is used
//! by the application. All validation is performed during construction.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use http::HeaderMap;
use http::header::{HeaderName, HeaderValue};
use url::Url;

use crate::fetch::RetryPolicy;
use crate::meteo::{
    ArchiveQuery, City, DEFAULT_API_URL, DEFAULT_TIMEZONE, DEFAULT_VARIABLES, default_cities,
};

use super::cli::Cli;
use super::defaults;
use super::error::ConfigError;
use super::toml::TomlConfig;

/// Fully validated configuration ready for use by the application.
///
/// # Construction
///
/// Use [`ValidatedConfig::from_raw`] to create from CLI args and optional TOML config.
#[derive(Debug)]
pub struct ValidatedConfig {
    /// Archive API endpoint
    pub api_url: Url,

    /// Headers sent with every archive request
    pub headers: HeaderMap,

    /// Date range, variables and timezone
    pub query: ArchiveQuery,

    /// Cities to fetch, in order
    pub cities: Vec<City>,

    /// Output path for the statistics file
    pub output: PathBuf,

    /// Per-request transport timeout
    pub timeout: Duration,

    /// Retry policy for archive requests
    pub retry_policy: RetryPolicy,

    /// Verbose logging enabled
    pub verbose: bool,
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cities: Vec<&str> = self.cities.iter().map(|c| c.name.as_str()).collect();

        write!(
            f,
            "Config {{ api_url: {}, range: {}..{}, variables: [{}], timezone: {}, cities: [{}], \
             output: {}, timeout: {}s, retry: {}x/{}s }}",
            self.api_url,
            self.query.start_date,
            self.query.end_date,
            self.query.variables.join(", "),
            self.query.timezone,
            cities.join(", "),
            self.output.display(),
            self.timeout.as_secs(),
            self.retry_policy.max_attempts,
            self.retry_policy.initial_delay.as_secs(),
        )
    }
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments and optional TOML config.
    ///
    /// CLI arguments take precedence over TOML config values.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The URL, a date, or the date range is invalid
    /// - The variable list is empty or has a blank entry
    /// - A city is invalid or a `--city` filter matches nothing
    /// - Timeout or retry values are zero
    /// - Header format is invalid
    pub fn from_raw(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Self, ConfigError> {
        let api_url = Self::resolve_api_url(cli, toml)?;
        let headers = Self::resolve_headers(cli, toml)?;
        let query = Self::resolve_query(cli, toml)?;
        let cities = Self::resolve_cities(cli, toml)?;
        let timeout = Self::resolve_timeout(cli, toml)?;
        let retry_policy = Self::build_retry_policy(cli, toml)?;

        let output = cli
            .output
            .clone()
            .or_else(|| toml.and_then(|t| t.request.output.as_ref().map(PathBuf::from)))
            .unwrap_or_else(|| PathBuf::from(defaults::OUTPUT));

        Ok(Self {
            api_url,
            headers,
            query,
            cities,
            output,
            timeout,
            retry_policy,
            verbose: cli.verbose,
        })
    }

    /// Loads and merges configuration from CLI and optional config file.
    ///
    /// If `cli.config` is set, loads the TOML file from that path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - The merged configuration is invalid
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let toml = if let Some(ref path) = cli.config {
            Some(TomlConfig::load(path)?)
        } else {
            None
        };

        Self::from_raw(cli, toml.as_ref())
    }

    fn resolve_api_url(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Url, ConfigError> {
        let url_str = cli
            .api_url
            .as_deref()
            .or_else(|| toml.and_then(|t| t.request.api_url.as_deref()))
            .unwrap_or(DEFAULT_API_URL);

        Url::parse(url_str).map_err(|e| ConfigError::InvalidUrl {
            url: url_str.to_string(),
            reason: e.to_string(),
        })
    }

    fn resolve_headers(cli: &Cli, toml: Option<&TomlConfig>) -> Result<HeaderMap, ConfigError> {
        let mut headers = HeaderMap::new();

        // TOML first so CLI can override
        if let Some(toml) = toml {
            for (name, value) in &toml.request.headers {
                let header_name = parse_header_name(name)?;
                let header_value = parse_header_value(name, value)?;
                headers.insert(header_name, header_value);
            }
        }

        for header_str in &cli.headers {
            let (name, value) = parse_header_string(header_str)?;
            let header_name = parse_header_name(&name)?;
            let header_value = parse_header_value(&name, &value)?;
            headers.insert(header_name, header_value);
        }

        Ok(headers)
    }

    fn resolve_query(cli: &Cli, toml: Option<&TomlConfig>) -> Result<ArchiveQuery, ConfigError> {
        let request = toml.map(|t| &t.request);

        let start_str = cli
            .start_date
            .as_deref()
            .or_else(|| request.and_then(|r| r.start_date.as_deref()))
            .unwrap_or(defaults::START_DATE);
        let end_str = cli
            .end_date
            .as_deref()
            .or_else(|| request.and_then(|r| r.end_date.as_deref()))
            .unwrap_or(defaults::END_DATE);

        let start_date = parse_date("start_date", start_str)?;
        let end_date = parse_date("end_date", end_str)?;

        if start_date > end_date {
            return Err(ConfigError::InvalidDateRange {
                start: start_date.to_string(),
                end: end_date.to_string(),
            });
        }

        let variables = if cli.variables.is_empty() {
            request
                .and_then(|r| r.variables.clone())
                .unwrap_or_else(|| DEFAULT_VARIABLES.iter().map(ToString::to_string).collect())
        } else {
            cli.variables.clone()
        };
        let variables = validate_variables(variables)?;

        let timezone = cli
            .timezone
            .clone()
            .or_else(|| request.and_then(|r| r.timezone.clone()))
            .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());

        Ok(ArchiveQuery::new(start_date, end_date)
            .with_variables(variables)
            .with_timezone(timezone))
    }

    fn resolve_cities(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Vec<City>, ConfigError> {
        let configured = match toml {
            Some(t) if !t.cities.is_empty() => t
                .cities
                .iter()
                .map(|c| City::new(c.name.clone(), c.latitude, c.longitude))
                .collect(),
            _ => default_cities(),
        };

        for city in &configured {
            validate_city(city)?;
        }

        if cli.cities.is_empty() {
            return Ok(configured);
        }

        // Every requested name must match a configured city
        if let Some(unknown) = cli
            .cities
            .iter()
            .find(|name| !configured.iter().any(|c| c.name.eq_ignore_ascii_case(name)))
        {
            return Err(ConfigError::UnknownCity {
                name: unknown.clone(),
            });
        }

        Ok(configured
            .into_iter()
            .filter(|c| cli.cities.iter().any(|name| c.name.eq_ignore_ascii_case(name)))
            .collect())
    }

    fn resolve_timeout(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Duration, ConfigError> {
        let seconds = cli
            .timeout
            .or_else(|| toml.and_then(|t| t.request.timeout))
            .unwrap_or(defaults::REQUEST_TIMEOUT_SECS);

        if seconds == 0 {
            return Err(ConfigError::InvalidDuration {
                field: "timeout",
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(Duration::from_secs(seconds))
    }

    fn build_retry_policy(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<RetryPolicy, ConfigError> {
        let retry = toml.map(|t| &t.retry);

        let max_attempts = cli
            .retry_max
            .or_else(|| retry.and_then(|r| r.max_attempts))
            .unwrap_or(defaults::RETRY_MAX_ATTEMPTS);

        let initial_delay_secs = cli
            .retry_delay
            .or_else(|| retry.and_then(|r| r.initial_delay))
            .unwrap_or(defaults::RETRY_INITIAL_DELAY_SECS);

        if max_attempts == 0 {
            return Err(ConfigError::InvalidRetry(
                "max_attempts must be greater than 0".to_string(),
            ));
        }

        if initial_delay_secs == 0 {
            return Err(ConfigError::InvalidRetry(
                "initial_delay must be greater than 0".to_string(),
            ));
        }

        Ok(RetryPolicy::new()
            .with_max_attempts(max_attempts)
            .with_initial_delay(Duration::from_secs(initial_delay_secs)))
    }
}

/// Writes the default configuration template to a file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let template = super::toml::default_config_template();
    std::fs::write(path, template).map_err(|e| ConfigError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

// Helper functions

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| ConfigError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

fn validate_variables(variables: Vec<String>) -> Result<Vec<String>, ConfigError> {
    if variables.is_empty() {
        return Err(ConfigError::InvalidVariables(
            "at least one daily variable is required".to_string(),
        ));
    }

    let mut unique: Vec<String> = Vec::with_capacity(variables.len());
    for variable in variables {
        let variable = variable.trim();
        if variable.is_empty() {
            return Err(ConfigError::InvalidVariables(
                "variable names must not be blank".to_string(),
            ));
        }
        // Repeats collapse onto the first occurrence
        if !unique.iter().any(|v| v == variable) {
            unique.push(variable.to_string());
        }
    }

    Ok(unique)
}

fn validate_city(city: &City) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidCity {
        name: city.name.clone(),
        reason,
    };

    if city.name.trim().is_empty() {
        return Err(invalid("name must not be empty".to_string()));
    }
    if !(-90.0..=90.0).contains(&city.latitude) {
        return Err(invalid(format!(
            "latitude {} is outside -90..=90",
            city.latitude
        )));
    }
    if !(-180.0..=180.0).contains(&city.longitude) {
        return Err(invalid(format!(
            "longitude {} is outside -180..=180",
            city.longitude
        )));
    }

    Ok(())
}

fn parse_header_string(s: &str) -> Result<(String, String), ConfigError> {
    // Try "Key=Value" format first
    if let Some((name, value)) = s.split_once('=') {
        return Ok((name.trim().to_string(), value.trim().to_string()));
    }

    // Try "Key: Value" format
    if let Some((name, value)) = s.split_once(':') {
        return Ok((name.trim().to_string(), value.trim().to_string()));
    }

    Err(ConfigError::InvalidHeader {
        value: s.to_string(),
    })
}

fn parse_header_name(name: &str) -> Result<HeaderName, ConfigError> {
    name.parse::<HeaderName>()
        .map_err(|e| ConfigError::InvalidHeaderName {
            name: name.to_string(),
            reason: e.to_string(),
        })
}

fn parse_header_value(name: &str, value: &str) -> Result<HeaderValue, ConfigError> {
    HeaderValue::from_str(value).map_err(|e| ConfigError::InvalidHeaderValue {
        name: name.to_string(),
        reason: e.to_string(),
    })
}
