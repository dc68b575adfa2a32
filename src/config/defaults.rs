//! Default values for configuration options.
//!
//! Centralized constants to avoid magic numbers scattered across the codebase.

/// Default first day of the archive range.
pub const START_DATE: &str = "2010-01-01";

/// Default last day of the archive range.
pub const END_DATE: &str = "2020-12-31";

/// Default output file for monthly statistics.
pub const OUTPUT: &str = "climate_stats.json";

/// Default per-request timeout in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default maximum number of attempts per request.
pub const RETRY_MAX_ATTEMPTS: u32 = 10;

/// Default initial cooloff in seconds.
pub const RETRY_INITIAL_DELAY_SECS: u64 = 1;

