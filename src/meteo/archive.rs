//! Open-Meteo historical archive client.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use http::HeaderMap;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::fetch::{ApiRequest, HttpClient, RequestExecutor};
use crate::time::{Sleeper, TokioSleeper};

use super::{City, MeteoError};

/// Default archive endpoint.
pub const DEFAULT_API_URL: &str = "https://archive-api.open-meteo.com/v1/archive";

/// Default timezone used to align daily values.
pub const DEFAULT_TIMEZONE: &str = "Europe/Madrid";

/// Daily variables requested when none are configured.
pub const DEFAULT_VARIABLES: [&str; 3] = [
    "temperature_2m_mean",
    "precipitation_sum",
    "wind_speed_10m_max",
];

/// Date range, variables and timezone for an archive request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveQuery {
    /// First day (inclusive)
    pub start_date: NaiveDate,
    /// Last day (inclusive)
    pub end_date: NaiveDate,
    /// Daily variable names
    pub variables: Vec<String>,
    /// IANA timezone name
    pub timezone: String,
}

impl ArchiveQuery {
    /// Creates a query for the default variables and timezone.
    #[must_use]
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
            variables: DEFAULT_VARIABLES.iter().map(ToString::to_string).collect(),
            timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }

    /// Replaces the requested variables.
    #[must_use]
    pub fn with_variables(mut self, variables: Vec<String>) -> Self {
        self.variables = variables;
        self
    }

    /// Sets the timezone.
    #[must_use]
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }
}

/// Builds the archive URL for one city.
///
/// Existing query parameters on `base` are kept; the archive parameters
/// are appended after them.
#[must_use]
pub fn archive_url(base: &Url, city: &City, query: &ArchiveQuery) -> Url {
    let mut url = base.clone();
    url.query_pairs_mut()
        .append_pair("latitude", &city.latitude.to_string())
        .append_pair("longitude", &city.longitude.to_string())
        .append_pair("start_date", &query.start_date.to_string())
        .append_pair("end_date", &query.end_date.to_string())
        .append_pair("daily", &query.variables.join(","))
        .append_pair("timezone", &query.timezone);
    url
}

/// Daily observations for one city.
///
/// Every vector in `values` has the same length as `time`; `None` marks a
/// day the archive reported as null.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySeries {
    /// City name
    pub city: String,
    /// Observation days
    pub time: Vec<NaiveDate>,
    /// Variable name to per-day value
    pub values: BTreeMap<String, Vec<Option<f64>>>,
}

#[derive(Deserialize)]
struct ArchivePayload {
    daily: Option<BTreeMap<String, serde_json::Value>>,
}

impl DailySeries {
    /// Extracts the requested variables from an archive payload.
    ///
    /// # Errors
    ///
    /// Returns [`MeteoError`] when the `daily` block, its `time` array or a
    /// requested variable is missing, malformed, or misaligned with `time`.
    pub fn from_payload(
        city: impl Into<String>,
        payload: serde_json::Value,
        variables: &[String],
    ) -> Result<Self, MeteoError> {
        let payload: ArchivePayload =
            serde_json::from_value(payload).map_err(|e| MeteoError::Payload(e.to_string()))?;
        let mut daily = payload.daily.ok_or(MeteoError::MissingDaily)?;

        let time: Vec<NaiveDate> = daily
            .remove("time")
            .ok_or_else(|| MeteoError::Payload("'daily' has no 'time' array".to_string()))
            .and_then(|raw| {
                serde_json::from_value(raw).map_err(|e| MeteoError::Payload(format!("time: {e}")))
            })?;

        let mut values = BTreeMap::new();
        for name in variables {
            if values.contains_key(name) {
                continue;
            }
            let raw = daily
                .get(name)
                .ok_or_else(|| MeteoError::MissingVariable { name: name.clone() })?;
            let column: Vec<Option<f64>> = Vec::deserialize(raw)
                .map_err(|e| MeteoError::Payload(format!("{name}: {e}")))?;

            if column.len() != time.len() {
                return Err(MeteoError::LengthMismatch {
                    variable: name.clone(),
                    expected: time.len(),
                    actual: column.len(),
                });
            }
            values.insert(name.clone(), column);
        }

        Ok(Self {
            city: city.into(),
            time,
            values,
        })
    }

    /// Number of days in the series.
    #[must_use]
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Returns true if the series has no days.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

/// Client for the archive endpoint, backed by a [`RequestExecutor`].
///
/// # Example
///
/// ```no_run
/// use meteo_cooloff::fetch::{ReqwestClient, RequestExecutor};
/// use meteo_cooloff::meteo::{ArchiveClient, ArchiveQuery, DEFAULT_API_URL, default_cities};
/// use chrono::NaiveDate;
/// use url::Url;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let base_url = Url::parse(DEFAULT_API_URL)?;
/// let client = ArchiveClient::with_base_url(RequestExecutor::new(ReqwestClient::new()), base_url);
/// let query = ArchiveQuery::new(
///     NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2020, 12, 31).unwrap(),
/// );
/// let series = client.fetch_daily(&default_cities()[0], &query).await?;
/// println!("{} days", series.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ArchiveClient<H, S = TokioSleeper> {
    executor: RequestExecutor<H, S>,
    base_url: Url,
    headers: HeaderMap,
}

impl<H, S> ArchiveClient<H, S> {
    /// Creates a client for a custom endpoint.
    #[must_use]
    pub fn with_base_url(executor: RequestExecutor<H, S>, base_url: Url) -> Self {
        Self {
            executor,
            base_url,
            headers: HeaderMap::new(),
        }
    }

    /// Sets headers sent with every request.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Returns the endpoint URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }
}

impl<H: HttpClient, S: Sleeper> ArchiveClient<H, S> {
    /// Fetches the daily series for one city.
    ///
    /// # Errors
    ///
    /// Returns [`MeteoError::Fetch`] if the executor gives up, or a payload
    /// error if the response does not contain the requested variables.
    pub async fn fetch_daily(
        &self,
        city: &City,
        query: &ArchiveQuery,
    ) -> Result<DailySeries, MeteoError> {
        let url = archive_url(&self.base_url, city, query);
        let request = ApiRequest::new(url).with_headers(self.headers.clone());

        tracing::debug!(city = %city.name, "Fetching daily archive data");
        let payload = self.executor.execute(&request).await?;

        DailySeries::from_payload(city.name.clone(), payload, &query.variables)
    }
}
