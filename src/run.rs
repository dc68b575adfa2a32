//! Application execution logic.
//!
//! Fetches each configured city from the archive, aggregates the daily
//! series into monthly statistics and writes them to the output file.

use std::path::{Path, PathBuf};

use thiserror::Error;

use meteo_cooloff::config::ValidatedConfig;
use meteo_cooloff::fetch::{HttpClient, HttpError, ReqwestClient, RequestExecutor};
use meteo_cooloff::meteo::{
    ArchiveClient, ArchiveQuery, City, MeteoError, MonthlyStats, monthly_statistics,
};
use meteo_cooloff::time::Sleeper;

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Number of statistics rows echoed to the log after a run.
const PREVIEW_ROWS: usize = 5;

/// Error type for runtime execution failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// Failed to build the HTTP client.
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] HttpError),

    /// A city could not be fetched or its payload was unusable.
    #[error("Failed to fetch data for {city}: {source}")]
    Fetch {
        /// City name
        city: String,
        /// Underlying error
        #[source]
        source: MeteoError,
    },

    /// Failed to serialize the statistics.
    #[error("Failed to serialize statistics: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Failed to write the output file.
    #[error("Failed to write statistics to '{}': {source}", path.display())]
    Write {
        /// Output path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
}

/// Executes the fetch, aggregate and write pipeline.
///
/// # Errors
///
/// Returns an error if:
/// - The HTTP client cannot be built
/// - Any city fails after the retry budget is spent, or returns a bad payload
/// - The output file cannot be written
///
/// # Coverage Note
///
/// This function is excluded from coverage because it performs real network I/O.
#[cfg(not(tarpaulin_include))]
pub async fn execute(config: ValidatedConfig) -> Result<(), RunError> {
    let client = ReqwestClient::with_timeout(config.timeout).map_err(RunError::Client)?;
    let executor = RequestExecutor::new(client).with_retry_policy(config.retry_policy);
    let archive = ArchiveClient::with_base_url(executor, config.api_url).with_headers(config.headers);

    let stats = collect_statistics(&archive, &config.cities, &config.query).await?;

    write_report(&config.output, &stats)?;
    tracing::info!(
        rows = stats.len(),
        path = %config.output.display(),
        "Wrote monthly statistics"
    );
    log_preview(&stats);

    Ok(())
}

/// Fetches every city in order and aggregates the results.
///
/// The first city that fails aborts the run.
async fn collect_statistics<H: HttpClient, S: Sleeper>(
    archive: &ArchiveClient<H, S>,
    cities: &[City],
    query: &ArchiveQuery,
) -> Result<Vec<MonthlyStats>, RunError> {
    let mut series = Vec::with_capacity(cities.len());

    for city in cities {
        tracing::info!(city = %city.name, "Fetching archive data");
        let daily = archive
            .fetch_daily(city, query)
            .await
            .map_err(|source| RunError::Fetch {
                city: city.name.clone(),
                source,
            })?;
        tracing::info!(city = %city.name, days = daily.len(), "Fetched daily observations");
        series.push(daily);
    }

    Ok(monthly_statistics(&series, &query.variables))
}

/// Writes the statistics as pretty-printed JSON.
fn write_report(path: &Path, stats: &[MonthlyStats]) -> Result<(), RunError> {
    let json = serde_json::to_string_pretty(stats).map_err(RunError::Serialize)?;

    std::fs::write(path, json).map_err(|source| RunError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn log_preview(stats: &[MonthlyStats]) {
    for row in stats.iter().take(PREVIEW_ROWS) {
        let summary: Vec<String> = row
            .variables
            .iter()
            .map(|(name, s)| match s.mean {
                Some(mean) => format!("{name}={mean:.2}"),
                None => format!("{name}=n/a"),
            })
            .collect();
        tracing::info!(
            city = %row.city,
            month = %row.month.format("%Y-%m"),
            "Mean values: {}",
            summary.join(", ")
        );
    }
}
