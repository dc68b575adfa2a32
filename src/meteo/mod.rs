//! Open-Meteo archive access and monthly aggregation.
//!
//! This module provides:
//! - The default coordinate table ([`City`], [`default_cities`])
//! - Archive API access on top of the request executor ([`ArchiveClient`], [`ArchiveQuery`])
//! - Per-city monthly statistics ([`monthly_statistics`], [`MonthlyStats`])

mod archive;
mod city;
mod error;
mod stats;


pub use archive::{
    ArchiveClient, ArchiveQuery, DEFAULT_API_URL, DEFAULT_TIMEZONE, DEFAULT_VARIABLES,
    DailySeries, archive_url,
};
pub use city::{City, default_cities};
pub use error::MeteoError;
pub use stats::{MonthlyStats, Summary, monthly_statistics};
