//! meteo-cooloff: historical weather statistics over a resilient HTTP executor
//!
//! A library for fetching daily observations from the Open-Meteo archive,
//! retrying failed requests with exponential backoff, and aggregating the
//! results into per-city monthly statistics.

pub mod config;
pub mod fetch;
pub mod meteo;
pub mod time;
