//! Cities and their coordinates.

use serde::{Deserialize, Serialize};

/// A named location queried against the archive API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    /// Display name, also used as the grouping key for statistics
    pub name: String,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl City {
    /// Creates a city from a name and coordinates.
    #[must_use]
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }
}

/// Madrid, London and Rio de Janeiro, in that order.
#[must_use]
pub fn default_cities() -> Vec<City> {
    vec![
        City::new("Madrid", 40.416_775, -3.703_790),
        City::new("London", 51.507_351, -0.127_758),
        City::new("Rio", -22.906_847, -43.172_896),
    ]
}
