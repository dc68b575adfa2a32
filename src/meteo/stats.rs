//! Monthly statistics per city.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::DailySeries;

/// Max, mean, min and sample standard deviation of a set of values.
///
/// Every field is `None` when there were no values; `std` is also `None`
/// for a single value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Summary {
    /// Largest value
    pub max: Option<f64>,
    /// Arithmetic mean
    pub mean: Option<f64>,
    /// Smallest value
    pub min: Option<f64>,
    /// Sample standard deviation (n - 1 denominator)
    pub std: Option<f64>,
}

impl Summary {
    /// Summarises `values`, ignoring NaN.
    #[must_use]
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        let values: Vec<f64> = values.into_iter().filter(|v| !v.is_nan()).collect();
        if values.is_empty() {
            return Self::default();
        }

        #[expect(clippy::cast_precision_loss, reason = "day counts are far below 2^52")]
        let count = values.len() as f64;
        let mean = values.iter().sum::<f64>() / count;
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);

        let std = (values.len() > 1).then(|| {
            let squared: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (squared / (count - 1.0)).sqrt()
        });

        Self {
            max: Some(max),
            mean: Some(mean),
            min: Some(min),
            std,
        }
    }
}

/// Statistics of one city for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyStats {
    /// City name
    pub city: String,
    /// First day of the month
    pub month: NaiveDate,
    /// Variable name to its summary
    pub variables: BTreeMap<String, Summary>,
}

/// City name, then month, to the `(series, row)` pairs falling in it.
type Buckets<'a> = Vec<(&'a str, BTreeMap<NaiveDate, Vec<(&'a DailySeries, usize)>>)>;

/// Groups daily series by city and calendar month and summarises each variable.
///
/// Series sharing a city name are merged. Output is ordered by first
/// appearance of the city, then by month. Variables absent from a series
/// contribute no values.
#[must_use]
pub fn monthly_statistics(series: &[DailySeries], variables: &[String]) -> Vec<MonthlyStats> {
    let mut buckets: Buckets<'_> = Vec::new();

    for s in series {
        let index = match buckets.iter().position(|(city, _)| *city == s.city) {
            Some(index) => index,
            None => {
                buckets.push((s.city.as_str(), BTreeMap::new()));
                buckets.len() - 1
            }
        };
        let months = &mut buckets[index].1;

        for (row, day) in s.time.iter().enumerate() {
            let Some(month) = day.with_day(1) else {
                continue;
            };
            months.entry(month).or_default().push((s, row));
        }
    }

    buckets
        .into_iter()
        .flat_map(|(city, months)| {
            months.into_iter().map(move |(month, rows)| MonthlyStats {
                city: city.to_string(),
                month,
                variables: variables
                    .iter()
                    .map(|name| (name.clone(), summarise(&rows, name)))
                    .collect(),
            })
        })
        .collect()
}

fn summarise(rows: &[(&DailySeries, usize)], variable: &str) -> Summary {
    Summary::from_values(rows.iter().filter_map(|(series, row)| {
        series
            .values
            .get(variable)
            .and_then(|column| column.get(*row).copied().flatten())
    }))
}
