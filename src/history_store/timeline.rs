//! Dense listening-history series and chart transforms.
//!
//! Stores return sparse (year, month) listen counts; charts need every bucket
//! present. Series here span whole years: January of the earliest observed
//! year through December of the latest, zero-filled in between.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Listen count for one calendar month.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct MonthlyCount {
    pub year: i32,
    pub month: u32,
    pub count: u64,
}

/// Listen count for one calendar year.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct YearlyCount {
    pub year: i32,
    pub count: u64,
}

/// Dense monthly and yearly listen counts for one entity. Both series come
/// from the same grouped rows, so they always agree. Empty when the entity
/// has no counted listens.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ListeningHistory {
    pub monthly: Vec<MonthlyCount>,
    pub yearly: Vec<YearlyCount>,
}

impl ListeningHistory {
    /// Build a dense history from sparse per-month rows.
    pub fn from_monthly_rows(rows: &[MonthlyCount]) -> Self {
        if rows.is_empty() {
            return Self::default();
        }
        let min_year = rows.iter().map(|r| r.year).min().unwrap_or(0);
        let max_year = rows.iter().map(|r| r.year).max().unwrap_or(0);

        let mut by_month: HashMap<(i32, u32), u64> = HashMap::new();
        let mut by_year: HashMap<i32, u64> = HashMap::new();
        for row in rows {
            *by_month.entry((row.year, row.month)).or_insert(0) += row.count;
            *by_year.entry(row.year).or_insert(0) += row.count;
        }

        let mut monthly = Vec::with_capacity((max_year - min_year + 1) as usize * 12);
        for year in min_year..=max_year {
            for month in 1..=12 {
                monthly.push(MonthlyCount {
                    year,
                    month,
                    count: by_month.get(&(year, month)).copied().unwrap_or(0),
                });
            }
        }

        let yearly = (min_year..=max_year)
            .map(|year| YearlyCount {
                year,
                count: by_year.get(&year).copied().unwrap_or(0),
            })
            .collect();

        Self { monthly, yearly }
    }

    pub fn is_empty(&self) -> bool {
        self.monthly.is_empty()
    }

    pub fn monthly_series(&self, mode: &ChartMode) -> Vec<u64> {
        let counts: Vec<u64> = self.monthly.iter().map(|m| m.count).collect();
        mode.apply(&counts)
    }

    pub fn yearly_series(&self, mode: &ChartMode) -> Vec<u64> {
        let counts: Vec<u64> = self.yearly.iter().map(|y| y.count).collect();
        mode.apply(&counts)
    }
}

// =============================================================================
// Chart Transforms
// =============================================================================

/// Per-bucket counts as stored, unchanged.
pub fn distribution(counts: &[u64]) -> Vec<u64> {
    counts.to_vec()
}

/// Running prefix sum over the buckets.
pub fn cumulative(counts: &[u64]) -> Vec<u64> {
    let mut total = 0u64;
    counts
        .iter()
        .map(|count| {
            total += count;
            total
        })
        .collect()
}

/// How a chart renders a bucketed series.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ChartMode {
    #[default]
    Distribution,
    Cumulative,
}

impl ChartMode {
    pub fn from_key(s: &str) -> Self {
        match s {
            "cumulative" => ChartMode::Cumulative,
            _ => ChartMode::Distribution,
        }
    }

    pub fn as_key(&self) -> &'static str {
        match self {
            ChartMode::Distribution => "distribution",
            ChartMode::Cumulative => "cumulative",
        }
    }

    pub fn apply(&self, counts: &[u64]) -> Vec<u64> {
        match self {
            ChartMode::Distribution => distribution(counts),
            ChartMode::Cumulative => cumulative(counts),
        }
    }
}
