use std::collections::BTreeMap;

use crate::config::GdpConfig;

/// One country's row from the GDP file, split at parse time into the typed
/// year series and everything else. Year columns are the header fields that
/// are purely digits and fall inside the configured year bounds; raw values
/// stay as strings because an empty string means "no data for that year".
#[derive(Clone, Debug, Default)]
pub struct MetricRecord {
    pub name: String,
    pub code: String,
    pub series: BTreeMap<i32, String>,
    pub metadata: BTreeMap<String, String>,
}

impl MetricRecord {
    pub fn from_row(row: &BTreeMap<String, String>, cfg: &GdpConfig) -> Self {
        let mut record = MetricRecord {
            name: row.get(&cfg.country_name).cloned().unwrap_or_default(),
            code: row.get(&cfg.country_code).cloned().unwrap_or_default(),
            ..MetricRecord::default()
        };
        for (field, value) in row {
            match parse_year(field) {
                Some(year) if year >= cfg.min_year && year <= cfg.max_year => {
                    record.series.insert(year, value.clone());
                }
                _ => {
                    record.metadata.insert(field.clone(), value.clone());
                }
            }
        }
        record
    }

    /// Raw value for one year, if the year column exists at all.
    pub fn raw_value(&self, year: i32) -> Option<&str> {
        self.series.get(&year).map(String::as_str)
    }

    /// Ordered (year, value) pairs for every year with a non-empty,
    /// parseable value. Unparseable values are skipped, not errors.
    pub fn series_points(&self) -> Vec<(i32, f64)> {
        self.series
            .iter()
            .filter(|(_, raw)| !raw.is_empty())
            .filter_map(|(&year, raw)| {
                raw.trim().parse::<f64>().ok().map(|v| (year, v))
            })
            .collect()
    }
}

/// Strict digits-only year filter. Anything with a non-digit character is a
/// metadata column, not a year.
fn parse_year(field: &str) -> Option<i32> {
    if field.is_empty() || !field.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

/// GDP records keyed by the caller's choice of country name or country
/// code. BTreeMap keeps key iteration in ascending order, which the code
/// reconciler relies on for a deterministic first-match policy.
#[derive(Clone, Debug, Default)]
pub struct MetricDataset {
    records: BTreeMap<String, MetricRecord>,
}

impl MetricDataset {
    /// Builds records from the loader's nested form. The outer key is
    /// whatever field the rows were keyed by (name or code).
    pub fn from_rows(
        rows: &BTreeMap<String, BTreeMap<String, String>>,
        cfg: &GdpConfig,
    ) -> Self {
        let records = rows
            .iter()
            .map(|(key, row)| (key.clone(), MetricRecord::from_row(row, cfg)))
            .collect();
        Self { records }
    }

    pub fn get(&self, key: &str) -> Option<&MetricRecord> {
        self.records.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    /// Keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.records.keys()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<(String, MetricRecord)> for MetricDataset {
    fn from_iter<I: IntoIterator<Item = (String, MetricRecord)>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}
