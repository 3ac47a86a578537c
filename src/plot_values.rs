use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::metric::MetricDataset;
use crate::reconcile::{self, CodeConverter, PlotCountries};

/// Three-way partition of the plot country set for one year. The parts are
/// pairwise disjoint and together cover exactly the plot codes that went in.
#[derive(Clone, Debug, Default)]
pub struct MapValues {
    /// plot code → log10 of the year's value
    pub resolved: BTreeMap<String, f64>,
    /// plot codes with no structural match in the dataset
    pub unmatched: BTreeSet<String>,
    /// plot codes matched to a record that has nothing usable for the year
    pub no_data: BTreeSet<String>,
}

impl MapValues {
    /// Min and max of the resolved values, for scaling a color ramp.
    pub fn resolved_bounds(&self) -> Option<(f64, f64)> {
        let mut values = self.resolved.values();
        let first = *values.next()?;
        let (min, max) = values.fold((first, first), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
        Some((min, max))
    }

    pub fn len(&self) -> usize {
        self.resolved.len() + self.unmatched.len() + self.no_data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parses a raw value and takes log base 10. Non-numeric or non-positive
/// input is out of domain and yields `None`; GDP-like magnitudes are
/// strictly positive, so a violation is a data problem, not a fault.
fn log_magnitude(raw: &str) -> Option<f64> {
    let value: f64 = raw.trim().parse().ok()?;
    if value > 0.0 { Some(value.log10()) } else { None }
}

/// Turns a reconciled mapping into the per-year partition. Plot codes
/// already unmatched are carried through untouched; a matched key that is
/// somehow absent from the dataset joins them. Everything else resolves or
/// lands in no-data depending on what the record holds for the year.
pub fn build_map_values(
    matched: &BTreeMap<String, String>,
    unmatched: &BTreeSet<String>,
    data: &MetricDataset,
    year: i32,
) -> MapValues {
    let mut values = MapValues {
        unmatched: unmatched.clone(),
        ..MapValues::default()
    };
    for (code, key) in matched {
        let Some(record) = data.get(key) else {
            values.unmatched.insert(code.clone());
            continue;
        };
        match record.raw_value(year).filter(|raw| !raw.is_empty()) {
            Some(raw) => match log_magnitude(raw) {
                Some(v) => {
                    values.resolved.insert(code.clone(), v);
                }
                // present but unusable counts as missing data
                None => {
                    values.no_data.insert(code.clone());
                }
            },
            None => {
                values.no_data.insert(code.clone());
            }
        }
    }
    debug!(
        year,
        resolved = values.resolved.len(),
        unmatched = values.unmatched.len(),
        no_data = values.no_data.len(),
        "built map values"
    );
    values
}

/// Name route: exact-equality reconciliation, then the year extraction.
pub fn build_map_values_by_name(
    plot_countries: &PlotCountries,
    data: &MetricDataset,
    year: i32,
) -> MapValues {
    let (matched, unmatched) = reconcile::reconcile_by_name(plot_countries, data);
    build_map_values(&matched, &unmatched, data, year)
}

/// Code route: translation-table reconciliation, then the year extraction.
pub fn build_map_values_by_code(
    plot_countries: &PlotCountries,
    converter: &CodeConverter,
    data: &MetricDataset,
    year: i32,
) -> MapValues {
    let (matched, unmatched) =
        reconcile::reconcile_by_code(plot_countries, converter, data);
    build_map_values(&matched, &unmatched, data, year)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::{MetricDataset, MetricRecord};

    fn record(name: &str, code: &str, series: &[(i32, &str)]) -> MetricRecord {
        MetricRecord {
            name: name.to_string(),
            code: code.to_string(),
            series: series
                .iter()
                .map(|(y, v)| (*y, v.to_string()))
                .collect(),
            metadata: Default::default(),
        }
    }

    fn by_name(records: &[(&str, &[(i32, &str)])]) -> MetricDataset {
        records
            .iter()
            .map(|(name, series)| (name.to_string(), record(name, "", series)))
            .collect()
    }

    fn plot(pairs: &[(&str, &str)]) -> PlotCountries {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn assert_partition(plot_countries: &PlotCountries, values: &MapValues) {
        let mut seen = BTreeSet::new();
        for code in values.resolved.keys() {
            assert!(seen.insert(code.clone()), "{code} in two parts");
        }
        for code in values.unmatched.iter().chain(values.no_data.iter()) {
            assert!(seen.insert(code.clone()), "{code} in two parts");
        }
        let all: BTreeSet<String> = plot_countries.keys().cloned().collect();
        assert_eq!(seen, all, "partition must cover exactly the plot codes");
        assert_eq!(values.len(), plot_countries.len());
    }

    #[test]
    fn scenario_a_value_present_resolves_to_log10() {
        let p = plot(&[("US", "United States")]);
        let data = by_name(&[("United States", &[(2010, "100")])]);
        let values = build_map_values_by_name(&p, &data, 2010);
        assert_eq!(values.resolved.get("US"), Some(&2.0));
        assert!(values.unmatched.is_empty());
        assert!(values.no_data.is_empty());
        assert_partition(&p, &values);
    }

    #[test]
    fn scenario_b_missing_country_is_unmatched() {
        let p = plot(&[("US", "United States")]);
        let data = by_name(&[]);
        let values = build_map_values_by_name(&p, &data, 2010);
        assert!(values.resolved.is_empty());
        assert!(values.unmatched.contains("US"));
        assert!(values.no_data.is_empty());
        assert_partition(&p, &values);
    }

    #[test]
    fn scenario_c_empty_value_is_no_data() {
        let p = plot(&[("US", "United States")]);
        let data = by_name(&[("United States", &[(2010, "")])]);
        let values = build_map_values_by_name(&p, &data, 2010);
        assert!(values.resolved.is_empty());
        assert!(values.unmatched.is_empty());
        assert!(values.no_data.contains("US"));
        assert_partition(&p, &values);
    }

    #[test]
    fn scenario_d_code_route_case_insensitive_end_to_end() {
        let p = plot(&[("us", "United States")]);
        let table: BTreeMap<String, String> =
            [("US".to_string(), "USA".to_string())].into();
        let conv = CodeConverter::new(&table);
        let data: MetricDataset = [(
            "usa".to_string(),
            record("United States", "usa", &[(2010, "50")]),
        )]
        .into_iter()
        .collect();
        let values = build_map_values_by_code(&p, &conv, &data, 2010);
        let got = *values.resolved.get("us").unwrap();
        assert!((got - 50f64.log10()).abs() < 1e-12);
        assert_partition(&p, &values);
    }

    #[test]
    fn absent_year_key_is_no_data() {
        let p = plot(&[("FR", "France")]);
        let data = by_name(&[("France", &[(1999, "10")])]);
        let values = build_map_values_by_name(&p, &data, 2010);
        assert!(values.no_data.contains("FR"));
        assert_partition(&p, &values);
    }

    #[test]
    fn zero_and_negative_values_degrade_to_no_data() {
        let p = plot(&[("AA", "Aland"), ("BB", "Bland")]);
        let data = by_name(&[("Aland", &[(2010, "0")]), ("Bland", &[(2010, "-5")])]);
        let values = build_map_values_by_name(&p, &data, 2010);
        assert!(values.resolved.is_empty());
        assert_eq!(values.no_data.len(), 2);
        assert_partition(&p, &values);
    }

    #[test]
    fn malformed_value_degrades_to_no_data() {
        let p = plot(&[("US", "United States")]);
        let data = by_name(&[("United States", &[(2010, "not a number")])]);
        let values = build_map_values_by_name(&p, &data, 2010);
        assert!(values.resolved.is_empty());
        assert!(values.no_data.contains("US"));
        assert_partition(&p, &values);
    }

    #[test]
    fn log_round_trip_recovers_raw_value() {
        let p = plot(&[("JP", "Japan")]);
        let data = by_name(&[("Japan", &[(2010, "4872136945893.0")])]);
        let values = build_map_values_by_name(&p, &data, 2010);
        let out = *values.resolved.get("JP").unwrap();
        let recovered = 10f64.powf(out);
        assert!((recovered - 4872136945893.0).abs() / 4872136945893.0 < 1e-12);
    }

    #[test]
    fn mixed_outcomes_partition_is_complete_and_disjoint() {
        let p = plot(&[
            ("AA", "Aland"),
            ("BB", "Bland"),
            ("CC", "Cland"),
            ("DD", "Dland"),
            ("EE", "Eland"),
        ]);
        let data = by_name(&[
            ("Aland", &[(2010, "1000")]),
            ("Bland", &[(2010, "")]),
            ("Cland", &[(2009, "7")]),
            ("Dland", &[(2010, "-1")]),
        ]);
        let values = build_map_values_by_name(&p, &data, 2010);
        assert_eq!(values.resolved.get("AA"), Some(&3.0));
        assert!(values.no_data.contains("BB"));
        assert!(values.no_data.contains("CC"));
        assert!(values.no_data.contains("DD"));
        assert!(values.unmatched.contains("EE"));
        assert_partition(&p, &values);
    }

    #[test]
    fn matched_key_absent_from_dataset_joins_unmatched() {
        let matched: BTreeMap<String, String> =
            [("US".to_string(), "ghost".to_string())].into();
        let data = by_name(&[]);
        let values = build_map_values(&matched, &BTreeSet::new(), &data, 2010);
        assert!(values.unmatched.contains("US"));
    }

    #[test]
    fn resolved_bounds_span_min_and_max() {
        let p = plot(&[("AA", "Aland"), ("BB", "Bland")]);
        let data = by_name(&[("Aland", &[(2010, "10")]), ("Bland", &[(2010, "1000")])]);
        let values = build_map_values_by_name(&p, &data, 2010);
        assert_eq!(values.resolved_bounds(), Some((1.0, 3.0)));
        assert_eq!(MapValues::default().resolved_bounds(), None);
        assert!(MapValues::default().is_empty());
    }
}
