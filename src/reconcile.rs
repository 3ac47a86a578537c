use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::info;

use crate::metric::MetricDataset;

/// Plot-library country set: plot code → display name.
pub type PlotCountries = BTreeMap<String, String>;

/// Plot code → data code translation, looked up case-insensitively.
/// The folded index is built once at construction; values keep the
/// original case from the table.
#[derive(Clone, Debug)]
pub struct CodeConverter {
    folded: HashMap<String, String>,
}

impl CodeConverter {
    /// When two table keys collide under uppercase folding, the first key
    /// in ascending order wins.
    pub fn new(table: &BTreeMap<String, String>) -> Self {
        let mut folded = HashMap::new();
        for (code, data_code) in table {
            folded
                .entry(code.to_uppercase())
                .or_insert_with(|| data_code.clone());
        }
        Self { folded }
    }

    /// `None` means no conversion available; callers treat that as a
    /// structural non-match, never an error.
    pub fn convert(&self, plot_code: &str) -> Option<&str> {
        self.folded.get(&plot_code.to_uppercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.folded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folded.is_empty()
    }
}

/// Matches plot countries to a name-keyed dataset by exact string equality.
/// No trimming, no case folding; "France " is not "France".
pub fn reconcile_by_name(
    plot_countries: &PlotCountries,
    data: &MetricDataset,
) -> (BTreeMap<String, String>, BTreeSet<String>) {
    let mut matched = BTreeMap::new();
    let mut unmatched = BTreeSet::new();
    for (code, name) in plot_countries {
        if data.contains_key(name) {
            matched.insert(code.clone(), name.clone());
        } else {
            unmatched.insert(code.clone());
        }
    }
    info!(matched = matched.len(), unmatched = unmatched.len(), "reconciled by name");
    (matched, unmatched)
}

/// Matches plot countries to a code-keyed dataset through the converter,
/// case-insensitively on both sides. The returned metric key keeps the
/// exact case it has in the dataset, so downstream lookups need no folding.
/// "No conversion available" and "converted but absent from the dataset"
/// land in the same unmatched set. If several dataset keys collide under
/// folding, the first in ascending key order wins.
pub fn reconcile_by_code(
    plot_countries: &PlotCountries,
    converter: &CodeConverter,
    data: &MetricDataset,
) -> (BTreeMap<String, String>, BTreeSet<String>) {
    let mut folded_keys: HashMap<String, &String> = HashMap::new();
    for key in data.keys() {
        folded_keys.entry(key.to_uppercase()).or_insert(key);
    }

    let mut matched = BTreeMap::new();
    let mut unmatched = BTreeSet::new();
    for code in plot_countries.keys() {
        let hit = converter
            .convert(code)
            .and_then(|candidate| folded_keys.get(&candidate.to_uppercase()));
        match hit {
            Some(data_key) => {
                matched.insert(code.clone(), (*data_key).clone());
            }
            None => {
                unmatched.insert(code.clone());
            }
        }
    }
    info!(matched = matched.len(), unmatched = unmatched.len(), "reconciled by code");
    (matched, unmatched)
}
