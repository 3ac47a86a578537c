use serde::Deserialize;
use serde_json::from_slice;
use std::{fs, path::Path};

/// Where and how to read the GDP file.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GdpConfig {
    pub gdp_file: String,
    pub separator: char,
    pub quote: char,
    pub min_year: i32,
    pub max_year: i32,
    pub country_name: String,
    pub country_code: String,
}

impl Default for GdpConfig {
    fn default() -> Self {
        Self {
            gdp_file: "isp_gdp.csv".to_string(),
            separator: ',',
            quote: '"',
            min_year: 1960,
            max_year: 2015,
            country_name: "Country Name".to_string(),
            country_code: "Country Code".to_string(),
        }
    }
}

/// Where and how to read the plot-code → data-code translation table.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CodeConfig {
    pub code_file: String,
    pub separator: char,
    pub quote: char,
    pub plot_codes: String,
    pub data_codes: String,
}

impl Default for CodeConfig {
    fn default() -> Self {
        Self {
            code_file: "isp_country_codes.csv".to_string(),
            separator: ',',
            quote: '"',
            plot_codes: "ISO3166-1-Alpha-2".to_string(),
            data_codes: "ISO3166-1-Alpha-3".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    pub gdp: GdpConfig,
    pub codes: CodeConfig,
}

impl AtlasConfig {
    /// Reads `atlas.json` from the data directory if present, otherwise
    /// falls back to the built-in defaults.
    pub fn load<P: AsRef<Path>>(data_dir: P) -> Self {
        fs::read(data_dir.as_ref().join("atlas.json"))
            .ok()
            .and_then(|b| from_slice::<AtlasConfig>(&b).ok())
            .unwrap_or_default()
    }
}
