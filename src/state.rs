use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crossterm::event::KeyCode;
use geojson::GeoJson;
use tracing::info;

use crate::config::AtlasConfig;
use crate::error::AtlasError;
use crate::loader;
use crate::map_draw::MapView;
use crate::metric::{MetricDataset, MetricRecord};
use crate::plot_values::{self, MapValues};
use crate::reconcile::{self, CodeConverter, PlotCountries};

/// Which key space joins the plot countries to the GDP data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchMode {
    Name,
    Code,
}

impl MatchMode {
    pub fn label(self) -> &'static str {
        match self {
            MatchMode::Name => "by name",
            MatchMode::Code => "by code",
        }
    }

    fn toggled(self) -> Self {
        match self {
            MatchMode::Name => MatchMode::Code,
            MatchMode::Code => MatchMode::Name,
        }
    }
}

pub struct AppState {
    pub config: AtlasConfig,
    pub view: MapView,
    pub plot_countries: PlotCountries,
    /// plot codes in display order, for the list panel
    pub codes: Vec<String>,
    pub selected: usize,
    pub mode: MatchMode,
    pub year: i32,
    pub values: MapValues,
    pub info: String,
    by_name: MetricDataset,
    by_code: MetricDataset,
    converter: CodeConverter,
    /// current plot code → metric key mapping for the active mode
    matched: BTreeMap<String, String>,
}

impl AppState {
    const HELP_TEXT: &'static str = "\
←/→: year  ±1
[/]: year ±10
↑/↓: move in country list
m: toggle match mode
q: quit";

    pub fn new(data_dir: &str) -> Result<Self, AtlasError> {
        let dir = Path::new(data_dir);
        let config = AtlasConfig::load(dir);

        let raw = GeoJson::from_str(&fs::read_to_string(dir.join("world.geojson"))?)?;
        let view = MapView::new(raw)?;
        let plot_countries = view.plot_countries();
        let codes: Vec<String> = plot_countries.keys().cloned().collect();
        info!(countries = codes.len(), "loaded plot country set");

        let gdp_path = dir.join(&config.gdp.gdp_file);
        let by_name = MetricDataset::from_rows(
            &loader::load_nested(
                &gdp_path,
                &config.gdp.country_name,
                config.gdp.separator,
                config.gdp.quote,
            )?,
            &config.gdp,
        );
        let by_code = MetricDataset::from_rows(
            &loader::load_nested(
                &gdp_path,
                &config.gdp.country_code,
                config.gdp.separator,
                config.gdp.quote,
            )?,
            &config.gdp,
        );

        info!(by_name = by_name.len(), by_code = by_code.len(), "built metric datasets");

        let table = loader::load_flat(
            dir.join(&config.codes.code_file),
            &config.codes.plot_codes,
            &config.codes.data_codes,
            config.codes.separator,
            config.codes.quote,
        )?;
        let converter = CodeConverter::new(&table);

        let year = config.gdp.max_year;
        let mut state = Self {
            config,
            view,
            plot_countries,
            codes,
            selected: 0,
            mode: MatchMode::Code,
            year,
            values: MapValues::default(),
            info: String::new(),
            by_name,
            by_code,
            converter,
            matched: BTreeMap::new(),
        };
        state.recompute();
        Ok(state)
    }

    fn dataset(&self) -> &MetricDataset {
        match self.mode {
            MatchMode::Name => &self.by_name,
            MatchMode::Code => &self.by_code,
        }
    }

    /// Re-partitions the plot set for the current year and mode.
    fn recompute(&mut self) {
        let (matched, unmatched) = match self.mode {
            MatchMode::Name => {
                reconcile::reconcile_by_name(&self.plot_countries, &self.by_name)
            }
            MatchMode::Code => reconcile::reconcile_by_code(
                &self.plot_countries,
                &self.converter,
                &self.by_code,
            ),
        };
        self.values =
            plot_values::build_map_values(&matched, &unmatched, self.dataset(), self.year);
        self.matched = matched;
        self.info = format!(
            "GDP {} ({}) in log10 scale\n\n{} resolved\n{} unmatched\n{} without data\n\n{}",
            self.year,
            self.mode.label(),
            self.values.resolved.len(),
            self.values.unmatched.len(),
            self.values.no_data.len(),
            Self::HELP_TEXT,
        );
    }

    pub fn selected_code(&self) -> Option<&str> {
        self.codes.get(self.selected).map(String::as_str)
    }

    pub fn selected_name(&self) -> Option<&str> {
        self.selected_code()
            .and_then(|code| self.plot_countries.get(code))
            .map(String::as_str)
    }

    fn selected_record(&self) -> Option<&MetricRecord> {
        let code = self.selected_code()?;
        let key = self.matched.get(code)?;
        self.dataset().get(key)
    }

    /// (year, raw value) points of the selected country, for the chart.
    pub fn selected_series(&self) -> Vec<(i32, f64)> {
        self.selected_record()
            .map(|r| r.series_points())
            .unwrap_or_default()
    }

    /// Latest recorded (year, value) of the selected country.
    pub fn selected_latest(&self) -> Option<(i32, f64)> {
        self.selected_series().last().copied()
    }

    fn set_year(&mut self, year: i32) {
        let clamped = year.clamp(self.config.gdp.min_year, self.config.gdp.max_year);
        if clamped != self.year {
            self.year = clamped;
            self.recompute();
        }
    }

    /// Returns true when the app should exit.
    pub fn handle_input(&mut self, key: KeyCode) -> bool {
        use KeyCode::*;
        match key {
            Char('q') => return true,
            Left => self.set_year(self.year - 1),
            Right => self.set_year(self.year + 1),
            Char('[') | PageDown => self.set_year(self.year - 10),
            Char(']') | PageUp => self.set_year(self.year + 10),
            Char('m') => {
                self.mode = self.mode.toggled();
                self.recompute();
            }
            Up => {
                if self.selected > 0 {
                    self.selected -= 1;
                }
            }
            Down => {
                if self.selected + 1 < self.codes.len() {
                    self.selected += 1;
                }
            }
            _ => {}
        }
        false
    }
}
