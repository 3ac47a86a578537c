use geo::{Geometry, MultiPolygon, Polygon};
use geojson::GeoJson;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::widgets::canvas::{Canvas, Context, Line};
use ratatui::widgets::{Block, Borders};
use ratatui::Frame;

use crate::error::AtlasError;
use crate::plot_values::MapValues;
use crate::reconcile::PlotCountries;

/// Flat-plane polygon area by the shoelace formula, for fragment filtering.
fn poly_area(poly: &Polygon<f64>) -> f64 {
    let coords = &poly.exterior().0;
    let mut sum = 0.0;
    for window in coords.windows(2) {
        let a = window[0];
        let b = window[1];
        sum += a.x * b.y - b.x * a.y;
    }
    (sum * 0.5).abs()
}

/// Resolved values map onto this ramp, low to high.
const VALUE_RAMP: [Color; 6] = [
    Color::Blue,
    Color::LightBlue,
    Color::Cyan,
    Color::Green,
    Color::Yellow,
    Color::LightRed,
];

pub const UNMATCHED_COLOR: Color = Color::DarkGray;
pub const NO_DATA_COLOR: Color = Color::Gray;

fn ramp_color(t: f64) -> Color {
    let idx = (t.clamp(0.0, 1.0) * (VALUE_RAMP.len() - 1) as f64).round() as usize;
    VALUE_RAMP[idx]
}

struct Country {
    code: String,
    name: String,
    shape: MultiPolygon<f64>,
}

/// World geometry, colored per country from a `MapValues` partition.
pub struct MapView {
    items: Vec<Country>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

impl MapView {
    pub fn new(raw: GeoJson) -> Result<Self, AtlasError> {
        let mut items = Vec::new();

        if let GeoJson::FeatureCollection(fc) = raw {
            for feature in fc.features {
                let prop = |key: &str| {
                    feature
                        .properties
                        .as_ref()
                        .and_then(|p| p.get(key).and_then(|v| v.as_str()))
                        .unwrap_or("")
                        .to_string()
                };
                let name = prop("ADMIN");
                let code = prop("ISO_A2");
                // features without a usable cartographic code cannot be keyed
                if code.is_empty() || code == "-99" {
                    continue;
                }

                if let Some(gj) = feature.geometry {
                    let geom: Geometry<f64> = gj.value.try_into()?;
                    let mut mp = match geom {
                        Geometry::Polygon(p) => p.into(),
                        Geometry::MultiPolygon(m) => m,
                        _ => continue,
                    };

                    // drop tiny fragments when a country has many parts
                    if mp.0.len() > 1 {
                        let orig: Vec<Polygon<f64>> = mp.0.clone();
                        let areas: Vec<f64> = orig.iter().map(poly_area).collect();
                        let max_area =
                            areas.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                        let threshold = max_area * 0.20;
                        let filtered: Vec<Polygon<f64>> = orig
                            .into_iter()
                            .zip(areas)
                            .filter(|(_, area)| *area >= threshold)
                            .map(|(poly, _)| poly)
                            .collect();
                        if !filtered.is_empty() {
                            mp = MultiPolygon(filtered);
                        }
                    }

                    items.push(Country { code, name, shape: mp });
                }
            }
        }

        let (mut minx, mut miny, mut maxx, mut maxy) =
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
        for country in &items {
            for poly in &country.shape.0 {
                for coord in poly
                    .exterior()
                    .0
                    .iter()
                    .chain(poly.interiors().iter().flat_map(|r| r.0.iter()))
                {
                    minx = minx.min(coord.x);
                    miny = miny.min(coord.y);
                    maxx = maxx.max(coord.x);
                    maxy = maxy.max(coord.y);
                }
            }
        }

        Ok(Self { items, x_bounds: [minx, maxx], y_bounds: [miny, maxy] })
    }

    /// The plot country set: cartographic code → display name, one entry
    /// per drawable country.
    pub fn plot_countries(&self) -> PlotCountries {
        self.items
            .iter()
            .map(|c| (c.code.clone(), c.name.clone()))
            .collect()
    }

    pub fn feature_count(&self) -> usize {
        self.items.len()
    }

    fn country_color(values: &MapValues, bounds: Option<(f64, f64)>, code: &str) -> Color {
        if let Some(&v) = values.resolved.get(code) {
            let t = match bounds {
                Some((lo, hi)) if hi > lo => (v - lo) / (hi - lo),
                _ => 1.0,
            };
            ramp_color(t)
        } else if values.no_data.contains(code) {
            NO_DATA_COLOR
        } else {
            UNMATCHED_COLOR
        }
    }

    fn draw_shape(ctx: &mut Context, shape: &MultiPolygon<f64>, color: Color) {
        for poly in &shape.0 {
            for window in poly.exterior().0.windows(2) {
                let a = window[0];
                let b = window[1];
                ctx.draw(&Line { x1: a.x, y1: a.y, x2: b.x, y2: b.y, color });
            }
            if let (Some(first), Some(last)) =
                (poly.exterior().0.first(), poly.exterior().0.last())
            {
                ctx.draw(&Line {
                    x1: last.x,
                    y1: last.y,
                    x2: first.x,
                    y2: first.y,
                    color,
                });
            }
        }
    }

    /// Draws every country in its partition color, then repaints the
    /// highlighted one in white so it stays visible over the ramp.
    pub fn render(
        &self,
        f: &mut Frame,
        area: Rect,
        title: &str,
        values: &MapValues,
        highlight: Option<&str>,
    ) {
        let bounds = values.resolved_bounds();
        let canvas = Canvas::default()
            .block(Block::default().title(title.to_string()).borders(Borders::ALL))
            .x_bounds(self.x_bounds)
            .y_bounds(self.y_bounds)
            .paint(|ctx| {
                for country in &self.items {
                    let color = Self::country_color(values, bounds, &country.code);
                    Self::draw_shape(ctx, &country.shape, color);
                }

                if let Some(sel) = highlight {
                    for country in &self.items {
                        if country.code == sel {
                            Self::draw_shape(ctx, &country.shape, Color::White);
                        }
                    }
                }
            });
        f.render_widget(canvas, area);
    }
}
