use std::{collections::HashMap, fs, path::Path, str::FromStr};

use geo::{Geometry, MultiPolygon, Polygon};
use geojson::GeoJson;
use log::{debug, info};
use ratatui::layout::Rect as TuiRect;
use ratatui::symbols::Marker;
use ratatui::widgets::canvas::{Canvas, Line};
use ratatui::widgets::{Block, Borders};
use ratatui::{style::Color, Frame};

/// Approximate planar area of a polygon (shoelace formula).
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

/// Red (low) through yellow to green (high) for a value in `[0, 1]`.
pub fn ramp(t: f64) -> Color {
    let t = t.clamp(0.0, 1.0);
    let (r, g) = if t < 0.5 {
        (255.0, 510.0 * t)
    } else {
        (510.0 * (1.0 - t), 255.0)
    };
    Color::Rgb(r as u8, g as u8, 60)
}

/// Country outlines ready to be painted as a choropleth.
pub struct MapView {
    items: Vec<(String, MultiPolygon<f64>)>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

impl MapView {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let txt = fs::read_to_string(path.as_ref())?;
        let view = Self::new(GeoJson::from_str(&txt)?)?;
        info!(
            "MapView: {} outlines from {}",
            view.feature_count(),
            path.as_ref().display()
        );
        Ok(view)
    }

    pub fn new(raw: GeoJson) -> Result<Self, Box<dyn std::error::Error>> {
        let mut items = Vec::new();

        if let GeoJson::FeatureCollection(fc) = raw {
            for feature in fc.features {
                let name = feature
                    .properties
                    .as_ref()
                    .and_then(|p| {
                        ["ADMIN", "name", "NAME"]
                            .iter()
                            .find_map(|key| p.get(*key).and_then(|v| v.as_str()))
                    })
                    .unwrap_or("")
                    .to_string();

                if let Some(gj) = feature.geometry {
                    let geom: Geometry<f64> = gj.value.try_into()?;
                    let mut mp = match geom {
                        Geometry::Polygon(p) => p.into(),
                        Geometry::MultiPolygon(m) => m,
                        _ => continue,
                    };

                    // Drop islands under a fifth of the largest part.
                    if mp.0.len() > 1 {
                        let areas: Vec<f64> = mp.0.iter().map(poly_area).collect();
                        let threshold = areas.iter().cloned().fold(0.0, f64::max) * 0.20;
                        let kept: Vec<Polygon<f64>> = mp
                            .0
                            .iter()
                            .zip(areas.iter())
                            .filter(|(_, area)| **area >= threshold)
                            .map(|(poly, _)| poly.clone())
                            .collect();
                        if !kept.is_empty() {
                            mp = MultiPolygon(kept);
                        }
                    }

                    items.push((name, mp));
                }
            }
        }

        let (mut minx, mut miny, mut maxx, mut maxy) = (
            f64::INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::NEG_INFINITY,
        );
        for (_, mp) in &items {
            for poly in &mp.0 {
                for coord in poly.exterior().0.iter() {
                    minx = minx.min(coord.x);
                    miny = miny.min(coord.y);
                    maxx = maxx.max(coord.x);
                    maxy = maxy.max(coord.y);
                }
            }
        }

        Ok(Self {
            items,
            x_bounds: [minx, maxx],
            y_bounds: [miny, maxy],
        })
    }

    pub fn feature_count(&self) -> usize {
        self.items.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|(name, _)| name.as_str())
    }

    /// Colour of every outline for `values` (country name to value), scaled
    /// between the smallest and largest value. Unknown countries are grey.
    pub fn colours(&self, values: &HashMap<String, f64>) -> Vec<Color> {
        let lookup: HashMap<String, f64> = values
            .iter()
            .map(|(k, v)| (k.to_lowercase(), *v))
            .collect();
        let lo = lookup.values().cloned().fold(f64::INFINITY, f64::min);
        let hi = lookup.values().cloned().fold(f64::NEG_INFINITY, f64::max);
        let span = if hi > lo { hi - lo } else { 1.0 };

        self.items
            .iter()
            .map(|(name, _)| match lookup.get(&name.to_lowercase()) {
                Some(v) => ramp((v - lo) / span),
                None => Color::DarkGray,
            })
            .collect()
    }

    /// Paints every outline in the colour of its value, then the
    /// `highlight`ed countries on top in white.
    pub fn render(
        &self,
        f: &mut Frame,
        area: TuiRect,
        title: &str,
        values: &HashMap<String, f64>,
        highlight: &[String],
    ) {
        let colours = self.colours(values);
        debug!("MapView::render: {} values", values.len());
        let canvas = Canvas::default()
            .block(Block::default().title(title.to_string()).borders(Borders::ALL))
            .marker(Marker::Braille)
            .x_bounds(self.x_bounds)
            .y_bounds(self.y_bounds)
            .paint(|ctx| {
                let mut draw = |mp: &MultiPolygon<f64>, color: Color| {
                    for poly in &mp.0 {
                        for window in poly.exterior().0.windows(2) {
                            let (a, b) = (window[0], window[1]);
                            ctx.draw(&Line::new(a.x, a.y, b.x, b.y, color));
                        }
                    }
                };
                for ((_, mp), colour) in self.items.iter().zip(colours.iter()) {
                    draw(mp, *colour);
                }
                for (name, mp) in &self.items {
                    if highlight.iter().any(|h| h.eq_ignore_ascii_case(name)) {
                        draw(mp, Color::White);
                    }
                }
            });
        f.render_widget(canvas, area);
    }
}
