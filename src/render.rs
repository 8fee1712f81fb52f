//! The boundary between the dashboard core and whatever draws the plots.

use std::io::Write;

use log::warn;
use serde::Serialize;
use serde_json::json;

use crate::plot::PlotSpec;

/// A named drawing area of the dashboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Surface {
    #[serde(rename = "lineChart")]
    Trend,
    #[serde(rename = "choroplethMap")]
    Choropleth,
    #[serde(rename = "barChart")]
    Ranking,
    #[serde(rename = "scatterPlot")]
    Correlation,
}

impl Surface {
    pub const ALL: [Surface; 4] = [
        Surface::Trend,
        Surface::Choropleth,
        Surface::Ranking,
        Surface::Correlation,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Surface::Trend => "lineChart",
            Surface::Choropleth => "choroplethMap",
            Surface::Ranking => "barChart",
            Surface::Correlation => "scatterPlot",
        }
    }
}

pub trait RenderDispatcher {
    /// Draws `spec` into `surface`, replacing what was there.
    fn render(&mut self, surface: Surface, spec: &PlotSpec);

    /// Replaces the content of `surface` with a status message
    /// (loading, no data).
    fn show_message(&mut self, surface: Surface, message: &str);
}

impl<T: RenderDispatcher + ?Sized> RenderDispatcher for &mut T {
    fn render(&mut self, surface: Surface, spec: &PlotSpec) {
        (**self).render(surface, spec)
    }

    fn show_message(&mut self, surface: Surface, message: &str) {
        (**self).show_message(surface, message)
    }
}

/// Writes one JSON object per render call.
pub struct JsonLinesDispatcher<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesDispatcher<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, value: serde_json::Value) {
        let res = serde_json::to_writer(&mut self.out, &value)
            .map_err(std::io::Error::from)
            .and_then(|_| writeln!(self.out));
        if let Err(e) = res {
            warn!("JsonLinesDispatcher: could not write output: {}", e);
        }
    }
}

impl<W: Write> RenderDispatcher for JsonLinesDispatcher<W> {
    fn render(&mut self, surface: Surface, spec: &PlotSpec) {
        self.emit(json!({ "surface": surface, "spec": spec }));
    }

    fn show_message(&mut self, surface: Surface, message: &str) {
        self.emit(json!({ "surface": surface, "message": message }));
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RenderCall {
    Plot(Surface, PlotSpec),
    Message(Surface, String),
}

/// Keeps every call it receives.
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    pub calls: Vec<RenderCall>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last spec drawn into `surface`.
    pub fn latest(&self, surface: Surface) -> Option<&PlotSpec> {
        self.calls.iter().rev().find_map(|c| match c {
            RenderCall::Plot(s, spec) if *s == surface => Some(spec),
            _ => None,
        })
    }

    pub fn plot_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, RenderCall::Plot(..)))
            .count()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl RenderDispatcher for RecordingDispatcher {
    fn render(&mut self, surface: Surface, spec: &PlotSpec) {
        self.calls.push(RenderCall::Plot(surface, spec.clone()));
    }

    fn show_message(&mut self, surface: Surface, message: &str) {
        self.calls
            .push(RenderCall::Message(surface, message.to_string()));
    }
}
