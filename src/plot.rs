//! Declarative plot descriptions handed to a render dispatcher.
//!
//! A `PlotSpec` says what to draw, never how. Missing values stay `None` so
//! a renderer can leave a gap instead of drawing a zero.

use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlotSpec {
    pub traces: Vec<Trace>,
    pub layout: Layout,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Trace {
    Line(LineTrace),
    Bar(BarTrace),
    Scatter(ScatterTrace),
    Choropleth(ChoroplethTrace),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LineTrace {
    pub name: String,
    pub x: Vec<f64>,
    pub y: Vec<Option<f64>>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BarTrace {
    pub name: String,
    pub x: Vec<String>,
    pub y: Vec<Option<f64>>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScatterTrace {
    pub name: String,
    pub text: Vec<String>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub marker_size: Vec<Option<f64>>,
    pub marker_color: Vec<Option<f64>>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChoroplethTrace {
    pub name: String,
    /// Country display names, resolved to regions by the renderer.
    pub locations: Vec<String>,
    pub z: Vec<Option<f64>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BarMode {
    Group,
    Stack,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bar_mode: Option<BarMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Layout {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn axes(mut self, x: impl Into<String>, y: impl Into<String>) -> Self {
        self.x_title = Some(x.into());
        self.y_title = Some(y.into());
        self
    }
}

impl PlotSpec {
    pub fn line_traces(&self) -> impl Iterator<Item = &LineTrace> {
        self.traces.iter().filter_map(|t| match t {
            Trace::Line(l) => Some(l),
            _ => None,
        })
    }

    pub fn bar_traces(&self) -> impl Iterator<Item = &BarTrace> {
        self.traces.iter().filter_map(|t| match t {
            Trace::Bar(b) => Some(b),
            _ => None,
        })
    }

    pub fn scatter_traces(&self) -> impl Iterator<Item = &ScatterTrace> {
        self.traces.iter().filter_map(|t| match t {
            Trace::Scatter(s) => Some(s),
            _ => None,
        })
    }

    pub fn choropleth_traces(&self) -> impl Iterator<Item = &ChoroplethTrace> {
        self.traces.iter().filter_map(|t| match t {
            Trace::Choropleth(c) => Some(c),
            _ => None,
        })
    }
}
