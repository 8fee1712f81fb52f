//! World Happiness Report dashboard: yearly CSV releases normalized into one
//! dataset, four linked views recomputed on every filter change, drawn in
//! the terminal or dumped as JSON.

pub mod app;
pub mod args;
pub mod config;
pub mod data;
pub mod map_draw;
pub mod plot;
pub mod regression;
pub mod render;
pub mod schema;
pub mod state;
pub mod ui;
pub mod views;
