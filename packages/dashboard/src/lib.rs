#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Interactive arrest dashboard core.
//!
//! Wires the dataset, the analytics pipeline, and a [`ChartRenderer`]
//! together behind a [`ViewController`] that turns UI events into chart
//! updates.

pub mod config;
pub mod controller;
pub mod render;
pub mod titles;

pub use config::{AppConfig, ConfigError, DashboardSettings};
pub use controller::{
    ChartOutput, ControllerError, ControllerState, DashboardUpdate, FilterSelection, UiEvent,
    ViewController,
};
pub use render::{ChartRenderer, ChartSpec, JsonChartRenderer};
