//! PV production forecast engine.
//!
//! Computes an hourly 7-day DC power forecast for a fixed solar array from
//! clear-sky irradiance and cloud-cover forecasts, and serves it over HTTP.

pub mod api;
pub mod config;
pub mod controller;
pub mod domain;
pub mod forecast;
pub mod solar;
pub mod telemetry;
