//! Geotrack - adaptive position-update scheduler
//!
//! Keeps a "current location" fresh from a periodic timer and a continuous
//! position watch, while bounding how often expensive downstream work
//! (reverse-geocoding, map API calls) is triggered.
//!
//! # Modules
//!
//! - [`coord`] - `Coordinate` and haversine distance
//! - [`provider`] - `PositionProvider` trait, error taxonomy, simulated device
//! - [`gate`] - `UpdateGate`, the two-tier accept/notify throttle
//! - [`tracking`] - `TrackingController`, options and observable state
//! - [`telemetry`] - lock-free tracker counters
//! - [`config`] - INI configuration file
//! - [`logging`] - tracing subscriber setup

pub mod config;
pub mod coord;
pub mod gate;
pub mod logging;
pub mod provider;
pub mod telemetry;
pub mod tracking;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
