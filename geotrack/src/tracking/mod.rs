//! Location tracking.
//!
//! Keeps a "current location" fresh from two independent trigger sources
//! (a refresh timer and a continuous provider watch) while bounding the
//! rate of downstream notifications.
//!
//! # Architecture
//!
//! ```text
//!  refresh timer ──► get_once ──┐
//!                               ├──► in-flight guard ──► UpdateGate ──► TrackingSnapshot
//!  provider watch ──► sample ───┘          ▲                   │
//!                                          │                   └──► LocationUpdate
//!  force_update() ──► get_once ────────────┘ (waits)                 (broadcast + callbacks)
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let controller = TrackingController::new(provider, TrackingOptions::default());
//! controller.on_location_update(|location, delta_m| {
//!     // reverse-geocode, call a map API, ...
//! });
//!
//! controller.start().await;
//! let snapshot = controller.snapshot();
//! controller.stop();
//! ```

mod controller;
mod options;
mod state;

pub use controller::{TrackingController, UPDATE_CHANNEL_CAPACITY};
pub use options::{
    TrackingOptions, DEFAULT_MAXIMUM_AGE, DEFAULT_MIN_DISTANCE_THRESHOLD_M, DEFAULT_TIMEOUT,
    DEFAULT_UPDATE_INTERVAL,
};
pub use state::{LocationUpdate, TrackingSnapshot};
