//! Position providers.
//!
//! A [`PositionProvider`] wraps the platform's one-shot and continuous
//! position APIs and reports failures through the [`ProviderError`]
//! taxonomy. Providers never retry; that is left to the tracking controller.
//!
//! # Architecture
//!
//! ```text
//! TrackingController ──get_once──► PositionProvider ──► Coordinate | ProviderError
//!         ▲                              │
//!         └──── WatchEvent (mpsc) ◄──watch┘
//! ```
//!
//! [`fetch_with_timeout`] enforces `timeout` on every one-shot request, so a
//! provider that ignores the option still cannot stall the controller.

mod error;
mod simulated;
mod types;

pub use error::ProviderError;
pub use simulated::SimulatedProvider;
pub use types::{PositionProvider, ProviderOptions, WatchEvent, WatchHandle, WatchSink};

use crate::coord::Coordinate;

/// Run a one-shot fetch bounded by `options.timeout`.
///
/// An elapsed deadline is reported as [`ProviderError::Timeout`].
pub async fn fetch_with_timeout<P: PositionProvider>(
    provider: &P,
    options: &ProviderOptions,
) -> Result<Coordinate, ProviderError> {
    match tokio::time::timeout(options.timeout, provider.get_once(options)).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout(options.timeout)),
    }
}
