//! Provider trait and the types that cross it.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;

use super::error::ProviderError;
use crate::coord::Coordinate;

/// Per-request options forwarded to the position provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderOptions {
    /// Ask for the most accurate fix the platform can produce.
    pub enable_high_accuracy: bool,
    /// Upper bound on a single one-shot request.
    pub timeout: Duration,
    /// Oldest cached fix the provider may return instead of taking a new one.
    pub maximum_age: Duration,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::from_secs(5),
        }
    }
}

/// Something pushed down a watch subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent {
    /// A new position sample.
    Sample(Coordinate),
    /// The platform reported a failure; the watch stays registered.
    Error(ProviderError),
}

/// Channel end a provider pushes watch events into.
pub type WatchSink = mpsc::UnboundedSender<WatchEvent>;

/// Identifies one continuous watch registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchHandle(u64);

impl WatchHandle {
    /// Wrap a provider-assigned watch id.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The provider-assigned watch id.
    pub const fn id(&self) -> u64 {
        self.0
    }
}

/// Source of position samples (the platform geolocation capability).
///
/// Implementations are treated as external, read-only resources. They must
/// not retry on their own; retry cadence belongs to the caller.
pub trait PositionProvider: Send + Sync + 'static {
    /// Fetch a single fix. Resolves at most once.
    fn get_once(
        &self,
        options: &ProviderOptions,
    ) -> impl Future<Output = Result<Coordinate, ProviderError>> + Send;

    /// Register a continuous subscription that pushes into `sink` until cancelled.
    fn watch(&self, options: &ProviderOptions, sink: WatchSink) -> WatchHandle;

    /// Stop delivering events for `handle`. Safe to call more than once.
    fn cancel(&self, handle: &WatchHandle);
}
