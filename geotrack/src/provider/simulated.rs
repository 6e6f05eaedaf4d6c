//! In-process simulated position device.
//!
//! Used by the CLI `simulate` command and throughout the tests. It behaves
//! like a platform geolocation API: one-shot fetches honour `maximum_age`
//! with a cached fix, watches receive every position change, and failures
//! can be scripted.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use super::error::ProviderError;
use super::types::{PositionProvider, ProviderOptions, WatchEvent, WatchHandle, WatchSink};
use crate::coord::{destination, Coordinate};

#[derive(Debug)]
struct SimState {
    /// True device position.
    position: Option<Coordinate>,
    /// Last fix handed out, used to satisfy `maximum_age`.
    last_fix: Option<(Coordinate, Instant)>,
    /// Errors returned by upcoming one-shot fetches, oldest first.
    scripted_errors: VecDeque<ProviderError>,
    permission_denied: bool,
    latency: Duration,
    fetch_count: u64,
    watches: HashMap<u64, WatchSink>,
    next_watch_id: u64,
}

/// Simulated geolocation device.
///
/// Cloning yields another handle to the same device.
#[derive(Debug, Clone)]
pub struct SimulatedProvider {
    state: Arc<Mutex<SimState>>,
}

impl Default for SimulatedProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedProvider {
    /// Create a device with no fix yet.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                position: None,
                last_fix: None,
                scripted_errors: VecDeque::new(),
                permission_denied: false,
                latency: Duration::ZERO,
                fetch_count: 0,
                watches: HashMap::new(),
                next_watch_id: 1,
            })),
        }
    }

    /// Create a device already located at `position`.
    pub fn at(position: Coordinate) -> Self {
        let provider = Self::new();
        provider.state.lock().position = Some(position);
        provider
    }

    /// Move the device and notify every live watch.
    pub fn set_position(&self, position: Coordinate) {
        let mut state = self.state.lock();
        state.position = Some(position);

        let event = if state.permission_denied {
            WatchEvent::Error(ProviderError::PermissionDenied)
        } else {
            WatchEvent::Sample(position)
        };

        // Receivers that went away are pruned
        state
            .watches
            .retain(|_, sink| sink.send(event.clone()).is_ok());

        if !state.permission_denied && !state.watches.is_empty() {
            state.last_fix = Some((position, Instant::now()));
        }
    }

    /// Move the device `meters` along `bearing_deg` from its current position.
    ///
    /// Returns the new position, or `None` if the device has no position yet.
    pub fn move_by(&self, bearing_deg: f64, meters: f64) -> Option<Coordinate> {
        let current = self.state.lock().position?;
        let next = destination(current, bearing_deg, meters);
        self.set_position(next);
        Some(next)
    }

    /// Push an error to every live watch without moving the device.
    pub fn emit_watch_error(&self, error: ProviderError) {
        let mut state = self.state.lock();
        state
            .watches
            .retain(|_, sink| sink.send(WatchEvent::Error(error.clone())).is_ok());
    }

    /// Queue an error for the next one-shot fetch.
    pub fn push_error(&self, error: ProviderError) {
        self.state.lock().scripted_errors.push_back(error);
    }

    /// Deny or grant location permission.
    pub fn set_permission_denied(&self, denied: bool) {
        self.state.lock().permission_denied = denied;
    }

    /// Delay applied to every one-shot fetch.
    pub fn set_latency(&self, latency: Duration) {
        self.state.lock().latency = latency;
    }

    /// Current true position of the device.
    pub fn position(&self) -> Option<Coordinate> {
        self.state.lock().position
    }

    /// Number of one-shot fetches started so far.
    pub fn fetch_count(&self) -> u64 {
        self.state.lock().fetch_count
    }

    /// Number of watches currently registered.
    pub fn active_watches(&self) -> usize {
        self.state.lock().watches.len()
    }
}

impl PositionProvider for SimulatedProvider {
    fn get_once(
        &self,
        options: &ProviderOptions,
    ) -> impl Future<Output = Result<Coordinate, ProviderError>> + Send {
        let state = Arc::clone(&self.state);
        let maximum_age = options.maximum_age;

        async move {
            let latency = {
                let mut s = state.lock();
                s.fetch_count += 1;
                s.latency
            };

            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }

            let mut s = state.lock();
            if let Some(err) = s.scripted_errors.pop_front() {
                return Err(err);
            }
            if s.permission_denied {
                return Err(ProviderError::PermissionDenied);
            }

            let now = Instant::now();
            if let Some((fix, taken_at)) = s.last_fix {
                if now.saturating_duration_since(taken_at) < maximum_age {
                    return Ok(fix);
                }
            }

            let position = s
                .position
                .ok_or_else(|| ProviderError::PositionUnavailable("no fix acquired".into()))?;
            s.last_fix = Some((position, now));
            Ok(position)
        }
    }

    fn watch(&self, _options: &ProviderOptions, sink: WatchSink) -> WatchHandle {
        let mut state = self.state.lock();
        let id = state.next_watch_id;
        state.next_watch_id += 1;

        if state.permission_denied {
            let _ = sink.send(WatchEvent::Error(ProviderError::PermissionDenied));
        }

        state.watches.insert(id, sink);
        tracing::debug!(watch_id = id, "Simulated watch registered");
        WatchHandle::new(id)
    }

    fn cancel(&self, handle: &WatchHandle) {
        if self.state.lock().watches.remove(&handle.id()).is_some() {
            tracing::debug!(watch_id = handle.id(), "Simulated watch cancelled");
        }
    }
}
