//! Tracking controller - keeps the current location fresh.
//!
//! The [`TrackingController`] owns the Idle/Tracking state machine and routes
//! every sample, whether it came from the refresh timer, the continuous
//! watch or a forced refresh, through the same [`UpdateGate`].
//!
//! # State Machine
//!
//! ```text
//!          start()                      stop()
//!   Idle ─────────► Tracking ───────────────────► Idle
//!     ▲   (forced refresh, arm timer, watch)        │
//!     └─────────────────────────────────────────────┘
//! ```
//!
//! # Serialization
//!
//! A `tokio::sync::Mutex<()>` marks an attempt in flight. Timer ticks and
//! watch samples use `try_lock` and are dropped when it is held; forced
//! refreshes wait for it, so they are serialized but never dropped. State
//! mutations happen under a `parking_lot::Mutex` and are never held across
//! an await.
//!
//! # Cancellation
//!
//! Each start creates a session `CancellationToken`. `stop()` cancels it and
//! the provider watch synchronously. Session install, teardown and the
//! `is_tracking` flag change together under the session lock. Non-forced attempts re-check the token
//! once they hold the in-flight guard, so no provider call is dispatched
//! after `stop()` returns. An attempt already past that check completes.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::options::TrackingOptions;
use super::state::{LocationUpdate, TrackingSnapshot};
use crate::coord::Coordinate;
use crate::gate::{GateDecision, TimingLedger, UpdateGate};
use crate::provider::{
    fetch_with_timeout, PositionProvider, ProviderError, WatchEvent, WatchHandle,
};
use crate::telemetry::{TrackerMetrics, TrackerMetricsSnapshot};

/// Capacity of the location update broadcast channel.
pub const UPDATE_CHANNEL_CAPACITY: usize = 16;

/// Registered downstream notification.
type LocationCallback = Arc<dyn Fn(Coordinate, f64) + Send + Sync>;

/// State mutated only by the controller.
struct Shared {
    snapshot: TrackingSnapshot,
    ledger: TimingLedger,
}

/// Resources armed by one `start()`.
struct Session {
    token: CancellationToken,
    watch: Option<WatchHandle>,
}

struct ControllerInner<P: PositionProvider> {
    provider: P,
    options: TrackingOptions,
    gate: UpdateGate,
    state: Mutex<Shared>,
    in_flight: tokio::sync::Mutex<()>,
    session: Mutex<Option<Session>>,
    callbacks: RwLock<Vec<LocationCallback>>,
    updates_tx: broadcast::Sender<LocationUpdate>,
    state_tx: watch::Sender<TrackingSnapshot>,
    metrics: TrackerMetrics,
}

/// Adaptive position-update scheduler.
///
/// Cloning yields another handle to the same controller. When the last
/// handle is dropped any running session is torn down.
///
/// # Example
///
/// ```
/// use geotrack::coord::Coordinate;
/// use geotrack::provider::SimulatedProvider;
/// use geotrack::tracking::{TrackingController, TrackingOptions};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let device = SimulatedProvider::at(Coordinate::new(25.0330, 121.5654));
/// let controller = TrackingController::new(device, TrackingOptions::default());
///
/// controller.start().await;
/// assert!(controller.is_tracking());
/// assert_eq!(controller.current_location(), Some(Coordinate::new(25.0330, 121.5654)));
///
/// controller.stop();
/// assert!(!controller.is_tracking());
/// # }
/// ```
pub struct TrackingController<P: PositionProvider> {
    inner: Arc<ControllerInner<P>>,
}

impl<P: PositionProvider> Clone for TrackingController<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: PositionProvider> std::fmt::Debug for TrackingController<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackingController")
            .field("options", &self.inner.options)
            .field("snapshot", &self.snapshot())
            .finish_non_exhaustive()
    }
}

impl<P: PositionProvider> TrackingController<P> {
    /// Create an idle controller using the default update gate.
    pub fn new(provider: P, options: TrackingOptions) -> Self {
        Self::with_gate(provider, options, UpdateGate::new())
    }

    /// Create an idle controller with a custom update gate.
    pub fn with_gate(provider: P, options: TrackingOptions, gate: UpdateGate) -> Self {
        let (updates_tx, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        let (state_tx, _) = watch::channel(TrackingSnapshot::default());

        Self {
            inner: Arc::new(ControllerInner {
                provider,
                options,
                gate,
                state: Mutex::new(Shared {
                    snapshot: TrackingSnapshot::default(),
                    ledger: TimingLedger::default(),
                }),
                in_flight: tokio::sync::Mutex::new(()),
                session: Mutex::new(None),
                callbacks: RwLock::new(Vec::new()),
                updates_tx,
                state_tx,
                metrics: TrackerMetrics::new(),
            }),
        }
    }

    /// Start tracking.
    ///
    /// No-op when already tracking. Otherwise resets the accumulated
    /// distance, clears the last error, performs a forced refresh and then
    /// arms the refresh timer and the continuous watch as configured.
    pub async fn start(&self) {
        let token = {
            let mut session = self.inner.session.lock();
            if session.is_some() {
                tracing::debug!("Tracking already active, start ignored");
                return;
            }
            let token = CancellationToken::new();
            *session = Some(Session {
                token: token.clone(),
                watch: None,
            });
            // Written under the session lock so a racing stop() lands after it
            self.inner.update_state(|s| {
                s.is_tracking = true;
                s.distance_moved_meters = 0.0;
                s.last_error = None;
            });
            token
        };

        let options = &self.inner.options;
        tracing::info!(
            update_interval_ms = options.update_interval.as_millis() as u64,
            min_distance_m = options.min_distance_threshold_m,
            periodic = options.enable_periodic_update,
            distance_tracking = options.enable_distance_tracking,
            "Location tracking started"
        );

        self.inner.refresh(true, None).await;

        if options.enable_periodic_update {
            if options.update_interval.is_zero() {
                tracing::warn!("Update interval is zero, periodic refresh disabled");
            } else if !token.is_cancelled() {
                spawn_timer(
                    Arc::downgrade(&self.inner),
                    token.clone(),
                    options.update_interval,
                );
            }
        }

        if options.enable_distance_tracking {
            let mut session = self.inner.session.lock();
            // stop() may have run while the initial fix was outstanding, and a
            // later start() may own the slot now. The token is cancelled under
            // this lock, so an uncancelled token means the session is ours.
            if token.is_cancelled() {
                return;
            }
            let Some(active) = session.as_mut() else {
                return;
            };

            let (tx, rx) = mpsc::unbounded_channel();
            let handle = self
                .inner
                .provider
                .watch(&options.provider_options(), tx);
            active.watch = Some(handle);
            drop(session);

            tracing::debug!(watch_id = handle.id(), "Position watch registered");
            spawn_watch_pump(Arc::downgrade(&self.inner), token, rx);
        }
    }

    /// Stop tracking.
    ///
    /// No-op when idle. Cancels the timer and the watch before returning;
    /// the last known location and accumulated distance stay visible.
    pub fn stop(&self) {
        if self.inner.end_session() {
            tracing::info!(
                distance_moved_m = self.distance_moved_meters(),
                "Location tracking stopped"
            );
        }
    }

    /// Fetch a fresh fix and accept it regardless of the throttles.
    ///
    /// Waits for any in-flight attempt first. Works whether or not tracking
    /// is active. Returns the resulting current location, which is the
    /// previous one if the fetch failed.
    pub async fn force_update(&self) -> Option<Coordinate> {
        self.inner.refresh(true, None).await
    }

    /// Register a downstream notification callback.
    ///
    /// Called with the accepted location and its distance delta whenever
    /// the callback throttle allows. Runs outside the state lock.
    pub fn on_location_update<F>(&self, callback: F)
    where
        F: Fn(Coordinate, f64) + Send + Sync + 'static,
    {
        self.inner.callbacks.write().push(Arc::new(callback));
    }

    /// Subscribe to fired location updates.
    pub fn subscribe(&self) -> broadcast::Receiver<LocationUpdate> {
        self.inner.updates_tx.subscribe()
    }

    /// Subscribe to every state change.
    pub fn subscribe_state(&self) -> watch::Receiver<TrackingSnapshot> {
        self.inner.state_tx.subscribe()
    }

    /// Copy of the current tracking state.
    pub fn snapshot(&self) -> TrackingSnapshot {
        self.inner.state.lock().snapshot.clone()
    }

    /// Most recently accepted location.
    pub fn current_location(&self) -> Option<Coordinate> {
        self.inner.current_location()
    }

    /// Accepted location before the current one.
    pub fn last_location(&self) -> Option<Coordinate> {
        self.inner.state.lock().snapshot.last_location
    }

    /// Whether tracking is active.
    pub fn is_tracking(&self) -> bool {
        self.inner.state.lock().snapshot.is_tracking
    }

    /// Distance accumulated from accepted samples since the last start.
    pub fn distance_moved_meters(&self) -> f64 {
        self.inner.state.lock().snapshot.distance_moved_meters
    }

    /// Most recent provider error, if any.
    pub fn last_error(&self) -> Option<ProviderError> {
        self.inner.state.lock().snapshot.last_error.clone()
    }

    /// Whether a one-shot fetch is outstanding.
    pub fn is_loading(&self) -> bool {
        self.inner.state.lock().snapshot.loading
    }

    /// Options this controller was built with.
    pub fn options(&self) -> &TrackingOptions {
        &self.inner.options
    }

    /// The underlying position provider.
    pub fn provider(&self) -> &P {
        &self.inner.provider
    }

    /// Counter snapshot.
    pub fn metrics(&self) -> TrackerMetricsSnapshot {
        self.inner.metrics.snapshot()
    }
}

impl<P: PositionProvider> ControllerInner<P> {
    fn current_location(&self) -> Option<Coordinate> {
        self.state.lock().snapshot.current_location
    }

    /// Fetch from the provider and gate the result.
    ///
    /// Non-forced attempts are dropped when another attempt is in flight or
    /// when `session` has been cancelled.
    async fn refresh(
        &self,
        forced: bool,
        session: Option<&CancellationToken>,
    ) -> Option<Coordinate> {
        let _guard = if forced {
            self.in_flight.lock().await
        } else {
            match self.in_flight.try_lock() {
                Ok(guard) => guard,
                Err(_) => {
                    self.metrics.attempt_dropped();
                    tracing::debug!("Refresh dropped, another update is in flight");
                    return None;
                }
            }
        };

        if session.is_some_and(CancellationToken::is_cancelled) {
            return None;
        }

        self.update_state(|s| s.loading = true);
        self.metrics.fetch_started();

        match fetch_with_timeout(&self.provider, &self.options.provider_options()).await {
            Ok(sample) => self.apply_sample(sample, forced),
            Err(error) => self.record_error(error),
        }

        self.current_location()
    }

    /// Gate a sample pushed by the continuous watch.
    fn on_watch_sample(&self, sample: Coordinate, session: &CancellationToken) {
        self.metrics.watch_sample();

        let Ok(_guard) = self.in_flight.try_lock() else {
            self.metrics.attempt_dropped();
            tracing::debug!(
                lat = sample.latitude,
                lon = sample.longitude,
                "Watch sample dropped, another update is in flight"
            );
            return;
        };

        if session.is_cancelled() {
            return;
        }

        self.apply_sample(sample, false);
    }

    /// Run the gate and commit its decision. Caller holds the in-flight guard.
    fn apply_sample(&self, sample: Coordinate, forced: bool) {
        let now = Instant::now();

        let decision = {
            let mut shared = self.state.lock();
            let decision = self.gate.decide(
                sample,
                shared.snapshot.current_location,
                &shared.ledger,
                &self.options,
                forced,
                now,
            );
            shared.ledger.record(&decision, now);

            let snapshot = &mut shared.snapshot;
            if decision.accept_sample {
                snapshot.last_location = snapshot.current_location;
                snapshot.current_location = Some(sample);
                snapshot.distance_moved_meters += decision.distance_delta;
            }
            snapshot.last_error = None;
            snapshot.loading = false;
            self.state_tx.send_replace(snapshot.clone());

            decision
        };

        self.metrics.decision(&decision);
        log_decision(sample, forced, &decision);

        if decision.fire_callback {
            self.notify(LocationUpdate {
                location: sample,
                distance_delta_meters: decision.distance_delta,
                forced,
            });
        }
    }

    fn record_error(&self, error: ProviderError) {
        tracing::warn!(error = %error, kind = error.kind(), "Position provider error");
        self.metrics.provider_error();
        self.update_state(|s| {
            s.last_error = Some(error);
            s.loading = false;
        });
    }

    fn notify(&self, update: LocationUpdate) {
        // No subscribers is fine
        let _ = self.updates_tx.send(update);

        let callbacks: Vec<LocationCallback> = self.callbacks.read().clone();
        for callback in callbacks {
            callback(update.location, update.distance_delta_meters);
        }
    }

    fn update_state(&self, f: impl FnOnce(&mut TrackingSnapshot)) {
        let mut shared = self.state.lock();
        f(&mut shared.snapshot);
        self.state_tx.send_replace(shared.snapshot.clone());
    }

    /// Cancel the session and its watch. Returns false when idle.
    fn end_session(&self) -> bool {
        let session = {
            let mut slot = self.session.lock();
            let Some(session) = slot.take() else {
                return false;
            };
            session.token.cancel();
            self.update_state(|s| s.is_tracking = false);
            session
        };

        if let Some(handle) = session.watch {
            self.provider.cancel(&handle);
            tracing::debug!(watch_id = handle.id(), "Position watch cancelled");
        }
        true
    }
}

impl<P: PositionProvider> Drop for ControllerInner<P> {
    fn drop(&mut self) {
        self.end_session();
    }
}

fn log_decision(sample: Coordinate, forced: bool, decision: &GateDecision) {
    match decision.reject_reason {
        None => tracing::debug!(
            lat = sample.latitude,
            lon = sample.longitude,
            distance_m = decision.distance_delta,
            forced,
            notify = decision.fire_callback,
            "Sample accepted"
        ),
        Some(reason) => tracing::debug!(
            lat = sample.latitude,
            lon = sample.longitude,
            distance_m = decision.distance_delta,
            reason = %reason,
            "Sample rejected"
        ),
    }
}

/// Refresh timer. First tick fires one period after arming.
fn spawn_timer<P: PositionProvider>(
    inner: Weak<ControllerInner<P>>,
    token: CancellationToken,
    period: Duration,
) {
    // Armed here so the first deadline does not depend on when the task is polled
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    let Some(inner) = inner.upgrade() else { break };
                    let token = token.clone();
                    // Each tick races independently so a slow fetch makes later ticks drop
                    tokio::spawn(async move {
                        inner.refresh(false, Some(&token)).await;
                    });
                }
            }
        }

        tracing::debug!("Refresh timer stopped");
    });
}

/// Forwards watch events into the controller until the session ends.
fn spawn_watch_pump<P: PositionProvider>(
    inner: Weak<ControllerInner<P>>,
    token: CancellationToken,
    mut rx: mpsc::UnboundedReceiver<WatchEvent>,
) {
    tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                event = rx.recv() => event,
            };

            let Some(event) = event else {
                tracing::debug!("Position watch closed by provider");
                break;
            };
            let Some(inner) = inner.upgrade() else { break };

            match event {
                WatchEvent::Sample(sample) => inner.on_watch_sample(sample, &token),
                WatchEvent::Error(error) => inner.record_error(error),
            }
        }

        tracing::debug!("Watch pump stopped");
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::destination;
    use crate::provider::SimulatedProvider;

    const TAIPEI: Coordinate = Coordinate::new(25.0330, 121.5654);

    fn options() -> TrackingOptions {
        TrackingOptions::default()
            .with_update_interval(Duration::from_secs(1))
            .with_maximum_age(Duration::ZERO)
    }

    fn controller(
        device: &SimulatedProvider,
        options: TrackingOptions,
    ) -> TrackingController<SimulatedProvider> {
        TrackingController::new(device.clone(), options)
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_controller_is_idle() {
        let device = SimulatedProvider::at(TAIPEI);
        let c = controller(&device, options());

        assert_eq!(c.snapshot(), TrackingSnapshot::default());
        assert_eq!(device.fetch_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_forces_initial_fix() {
        let device = SimulatedProvider::at(TAIPEI);
        let c = controller(&device, options());

        c.start().await;

        assert!(c.is_tracking());
        assert_eq!(c.current_location(), Some(TAIPEI));
        assert_eq!(c.last_location(), None);
        assert_eq!(c.distance_moved_meters(), 0.0);
        assert!(!c.is_loading());
        assert_eq!(device.fetch_count(), 1);
        assert_eq!(device.active_watches(), 1);
        c.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_is_idempotent() {
        let device = SimulatedProvider::at(TAIPEI);
        let c = controller(&device, options());

        c.start().await;
        c.start().await;

        assert_eq!(device.fetch_count(), 1);
        assert_eq!(device.active_watches(), 1);
        c.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_keeps_last_fix_and_is_idempotent() {
        let device = SimulatedProvider::at(TAIPEI);
        let c = controller(&device, options());

        c.start().await;
        c.stop();
        c.stop();

        assert!(!c.is_tracking());
        assert_eq!(c.current_location(), Some(TAIPEI));
        assert_eq!(device.active_watches(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_update_while_idle() {
        let device = SimulatedProvider::at(TAIPEI);
        let c = controller(&device, options());

        assert_eq!(c.force_update().await, Some(TAIPEI));
        assert!(!c.is_tracking());

        // Immediately again, same spot: still a provider call and an accept
        assert_eq!(c.force_update().await, Some(TAIPEI));
        assert_eq!(device.fetch_count(), 2);
        assert_eq!(c.metrics().samples_accepted, 2);
        assert_eq!(c.last_location(), Some(TAIPEI));
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_update_error_returns_previous() {
        let device = SimulatedProvider::at(TAIPEI);
        let c = controller(&device, options());

        c.force_update().await;
        device.push_error(ProviderError::PositionUnavailable("tunnel".into()));

        assert_eq!(c.force_update().await, Some(TAIPEI));
        assert!(matches!(
            c.last_error(),
            Some(ProviderError::PositionUnavailable(_))
        ));
        assert!(!c.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_update_error_without_fix_returns_none() {
        let device = SimulatedProvider::new();
        let c = controller(&device, options());

        assert_eq!(c.force_update().await, None);
        assert!(c.last_error().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_sample_clears_error() {
        let device = SimulatedProvider::at(TAIPEI);
        let c = controller(&device, options());

        device.push_error(ProviderError::Unknown("x".into()));
        c.force_update().await;
        assert!(c.last_error().is_some());

        c.force_update().await;
        assert!(c.last_error().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_refreshes_accept_once() {
        let device = SimulatedProvider::at(TAIPEI);
        let c = controller(&device, options());
        c.force_update().await;

        tokio::time::advance(Duration::from_secs(10)).await;
        let moved = device.move_by(0.0, 120.0).unwrap();
        device.set_latency(Duration::from_millis(500));

        let inner = &c.inner;
        let (a, b) = futures::join!(
            inner.refresh(false, None),
            inner.refresh(false, None)
        );

        // One completed, the other was dropped up front
        assert!(a.is_some() ^ b.is_some());
        assert_eq!(device.fetch_count(), 2);
        assert_eq!(c.current_location(), Some(moved));
        assert!((c.distance_moved_meters() - 120.0).abs() < 0.01);
        assert_eq!(c.metrics().attempts_dropped, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_sample_dropped_while_refresh_in_flight() {
        let device = SimulatedProvider::at(TAIPEI);
        let c = controller(&device, options());
        c.force_update().await;

        tokio::time::advance(Duration::from_secs(10)).await;
        device.set_latency(Duration::from_millis(500));
        let far = destination(TAIPEI, 90.0, 300.0);
        let token = CancellationToken::new();

        let inner = &c.inner;
        let refresh = inner.refresh(false, None);
        let sample = async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            inner.on_watch_sample(far, &token);
        };
        futures::join!(refresh, sample);

        // Device never moved, so the refresh saw TAIPEI and rejected it
        assert_eq!(c.current_location(), Some(TAIPEI));
        assert_eq!(c.distance_moved_meters(), 0.0);
        let metrics = c.metrics();
        assert_eq!(metrics.watch_samples, 1);
        assert_eq!(metrics.attempts_dropped, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_forced_waits_for_in_flight_refresh() {
        let device = SimulatedProvider::at(TAIPEI);
        let c = controller(&device, options());
        device.set_latency(Duration::from_millis(500));

        let inner = &c.inner;
        let (tick, forced) =
            futures::join!(inner.refresh(false, None), inner.refresh(true, None));

        assert_eq!(tick, Some(TAIPEI));
        assert_eq!(forced, Some(TAIPEI));
        assert_eq!(device.fetch_count(), 2);
        assert_eq!(c.metrics().attempts_dropped, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_session_skips_provider() {
        let device = SimulatedProvider::at(TAIPEI);
        let c = controller(&device, options());
        let token = CancellationToken::new();
        token.cancel();

        assert_eq!(c.inner.refresh(false, Some(&token)).await, None);
        assert_eq!(device.fetch_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_recorded() {
        let device = SimulatedProvider::at(TAIPEI);
        device.set_latency(Duration::from_secs(60));
        let c = controller(&device, options().with_timeout(Duration::from_secs(2)));

        assert_eq!(c.force_update().await, None);
        assert_eq!(
            c.last_error(),
            Some(ProviderError::Timeout(Duration::from_secs(2)))
        );
        assert!(!c.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_callback_and_broadcast() {
        let device = SimulatedProvider::at(TAIPEI);
        let c = controller(&device, options());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        c.on_location_update(move |location, delta| seen_clone.lock().push((location, delta)));
        let mut rx = c.subscribe();

        c.force_update().await;

        assert_eq!(seen.lock().as_slice(), &[(TAIPEI, 0.0)]);
        let update = rx.try_recv().unwrap();
        assert_eq!(update.location, TAIPEI);
        assert!(update.forced);
    }

    #[tokio::test(start_paused = true)]
    async fn test_state_subscription_sees_changes() {
        let device = SimulatedProvider::at(TAIPEI);
        let c = controller(&device, options());
        let mut rx = c.subscribe_state();

        c.start().await;
        assert!(rx.has_changed().unwrap());
        let snapshot = rx.borrow_and_update().clone();
        assert!(snapshot.is_tracking);
        assert_eq!(snapshot.current_location, Some(TAIPEI));

        c.stop();
        assert!(!rx.borrow_and_update().is_tracking);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_error_is_recorded_but_tracking_continues() {
        let device = SimulatedProvider::at(TAIPEI);
        let c = controller(&device, options().with_periodic_update(false));
        c.start().await;

        device.emit_watch_error(ProviderError::PermissionDenied);
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(c.last_error(), Some(ProviderError::PermissionDenied));
        assert!(c.is_tracking());
        assert_eq!(device.active_watches(), 1);
        c.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_controller_cancels_watch() {
        let device = SimulatedProvider::at(TAIPEI);
        let c = controller(&device, options());
        c.start().await;
        assert_eq!(device.active_watches(), 1);

        drop(c);
        assert_eq!(device.active_watches(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_resets_distance() {
        let device = SimulatedProvider::at(TAIPEI);
        let c = controller(&device, options().with_distance_tracking(false));
        c.start().await;

        device.move_by(0.0, 100.0);
        c.force_update().await;
        assert!(c.distance_moved_meters() > 99.0);

        c.stop();
        assert!(c.distance_moved_meters() > 99.0);

        c.start().await;
        // Restart forced the same spot again: zero movement
        assert_eq!(c.distance_moved_meters(), 0.0);
        c.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_during_initial_fix_arms_nothing() {
        let device = SimulatedProvider::at(TAIPEI);
        device.set_latency(Duration::from_millis(500));
        let c = controller(&device, options());

        let stopper = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            c.stop();
            assert!(!c.is_tracking());
        };
        futures::join!(c.start(), stopper);

        // The outstanding fix completes and is kept
        assert_eq!(c.current_location(), Some(TAIPEI));
        assert!(!c.is_tracking());
        assert_eq!(device.active_watches(), 0);
        assert!(c.inner.session.lock().is_none());

        // No timer was armed
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(device.fetch_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_during_initial_fix_keeps_one_watch() {
        let device = SimulatedProvider::at(TAIPEI);
        device.set_latency(Duration::from_millis(500));
        let c = controller(&device, options().with_periodic_update(false));

        let restarter = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            c.stop();
            c.start().await;
        };
        futures::join!(c.start(), restarter);

        assert!(c.is_tracking());
        assert_eq!(device.fetch_count(), 2);
        assert_eq!(device.active_watches(), 1);

        c.stop();
        assert_eq!(device.active_watches(), 0);
        assert!(!c.is_tracking());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_is_tracking_follows_session_under_concurrent_start_stop() {
        let device = SimulatedProvider::at(TAIPEI);
        let c = controller(&device, options());

        for _ in 0..200 {
            let starter = {
                let c = c.clone();
                tokio::spawn(async move { c.start().await })
            };
            let stopper = {
                let c = c.clone();
                tokio::spawn(async move { c.stop() })
            };
            starter.await.unwrap();
            stopper.await.unwrap();

            assert_eq!(c.is_tracking(), c.inner.session.lock().is_some());
            assert_eq!(c.subscribe_state().borrow().is_tracking, c.is_tracking());
            assert!(device.active_watches() <= 1);

            c.stop();
            assert!(!c.is_tracking());
            assert_eq!(device.active_watches(), 0);
        }
    }
}
