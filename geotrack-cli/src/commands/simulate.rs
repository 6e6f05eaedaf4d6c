//! Simulate command - run a tracking session against a moving device.
//!
//! The simulated device advances along a fixed heading once per second while
//! a [`TrackingController`] samples it with the configured timer and watch.
//! Every fired location update is printed as it happens, followed by a
//! session summary. Ctrl+C ends the session early.

use std::path::{Path, PathBuf};
use std::time::Duration;

use geotrack::logging::{default_log_dir, default_log_file, init_logging};
use geotrack::provider::SimulatedProvider;
use geotrack::telemetry::TrackerMetricsSnapshot;
use geotrack::tracking::{LocationUpdate, TrackingController, TrackingOptions, TrackingSnapshot};
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::common::{load_options, parse_coordinate};
use crate::error::CliError;

/// How often the simulated device moves.
const MOVE_STEP: Duration = Duration::from_secs(1);

/// Arguments for the simulate command.
pub struct SimulateArgs {
    pub config: Option<PathBuf>,
    pub duration_secs: u64,
    pub speed_mps: f64,
    pub heading: f64,
    pub start_lat: f64,
    pub start_lon: f64,
    pub interval_ms: Option<u64>,
    pub json: bool,
}

/// Run the simulate command.
pub fn run(args: SimulateArgs) -> Result<(), CliError> {
    let start = parse_coordinate(args.start_lat, args.start_lon)?;

    if !args.speed_mps.is_finite() || args.speed_mps < 0.0 {
        return Err(CliError::InvalidArgument(format!(
            "speed must be a non-negative number, got {}",
            args.speed_mps
        )));
    }
    if !args.heading.is_finite() {
        return Err(CliError::InvalidArgument(format!(
            "heading must be a number, got {}",
            args.heading
        )));
    }

    let mut options = load_options(args.config.as_deref())?;
    if let Some(interval_ms) = args.interval_ms {
        if interval_ms == 0 {
            return Err(CliError::InvalidArgument(
                "interval must be greater than 0 ms".to_string(),
            ));
        }
        options = options.with_update_interval(Duration::from_millis(interval_ms));
    }

    let _logging = init_logging(Path::new(default_log_dir()), default_log_file())
        .map_err(|e| CliError::LoggingInit(e.to_string()))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    // Set up signal handler for graceful shutdown
    let shutdown = CancellationToken::new();
    let shutdown_clone = shutdown.clone();
    ctrlc::set_handler(move || {
        shutdown_clone.cancel();
    })
    .map_err(|e| CliError::Signal(e.to_string()))?;

    if !args.json {
        println!("Geotrack Simulation v{}", geotrack::VERSION);
        println!("=========================");
        println!();
        println!("Start:     {}", start);
        println!(
            "Movement:  {:.1} m/s heading {:.0}°",
            args.speed_mps, args.heading
        );
        println!(
            "Interval:  {} ms (threshold {} m)",
            options.update_interval.as_millis(),
            options.min_distance_threshold_m
        );
        println!("Duration:  {} s", args.duration_secs);
        println!();
        println!("Press Ctrl+C to stop early");
        println!();
    }

    let device = SimulatedProvider::at(start);
    let (snapshot, metrics) = runtime.block_on(simulate(device, options, &args, shutdown))?;

    print_summary(&snapshot, &metrics, args.json)
}

/// Drive the device and the controller until the duration elapses or shutdown.
async fn simulate(
    device: SimulatedProvider,
    options: TrackingOptions,
    args: &SimulateArgs,
    shutdown: CancellationToken,
) -> Result<(TrackingSnapshot, TrackerMetricsSnapshot), CliError> {
    let controller = TrackingController::new(device.clone(), options);
    let mut updates = controller.subscribe();
    let started = Instant::now();

    controller.start().await;

    let deadline = tokio::time::sleep(Duration::from_secs(args.duration_secs));
    tokio::pin!(deadline);

    let mut mover = tokio::time::interval_at(started + MOVE_STEP, MOVE_STEP);
    mover.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let step_m = args.speed_mps * MOVE_STEP.as_secs_f64();

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                tracing::info!("Received shutdown signal");
                break;
            }
            _ = &mut deadline => break,
            update = updates.recv() => match update {
                Ok(update) => print_update(&update, started.elapsed(), args.json)?,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Update printer fell behind");
                }
                Err(RecvError::Closed) => break,
            },
            _ = mover.tick() => {
                device.move_by(args.heading, step_m);
            }
        }
    }

    controller.stop();

    // Updates fired before stop() are still buffered
    while let Ok(update) = updates.try_recv() {
        print_update(&update, started.elapsed(), args.json)?;
    }

    Ok((controller.snapshot(), controller.metrics()))
}

fn print_update(update: &LocationUpdate, elapsed: Duration, json: bool) -> Result<(), CliError> {
    if json {
        let line = serde_json::json!({
            "type": "update",
            "elapsed_ms": elapsed.as_millis() as u64,
            "update": update,
        });
        println!("{}", serde_json::to_string(&line)?);
    } else {
        println!(
            "[{:>7.1}s] {}  +{:.1} m{}",
            elapsed.as_secs_f64(),
            update.location,
            update.distance_delta_meters,
            if update.forced { "  (forced)" } else { "" }
        );
    }
    Ok(())
}

fn print_summary(
    snapshot: &TrackingSnapshot,
    metrics: &TrackerMetricsSnapshot,
    json: bool,
) -> Result<(), CliError> {
    if json {
        let line = serde_json::json!({
            "type": "summary",
            "snapshot": snapshot,
            "metrics": metrics,
        });
        println!("{}", serde_json::to_string(&line)?);
        return Ok(());
    }

    println!();
    println!("Session Summary");
    println!("───────────────");
    match snapshot.current_location {
        Some(location) => println!("  Final location:  {}", location),
        None => println!("  Final location:  (no fix)"),
    }
    println!("  Distance moved:  {:.1} m", snapshot.distance_moved_meters);
    println!(
        "  Samples:         {} accepted, {} rejected ({:.0}% accepted)",
        metrics.samples_accepted,
        metrics.samples_rejected,
        metrics.acceptance_rate() * 100.0
    );
    println!(
        "  Provider:        {} fetches, {} watch samples, {} errors",
        metrics.provider_fetches, metrics.watch_samples, metrics.provider_errors
    );
    println!("  Updates fired:   {}", metrics.callbacks_fired);
    println!("  Dropped (busy):  {}", metrics.attempts_dropped);
    if let Some(error) = &snapshot.last_error {
        println!("  Last error:      {}", error);
    }

    Ok(())
}
