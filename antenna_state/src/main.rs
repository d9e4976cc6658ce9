//! # Tracker Simulator
//!
//! Drives one [`StateStore`] from simulated subsystems: control loop,
//! fieldbus, GPS poller, calibration engine, parameter persistence and an
//! operator script. Stops on Ctrl-C or after `--duration-ms` and logs the
//! final telemetry view as JSON.

use antenna::config::{LogLevel, StateStoreConfig, StoreSettings};
use antenna::state::{Axis, CalibrationKind, ControlMode, MotorId};
use antenna_state::{
    AttitudeFeedback, AttitudeSetpoint, CalibrationRequest, CalibrationSample, CommandFlags,
    EncoderData, GpsData, GroupUpdate, MotorOutput, Owner, StateError, StateStore,
    TemperatureData, TimeData, TomlParameterFile, UtcTime, init_tracing,
};
use clap::Parser;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Antenna tracker state store simulator
#[derive(Parser, Debug)]
#[command(name = "tracker_sim")]
#[command(version)]
#[command(about = "Exercise the shared state store with simulated subsystems")]
struct Args {
    /// Path to configuration TOML. Built-in defaults when omitted.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Stop after this many milliseconds (0 runs until Ctrl-C).
    #[arg(long, default_value_t = 5_000)]
    duration_ms: u64,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    let config = match args.config.as_deref().map(StateStoreConfig::load_validated) {
        Some(Ok(config)) => Some(config),
        Some(Err(e)) => {
            init_tracing(LogLevel::Info, args.json);
            error!("FATAL: {e}");
            process::exit(1);
        }
        None => None,
    };

    let level = match (&config, args.verbose) {
        (_, true) => LogLevel::Debug,
        (Some(c), false) => c.shared.log_level,
        (None, false) => LogLevel::Info,
    };
    init_tracing(level, args.json);

    info!("tracker_sim v{} starting...", env!("CARGO_PKG_VERSION"));

    let settings = config.map(|c| c.store).unwrap_or_default();
    if let Err(e) = run(&args, settings) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("tracker_sim shutdown complete");
}

fn run(args: &Args, settings: StoreSettings) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(StateStore::new(settings));
    let running = Arc::new(AtomicBool::new(true));

    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    let workers = [
        spawn("control_loop", &store, &running, control_loop),
        spawn("fieldbus", &store, &running, fieldbus),
        spawn("gps", &store, &running, gps),
        spawn("calibration", &store, &running, calibration),
        spawn("persistence", &store, &running, persistence),
        spawn("operator", &store, &running, operator),
    ];

    let started = Instant::now();
    let limit = (args.duration_ms > 0).then(|| Duration::from_millis(args.duration_ms));
    while running.load(Ordering::Relaxed) {
        if limit.is_some_and(|l| started.elapsed() >= l) {
            running.store(false, Ordering::SeqCst);
            break;
        }
        thread::sleep(Duration::from_millis(10));
    }

    for worker in workers {
        let name = worker.thread().name().unwrap_or("worker").to_owned();
        match worker.join() {
            Ok(Ok(())) => debug!("{name} stopped"),
            Ok(Err(e)) => warn!("{name} stopped with error: {e}"),
            Err(_) => error!("{name} panicked"),
        }
    }

    let view = store.reader().view();
    info!("final telemetry: {}", view.to_json()?);
    Ok(())
}

type Worker = thread::JoinHandle<Result<(), StateError>>;

fn spawn(
    name: &str,
    store: &Arc<StateStore>,
    running: &Arc<AtomicBool>,
    body: fn(&StateStore, &AtomicBool) -> Result<(), StateError>,
) -> Worker {
    let store = Arc::clone(store);
    let running = Arc::clone(running);
    thread::Builder::new()
        .name(name.to_owned())
        .spawn(move || body(&store, &running))
        .unwrap_or_else(|e| {
            error!("FATAL: cannot spawn {name}: {e}");
            process::exit(1)
        })
}

/// Transient write failures are logged and the cycle continues.
fn tolerate<T>(result: Result<T, StateError>) -> Result<(), StateError> {
    match result {
        Ok(_) => Ok(()),
        Err(e @ (StateError::WriteTimeout { .. } | StateError::InvariantViolation(_))) => {
            debug!("cycle write skipped: {e}");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

// ─── Subsystems ─────────────────────────────────────────────────────

fn control_loop(store: &StateStore, running: &AtomicBool) -> Result<(), StateError> {
    const GAIN: f64 = 0.05;
    let period = store.settings().control_cycle();
    let origin = Instant::now();

    while running.load(Ordering::Relaxed) {
        let cycle_start = Instant::now();

        if let Err(e) = store.process_arm_commands(Owner::ControlLoop) {
            warn!("arm command refused: {e}");
        }
        tolerate(store.clear_fatal_error(Owner::ControlLoop))?;

        tolerate(store.select_control_mode(Owner::ControlLoop))?;

        let snap = store.read_snapshot();
        let mode = snap.system.status.control_mode;

        let dt = period.as_secs_f64();
        let mut tx = store.transaction(Owner::ControlLoop);
        for axis in Axis::ALL {
            let att = snap.attitude[axis];
            let error = att.angle_desired - att.angle;
            let (rate, drive) = if snap.system.status.arm_status
                && mode == ControlMode::Position
                && !snap.system.request.stop_flag
            {
                let rate = (error * GAIN / dt).clamp(-10.0, 10.0);
                (rate, (error * GAIN).clamp(-1.0, 1.0) as f32)
            } else {
                (0.0, 0.0)
            };
            tx.stage(GroupUpdate::AttitudeFeedback(
                axis,
                AttitudeFeedback {
                    angle: att.angle + rate * dt,
                    rate,
                },
            ))?;
            let master = match axis {
                Axis::Azimuth => MotorId::AzimuthMaster,
                Axis::Elevation => MotorId::ElevationMaster,
            };
            tx.stage(GroupUpdate::MotorOutput(
                master,
                MotorOutput {
                    primary: drive,
                    secondary: 0.0,
                },
            ))?;
        }
        tx.stage(GroupUpdate::Time(TimeData {
            timestamp_us: origin.elapsed().as_micros() as u64,
            loop_duration_us: cycle_start.elapsed().as_micros() as u64,
        }))?;
        tolerate(tx.commit())?;

        thread::sleep(period.saturating_sub(cycle_start.elapsed()));
    }
    Ok(())
}

fn fieldbus(store: &StateStore, running: &AtomicBool) -> Result<(), StateError> {
    const STEPS_PER_DEG: f64 = 1000.0;
    let period = store.settings().fieldbus_cycle();

    while running.load(Ordering::Relaxed) {
        let snap = store.read_snapshot();
        let mut tx = store.transaction(Owner::Fieldbus);
        for axis in Axis::ALL {
            let angle = snap.attitude[axis].angle;
            let encoder = EncoderData::next_sample(
                &snap.encoders[axis],
                (angle.rem_euclid(360.0) * STEPS_PER_DEG) as u32,
                angle,
                angle,
                period.as_secs_f64(),
            );
            tx.stage(GroupUpdate::Encoder(axis, encoder))?;
        }
        for id in MotorId::ALL {
            let current = snap.motors[id].output.primary.abs() * 4.0;
            tx.stage(GroupUpdate::MotorCurrent(id, current))?;
        }
        tx.stage(GroupUpdate::Temperature(TemperatureData {
            cpu_c: 48.5,
            external_c: 21.0,
        }))?;
        tolerate(tx.commit())?;

        thread::sleep(period);
    }
    Ok(())
}

fn gps(store: &StateStore, running: &AtomicBool) -> Result<(), StateError> {
    let mut second = 0u8;
    while running.load(Ordering::Relaxed) {
        let fix = GpsData {
            utc: UtcTime {
                year: 2026,
                month: 1,
                day: 1,
                hour: 12,
                minute: 0,
                second,
            },
            fix: true,
            connected: true,
            latitude: 52.2297,
            longitude: 21.0122,
            altitude: 110.0,
            sync: true,
        };
        tolerate(store.write_group(Owner::Gps, GroupUpdate::Gps(fix)))?;
        second = (second + 1) % 60;
        thread::sleep(Duration::from_millis(200));
    }
    Ok(())
}

fn calibration(store: &StateStore, running: &AtomicBool) -> Result<(), StateError> {
    while running.load(Ordering::Relaxed) {
        let outcome = store.process_calibration(Owner::Calibration);
        match outcome {
            Ok(o) if o.added > 0 || o.resets > 0 => {
                info!(added = o.added, resets = o.resets, "calibration inputs applied");
            }
            other => tolerate(other)?,
        }
        thread::sleep(Duration::from_millis(50));
    }
    Ok(())
}

fn persistence(store: &StateStore, running: &AtomicBool) -> Result<(), StateError> {
    let mut file = TomlParameterFile::new(store.settings().parameter_file.clone());
    while running.load(Ordering::Relaxed) {
        match store.service_parameter_commands(Owner::Persistence, &mut file) {
            Ok(_) => {}
            Err(e) if e.is_transient() => debug!("parameter command retried: {e}"),
            Err(e) => {
                warn!("parameter command failed: {e}");
                tolerate(store.raise_alarm(Owner::Persistence, &format!("parameter storage: {e}")))?;
            }
        }
        thread::sleep(Duration::from_millis(100));
    }
    Ok(())
}

fn operator(store: &StateStore, running: &AtomicBool) -> Result<(), StateError> {
    let pause = |ms| thread::sleep(Duration::from_millis(ms));

    store.request_control_mode(Owner::Hmi, "POS")?;
    for (axis, angle) in [(Axis::Azimuth, 45.0), (Axis::Elevation, 30.0)] {
        store.write_group(
            Owner::Hmi,
            GroupUpdate::AttitudeSetpoint(
                axis,
                AttitudeSetpoint {
                    angle,
                    rate: 0.0,
                    direct: 0.0,
                },
            ),
        )?;
    }
    store.issue_command(Owner::Hmi, CommandFlags::ARM)?;
    pause(200);

    store.write_group(
        Owner::RestApi,
        GroupUpdate::CalibrationRequest(CalibrationRequest {
            enabled: true,
            kind: CalibrationKind::Offline,
            freedom_mode: 2,
        }),
    )?;
    pause(100);
    for i in 0..3u8 {
        if !running.load(Ordering::Relaxed) {
            return Ok(());
        }
        let offset = f64::from(i);
        store.submit_calibration_sample(
            Owner::RestApi,
            CalibrationSample::from_array([10.0 + offset, 20.0, 10.2 + offset, 20.1]),
        )?;
        pause(20);
    }
    pause(200);
    store.issue_command(Owner::RestApi, CommandFlags::SAVE_PARAMS)?;
    Ok(())
}
