//! YantraMotion daemon
//!
//! Loads the plotter configuration, homes the slider axis against its
//! limit switch, plans the demo path (extend to half radius, then a
//! hexagon drawn by rotating a unit polar delta) and executes it with one
//! closed-loop controller per axis.
//!
//! Every motor is guaranteed a final `stop()` on all exit paths: the
//! controllers stop their motors on drop, and SIGINT flips a shutdown
//! flag that the control loops observe.

use std::env;
use std::f64::consts::FRAC_PI_3;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use yantra_motion::config::{AppConfig, IndicatorPins};
use yantra_motion::coords::{Cartesian, Polar};
use yantra_motion::devices::sysfs::{
    SysfsEncoder, SysfsIndicator, SysfsLimitSwitch, SysfsMotor,
};
use yantra_motion::drivers::{Axis, DirectionIndicator, EncoderSource, NullIndicator};
use yantra_motion::error::{Error, Result};
use yantra_motion::motion::{AxisController, HomingSequence, MotionExecutor};
use yantra_motion::planner::{PathPlanner, TickTarget};

/// Parse config path from command line arguments.
///
/// Supports:
/// - `yantra-motion <path>` (positional)
/// - `yantra-motion --config <path>` (flag-based)
/// - `yantra-motion -c <path>` (short flag)
///
/// Defaults to `/etc/yantra-motion.toml` if not specified.
fn parse_config_path() -> String {
    let args: Vec<String> = env::args().collect();

    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }

    if args.len() > 1 && !args[1].starts_with('-') {
        return args[1].clone();
    }

    "/etc/yantra-motion.toml".to_string()
}

fn indicator(pins: &Option<IndicatorPins>) -> Box<dyn DirectionIndicator> {
    match pins {
        Some(pins) => Box::new(SysfsIndicator::new(&pins.positive, &pins.negative)),
        None => Box::new(NullIndicator),
    }
}

fn main() -> Result<()> {
    let config_path = parse_config_path();
    let config = AppConfig::from_file(&config_path)?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(&config.logging.level),
    )
    .init();

    log::info!("YantraMotion v0.1.0 starting...");
    log::info!("Using config: {}", config_path);

    // Shutdown flag, flipped by SIGINT. The control loops poll it and the
    // controllers stop their motors on the way out.
    let shutdown = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        handler_flag.store(true, Ordering::Relaxed);
    })
    .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    // Hardware capabilities
    let encoder: Arc<dyn EncoderSource> =
        Arc::new(SysfsEncoder::new(&config.hardware.encoder_path));
    let mut limit_switch = SysfsLimitSwitch::new(
        &config.hardware.limit_switch_path,
        config.hardware.switch_active_low,
    );

    let poll_interval = config.control.poll_interval();
    let mut spinner = AxisController::new(
        Axis::Spinner,
        Box::new(SysfsMotor::new(
            &config.hardware.spinner_motor,
            config.hardware.pwm_period_ns,
        )),
        Arc::clone(&encoder),
        indicator(&config.hardware.spinner_indicator),
        config.control.spinner_speed,
        config.control.tolerance_ticks,
        poll_interval,
    )?;
    let mut slider = AxisController::new(
        Axis::Slider,
        Box::new(SysfsMotor::new(
            &config.hardware.slider_motor,
            config.hardware.pwm_period_ns,
        )),
        Arc::clone(&encoder),
        indicator(&config.hardware.slider_indicator),
        config.control.slider_speed,
        config.control.tolerance_ticks,
        poll_interval,
    )?;

    // Home the slider against its limit switch. The spinner has no switch:
    // the arm is assumed to point east (positive x, zero rotation) at
    // startup, so its current reading becomes its origin.
    let homing = HomingSequence::new(config.control.homing_speed, poll_interval)?;
    match homing.run(&mut slider, &mut limit_switch, &shutdown) {
        Ok(_) => {}
        Err(Error::Interrupted) => {
            log::info!("YantraMotion: Homing interrupted, motors stopped");
            return Ok(());
        }
        Err(e) => return Err(e),
    }
    spinner.home_in_place()?;

    // Demo path: extend to half radius, then draw a hexagon by rotating a
    // unit-radius delta a sixth of a turn at a time. One edge crosses the
    // +/-pi seam, which the planner turns into a long-way rotation; that
    // is the machine's documented behavior.
    let calibration = &config.calibration;
    let start = Cartesian::new(calibration.radius_min_mm, 0.0).to_polar();
    let mut planner = PathPlanner::new(
        calibration.angle_per_tick(),
        calibration.radius_per_tick(),
        start,
        TickTarget::default(),
    );

    let extended = Cartesian::new(calibration.radius_max_mm / 2.0, 0.0).to_polar();
    planner.append_waypoint(extended);

    let delta = Polar::new(1.0, FRAC_PI_3);
    let mut position = extended;
    for _ in 0..6 {
        position = position.cmul(delta);
        planner.append_waypoint(position);
    }
    let plan = planner.into_plan();

    let mut executor = MotionExecutor::new(spinner, slider);
    match executor.execute(&plan, &shutdown) {
        Ok(()) => log::info!("YantraMotion: Path complete"),
        Err(Error::Interrupted) => log::info!("YantraMotion: Motion interrupted, motors stopped"),
        Err(e) => {
            log::error!("YantraMotion: Motion failed: {}", e);
            return Err(e);
        }
    }

    log::info!("YantraMotion stopped");
    Ok(())
}
