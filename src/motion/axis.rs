//! Closed-loop axis controller
//!
//! One controller per physical axis. Each control tick reads the absolute
//! encoder position and commands the motor toward the target with a plain
//! bang-bang law: forward above the tolerance band, reverse below it, stop
//! inside it. The live encoder reading is the sole source of truth; no
//! predicted position is ever trusted over it.

use crate::drivers::{
    Axis, CommandedDirection, DirectionIndicator, EncoderSource, MotorDriver,
};
use crate::error::{Error, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Controller phase for the current target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisPhase {
    /// No target set
    #[default]
    Idle,
    /// Driving toward the target
    Approaching,
    /// Within the tolerance band; polls are no-ops until a new target
    Settled,
}

/// Validate a drive speed (percent of rated drive)
///
/// Rejected before any motor command is issued.
pub fn validate_speed(speed: u8) -> Result<()> {
    if speed == 0 || speed > 100 {
        return Err(Error::InvalidSpeed(speed));
    }
    Ok(())
}

/// Closed-loop controller for a single axis
///
/// Exclusively owns its motor and indicator; shares the encoder source
/// read-only with the other axis. The motor is stopped when the controller
/// is dropped, whatever state it was in.
pub struct AxisController {
    axis: Axis,
    motor: Box<dyn MotorDriver>,
    encoder: Arc<dyn EncoderSource>,
    indicator: Box<dyn DirectionIndicator>,
    speed: u8,
    tolerance: i64,
    poll_interval: Duration,
    /// Tick-origin established by homing; positions are relative to it
    origin: i64,
    target: i64,
    phase: AxisPhase,
    commanded: CommandedDirection,
    last_progress_log: Option<Instant>,
}

impl AxisController {
    /// Create a controller
    ///
    /// # Arguments
    /// * `axis` - which half of the encoder reading this controller owns
    /// * `motor` - exclusively owned motor capability
    /// * `encoder` - shared read-only position source
    /// * `indicator` - direction indicator outputs for this axis
    /// * `speed` - drive speed in percent, must be in 1..=100
    /// * `tolerance` - tick distance below which the axis counts as arrived
    /// * `poll_interval` - sleep between control ticks
    pub fn new(
        axis: Axis,
        motor: Box<dyn MotorDriver>,
        encoder: Arc<dyn EncoderSource>,
        indicator: Box<dyn DirectionIndicator>,
        speed: u8,
        tolerance: u32,
        poll_interval: Duration,
    ) -> Result<Self> {
        validate_speed(speed)?;
        if tolerance == 0 {
            return Err(Error::InvalidParameter(
                "tolerance must be at least one tick".to_string(),
            ));
        }

        log::debug!(
            "AxisController: {} initialized, speed={}%, tolerance={} ticks",
            axis,
            speed,
            tolerance
        );

        Ok(Self {
            axis,
            motor,
            encoder,
            indicator,
            speed,
            tolerance: i64::from(tolerance),
            poll_interval,
            origin: 0,
            target: 0,
            phase: AxisPhase::Idle,
            commanded: CommandedDirection::None,
            last_progress_log: None,
        })
    }

    /// Which axis this controller drives
    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Current controller phase
    pub fn phase(&self) -> AxisPhase {
        self.phase
    }

    /// Configured poll interval
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Set a new absolute tick target (relative to the homed origin)
    pub fn set_target(&mut self, target: i64) {
        log::debug!("AxisController: {} new target {}", self.axis, target);
        self.target = target;
        self.phase = AxisPhase::Approaching;
        self.last_progress_log = None;
    }

    /// Current position relative to the homed origin
    pub fn current_position(&self) -> Result<i64> {
        Ok(self.read_absolute()? - self.origin)
    }

    /// Raw folded encoder reading for this axis, ignoring the origin
    pub(crate) fn read_absolute(&self) -> Result<i64> {
        Ok(self.encoder.read()?.axis(self.axis))
    }

    /// Take the current reading as the zero reference
    ///
    /// For axes without a limit switch, where the mechanical zero is
    /// assumed by convention at startup.
    pub fn home_in_place(&mut self) -> Result<i64> {
        let origin = self.read_absolute()?;
        self.set_origin(origin);
        Ok(origin)
    }

    /// Record a raw reading as the new zero reference
    pub(crate) fn set_origin(&mut self, origin: i64) {
        log::info!("AxisController: {} origin set to raw tick {}", self.axis, origin);
        self.origin = origin;
    }

    /// Drive in reverse without a target (homing only)
    pub(crate) fn command_reverse(&mut self, speed: u8) -> Result<()> {
        if let Err(e) = self.motor.reverse(speed) {
            self.halt();
            return Err(e);
        }
        self.commanded = CommandedDirection::Negative;
        self.indicator.set_direction(CommandedDirection::Negative);
        Ok(())
    }

    /// Stop the motor and clear the commanded direction
    pub(crate) fn command_stop(&mut self) -> Result<()> {
        self.motor.stop()?;
        self.commanded = CommandedDirection::None;
        self.indicator.set_direction(CommandedDirection::None);
        Ok(())
    }

    /// One control tick: read, decide, command
    ///
    /// No-op once settled (the controller does not hunt around the band)
    /// and when idle. On an encoder failure the motor is stopped before
    /// the error propagates.
    pub fn poll(&mut self) -> Result<AxisPhase> {
        if self.phase != AxisPhase::Approaching {
            return Ok(self.phase);
        }

        let current = match self.current_position() {
            Ok(position) => position,
            Err(e) => {
                log::error!("AxisController: {} encoder read failed, stopping: {}", self.axis, e);
                self.halt();
                return Err(e);
            }
        };

        let error = self.target - current;
        self.log_progress(current, error);

        if error.abs() <= self.tolerance {
            // Only stop a motor we actually started: a controller that
            // begins inside the band issues no commands at all.
            if self.commanded != CommandedDirection::None {
                if let Err(e) = self.motor.stop() {
                    self.halt();
                    return Err(e);
                }
            }
            self.commanded = CommandedDirection::None;
            self.indicator.set_direction(CommandedDirection::None);
            self.phase = AxisPhase::Settled;
            log::debug!(
                "AxisController: {} settled at {} (target {}, error {})",
                self.axis,
                current,
                self.target,
                error
            );
        } else if error > 0 {
            if let Err(e) = self.motor.forward(self.speed) {
                self.halt();
                return Err(e);
            }
            self.commanded = CommandedDirection::Positive;
            self.indicator.set_direction(CommandedDirection::Positive);
        } else {
            if let Err(e) = self.motor.reverse(self.speed) {
                self.halt();
                return Err(e);
            }
            self.commanded = CommandedDirection::Negative;
            self.indicator.set_direction(CommandedDirection::Negative);
        }

        Ok(self.phase)
    }

    /// Stop the motor unconditionally and clear direction state
    ///
    /// Used on error and abort paths; a failing stop is logged, not
    /// propagated, so halting can never itself abort a shutdown.
    pub fn halt(&mut self) {
        if let Err(e) = self.motor.stop() {
            log::warn!("AxisController: {} stop failed during halt: {}", self.axis, e);
        }
        self.commanded = CommandedDirection::None;
        self.indicator.set_direction(CommandedDirection::None);
        if self.phase == AxisPhase::Approaching {
            self.phase = AxisPhase::Idle;
        }
    }

    fn log_progress(&mut self, current: i64, error: i64) {
        let due = match self.last_progress_log {
            Some(last) => last.elapsed() >= Duration::from_secs(1),
            None => true,
        };
        if due {
            log::debug!(
                "AxisController: {} at {} -> {} (error {})",
                self.axis,
                current,
                self.target,
                error
            );
            self.last_progress_log = Some(Instant::now());
        }
    }
}

impl Drop for AxisController {
    fn drop(&mut self) {
        // Guaranteed-stop contract: the motor is released stopped on every
        // exit path, including panics and error unwinds.
        if let Err(e) = self.motor.stop() {
            log::warn!("AxisController: {} stop on drop failed: {}", self.axis, e);
        }
    }
}
