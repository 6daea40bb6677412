//! Limit-switch homing
//!
//! Establishes the tick-origin for an axis by driving it in reverse until
//! its limit switch triggers, then recording the encoder reading taken
//! right after the stop as the zero reference.

use super::axis::{validate_speed, AxisController};
use crate::drivers::LimitSwitch;
use crate::error::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Drives one axis against its limit switch to establish the tick-origin
///
/// The switch is polled every control tick; while it reads untriggered the
/// motor gets one reverse command per tick. There is deliberately no
/// timeout: a switch that never triggers keeps the sequence polling
/// forever, exactly as the original machine behaves.
pub struct HomingSequence {
    speed: u8,
    poll_interval: Duration,
}

impl HomingSequence {
    /// Create a homing sequence
    ///
    /// The speed is validated up front; no motor command is issued for an
    /// out-of-range value.
    pub fn new(speed: u8, poll_interval: Duration) -> Result<Self> {
        validate_speed(speed)?;
        Ok(Self {
            speed,
            poll_interval,
        })
    }

    /// Home `axis` against `switch`, returning the recorded raw origin
    ///
    /// On a switch read failure the motor is stopped before the error
    /// propagates. `shutdown` (typically wired to SIGINT) aborts the
    /// sequence with the motor stopped and [`Error::Interrupted`]; it is
    /// the only way out of a homing run whose switch never triggers. The
    /// origin is the raw folded encoder reading taken immediately after
    /// the stop command.
    pub fn run(
        &self,
        axis: &mut AxisController,
        switch: &mut dyn LimitSwitch,
        shutdown: &AtomicBool,
    ) -> Result<i64> {
        log::info!(
            "HomingSequence: Homing {} axis in reverse at {}%",
            axis.axis(),
            self.speed
        );

        loop {
            if shutdown.load(Ordering::Relaxed) {
                log::info!("HomingSequence: Interrupted, stopping {} axis", axis.axis());
                axis.halt();
                return Err(Error::Interrupted);
            }

            let triggered = match switch.is_triggered() {
                Ok(triggered) => triggered,
                Err(e) => {
                    log::error!("HomingSequence: Switch read failed, stopping: {}", e);
                    axis.halt();
                    return Err(e);
                }
            };
            if triggered {
                break;
            }

            axis.command_reverse(self.speed)?;
            thread::sleep(self.poll_interval);
        }

        axis.command_stop()?;
        let origin = axis.read_absolute()?;
        axis.set_origin(origin);

        log::info!(
            "HomingSequence: {} axis homed, origin at raw tick {}",
            axis.axis(),
            origin
        );
        Ok(origin)
    }
}
