//! Plan execution across both axes
//!
//! Waypoints are strictly sequential: the executor drives both axis
//! controllers concurrently toward one [`TickTarget`] and advances only
//! after both have settled. There is no pipelining or lookahead.

use super::axis::{AxisController, AxisPhase};
use crate::error::{Error, Result};
use crate::planner::{Plan, TickTarget};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

/// Sequences a [`Plan`] through the two axis controllers
pub struct MotionExecutor {
    spinner: AxisController,
    slider: AxisController,
}

impl MotionExecutor {
    /// Create an executor owning both controllers
    ///
    /// Speeds were already validated when the controllers were built, so
    /// execution can never issue a command with an out-of-range speed.
    pub fn new(spinner: AxisController, slider: AxisController) -> Self {
        Self { spinner, slider }
    }

    /// Execute every waypoint in order
    ///
    /// Within a waypoint the two axis loops run on scoped threads and the
    /// join is the both-settled barrier. A failed encoder read on either
    /// axis aborts the traversal with both motors stopped; `shutdown`
    /// (typically wired to SIGINT) aborts the same way with
    /// [`Error::Interrupted`]. There is no resume of a partial plan.
    pub fn execute(&mut self, plan: &Plan, shutdown: &AtomicBool) -> Result<()> {
        log::info!("MotionExecutor: Executing plan with {} waypoints", plan.len());

        for (index, target) in plan.iter().enumerate() {
            if shutdown.load(Ordering::Relaxed) {
                self.halt_both();
                return Err(Error::Interrupted);
            }

            log::debug!(
                "MotionExecutor: Waypoint {}/{} -> ({}, {})",
                index + 1,
                plan.len(),
                target.spinner_ticks,
                target.slider_ticks
            );

            if let Err(e) = self.run_waypoint(*target, shutdown) {
                self.halt_both();
                log::error!("MotionExecutor: Aborted at waypoint {}: {}", index + 1, e);
                return Err(e);
            }
        }

        log::info!("MotionExecutor: Plan complete");
        Ok(())
    }

    fn run_waypoint(&mut self, target: TickTarget, shutdown: &AtomicBool) -> Result<()> {
        self.spinner.set_target(target.spinner_ticks);
        self.slider.set_target(target.slider_ticks);

        // Either axis failing flips the abort flag so its peer stops
        // instead of chasing a target during a fault.
        let abort = AtomicBool::new(false);
        let spinner = &mut self.spinner;
        let slider = &mut self.slider;

        let (spinner_result, slider_result) = thread::scope(|scope| {
            let abort = &abort;
            let spinner_handle = thread::Builder::new()
                .name("axis-spinner".to_string())
                .spawn_scoped(scope, move || run_axis(spinner, abort, shutdown))
                .map_err(|e| Error::Other(format!("Failed to spawn spinner thread: {}", e)));
            let slider_handle = thread::Builder::new()
                .name("axis-slider".to_string())
                .spawn_scoped(scope, move || run_axis(slider, abort, shutdown))
                .map_err(|e| Error::Other(format!("Failed to spawn slider thread: {}", e)));

            let spinner_result = match spinner_handle {
                Ok(handle) => handle
                    .join()
                    .unwrap_or_else(|_| Err(Error::Other("spinner axis thread panicked".to_string()))),
                Err(e) => Err(e),
            };
            let slider_result = match slider_handle {
                Ok(handle) => handle
                    .join()
                    .unwrap_or_else(|_| Err(Error::Other("slider axis thread panicked".to_string()))),
                Err(e) => Err(e),
            };
            (spinner_result, slider_result)
        });

        // Prefer the root-cause error over the peer's Interrupted echo.
        match (spinner_result, slider_result) {
            (Ok(()), Ok(())) => Ok(()),
            (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
            (Err(a), Err(b)) => {
                if matches!(a, Error::Interrupted) {
                    Err(b)
                } else {
                    Err(a)
                }
            }
        }
    }

    fn halt_both(&mut self) {
        self.spinner.halt();
        self.slider.halt();
    }
}

/// Control loop for one axis: poll until settled, sleeping the configured
/// interval between ticks
fn run_axis(ctrl: &mut AxisController, abort: &AtomicBool, shutdown: &AtomicBool) -> Result<()> {
    loop {
        if shutdown.load(Ordering::Relaxed) || abort.load(Ordering::Relaxed) {
            ctrl.halt();
            return Err(Error::Interrupted);
        }

        match ctrl.poll() {
            Ok(AxisPhase::Settled) | Ok(AxisPhase::Idle) => return Ok(()),
            Ok(AxisPhase::Approaching) => thread::sleep(ctrl.poll_interval()),
            Err(e) => {
                // poll() already stopped this motor; flag the peer down too
                abort.store(true, Ordering::Relaxed);
                return Err(e);
            }
        }
    }
}
