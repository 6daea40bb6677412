//! YantraMotion - closed-loop motion control for a two-axis polar plotter
//!
//! Drives a rotational "spinner" axis and a radial "slider" axis with
//! stepper motors against quadrature encoder feedback: coordinate math,
//! waypoint-to-tick path planning, per-axis closed-loop control, plan
//! execution and limit-switch homing.
//!
//! Hardware is reached through the capability traits in [`drivers`];
//! [`devices`] holds the sysfs implementations and a mock rig for
//! hardware-free testing.

pub mod config;
pub mod coords;
pub mod devices;
pub mod drivers;
pub mod error;
pub mod motion;
pub mod planner;

// Re-export commonly used types
pub use config::AppConfig;
pub use coords::{Cartesian, Polar};
pub use error::{Error, Result};
pub use planner::{PathPlanner, Plan, TickTarget};
