//! Motion control subsystem

pub mod axis;
pub mod executor;
pub mod homing;

pub use axis::{validate_speed, AxisController, AxisPhase};
pub use executor::MotionExecutor;
pub use homing::HomingSequence;
