//! Device implementations
//!
//! [`sysfs`] talks to the real hardware through sysfs attribute files
//! (encoder kernel module, GPIO H-bridge pins, PWM enable lines).
//! [`mock`] provides a shared-state simulation rig for hardware-free
//! testing.

pub mod mock;
pub mod sysfs;
