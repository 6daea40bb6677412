//! Hardware capability traits
//!
//! Each [`crate::motion::AxisController`] owns one [`MotorDriver`] and one
//! per-axis view of a shared [`EncoderSource`]; nothing else touches those
//! handles. Implementations live in [`crate::devices`].

use crate::error::Result;

/// Upper edge of the signed encoder domain: counts live in [0, 2*BOUND)
/// on the wire and fold to (-BOUND, BOUND] after [`fold_raw_count`].
pub const ENCODER_BOUND: u64 = (1 << 31) - 1;

/// The two controlled axes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Rotational axis (theta)
    Spinner,
    /// Radial axis (r)
    Slider,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Spinner => write!(f, "spinner"),
            Axis::Slider => write!(f, "slider"),
        }
    }
}

/// Direction currently commanded on an axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandedDirection {
    /// No drive command active
    #[default]
    None,
    /// Moving toward larger tick counts
    Positive,
    /// Moving toward smaller tick counts
    Negative,
}

/// Absolute tick counts for both axes, as read from the encoder source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncoderReading {
    pub spinner: i64,
    pub slider: i64,
}

impl EncoderReading {
    /// Tick count for one axis
    pub fn axis(&self, axis: Axis) -> i64 {
        match axis {
            Axis::Spinner => self.spinner,
            Axis::Slider => self.slider,
        }
    }
}

/// Fold a raw unsigned counter value into the signed tick domain
///
/// The counter hardware reports values in [0, 2*BOUND); anything above
/// BOUND represents a negative count and is folded by subtracting 2*BOUND.
/// BOUND = 2^31 - 1. This convention matches the encoder kernel module and
/// must not change.
pub fn fold_raw_count(raw: u64) -> i64 {
    if raw > ENCODER_BOUND {
        raw as i64 - 2 * ENCODER_BOUND as i64
    } else {
        raw as i64
    }
}

/// Motor drive capability for a single axis
///
/// Speeds are percent of rated drive; callers validate the 1..=100 range
/// before issuing commands.
pub trait MotorDriver: Send {
    /// Drive toward larger tick counts
    fn forward(&mut self, speed: u8) -> Result<()>;

    /// Drive toward smaller tick counts
    fn reverse(&mut self, speed: u8) -> Result<()>;

    /// Stop the motor. Must be safe to call repeatedly.
    fn stop(&mut self) -> Result<()>;
}

/// Read-only source of absolute encoder positions for both axes
///
/// Shared between the two axis controllers; implementations use interior
/// mutability where a read has side effects.
pub trait EncoderSource: Send + Sync {
    /// Read the current absolute tick pair
    fn read(&self) -> Result<EncoderReading>;
}

/// Limit switch input
///
/// Active level handling belongs to the implementation; `is_triggered`
/// already accounts for polarity.
pub trait LimitSwitch: Send {
    /// True when the switch is pressed
    fn is_triggered(&mut self) -> Result<bool>;
}

/// Observational direction indicator outputs for one axis
///
/// Two boolean signals (positive / negative); purely informational, no
/// feedback into control decisions. Failures are logged, never fatal.
pub trait DirectionIndicator: Send {
    /// Reflect the currently commanded direction
    fn set_direction(&mut self, direction: CommandedDirection);
}

/// Indicator that drops the signals on the floor
#[derive(Debug, Default)]
pub struct NullIndicator;

impl DirectionIndicator for NullIndicator {
    fn set_direction(&mut self, _direction: CommandedDirection) {}
}
