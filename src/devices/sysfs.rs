//! Sysfs-backed device implementations
//!
//! The encoder kernel module exposes both counters through a single sysfs
//! attribute formatted as `"<spinner> <slider>"`. Motors are H-bridges on
//! GPIO value files with a PWM duty-cycle file for the enable line, and
//! the limit switch and direction indicators are plain GPIO value files.

use crate::config::MotorPins;
use crate::drivers::{
    fold_raw_count, CommandedDirection, DirectionIndicator, EncoderReading, EncoderSource,
    LimitSwitch, MotorDriver,
};
use crate::error::{Error, Result};
use std::fs;
use std::path::PathBuf;

/// Encoder source reading the kernel module's sysfs attribute
pub struct SysfsEncoder {
    path: PathBuf,
}

impl SysfsEncoder {
    /// Create an encoder source for the given attribute path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl EncoderSource for SysfsEncoder {
    fn read(&self) -> Result<EncoderReading> {
        let contents = fs::read_to_string(&self.path)
            .map_err(|e| Error::EncoderRead(format!("{}: {}", self.path.display(), e)))?;

        let mut fields = contents.split_whitespace();
        let mut next_count = || -> Result<i64> {
            let field = fields
                .next()
                .ok_or_else(|| Error::EncoderRead(format!("short read: {:?}", contents)))?;
            let raw: u64 = field
                .parse()
                .map_err(|e| Error::EncoderRead(format!("bad count {:?}: {}", field, e)))?;
            Ok(fold_raw_count(raw))
        };

        Ok(EncoderReading {
            spinner: next_count()?,
            slider: next_count()?,
        })
    }
}

/// H-bridge motor on GPIO direction pins with a PWM enable line
pub struct SysfsMotor {
    in1: PathBuf,
    in2: PathBuf,
    pwm_duty: PathBuf,
    pwm_period_ns: u64,
}

impl SysfsMotor {
    /// Create a motor driver from configured pin paths
    pub fn new(pins: &MotorPins, pwm_period_ns: u64) -> Self {
        Self {
            in1: PathBuf::from(&pins.in1),
            in2: PathBuf::from(&pins.in2),
            pwm_duty: PathBuf::from(&pins.pwm_duty),
            pwm_period_ns,
        }
    }

    fn write_pins(&self, in1: u8, in2: u8, speed: u8) -> Result<()> {
        fs::write(&self.in1, if in1 == 1 { "1" } else { "0" })?;
        fs::write(&self.in2, if in2 == 1 { "1" } else { "0" })?;
        let duty = self.pwm_period_ns * u64::from(speed) / 100;
        fs::write(&self.pwm_duty, duty.to_string())?;
        Ok(())
    }
}

impl MotorDriver for SysfsMotor {
    fn forward(&mut self, speed: u8) -> Result<()> {
        self.write_pins(1, 0, speed)
    }

    fn reverse(&mut self, speed: u8) -> Result<()> {
        self.write_pins(0, 1, speed)
    }

    fn stop(&mut self) -> Result<()> {
        self.write_pins(0, 0, 0)
    }
}

/// Limit switch on a GPIO value file
pub struct SysfsLimitSwitch {
    path: PathBuf,
    active_low: bool,
}

impl SysfsLimitSwitch {
    /// Create a switch input; `active_low` selects which level means pressed
    pub fn new(path: impl Into<PathBuf>, active_low: bool) -> Self {
        Self {
            path: path.into(),
            active_low,
        }
    }
}

impl LimitSwitch for SysfsLimitSwitch {
    fn is_triggered(&mut self) -> Result<bool> {
        let contents = fs::read_to_string(&self.path)
            .map_err(|e| Error::SwitchRead(format!("{}: {}", self.path.display(), e)))?;
        let level = match contents.trim() {
            "0" => false,
            "1" => true,
            other => {
                return Err(Error::SwitchRead(format!("unexpected level {:?}", other)));
            }
        };
        Ok(level != self.active_low)
    }
}

/// Direction indicator on a pair of GPIO value files
///
/// Indicator writes are observational; failures are logged and swallowed
/// so a dead LED can never abort a motion.
pub struct SysfsIndicator {
    positive: PathBuf,
    negative: PathBuf,
}

impl SysfsIndicator {
    /// Create an indicator pair from value file paths
    pub fn new(positive: impl Into<PathBuf>, negative: impl Into<PathBuf>) -> Self {
        Self {
            positive: positive.into(),
            negative: negative.into(),
        }
    }
}

impl DirectionIndicator for SysfsIndicator {
    fn set_direction(&mut self, direction: CommandedDirection) {
        let (pos, neg) = match direction {
            CommandedDirection::None => ("0", "0"),
            CommandedDirection::Positive => ("1", "0"),
            CommandedDirection::Negative => ("0", "1"),
        };
        if let Err(e) = fs::write(&self.positive, pos) {
            log::warn!("SysfsIndicator: write {} failed: {}", self.positive.display(), e);
        }
        if let Err(e) = fs::write(&self.negative, neg) {
            log::warn!("SysfsIndicator: write {} failed: {}", self.negative.display(), e);
        }
    }
}
