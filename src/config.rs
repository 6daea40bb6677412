//! Configuration for the YantraMotion daemon
//!
//! Loads configuration from a TOML file: device file paths, mechanical
//! calibration, and control-loop parameters.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub hardware: HardwareConfig,
    pub calibration: CalibrationConfig,
    pub control: ControlConfig,
    pub logging: LoggingConfig,
}

/// Device file paths for motors, encoder and limit switch
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HardwareConfig {
    /// Encoder kernel module attribute exposing "<spinner> <slider>"
    pub encoder_path: String,
    /// GPIO value file for the slider limit switch
    pub limit_switch_path: String,
    /// Switch reads 0 when pressed
    pub switch_active_low: bool,
    /// PWM period for the motor enable lines, nanoseconds
    pub pwm_period_ns: u64,
    /// Spinner motor H-bridge pins
    pub spinner_motor: MotorPins,
    /// Slider motor H-bridge pins
    pub slider_motor: MotorPins,
    /// Optional direction indicator LEDs for the spinner axis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spinner_indicator: Option<IndicatorPins>,
    /// Optional direction indicator LEDs for the slider axis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slider_indicator: Option<IndicatorPins>,
}

/// GPIO value file paths for one axis' direction indicator pair
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndicatorPins {
    /// Lit while driving toward larger tick counts
    pub positive: String,
    /// Lit while driving toward smaller tick counts
    pub negative: String,
}

/// H-bridge pin paths for one motor
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MotorPins {
    /// Direction pin A value file
    pub in1: String,
    /// Direction pin B value file
    pub in2: String,
    /// PWM duty_cycle file for the enable line
    pub pwm_duty: String,
}

/// Mechanical calibration constants
///
/// Tick counts are full-range totals measured on the hardware; the
/// per-tick constants the planner needs are derived from them.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CalibrationConfig {
    /// Slider position at the homed limit switch, millimeters
    pub radius_min_mm: f64,
    /// Slider position at full extension, millimeters
    pub radius_max_mm: f64,
    /// Encoder ticks for one full spinner rotation
    pub ticks_per_rotation: u32,
    /// Encoder ticks for full slider extension
    pub ticks_per_extension: u32,
}

impl CalibrationConfig {
    /// Radians of spinner rotation per encoder tick
    pub fn angle_per_tick(&self) -> f64 {
        std::f64::consts::TAU / f64::from(self.ticks_per_rotation)
    }

    /// Millimeters of slider travel per encoder tick
    pub fn radius_per_tick(&self) -> f64 {
        (self.radius_max_mm - self.radius_min_mm) / f64::from(self.ticks_per_extension)
    }
}

/// Control loop parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ControlConfig {
    /// Sleep between control ticks, milliseconds
    pub poll_interval_ms: u64,
    /// Tick distance below which an axis counts as arrived
    pub tolerance_ticks: u32,
    /// Spinner drive speed, percent (1-100)
    pub spinner_speed: u8,
    /// Slider drive speed, percent (1-100)
    pub slider_speed: u8,
    /// Homing drive speed, percent (1-100)
    pub homing_speed: u8,
}

impl ControlConfig {
    /// Poll interval as a [`Duration`]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl AppConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Default configuration for the reference plotter
    ///
    /// Calibration matches the measured hardware: 64-step motors geared
    /// 30:3 on the spinner (5760 ticks/rotation) and 10:1 on the slider
    /// (640 ticks full extension), radius range 5-500mm.
    pub fn plotter_defaults() -> Self {
        Self {
            hardware: HardwareConfig {
                encoder_path: "/sys/enc/dot".to_string(),
                limit_switch_path: "/sys/class/gpio/gpio12/value".to_string(),
                switch_active_low: true,
                pwm_period_ns: 1_000_000,
                spinner_motor: MotorPins {
                    in1: "/sys/class/gpio/gpio23/value".to_string(),
                    in2: "/sys/class/gpio/gpio24/value".to_string(),
                    pwm_duty: "/sys/class/pwm/pwmchip0/pwm0/duty_cycle".to_string(),
                },
                slider_motor: MotorPins {
                    in1: "/sys/class/gpio/gpio25/value".to_string(),
                    in2: "/sys/class/gpio/gpio8/value".to_string(),
                    pwm_duty: "/sys/class/pwm/pwmchip0/pwm1/duty_cycle".to_string(),
                },
                spinner_indicator: None,
                slider_indicator: None,
            },
            calibration: CalibrationConfig {
                radius_min_mm: 5.0,
                radius_max_mm: 500.0,
                ticks_per_rotation: 5760,
                ticks_per_extension: 640,
            },
            control: ControlConfig {
                poll_interval_ms: 1,
                tolerance_ticks: 8,
                spinner_speed: 26,
                slider_speed: 26,
                homing_speed: 26,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::plotter_defaults()
    }
}
