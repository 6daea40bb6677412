//! Cartesian and polar coordinate math
//!
//! Pure value types used by the path planner. All quantities are f64:
//! millimeters for lengths, radians for angles.

use std::f64::consts::{PI, TAU};
use std::ops::{Add, Mul, Sub};

/// A point on the drawing plane, in millimeters
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Cartesian {
    pub x: f64,
    pub y: f64,
}

/// A point in polar form: radius in millimeters, angle in radians
///
/// Arithmetic may produce non-canonical values (negative r, angle outside
/// (-pi, pi]); call [`Polar::canonical`] to normalize.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Polar {
    pub r: f64,
    pub theta: f64,
}

impl Cartesian {
    /// Create a new cartesian point
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Distance from the origin
    pub fn magnitude(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Convert to polar form
    ///
    /// At the origin the angle is conventionally 0 (atan2(0, 0) == 0).
    pub fn to_polar(&self) -> Polar {
        Polar {
            r: self.magnitude(),
            theta: self.y.atan2(self.x),
        }
    }
}

impl Add for Cartesian {
    type Output = Cartesian;

    fn add(self, other: Cartesian) -> Cartesian {
        Cartesian::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Cartesian {
    type Output = Cartesian;

    fn sub(self, other: Cartesian) -> Cartesian {
        Cartesian::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f64> for Cartesian {
    type Output = Cartesian;

    fn mul(self, scale: f64) -> Cartesian {
        Cartesian::new(self.x * scale, self.y * scale)
    }
}

impl Polar {
    /// Create a new polar point
    pub fn new(r: f64, theta: f64) -> Self {
        Self { r, theta }
    }

    /// Normalize to canonical form: r >= 0 and theta in (-pi, pi]
    ///
    /// A negative radius is flipped by negating r and rotating by pi, then
    /// theta is folded by subtracting the nearest multiple of 2*pi.
    pub fn canonical(&self) -> Polar {
        let mut r = self.r;
        let mut theta = self.theta;

        if r < 0.0 {
            r = -r;
            theta += PI;
        }

        theta -= (theta / TAU).round() * TAU;
        if theta <= -PI {
            theta += TAU;
        } else if theta > PI {
            theta -= TAU;
        }

        Polar { r, theta }
    }

    /// Convert to cartesian form
    pub fn to_cartesian(&self) -> Cartesian {
        Cartesian {
            x: self.r * self.theta.cos(),
            y: self.r * self.theta.sin(),
        }
    }

    /// Complex-style multiplication: radii multiply, angles add
    ///
    /// Used to rotate/scale a point by a fixed delta. Result is canonical.
    pub fn cmul(&self, other: Polar) -> Polar {
        Polar::new(self.r * other.r, self.theta + other.theta).canonical()
    }
}
