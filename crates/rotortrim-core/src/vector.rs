//! Phasor and angle utilities
//!
//! A 1/rev vibration is an amplitude and a phase. Summing two of them (a
//! measured imbalance plus a proposed correction) is plain 2D vector addition
//! once each is expressed as a [`Phasor`].
//!
//! # Examples
//!
//! ```
//! use rotortrim_core::vector::{angle_diff, to_clock_label, Phasor};
//!
//! let measured = Phasor::from_polar(0.20, 70.0);
//! let correction = Phasor::from_polar(0.20, 250.0);
//! assert!((measured + correction).magnitude() < 1e-9);
//!
//! assert_eq!(angle_diff(350.0, 10.0), 20.0);
//! assert_eq!(to_clock_label(250.0).to_string(), "8:30");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul};

/// Circular distance between two angles in degrees, in `[0, 180]`.
pub fn angle_diff(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    if d > 180.0 {
        360.0 - d
    } else {
        d
    }
}

/// Angle 180° away from `deg`, normalized to `[0, 360)`.
pub fn opposite(deg: f64) -> f64 {
    (deg + 180.0).rem_euclid(360.0)
}

/// Round to the nearest integer, exact halves to the even neighbour.
///
/// `2.5 -> 2`, `3.5 -> 4`, `-2.5 -> -2`.
pub fn round_half_even(x: f64) -> f64 {
    if (x - x.trunc()).abs() == 0.5 {
        2.0 * (x / 2.0).round()
    } else {
        x.round()
    }
}

/// Round `x` to the nearest multiple of `step`, halves to even.
///
/// A non-positive step leaves `x` untouched.
pub fn round_to_step(x: f64, step: f64) -> f64 {
    if step <= 0.0 {
        return x;
    }
    round_half_even(x / step) * step
}

/// Map an azimuth to the nearest half-hour on a clock face.
///
/// 0° is 12:00 and each hour spans 30°. A position exactly between two
/// half-hours goes to the even one (187.5° is 6:00).
pub fn to_clock_label(deg: f64) -> ClockLabel {
    let hours = deg.rem_euclid(360.0) / 30.0;
    let half_hours = round_half_even(hours * 2.0) as u32;
    let hour = match (half_hours / 2) % 12 {
        0 => 12,
        h => h as u8,
    };
    ClockLabel {
        hour,
        half: half_hours % 2 == 1,
    }
}

/// Half-hour clock position, hour in `1..=12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClockLabel {
    /// Hour hand, 1..=12
    pub hour: u8,

    /// True for the :30 position
    pub half: bool,
}

impl fmt::Display for ClockLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let minutes = if self.half { 30 } else { 0 };
        write!(f, "{}:{:02}", self.hour, minutes)
    }
}

/// Amplitude/phase quantity held as Cartesian components.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Phasor {
    /// In-phase component
    pub x: f64,

    /// Quadrature component
    pub y: f64,
}

impl Phasor {
    /// Create a phasor from Cartesian components
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Create a phasor from magnitude and phase in degrees
    pub fn from_polar(magnitude: f64, angle_deg: f64) -> Self {
        let r = angle_deg.to_radians();
        Self {
            x: magnitude * r.cos(),
            y: magnitude * r.sin(),
        }
    }

    /// Compute magnitude (L2 norm)
    pub fn magnitude(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Scalar multiplication
    pub fn scale(&self, scalar: f64) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }
}

impl Add for Phasor {
    type Output = Phasor;

    fn add(self, other: Phasor) -> Phasor {
        Phasor::new(self.x + other.x, self.y + other.y)
    }
}

impl Mul<f64> for Phasor {
    type Output = Phasor;

    fn mul(self, scalar: f64) -> Phasor {
        self.scale(scalar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_angle_diff_shortest_arc() {
        assert_eq!(angle_diff(80.0, 70.0), 10.0);
        assert_eq!(angle_diff(170.0, 20.0), 150.0);
        assert_eq!(angle_diff(10.0, 350.0), 20.0);
        assert_eq!(angle_diff(0.0, 180.0), 180.0);
        assert_eq!(angle_diff(-90.0, 90.0), 180.0);
    }

    #[test]
    fn test_clock_labels() {
        assert_eq!(to_clock_label(0.0).to_string(), "12:00");
        assert_eq!(to_clock_label(30.0).to_string(), "1:00");
        assert_eq!(to_clock_label(250.0).to_string(), "8:30");
        assert_eq!(to_clock_label(355.0).to_string(), "12:00");
        assert_eq!(to_clock_label(345.0).to_string(), "11:30");
        assert_eq!(to_clock_label(-30.0).to_string(), "11:00");
        assert_eq!(to_clock_label(16.0).to_string(), "12:30");
    }

    #[test]
    fn test_round_to_step() {
        assert_eq!(round_to_step(163.6, 10.0), 160.0);
        assert_eq!(round_to_step(165.0, 10.0), 160.0);
        assert_eq!(round_to_step(175.0, 10.0), 180.0);
        assert!((round_to_step(1.23, 0.1) - 1.2).abs() < 1e-9);
        assert_eq!(round_to_step(7.3, 0.0), 7.3);
    }

    #[test]
    fn test_round_half_even() {
        assert_eq!(round_half_even(12.5), 12.0);
        assert_eq!(round_half_even(13.5), 14.0);
        assert_eq!(round_half_even(0.5), 0.0);
        assert_eq!(round_half_even(-2.5), -2.0);
        assert_eq!(round_half_even(2.6), 3.0);
        assert_eq!(round_half_even(-2.4), -2.0);
    }

    #[test]
    fn test_clock_label_ties_go_even() {
        // 187.5° is 12.5 half-hours
        assert_eq!(to_clock_label(187.5).to_string(), "6:00");
        // 202.5° is 13.5 half-hours
        assert_eq!(to_clock_label(202.5).to_string(), "7:00");
        assert_eq!(to_clock_label(7.5).to_string(), "12:00");
    }

    #[test]
    fn test_phasor_operations() {
        let a = Phasor::from_polar(3.0, 0.0);
        let b = Phasor::from_polar(4.0, 90.0);

        let sum = a + b;
        assert!((sum.magnitude() - 5.0).abs() < 1e-12);

        let half = b * 0.5;
        assert!((half.magnitude() - 2.0).abs() < 1e-12);
        assert!(half.x.abs() < 1e-12);

        assert_eq!(Phasor::default().magnitude(), 0.0);
        assert_eq!(Phasor::new(1.0, 1.0).scale(2.0), Phasor::new(2.0, 2.0));
    }

    #[test]
    fn test_opposite_wraps() {
        assert_eq!(opposite(70.0), 250.0);
        assert_eq!(opposite(270.0), 90.0);
    }

    proptest! {
        #[test]
        fn prop_clock_label_is_periodic(deg in 0.0f64..360.0, turns in -3i32..=3) {
            let shifted = deg + 360.0 * f64::from(turns);
            prop_assert_eq!(to_clock_label(deg), to_clock_label(shifted));
        }

        #[test]
        fn prop_clock_hour_in_range(deg in -1e4f64..1e4) {
            let label = to_clock_label(deg);
            prop_assert!((1..=12).contains(&label.hour));
        }

        #[test]
        fn prop_angle_diff_bounded_and_symmetric(a in -720.0f64..720.0, b in -720.0f64..720.0) {
            let d = angle_diff(a, b);
            prop_assert!((0.0..=180.0).contains(&d));
            prop_assert!((d - angle_diff(b, a)).abs() < 1e-9);
        }

        #[test]
        fn prop_opposite_phasors_cancel(mag in 0.0f64..5.0, phase in 0.0f64..360.0) {
            let sum = Phasor::from_polar(mag, phase) + Phasor::from_polar(mag, opposite(phase));
            prop_assert!(sum.magnitude() < 1e-9);
        }
    }
}
