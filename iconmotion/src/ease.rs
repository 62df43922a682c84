//! Progress math: remapping, clamping and the curves that bend progress into motion.
//!
//! Everything here is a pure function of its inputs. Progress is expected in [0, 1]; curves
//! that overshoot may return values outside that range.

use std::{f64::consts::PI, str::FromStr};

use kurbo::{CubicBez, ParamCurve, ParamCurveDeriv, Point};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Controls how far past the end [`overshoot_ease`] travels before settling
pub const OVERSHOOT_TENSION: f64 = 2.5;

/// Linearly map `value` from `[from_low, from_high]` to `[to_low, to_high]`.
///
/// Not guarded: an empty source range produces NaN or infinity.
pub fn remap(value: f64, from_low: f64, from_high: f64, to_low: f64, to_high: f64) -> f64 {
    to_low + (value - from_low) / (from_high - from_low) * (to_high - to_low)
}

pub fn clamp(value: f64, low: f64, high: f64) -> f64 {
    value.max(low).min(high)
}

pub fn deg_to_rad(deg: f64) -> f64 {
    deg * PI / 180.0
}

/// Ease that runs past 1.0 near the end and springs back. Defined for t in [0, 1].
pub fn overshoot_ease(t: f64) -> f64 {
    debug_assert!(
        (0.0..=1.0).contains(&t),
        "overshoot_ease is only defined on [0, 1], got {t}"
    );
    let s = OVERSHOOT_TENSION;
    let u = t - 1.0;
    u * u * ((s + 1.0) * u + s) + 1.0
}

/// A named easing curve, the "curve" of a playback configuration.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Curve {
    #[default]
    Linear,
    Ease,
    EaseIn,
    EaseOut,
    EaseInOut,
    Decelerate,
    Overshoot,
    /// CSS style cubic-bezier(x1, y1, x2, y2) from (0, 0) to (1, 1)
    Cubic { x1: f64, y1: f64, x2: f64, y2: f64 },
}

impl Curve {
    /// Every named curve, handy for plotting
    pub const NAMED: [(&'static str, Curve); 7] = [
        ("linear", Curve::Linear),
        ("ease", Curve::Ease),
        ("ease-in", Curve::EaseIn),
        ("ease-out", Curve::EaseOut),
        ("ease-in-out", Curve::EaseInOut),
        ("decelerate", Curve::Decelerate),
        ("overshoot", Curve::Overshoot),
    ];

    pub fn transform(&self, t: f64) -> f64 {
        debug_assert!(
            (0.0..=1.0).contains(&t),
            "curves are only defined on [0, 1], got {t}"
        );
        match *self {
            Curve::Linear => t,
            Curve::Ease => cubic_ease(0.25, 0.1, 0.25, 1.0, t),
            Curve::EaseIn => cubic_ease(0.42, 0.0, 1.0, 1.0, t),
            Curve::EaseOut => cubic_ease(0.0, 0.0, 0.58, 1.0, t),
            Curve::EaseInOut => cubic_ease(0.42, 0.0, 0.58, 1.0, t),
            Curve::Decelerate => {
                let u = 1.0 - t;
                1.0 - u * u
            }
            Curve::Overshoot => overshoot_ease(t),
            Curve::Cubic { x1, y1, x2, y2 } => cubic_ease(x1, y1, x2, y2, t),
        }
    }
}

impl FromStr for Curve {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Curve::NAMED
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, curve)| *curve)
            .ok_or(())
    }
}

/// Evaluate a CSS style timing function: find the parameter whose x is `x` and return its y.
fn cubic_ease(x1: f64, y1: f64, x2: f64, y2: f64, x: f64) -> f64 {
    if x <= 0.0 || x >= 1.0 {
        return x;
    }
    let cubic = CubicBez::new(
        Point::ZERO,
        Point::new(x1, y1),
        Point::new(x2, y2),
        Point::new(1.0, 1.0),
    );
    let deriv = cubic.deriv();

    // Newton first, it's usually done in a handful of steps
    let mut t = x;
    for _ in 0..8 {
        let err = cubic.eval(t).x - x;
        if err.abs() < 1e-7 {
            return cubic.eval(t).y;
        }
        let dx = deriv.eval(t).x;
        if dx.abs() < 1e-6 {
            break;
        }
        t -= err / dx;
    }

    // Flat spots defeat Newton; x is monotonic for valid timing functions so bisect
    let (mut lo, mut hi) = (0.0, 1.0);
    t = x;
    for _ in 0..64 {
        let px = cubic.eval(t).x;
        if (px - x).abs() < 1e-7 {
            break;
        }
        if px < x {
            lo = t;
        } else {
            hi = t;
        }
        t = (lo + hi) / 2.0;
    }
    cubic.eval(t).y
}

/// A curve that only moves within `[begin, end]` of the overall progress.
///
/// 0 before begin, 1 after end, the curve of the remapped position in between.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Interval {
    begin: f64,
    end: f64,
    curve: Curve,
}

impl Interval {
    pub fn new(begin: f64, end: f64, curve: Curve) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&begin) || !(0.0..=1.0).contains(&end) || begin > end {
            return Err(ConfigError::InvalidInterval(begin, end));
        }
        Ok(Self::fixed(begin, end, curve))
    }

    /// For intervals known to be valid at compile time
    pub(crate) const fn fixed(begin: f64, end: f64, curve: Curve) -> Self {
        Self { begin, end, curve }
    }

    pub fn transform(&self, t: f64) -> f64 {
        if self.begin == self.end {
            return if t < self.begin { 0.0 } else { 1.0 };
        }
        let t = clamp(remap(t, self.begin, self.end, 0.0, 1.0), 0.0, 1.0);
        if t == 0.0 || t == 1.0 {
            return t;
        }
        self.curve.transform(t)
    }
}

/// Linear interpolation between two values driven by an (eased) progress
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tween {
    pub begin: f64,
    pub end: f64,
}

impl Tween {
    pub const fn new(begin: f64, end: f64) -> Self {
        Self { begin, end }
    }

    pub fn lerp(&self, t: f64) -> f64 {
        self.begin + (self.end - self.begin) * t
    }
}
