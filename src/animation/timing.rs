//! Timing functions (easing curves) for clips.
//!
//! Timing functions control the rate of change during a clip, allowing
//! for natural-feeling motion rather than linear interpolation.
//!
//! ## Built-in Easing Functions
//!
//! - [`TimingFunction::Linear`] - Constant speed (no easing)
//! - [`TimingFunction::EaseIn`] / [`TimingFunction::EaseOut`] /
//!   [`TimingFunction::EaseInOut`] - Quadratic curves
//! - [`TimingFunction::Power`] - Polynomial family (`power1` .. `power4`)
//! - [`TimingFunction::Back`] - Overshoots past the end before settling
//! - [`TimingFunction::ElasticOut`] - Decaying oscillation around the end value
//!
//! ## Advanced Options
//!
//! - [`TimingFunction::CubicBezier`] - CSS-style cubic bezier curve
//! - [`TimingFunction::Spring`] - Physics-based spring (can overshoot)
//! - [`TimingFunction::Custom`] - User-defined function
//!
//! ## Identifiers
//!
//! Curves can be parsed from the identifiers used in section descriptions:
//!
//! ```
//! use choreo::TimingFunction;
//!
//! let ease: TimingFunction = "elastic.out(1, 0.4)".parse().unwrap();
//! assert_eq!(ease.evaluate(1.0), 1.0);
//! let ease: TimingFunction = "power3.out".parse().unwrap();
//! assert!(ease.evaluate(0.5) > 0.5);
//! ```

use std::f32::consts::PI;
use std::str::FromStr;
use std::sync::Arc;

use super::spring::SpringConfig;
use crate::error::ChoreoError;

/// Which end of the curve is eased.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EaseDirection {
    In,
    Out,
    InOut,
}

/// Timing function that controls the clip curve
#[derive(Clone)]
pub enum TimingFunction {
    /// Linear interpolation (constant speed)
    Linear,
    /// Starts slow, ends fast
    EaseIn,
    /// Starts fast, ends slow
    EaseOut,
    /// Starts slow, speeds up, then slows down
    EaseInOut,
    /// Polynomial ease of the given power (1 = quadratic, 4 = quintic)
    Power(u8, EaseDirection),
    /// Overshooting ease with the given overshoot strength
    Back(f32, EaseDirection),
    /// Elastic ease-out with amplitude and period
    ElasticOut { amplitude: f32, period: f32 },
    /// CSS cubic-bezier curve (x1, y1, x2, y2)
    CubicBezier(f32, f32, f32, f32),
    /// Spring physics simulation (can overshoot)
    Spring(SpringConfig),
    /// Custom timing function
    Custom(Arc<dyn Fn(f32) -> f32 + Send + Sync>),
}

impl TimingFunction {
    /// Evaluate the timing function at time t (0.0 to 1.0)
    /// Returns the interpolation factor (can exceed [0, 1] for overshoot)
    ///
    /// Note: Spring clips are sampled with real elapsed time by the clip
    /// renderer. This method returns t as fallback for springs.
    pub fn evaluate(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            TimingFunction::Linear => t,
            TimingFunction::EaseIn => ease_in(t),
            TimingFunction::EaseOut => ease_out(t),
            TimingFunction::EaseInOut => ease_in_out(t),
            TimingFunction::Power(power, dir) => power_ease(t, *power, *dir),
            TimingFunction::Back(overshoot, dir) => back(t, *overshoot, *dir),
            TimingFunction::ElasticOut { amplitude, period } => elastic_out(t, *amplitude, *period),
            TimingFunction::CubicBezier(x1, y1, x2, y2) => cubic_bezier(t, *x1, *y1, *x2, *y2),
            TimingFunction::Spring(_) => t,
            TimingFunction::Custom(f) => f(t),
        }
    }

    /// Create a custom timing function from a closure
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(f32) -> f32 + Send + Sync + 'static,
    {
        TimingFunction::Custom(Arc::new(f))
    }

    pub fn is_spring(&self) -> bool {
        matches!(self, TimingFunction::Spring(_))
    }
}

impl Default for TimingFunction {
    fn default() -> Self {
        TimingFunction::Power(1, EaseDirection::Out)
    }
}

impl std::fmt::Debug for TimingFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimingFunction::Linear => write!(f, "Linear"),
            TimingFunction::EaseIn => write!(f, "EaseIn"),
            TimingFunction::EaseOut => write!(f, "EaseOut"),
            TimingFunction::EaseInOut => write!(f, "EaseInOut"),
            TimingFunction::Power(p, dir) => write!(f, "Power({}, {:?})", p, dir),
            TimingFunction::Back(o, dir) => write!(f, "Back({}, {:?})", o, dir),
            TimingFunction::ElasticOut { amplitude, period } => {
                write!(f, "ElasticOut({}, {})", amplitude, period)
            }
            TimingFunction::CubicBezier(x1, y1, x2, y2) => {
                write!(f, "CubicBezier({}, {}, {}, {})", x1, y1, x2, y2)
            }
            TimingFunction::Spring(config) => write!(f, "Spring({:?})", config),
            TimingFunction::Custom(_) => write!(f, "Custom"),
        }
    }
}

impl FromStr for TimingFunction {
    type Err = ChoreoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || ChoreoError::UnknownEasing(s.to_string());
        let trimmed = s.trim();

        // Split `name(args)` into name and numeric args.
        let (name, args) = match trimmed.find('(') {
            Some(open) => {
                let close = trimmed.rfind(')').ok_or_else(unknown)?;
                if close < open {
                    return Err(unknown());
                }
                let args = trimmed[open + 1..close]
                    .split(',')
                    .map(str::trim)
                    .filter(|a| !a.is_empty())
                    .map(|a| a.parse::<f32>().map_err(|_| unknown()))
                    .collect::<Result<Vec<_>, _>>()?;
                (&trimmed[..open], args)
            }
            None => (trimmed, Vec::new()),
        };

        let (family, dir) = match name.split_once('.') {
            Some((family, dir)) => {
                let dir = match dir {
                    "in" => EaseDirection::In,
                    "out" => EaseDirection::Out,
                    "inOut" => EaseDirection::InOut,
                    _ => return Err(unknown()),
                };
                (family, Some(dir))
            }
            None => (name, None),
        };

        let timing = match (family, dir) {
            ("none" | "linear" | "power0", _) => TimingFunction::Linear,
            ("ease-in", None) => TimingFunction::EaseIn,
            ("ease-out", None) => TimingFunction::EaseOut,
            ("ease-in-out", None) => TimingFunction::EaseInOut,
            ("power1" | "quad", dir) => TimingFunction::Power(1, dir.unwrap_or(EaseDirection::Out)),
            ("power2" | "cubic", dir) => {
                TimingFunction::Power(2, dir.unwrap_or(EaseDirection::Out))
            }
            ("power3" | "quart", dir) => {
                TimingFunction::Power(3, dir.unwrap_or(EaseDirection::Out))
            }
            ("power4" | "quint", dir) => {
                TimingFunction::Power(4, dir.unwrap_or(EaseDirection::Out))
            }
            ("back", dir) => TimingFunction::Back(
                args.first().copied().unwrap_or(1.7),
                dir.unwrap_or(EaseDirection::Out),
            ),
            ("elastic", None | Some(EaseDirection::Out)) => TimingFunction::ElasticOut {
                amplitude: args.first().copied().unwrap_or(1.0),
                period: args.get(1).copied().unwrap_or(0.3),
            },
            ("cubic-bezier", None) => match args[..] {
                [x1, y1, x2, y2] if (0.0..=1.0).contains(&x1) && (0.0..=1.0).contains(&x2) => {
                    TimingFunction::CubicBezier(x1, y1, x2, y2)
                }
                _ => return Err(unknown()),
            },
            _ => return Err(unknown()),
        };
        Ok(timing)
    }
}

// Easing functions

fn ease_in(t: f32) -> f32 {
    t * t
}

fn ease_out(t: f32) -> f32 {
    t * (2.0 - t)
}

fn ease_in_out(t: f32) -> f32 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        -1.0 + (4.0 - 2.0 * t) * t
    }
}

fn power_ease(t: f32, power: u8, dir: EaseDirection) -> f32 {
    let exp = i32::from(power) + 1;
    match dir {
        EaseDirection::In => t.powi(exp),
        EaseDirection::Out => 1.0 - (1.0 - t).powi(exp),
        EaseDirection::InOut => {
            if t < 0.5 {
                (2.0 * t).powi(exp) / 2.0
            } else {
                1.0 - (2.0 * (1.0 - t)).powi(exp) / 2.0
            }
        }
    }
}

fn back(t: f32, overshoot: f32, dir: EaseDirection) -> f32 {
    let ease_in = |p: f32| p * p * ((overshoot + 1.0) * p - overshoot);
    match dir {
        EaseDirection::In => ease_in(t),
        EaseDirection::Out => 1.0 - ease_in(1.0 - t),
        EaseDirection::InOut => {
            if t < 0.5 {
                ease_in(2.0 * t) / 2.0
            } else {
                1.0 - ease_in(2.0 * (1.0 - t)) / 2.0
            }
        }
    }
}

/// Elastic ease-out. Amplitudes below 1 are raised to 1 and shorten the
/// period instead, so the curve always starts at 0 and ends exactly at 1.
fn elastic_out(t: f32, amplitude: f32, period: f32) -> f32 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }
    let two_pi = 2.0 * PI;
    let a = amplitude.max(1.0);
    let p = period.max(1e-3) / amplitude.clamp(1e-3, 1.0);
    let shift = p / two_pi * (1.0 / a).asin();
    a * 2f32.powf(-10.0 * t) * ((t - shift) * two_pi / p).sin() + 1.0
}

/// CSS cubic bezier evaluation; x1 and x2 must lie in [0, 1]
fn cubic_bezier(t: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    // Use Newton-Raphson to solve for t given x
    let mut current_t = t;
    for _ in 0..8 {
        let current_x = cubic_bezier_x(current_t, x1, x2);
        let current_slope = cubic_bezier_slope(current_t, x1, x2);
        if current_slope.abs() < 1e-6 {
            break;
        }
        current_t = (current_t - (current_x - t) / current_slope).clamp(0.0, 1.0);
    }
    cubic_bezier_y(current_t, y1, y2)
}

fn cubic_bezier_x(t: f32, x1: f32, x2: f32) -> f32 {
    let t2 = t * t;
    let t3 = t2 * t;
    let mt = 1.0 - t;
    let mt2 = mt * mt;
    3.0 * mt2 * t * x1 + 3.0 * mt * t2 * x2 + t3
}

fn cubic_bezier_y(t: f32, y1: f32, y2: f32) -> f32 {
    let t2 = t * t;
    let t3 = t2 * t;
    let mt = 1.0 - t;
    let mt2 = mt * mt;
    3.0 * mt2 * t * y1 + 3.0 * mt * t2 * y2 + t3
}

fn cubic_bezier_slope(t: f32, x1: f32, x2: f32) -> f32 {
    let mt = 1.0 - t;
    3.0 * mt * mt * x1 + 6.0 * mt * t * (x2 - x1) + 3.0 * t * t * (1.0 - x2)
}
