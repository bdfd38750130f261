use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Linear RGBA colour with channels nominally in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);
    pub const GREY: Rgba = Rgba::new(0.5, 0.5, 0.5, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Forces every channel into `[0, 1]`; NaN collapses to zero.
    pub fn clamped(self) -> Self {
        fn channel(value: f32) -> f32 {
            if value.is_nan() {
                0.0
            } else {
                value.clamp(0.0, 1.0)
            }
        }
        Self::new(
            channel(self.r),
            channel(self.g),
            channel(self.b),
            channel(self.a),
        )
    }

    /// Linear interpolation towards `other`; `t` is clamped to `[0, 1]`.
    ///
    /// Endpoints are reproduced exactly: `t = 0` yields `self`, `t = 1` yields `other`.
    pub fn lerp(self, other: Rgba, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: f32, b: f32| a * (1.0 - t) + b * t;
        Self::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }

    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|c| c.is_finite())
    }

    pub fn is_normalized(&self) -> bool {
        self.to_array().iter().all(|c| (0.0..=1.0).contains(c))
    }

    pub fn approx_eq(&self, other: &Rgba, epsilon: f32) -> bool {
        self.to_array()
            .iter()
            .zip(other.to_array().iter())
            .all(|(a, b)| (a - b).abs() <= epsilon)
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<[f32; 4]> for Rgba {
    fn from([r, g, b, a]: [f32; 4]) -> Self {
        Self::new(r, g, b, a)
    }
}

impl From<Rgba> for [f32; 4] {
    fn from(color: Rgba) -> Self {
        color.to_array()
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.3}, {:.3}, {:.3}, {:.3})",
            self.r, self.g, self.b, self.a
        )
    }
}

impl FromStr for Rgba {
    type Err = String;

    /// Parses `r,g,b` or `r,g,b,a` with channels in `[0, 1]`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let channels = value
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<f32>()
                    .map_err(|_| format!("invalid colour channel '{}'", part.trim()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let color = match channels.as_slice() {
            [r, g, b] => Rgba::new(*r, *g, *b, 1.0),
            [r, g, b, a] => Rgba::new(*r, *g, *b, *a),
            _ => {
                return Err(format!(
                    "expected 3 or 4 comma-separated channels, got {}",
                    channels.len()
                ))
            }
        };

        if !color.is_finite() || !color.is_normalized() {
            return Err(format!("colour channels must lie in [0, 1]: '{value}'"));
        }
        Ok(color)
    }
}
