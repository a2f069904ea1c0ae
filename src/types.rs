use crate::error::PageError;
use fixed::types::I32F32;
use serde::{Deserialize, Serialize};
use std::fmt;

// Values are rounded to thousandths of a point on the way in.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Pt(I32F32);

impl Pt {
    pub const ZERO: Pt = Pt(I32F32::from_bits(0));

    pub fn from_f32(value: f32) -> Pt {
        Pt::from_f64(value as f64)
    }

    pub fn from_f64(value: f64) -> Pt {
        if !value.is_finite() {
            return Pt::ZERO;
        }
        let milli = (value * 1000.0).round();
        let milli = milli.clamp(i64::MIN as f64, i64::MAX as f64) as i64;
        Pt::from_milli_i64(milli)
    }

    pub fn from_i32(value: i32) -> Pt {
        Pt::from_milli_i64((value as i64) * 1000)
    }

    pub fn to_f32(self) -> f32 {
        self.0.to_num()
    }

    pub fn to_milli_i64(self) -> i64 {
        let bits = self.0.to_bits() as i128;
        let denom = 1i128 << 32;
        let scaled = bits * 1000;
        let adj = if scaled >= 0 { denom / 2 } else { -denom / 2 };
        let milli = (scaled + adj) / denom;
        milli.clamp(i64::MIN as i128, i64::MAX as i128) as i64
    }

    pub fn from_milli_i64(milli: i64) -> Pt {
        Pt::from_milli_i128(milli as i128)
    }

    fn from_milli_i128(milli: i128) -> Pt {
        let denom = 1i128 << 32;
        let adj = if milli >= 0 { 500 } else { -500 };
        let bits = (milli * denom + adj) / 1000;
        let bits = bits.clamp(i64::MIN as i128, i64::MAX as i128) as i64;
        Pt(I32F32::from_bits(bits))
    }

    pub fn parse(raw: &str) -> Option<Pt> {
        let value = raw.trim().parse::<f64>().ok()?;
        if !value.is_finite() || value.abs() > i32::MAX as f64 {
            return None;
        }
        Some(Pt::from_f64(value))
    }

    pub fn max(self, other: Pt) -> Pt {
        if self >= other { self } else { other }
    }

    pub fn min(self, other: Pt) -> Pt {
        if self <= other { self } else { other }
    }
}

impl From<f64> for Pt {
    fn from(value: f64) -> Self {
        Pt::from_f64(value)
    }
}

impl From<Pt> for f64 {
    fn from(value: Pt) -> Self {
        value.to_milli_i64() as f64 / 1000.0
    }
}

impl fmt::Display for Pt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let milli = self.to_milli_i64();
        if milli % 1000 == 0 {
            write!(f, "{}", milli / 1000)
        } else {
            write!(f, "{}", f64::from(*self))
        }
    }
}

impl std::ops::Add for Pt {
    type Output = Pt;
    fn add(self, rhs: Pt) -> Pt {
        Pt::from_milli_i128(self.to_milli_i64() as i128 + rhs.to_milli_i64() as i128)
    }
}

impl std::ops::AddAssign for Pt {
    fn add_assign(&mut self, rhs: Pt) {
        *self = *self + rhs;
    }
}

impl std::ops::Sub for Pt {
    type Output = Pt;
    fn sub(self, rhs: Pt) -> Pt {
        Pt::from_milli_i128(self.to_milli_i64() as i128 - rhs.to_milli_i64() as i128)
    }
}

impl std::ops::SubAssign for Pt {
    fn sub_assign(&mut self, rhs: Pt) {
        *self = *self - rhs;
    }
}

impl std::ops::Div<i32> for Pt {
    type Output = Pt;
    fn div(self, rhs: i32) -> Pt {
        if rhs == 0 {
            return Pt::ZERO;
        }
        let num = self.to_milli_i64() as i128;
        let den = rhs as i128;
        let half = den.abs() / 2;
        let value = if num >= 0 {
            (num + half) / den
        } else {
            -(((-num) + half) / den)
        };
        Pt::from_milli_i128(value)
    }
}

impl std::ops::Neg for Pt {
    type Output = Pt;
    fn neg(self) -> Pt {
        Pt::from_milli_i128(-(self.to_milli_i64() as i128))
    }
}

impl std::iter::Sum for Pt {
    fn sum<I: Iterator<Item = Pt>>(iter: I) -> Pt {
        iter.fold(Pt::ZERO, |acc, v| acc + v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: Pt,
    pub y: Pt,
}

impl Point {
    pub fn new(x: Pt, y: Pt) -> Self {
        Self { x, y }
    }

    pub fn from_f32(x: f32, y: f32) -> Self {
        Self::new(Pt::from_f32(x), Pt::from_f32(y))
    }

    // y grows upwards, so a positive dy moves the point down the page.
    pub fn translate(self, dx: Pt, dy: Pt) -> Point {
        Point {
            x: self.x + dx,
            y: self.y - dy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: Pt,
    pub height: Pt,
}

impl Size {
    pub const A4_SPEC: &'static str = "595:842";

    pub fn new(width: Pt, height: Pt) -> Self {
        Self { width, height }
    }

    pub fn a4() -> Self {
        Self {
            width: Pt::from_i32(595),
            height: Pt::from_i32(842),
        }
    }

    pub fn parse_spec(raw: &str) -> Result<Size, PageError> {
        let tokens: Vec<&str> = raw.split(':').collect();
        if tokens.len() < 2 {
            return Err(PageError::MalformedPageSize(raw.to_string()));
        }
        let width =
            Pt::parse(tokens[0]).ok_or_else(|| PageError::MalformedPageSize(raw.to_string()))?;
        let height =
            Pt::parse(tokens[1]).ok_or_else(|| PageError::MalformedPageSize(raw.to_string()))?;
        Ok(Size { width, height })
    }

    pub fn to_spec(self) -> String {
        format!("{}:{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}
