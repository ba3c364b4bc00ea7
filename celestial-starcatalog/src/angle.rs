//! Angles and equatorial positions.
//!
//! [`Angle`] stores radians and offers degree and hour views, the three units
//! the catalog formats use. [`RaDec`] pairs a right ascension with a
//! declination; the same type carries proper motion as an angular rate per
//! Julian year.

use crate::error::{CatalogError, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

pub const TWOPI: f64 = 2.0 * PI;
pub const HALF_PI: f64 = PI / 2.0;

/// Milliarcseconds to radians.
pub const MAS_TO_RAD: f64 = PI / (180.0 * 3600.0 * 1000.0);

#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Angle(f64);

impl Angle {
    pub const ZERO: Angle = Angle(0.0);
    pub const RIGHT_ANGLE: Angle = Angle(HALF_PI);

    #[inline]
    pub const fn from_radians(radians: f64) -> Self {
        Self(radians)
    }

    #[inline]
    pub fn from_degrees(degrees: f64) -> Self {
        Self(degrees.to_radians())
    }

    #[inline]
    pub fn from_hours(hours: f64) -> Self {
        Self(hours * PI / 12.0)
    }

    #[inline]
    pub fn from_arcseconds(arcsec: f64) -> Self {
        Self::from_degrees(arcsec / 3600.0)
    }

    #[inline]
    pub fn radians(self) -> f64 {
        self.0
    }

    #[inline]
    pub fn degrees(self) -> f64 {
        self.0.to_degrees()
    }

    #[inline]
    pub fn hours(self) -> f64 {
        self.0 * 12.0 / PI
    }

    /// Reduce into `[lower, lower + 2π)`.
    pub fn reduced_from(self, lower: f64) -> Self {
        Self(reduce(self.0, lower))
    }

    /// Reduce into `[0, 2π)`.
    pub fn reduced(self) -> Self {
        self.reduced_from(0.0)
    }

    pub fn cos(self) -> f64 {
        libm::cos(self.0)
    }

    pub fn is_nan(self) -> bool {
        self.0.is_nan()
    }
}

/// `x - 2π·floor((x - lower) / 2π)`, the modular reduction used for RA tests.
pub fn reduce(x: f64, lower: f64) -> f64 {
    x - TWOPI * ((x - lower) / TWOPI).floor()
}

impl Add for Angle {
    type Output = Angle;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Angle(self.0 + rhs.0)
    }
}

impl Sub for Angle {
    type Output = Angle;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Angle(self.0 - rhs.0)
    }
}

impl Mul<f64> for Angle {
    type Output = Angle;
    #[inline]
    fn mul(self, k: f64) -> Self {
        Angle(self.0 * k)
    }
}

impl Neg for Angle {
    type Output = Angle;
    #[inline]
    fn neg(self) -> Self {
        Angle(-self.0)
    }
}

/// Equatorial position (or rate) in right ascension and declination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RaDec {
    pub ra: Angle,
    pub dec: Angle,
}

impl RaDec {
    pub const fn new(ra: Angle, dec: Angle) -> Self {
        Self { ra, dec }
    }

    pub fn from_degrees(ra_deg: f64, dec_deg: f64) -> Self {
        Self::new(Angle::from_degrees(ra_deg), Angle::from_degrees(dec_deg))
    }

    pub fn from_hours_degrees(ra_hours: f64, dec_deg: f64) -> Self {
        Self::new(Angle::from_hours(ra_hours), Angle::from_degrees(dec_deg))
    }
}

impl fmt::Display for RaDec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // work in integer milliseconds of time and centiarcseconds so that
        // rounding never produces a "60" seconds field
        let ms = (self.ra.reduced().hours() * 3_600_000.0).round() as u64 % 86_400_000;
        let (h, m, s) = (ms / 3_600_000, (ms / 60_000) % 60, ms % 60_000);
        let dec = self.dec.degrees();
        let sign = if dec < 0.0 { '-' } else { '+' };
        let cas = (dec.abs() * 360_000.0).round() as u64;
        let (d, dm, ds) = (cas / 360_000, (cas / 6_000) % 60, cas % 6_000);
        write!(
            f,
            "{:02}:{:02}:{:02}.{:03} {}{:02}:{:02}:{:02}.{:02}",
            h,
            m,
            s / 1000,
            s % 1000,
            sign,
            d,
            dm,
            ds / 100,
            ds % 100
        )
    }
}

/// Parse `d`, `d:m` or `d:m:s` (any unit) into decimal units.
///
/// A leading sign applies to the whole value, so `-0:30` is `-0.5`.
pub fn parse_sexagesimal(text: &str) -> Result<f64> {
    let text = text.trim();
    let (sign, body) = match text.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, text.strip_prefix('+').unwrap_or(text)),
    };
    let parts: Vec<&str> = body.split(':').collect();
    if parts.len() > 3 {
        return Err(CatalogError::parse(format!("too many fields in '{}'", text)));
    }
    let mut value = 0.0;
    let mut scale = 1.0;
    for part in parts {
        let x: f64 = part
            .trim()
            .parse()
            .map_err(|_| CatalogError::parse(format!("not a sexagesimal value: '{}'", text)))?;
        if x < 0.0 {
            return Err(CatalogError::parse(format!("negative field in '{}'", text)));
        }
        value += x / scale;
        scale *= 60.0;
    }
    Ok(sign * value)
}
