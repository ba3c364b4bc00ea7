//! Spatial and photometric query predicates.

use crate::angle::{reduce, Angle, RaDec, HALF_PI, TWOPI};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use tracing::debug;

const FULL_CIRCLE_EPSILON: f64 = 1e-9;

/// Rectangle in right ascension and declination.
///
/// The RA extent may cross 0h; [`SkyWindow::contains`] handles that by
/// modular reduction rather than a special case. A width of 360° or more
/// means the window covers every right ascension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkyWindow {
    center: RaDec,
    rawidth: Angle,
    decheight: Angle,
}

impl SkyWindow {
    pub fn new(center: RaDec, rawidth: Angle, decheight: Angle) -> Self {
        let rawidth = if rawidth.radians() >= TWOPI {
            Angle::from_radians(TWOPI)
        } else {
            rawidth
        };
        let decheight = Angle::from_radians(decheight.radians().clamp(0.0, PI));
        debug!(
            "window dimensions: RA = {:.3} hours, DEC = {:.3} degrees",
            rawidth.hours(),
            decheight.degrees()
        );
        Self {
            center,
            rawidth,
            decheight,
        }
    }

    /// Smallest window containing the rectangle of great-circle `width` by
    /// `height` centered on `center`.
    ///
    /// Away from the equator the edges of such a rectangle are not parallels,
    /// so the RA extent grows toward the pole and one declination edge moves
    /// to the corners.
    pub fn hull(center: RaDec, width: Angle, height: Angle) -> Self {
        debug!(
            "hull for center={}, width={:.1}, height={:.1}",
            center,
            width.degrees(),
            height.degrees()
        );
        let half = width.radians() / 2.0;

        let top = center.dec.radians() + height.radians() / 2.0;
        let (dectop, topwidth) = if top >= HALF_PI {
            (HALF_PI, TWOPI)
        } else {
            let (hypotenuse, beta) = right_triangle(half, HALF_PI - top);
            let dec = if top >= 0.0 { top } else { HALF_PI - hypotenuse };
            (dec, 2.0 * beta)
        };

        let bottom = center.dec.radians() - height.radians() / 2.0;
        let (decbottom, bottomwidth) = if bottom <= -HALF_PI {
            (-HALF_PI, TWOPI)
        } else {
            let (hypotenuse, beta) = right_triangle(half, HALF_PI - bottom);
            let dec = if bottom < 0.0 { bottom } else { HALF_PI - hypotenuse };
            (dec, 2.0 * beta)
        };

        let hull = Self::new(
            RaDec::new(center.ra, Angle::from_radians((dectop + decbottom) / 2.0)),
            Angle::from_radians(topwidth.max(bottomwidth)),
            Angle::from_radians(dectop - decbottom),
        );
        debug!("hull sky window: {}", hull);
        hull
    }

    /// The whole sky.
    pub fn all() -> Self {
        Self::new(
            RaDec::new(Angle::from_radians(PI), Angle::ZERO),
            Angle::from_radians(TWOPI),
            Angle::from_radians(PI),
        )
    }

    pub fn center(&self) -> RaDec {
        self.center
    }

    pub fn rawidth(&self) -> Angle {
        self.rawidth
    }

    pub fn decheight(&self) -> Angle {
        self.decheight
    }

    pub fn covers_all_ra(&self) -> bool {
        self.rawidth.radians() >= TWOPI - FULL_CIRCLE_EPSILON
    }

    pub fn contains(&self, position: &RaDec) -> bool {
        if !self.covers_all_ra() {
            let left = self.center.ra.radians() - self.rawidth.radians() / 2.0;
            let right = left + self.rawidth.radians();
            let ra = reduce(position.ra.radians(), left);
            if ra > right {
                return false;
            }
        }
        let (bottom, top) = self.decinterval();
        let dec = position.dec.radians();
        bottom.radians() <= dec && dec <= top.radians()
    }

    /// Declination interval covered by the window, clamped to ±90°.
    pub fn decinterval(&self) -> (Angle, Angle) {
        let half = self.decheight.radians() / 2.0;
        let bottom = (self.center.dec.radians() - half).max(-HALF_PI);
        let top = (self.center.dec.radians() + half).min(HALF_PI);
        (Angle::from_radians(bottom), Angle::from_radians(top))
    }

    /// Upper declination edge, at most +90°.
    pub fn topdec(&self) -> Angle {
        self.decinterval().1
    }

    /// Lower declination edge, at least -90°.
    pub fn bottomdec(&self) -> Angle {
        self.decinterval().0
    }

    /// Left (smaller) RA edge, reduced to `[0, 2π)`.
    pub fn leftra(&self) -> Angle {
        (self.center.ra - self.rawidth * 0.5).reduced()
    }

    /// Right (larger) RA edge, reduced to `[0, 2π)`.
    pub fn rightra(&self) -> Angle {
        (self.center.ra + self.rawidth * 0.5).reduced()
    }

    /// True if the RA interval crosses 0h.
    pub fn wraps(&self) -> bool {
        !self.covers_all_ra() && self.leftra() > self.rightra()
    }
}

/// Hypotenuse and pole angle of the right spherical triangle with legs `b`
/// (along the rectangle edge) and `c` (pole to edge midpoint).
fn right_triangle(b: f64, c: f64) -> (f64, f64) {
    let hypotenuse = libm::acos((libm::cos(b) * libm::cos(c)).clamp(-1.0, 1.0));
    let denominator = libm::sin(hypotenuse) * libm::sin(c);
    if denominator.abs() < f64::EPSILON {
        return (hypotenuse, 0.0);
    }
    let cosbeta = (libm::cos(b) - libm::cos(hypotenuse) * libm::cos(c)) / denominator;
    (hypotenuse, libm::acos(cosbeta.clamp(-1.0, 1.0)))
}

impl fmt::Display for SkyWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.3}[h]x{:.3}[deg]@{}",
            self.rawidth.hours(),
            self.decheight.degrees(),
            self.center
        )
    }
}

/// Inclusive magnitude interval. Smaller magnitudes are brighter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MagnitudeRange {
    brightest: f32,
    faintest: f32,
}

impl MagnitudeRange {
    /// Lower bound that means "no bright limit".
    pub const NO_BRIGHT_LIMIT: f32 = -30.0;
    pub const NO_FAINT_LIMIT: f32 = 30.0;

    pub fn new(brightest: f32, faintest: f32) -> Self {
        Self {
            brightest,
            faintest,
        }
    }

    /// Everything brighter than or as bright as `faintest`.
    pub fn up_to(faintest: f32) -> Self {
        Self::new(Self::NO_BRIGHT_LIMIT, faintest)
    }

    pub fn unlimited() -> Self {
        Self::new(Self::NO_BRIGHT_LIMIT, Self::NO_FAINT_LIMIT)
    }

    pub fn brightest(&self) -> f32 {
        self.brightest
    }

    pub fn faintest(&self) -> f32 {
        self.faintest
    }

    pub fn contains(&self, mag: f32) -> bool {
        self.brightest <= mag && mag <= self.faintest
    }
}

impl fmt::Display for MagnitudeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.2}, {:.2}]", self.brightest, self.faintest)
    }
}
