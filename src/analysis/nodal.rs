//! Nodal corrections for lunar constituents.
//!
//! The 18.61-year precession of the lunar node modulates the amplitude (f)
//! and phase (u) of lunar constituents. Factors are evaluated once per fit
//! or prediction window at its central time.
//!
//! Formulas follow the standard Schureman/Doodson approximations in terms of
//! the longitude of the Moon's ascending node N:
//! ```text
//! f(M2) = 1.0004 - 0.0373 cos N + 0.0002 cos 2N
//! u(M2) = -2.14 sin N
//! ```

use super::constituents::{Constituent, NodalClass};

/// Datenum of J2000.0 (2000-01-01T12:00:00).
const J2000_DATENUM: f64 = 10957.5;

/// Nodal amplitude factor and phase offset (degrees).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodalFactors {
    pub f: f64,
    pub u: f64,
}

impl NodalFactors {
    /// No correction.
    pub const UNITY: Self = Self { f: 1.0, u: 0.0 };

    fn powi(self, n: i32) -> Self {
        Self {
            f: self.f.powi(n),
            u: self.u * n as f64,
        }
    }

    fn combine(self, other: Self) -> Self {
        Self {
            f: self.f * other.f,
            u: self.u + other.u,
        }
    }
}

impl Default for NodalFactors {
    fn default() -> Self {
        Self::UNITY
    }
}

/// Longitude of the Moon's ascending node in degrees [0, 360).
pub fn lunar_node_longitude(datenum: f64) -> f64 {
    let d = datenum - J2000_DATENUM;
    (125.04452 - 0.052_953_764_8 * d).rem_euclid(360.0)
}

/// Nodal factors for a constituent at a given datenum.
pub fn nodal_factors(constituent: &Constituent, datenum: f64) -> NodalFactors {
    let n = lunar_node_longitude(datenum).to_radians();
    factors_for_class(constituent.nodal, n)
}

/// Nodal factors for each constituent, or unity when `apply` is false.
pub(crate) fn factors_for(
    constituents: &[&'static Constituent],
    datenum: f64,
    apply: bool,
) -> Vec<NodalFactors> {
    constituents
        .iter()
        .map(|c| {
            if apply {
                nodal_factors(c, datenum)
            } else {
                NodalFactors::UNITY
            }
        })
        .collect()
}

fn factors_for_class(class: NodalClass, n: f64) -> NodalFactors {
    let (c1, c2, c3) = (n.cos(), (2.0 * n).cos(), (3.0 * n).cos());
    let (s1, s2, s3) = (n.sin(), (2.0 * n).sin(), (3.0 * n).sin());

    let m2 = NodalFactors {
        f: 1.0004 - 0.0373 * c1 + 0.0002 * c2,
        u: -2.14 * s1,
    };
    let k1 = NodalFactors {
        f: 1.0060 + 0.1150 * c1 - 0.0088 * c2 + 0.0006 * c3,
        u: -8.86 * s1 + 0.68 * s2 - 0.07 * s3,
    };

    match class {
        NodalClass::Solar => NodalFactors::UNITY,
        NodalClass::M2 => m2,
        NodalClass::K1 => k1,
        NodalClass::O1 => NodalFactors {
            f: 1.0089 + 0.1871 * c1 - 0.0147 * c2 + 0.0014 * c3,
            u: 10.80 * s1 - 1.34 * s2 + 0.19 * s3,
        },
        NodalClass::K2 => NodalFactors {
            f: 1.0241 + 0.2863 * c1 + 0.0083 * c2 - 0.0015 * c3,
            u: -17.74 * s1 + 0.68 * s2 - 0.04 * s3,
        },
        NodalClass::J1 => NodalFactors {
            f: 1.0129 + 0.1676 * c1 - 0.0170 * c2 + 0.0016 * c3,
            u: -12.94 * s1 + 1.34 * s2 - 0.19 * s3,
        },
        NodalClass::OO1 => NodalFactors {
            f: 1.1027 + 0.6504 * c1 + 0.0317 * c2 - 0.0014 * c3,
            u: -36.68 * s1 + 4.02 * s2 - 0.57 * s3,
        },
        NodalClass::Mf => NodalFactors {
            f: 1.043 + 0.414 * c1,
            u: -23.74 * s1 + 2.68 * s2 - 0.38 * s3,
        },
        NodalClass::Mm => NodalFactors {
            f: 1.000 - 0.130 * c1,
            u: 0.0,
        },
        NodalClass::M3 => NodalFactors {
            f: m2.f.powf(1.5),
            u: 1.5 * m2.u,
        },
        NodalClass::M2K1 => m2.combine(k1),
        NodalClass::M2Squared => m2.powi(2),
        NodalClass::M2Cubed => m2.powi(3),
        NodalClass::M2Fourth => m2.powi(4),
    }
}
