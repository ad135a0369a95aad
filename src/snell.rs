//! Snell's law for real refractive indices.
//!
//! This module implements the scalar part of refraction at a planar interface:
//! the sine of the transmitted angle, the classification into refraction or
//! total internal reflection, and the critical angle. All angles are in
//! radians and are measured from the interface normal.
//!
//! The implementation provides:
//! - Transmitted angle from the principal branch of arcsine
//! - Total internal reflection test with an explicit grazing tolerance
//! - Critical angle for optically denser incidence media
//!
//! # Boundary Classification
//!
//! Exactly at the critical angle the transmitted ray grazes the interface.
//! Rounding can push `sin(theta_t)` a few ulps above one there, so values
//! within [`GRAZING_TOLERANCE`] of one are clamped and count as refraction.


/// Sines of the transmitted angle up to `1 + GRAZING_TOLERANCE` still refract.
pub const GRAZING_TOLERANCE: f64 = 1e-12;

/// Outcome of a ray meeting the interface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transmission {
    /// A real transmitted angle exists, in radians from the normal.
    Refracted { theta_t: f64 },
    /// No real transmitted angle exists; all light stays in the first medium.
    TotalInternalReflection,
}

impl Transmission {
    pub fn theta_t(&self) -> Option<f64> {
        match self {
            Transmission::Refracted { theta_t } => Some(*theta_t),
            Transmission::TotalInternalReflection => None,
        }
    }

    pub fn is_tir(&self) -> bool {
        matches!(self, Transmission::TotalInternalReflection)
    }
}

/// Sine of the transmitted angle, `n1 sin(theta_i) / n2`.
///
/// The result may exceed one in magnitude, which signals total internal
/// reflection. Callers guarantee finite `n1` and `n2 > 0`. The sine is applied
/// before the division so that normal incidence stays exactly zero even when
/// `n1 / n2` would overflow.
pub fn sin_theta_t(theta_i: f64, n1: f64, n2: f64) -> f64 {
    n1 * theta_i.sin() / n2
}

/// Computes the transmitted angle using Snell's law for real refractive indices.
///
/// **Context**: A ray crossing from a medium of index `n1` into one of index
/// `n2` bends according to `n1 sin(theta_i) = n2 sin(theta_t)`. When the ray
/// travels into an optically thinner medium beyond the critical angle there is
/// no real solution and the ray is totally internally reflected.
///
/// **How it Works**: Matched indices short-circuit to the incident angle so the
/// ray passes straight through without rounding. Otherwise the sine of the
/// transmitted angle is tested against one with [`GRAZING_TOLERANCE`], clamped,
/// and inverted on the principal branch of arcsine.
///
/// # Example
/// ```rust
/// use lumina::snell::{get_theta_t, Transmission};
///
/// let transmission = get_theta_t(0.5, 1.0, 1.5);
/// assert!(matches!(transmission, Transmission::Refracted { .. }));
/// ```
pub fn get_theta_t(theta_i: f64, n1: f64, n2: f64) -> Transmission {
    if n1 == n2 {
        return Transmission::Refracted { theta_t: theta_i };
    }

    let stt = sin_theta_t(theta_i, n1, n2);
    if stt.abs() > 1.0 + GRAZING_TOLERANCE {
        return Transmission::TotalInternalReflection;
    }

    Transmission::Refracted {
        theta_t: stt.clamp(-1.0, 1.0).asin(),
    }
}

/// Critical angle in radians, `asin(n2 / n1)`.
///
/// Only an optically denser incidence medium has one, so this returns `None`
/// when `n1 <= n2`.
pub fn critical_angle(n1: f64, n2: f64) -> Option<f64> {
    if n1 > n2 {
        Some((n2 / n1).asin())
    } else {
        None
    }
}
