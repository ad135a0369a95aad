//! Ray geometry computation at a planar interface.
//!
//! This module is the entry point of the optics core. It validates the
//! incident angle and refractive indices, applies Snell's law and lays out
//! the incident, reflected and refracted rays in the rendering frame.
//!
//! The engine provides:
//! - Validation of caller inputs before any trigonometry
//! - Refraction and total internal reflection classification
//! - Parallel sweeps over many incident angles
//! - A latest-result cache for rendering loops
//!
//! # Input Policy
//!
//! Invalid inputs are rejected with [`OpticsError::InvalidInput`], never
//! clamped. The incident angle must lie in `[0, 90)` degrees since grazing
//! incidence has no defined geometry, and both refractive indices must be
//! finite and strictly positive.

use log::debug;
use rayon::prelude::*;

use crate::error::{OpticsError, OpticsResult};
use crate::geometry::{Frame, RayGeometry};
use crate::medium::{self, Medium};
use crate::snell;

/// Exclusive upper bound of the incident angle in degrees.
pub const MAX_INCIDENT_ANGLE: f64 = 90.0;

/// Stateless calculator of [`RayGeometry`] within a fixed [`Frame`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OpticsEngine {
    frame: Frame,
}

impl OpticsEngine {
    pub fn new(frame: Frame) -> Self {
        Self { frame }
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Computes the ray geometry for a ray crossing from index `n1` into `n2`.
    ///
    /// **Context**: The rendering layer recomputes the geometry on every
    /// change of the incident angle or of either medium. The result is also
    /// the single source of the total internal reflection flag handed to the
    /// explanation collaborator.
    ///
    /// **How it Works**: Validates the inputs, then classifies the interface
    /// crossing with [`snell::get_theta_t`]. The reflected ray is laid out in
    /// every case; the refracted ray only exists when a real transmitted
    /// angle does.
    ///
    /// # Example
    /// ```rust
    /// use lumina::engine::OpticsEngine;
    ///
    /// let geometry = OpticsEngine::default().compute(45.0, 1.0, 1.5).unwrap();
    /// assert!(!geometry.total_internal_reflection);
    /// ```
    pub fn compute(&self, incident_angle_deg: f64, n1: f64, n2: f64) -> OpticsResult<RayGeometry> {
        validate_angle(incident_angle_deg)?;
        medium::validate_index(n1)?;
        medium::validate_index(n2)?;

        let transmission = snell::get_theta_t(incident_angle_deg.to_radians(), n1, n2);
        debug!(
            "compute: theta_i = {incident_angle_deg} deg, n1 = {n1}, n2 = {n2} -> {:?}",
            transmission
        );

        let theta_t = transmission.theta_t();
        if theta_t.is_some_and(|theta_t| !theta_t.is_finite()) {
            return Err(OpticsError::InvalidInput(format!(
                "no finite transmitted angle for theta_i = {incident_angle_deg} deg, n1 = {n1}, n2 = {n2}"
            )));
        }

        Ok(RayGeometry::build(
            &self.frame,
            incident_angle_deg,
            theta_t,
            n1,
            n2,
        ))
    }

    /// [`OpticsEngine::compute`] for a ray crossing from `incident` into `transmitted`.
    pub fn compute_media(
        &self,
        incident_angle_deg: f64,
        incident: &Medium,
        transmitted: &Medium,
    ) -> OpticsResult<RayGeometry> {
        self.compute(
            incident_angle_deg,
            incident.refractive_index,
            transmitted.refractive_index,
        )
    }

    /// Computes the geometry for every angle in `angles`, keeping their order.
    /// Fails if any angle is invalid.
    pub fn sweep(&self, angles: &[f64], n1: f64, n2: f64) -> OpticsResult<Vec<RayGeometry>> {
        angles
            .par_iter()
            .map(|&angle| self.compute(angle, n1, n2))
            .collect()
    }
}

/// Computes the ray geometry in the default frame.
pub fn compute(incident_angle_deg: f64, n1: f64, n2: f64) -> OpticsResult<RayGeometry> {
    OpticsEngine::default().compute(incident_angle_deg, n1, n2)
}

fn validate_angle(incident_angle_deg: f64) -> OpticsResult<()> {
    if !incident_angle_deg.is_finite()
        || incident_angle_deg < 0.0
        || incident_angle_deg >= MAX_INCIDENT_ANGLE
    {
        return Err(OpticsError::InvalidInput(format!(
            "incident angle must be in [0, {MAX_INCIDENT_ANGLE}) degrees, got {incident_angle_deg}"
        )));
    }
    Ok(())
}

/// Keeps the most recent geometry, keyed by the exact input tuple.
///
/// Rendering loops ask for the geometry every frame while the inputs change
/// rarely; this avoids recomputing it when nothing changed.
#[derive(Debug, Clone, Default)]
pub struct GeometryCache {
    engine: OpticsEngine,
    latest: Option<((f64, f64, f64), RayGeometry)>,
}

impl GeometryCache {
    pub fn new(engine: OpticsEngine) -> Self {
        Self {
            engine,
            latest: None,
        }
    }

    pub fn get(&mut self, incident_angle_deg: f64, n1: f64, n2: f64) -> OpticsResult<&RayGeometry> {
        let key = (incident_angle_deg, n1, n2);
        let entry = match self.latest.take() {
            Some((cached, geometry)) if cached == key => (cached, geometry),
            previous => match self.engine.compute(incident_angle_deg, n1, n2) {
                Ok(geometry) => (key, geometry),
                Err(error) => {
                    self.latest = previous;
                    return Err(error);
                }
            },
        };
        Ok(&self.latest.insert(entry).1)
    }

    /// Whether the last [`GeometryCache::get`] would be answered without recomputing.
    pub fn holds(&self, incident_angle_deg: f64, n1: f64, n2: f64) -> bool {
        matches!(&self.latest, Some((cached, _)) if *cached == (incident_angle_deg, n1, n2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::medium::{AIR, DIAMOND, GLASS, WATER};

    #[test]
    fn rejects_out_of_range_angles() {
        for angle in [-0.1, 90.0, 120.0, f64::NAN, f64::INFINITY] {
            let result = compute(angle, 1.0, 1.5);
            assert!(
                matches!(result, Err(OpticsError::InvalidInput(_))),
                "angle: {}",
                angle
            );
        }
        assert!(compute(89.999, 1.0, 1.5).is_ok());
    }

    #[test]
    fn rejects_non_positive_indices() {
        for (n1, n2) in [(0.0, 1.0), (1.0, 0.0), (-1.5, 1.0), (1.0, f64::NAN)] {
            assert!(matches!(
                compute(30.0, n1, n2),
                Err(OpticsError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn extreme_index_ratios_stay_finite() {
        for (n1, n2) in [(1e200, 1e-200), (1e-200, 1e200), (f64::MAX, f64::MIN_POSITIVE)] {
            let normal = compute(0.0, n1, n2).unwrap();
            assert_eq!(normal.transmission_angle_deg, Some(0.0), "n1: {}, n2: {}", n1, n2);
            let refracted = normal.refracted.unwrap();
            assert!(refracted.end.x.is_finite() && refracted.end.y.is_finite());

            let oblique = compute(30.0, n1, n2).unwrap();
            match oblique.transmission_angle_deg {
                Some(theta_t) => assert!(theta_t.is_finite()),
                None => assert!(oblique.total_internal_reflection),
            }
        }
        assert!(compute(30.0, 1e200, 1e-200).unwrap().total_internal_reflection);
    }

    #[test]
    fn media_match_indices() {
        let engine = OpticsEngine::default();
        let from_media = engine.compute_media(30.0, &WATER, &DIAMOND).unwrap();
        let from_indices = engine.compute(30.0, 1.33, 2.42).unwrap();
        assert_eq!(from_media, from_indices);
    }

    #[test]
    fn sweep_keeps_order() {
        let angles = [0.0, 10.0, 20.0, 30.0, 40.0, 50.0];
        let geometries = OpticsEngine::default()
            .sweep(&angles, GLASS.refractive_index, AIR.refractive_index)
            .unwrap();
        assert_eq!(geometries.len(), angles.len());
        for (geometry, angle) in geometries.iter().zip(angles) {
            assert_eq!(geometry.incident_angle_deg, angle);
        }
        assert!(!geometries[4].total_internal_reflection);
        assert!(geometries[5].total_internal_reflection);
    }

    #[test]
    fn sweep_fails_on_invalid_angle() {
        let result = OpticsEngine::default().sweep(&[10.0, 95.0], 1.0, 1.5);
        assert!(result.is_err());
    }

    #[test]
    fn cache_recomputes_on_change() {
        let mut cache = GeometryCache::default();
        assert!(!cache.holds(30.0, 1.0, 1.5));
        let first = cache.get(30.0, 1.0, 1.5).unwrap().clone();
        assert!(cache.holds(30.0, 1.0, 1.5));
        assert_eq!(cache.get(30.0, 1.0, 1.5).unwrap(), &first);
        let second = cache.get(31.0, 1.0, 1.5).unwrap().clone();
        assert_ne!(first, second);
        assert!(!cache.holds(30.0, 1.0, 1.5));
    }

    #[test]
    fn cache_keeps_previous_on_error() {
        let mut cache = GeometryCache::default();
        cache.get(30.0, 1.0, 1.5).unwrap();
        assert!(cache.get(30.0, 0.0, 1.5).is_err());
        assert!(cache.holds(30.0, 1.0, 1.5));
    }
}
