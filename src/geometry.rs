//! Ray geometry at a planar interface.
//!
//! This module defines the rendering frame and the immutable description of
//! the incident, reflected and refracted rays that the engine derives from
//! the incident angle and the two refractive indices.
//!
//! The geometry system provides:
//! - A configurable frame whose center holds the interface point
//! - Ray endpoints at a fixed rendering length
//! - Unit propagation directions for each ray
//! - Derived queries for bending direction and deviation
//!
//! # Coordinate System
//!
//! Screen convention: x grows to the right, y grows downwards. The first
//! medium fills the upper half of the frame and the interface runs
//! horizontally through the frame center, so the interface normal is the
//! vertical line through the center.

use nalgebra::{Point2, Unit, Vector2};
use serde::{Deserialize, Serialize};

use crate::snell;

/// Rendering frame. Its size and ray length are display constants and have
/// no bearing on the computed angles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub width: f64,
    pub height: f64,
    pub ray_length: f64,
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            ray_length: 400.0,
        }
    }
}

impl Frame {
    pub fn center(&self) -> Point2<f64> {
        Point2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Point at `ray_length` from the center along `direction`.
    pub fn extend(&self, direction: &Unit<Vector2<f64>>) -> Point2<f64> {
        self.center() + direction.into_inner() * self.ray_length
    }
}

/// A straight ray segment with its angle from the interface normal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Ray {
    pub start: Point2<f64>,
    pub end: Point2<f64>,
    /// Unit vector pointing along the propagation of light.
    pub direction: Unit<Vector2<f64>>,
    pub angle_deg: f64,
}

impl Ray {
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }
}

/// Which way a transmitted ray bends relative to the normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Bend {
    TowardNormal,
    AwayFromNormal,
    Straight,
}

/// Geometry of all rays at the interface for one set of inputs.
///
/// Never updated in place: a change of any input produces a new value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RayGeometry {
    pub incident_angle_deg: f64,
    pub n1: f64,
    pub n2: f64,
    pub frame_center: Point2<f64>,
    pub interface_point: Point2<f64>,
    pub incident: Ray,
    pub reflected: Ray,
    /// `None` under total internal reflection.
    pub refracted: Option<Ray>,
    pub reflection_angle_deg: f64,
    pub transmission_angle_deg: Option<f64>,
    pub total_internal_reflection: bool,
}

impl RayGeometry {
    /// Lays out the rays in `frame` for the incident angle in degrees and the
    /// transmitted angle `theta_t` in radians.
    pub(crate) fn build(
        frame: &Frame,
        incident_angle_deg: f64,
        theta_t: Option<f64>,
        n1: f64,
        n2: f64,
    ) -> Self {
        let center = frame.center();
        let theta_i = incident_angle_deg.to_radians();
        let (sti, cti) = theta_i.sin_cos();

        // light travels from the source down to the interface
        let incident_direction = Unit::new_normalize(Vector2::new(sti, cti));
        let incident = Ray {
            start: center - incident_direction.into_inner() * frame.ray_length,
            end: center,
            direction: incident_direction,
            angle_deg: incident_angle_deg,
        };

        let reflected_direction = Unit::new_normalize(Vector2::new(sti, -cti));
        let reflected = Ray {
            start: center,
            end: frame.extend(&reflected_direction),
            direction: reflected_direction,
            angle_deg: incident_angle_deg,
        };

        let refracted = theta_t.map(|theta_t| {
            let (stt, ctt) = theta_t.sin_cos();
            let direction = Unit::new_normalize(Vector2::new(stt, ctt));
            Ray {
                start: center,
                end: frame.extend(&direction),
                direction,
                // an unbent ray keeps the caller's angle exactly
                angle_deg: if theta_t == theta_i {
                    incident_angle_deg
                } else {
                    theta_t.to_degrees()
                },
            }
        });

        Self {
            incident_angle_deg,
            n1,
            n2,
            frame_center: center,
            interface_point: center,
            incident,
            reflected,
            refracted,
            reflection_angle_deg: incident_angle_deg,
            transmission_angle_deg: refracted.map(|r| r.angle_deg),
            total_internal_reflection: theta_t.is_none(),
        }
    }

    pub fn bend(&self) -> Bend {
        if self.n1 == self.n2 || self.incident_angle_deg == 0.0 {
            Bend::Straight
        } else if self.n2 > self.n1 {
            Bend::TowardNormal
        } else {
            Bend::AwayFromNormal
        }
    }

    /// Angle between the incident and the refracted ray, `theta_i - theta_t`.
    /// Positive when the ray bends toward the normal.
    pub fn deviation_deg(&self) -> Option<f64> {
        self.transmission_angle_deg
            .map(|theta_t| self.incident_angle_deg - theta_t)
    }

    pub fn critical_angle_deg(&self) -> Option<f64> {
        snell::critical_angle(self.n1, self.n2).map(f64::to_degrees)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn frame_center() {
        let frame = Frame::default();
        assert_eq!(frame.center(), Point2::new(400.0, 300.0));
    }

    #[test]
    fn rays_meet_at_interface() {
        let frame = Frame::default();
        let geometry = RayGeometry::build(&frame, 30.0, Some(0.2), 1.0, 1.5);
        assert_eq!(geometry.incident.end, geometry.interface_point);
        assert_eq!(geometry.reflected.start, geometry.interface_point);
        assert_eq!(geometry.refracted.unwrap().start, geometry.interface_point);
        assert_eq!(geometry.interface_point, geometry.frame_center);
        assert_abs_diff_eq!(geometry.incident.length(), 400.0, epsilon = 1e-9);
        assert_abs_diff_eq!(geometry.reflected.length(), 400.0, epsilon = 1e-9);
    }

    #[test]
    fn incident_side_is_above() {
        let geometry = RayGeometry::build(&Frame::default(), 30.0, Some(0.2), 1.0, 1.5);
        // source upper left, reflection upper right, refraction lower right
        assert!(geometry.incident.start.x < 400.0 && geometry.incident.start.y < 300.0);
        assert!(geometry.reflected.end.x > 400.0 && geometry.reflected.end.y < 300.0);
        let refracted = geometry.refracted.unwrap();
        assert!(refracted.end.x > 400.0 && refracted.end.y > 300.0);
        assert_abs_diff_eq!(geometry.incident.start.x, 200.0, epsilon = 1e-9);
        assert_abs_diff_eq!(geometry.reflected.end.x, 600.0, epsilon = 1e-9);
    }

    #[test]
    fn tir_omits_refracted_ray() {
        let geometry = RayGeometry::build(&Frame::default(), 60.0, None, 1.5, 1.0);
        assert!(geometry.total_internal_reflection);
        assert!(geometry.refracted.is_none());
        assert!(geometry.transmission_angle_deg.is_none());
        assert!(geometry.deviation_deg().is_none());
        assert_eq!(geometry.bend(), Bend::AwayFromNormal);
    }

    #[test]
    fn ray_length_does_not_change_angles() {
        let short = Frame {
            ray_length: 10.0,
            ..Frame::default()
        };
        let a = RayGeometry::build(&short, 40.0, Some(0.4), 1.0, 1.5);
        let b = RayGeometry::build(&Frame::default(), 40.0, Some(0.4), 1.0, 1.5);
        assert_eq!(a.transmission_angle_deg, b.transmission_angle_deg);
        assert_eq!(a.incident.direction, b.incident.direction);
        assert_abs_diff_eq!(a.incident.length(), 10.0, epsilon = 1e-9);
    }
}
