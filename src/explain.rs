//! Natural-language explanations of a computed ray geometry.
//!
//! An [`Explainer`] turns the outcome of one computation into a short text
//! for learners. Explainers are swappable: a remote text-generation service
//! can sit behind the trait, while [`LocalExplainer`] answers offline and
//! deterministically. Explanations never feed back into the geometry.

use std::{error::Error, fmt::Display};

use serde::Serialize;

use crate::geometry::{Bend, RayGeometry};
use crate::medium::Medium;

/// Shown before the first explanation arrives.
pub const IDLE_MESSAGE: &str = "Adjust the controls to start the experiment!";

/// Shown when an explainer fails or does not answer in time.
pub const FALLBACK_MESSAGE: &str =
    "The tutor can't reach the science library right now, but the rays still show exactly what the light is doing!";

/// A medium as seen by an explainer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediumLabel {
    pub name: String,
    pub refractive_index: f64,
}

impl From<&Medium> for MediumLabel {
    fn from(medium: &Medium) -> Self {
        Self {
            name: medium.name.to_string(),
            refractive_index: medium.refractive_index,
        }
    }
}

/// Inputs of one explanation.
///
/// Holds the engine's total internal reflection flag instead of deriving it
/// again, so every consumer agrees with the rendered geometry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplainRequest {
    pub incident_angle_deg: f64,
    pub incident: MediumLabel,
    pub transmitted: MediumLabel,
    pub total_internal_reflection: bool,
    pub bend: Bend,
}

impl ExplainRequest {
    pub fn from_geometry(incident: &Medium, transmitted: &Medium, geometry: &RayGeometry) -> Self {
        Self {
            incident_angle_deg: geometry.incident_angle_deg,
            incident: incident.into(),
            transmitted: transmitted.into(),
            total_internal_reflection: geometry.total_internal_reflection,
            bend: geometry.bend(),
        }
    }
}

/// An explainer could not produce a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unavailable(pub String);

impl Display for Unavailable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Explainer unavailable:{}", self.0)
    }
}
impl Error for Unavailable {}

/// Produces a short explanation of what the light does.
pub trait Explainer: Send + Sync {
    fn explain(&self, request: &ExplainRequest) -> Result<String, Unavailable>;
}

/// Offline explainer with fixed phrasing.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalExplainer;

impl Explainer for LocalExplainer {
    fn explain(&self, request: &ExplainRequest) -> Result<String, Unavailable> {
        let from = &request.incident;
        let to = &request.transmitted;

        if request.total_internal_reflection {
            return Ok(format!(
                "Whoa, the light is trapped! Going from {} (n = {}) into {} (n = {}) at {}°, the ray hits the boundary too steeply to escape, so it bounces straight back like a ball off a wall. That's total internal reflection!",
                from.name, from.refractive_index, to.name, to.refractive_index, request.incident_angle_deg
            ));
        }

        let text = match request.bend {
            Bend::Straight if from.refractive_index == to.refractive_index => format!(
                "Both sides have the same refractive index (n = {}), so the light doesn't notice the boundary at all and zooms straight through!",
                from.refractive_index
            ),
            Bend::Straight => format!(
                "The ray hits {} head-on, so it slows down (or speeds up) evenly and keeps going perfectly straight!",
                to.name
            ),
            Bend::TowardNormal => format!(
                "The light slows down when it enters {} (n = {}) from {} (n = {}), so it bends toward the normal, just like a car whose wheel rolls from the road into mud and swings around!",
                to.name, to.refractive_index, from.name, from.refractive_index
            ),
            Bend::AwayFromNormal => format!(
                "The light speeds up when it leaves {} (n = {}) for {} (n = {}), so it bends away from the normal. Tilt it a bit more and it might get trapped!",
                from.name, from.refractive_index, to.name, to.refractive_index
            ),
        };
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine;
    use crate::medium::{AIR, DIAMOND, GLASS, WATER};

    fn request(angle: f64, from: &Medium, to: &Medium) -> ExplainRequest {
        let geometry = engine::compute(angle, from.refractive_index, to.refractive_index).unwrap();
        ExplainRequest::from_geometry(from, to, &geometry)
    }

    #[test]
    fn request_carries_engine_tir_flag() {
        assert!(request(60.0, &GLASS, &AIR).total_internal_reflection);
        assert!(!request(60.0, &AIR, &GLASS).total_internal_reflection);
    }

    #[test]
    fn local_tir() {
        let text = LocalExplainer.explain(&request(60.0, &DIAMOND, &WATER)).unwrap();
        assert!(text.contains("total internal reflection"));
        assert!(text.contains("Diamond"));
    }

    #[test]
    fn local_bending() {
        let toward = LocalExplainer.explain(&request(45.0, &AIR, &GLASS)).unwrap();
        assert!(toward.contains("toward the normal"));
        let away = LocalExplainer.explain(&request(20.0, &GLASS, &AIR)).unwrap();
        assert!(away.contains("away from the normal"));
    }

    #[test]
    fn local_straight() {
        let matched = LocalExplainer.explain(&request(45.0, &WATER, &WATER)).unwrap();
        assert!(matched.contains("same refractive index"));
        let normal = LocalExplainer.explain(&request(0.0, &AIR, &DIAMOND)).unwrap();
        assert!(normal.contains("straight"));
    }

    #[test]
    fn unavailable_display() {
        let error = Unavailable("missing API key".to_string());
        assert_eq!(error.to_string(), "Explainer unavailable:missing API key");
    }
}
