//! Refraction and total internal reflection of a light ray at a planar
//! interface between two media.
//!
//! The [`engine`] turns an incident angle and two refractive indices into a
//! [`geometry::RayGeometry`] ready for rendering. Explanations of the result
//! come from a swappable [`explain::Explainer`], driven in the background by
//! the [`tutor`].

pub mod engine;
pub mod error;
pub mod explain;
pub mod geometry;
#[cfg(feature = "visualization")]
pub mod helpers;
pub mod medium;
pub mod output;
pub mod settings;
pub mod snell;
pub mod tutor;
