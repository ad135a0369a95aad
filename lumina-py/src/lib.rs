use lumina::{engine, geometry, medium::CATALOG};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

type Segment = ((f64, f64), (f64, f64));

fn segment(ray: &geometry::Ray) -> Segment {
    ((ray.start.x, ray.start.y), (ray.end.x, ray.end.y))
}

/// Ray geometry at the interface for one incident angle and pair of media.
#[pyclass(name = "RayGeometry", frozen)]
struct RayGeometry {
    inner: geometry::RayGeometry,
}

#[pymethods]
impl RayGeometry {
    #[getter]
    fn incident_angle_deg(&self) -> f64 {
        self.inner.incident_angle_deg
    }

    #[getter]
    fn reflection_angle_deg(&self) -> f64 {
        self.inner.reflection_angle_deg
    }

    /// Transmitted angle in degrees, or None under total internal reflection.
    #[getter]
    fn transmission_angle_deg(&self) -> Option<f64> {
        self.inner.transmission_angle_deg
    }

    #[getter]
    fn total_internal_reflection(&self) -> bool {
        self.inner.total_internal_reflection
    }

    #[getter]
    fn interface_point(&self) -> (f64, f64) {
        (self.inner.interface_point.x, self.inner.interface_point.y)
    }

    #[getter]
    fn incident(&self) -> Segment {
        segment(&self.inner.incident)
    }

    #[getter]
    fn reflected(&self) -> Segment {
        segment(&self.inner.reflected)
    }

    #[getter]
    fn refracted(&self) -> Option<Segment> {
        self.inner.refracted.as_ref().map(segment)
    }

    fn __repr__(&self) -> String {
        format!(
            "RayGeometry(incident_angle_deg={}, transmission_angle_deg={:?}, total_internal_reflection={})",
            self.inner.incident_angle_deg,
            self.inner.transmission_angle_deg,
            self.inner.total_internal_reflection
        )
    }
}

/// Computes the ray geometry for a ray crossing from index n1 into n2.
#[pyfunction]
fn compute(angle: f64, n1: f64, n2: f64) -> PyResult<RayGeometry> {
    engine::compute(angle, n1, n2)
        .map(|inner| RayGeometry { inner })
        .map_err(|e| PyValueError::new_err(e.to_string()))
}

/// The media catalog as (name, refractive index) pairs.
#[pyfunction]
fn media() -> Vec<(&'static str, f64)> {
    CATALOG
        .iter()
        .map(|m| (m.name, m.refractive_index))
        .collect()
}

/// A Python module implemented in Rust.
#[pymodule]
fn _lumina_py(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(compute, m)?)?;
    m.add_function(wrap_pyfunction!(media, m)?)?;
    m.add_class::<RayGeometry>()?;
    Ok(())
}
