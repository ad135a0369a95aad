use std::io::Write;

use anyhow::Result;
use chrono::Utc;
use itertools::Itertools;
use nalgebra::Point2;
use serde::Serialize;

use crate::geometry::RayGeometry;
use crate::medium::{Medium, CATALOG};
use crate::settings::OutputFormat;


#[derive(Serialize)]
struct GeometryReport<'a> {
    generated_at: String,
    incident_medium: &'a Medium,
    transmitted_medium: &'a Medium,
    geometry: &'a RayGeometry,
}

#[derive(Serialize)]
struct SweepReport<'a> {
    generated_at: String,
    geometries: &'a [RayGeometry],
}

fn timestamp() -> String {
    Utc::now().to_rfc3339()
}

fn point(p: &Point2<f64>) -> String {
    format!("({:.1}, {:.1})", p.x, p.y)
}

fn angle(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2} deg", v))
        .unwrap_or_else(|| "none".to_string())
}

/// Writes one geometry in the requested format.
pub fn write_geometry(
    writer: &mut impl Write,
    incident: &Medium,
    transmitted: &Medium,
    geometry: &RayGeometry,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Text => write_geometry_text(writer, incident, transmitted, geometry),
        OutputFormat::Json => write_geometry_json(writer, incident, transmitted, geometry),
    }
}

/// Human readable report of one geometry.
pub fn write_geometry_text(
    writer: &mut impl Write,
    incident: &Medium,
    transmitted: &Medium,
    geometry: &RayGeometry,
) -> Result<()> {
    writeln!(
        writer,
        "{} -> {} (n1 = {}, n2 = {})",
        incident.name, transmitted.name, geometry.n1, geometry.n2
    )?;
    writeln!(writer, "  Incident angle: {:.2} deg", geometry.incident_angle_deg)?;
    writeln!(writer, "  Reflection angle: {:.2} deg", geometry.reflection_angle_deg)?;
    writeln!(
        writer,
        "  Transmission angle: {}",
        angle(geometry.transmission_angle_deg)
    )?;
    writeln!(writer, "  Critical angle: {}", angle(geometry.critical_angle_deg()))?;
    writeln!(
        writer,
        "  Total internal reflection: {}",
        if geometry.total_internal_reflection { "YES" } else { "no" }
    )?;
    writeln!(writer, "  Bend: {:?}", geometry.bend())?;
    writeln!(
        writer,
        "  Incident ray: {} -> {}",
        point(&geometry.incident.start),
        point(&geometry.incident.end)
    )?;
    writeln!(
        writer,
        "  Reflected ray: {} -> {}",
        point(&geometry.reflected.start),
        point(&geometry.reflected.end)
    )?;
    if let Some(refracted) = &geometry.refracted {
        writeln!(
            writer,
            "  Refracted ray: {} -> {}",
            point(&refracted.start),
            point(&refracted.end)
        )?;
    }
    writeln!(
        writer,
        "  Speed of light: {:.0} km/s -> {:.0} km/s",
        incident.light_speed(),
        transmitted.light_speed()
    )?;
    Ok(())
}

/// JSON report of one geometry, stamped with the time of writing.
pub fn write_geometry_json(
    writer: &mut impl Write,
    incident: &Medium,
    transmitted: &Medium,
    geometry: &RayGeometry,
) -> Result<()> {
    let report = GeometryReport {
        generated_at: timestamp(),
        incident_medium: incident,
        transmitted_medium: transmitted,
        geometry,
    };
    serde_json::to_writer_pretty(&mut *writer, &report)?;
    writeln!(writer)?;
    Ok(())
}

/// Table of a sweep over incident angles, one row per angle.
pub fn write_sweep(
    writer: &mut impl Write,
    geometries: &[RayGeometry],
    format: OutputFormat,
) -> Result<()> {
    if format == OutputFormat::Json {
        let report = SweepReport {
            generated_at: timestamp(),
            geometries,
        };
        serde_json::to_writer_pretty(&mut *writer, &report)?;
        writeln!(writer)?;
        return Ok(());
    }

    writeln!(
        writer,
        "{:>10} {:>12} {:>12}",
        "theta_i", "theta_t", "deviation"
    )?;
    for geometry in geometries {
        let (theta_t, deviation) = match (geometry.transmission_angle_deg, geometry.deviation_deg()) {
            (Some(theta_t), Some(deviation)) => (format!("{:.2}", theta_t), format!("{:.2}", deviation)),
            _ => ("TIR".to_string(), "-".to_string()),
        };
        writeln!(
            writer,
            "{:>10.2} {:>12} {:>12}",
            geometry.incident_angle_deg, theta_t, deviation
        )?;
    }
    Ok(())
}

/// Lists the media catalog.
pub fn write_media(writer: &mut impl Write) -> Result<()> {
    writeln!(
        writer,
        "{}",
        ["name", "n", "c (km/s)", "description"]
            .iter()
            .join("\t")
    )?;
    for medium in CATALOG.iter() {
        let row = [
            medium.name.to_string(),
            medium.refractive_index.to_string(),
            format!("{:.0}", medium.light_speed()),
            medium.description.to_string(),
        ];
        writeln!(writer, "{}", row.iter().join("\t"))?;
    }
    Ok(())
}
