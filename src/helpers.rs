//! Drawing helpers for the interactive viewer.
//!
//! This module renders a computed [`RayGeometry`] with macroquad. Frame
//! coordinates are scaled uniformly into the window so the aspect ratio of
//! the frame is preserved.
//!
//! The helpers provide:
//! - Media bands colored after the catalog colors
//! - The dashed interface normal
//! - Incident, reflected and refracted rays, with the reflected ray
//!   emphasized under total internal reflection
//! - Angle labels

use macroquad::prelude::*;
use nalgebra::Point2;

use crate::geometry::{Frame, RayGeometry};
use crate::medium::Medium;

const RAY_COLOR: Color = Color::new(0.0, 0.94, 1.0, 1.0);
const NORMAL_COLOR: Color = Color::new(1.0, 0.0, 1.0, 0.4);
const TIR_COLOR: Color = Color::new(1.0, 0.0, 0.33, 1.0);
const DASH: f32 = 5.0;

fn scale(frame: &Frame) -> f32 {
    (screen_width() / frame.width as f32).min(screen_height() / frame.height as f32)
}

/// Converts frame coordinates into window pixels.
pub fn to_screen(point: &Point2<f64>, frame: &Frame) -> Vec2 {
    let s = scale(frame);
    vec2(point.x as f32 * s, point.y as f32 * s)
}

fn medium_color(medium: &Medium, alpha: u8) -> Color {
    match medium.rgb() {
        Ok([r, g, b]) => Color::from_rgba(r, g, b, alpha),
        Err(_) => Color::from_rgba(128, 128, 128, alpha),
    }
}

/// Fills the upper half of the frame with the incident medium and the lower
/// half with the transmitted one.
pub fn draw_media(frame: &Frame, incident: &Medium, transmitted: &Medium) {
    let s = scale(frame);
    let (w, h) = (frame.width as f32 * s, frame.height as f32 * s);
    draw_rectangle(0.0, 0.0, w, h / 2.0, medium_color(incident, 16));
    draw_rectangle(0.0, h / 2.0, w, h / 2.0, medium_color(transmitted, 32));
    draw_line(0.0, h / 2.0, w, h / 2.0, 1.0, GRAY);
    draw_text(
        &format!("{} (n={})", incident.name, incident.refractive_index),
        16.0,
        24.0,
        18.0,
        SKYBLUE,
    );
    draw_text(
        &format!("{} (n={})", transmitted.name, transmitted.refractive_index),
        16.0,
        h - 16.0,
        18.0,
        VIOLET,
    );
}

fn draw_dashed_line(from: Vec2, to: Vec2, thickness: f32, color: Color) {
    let length = from.distance(to);
    if length == 0.0 {
        return;
    }
    let step = (to - from) / length;
    let mut t = 0.0;
    while t < length {
        let a = from + step * t;
        let b = from + step * (t + DASH).min(length);
        draw_line(a.x, a.y, b.x, b.y, thickness, color);
        t += 2.0 * DASH;
    }
}

/// Draws the normal, the rays and the angle labels of `geometry`.
pub fn draw_geometry(geometry: &RayGeometry, frame: &Frame) {
    let s = scale(frame);
    let center = to_screen(&geometry.interface_point, frame);
    let margin = 50.0 * s;

    draw_dashed_line(
        vec2(center.x, margin),
        vec2(center.x, frame.height as f32 * s - margin),
        1.0,
        NORMAL_COLOR,
    );

    let source = to_screen(&geometry.incident.start, frame);
    draw_line(source.x, source.y, center.x, center.y, 4.0, RAY_COLOR);

    if let Some(refracted) = &geometry.refracted {
        let end = to_screen(&refracted.end, frame);
        draw_line(center.x, center.y, end.x, end.y, 3.0, RAY_COLOR);
        draw_text(
            &format!("{:.0}°", refracted.angle_deg),
            center.x + 20.0,
            center.y + 60.0,
            18.0,
            WHITE,
        );
    }

    // the reflected ray carries all the light under total internal reflection
    let reflected_end = to_screen(&geometry.reflected.end, frame);
    let (thickness, alpha) = if geometry.total_internal_reflection {
        (4.0, 1.0)
    } else {
        (1.0, 0.3)
    };
    draw_line(
        center.x,
        center.y,
        reflected_end.x,
        reflected_end.y,
        thickness,
        Color { a: alpha, ..RAY_COLOR },
    );

    draw_text(
        &format!("{}°", geometry.incident_angle_deg),
        center.x - 60.0,
        center.y - 60.0,
        18.0,
        WHITE,
    );

    if geometry.total_internal_reflection {
        let label = "Total internal reflection!";
        let size = measure_text(label, None, 28, 1.0);
        draw_text(label, center.x - size.width / 2.0, center.y + 40.0, 28.0, TIR_COLOR);
    }
}
