use std::sync::Arc;

use lumina::engine::GeometryCache;
use lumina::explain::{ExplainRequest, LocalExplainer, IDLE_MESSAGE};
use lumina::helpers::{draw_geometry, draw_media};
use lumina::medium::CATALOG;
use lumina::settings;
use lumina::tutor::Tutor;
use macroquad::prelude::*;

#[macroquad::main("Lumina")]
async fn main() {
    let settings = settings::load_default_config().unwrap();
    let frame = settings.frame;
    let mut cache = GeometryCache::new(settings.engine());
    let tutor = Tutor::spawn(Arc::new(LocalExplainer), settings.tutor).unwrap();

    let mut angle = settings.angle.min(settings.max_slider_angle);
    let mut from = CATALOG
        .iter()
        .position(|m| m.name.eq_ignore_ascii_case(&settings.incident_medium))
        .unwrap_or(1);
    let mut to = CATALOG
        .iter()
        .position(|m| m.name.eq_ignore_ascii_case(&settings.transmitted_medium))
        .unwrap_or(3);
    let mut explanation = IDLE_MESSAGE.to_string();
    let mut dirty = true;

    println!("Up/Down: angle, 1: next upper medium, 2: next lower medium, Escape: quit");

    loop {
        if is_key_pressed(KeyCode::Escape) {
            break;
        }
        if is_key_down(KeyCode::Up) {
            angle = (angle + 0.5).min(settings.max_slider_angle);
            dirty = true;
        }
        if is_key_down(KeyCode::Down) {
            angle = (angle - 0.5).max(0.0);
            dirty = true;
        }
        if is_key_pressed(KeyCode::Key1) {
            from = (from + 1) % CATALOG.len();
            dirty = true;
        }
        if is_key_pressed(KeyCode::Key2) {
            to = (to + 1) % CATALOG.len();
            dirty = true;
        }

        let (incident, transmitted) = (&CATALOG[from], &CATALOG[to]);
        clear_background(BLACK);
        draw_media(&frame, incident, transmitted);

        match cache.get(angle, incident.refractive_index, transmitted.refractive_index) {
            Ok(geometry) => {
                draw_geometry(geometry, &frame);
                if dirty {
                    tutor.request(ExplainRequest::from_geometry(incident, transmitted, geometry));
                    dirty = false;
                }
            }
            Err(error) => println!("{}", error),
        }

        while let Ok(answer) = tutor.explanations().try_recv() {
            explanation = answer.text;
        }
        draw_text(&explanation, 16.0, screen_height() - 48.0, 16.0, WHITE);

        next_frame().await;
    }
}
