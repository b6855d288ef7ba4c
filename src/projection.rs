// Render/Info Projection - Maps simulation state to drawable primitives
// Read-only over the registry; the backend turns a `Frame` into pixels.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::SimConfig;
use crate::kinematics::{Anchor, BodyId, BodyType, CelestialBody, Rgb, Vector2};
use crate::registry::BodyRegistry;

// =============================================================================
// LAYOUT
// =============================================================================

const LABEL_MARGIN: f64 = 10.0;
const LABEL_RAISE: f64 = 10.0;
const LAP_LEFT: f64 = 20.0;
const LAP_TOP: f64 = 10.0;
const LAP_SPACING: f64 = 40.0;
const INFO_RIGHT_MARGIN: f64 = 10.0;
const INFO_TOP: f64 = 10.0;
const INFO_SPACING: f64 = 30.0;
const STATUS_BOTTOM: f64 = 30.0;

// =============================================================================
// FRAME PRIMITIVES
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Stroke {
    Filled,
    /// One pixel ring
    Outline,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    /// `position` is the top-left corner of the text
    Left,
    /// `position` is the top-right corner of the text
    Right,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Circle {
    pub center: Vector2,
    pub radius: f64,
    pub color: Rgb,
    pub stroke: Stroke,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Text {
    pub position: Vector2,
    pub content: String,
    pub color: Rgb,
    pub align: Align,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Status {
    pub started_at: DateTime<Utc>,
    pub tick: u64,
    pub wall_elapsed: f64, // seconds
    pub sim_elapsed: f64,  // time units fed to the kinematics
    pub speed: f64,
    pub zoom: f64,
    pub selected: Option<String>,
}

/// Everything the backend needs to draw one frame, in draw order.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub background: Rgb,
    pub circles: Vec<Circle>,
    pub texts: Vec<Text>,
    pub status: Status,
}

/// Controller state the projection reads.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub zoom: f64,
    pub speed: f64,
    pub selected: Option<BodyId>,
    pub started_at: DateTime<Utc>,
    pub tick: u64,
    pub wall_elapsed: f64,
    pub sim_elapsed: f64,
}

// =============================================================================
// VIEWPORT TRANSFORM
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width as f64,
            height: height as f64,
        }
    }

    pub fn center(&self) -> Vector2 {
        Vector2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Zoom about the viewport centre: `center + (pos - center) * zoom`.
    pub fn project(&self, position: Vector2, zoom: f64) -> Vector2 {
        let center = self.center();
        center.add(&position.sub(&center).scale(zoom))
    }
}

/// First body, in registry order, whose projected disc contains `pointer`.
pub fn hit_test(
    registry: &BodyRegistry,
    viewport: &Viewport,
    zoom: f64,
    pointer: Vector2,
) -> Option<BodyId> {
    registry
        .iter()
        .find(|(_, body)| {
            let screen = viewport.project(body.state.position, zoom);
            screen.distance(&pointer) <= body.radius * zoom
        })
        .map(|(id, _)| id)
}

// =============================================================================
// TEXT FORMATTING
// =============================================================================

/// Scientific notation with a signed two-digit exponent, e.g. `1.99e+30`.
pub fn scientific(value: f64, precision: usize) -> String {
    let formatted = format!("{:.*e}", precision, value);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exponent.abs())
        }
        None => formatted,
    }
}

/// Info panel lines for `body`.
pub fn info_lines(registry: &BodyRegistry, body: &CelestialBody) -> Vec<String> {
    match body.body_type {
        BodyType::Star => vec![format!("{}: Mass: {} kg", body.name, scientific(body.mass, 2))],
        BodyType::Planet => {
            let mut lines = vec![
                format!("Planet {}", body.name),
                format!("Mass: {} kg", scientific(body.mass, 2)),
                format!("Orbit: {:.2} AU", body.distance_au),
            ];
            if let Some(period) = body.orbital_period {
                lines.push(format!("Orbital Period: {:.2} days", period));
            }
            if let Some(facts) = &body.facts {
                lines.push(format!("Diameter: {} km", facts.diameter_km));
                lines.push(format!("Surface Gravity: {} g", facts.surface_gravity_g));
                lines.push(format!("Atmosphere: {}", facts.atmosphere));
                lines.push(format!("Number of Moons: {}", facts.num_moons));
                lines.push(format!("Average Temp (Day): {} °C", facts.avg_temp_day_c));
                lines.push(format!("Average Temp (Night): {} °C", facts.avg_temp_night_c));
            }
            lines
        }
        BodyType::Moon => {
            let mut lines = vec![
                format!("Moon {}", body.name),
                format!("Orbits: {}", registry.anchor_name(body)),
                format!("Mass: {} kg", scientific(body.mass, 2)),
                format!("Orbit: {:.2} AU", body.distance_au),
            ];
            if let Some(period) = body.orbital_period {
                lines.push(format!("Orbital Period: {:.2} days", period));
            }
            lines
        }
    }
}

/// Lap counter line. `wall_elapsed` is real time since start, not simulated time.
pub fn lap_line(registry: &BodyRegistry, body: &CelestialBody, wall_elapsed: f64) -> String {
    format!(
        "{}: {} Laps around {}, Time Elapsed: {:.2} sec",
        body.name,
        body.state.laps,
        registry.anchor_name(body),
        wall_elapsed
    )
}

pub fn status_line(view: &ViewState) -> String {
    format!(
        "Speed x{:.1}   Zoom x{:.1}   Simulated time {:.1}",
        view.speed, view.zoom, view.sim_elapsed
    )
}

// =============================================================================
// FRAME ASSEMBLY
// =============================================================================

pub fn build_frame(registry: &BodyRegistry, view: &ViewState, config: &SimConfig) -> Frame {
    let viewport = Viewport::new(config.width, config.height);
    let palette = &config.palette;
    let zoom = view.zoom;

    let mut circles = Vec::with_capacity(registry.len() * 2);
    let mut texts = Vec::new();

    // Orbit guides first so discs draw over them
    let ring = |center: Vector2, body: &CelestialBody| Circle {
        center,
        radius: body.distance_px() * zoom,
        color: palette.orbit,
        stroke: Stroke::Outline,
    };
    for (id, body) in registry.iter() {
        if body.anchor == Anchor::SystemCenter && body.is_orbiting() {
            circles.push(ring(viewport.center(), body));
        }
        let around = viewport.project(body.state.position, zoom);
        for (_, moon) in registry.moons_of(id).filter(|(_, m)| m.is_orbiting()) {
            circles.push(ring(around, moon));
        }
    }

    for (_, body) in registry.iter() {
        let screen = viewport.project(body.state.position, zoom);
        let radius = body.radius * zoom;
        circles.push(Circle {
            center: screen,
            radius,
            color: body.color,
            stroke: Stroke::Filled,
        });
        texts.push(Text {
            position: Vector2::new(screen.x + radius + LABEL_MARGIN, screen.y - LABEL_RAISE),
            content: body.name.clone(),
            color: palette.text,
            align: Align::Left,
        });
    }

    for (id, body) in registry.iter().filter(|(_, b)| b.is_orbiting()) {
        texts.push(Text {
            position: Vector2::new(LAP_LEFT, LAP_TOP + id.0 as f64 * LAP_SPACING),
            content: lap_line(registry, body, view.wall_elapsed),
            color: palette.text,
            align: Align::Left,
        });
    }

    texts.push(Text {
        position: Vector2::new(LAP_LEFT, viewport.height - STATUS_BOTTOM),
        content: status_line(view),
        color: palette.text,
        align: Align::Left,
    });

    let selected = view.selected.and_then(|id| registry.get(id));
    if let Some(body) = selected {
        for (i, line) in info_lines(registry, body).into_iter().enumerate() {
            texts.push(Text {
                position: Vector2::new(
                    viewport.width - INFO_RIGHT_MARGIN,
                    INFO_TOP + i as f64 * INFO_SPACING,
                ),
                content: line,
                color: palette.text,
                align: Align::Right,
            });
        }
    }

    Frame {
        width: config.width,
        height: config.height,
        background: palette.background,
        circles,
        texts,
        status: Status {
            started_at: view.started_at,
            tick: view.tick,
            wall_elapsed: view.wall_elapsed,
            sim_elapsed: view.sim_elapsed,
            speed: view.speed,
            zoom,
            selected: selected.map(|b| b.name.clone()),
        },
    }
}

// =============================================================================
// TESTS
// =============================================================================
