// Orbit Kinematics - Angle-driven circular orbits
// Derives angular position, lap count and pixel coordinates from an orbital
// period and elapsed time. No forces are integrated.

use serde::{Deserialize, Serialize};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Degrees in one full revolution
pub const FULL_TURN_DEG: f64 = 360.0;

/// Default pixels per AU for inner bodies
pub const DEFAULT_AU_SCALE: f64 = 200.0;

// =============================================================================
// 2D VECTOR MATHEMATICS
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn scale(&self, s: f64) -> Self {
        Self {
            x: self.x * s,
            y: self.y * s,
        }
    }

    pub fn add(&self, other: &Vector2) -> Vector2 {
        Vector2 {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    pub fn sub(&self, other: &Vector2) -> Vector2 {
        Vector2 {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    pub fn distance(&self, other: &Vector2) -> f64 {
        self.sub(other).magnitude()
    }

    /// Offset of length `radius` at `angle_deg`, measured clockwise on screen
    /// since pixel y grows downward.
    pub fn polar(radius: f64, angle_deg: f64) -> Vector2 {
        let theta = angle_deg.to_radians();
        Vector2 {
            x: radius * theta.cos(),
            y: radius * theta.sin(),
        }
    }
}

// =============================================================================
// COLOR
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

// =============================================================================
// CELESTIAL BODY
// =============================================================================

/// Index of a body inside its registry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub usize);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BodyType {
    Star,
    Planet,
    Moon,
}

/// The point a body circles around.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Anchor {
    SystemCenter,
    Parent(BodyId),
}

/// Descriptive data shown in the info panel for planets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanetFacts {
    pub diameter_km: f64,
    pub surface_gravity_g: f64,
    pub atmosphere: String,
    pub num_moons: u32,
    pub avg_temp_day_c: f64,
    pub avg_temp_night_c: f64,
}

/// Per-tick mutable part of a body.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct OrbitState {
    /// Degrees, always in [0, 360)
    pub angle: f64,
    pub laps: u64,
    /// Pixels
    pub position: Vector2,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CelestialBody {
    pub name: String,
    pub body_type: BodyType,
    pub color: Rgb,
    pub radius: f64, // pixels
    pub mass: f64,   // kg
    pub distance_au: f64,
    /// Pixels per AU for this body's orbit
    pub au_scale: f64,
    /// Days; None for bodies that never move
    pub orbital_period: Option<f64>,
    pub anchor: Anchor,
    pub facts: Option<PlanetFacts>,
    pub state: OrbitState,
}

impl CelestialBody {
    pub fn star(name: &str, color: Rgb, radius: f64, mass: f64) -> Self {
        Self {
            name: name.to_string(),
            body_type: BodyType::Star,
            color,
            radius,
            mass,
            distance_au: 0.0,
            au_scale: DEFAULT_AU_SCALE,
            orbital_period: None,
            anchor: Anchor::SystemCenter,
            facts: None,
            state: OrbitState::default(),
        }
    }

    pub fn planet(
        name: &str,
        color: Rgb,
        radius: f64,
        distance_au: f64,
        mass: f64,
        orbital_period: f64,
    ) -> Self {
        Self {
            name: name.to_string(),
            body_type: BodyType::Planet,
            color,
            radius,
            mass,
            distance_au,
            au_scale: DEFAULT_AU_SCALE,
            orbital_period: Some(orbital_period),
            anchor: Anchor::SystemCenter,
            facts: None,
            state: OrbitState::default(),
        }
    }

    pub fn moon(
        name: &str,
        color: Rgb,
        radius: f64,
        distance_au: f64,
        mass: f64,
        orbital_period: f64,
        parent: BodyId,
    ) -> Self {
        Self {
            name: name.to_string(),
            body_type: BodyType::Moon,
            color,
            radius,
            mass,
            distance_au,
            au_scale: DEFAULT_AU_SCALE,
            orbital_period: Some(orbital_period),
            anchor: Anchor::Parent(parent),
            facts: None,
            state: OrbitState::default(),
        }
    }

    pub fn with_scale(mut self, au_scale: f64) -> Self {
        self.au_scale = au_scale;
        self
    }

    pub fn with_facts(mut self, facts: PlanetFacts) -> Self {
        self.facts = Some(facts);
        self
    }

    /// Orbit radius in pixels
    pub fn distance_px(&self) -> f64 {
        self.distance_au * self.au_scale
    }

    pub fn is_orbiting(&self) -> bool {
        self.orbital_period.is_some()
    }

    /// Degrees per time unit, where one time unit is treated as one day of
    /// the orbital period.
    pub fn angular_velocity(&self) -> Option<f64> {
        self.orbital_period.map(|period| FULL_TURN_DEG / period)
    }

    /// Resolve position from the current angle around `anchor`.
    pub fn place(&mut self, anchor: Vector2) {
        self.state.position = anchor.add(&Vector2::polar(self.distance_px(), self.state.angle));
    }

    /// Advance the orbit by `delta_time` and re-resolve position around `anchor`.
    ///
    /// Negative deltas are treated as zero. Laps count every wrap past 360°,
    /// so an oversized step still adds one lap per revolution crossed.
    pub fn advance(&mut self, delta_time: f64, anchor: Vector2) {
        let Some(omega) = self.angular_velocity() else {
            return;
        };

        let delta_time = if delta_time.is_finite() {
            delta_time.max(0.0)
        } else {
            0.0
        };

        let raw = self.state.angle + omega * delta_time;
        let wraps = (raw / FULL_TURN_DEG).floor();
        if wraps >= 1.0 {
            // `as` saturates for huge steps; the counter pins at u64::MAX
            self.state.laps = self.state.laps.saturating_add(wraps as u64);
        }
        self.state.angle = raw.rem_euclid(FULL_TURN_DEG);
        // rem_euclid can round up to exactly 360 for tiny negative inputs
        if self.state.angle >= FULL_TURN_DEG {
            self.state.angle = 0.0;
        }

        self.place(anchor);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const WHITE: Rgb = Rgb::new(255, 255, 255);

    fn body_at(distance_px: f64, period: f64) -> CelestialBody {
        CelestialBody::planet("Test", WHITE, 5.0, distance_px, 1.0, period).with_scale(1.0)
    }

    #[test]
    fn test_angle_stays_in_range() {
        let mut body = body_at(100.0, 7.3);
        let anchor = Vector2::new(50.0, 50.0);
        for step in 0..500 {
            body.advance(0.01 * (step % 17) as f64, anchor);
            assert!(body.state.angle >= 0.0 && body.state.angle < 360.0);
        }
    }

    #[test]
    fn test_one_period_is_one_lap() {
        let mut body = body_at(100.0, 365.25);
        body.state.angle = 42.0;
        let anchor = Vector2::zero();
        let steps = 1000;
        for _ in 0..steps {
            body.advance(365.25 / steps as f64, anchor);
        }
        assert_eq!(body.state.laps, 1);
        let diff = (body.state.angle - 42.0).abs();
        assert!(diff < 1e-6 || (360.0 - diff) < 1e-6, "angle {}", body.state.angle);
    }

    #[test]
    fn test_ten_steps_of_ten_returns_to_start() {
        let mut body = body_at(100.0, 100.0);
        let anchor = Vector2::new(825.0, 500.0);
        for _ in 0..10 {
            body.advance(10.0, anchor);
        }
        assert_eq!(body.state.laps, 1);
        assert!(body.state.angle < 1e-9 || body.state.angle > 360.0 - 1e-9);
        assert_relative_eq!(body.state.position.x, 925.0, epsilon = 1e-6);
        assert_relative_eq!(body.state.position.y, 500.0, epsilon = 1e-6);
    }

    #[test]
    fn test_huge_step_saturates_laps() {
        let mut body = body_at(100.0, 1.0);
        let anchor = Vector2::zero();
        body.advance(1e300, anchor);
        assert_eq!(body.state.laps, u64::MAX);
        body.advance(1e300, anchor);
        assert_eq!(body.state.laps, u64::MAX);
        assert!(body.state.angle >= 0.0 && body.state.angle < 360.0);
    }

    #[test]
    fn test_star_never_moves() {
        let mut sun = CelestialBody::star("Sun", WHITE, 30.0, 1.989e30);
        sun.place(Vector2::new(10.0, 20.0));
        let before = sun.state;
        for dt in [0.0, 1.0, 1e6, -5.0] {
            sun.advance(dt, Vector2::new(999.0, 999.0));
        }
        assert_eq!(sun.state, before);
    }

    #[test]
    fn test_zero_delta_tracks_moved_anchor() {
        let mut moon = CelestialBody::moon("Moon", WHITE, 3.0, 0.1, 7.35e22, 10.0, BodyId(0));
        moon.state.angle = 90.0;
        moon.advance(0.0, Vector2::new(100.0, 100.0));
        moon.advance(0.0, Vector2::new(300.0, 200.0));
        assert_relative_eq!(moon.state.position.x, 300.0, epsilon = 1e-9);
        assert_relative_eq!(moon.state.position.y, 220.0, epsilon = 1e-9);
        assert_eq!(moon.state.angle, 90.0);
    }

    #[test]
    fn test_oversized_step_counts_every_lap() {
        let mut body = body_at(10.0, 1.0);
        body.advance(2.5, Vector2::zero());
        assert_eq!(body.state.laps, 2);
        assert_relative_eq!(body.state.angle, 180.0, epsilon = 1e-9);
    }

    #[test]
    fn test_negative_delta_is_ignored() {
        let mut body = body_at(10.0, 10.0);
        body.state.angle = 5.0;
        body.advance(-3.0, Vector2::zero());
        assert_eq!(body.state.angle, 5.0);
        assert_eq!(body.state.laps, 0);
    }

    #[test]
    fn test_zero_distance_sits_on_anchor() {
        let mut body = body_at(0.0, 10.0);
        body.advance(3.0, Vector2::new(7.0, 8.0));
        assert_relative_eq!(body.state.position.x, 7.0);
        assert_relative_eq!(body.state.position.y, 8.0);
        assert!(body.state.angle > 0.0);
    }

    #[test]
    fn test_vector2_operations() {
        let a = Vector2::new(3.0, 4.0);
        let b = Vector2::new(1.0, 1.0);
        assert_relative_eq!(a.magnitude(), 5.0);
        assert_eq!(a.sub(&b), Vector2::new(2.0, 3.0));
        assert_eq!(a.add(&b).scale(2.0), Vector2::new(8.0, 10.0));
        let p = Vector2::polar(2.0, 90.0);
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 2.0, epsilon = 1e-12);
    }
}
