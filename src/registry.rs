// Body Registry - The fixed set of bodies and their anchor relationships
// Bodies are stored in insertion order; a parent always precedes the bodies
// anchored to it, so one in-order pass updates parents before moons.

use log::debug;
use thiserror::Error;

use crate::config::Palette;
use crate::kinematics::{Anchor, BodyId, BodyType, CelestialBody, PlanetFacts, Vector2};

#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("a body named `{0}` is already registered")]
    DuplicateName(String),

    /// Parents must be registered before the bodies anchored to them
    #[error("`{name}` is anchored to unregistered body #{parent}")]
    UnknownParent { name: String, parent: usize },

    #[error("`{name}` has invalid orbital period {period}")]
    InvalidPeriod { name: String, period: f64 },

    #[error("`{name}` has invalid orbit geometry (distance {distance_au} AU, scale {au_scale} px/AU)")]
    InvalidGeometry {
        name: String,
        distance_au: f64,
        au_scale: f64,
    },

    #[error("no body named `{0}`")]
    NotFound(String),
}

#[derive(Debug, Clone, Default)]
pub struct BodyRegistry {
    bodies: Vec<CelestialBody>,
}

impl BodyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a body, returning its id.
    pub fn add(&mut self, body: CelestialBody) -> Result<BodyId, RegistryError> {
        if self.bodies.iter().any(|b| b.name == body.name) {
            return Err(RegistryError::DuplicateName(body.name));
        }

        if let Some(period) = body.orbital_period {
            if !(period.is_finite() && period > 0.0) {
                return Err(RegistryError::InvalidPeriod {
                    name: body.name,
                    period,
                });
            }
        }

        let geometry_ok = [body.distance_au, body.au_scale]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0);
        if !geometry_ok {
            return Err(RegistryError::InvalidGeometry {
                distance_au: body.distance_au,
                au_scale: body.au_scale,
                name: body.name,
            });
        }

        if let Anchor::Parent(parent) = body.anchor {
            if parent.0 >= self.bodies.len() {
                return Err(RegistryError::UnknownParent {
                    name: body.name,
                    parent: parent.0,
                });
            }
        }

        let id = BodyId(self.bodies.len());
        debug!("registered {:?} `{}` as #{}", body.body_type, body.name, id.0);
        self.bodies.push(body);
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn get(&self, id: BodyId) -> Option<&CelestialBody> {
        self.bodies.get(id.0)
    }

    pub fn find(&self, name: &str) -> Option<BodyId> {
        self.bodies.iter().position(|b| b.name == name).map(BodyId)
    }

    pub fn id_of(&self, name: &str) -> Result<BodyId, RegistryError> {
        self.find(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Bodies in registry order, paired with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (BodyId, &CelestialBody)> {
        self.bodies.iter().enumerate().map(|(i, b)| (BodyId(i), b))
    }

    pub fn bodies(&self) -> &[CelestialBody] {
        &self.bodies
    }

    /// Moons anchored to `parent`, found by scanning the registry.
    pub fn moons_of(&self, parent: BodyId) -> impl Iterator<Item = (BodyId, &CelestialBody)> {
        self.iter()
            .filter(move |(_, b)| b.anchor == Anchor::Parent(parent))
    }

    /// First star in the registry
    pub fn star(&self) -> Option<&CelestialBody> {
        self.bodies.iter().find(|b| b.body_type == BodyType::Star)
    }

    /// Current anchor point for `body`.
    pub fn anchor_position(&self, body: &CelestialBody, center: Vector2) -> Vector2 {
        match body.anchor {
            Anchor::SystemCenter => center,
            Anchor::Parent(parent) => self
                .bodies
                .get(parent.0)
                .map(|p| p.state.position)
                .unwrap_or(center),
        }
    }

    /// Display name of what `body` orbits.
    pub fn anchor_name(&self, body: &CelestialBody) -> String {
        match body.anchor {
            Anchor::SystemCenter => self
                .star()
                .map(|s| format!("the {}", s.name))
                .unwrap_or_else(|| "the center".to_string()),
            Anchor::Parent(parent) => self
                .bodies
                .get(parent.0)
                .map(|p| p.name.clone())
                .unwrap_or_default(),
        }
    }

    /// Resolve every position from the current angles without advancing time.
    pub fn place_all(&mut self, center: Vector2) {
        for i in 0..self.bodies.len() {
            let anchor = self.anchor_position(&self.bodies[i], center);
            self.bodies[i].place(anchor);
        }
    }

    /// Advance every body by `delta_time`, parents before their moons.
    pub fn advance_all(&mut self, delta_time: f64, center: Vector2) {
        for i in 0..self.bodies.len() {
            let anchor = self.anchor_position(&self.bodies[i], center);
            self.bodies[i].advance(delta_time, anchor);
        }
    }

    // =========================================================================
    // DEFAULT SOLAR SYSTEM
    // =========================================================================

    /// The Sun, eight planets and three moons, placed around `center`.
    pub fn solar_system(palette: &Palette, center: Vector2) -> Result<Self, RegistryError> {
        let mut registry = Self::new();

        registry.add(CelestialBody::star("Sun", palette.sun, 30.0, 1.989e30))?;

        registry.add(
            CelestialBody::planet("Mercury", palette.mercury, 5.0, 0.39, 3.30e23, 88.0)
                .with_facts(facts(4879.0, 0.38, "Thin, trace amounts", 0, 430.0, -180.0)),
        )?;
        registry.add(
            CelestialBody::planet("Venus", palette.venus, 9.0, 0.72, 4.87e24, 225.0)
                .with_facts(facts(12104.0, 0.9, "96.5% Carbon Dioxide", 0, 460.0, 460.0)),
        )?;
        let earth = registry.add(
            CelestialBody::planet("Earth", palette.earth, 10.0, 1.0, 5.97e24, 365.25)
                .with_facts(facts(12742.0, 1.0, "78% Nitrogen, 21% Oxygen", 1, 15.0, -18.0)),
        )?;
        let mars = registry.add(
            CelestialBody::planet("Mars", palette.mars, 8.0, 1.5, 6.39e23, 687.0)
                .with_facts(facts(6779.0, 0.38, "95% Carbon Dioxide", 2, -20.0, -70.0)),
        )?;

        // Outer planets use compressed scales to stay near the viewport
        registry.add(
            CelestialBody::planet("Jupiter", palette.jupiter, 20.0, 5.2, 1.898e27, 4331.0)
                .with_scale(90.0)
                .with_facts(facts(139820.0, 2.53, "90% Hydrogen, 10% Helium", 95, -108.0, -108.0)),
        )?;
        registry.add(
            CelestialBody::planet("Saturn", palette.saturn, 17.0, 9.5, 5.683e26, 10747.0)
                .with_scale(65.0)
                .with_facts(facts(116460.0, 1.07, "96% Hydrogen, 3% Helium", 146, -139.0, -139.0)),
        )?;
        registry.add(
            CelestialBody::planet("Uranus", palette.uranus, 13.0, 19.2, 8.681e25, 30589.0)
                .with_scale(45.0)
                .with_facts(facts(50724.0, 0.9, "83% Hydrogen, 15% Helium, 2% Methane", 28, -197.0, -197.0)),
        )?;
        registry.add(
            CelestialBody::planet("Neptune", palette.neptune, 13.0, 30.1, 1.024e26, 59800.0)
                .with_scale(35.0)
                .with_facts(facts(49244.0, 1.14, "80% Hydrogen, 19% Helium, 1% Methane", 16, -201.0, -201.0)),
        )?;

        registry.add(CelestialBody::moon("Moon", palette.moon, 3.0, 0.08257, 7.35e22, 10.0, earth))?;
        registry.add(CelestialBody::moon("Deimos", palette.moon, 3.0, 0.08257, 7.35e22, 10.0, mars))?;
        registry.add(CelestialBody::moon("Phobos", palette.moon, 3.0, 0.16257, 7.35e22, 9.0, mars))?;

        registry.place_all(center);
        Ok(registry)
    }
}

fn facts(
    diameter_km: f64,
    surface_gravity_g: f64,
    atmosphere: &str,
    num_moons: u32,
    avg_temp_day_c: f64,
    avg_temp_night_c: f64,
) -> PlanetFacts {
    PlanetFacts {
        diameter_km,
        surface_gravity_g,
        atmosphere: atmosphere.to_string(),
        num_moons,
        avg_temp_day_c,
        avg_temp_night_c,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematics::Rgb;
    use approx::assert_relative_eq;

    const GREY: Rgb = Rgb::new(100, 100, 100);

    fn small_system() -> (BodyRegistry, BodyId, BodyId) {
        let mut registry = BodyRegistry::new();
        registry
            .add(CelestialBody::star("Sun", GREY, 30.0, 1.0))
            .unwrap();
        let planet = registry
            .add(CelestialBody::planet("P", GREY, 10.0, 1.0, 1.0, 40.0).with_scale(100.0))
            .unwrap();
        let moon = registry
            .add(CelestialBody::moon("M", GREY, 3.0, 0.1, 1.0, 4.0, planet))
            .unwrap();
        (registry, planet, moon)
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let (mut registry, _, _) = small_system();
        let err = registry
            .add(CelestialBody::planet("P", GREY, 1.0, 1.0, 1.0, 1.0))
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateName("P".to_string()));
    }

    #[test]
    fn test_rejects_parent_registered_later() {
        let mut registry = BodyRegistry::new();
        let err = registry
            .add(CelestialBody::moon("M", GREY, 3.0, 0.1, 1.0, 4.0, BodyId(0)))
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownParent { parent: 0, .. }));
    }

    #[test]
    fn test_rejects_non_positive_period() {
        let mut registry = BodyRegistry::new();
        for period in [0.0, -3.0, f64::NAN] {
            let err = registry
                .add(CelestialBody::planet("P", GREY, 1.0, 1.0, 1.0, period))
                .unwrap_err();
            assert!(matches!(err, RegistryError::InvalidPeriod { .. }));
        }
    }

    #[test]
    fn test_rejects_bad_geometry() {
        let mut registry = BodyRegistry::new();
        for (distance, scale) in [
            (-1.0, 200.0),
            (f64::NAN, 200.0),
            (1.0, f64::NAN),
            (1.0, -5.0),
            (f64::INFINITY, 1.0),
        ] {
            let err = registry
                .add(CelestialBody::planet("P", GREY, 1.0, distance, 1.0, 10.0).with_scale(scale))
                .unwrap_err();
            assert!(matches!(err, RegistryError::InvalidGeometry { .. }), "{distance} {scale}");
        }
        assert!(registry.is_empty());
        registry
            .add(CelestialBody::planet("P", GREY, 1.0, 0.0, 1.0, 10.0))
            .unwrap();
    }

    #[test]
    fn test_moon_follows_parent_in_same_tick() {
        let (mut registry, planet, moon) = small_system();
        let center = Vector2::new(500.0, 500.0);
        registry.place_all(center);

        registry.advance_all(10.0, center);

        let p = registry.get(planet).unwrap().state;
        let m = registry.get(moon).unwrap();
        let expected = p.position.add(&Vector2::polar(m.distance_px(), m.state.angle));
        assert_relative_eq!(m.state.position.x, expected.x, epsilon = 1e-9);
        assert_relative_eq!(m.state.position.y, expected.y, epsilon = 1e-9);
    }

    #[test]
    fn test_moon_recomputed_after_parent_moves() {
        let (mut registry, planet, moon) = small_system();
        let center = Vector2::new(0.0, 0.0);
        registry.place_all(center);

        registry.bodies[planet.0].state.position = Vector2::new(250.0, -40.0);
        let angle_before = registry.get(moon).unwrap().state.angle;
        let anchor = registry.anchor_position(registry.get(moon).unwrap(), center);
        registry.bodies[moon.0].advance(0.0, anchor);

        let m = registry.get(moon).unwrap();
        assert_eq!(m.state.angle, angle_before);
        assert_relative_eq!(m.state.position.x, 250.0 + 20.0, epsilon = 1e-9);
        assert_relative_eq!(m.state.position.y, -40.0, epsilon = 1e-9);
    }

    #[test]
    fn test_star_stays_at_center() {
        let (mut registry, _, _) = small_system();
        let center = Vector2::new(825.0, 500.0);
        registry.place_all(center);
        for _ in 0..100 {
            registry.advance_all(3.0, center);
        }
        let sun = registry.star().unwrap();
        assert_eq!(sun.state.position, center);
        assert_eq!(sun.state.angle, 0.0);
        assert_eq!(sun.state.laps, 0);
    }

    #[test]
    fn test_moons_of_and_anchor_names() {
        let palette = Palette::default();
        let registry = BodyRegistry::solar_system(&palette, Vector2::zero()).unwrap();
        let mars = registry.id_of("Mars").unwrap();
        let names: Vec<&str> = registry.moons_of(mars).map(|(_, b)| b.name.as_str()).collect();
        assert_eq!(names, vec!["Deimos", "Phobos"]);

        let earth = registry.get(registry.id_of("Earth").unwrap()).unwrap();
        assert_eq!(registry.anchor_name(earth), "the Sun");
        let moon = registry.get(registry.id_of("Moon").unwrap()).unwrap();
        assert_eq!(registry.anchor_name(moon), "Earth");
    }

    #[test]
    fn test_solar_system_layout() {
        let palette = Palette::default();
        let center = Vector2::new(825.0, 500.0);
        let registry = BodyRegistry::solar_system(&palette, center).unwrap();
        assert_eq!(registry.len(), 12);
        assert_eq!(registry.bodies()[0].body_type, BodyType::Star);

        let earth = registry.get(registry.id_of("Earth").unwrap()).unwrap();
        assert_relative_eq!(earth.distance_px(), 200.0);
        assert_relative_eq!(earth.state.position.x, 1025.0);

        let jupiter = registry.get(registry.id_of("Jupiter").unwrap()).unwrap();
        assert_relative_eq!(jupiter.distance_px(), 5.2 * 90.0, epsilon = 1e-9);

        let moon = registry.get(registry.id_of("Moon").unwrap()).unwrap();
        assert_relative_eq!(
            moon.state.position.x,
            1025.0 + 0.08257 * 200.0,
            epsilon = 1e-9
        );
        assert!(registry.id_of("Pluto").is_err());
    }
}
