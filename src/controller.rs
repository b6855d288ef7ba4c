// Controller - Frame loop tying input, simulation update and rendering together
// Owns all body state; the projection and backend only ever read it.

use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info, trace};

use crate::backend::{InputEvent, Key, RenderBackend};
use crate::config::{SelectionMode, SimConfig, TimeStep};
use crate::error::Result;
use crate::kinematics::{BodyId, Vector2};
use crate::projection::{self, Frame, ViewState, Viewport};
use crate::registry::BodyRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Quit,
}

pub struct Controller {
    registry: BodyRegistry,
    config: SimConfig,
    state: LoopState,
    speed_multiplier: f64,
    zoom: f64,
    selected: Option<BodyId>,
    started_at: DateTime<Utc>,
    tick: u64,
    wall_elapsed: f64,
    sim_elapsed: f64,
}

impl Controller {
    pub fn new(registry: BodyRegistry, config: SimConfig) -> Self {
        Self {
            registry,
            config,
            state: LoopState::Running,
            speed_multiplier: 1.0,
            zoom: 1.0,
            selected: None,
            started_at: Utc::now(),
            tick: 0,
            wall_elapsed: 0.0,
            sim_elapsed: 0.0,
        }
    }

    pub fn registry(&self) -> &BodyRegistry {
        &self.registry
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn speed_multiplier(&self) -> f64 {
        self.speed_multiplier
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn selected(&self) -> Option<BodyId> {
        self.selected
    }

    /// Real seconds since start
    pub fn wall_elapsed(&self) -> f64 {
        self.wall_elapsed
    }

    /// Time units the kinematics have been advanced by
    pub fn sim_elapsed(&self) -> f64 {
        self.sim_elapsed
    }

    fn viewport(&self) -> Viewport {
        Viewport::new(self.config.width, self.config.height)
    }

    // =========================================================================
    // INPUT
    // =========================================================================

    pub fn handle_event(&mut self, event: InputEvent) -> LoopState {
        match event {
            InputEvent::Quit => {
                info!("quit requested after {} ticks", self.tick);
                self.state = LoopState::Quit;
            }
            InputEvent::Key(key) => self.handle_key(key),
            InputEvent::PointerMove { x, y } => {
                if self.config.selection == SelectionMode::Hover {
                    self.select_at(x, y);
                }
            }
            InputEvent::PointerDown { x, y } => {
                if self.config.selection == SelectionMode::Click {
                    self.select_at(x, y);
                }
            }
        }
        self.state
    }

    fn handle_key(&mut self, key: Key) {
        match key {
            Key::SpeedUp => self.step_speed(1.0),
            Key::SpeedDown => self.step_speed(-1.0),
            Key::SpeedReset => self.set_speed(1.0),
            Key::ZoomIn => self.set_zoom(self.zoom + self.config.zoom_step),
            Key::ZoomOut => self.set_zoom(self.zoom - self.config.zoom_step),
        }
    }

    /// Move one `speed_step` up or down, snapped to the step grid so repeated
    /// presses land exactly on zero.
    fn step_speed(&mut self, direction: f64) {
        let step = self.config.speed_step;
        let steps = (self.speed_multiplier / step).round() + direction;
        self.set_speed(steps * step);
    }

    fn set_speed(&mut self, speed: f64) {
        self.speed_multiplier = speed.max(self.config.min_speed).min(self.config.max_speed);
        debug!("speed -> {:.2}", self.speed_multiplier);
    }

    fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.max(self.config.min_zoom).min(self.config.max_zoom);
        debug!("zoom -> {:.2}", self.zoom);
    }

    /// Body under the window-pixel point `(x, y)` at the current zoom.
    pub fn hit_test(&self, x: f64, y: f64) -> Option<BodyId> {
        projection::hit_test(&self.registry, &self.viewport(), self.zoom, Vector2::new(x, y))
    }

    fn select_at(&mut self, x: f64, y: f64) {
        let hit = self.hit_test(x, y);
        if hit != self.selected {
            debug!(
                "selection -> {:?}",
                hit.and_then(|id| self.registry.get(id)).map(|b| b.name.as_str())
            );
        }
        self.selected = hit;
    }

    // =========================================================================
    // SIMULATION
    // =========================================================================

    /// Advance the simulation for one tick that took `wall_delta` of real time.
    pub fn update(&mut self, wall_delta: Duration) {
        let wall_seconds = wall_delta.as_secs_f64();
        self.wall_elapsed += wall_seconds;
        self.tick += 1;

        let step = match self.config.time_step {
            TimeStep::Measured => wall_seconds.min(self.config.max_frame_delta),
            TimeStep::Fixed(seconds) => seconds,
        };
        let sim_delta = step * self.speed_multiplier;
        self.sim_elapsed += sim_delta;

        let center = self.config.center();
        self.registry.advance_all(sim_delta, center);
        trace!("tick {} advanced {:.4}", self.tick, sim_delta);
    }

    pub fn frame(&self) -> Frame {
        let view = ViewState {
            zoom: self.zoom,
            speed: self.speed_multiplier,
            selected: self.selected,
            started_at: self.started_at,
            tick: self.tick,
            wall_elapsed: self.wall_elapsed,
            sim_elapsed: self.sim_elapsed,
        };
        projection::build_frame(&self.registry, &view, &self.config)
    }

    /// Run until the backend delivers a quit signal.
    pub fn run<B: RenderBackend>(&mut self, backend: &mut B) -> Result<()> {
        info!(
            "simulation started at {} with {} bodies",
            self.started_at.to_rfc3339(),
            self.registry.len()
        );

        while self.state == LoopState::Running {
            let wall_delta = backend.tick(self.config.target_fps);

            for event in backend.poll_events()? {
                if self.handle_event(event) == LoopState::Quit {
                    break;
                }
            }
            if self.state == LoopState::Quit {
                break;
            }

            self.update(wall_delta);
            backend.present(&self.frame())?;
        }

        info!(
            "simulation stopped: {:.2}s wall, {:.2} simulated",
            self.wall_elapsed, self.sim_elapsed
        );
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
