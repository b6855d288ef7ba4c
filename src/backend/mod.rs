// Rendering backends - Surfaces the controller draws to and reads input from

pub mod headless;
pub mod terminal;

use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::projection::Frame;

pub use headless::HeadlessBackend;
pub use terminal::TerminalBackend;

/// The keys the controller reacts to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Key {
    SpeedUp,
    SpeedDown,
    SpeedReset,
    ZoomIn,
    ZoomOut,
}

/// Backend-neutral input. Pointer coordinates are window pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum InputEvent {
    Quit,
    Key(Key),
    PointerMove { x: f64, y: f64 },
    PointerDown { x: f64, y: f64 },
}

pub trait RenderBackend {
    /// Wait out the rest of the frame budget for `target_fps` and return the
    /// wall-clock time since the previous call.
    fn tick(&mut self, target_fps: u32) -> Duration;

    /// Drain pending input.
    fn poll_events(&mut self) -> Result<Vec<InputEvent>>;

    fn present(&mut self, frame: &Frame) -> Result<()>;
}

// =============================================================================
// FRAME PACING
// =============================================================================

/// Caps the loop rate by sleeping out the remainder of each frame.
pub struct FramePacer {
    last_tick: Instant,
}

impl FramePacer {
    pub fn new() -> Self {
        Self {
            last_tick: Instant::now(),
        }
    }

    pub fn tick(&mut self, target_fps: u32) -> Duration {
        let target_frame_time = Duration::from_secs(1) / target_fps.max(1);
        let elapsed = self.last_tick.elapsed();
        if elapsed < target_frame_time {
            thread::sleep(target_frame_time - elapsed);
        }

        let now = Instant::now();
        let delta = now - self.last_tick;
        self.last_tick = now;
        delta
    }
}

impl Default for FramePacer {
    fn default() -> Self {
        Self::new()
    }
}
