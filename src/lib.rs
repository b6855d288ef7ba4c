// Orrery - Kinematic solar system animator
// Library entry point shared by the binary and the tests

pub mod backend;
pub mod config;
pub mod controller;
pub mod error;
pub mod kinematics;
pub mod logging;
pub mod projection;
pub mod registry;

use std::io;
use std::time::Duration;

use log::info;

use backend::{HeadlessBackend, TerminalBackend};
use config::{BackendKind, SimConfig};
use controller::Controller;
use error::Result;
use registry::BodyRegistry;

/// Build the default solar system and run it on the configured backend until quit.
pub fn run(config: SimConfig) -> Result<()> {
    let registry = BodyRegistry::solar_system(&config.palette, config.center())?;
    info!(
        "{} bodies, {}x{} px at {} fps, {:?} selection",
        registry.len(),
        config.width,
        config.height,
        config.target_fps,
        config.selection
    );

    let mut controller = Controller::new(registry, config.clone());
    match config.backend {
        BackendKind::Terminal => {
            let mut backend = TerminalBackend::new(config.width, config.height)?;
            controller.run(&mut backend)
        }
        BackendKind::Headless => {
            let frame_time = Duration::from_secs(1) / config.target_fps.max(1);
            let mut backend = HeadlessBackend::new(frame_time)
                .with_max_frames(config.headless_frames)
                .with_sink(Box::new(io::BufWriter::new(io::stdout())));
            controller.run(&mut backend)
        }
    }
}
