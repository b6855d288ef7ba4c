// Headless backend - Scripted input, constant tick time, no window
// Frames are either kept in memory or streamed out as JSON lines.

use std::collections::VecDeque;
use std::io::Write;
use std::time::Duration;

use log::debug;

use super::{InputEvent, RenderBackend};
use crate::error::Result;
use crate::projection::Frame;

pub struct HeadlessBackend {
    frame_time: Duration,
    script: VecDeque<Vec<InputEvent>>,
    max_frames: Option<usize>,
    presented: usize,
    frames: Vec<Frame>,
    sink: Option<Box<dyn Write>>,
}

impl HeadlessBackend {
    /// Every tick reports `frame_time` without sleeping.
    pub fn new(frame_time: Duration) -> Self {
        Self {
            frame_time,
            script: VecDeque::new(),
            max_frames: None,
            presented: 0,
            frames: Vec::new(),
            sink: None,
        }
    }

    /// One batch of events per tick. Quit is sent once the script runs out,
    /// unless a frame limit is still pending.
    pub fn with_script(mut self, script: Vec<Vec<InputEvent>>) -> Self {
        self.script = script.into();
        self
    }

    pub fn with_max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = Some(max_frames);
        self
    }

    /// Stream each frame as one JSON line instead of keeping it.
    pub fn with_sink(mut self, sink: Box<dyn Write>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn presented(&self) -> usize {
        self.presented
    }
}

impl RenderBackend for HeadlessBackend {
    fn tick(&mut self, _target_fps: u32) -> Duration {
        self.frame_time
    }

    fn poll_events(&mut self) -> Result<Vec<InputEvent>> {
        if let Some(events) = self.script.pop_front() {
            return Ok(events);
        }

        let frames_done = self.max_frames.map_or(true, |max| self.presented >= max);
        if frames_done {
            debug!("headless run finished after {} frames", self.presented);
            return Ok(vec![InputEvent::Quit]);
        }
        Ok(Vec::new())
    }

    fn present(&mut self, frame: &Frame) -> Result<()> {
        self.presented += 1;
        match self.sink.as_mut() {
            Some(sink) => {
                serde_json::to_writer(&mut *sink, frame)?;
                sink.write_all(b"\n")?;
            }
            None => self.frames.push(frame.clone()),
        }
        Ok(())
    }
}

impl Drop for HeadlessBackend {
    fn drop(&mut self) {
        if let Some(sink) = self.sink.as_mut() {
            let _ = sink.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Key;
    use crate::config::{Palette, SimConfig};
    use crate::controller::Controller;
    use crate::registry::BodyRegistry;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn controller() -> Controller {
        let config = SimConfig::default();
        let registry = BodyRegistry::solar_system(&Palette::default(), config.center()).unwrap();
        Controller::new(registry, config)
    }

    #[test]
    fn test_frame_limit_ends_run() {
        let mut c = controller();
        let mut backend = HeadlessBackend::new(Duration::from_millis(16)).with_max_frames(25);
        c.run(&mut backend).unwrap();
        assert_eq!(backend.presented(), 25);
        assert_eq!(backend.frames().len(), 25);
        assert_eq!(backend.frames()[24].status.tick, 25);
    }

    #[test]
    fn test_script_then_frame_limit() {
        let mut c = controller();
        let mut backend = HeadlessBackend::new(Duration::from_millis(16))
            .with_script(vec![vec![InputEvent::Key(Key::ZoomOut)]])
            .with_max_frames(4);
        c.run(&mut backend).unwrap();
        assert_eq!(backend.presented(), 4);
        assert!(backend.frames().iter().all(|f| (f.status.zoom - 0.9).abs() < 1e-9));
    }

    #[test]
    fn test_streams_json_lines() {
        let buffer = SharedBuffer::default();
        let mut c = controller();
        {
            let mut backend = HeadlessBackend::new(Duration::from_millis(16))
                .with_max_frames(3)
                .with_sink(Box::new(buffer.clone()));
            c.run(&mut backend).unwrap();
            assert!(backend.frames().is_empty());
        }

        let bytes = buffer.0.lock().unwrap().clone();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        let last: serde_json::Value = serde_json::from_str(lines[2]).unwrap();
        assert_eq!(last["status"]["tick"], 3);
        assert_eq!(last["circles"].as_array().unwrap().len(), 23);
    }
}
