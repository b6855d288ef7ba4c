// Terminal backend - Draws frames as character cells through crossterm
// The frame's pixel space is stretched over the whole terminal; pointer
// positions are mapped back to the centre of the cell under the mouse.

use std::io::{self, Stdout, Write};
use std::time::Duration;

use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEventKind,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use log::{info, warn};
use rand::{rngs::StdRng, Rng, SeedableRng};

use super::{FramePacer, InputEvent, Key, RenderBackend};
use crate::error::Result;
use crate::kinematics::{Rgb, Vector2};
use crate::projection::{Align, Circle, Frame, Stroke};

const STAR_SEED: u64 = 0x0A11_CE5E_ED00;
const STAR_COLOR: Color = Color::Rgb { r: 70, g: 70, b: 90 };
const MAX_RING_SAMPLES: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
}

impl Cell {
    const BLANK: Cell = Cell {
        ch: ' ',
        fg: Color::Reset,
    };
}

fn to_color(rgb: Rgb) -> Color {
    Color::Rgb {
        r: rgb.r,
        g: rgb.g,
        b: rgb.b,
    }
}

// =============================================================================
// CELL GRID
// =============================================================================

/// Character grid covering a `width` x `height` pixel window.
struct Grid {
    cols: u16,
    rows: u16,
    width: f64,
    height: f64,
    cells: Vec<Cell>,
}

impl Grid {
    fn new(cols: u16, rows: u16, width: f64, height: f64) -> Self {
        Self {
            cols,
            rows,
            width,
            height,
            cells: vec![Cell::BLANK; cols as usize * rows as usize],
        }
    }

    fn cell_width(&self) -> f64 {
        self.width / self.cols.max(1) as f64
    }

    fn cell_height(&self) -> f64 {
        self.height / self.rows.max(1) as f64
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn to_cell(&self, point: Vector2) -> Option<(u16, u16)> {
        let col = (point.x / self.cell_width()).floor();
        let row = (point.y / self.cell_height()).floor();
        if col < 0.0 || row < 0.0 || col >= self.cols as f64 || row >= self.rows as f64 {
            return None;
        }
        Some((col as u16, row as u16))
    }

    fn cell_center(&self, col: u16, row: u16) -> Vector2 {
        Vector2::new(
            (col as f64 + 0.5) * self.cell_width(),
            (row as f64 + 0.5) * self.cell_height(),
        )
    }

    fn put(&mut self, col: i64, row: i64, cell: Cell) {
        if col < 0 || row < 0 || col >= self.cols as i64 || row >= self.rows as i64 {
            return;
        }
        let index = row as usize * self.cols as usize + col as usize;
        self.cells[index] = cell;
    }

    fn draw_circle(&mut self, circle: &Circle) {
        match circle.stroke {
            Stroke::Filled => self.fill_disc(circle),
            Stroke::Outline => self.trace_ring(circle),
        }
    }

    fn fill_disc(&mut self, circle: &Circle) {
        let fg = to_color(circle.color);
        let (cw, ch) = (self.cell_width(), self.cell_height());
        let c = circle.center;
        let r = circle.radius.max(0.0);

        let col0 = ((c.x - r) / cw).floor().max(0.0) as i64;
        let col1 = ((c.x + r) / cw).ceil().min(self.cols as f64) as i64;
        let row0 = ((c.y - r) / ch).floor().max(0.0) as i64;
        let row1 = ((c.y + r) / ch).ceil().min(self.rows as f64) as i64;

        let mut painted = false;
        for row in row0..row1 {
            for col in col0..col1 {
                if self.cell_center(col as u16, row as u16).distance(&c) <= r {
                    self.put(col, row, Cell { ch: '█', fg });
                    painted = true;
                }
            }
        }

        // Discs smaller than a cell still get one glyph
        if !painted {
            if let Some((col, row)) = self.to_cell(c) {
                self.put(col as i64, row as i64, Cell { ch: '●', fg });
            }
        }
    }

    fn trace_ring(&mut self, circle: &Circle) {
        let fg = to_color(circle.color);
        let step = self.cell_width().min(self.cell_height()).max(1e-6);
        let circumference = 2.0 * std::f64::consts::PI * circle.radius;
        let samples = ((circumference / step).ceil() as usize).clamp(8, MAX_RING_SAMPLES);

        for i in 0..samples {
            let angle = 360.0 * i as f64 / samples as f64;
            let point = circle.center.add(&Vector2::polar(circle.radius, angle));
            if let Some((col, row)) = self.to_cell(point) {
                self.put(col as i64, row as i64, Cell { ch: '·', fg });
            }
        }
    }

    fn write_text(&mut self, anchor: Vector2, text: &str, align: Align, fg: Color) {
        let row = (anchor.y / self.cell_height()).floor() as i64;
        let len = text.chars().count() as i64;
        let edge = (anchor.x / self.cell_width()).floor() as i64;
        let start = match align {
            Align::Left => edge,
            Align::Right => edge - len + 1,
        };
        for (i, ch) in text.chars().enumerate() {
            self.put(start + i as i64, row, Cell { ch, fg });
        }
    }
}

fn build_stars(cols: u16, rows: u16, seed: u64) -> Vec<(u16, u16)> {
    let mut rng = StdRng::seed_from_u64(seed ^ ((cols as u64) << 32) ^ rows as u64);
    if cols == 0 || rows == 0 {
        return Vec::new();
    }
    let count = (cols as usize * rows as usize / 60).clamp(20, 400);
    (0..count)
        .map(|_| (rng.gen_range(0..cols), rng.gen_range(0..rows)))
        .collect()
}

fn map_key(key: KeyEvent) -> Option<InputEvent> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    let event = match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => InputEvent::Quit,
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => InputEvent::Quit,
        KeyCode::Up => InputEvent::Key(Key::SpeedUp),
        KeyCode::Down => InputEvent::Key(Key::SpeedDown),
        KeyCode::Char(' ') => InputEvent::Key(Key::SpeedReset),
        KeyCode::Char('+') | KeyCode::Char('=') => InputEvent::Key(Key::ZoomIn),
        KeyCode::Char('-') | KeyCode::Char('_') => InputEvent::Key(Key::ZoomOut),
        _ => return None,
    };
    Some(event)
}

// =============================================================================
// BACKEND
// =============================================================================

pub struct TerminalBackend {
    out: Stdout,
    pacer: FramePacer,
    grid: Grid,
    previous: Vec<Cell>,
    stars: Vec<(u16, u16)>,
    background: Color,
    full_redraw: bool,
}

impl TerminalBackend {
    /// Take over the terminal: raw mode, alternate screen and mouse capture.
    /// `width` x `height` is the pixel window frames are laid out in.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let (cols, rows) = terminal::size()?;
        terminal::enable_raw_mode()?;
        let mut out = io::stdout();
        if let Err(e) = execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            EnableMouseCapture
        ) {
            let _ = terminal::disable_raw_mode();
            return Err(e.into());
        }

        info!("terminal backend {}x{} cells for {}x{} px", cols, rows, width, height);

        let grid = Grid::new(cols, rows, width as f64, height as f64);
        Ok(Self {
            out,
            pacer: FramePacer::new(),
            previous: grid.cells.clone(),
            stars: build_stars(cols, rows, STAR_SEED),
            grid,
            background: Color::Black,
            full_redraw: true,
        })
    }

    fn resize(&mut self, cols: u16, rows: u16) {
        if cols == self.grid.cols && rows == self.grid.rows {
            return;
        }
        self.grid = Grid::new(cols, rows, self.grid.width, self.grid.height);
        self.previous = self.grid.cells.clone();
        self.stars = build_stars(cols, rows, STAR_SEED);
        self.full_redraw = true;
    }

    fn flush_diff(&mut self) -> io::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate, SetBackgroundColor(self.background))?;
        if self.full_redraw {
            queue!(self.out, terminal::Clear(ClearType::All))?;
        }

        let cols = self.grid.cols as usize;
        let mut current_fg: Option<Color> = None;
        for (i, cell) in self.grid.cells.iter().enumerate() {
            if !self.full_redraw && self.previous[i] == *cell {
                continue;
            }
            let (col, row) = ((i % cols) as u16, (i / cols) as u16);
            queue!(self.out, cursor::MoveTo(col, row))?;
            if current_fg != Some(cell.fg) {
                queue!(self.out, SetForegroundColor(cell.fg))?;
                current_fg = Some(cell.fg);
            }
            queue!(self.out, Print(cell.ch))?;
        }

        queue!(self.out, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.previous.copy_from_slice(&self.grid.cells);
        self.full_redraw = false;
        Ok(())
    }
}

impl RenderBackend for TerminalBackend {
    fn tick(&mut self, target_fps: u32) -> Duration {
        self.pacer.tick(target_fps)
    }

    fn poll_events(&mut self) -> Result<Vec<InputEvent>> {
        let mut events = Vec::new();
        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(key) => events.extend(map_key(key)),
                Event::Mouse(mouse) => {
                    let p = self.grid.cell_center(mouse.column, mouse.row);
                    match mouse.kind {
                        MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                            events.push(InputEvent::PointerMove { x: p.x, y: p.y })
                        }
                        MouseEventKind::Down(MouseButton::Left) => {
                            events.push(InputEvent::PointerDown { x: p.x, y: p.y })
                        }
                        _ => {}
                    }
                }
                Event::Resize(cols, rows) => self.resize(cols, rows),
                _ => {}
            }
        }
        Ok(events)
    }

    fn present(&mut self, frame: &Frame) -> Result<()> {
        let (width, height) = (frame.width as f64, frame.height as f64);
        if width != self.grid.width || height != self.grid.height {
            self.grid.width = width;
            self.grid.height = height;
            self.full_redraw = true;
        }
        let background = to_color(frame.background);
        if background != self.background {
            self.background = background;
            self.full_redraw = true;
        }

        self.grid.clear();
        for &(col, row) in &self.stars {
            self.grid.put(col as i64, row as i64, Cell { ch: '.', fg: STAR_COLOR });
        }
        for circle in &frame.circles {
            self.grid.draw_circle(circle);
        }
        for text in &frame.texts {
            self.grid
                .write_text(text.position, &text.content, text.align, to_color(text.color));
        }

        self.flush_diff()?;
        Ok(())
    }
}

impl Drop for TerminalBackend {
    fn drop(&mut self) {
        let restored = execute!(
            self.out,
            DisableMouseCapture,
            ResetColor,
            cursor::Show,
            EnableLineWrap,
            LeaveAlternateScreen
        );
        if let Err(e) = restored {
            warn!("failed to restore terminal screen: {}", e);
        }
        if let Err(e) = terminal::disable_raw_mode() {
            warn!("failed to leave raw mode: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Grid {
        // 10x5 px cells
        Grid::new(100, 50, 1000.0, 250.0)
    }

    fn glyphs(grid: &Grid, ch: char) -> usize {
        grid.cells.iter().filter(|c| c.ch == ch).count()
    }

    #[test]
    fn test_pixel_cell_mapping() {
        let g = grid();
        assert_eq!(g.to_cell(Vector2::new(0.0, 0.0)), Some((0, 0)));
        assert_eq!(g.to_cell(Vector2::new(999.0, 249.0)), Some((99, 49)));
        assert_eq!(g.to_cell(Vector2::new(1000.0, 10.0)), None);
        assert_eq!(g.to_cell(Vector2::new(-1.0, 10.0)), None);
        assert_eq!(g.cell_center(3, 2), Vector2::new(35.0, 12.5));
    }

    #[test]
    fn test_tiny_disc_still_visible() {
        let mut g = grid();
        g.draw_circle(&Circle {
            center: Vector2::new(503.0, 101.0),
            radius: 1.0,
            color: Rgb::new(200, 200, 200),
            stroke: Stroke::Filled,
        });
        assert_eq!(glyphs(&g, '●'), 1);
        assert_eq!(g.cells[20 * 100 + 50].ch, '●');
    }

    #[test]
    fn test_ring_stays_on_circle() {
        let mut g = grid();
        g.draw_circle(&Circle {
            center: Vector2::new(500.0, 125.0),
            radius: 100.0,
            color: Rgb::new(100, 100, 100),
            stroke: Stroke::Outline,
        });
        assert!(glyphs(&g, '·') > 20);
        // Centre of the ring stays empty
        assert_eq!(g.cells[25 * 100 + 50], Cell::BLANK);
    }

    #[test]
    fn test_right_aligned_text_ends_at_anchor() {
        let mut g = grid();
        g.write_text(Vector2::new(995.0, 0.0), "Mass", Align::Right, Color::White);
        let row: String = g.cells[96..100].iter().map(|c| c.ch).collect();
        assert_eq!(row, "Mass");
        assert_eq!(g.cells[95], Cell::BLANK);
    }

    #[test]
    fn test_key_mapping() {
        let press = |code| KeyEvent::new(code, KeyModifiers::NONE);
        assert_eq!(map_key(press(KeyCode::Up)), Some(InputEvent::Key(Key::SpeedUp)));
        assert_eq!(map_key(press(KeyCode::Char(' '))), Some(InputEvent::Key(Key::SpeedReset)));
        assert_eq!(map_key(press(KeyCode::Char('-'))), Some(InputEvent::Key(Key::ZoomOut)));
        assert_eq!(map_key(press(KeyCode::Esc)), Some(InputEvent::Quit));
        assert_eq!(
            map_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(InputEvent::Quit)
        );
        assert_eq!(map_key(press(KeyCode::Left)), None);
    }

    #[test]
    fn test_starfield_is_seeded() {
        assert_eq!(build_stars(80, 24, 7), build_stars(80, 24, 7));
        assert_eq!(build_stars(80, 24, 7).len(), 32);
        assert!(build_stars(0, 24, 7).is_empty());
    }
}
