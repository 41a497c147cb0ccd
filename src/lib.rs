use image::RgbImage;
use log::debug;

use crate::coord::Point;
use crate::painter::{CountPainter, Painter, Palette};

pub mod buffer;
pub mod complex;
pub mod config;
pub mod coord;
pub mod engine;
pub mod error;
pub mod painter;
pub mod partition;
pub mod solver;
pub mod threads;

pub use buffer::FractalBuffer;
pub use config::{ConfigError, EngineConfig};
pub use coord::{PixelRect, PlaneRect, Viewport};
pub use engine::{Engine, FrameStats};
pub use error::EngineError;
pub use solver::{escape_time, KernelKind};

pub const ZOOM_IN: f64 = 1.1;
pub const ZOOM_OUT: f64 = 0.9;
pub const CAP_STEP: u32 = 64;
pub const MIN_CAP: u32 = 64;

/// Discrete input events, in screen pixels where a position is involved.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Action {
    PanStart(Point<f64>),
    PanMove(Point<f64>),
    PanEnd,
    Zoom { cursor: Point<f64>, factor: f64 },
    RaiseCap,
    LowerCap,
}

impl Action {
    pub fn zoom_in(cursor: Point<f64>) -> Self {
        Action::Zoom {
            cursor,
            factor: ZOOM_IN,
        }
    }

    pub fn zoom_out(cursor: Point<f64>) -> Self {
        Action::Zoom {
            cursor,
            factor: ZOOM_OUT,
        }
    }
}

/// Drives an engine from input actions and keeps the current cap.
pub struct Explorer {
    engine: Engine,
    cap: u32,
    pan_anchor: Option<Point<f64>>,
}

impl Explorer {
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        Ok(Self {
            engine: Engine::new(config)?,
            cap: config.iteration_cap,
            pan_anchor: None,
        })
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn viewport(&self) -> &Viewport {
        self.engine.viewport()
    }

    pub fn buffer(&self) -> &FractalBuffer {
        self.engine.buffer()
    }

    pub fn cap(&self) -> u32 {
        self.cap
    }

    /// Applies one action. Returns whether the next frame will differ.
    pub fn apply(&mut self, action: Action) -> Result<bool, EngineError> {
        let changed = match action {
            Action::PanStart(cursor) => {
                self.pan_anchor = Some(cursor);
                false
            }
            Action::PanMove(cursor) => match self.pan_anchor.replace(cursor) {
                Some(anchor) => {
                    self.engine.viewport_mut().pan(anchor, cursor);
                    anchor != cursor
                }
                None => {
                    self.pan_anchor = None;
                    false
                }
            },
            Action::PanEnd => {
                self.pan_anchor = None;
                false
            }
            Action::Zoom { cursor, factor } => {
                self.engine.viewport_mut().zoom_at(cursor, factor)?;
                true
            }
            Action::RaiseCap => {
                self.cap = self.cap.saturating_add(CAP_STEP);
                true
            }
            Action::LowerCap => {
                let before = self.cap;
                if self.cap > MIN_CAP {
                    self.cap = (self.cap - CAP_STEP).max(MIN_CAP);
                }
                before != self.cap
            }
        };
        debug!("{:?} -> cap {}, changed {}", action, self.cap, changed);
        Ok(changed)
    }

    /// Recomputes the whole screen at the current cap.
    pub fn frame(&mut self) -> Result<FrameStats, EngineError> {
        let pixels = self.engine.full_rect();
        self.engine.compute_frame(pixels, self.cap)
    }

    /// Paints the buffer against the cap it was computed with, which lags
    /// `cap()` until the next `frame`.
    pub fn paint(&self, palette: Palette) -> RgbImage {
        let cap = self
            .engine
            .last_frame()
            .map_or(self.cap, |stats| stats.iteration_cap);
        CountPainter::new(palette, cap).paint(self.engine.buffer())
    }

    pub fn shutdown(self) {
        self.engine.shutdown();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn explorer() -> Explorer {
        Explorer::new(&EngineConfig::new(64, 36).with_workers(2)).unwrap()
    }

    #[test]
    fn test_cap_steps_with_floor() {
        let mut explorer = explorer();
        assert_eq!(explorer.cap(), 128);
        assert!(explorer.apply(Action::RaiseCap).unwrap());
        assert_eq!(explorer.cap(), 192);
        explorer.apply(Action::LowerCap).unwrap();
        explorer.apply(Action::LowerCap).unwrap();
        assert_eq!(explorer.cap(), 64);
        assert!(!explorer.apply(Action::LowerCap).unwrap());
        assert_eq!(explorer.cap(), 64);
    }

    #[test]
    fn test_drag_pan_moves_offset() {
        let mut explorer = explorer();
        let before = explorer.viewport().offset();
        let scale = explorer.viewport().scale();
        explorer.apply(Action::PanStart(Point::new(10.0, 10.0))).unwrap();
        assert!(explorer.apply(Action::PanMove(Point::new(14.0, 7.0))).unwrap());
        explorer.apply(Action::PanMove(Point::new(16.0, 7.0))).unwrap();
        explorer.apply(Action::PanEnd).unwrap();
        let after = explorer.viewport().offset();
        assert!((after.x - (before.x - 6.0 / scale.x)).abs() < 1e-12);
        assert!((after.y - (before.y + 3.0 / scale.y)).abs() < 1e-12);

        // no drag in progress
        assert!(!explorer.apply(Action::PanMove(Point::new(0.0, 0.0))).unwrap());
        assert_eq!(explorer.viewport().offset(), after);
    }

    #[test]
    fn test_zoom_keeps_cursor_anchored() {
        let mut explorer = explorer();
        let cursor = Point::new(20.0, 11.0);
        let anchor = explorer.viewport().screen_to_world(cursor);
        explorer.apply(Action::zoom_in(cursor)).unwrap();
        explorer.apply(Action::zoom_in(cursor)).unwrap();
        explorer.apply(Action::zoom_out(cursor)).unwrap();
        let after = explorer.viewport().screen_to_world(cursor);
        assert!((after.x - anchor.x).abs() <= 1e-9 * anchor.x.abs().max(1.0));
        assert!((after.y - anchor.y).abs() <= 1e-9 * anchor.y.abs().max(1.0));
    }

    #[test]
    fn test_bad_zoom_factor_is_an_error() {
        let mut explorer = explorer();
        let zoom = Action::Zoom {
            cursor: Point::new(0.0, 0.0),
            factor: 0.0,
        };
        assert!(matches!(
            explorer.apply(zoom),
            Err(EngineError::Viewport(_))
        ));
    }

    #[test]
    fn test_frame_and_paint() {
        let mut explorer = explorer();
        let stats = explorer.frame().unwrap();
        assert_eq!(stats.pixels, 64 * 36);
        assert_eq!(stats.iteration_cap, 128);
        let img = explorer.paint(Palette::Greyscale);
        assert_eq!(img.dimensions(), (64, 36));
        for (x, y, px) in img.enumerate_pixels() {
            if explorer.buffer().get(x as usize, y as usize) == 128 {
                assert_eq!(px.0, [0, 0, 0]);
            }
        }
    }

    #[test]
    fn test_paint_uses_cap_of_last_frame() {
        let mut explorer = explorer();
        explorer.frame().unwrap();
        let in_set: Vec<(u32, u32)> = (0..36)
            .flat_map(|y| (0..64).map(move |x| (x, y)))
            .filter(|&(x, y)| explorer.buffer().get(x as usize, y as usize) == 128)
            .collect();
        assert!(!in_set.is_empty());

        for action in [Action::RaiseCap, Action::LowerCap, Action::LowerCap] {
            explorer.apply(action).unwrap();
            let img = explorer.paint(Palette::Sinusoidal);
            for &(x, y) in &in_set {
                assert_eq!(img.get_pixel(x, y).0, [0, 0, 0]);
            }
        }
        assert_eq!(explorer.cap(), 64);
    }
}
