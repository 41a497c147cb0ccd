use num::{traits::NumOps, Num, One};
use thiserror::Error;

use crate::complex::{c, C};

trait Two {
    fn two() -> Self;
}

impl<T> Two for T
where
    T: One + NumOps,
{
    fn two() -> Self {
        T::one() + T::one()
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Point<T>
where
    T: Num + Copy,
{
    pub x: T,
    pub y: T,
}

impl<T> Point<T>
where
    T: Num + Copy,
{
    pub fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
    pub fn add(&self, point: &Self) -> Self {
        Point::new(self.x + point.x, self.y + point.y)
    }
    pub fn sub(&self, point: &Self) -> Self {
        Point::new(self.x - point.x, self.y - point.y)
    }
    /// Component-wise product.
    pub fn mul(&self, point: &Self) -> Self {
        Point::new(self.x * point.x, self.y * point.y)
    }
    /// Component-wise quotient.
    pub fn div(&self, point: &Self) -> Self {
        Point::new(self.x / point.x, self.y / point.y)
    }
}

impl Point<i64> {
    pub fn as_f64(self) -> Point<f64> {
        Point::new(self.x as f64, self.y as f64)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Axis<T> {
    pub min: T,
    pub max: T,
}

impl<T> Axis<T>
where
    T: Num + Copy,
{
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    pub fn length(&self) -> T {
        self.max - self.min
    }

    pub fn center(&self) -> T {
        (self.max + self.min) / T::two()
    }
}

/// Rectangle on the complex plane. `x` is the real axis, `y` the imaginary
/// axis; `min` is the top-left corner as seen on screen.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlaneRect {
    pub x: Axis<f64>,
    pub y: Axis<f64>,
}

impl PlaneRect {
    pub fn new(x: Axis<f64>, y: Axis<f64>) -> Self {
        Self { x, y }
    }

    pub fn from_corners(top_left: C<f64>, bottom_right: C<f64>) -> Self {
        Self::new(
            Axis::new(top_left.re, bottom_right.re),
            Axis::new(top_left.im, bottom_right.im),
        )
    }

    pub fn from_box(center_x: f64, center_y: f64, width: f64, height: f64) -> Self {
        Self::new(
            Axis::new(center_x - width / 2.0, center_x + width / 2.0),
            Axis::new(center_y - height / 2.0, center_y + height / 2.0),
        )
    }

    pub fn top_left(&self) -> C<f64> {
        c(self.x.min, self.y.min)
    }

    pub fn bottom_right(&self) -> C<f64> {
        c(self.x.max, self.y.max)
    }
}

impl Default for PlaneRect {
    fn default() -> Self {
        Self::new(Axis::new(-2.0, 1.0), Axis::new(-1.0, 1.0))
    }
}

/// Half-open pixel rectangle `[top_left, bottom_right)`.
///
/// An inverted rectangle is not an error: it simply has no pixels.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PixelRect {
    pub top_left: Point<i64>,
    pub bottom_right: Point<i64>,
}

impl PixelRect {
    pub fn new(top_left: Point<i64>, bottom_right: Point<i64>) -> Self {
        Self {
            top_left,
            bottom_right,
        }
    }

    pub fn from_size(width: usize, height: usize) -> Self {
        Self::new(Point::new(0, 0), Point::new(width as i64, height as i64))
    }

    pub fn width(&self) -> usize {
        (self.bottom_right.x - self.top_left.x).max(0) as usize
    }

    pub fn height(&self) -> usize {
        (self.bottom_right.y - self.top_left.y).max(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn size(&self) -> usize {
        self.width() * self.height()
    }

    /// Whether every pixel of `self` lies inside `[0, width) x [0, height)`.
    pub fn fits_within(&self, width: usize, height: usize) -> bool {
        self.is_empty()
            || (self.top_left.x >= 0
                && self.top_left.y >= 0
                && self.bottom_right.x <= width as i64
                && self.bottom_right.y <= height as i64)
    }
}

/// Affine map from a pixel to its point `c` on the plane, fixed for a frame.
///
/// Every job of a frame carries the same mapping, so the value computed for
/// a pixel does not depend on which strip the pixel belongs to.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PixelMapping {
    pixel_origin: Point<i64>,
    plane_origin: C<f64>,
    step: Point<f64>,
}

impl PixelMapping {
    pub fn between(pixels: &PixelRect, plane: &PlaneRect) -> Self {
        let step_x = match pixels.width() {
            0 => 0.0,
            w => plane.x.length() / w as f64,
        };
        let step_y = match pixels.height() {
            0 => 0.0,
            h => plane.y.length() / h as f64,
        };
        Self {
            pixel_origin: pixels.top_left,
            plane_origin: plane.top_left(),
            step: Point::new(step_x, step_y),
        }
    }

    pub fn step(&self) -> Point<f64> {
        self.step
    }

    pub fn plane_x(&self, x: i64) -> f64 {
        self.plane_origin.re + (x - self.pixel_origin.x) as f64 * self.step.x
    }

    pub fn plane_y(&self, y: i64) -> f64 {
        self.plane_origin.im + (y - self.pixel_origin.y) as f64 * self.step.y
    }

    pub fn plane_at(&self, x: i64, y: i64) -> C<f64> {
        c(self.plane_x(x), self.plane_y(y))
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum ViewportError {
    #[error("viewport scale must be finite and positive, got ({0}, {1})")]
    InvalidScale(f64, f64),
    #[error("zoom factor must be finite and positive, got {0}")]
    InvalidZoomFactor(f64),
    #[error("cannot fit a {0}x{1} screen onto an empty plane rect")]
    EmptyFit(usize, usize),
}

/// The visible window into the plane: `screen = (world - offset) * scale`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    offset: Point<f64>,
    scale: Point<f64>,
}

fn valid_scale(scale: &Point<f64>) -> bool {
    scale.x.is_finite() && scale.y.is_finite() && scale.x > 0.0 && scale.y > 0.0
}

impl Viewport {
    pub fn new(offset: Point<f64>, scale: Point<f64>) -> Result<Self, ViewportError> {
        if !valid_scale(&scale) {
            return Err(ViewportError::InvalidScale(scale.x, scale.y));
        }
        Ok(Self { offset, scale })
    }

    /// Viewport mapping a `width` x `height` screen onto `plane`.
    pub fn fit(width: usize, height: usize, plane: &PlaneRect) -> Result<Self, ViewportError> {
        let scale = Point::new(
            width as f64 / plane.x.length(),
            height as f64 / plane.y.length(),
        );
        if !valid_scale(&scale) {
            return Err(ViewportError::EmptyFit(width, height));
        }
        Self::new(Point::new(plane.x.min, plane.y.min), scale)
    }

    pub fn offset(&self) -> Point<f64> {
        self.offset
    }

    pub fn scale(&self) -> Point<f64> {
        self.scale
    }

    pub fn world_to_screen(&self, world: Point<f64>) -> Point<i64> {
        let screen = world.sub(&self.offset).mul(&self.scale);
        Point::new(screen.x as i64, screen.y as i64)
    }

    pub fn screen_to_world(&self, screen: Point<f64>) -> Point<f64> {
        screen.div(&self.scale).add(&self.offset)
    }

    /// Scales by `factor` while keeping the plane point under `cursor` fixed.
    pub fn zoom_at(&mut self, cursor: Point<f64>, factor: f64) -> Result<(), ViewportError> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(ViewportError::InvalidZoomFactor(factor));
        }
        let scale = self.scale.mul(&Point::new(factor, factor));
        if !valid_scale(&scale) {
            return Err(ViewportError::InvalidScale(scale.x, scale.y));
        }
        let before = self.screen_to_world(cursor);
        self.scale = scale;
        let after = self.screen_to_world(cursor);
        self.offset = self.offset.add(&before.sub(&after));
        Ok(())
    }

    /// Drags the view so the plane point that was under `from` ends up under `to`.
    pub fn pan(&mut self, from: Point<f64>, to: Point<f64>) {
        self.offset = self.offset.sub(&to.sub(&from).div(&self.scale));
    }

    pub fn plane_rect(&self, pixels: &PixelRect) -> PlaneRect {
        let tl = self.screen_to_world(pixels.top_left.as_f64());
        let br = self.screen_to_world(pixels.bottom_right.as_f64());
        PlaneRect::new(Axis::new(tl.x, br.x), Axis::new(tl.y, br.y))
    }
}
