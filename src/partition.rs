use crate::complex::C;
use crate::coord::{PixelMapping, PixelRect, PlaneRect, Point};

/// One worker's share of a frame. Built fresh every frame and moved whole
/// into exactly one worker.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct JobRecord {
    pub strip: usize,
    pub pixel_top_left: Point<i64>,
    pub pixel_bottom_right: Point<i64>,
    pub plane_top_left: C<f64>,
    pub plane_bottom_right: C<f64>,
    pub iteration_cap: u32,
    pub row_stride: usize,
    pub mapping: PixelMapping,
}

impl JobRecord {
    pub fn pixel_rect(&self) -> PixelRect {
        PixelRect::new(self.pixel_top_left, self.pixel_bottom_right)
    }

    pub fn width(&self) -> usize {
        self.pixel_rect().width()
    }

    pub fn height(&self) -> usize {
        self.pixel_rect().height()
    }
}

/// Half-open column ranges splitting `[start, end)` into `n` contiguous
/// parts; the first `len % n` parts get one extra column.
pub fn column_ranges(start: i64, end: i64, n: usize) -> Vec<(i64, i64)> {
    let len = (end - start).max(0);
    if n == 0 {
        return vec![];
    }
    let size = len / n as i64;
    let size_xtra = len % n as i64;

    let mut ranges = Vec::with_capacity(n);
    let mut from = start;
    for i in 0..n as i64 {
        let to = from + size + i64::from(i < size_xtra);
        ranges.push((from, to));
        from = to;
    }
    ranges
}

/// Splits a frame into `workers` vertical strips spanning its full height.
///
/// A strip's plane rect is the image of its pixel bounds under the frame's
/// mapping, so adjacent strips meet on the same plane coordinate.
pub fn partition(
    pixels: &PixelRect,
    plane: &PlaneRect,
    workers: usize,
    iteration_cap: u32,
    row_stride: usize,
) -> Vec<JobRecord> {
    let mapping = PixelMapping::between(pixels, plane);
    let top = pixels.top_left.y;
    let bottom = pixels.bottom_right.y;

    column_ranges(pixels.top_left.x, pixels.bottom_right.x, workers)
        .into_iter()
        .enumerate()
        .map(|(strip, (left, right))| JobRecord {
            strip,
            pixel_top_left: Point::new(left, top),
            pixel_bottom_right: Point::new(right, bottom),
            plane_top_left: mapping.plane_at(left, top),
            plane_bottom_right: mapping.plane_at(right, bottom),
            iteration_cap,
            row_stride,
            mapping,
        })
        .collect()
}
