use ndarray::{s, Array2, ArrayView1, Axis};

/// Escape counts for one frame, row-major, one `u32` per pixel.
///
/// Allocated once for the lifetime of the engine and overwritten in place
/// each frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FractalBuffer {
    counts: Array2<u32>,
}

impl FractalBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            counts: Array2::zeros((height, width)),
        }
    }

    pub fn width(&self) -> usize {
        self.counts.ncols()
    }

    pub fn height(&self) -> usize {
        self.counts.nrows()
    }

    pub fn get(&self, x: usize, y: usize) -> u32 {
        self.counts[[y, x]]
    }

    pub fn row(&self, y: usize) -> ArrayView1<'_, u32> {
        self.counts.row(y)
    }

    pub fn counts(&self) -> &Array2<u32> {
        &self.counts
    }

    /// Flat row-major view of every count.
    pub fn as_slice(&self) -> &[u32] {
        self.counts
            .as_slice()
            .expect("freshly allocated grid is in standard layout")
    }

    /// Copies a finished strip into its column range.
    ///
    /// The caller guarantees the strip lies inside the grid.
    pub(crate) fn blit(&mut self, strip: &StripBuffer) {
        if strip.is_empty() {
            return;
        }
        let (x0, y0) = strip.origin;
        let (h, w) = strip.counts.dim();
        self.counts
            .slice_mut(s![y0..y0 + h, x0..x0 + w])
            .assign(&strip.counts);
    }
}

/// Owned scratch grid for one worker's strip.
///
/// A strip travels to its worker inside the job and comes back filled, so
/// no two threads ever hold the same cells.
#[derive(Clone, Debug, Default)]
pub struct StripBuffer {
    origin: (usize, usize),
    counts: Array2<u32>,
}

impl StripBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-targets the strip at `origin` with the given extent, reusing the
    /// allocation when the extent is unchanged.
    pub fn reshape(&mut self, origin: (usize, usize), width: usize, height: usize) {
        self.origin = origin;
        if self.counts.dim() != (height, width) {
            self.counts = Array2::zeros((height, width));
        }
    }

    pub fn origin(&self) -> (usize, usize) {
        self.origin
    }

    pub fn width(&self) -> usize {
        self.counts.ncols()
    }

    pub fn height(&self) -> usize {
        self.counts.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Each row of the strip as a contiguous slice.
    pub fn row_slices_mut(&mut self) -> impl Iterator<Item = &mut [u32]> {
        self.counts
            .axis_iter_mut(Axis(0))
            .filter_map(|row| row.into_slice())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn filled_strip(origin: (usize, usize), width: usize, height: usize, value: u32) -> StripBuffer {
        let mut strip = StripBuffer::new();
        strip.reshape(origin, width, height);
        for row in strip.row_slices_mut() {
            row.fill(value);
        }
        strip
    }

    #[test]
    fn test_blit_writes_only_its_columns() {
        let mut buffer = FractalBuffer::new(6, 3);
        buffer.blit(&filled_strip((2, 0), 3, 3, 7));
        for y in 0..3 {
            let row: Vec<u32> = buffer.row(y).to_vec();
            assert_eq!(row, vec![0, 0, 7, 7, 7, 0]);
        }
    }

    #[test]
    fn test_blit_respects_row_origin() {
        let mut buffer = FractalBuffer::new(4, 4);
        buffer.blit(&filled_strip((1, 2), 2, 2, 3));
        assert_eq!(buffer.get(1, 1), 0);
        assert_eq!(buffer.get(1, 2), 3);
        assert_eq!(buffer.get(2, 3), 3);
        assert_eq!(buffer.get(3, 3), 0);
    }

    #[test]
    fn test_blit_empty_strip_is_noop() {
        let mut buffer = FractalBuffer::new(4, 4);
        buffer.blit(&filled_strip((4, 0), 0, 4, 9));
        assert!(buffer.as_slice().iter().all(|&n| n == 0));
    }

    #[test]
    fn test_reshape_keeps_allocation_for_same_extent() {
        let mut strip = filled_strip((0, 0), 3, 2, 5);
        strip.reshape((3, 0), 3, 2);
        assert_eq!(strip.origin(), (3, 0));
        assert_eq!(strip.counts[[1, 2]], 5);
        strip.reshape((3, 0), 4, 2);
        assert_eq!(strip.width(), 4);
        assert_eq!(strip.counts[[1, 3]], 0);
    }

    #[test]
    fn test_buffer_dimensions() {
        let buffer = FractalBuffer::new(1280, 720);
        assert_eq!(buffer.width(), 1280);
        assert_eq!(buffer.height(), 720);
        assert_eq!(buffer.as_slice().len(), 1280 * 720);
    }
}
