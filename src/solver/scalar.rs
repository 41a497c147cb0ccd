use crate::coord::PixelMapping;
use crate::solver::{escape_time, Kernel};

/// One pixel at a time through [`escape_time`].
#[derive(Copy, Clone, Debug, Default)]
pub struct ScalarKernel;

impl Kernel for ScalarKernel {
    fn escape_row(&self, mapping: &PixelMapping, y: i64, x0: i64, cap: u32, out: &mut [u32]) {
        for (dx, slot) in out.iter_mut().enumerate() {
            *slot = escape_time(mapping.plane_at(x0 + dx as i64, y), cap);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::coord::{Axis, PixelRect, PlaneRect};

    #[test]
    fn test_scalar_row_matches_escape_time() {
        let pixels = PixelRect::from_size(5, 1);
        let plane = PlaneRect::new(Axis::new(-2.0, 0.5), Axis::new(0.0, 0.0));
        let mapping = PixelMapping::between(&pixels, &plane);
        let mut out = [0u32; 5];
        ScalarKernel.escape_row(&mapping, 0, 0, 30, &mut out);
        for (x, n) in out.iter().enumerate() {
            assert_eq!(*n, escape_time(mapping.plane_at(x as i64, 0), 30));
        }
        assert_eq!(out[0], 1);
        assert_eq!(out[4], 30);
    }
}
