use lazy_static::lazy_static;
use wide::{f64x4, CmpLt};

use crate::coord::PixelMapping;
use crate::solver::{Kernel, ESCAPE_NORM_SQR};

pub const LANES: usize = 4;

lazy_static! {
    static ref ZERO: f64x4 = f64x4::splat(0.0);
    static ref ONE: f64x4 = f64x4::splat(1.0);
    static ref TWO: f64x4 = f64x4::splat(2.0);
    static ref ESCAPE: f64x4 = f64x4::splat(ESCAPE_NORM_SQR);
    static ref LANE_INDEX: f64x4 = f64x4::new([0.0, 1.0, 2.0, 3.0]);
}

/// Four pixels in lockstep; a lane freezes its `z` and count as soon as it
/// escapes or reaches the cap, and the batch ends when every lane is frozen.
///
/// Counts are carried as `f64`, which is exact for any `u32` cap.
fn escape_lanes(cr: f64x4, ci: f64x4, live: f64x4, cap: f64x4) -> [f64; LANES] {
    let mut zr = *ZERO;
    let mut zi = *ZERO;
    let mut n = *ZERO;
    let mut active = live;
    loop {
        let zr2 = zr * zr;
        let zi2 = zi * zi;
        active = active & (zr2 + zi2).cmp_lt(*ESCAPE) & n.cmp_lt(cap);
        if !active.any() {
            return n.to_array();
        }
        let next_zi = (zr * zi) * *TWO + ci;
        let next_zr = (zr2 - zi2) + cr;
        zr = active.blend(next_zr, zr);
        zi = active.blend(next_zi, zi);
        n = active.blend(n + *ONE, n);
    }
}

/// 4-wide kernel on `wide::f64x4`. A row whose length is not a multiple of
/// four ends with a partial batch whose unused lanes start frozen.
#[derive(Copy, Clone, Debug, Default)]
pub struct SimdKernel;

impl Kernel for SimdKernel {
    fn escape_row(&self, mapping: &PixelMapping, y: i64, x0: i64, cap: u32, out: &mut [u32]) {
        let ci = f64x4::splat(mapping.plane_y(y));
        let cap = f64x4::splat(cap as f64);
        for (batch, slots) in out.chunks_mut(LANES).enumerate() {
            let x = x0 + (batch * LANES) as i64;
            let mut re = [0.0; LANES];
            for (lane, r) in re.iter_mut().enumerate() {
                *r = mapping.plane_x(x + lane as i64);
            }
            let live = LANE_INDEX.cmp_lt(f64x4::splat(slots.len() as f64));
            let counts = escape_lanes(f64x4::new(re), ci, live, cap);
            for (slot, n) in slots.iter_mut().zip(counts) {
                *slot = n as u32;
            }
        }
    }
}
