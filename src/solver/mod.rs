use std::fmt;
use std::str::FromStr;

use crate::buffer::StripBuffer;
use crate::complex::C;
use crate::config::ConfigError;
use crate::coord::PixelMapping;
use crate::partition::JobRecord;

pub mod scalar;
pub mod simd;

pub use scalar::ScalarKernel;
pub use simd::SimdKernel;

/// A point escapes once `|z|^2` reaches this value (`|z| >= 2`).
pub const ESCAPE_NORM_SQR: f64 = 4.0;

/// Escape-time count of `c`: the number of `z <- z^2 + c` steps taken from
/// `z = 0` while `|z|^2 < 4` and the count is below `cap`.
///
/// Every kernel must agree with this function bit for bit.
pub fn escape_time(c: C<f64>, cap: u32) -> u32 {
    let mut zr = 0.0f64;
    let mut zi = 0.0f64;
    let mut n = 0;
    loop {
        let zr2 = zr * zr;
        let zi2 = zi * zi;
        if !(zr2 + zi2 < ESCAPE_NORM_SQR && n < cap) {
            return n;
        }
        zi = (zr * zi) * 2.0 + c.im;
        zr = (zr2 - zi2) + c.re;
        n += 1;
    }
}

pub trait Kernel: Send {
    /// Writes the counts of `out.len()` consecutive pixels of row `y`,
    /// starting at column `x0`.
    fn escape_row(&self, mapping: &PixelMapping, y: i64, x0: i64, cap: u32, out: &mut [u32]);

    /// Computes every pixel of the job into `strip`, which must already
    /// have the job's extent.
    fn fill_strip(&self, record: &JobRecord, strip: &mut StripBuffer) {
        let x0 = record.pixel_top_left.x;
        let y0 = record.pixel_top_left.y;
        for (dy, row) in strip.row_slices_mut().enumerate() {
            self.escape_row(
                &record.mapping,
                y0 + dy as i64,
                x0,
                record.iteration_cap,
                row,
            );
        }
    }
}

/// Kernel selected at configuration time.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum KernelKind {
    #[default]
    Simd,
    Scalar,
}

impl Kernel for KernelKind {
    fn escape_row(&self, mapping: &PixelMapping, y: i64, x0: i64, cap: u32, out: &mut [u32]) {
        match self {
            Self::Simd => SimdKernel.escape_row(mapping, y, x0, cap, out),
            Self::Scalar => ScalarKernel.escape_row(mapping, y, x0, cap, out),
        }
    }
}

impl FromStr for KernelKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "simd" => Ok(Self::Simd),
            "scalar" => Ok(Self::Scalar),
            _ => Err(ConfigError::UnknownKernel(s.to_string())),
        }
    }
}

impl fmt::Display for KernelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simd => write!(f, "simd"),
            Self::Scalar => write!(f, "scalar"),
        }
    }
}
