use std::fmt;
use std::str::FromStr;

use image::{Rgb, RgbImage};

use crate::buffer::FractalBuffer;
use crate::config::ConfigError;

const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Maps an escape count below the cap to a color.
pub trait ColorScale {
    fn color(&self, count: u32, cap: u32) -> Rgb<u8>;
}

/// Three phase-shifted sine waves over the count.
#[derive(Copy, Clone, Debug, Default)]
pub struct Sinusoidal;

const FREQUENCY: f64 = 0.1;
const GREEN_PHASE: f64 = 2.094;
const BLUE_PHASE: f64 = 4.188;

fn wave(n: f64, phase: f64) -> u8 {
    ((0.5 * (FREQUENCY * n + phase).sin() + 0.5) * 255.0) as u8
}

impl ColorScale for Sinusoidal {
    fn color(&self, count: u32, _cap: u32) -> Rgb<u8> {
        let n = count as f64;
        Rgb([wave(n, 0.0), wave(n, GREEN_PHASE), wave(n, BLUE_PHASE)])
    }
}

/// White at zero, darkening toward the cap.
#[derive(Copy, Clone, Debug, Default)]
pub struct Greyscale;

impl ColorScale for Greyscale {
    fn color(&self, count: u32, cap: u32) -> Rgb<u8> {
        let frac = if cap == 0 {
            1.0
        } else {
            (count as f64 / cap as f64).clamp(0.0, 1.0)
        };
        let v = 255 - (frac * 255.0).round() as u8;
        Rgb([v, v, v])
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Palette {
    #[default]
    Sinusoidal,
    Greyscale,
}

impl ColorScale for Palette {
    fn color(&self, count: u32, cap: u32) -> Rgb<u8> {
        match self {
            Palette::Sinusoidal => Sinusoidal.color(count, cap),
            Palette::Greyscale => Greyscale.color(count, cap),
        }
    }
}

impl FromStr for Palette {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sinusoidal" | "sin" => Ok(Palette::Sinusoidal),
            "greyscale" | "grayscale" | "grey" => Ok(Palette::Greyscale),
            _ => Err(ConfigError::UnknownPalette(s.to_string())),
        }
    }
}

impl fmt::Display for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Palette::Sinusoidal => write!(f, "sinusoidal"),
            Palette::Greyscale => write!(f, "greyscale"),
        }
    }
}

pub trait Painter {
    fn count_color(&self, count: u32) -> Rgb<u8>;

    fn paint(&self, buffer: &FractalBuffer) -> RgbImage {
        let mut img = RgbImage::new(buffer.width() as u32, buffer.height() as u32);
        for (y, row) in buffer.counts().outer_iter().enumerate() {
            for (x, &count) in row.iter().enumerate() {
                img.put_pixel(x as u32, y as u32, self.count_color(count));
            }
        }
        img
    }
}

/// Paints points that never escaped black and the rest through a scale.
pub struct CountPainter<S> {
    scale: S,
    cap: u32,
}

impl<S: ColorScale> CountPainter<S> {
    pub fn new(scale: S, cap: u32) -> Self {
        Self { scale, cap }
    }
}

impl<S: ColorScale> Painter for CountPainter<S> {
    fn count_color(&self, count: u32) -> Rgb<u8> {
        if count >= self.cap {
            BLACK
        } else {
            self.scale.color(count, self.cap)
        }
    }
}
