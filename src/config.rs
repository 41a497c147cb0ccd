use thiserror::Error;

use crate::coord::PlaneRect;
use crate::solver::KernelKind;

pub const DEFAULT_WIDTH: usize = 1280;
pub const DEFAULT_HEIGHT: usize = 720;
pub const DEFAULT_ITERATION_CAP: u32 = 128;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("buffer must be at least 1x1, got {width}x{height}")]
    EmptyBuffer { width: usize, height: usize },
    #[error("worker pool needs at least one worker")]
    NoWorkers,
    #[error("unknown kernel {0:?}, expected \"simd\" or \"scalar\"")]
    UnknownKernel(String),
    #[error("unknown palette {0:?}, expected \"sinusoidal\" or \"greyscale\"")]
    UnknownPalette(String),
}

/// Settings fixed for the lifetime of an engine.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    pub width: usize,
    pub height: usize,
    /// Pool size; `None` uses the number of logical CPUs.
    pub workers: Option<usize>,
    pub kernel: KernelKind,
    /// Plane window shown before any pan or zoom.
    pub plane: PlaneRect,
    pub iteration_cap: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            workers: None,
            kernel: KernelKind::default(),
            plane: PlaneRect::default(),
            iteration_cap: DEFAULT_ITERATION_CAP,
        }
    }
}

impl EngineConfig {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn with_kernel(mut self, kernel: KernelKind) -> Self {
        self.kernel = kernel;
        self
    }

    pub fn with_plane(mut self, plane: PlaneRect) -> Self {
        self.plane = plane;
        self
    }

    pub fn with_iteration_cap(mut self, iteration_cap: u32) -> Self {
        self.iteration_cap = iteration_cap;
        self
    }

    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyBuffer {
                width: self.width,
                height: self.height,
            });
        }
        if self.worker_count() == 0 {
            return Err(ConfigError::NoWorkers);
        }
        Ok(())
    }
}
