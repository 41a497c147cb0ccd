use std::mem;
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::buffer::{FractalBuffer, StripBuffer};
use crate::config::EngineConfig;
use crate::coord::{PixelRect, PlaneRect, Viewport};
use crate::error::EngineError;
use crate::partition::partition;
use crate::threads::{Completion, Job, WorkerPool, WorkerState};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FrameStats {
    /// Wall-clock time of the compute pass, dispatch to barrier.
    pub duration: Duration,
    pub workers: usize,
    pub pixels: usize,
    pub iteration_cap: u32,
}

/// Frame orchestrator: owns the viewport, the worker pool and the buffer.
///
/// `compute_frame` takes `&mut self`, so the buffer cannot be read while a
/// frame is in flight.
pub struct Engine {
    viewport: Viewport,
    pool: WorkerPool,
    buffer: FractalBuffer,
    strips: Vec<StripBuffer>,
    last_frame: Option<FrameStats>,
}

impl Engine {
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let viewport = Viewport::fit(config.width, config.height, &config.plane)?;
        let workers = config.worker_count();
        let pool = WorkerPool::new(workers, config.kernel)?;
        let buffer = FractalBuffer::new(config.width, config.height);
        info!(
            "engine ready: {}x{} buffer, {} {} workers",
            config.width, config.height, workers, config.kernel
        );
        Ok(Self {
            viewport,
            pool,
            buffer,
            strips: (0..workers).map(|_| StripBuffer::new()).collect(),
            last_frame: None,
        })
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn buffer(&self) -> &FractalBuffer {
        &self.buffer
    }

    pub fn workers(&self) -> usize {
        self.pool.size()
    }

    pub fn worker_states(&self) -> Vec<WorkerState> {
        self.pool.states()
    }

    /// Jobs that reported back during the last frame.
    pub fn completed(&self) -> usize {
        self.pool.completed()
    }

    pub fn last_frame(&self) -> Option<FrameStats> {
        self.last_frame
    }

    pub fn full_rect(&self) -> PixelRect {
        PixelRect::from_size(self.buffer.width(), self.buffer.height())
    }

    /// Computes `pixels` for the plane window the viewport shows there.
    pub fn compute_frame(&mut self, pixels: PixelRect, cap: u32) -> Result<FrameStats, EngineError> {
        let plane = self.viewport.plane_rect(&pixels);
        self.compute_region(pixels, plane, cap)
    }

    /// Computes `pixels` as a window onto `plane`, bypassing the viewport.
    ///
    /// On `Err` the buffer still holds the previous frame.
    pub fn compute_region(
        &mut self,
        pixels: PixelRect,
        plane: PlaneRect,
        cap: u32,
    ) -> Result<FrameStats, EngineError> {
        let (width, height) = (self.buffer.width(), self.buffer.height());
        if !pixels.fits_within(width, height) {
            return Err(EngineError::RectOutOfBounds {
                rect: pixels,
                width,
                height,
            });
        }

        let start = Instant::now();
        let records = partition(&pixels, &plane, self.pool.size(), cap, width);
        let jobs: Vec<Job> = records
            .into_iter()
            .map(|record| {
                let mut strip = mem::take(&mut self.strips[record.strip]);
                let origin = (
                    record.pixel_top_left.x.max(0) as usize,
                    record.pixel_top_left.y.max(0) as usize,
                );
                strip.reshape(origin, record.width(), record.height());
                Job { record, strip }
            })
            .collect();

        let completions = self.pool.run(jobs)?;
        self.absorb(completions)?;

        let stats = FrameStats {
            duration: start.elapsed(),
            workers: self.pool.size(),
            pixels: pixels.size(),
            iteration_cap: cap,
        };
        debug!(
            "frame {:?} cap {} took {:?} on {} workers",
            pixels, cap, stats.duration, stats.workers
        );
        self.last_frame = Some(stats);
        Ok(stats)
    }

    /// Blits every returned strip, or none of them if any worker failed.
    fn absorb(&mut self, completions: Vec<Completion>) -> Result<(), EngineError> {
        let failed = completions
            .iter()
            .find(|c| c.strip.is_none())
            .map(|c| c.worker);
        for completion in completions {
            if let Some(strip) = completion.strip {
                if failed.is_none() {
                    self.buffer.blit(&strip);
                }
                self.strips[completion.worker] = strip;
            }
        }
        match failed {
            Some(worker) => Err(EngineError::WorkerPanicked(worker)),
            None => Ok(()),
        }
    }

    /// Stops and joins the worker pool.
    pub fn shutdown(mut self) {
        self.pool.shutdown();
    }
}
