use thiserror::Error;

use crate::config::ConfigError;
use crate::coord::{PixelRect, ViewportError};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Viewport(#[from] ViewportError),
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("pixel rect {rect:?} does not fit the {width}x{height} buffer")]
    RectOutOfBounds {
        rect: PixelRect,
        width: usize,
        height: usize,
    },
    #[error("no worker {index} in a pool of {size}")]
    NoSuchWorker { index: usize, size: usize },
    #[error("worker {0} is still running its previous job")]
    WorkerBusy(usize),
    #[error("worker {0} is no longer accepting jobs")]
    WorkerDisconnected(usize),
    #[error("worker {0} panicked while computing its strip")]
    WorkerPanicked(usize),
    #[error("completion channel closed after {arrived} of {expected} jobs")]
    BarrierDisconnected { arrived: usize, expected: usize },
}
