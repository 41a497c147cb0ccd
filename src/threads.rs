use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use log::{debug, error, warn};

use crate::buffer::StripBuffer;
use crate::error::EngineError;
use crate::partition::JobRecord;
use crate::solver::Kernel;

/// Everything a worker needs for one strip, handed over in a single send.
#[derive(Debug)]
pub struct Job {
    pub record: JobRecord,
    pub strip: StripBuffer,
}

/// Sent back by a worker exactly once per job. `strip` is `None` when the
/// kernel panicked.
#[derive(Debug)]
pub struct Completion {
    pub worker: usize,
    pub strip: Option<StripBuffer>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Running,
    Terminating,
}

impl WorkerState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Idle,
            1 => Self::Running,
            _ => Self::Terminating,
        }
    }
}

#[derive(Debug, Default)]
struct SharedState(AtomicU8);

impl SharedState {
    fn set(&self, state: WorkerState) {
        self.0.store(state as u8, Ordering::Release);
    }

    fn get(&self) -> WorkerState {
        WorkerState::from_u8(self.0.load(Ordering::Acquire))
    }
}

/// Counts finished jobs for the current frame.
///
/// The counter lives on the orchestrator side and only moves when a
/// completion is received, so waiting on it blocks instead of spinning.
pub struct CompletionBarrier {
    rx: mpsc::Receiver<Completion>,
    arrived: usize,
}

impl CompletionBarrier {
    pub fn channel() -> (Self, mpsc::Sender<Completion>) {
        let (tx, rx) = mpsc::channel();
        (Self { rx, arrived: 0 }, tx)
    }

    pub fn reset(&mut self) {
        self.arrived = 0;
    }

    pub fn arrived(&self) -> usize {
        self.arrived
    }

    /// Blocks until `expected` completions have arrived since the last reset.
    pub fn wait(&mut self, expected: usize) -> Result<Vec<Completion>, EngineError> {
        let mut completions = Vec::with_capacity(expected.saturating_sub(self.arrived));
        while self.arrived < expected {
            let completion = self
                .rx
                .recv()
                .map_err(|_| EngineError::BarrierDisconnected {
                    arrived: self.arrived,
                    expected,
                })?;
            self.arrived += 1;
            completions.push(completion);
        }
        Ok(completions)
    }
}

struct Worker {
    id: usize,
    tx: Option<mpsc::Sender<Job>>,
    alive: Arc<AtomicBool>,
    state: Arc<SharedState>,
    busy: bool,
    handle: Option<thread::JoinHandle<()>>,
}

impl Worker {
    fn spawn<K>(id: usize, kernel: K, done: mpsc::Sender<Completion>) -> Result<Self, EngineError>
    where
        K: Kernel + 'static,
    {
        let (tx, rx) = mpsc::channel::<Job>();
        let alive = Arc::new(AtomicBool::new(true));
        let state = Arc::new(SharedState::default());

        let thread_alive = alive.clone();
        let thread_state = state.clone();
        let handle = thread::Builder::new()
            .name(format!("mandelpool-worker-{}", id))
            .spawn(move || {
                while let Ok(Job { record, mut strip }) = rx.recv() {
                    if !thread_alive.load(Ordering::Acquire) {
                        break;
                    }
                    thread_state.set(WorkerState::Running);
                    let result = panic::catch_unwind(AssertUnwindSafe(|| {
                        kernel.fill_strip(&record, &mut strip)
                    }));
                    let strip = match result {
                        Ok(()) => Some(strip),
                        Err(_) => {
                            error!("worker {} panicked on strip {:?}", id, record.pixel_rect());
                            None
                        }
                    };
                    thread_state.set(WorkerState::Idle);
                    if done.send(Completion { worker: id, strip }).is_err() {
                        break;
                    }
                }
                thread_state.set(WorkerState::Terminating);
                debug!("worker {} exiting", id);
            })?;

        Ok(Self {
            id,
            tx: Some(tx),
            alive,
            state,
            busy: false,
            handle: Some(handle),
        })
    }

    fn dispatch(&mut self, job: Job) -> Result<(), EngineError> {
        if self.busy {
            return Err(EngineError::WorkerBusy(self.id));
        }
        let tx = self
            .tx
            .as_ref()
            .ok_or(EngineError::WorkerDisconnected(self.id))?;
        tx.send(job)
            .map_err(|_| EngineError::WorkerDisconnected(self.id))?;
        self.busy = true;
        Ok(())
    }

    fn shutdown(&mut self) {
        self.alive.store(false, Ordering::Release);
        // Closing the channel wakes the worker if it is idle.
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("worker {} did not exit cleanly", self.id);
            }
        }
    }
}

/// Fixed set of long-lived workers, each running one job at a time.
pub struct WorkerPool {
    workers: Vec<Worker>,
    barrier: CompletionBarrier,
}

impl WorkerPool {
    pub fn new<K>(size: usize, kernel: K) -> Result<Self, EngineError>
    where
        K: Kernel + Clone + 'static,
    {
        let (barrier, done) = CompletionBarrier::channel();
        let workers = (0..size)
            .map(|id| Worker::spawn(id, kernel.clone(), done.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        debug!("spawned {} workers", workers.len());
        Ok(Self { workers, barrier })
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    pub fn states(&self) -> Vec<WorkerState> {
        self.workers.iter().map(|w| w.state.get()).collect()
    }

    /// Completions received since the last dispatch round began.
    pub fn completed(&self) -> usize {
        self.barrier.arrived()
    }

    /// Hands `job` to worker `index`. The worker must have reported its
    /// previous job first.
    pub fn dispatch(&mut self, index: usize, job: Job) -> Result<(), EngineError> {
        let size = self.workers.len();
        self.workers
            .get_mut(index)
            .ok_or(EngineError::NoSuchWorker { index, size })?
            .dispatch(job)
    }

    /// Dispatches job `i` to worker `i` and blocks until every dispatched
    /// job has reported back. Completions are returned in worker order.
    pub fn run(&mut self, jobs: Vec<Job>) -> Result<Vec<Completion>, EngineError> {
        self.barrier.reset();
        let mut dispatched = 0;
        let mut dispatch_error = None;
        for (index, job) in jobs.into_iter().enumerate() {
            match self.dispatch(index, job) {
                Ok(()) => dispatched += 1,
                Err(e) => {
                    dispatch_error = Some(e);
                    break;
                }
            }
        }

        let mut completions = match self.barrier.wait(dispatched) {
            Ok(completions) => completions,
            Err(e) => {
                for worker in &mut self.workers[..dispatched] {
                    worker.busy = false;
                }
                return Err(e);
            }
        };
        for completion in &completions {
            self.workers[completion.worker].busy = false;
        }
        if let Some(e) = dispatch_error {
            return Err(e);
        }
        completions.sort_by_key(|c| c.worker);
        Ok(completions)
    }

    /// Stops and joins every worker. A job already running finishes first.
    pub fn shutdown(&mut self) {
        for worker in &mut self.workers {
            worker.shutdown();
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
