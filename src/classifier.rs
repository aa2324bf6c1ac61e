//! Classifier adapter: owns the external model and runs it off the UI thread.
//!
//! Lifecycle is `Unloaded -> Loading -> Ready` or `Loading -> Failed`, with one
//! load attempt per session. Every inference borrows its input buffer from a
//! [`BufferPool`]; the guard hands it back when dropped, whichever way the
//! call ends.

use crate::error::{Error, Result};
use crate::types::Grid;
use std::ops::{Deref, DerefMut};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

/// A loaded model that maps one batched input to a probability vector.
pub trait Model: Send {
    fn infer(&mut self, input: &[f32], shape: [usize; 4]) -> Result<Vec<f32>>;
}

/// Opens a model file. Blocking; the adapter calls it on tokio's blocking pool.
pub trait ModelLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<Box<dyn Model>>;
}

/// Loader used when the crate is built without a model runtime.
pub struct UnavailableLoader;

impl ModelLoader for UnavailableLoader {
    fn load(&self, path: &Path) -> Result<Box<dyn Model>> {
        Err(Error::Load(format!(
            "cannot open {}: built without the `onnx` feature",
            path.display()
        )))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClassifierState {
    Unloaded,
    Loading,
    Ready,
    Failed,
}

/* ------------------------------ buffer pool ------------------------------ */

/// Free buffers kept around for reuse.
pub const MAX_RETAINED: usize = 8;
/// Outstanding + retained buffers above this trip the safety sweep.
pub const SWEEP_THRESHOLD: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolStats {
    pub live: usize,
    pub retained: usize,
    pub retained_bytes: usize,
}

#[derive(Default)]
struct PoolInner {
    free: Vec<Vec<f32>>,
    live: usize,
}

/// Recycles inference input buffers.
pub struct BufferPool {
    inner: Mutex<PoolInner>,
    max_retained: usize,
    sweep_threshold: usize,
}

impl BufferPool {
    pub fn new() -> Arc<Self> {
        Self::with_limits(MAX_RETAINED, SWEEP_THRESHOLD)
    }

    pub fn with_limits(max_retained: usize, sweep_threshold: usize) -> Arc<Self> {
        Arc::new(Self { inner: Mutex::new(PoolInner::default()), max_retained, sweep_threshold })
    }

    fn lock(&self) -> MutexGuard<'_, PoolInner> {
        // Counters stay meaningful even if a holder panicked.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Zero-filled buffer of `len` floats, returned to the pool on drop.
    pub fn acquire(self: &Arc<Self>, len: usize) -> PooledBuffer {
        let mut inner = self.lock();
        let mut buf = inner.free.pop().unwrap_or_default();
        buf.clear();
        buf.resize(len, 0.0);
        inner.live += 1;
        PooledBuffer { buf, pool: Arc::clone(self) }
    }

    fn release(&self, buf: Vec<f32>) {
        let mut inner = self.lock();
        inner.live = inner.live.saturating_sub(1);
        if inner.free.len() < self.max_retained {
            inner.free.push(buf);
        }
    }

    pub fn stats(&self) -> PoolStats {
        let inner = self.lock();
        PoolStats {
            live: inner.live,
            retained: inner.free.len(),
            retained_bytes: inner.free.iter().map(|b| b.capacity() * size_of::<f32>()).sum(),
        }
    }

    /// Periodic safety net. Guards already release buffers; this only frees
    /// the retained ones when the totals look like something is piling up.
    /// Returns how many buffers were dropped.
    pub fn sweep(&self) -> usize {
        let mut inner = self.lock();
        let total = inner.live + inner.free.len();
        debug!(live = inner.live, retained = inner.free.len(), "buffer pool sweep");
        if total <= self.sweep_threshold {
            return 0;
        }
        let dropped = inner.free.len();
        warn!(live = inner.live, dropped, "buffer pool over threshold; dropping retained buffers");
        inner.free.clear();
        inner.free.shrink_to_fit();
        dropped
    }
}

/// A buffer on loan from a [`BufferPool`].
pub struct PooledBuffer {
    buf: Vec<f32>,
    pool: Arc<BufferPool>,
}

impl Deref for PooledBuffer {
    type Target = [f32];
    fn deref(&self) -> &[f32] {
        &self.buf
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut [f32] {
        &mut self.buf
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buf));
    }
}

/* ------------------------------ model handle ----------------------------- */

/// Shareable handle to a ready model; cheap to clone into a spawned task.
#[derive(Clone)]
pub struct ModelHandle {
    model: Arc<Mutex<Box<dyn Model>>>,
    pool: Arc<BufferPool>,
}

impl ModelHandle {
    fn new(model: Box<dyn Model>, pool: Arc<BufferPool>) -> Self {
        Self { model: Arc::new(Mutex::new(model)), pool }
    }

    /// Run one inference with the leading batch dimension added.
    pub async fn classify(&self, grid: &Grid) -> Result<Vec<f32>> {
        let mut input = self.pool.acquire(grid.as_slice().len());
        input.copy_from_slice(grid.as_slice());
        let model = Arc::clone(&self.model);

        let joined = tokio::task::spawn_blocking(move || {
            let mut model = model
                .lock()
                .map_err(|_| Error::Inference("model lock poisoned".into()))?;
            model.infer(&input, Grid::batched_shape())
            // `input` drops here and goes back to the pool.
        })
        .await;

        let probabilities = match joined {
            Ok(result) => result?,
            Err(e) => return Err(Error::Inference(format!("inference task failed: {e}"))),
        };
        if probabilities.is_empty() {
            return Err(Error::Inference("model returned an empty output".into()));
        }
        Ok(probabilities)
    }
}

/* ------------------------------- classifier ------------------------------ */

pub struct Classifier {
    loader: Arc<dyn ModelLoader>,
    pool: Arc<BufferPool>,
    state: ClassifierState,
    handle: Option<ModelHandle>,
    failure: Option<String>,
}

impl Classifier {
    pub fn new(loader: Arc<dyn ModelLoader>) -> Self {
        Self::with_pool(loader, BufferPool::new())
    }

    pub fn with_pool(loader: Arc<dyn ModelLoader>, pool: Arc<BufferPool>) -> Self {
        Self { loader, pool, state: ClassifierState::Unloaded, handle: None, failure: None }
    }

    pub fn state(&self) -> ClassifierState {
        self.state
    }

    pub fn pool(&self) -> &Arc<BufferPool> {
        &self.pool
    }

    /// Load the model and warm it up with one all-zero inference.
    ///
    /// Only the first call does any work: later calls succeed if that attempt
    /// succeeded and return its failure otherwise. Nothing is retried.
    pub async fn load(&mut self, path: &Path) -> Result<()> {
        match self.state {
            ClassifierState::Ready => return Ok(()),
            ClassifierState::Failed => {
                return Err(Error::Load(self.failure.clone().unwrap_or_default()));
            }
            ClassifierState::Loading => {
                return Err(Error::Load("model load already in progress".into()));
            }
            ClassifierState::Unloaded => {}
        }

        self.state = ClassifierState::Loading;
        info!("loading model from {}", path.display());

        match self.open_and_warm_up(path).await {
            Ok(handle) => {
                self.handle = Some(handle);
                self.state = ClassifierState::Ready;
                info!("model loaded and warmed up");
                Ok(())
            }
            Err(e) => {
                let msg = match e {
                    Error::Load(msg) => msg,
                    other => other.to_string(),
                };
                error!("model load failed: {msg}");
                self.failure = Some(msg.clone());
                self.state = ClassifierState::Failed;
                Err(Error::Load(msg))
            }
        }
    }

    async fn open_and_warm_up(&self, path: &Path) -> Result<ModelHandle> {
        let loader = Arc::clone(&self.loader);
        let owned = path.to_path_buf();
        let model = tokio::task::spawn_blocking(move || loader.load(&owned))
            .await
            .map_err(|e| Error::Load(format!("load task failed: {e}")))??;

        let handle = ModelHandle::new(model, Arc::clone(&self.pool));
        let warm = handle
            .classify(&Grid::zeros())
            .await
            .map_err(|e| Error::Load(format!("warm-up inference failed: {e}")))?;
        debug!(outputs = warm.len(), "warm-up output discarded");
        Ok(handle)
    }

    /// Handle for spawning inference; `NotReady` until the load succeeded.
    pub fn handle(&self) -> Result<ModelHandle> {
        match (&self.state, &self.handle) {
            (ClassifierState::Ready, Some(handle)) => Ok(handle.clone()),
            _ => Err(Error::NotReady),
        }
    }

    pub async fn classify(&self, grid: &Grid) -> Result<Vec<f32>> {
        self.handle()?.classify(grid).await
    }
}
