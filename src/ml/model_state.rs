//! # Model State
//!
//! [`ModelState`] bridges a record stream to a trainable model. It owns one
//! model module and one model instance, and buffers written records until
//! the batch threshold is reached, at which point the whole buffer is handed
//! to the model's `fit` method.
//!
//! ## Consistency
//!
//! A single mutex guards the buffer and the model handles. `write`, `flush`,
//! `fit`, `predict` and `call` all run under it, so at most one operation
//! reaches the model at a time and the buffer is never appended to while it
//! is being drained. Every operation blocks until the model returns; there
//! is no timeout around the external call.
//!
//! ## Fit failures
//!
//! The buffer is drained before `fit` is invoked. If the model rejects the
//! batch the error is returned to the writer and the batch is gone: records
//! are never retried.
//!
//! ## Lifecycle
//!
//! Handles are released only by [`ModelState::terminate`], instance first,
//! then module. After terminate every operation returns
//! [`MlStateError::Terminated`]; a second terminate is a no-op. Dropping a
//! state that was not terminated logs a warning and leaves release to the
//! capability.

use super::capability::{FIT_METHOD, ModelInstance, ModelLoader, ModelModule, PREDICT_METHOD};
use super::diagnostics::{FitObserver, LogFitMetrics};
use crate::error::{MlStateError, Result};
use crate::state::SharedState;
use scopeguard::ScopeGuard;
use serde_json::Value;
use std::any::Any;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace, warn};

struct Loaded {
  module: Box<dyn ModelModule>,
  instance: Box<dyn ModelInstance>,
  buffer: Vec<Value>,
}

impl Loaded {
  fn call(&mut self, method: &str, arg: Value) -> Result<Value> {
    self
      .instance
      .call(method, arg)
      .map_err(|e| MlStateError::invocation(method, e))
  }
}

/// A named, mutable model with a training buffer.
pub struct ModelState {
  batch_threshold: usize,
  inner: Mutex<Option<Loaded>>,
  observer: Arc<dyn FitObserver>,
}

impl ModelState {
  /// Loads the model and returns a state with an empty buffer.
  ///
  /// # Arguments
  ///
  /// * `loader` - Resolves the model module.
  /// * `module_path` - Location searched for the module.
  /// * `module_name` - Module to load.
  /// * `class_name` - Class instantiated inside the module.
  /// * `batch_threshold` - Number of buffered records that triggers a fit.
  /// * `model_path` - Passed to the class constructor, typically a model or
  ///   configuration file.
  ///
  /// # Errors
  ///
  /// [`MlStateError::Config`] when `batch_threshold` is zero, and
  /// [`MlStateError::Load`] when the module or the instance cannot be
  /// created. If instantiation fails the module is released before
  /// returning.
  pub fn new(
    loader: &dyn ModelLoader,
    module_path: &str,
    module_name: &str,
    class_name: &str,
    batch_threshold: usize,
    model_path: &str,
  ) -> Result<Self> {
    if batch_threshold == 0 {
      return Err(MlStateError::Config(
        "batch threshold must be greater than zero".to_string(),
      ));
    }

    let module = loader
      .load(module_path, module_name)
      .map_err(MlStateError::Load)?;
    let module = scopeguard::guard(module, |mut module| {
      if let Err(e) = module.release() {
        warn!(module_name, error = %e, "failed to release model module");
      }
    });

    let instance = module
      .instantiate(class_name, &Value::String(model_path.to_string()))
      .map_err(MlStateError::Load)?;
    let module = ScopeGuard::into_inner(module);

    debug!(module_name, class_name, batch_threshold, "model state created");
    Ok(Self {
      batch_threshold,
      inner: Mutex::new(Some(Loaded {
        module,
        instance,
        buffer: Vec::with_capacity(batch_threshold),
      })),
      observer: Arc::new(LogFitMetrics),
    })
  }

  /// Replaces the hook that receives successful fit results.
  #[must_use]
  pub fn with_observer(mut self, observer: Arc<dyn FitObserver>) -> Self {
    self.observer = observer;
    self
  }

  /// The number of buffered records that triggers a fit.
  pub fn batch_threshold(&self) -> usize {
    self.batch_threshold
  }

  /// Number of records currently buffered.
  pub fn buffered_len(&self) -> Result<usize> {
    let guard = self.lock()?;
    Ok(Self::loaded(&guard)?.buffer.len())
  }

  /// Returns true once [`terminate`](Self::terminate) has run.
  pub fn is_terminated(&self) -> bool {
    self
      .inner
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .is_none()
  }

  /// Buffers `record`, fitting the model once the threshold is reached.
  ///
  /// The buffer is empty when this returns, whether or not the fit
  /// succeeded.
  ///
  /// # Errors
  ///
  /// Returns the fit error, if any. The batch that failed is discarded.
  pub fn write(&self, record: Value) -> Result<()> {
    let mut guard = self.lock()?;
    let loaded = Self::loaded_mut(&mut guard)?;

    loaded.buffer.push(record);
    if loaded.buffer.len() < self.batch_threshold {
      return Ok(());
    }

    let batch: Vec<Value> = loaded.buffer.drain(..).collect();
    self.fit_and_observe(loaded, batch)?;
    Ok(())
  }

  /// Fits the buffered records now, below the threshold.
  ///
  /// Returns `None` without calling the model when the buffer is empty.
  /// Fit failures discard the batch exactly as in [`write`](Self::write).
  pub fn flush(&self) -> Result<Option<Value>> {
    let mut guard = self.lock()?;
    let loaded = Self::loaded_mut(&mut guard)?;

    if loaded.buffer.is_empty() {
      trace!("flush with empty buffer");
      return Ok(None);
    }

    let batch: Vec<Value> = loaded.buffer.drain(..).collect();
    self.fit_and_observe(loaded, batch).map(Some)
  }

  /// Calls the model's `fit` with `batch`, bypassing the buffer.
  pub fn fit(&self, batch: Vec<Value>) -> Result<Value> {
    let mut guard = self.lock()?;
    Self::loaded_mut(&mut guard)?.call(FIT_METHOD, Value::Array(batch))
  }

  /// Calls the model's `predict` with `input`. The buffer is not touched.
  pub fn predict(&self, input: Value) -> Result<Value> {
    let mut guard = self.lock()?;
    Self::loaded_mut(&mut guard)?.call(PREDICT_METHOD, input)
  }

  /// Calls an arbitrary model method. The name is not validated.
  pub fn call(&self, method: &str, arg: Value) -> Result<Value> {
    let mut guard = self.lock()?;
    Self::loaded_mut(&mut guard)?.call(method, arg)
  }

  /// Releases the model instance, then the module.
  ///
  /// Release failures are logged and not returned. Buffered records that
  /// were never fitted are discarded.
  pub fn terminate(&self) -> Result<()> {
    let taken = self
      .inner
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .take();

    let Some(mut loaded) = taken else {
      return Ok(());
    };

    if !loaded.buffer.is_empty() {
      debug!(
        discarded = loaded.buffer.len(),
        "terminating with unfitted records"
      );
    }
    if let Err(e) = loaded.instance.release() {
      warn!(error = %e, "failed to release model instance");
    }
    if let Err(e) = loaded.module.release() {
      warn!(error = %e, "failed to release model module");
    }
    Ok(())
  }

  fn fit_and_observe(&self, loaded: &mut Loaded, batch: Vec<Value>) -> Result<Value> {
    let size = batch.len();
    match loaded.call(FIT_METHOD, Value::Array(batch)) {
      Ok(result) => {
        self.observer.observe(&result, self.batch_threshold);
        Ok(result)
      }
      Err(e) => {
        warn!(discarded = size, error = %e, "fit failed, batch dropped");
        Err(e)
      }
    }
  }

  fn lock(&self) -> Result<MutexGuard<'_, Option<Loaded>>> {
    self.inner.lock().map_err(|_| MlStateError::LockPoisoned)
  }

  fn loaded<'a>(guard: &'a MutexGuard<'_, Option<Loaded>>) -> Result<&'a Loaded> {
    guard.as_ref().ok_or(MlStateError::Terminated)
  }

  fn loaded_mut<'a>(guard: &'a mut MutexGuard<'_, Option<Loaded>>) -> Result<&'a mut Loaded> {
    guard.as_mut().ok_or(MlStateError::Terminated)
  }
}

impl std::fmt::Debug for ModelState {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ModelState")
      .field("batch_threshold", &self.batch_threshold)
      .field("terminated", &self.is_terminated())
      .finish()
  }
}

impl Drop for ModelState {
  fn drop(&mut self) {
    let live = match self.inner.get_mut() {
      Ok(inner) => inner.is_some(),
      Err(poisoned) => poisoned.into_inner().is_some(),
    };
    if live {
      warn!("model state dropped without terminate, handles were not released");
    }
  }
}

impl SharedState for ModelState {
  fn kind(&self) -> &'static str {
    "ModelState"
  }

  fn terminate(&self) -> Result<()> {
    ModelState::terminate(self)
  }

  fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
    self
  }
}
