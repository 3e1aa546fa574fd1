//! Named model operations.
//!
//! [`ModelStateOps`] resolves a [`ModelState`] by registry name and
//! delegates to it. These are the entry points the host engine exposes as
//! functions (fit, predict, flush and a generic method call).
//!
//! ```rust
//! use mlweave::error::CapabilityError;
//! use mlweave::ml::{FactoryLoader, ModelInstance, ModelState};
//! use mlweave::ops::ModelStateOps;
//! use mlweave::state::{InMemoryStateRegistry, StateRegistry};
//! use serde_json::{Value, json};
//! use std::sync::Arc;
//!
//! struct Doubler;
//!
//! impl ModelInstance for Doubler {
//!   fn call(&mut self, _method: &str, arg: Value) -> Result<Value, CapabilityError> {
//!     Ok(json!(arg.as_f64().unwrap_or_default() * 2.0))
//!   }
//! }
//!
//! let mut loader = FactoryLoader::new();
//! loader.register("toy", "Doubler", |_| Ok(Box::new(Doubler)));
//!
//! let registry = Arc::new(InMemoryStateRegistry::new());
//! let state = ModelState::new(&loader, "", "toy", "Doubler", 10, "").unwrap();
//! registry.register("model", Arc::new(state)).unwrap();
//!
//! let ops = ModelStateOps::new(registry);
//! assert_eq!(ops.predict("model", json!(21)).unwrap(), json!(42.0));
//! ops.terminate("model").unwrap();
//! ```

use crate::error::Result;
use crate::ml::ModelState;
use crate::state::{StateRegistry, lookup_as};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

const MODEL_STATE_KIND: &str = "ModelState";

/// Model operations addressed by state name.
#[derive(Clone)]
pub struct ModelStateOps {
  registry: Arc<dyn StateRegistry>,
}

impl ModelStateOps {
  /// Creates the façade over `registry`.
  pub fn new(registry: Arc<dyn StateRegistry>) -> Self {
    Self { registry }
  }

  /// The registry this façade resolves names in.
  pub fn registry(&self) -> &Arc<dyn StateRegistry> {
    &self.registry
  }

  /// Resolves `name` to a model state.
  ///
  /// # Errors
  ///
  /// [`NotFound`](crate::error::MlStateError::NotFound) when the name is not
  /// registered, [`TypeMismatch`](crate::error::MlStateError::TypeMismatch)
  /// when it is registered to another kind of state.
  pub fn lookup(&self, name: &str) -> Result<Arc<ModelState>> {
    lookup_as::<ModelState>(self.registry.as_ref(), name, MODEL_STATE_KIND)
  }

  /// Fits the named model on `batch`, leaving its buffer alone.
  pub fn fit(&self, name: &str, batch: Vec<Value>) -> Result<Value> {
    self.lookup(name)?.fit(batch)
  }

  /// Runs inference on the named model.
  pub fn predict(&self, name: &str, input: Value) -> Result<Value> {
    self.lookup(name)?.predict(input)
  }

  /// Fits the named model on its buffered records.
  ///
  /// Returns the fit result, or `Value::Null` when the buffer was empty.
  pub fn flush(&self, name: &str) -> Result<Value> {
    Ok(self.lookup(name)?.flush()?.unwrap_or(Value::Null))
  }

  /// Calls `method` on the named model with `arg`, verbatim.
  pub fn call(&self, name: &str, method: &str, arg: Value) -> Result<Value> {
    self.lookup(name)?.call(method, arg)
  }

  /// Unregisters the named model and releases its handles.
  pub fn terminate(&self, name: &str) -> Result<()> {
    let state = self.lookup(name)?;
    self.registry.remove(name)?;
    debug!(name, "terminating model state");
    state.terminate()
  }
}

impl std::fmt::Debug for ModelStateOps {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ModelStateOps").finish_non_exhaustive()
  }
}
