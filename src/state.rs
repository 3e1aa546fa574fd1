//! Named shared states and the registry that owns them.
//!
//! The host engine keeps long-lived states under user-chosen names. A state
//! does not know its own name; the registry does. Lookups hand out
//! `Arc` clones, so callers never own a state, and removal plus
//! [`SharedState::terminate`] is the only way a state's resources go away.
//!
//! The registry is a trait so the operation façade can be built over any
//! implementation, including test doubles. [`InMemoryStateRegistry`] is the
//! process-local default.

use crate::error::{MlStateError, Result};
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// A long-lived state kept in a [`StateRegistry`].
pub trait SharedState: Send + Sync + 'static {
  /// Short name of the concrete kind, used in error messages.
  fn kind(&self) -> &'static str;

  /// Releases every resource held by the state.
  fn terminate(&self) -> Result<()>;

  /// Upcasts for downcasting to the concrete kind.
  fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// Name-keyed storage of shared states.
pub trait StateRegistry: Send + Sync {
  /// Adds `state` under `name`.
  ///
  /// # Errors
  ///
  /// [`MlStateError::AlreadyRegistered`] if the name is taken.
  fn register(&self, name: &str, state: Arc<dyn SharedState>) -> Result<()>;

  /// Returns the state registered under `name`.
  ///
  /// # Errors
  ///
  /// [`MlStateError::NotFound`] if nothing is registered under the name.
  fn lookup(&self, name: &str) -> Result<Arc<dyn SharedState>>;

  /// Removes and returns the state registered under `name`. The state is
  /// not terminated.
  fn remove(&self, name: &str) -> Result<Arc<dyn SharedState>>;
}

/// Looks up `name` and downcasts it to `T`.
///
/// # Errors
///
/// [`MlStateError::NotFound`] when absent and [`MlStateError::TypeMismatch`]
/// when the registered state is not a `T`.
pub fn lookup_as<T>(registry: &dyn StateRegistry, name: &str, expected: &'static str) -> Result<Arc<T>>
where
  T: SharedState,
{
  registry
    .lookup(name)?
    .into_any()
    .downcast::<T>()
    .map_err(|_| MlStateError::TypeMismatch {
      name: name.to_string(),
      expected,
    })
}

/// Process-local [`StateRegistry`] backed by a `RwLock<HashMap>`.
#[derive(Default)]
pub struct InMemoryStateRegistry {
  states: RwLock<HashMap<String, Arc<dyn SharedState>>>,
}

impl InMemoryStateRegistry {
  /// Creates an empty registry.
  pub fn new() -> Self {
    Self::default()
  }

  /// Registered names, in no particular order.
  pub fn names(&self) -> Result<Vec<String>> {
    let states = self.states.read().map_err(|_| MlStateError::LockPoisoned)?;
    Ok(states.keys().cloned().collect())
  }

  /// Removes and terminates every state.
  ///
  /// Every removed state is terminated even when an earlier one fails.
  ///
  /// # Errors
  ///
  /// The first termination error, returned after the loop completes.
  pub fn terminate_all(&self) -> Result<()> {
    let drained: Vec<(String, Arc<dyn SharedState>)> = {
      let mut states = self.states.write().map_err(|_| MlStateError::LockPoisoned)?;
      states.drain().collect()
    };
    let mut first_error = None;
    for (name, state) in drained {
      debug!(name = %name, kind = state.kind(), "terminating shared state");
      if let Err(e) = state.terminate() {
        warn!(name = %name, error = %e, "failed to terminate shared state");
        first_error.get_or_insert(e);
      }
    }
    first_error.map_or(Ok(()), Err)
  }
}

impl StateRegistry for InMemoryStateRegistry {
  fn register(&self, name: &str, state: Arc<dyn SharedState>) -> Result<()> {
    let mut states = self.states.write().map_err(|_| MlStateError::LockPoisoned)?;
    if states.contains_key(name) {
      return Err(MlStateError::AlreadyRegistered(name.to_string()));
    }
    debug!(name, kind = state.kind(), "registering shared state");
    states.insert(name.to_string(), state);
    Ok(())
  }

  fn lookup(&self, name: &str) -> Result<Arc<dyn SharedState>> {
    let states = self.states.read().map_err(|_| MlStateError::LockPoisoned)?;
    states
      .get(name)
      .cloned()
      .ok_or_else(|| MlStateError::NotFound(name.to_string()))
  }

  fn remove(&self, name: &str) -> Result<Arc<dyn SharedState>> {
    let mut states = self.states.write().map_err(|_| MlStateError::LockPoisoned)?;
    states
      .remove(name)
      .ok_or_else(|| MlStateError::NotFound(name.to_string()))
  }
}
