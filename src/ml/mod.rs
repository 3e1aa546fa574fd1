//! # Machine Learning Module
//!
//! Stateful model support for stream processing: a [`ModelState`] keeps a
//! long-lived model and a training buffer, feeding accumulated records to
//! the model's `fit` method and answering `predict` calls in between.
//!
//! # Core Types
//!
//! - **[`ModelState`]**: buffered, mutually exclusive access to one model
//! - **[`ModelLoader`] / [`ModelModule`] / [`ModelInstance`]**: the external
//!   model capability
//! - **[`FactoryLoader`]**: in-process loader for Rust models
//! - **[`FitObserver`]**: post-fit diagnostics hook
//!
//! # Quick Start
//!
//! ```rust
//! use mlweave::error::CapabilityError;
//! use mlweave::ml::{FactoryLoader, ModelInstance, ModelState};
//! use serde_json::{Value, json};
//!
//! #[derive(Default)]
//! struct CountingModel {
//!   seen: usize,
//! }
//!
//! impl ModelInstance for CountingModel {
//!   fn call(&mut self, method: &str, arg: Value) -> Result<Value, CapabilityError> {
//!     match method {
//!       "fit" => {
//!         self.seen += arg.as_array().map(Vec::len).unwrap_or(0);
//!         Ok(json!({"loss": 0.0, "accuracy": 0.0}))
//!       }
//!       "predict" => Ok(json!(self.seen)),
//!       other => Err(CapabilityError::new(format!("unknown method {}", other))),
//!     }
//!   }
//! }
//!
//! let mut loader = FactoryLoader::new();
//! loader.register("models", "CountingModel", |_| Ok(Box::new(CountingModel::default())));
//!
//! let state = ModelState::new(&loader, "", "models", "CountingModel", 2, "").unwrap();
//! state.write(json!({"label": 1})).unwrap();
//! state.write(json!({"label": 2})).unwrap();
//! assert_eq!(state.predict(Value::Null).unwrap(), json!(2));
//! state.terminate().unwrap();
//! ```

pub mod capability;
pub mod diagnostics;
pub mod loader;
pub mod model_state;

pub use capability::*;
pub use diagnostics::{FitObserver, IgnoreFitResult, LogFitMetrics};
pub use loader::{FactoryLoader, InstanceFactory};
pub use model_state::ModelState;

#[cfg(test)]
pub(crate) mod testing;
