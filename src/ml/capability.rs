//! # External Model Capability
//!
//! Traits describing the opaque model implementation a
//! [`ModelState`](crate::ml::ModelState) drives.
//!
//! The capability follows a load / instantiate / call / release protocol:
//!
//! 1. a [`ModelLoader`] resolves a module by path and name,
//! 2. the [`ModelModule`] instantiates a class with a configuration value,
//! 3. the [`ModelInstance`] answers method calls that take a single
//!    [`Value`] argument and return a [`Value`],
//! 4. the instance and then the module are released explicitly.
//!
//! Nothing here assumes how the model is reached: an in-process Rust model
//! ([`FactoryLoader`](crate::ml::FactoryLoader)), an embedded interpreter or
//! a remote process all fit behind these traits.
//!
//! Release is never implicit. Dropping a handle without calling `release`
//! only frees the Rust value; any resource the capability holds outside the
//! process is the capability's concern.

use crate::error::CapabilityError;
use serde_json::Value;

/// Method name used to train the model on a batch.
pub const FIT_METHOD: &str = "fit";
/// Method name used to run inference on a single input.
pub const PREDICT_METHOD: &str = "predict";

/// Resolves model modules.
pub trait ModelLoader: Send + Sync {
  /// Loads the module `module_name`, searching `module_path` first.
  ///
  /// # Errors
  ///
  /// Returns a [`CapabilityError`] when the module cannot be resolved.
  fn load(&self, module_path: &str, module_name: &str)
  -> Result<Box<dyn ModelModule>, CapabilityError>;
}

/// A loaded model module that can create instances of its classes.
pub trait ModelModule: Send {
  /// Creates an instance of `class_name`, passing `config` to its constructor.
  ///
  /// # Errors
  ///
  /// Returns a [`CapabilityError`] when the class is unknown or its
  /// constructor fails.
  fn instantiate(
    &self,
    class_name: &str,
    config: &Value,
  ) -> Result<Box<dyn ModelInstance>, CapabilityError>;

  /// Releases the module handle.
  fn release(&mut self) -> Result<(), CapabilityError> {
    Ok(())
  }
}

/// A live model object.
pub trait ModelInstance: Send {
  /// Invokes `method` with a single argument.
  fn call(&mut self, method: &str, arg: Value) -> Result<Value, CapabilityError>;

  /// Releases the instance handle.
  fn release(&mut self) -> Result<(), CapabilityError> {
    Ok(())
  }
}
