//! In-process model loader backed by registered class factories.
//!
//! [`FactoryLoader`] lets native Rust models sit behind the
//! [`ModelLoader`] protocol: each module name maps to a set of classes, and
//! each class is a factory closure that receives the instance configuration.
//!
//! ```rust
//! use mlweave::error::CapabilityError;
//! use mlweave::ml::{FactoryLoader, ModelInstance, ModelLoader};
//! use serde_json::{Value, json};
//!
//! struct Echo;
//!
//! impl ModelInstance for Echo {
//!   fn call(&mut self, _method: &str, arg: Value) -> Result<Value, CapabilityError> {
//!     Ok(arg)
//!   }
//! }
//!
//! let mut loader = FactoryLoader::new();
//! loader.register("toy", "Echo", |_config| Ok(Box::new(Echo)));
//!
//! let module = loader.load("", "toy").unwrap();
//! let mut instance = module.instantiate("Echo", &Value::Null).unwrap();
//! assert_eq!(instance.call("predict", json!(3)).unwrap(), json!(3));
//! ```

use super::capability::{ModelInstance, ModelLoader, ModelModule};
use crate::error::CapabilityError;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

/// Factory creating a model instance from its configuration value.
pub type InstanceFactory =
  Arc<dyn Fn(&Value) -> Result<Box<dyn ModelInstance>, CapabilityError> + Send + Sync>;

type ClassTable = HashMap<String, InstanceFactory>;

/// A [`ModelLoader`] resolving modules from an in-memory table of factories.
#[derive(Default, Clone)]
pub struct FactoryLoader {
  modules: HashMap<String, Arc<ClassTable>>,
}

impl FactoryLoader {
  /// Creates an empty loader.
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers `class_name` inside `module_name`, replacing any previous
  /// factory for the same class.
  pub fn register<F>(&mut self, module_name: &str, class_name: &str, factory: F) -> &mut Self
  where
    F: Fn(&Value) -> Result<Box<dyn ModelInstance>, CapabilityError> + Send + Sync + 'static,
  {
    let classes = self.modules.entry(module_name.to_string()).or_default();
    Arc::make_mut(classes).insert(class_name.to_string(), Arc::new(factory));
    self
  }

  /// Returns true when a module with this name is registered.
  pub fn has_module(&self, module_name: &str) -> bool {
    self.modules.contains_key(module_name)
  }
}

impl ModelLoader for FactoryLoader {
  fn load(
    &self,
    module_path: &str,
    module_name: &str,
  ) -> Result<Box<dyn ModelModule>, CapabilityError> {
    trace!(module_path, module_name, "resolving model module");
    let classes = self
      .modules
      .get(module_name)
      .ok_or_else(|| CapabilityError::new(format!("no module named '{}'", module_name)))?;
    Ok(Box::new(FactoryModule {
      name: module_name.to_string(),
      classes: Arc::clone(classes),
    }))
  }
}

struct FactoryModule {
  name: String,
  classes: Arc<ClassTable>,
}

impl ModelModule for FactoryModule {
  fn instantiate(
    &self,
    class_name: &str,
    config: &Value,
  ) -> Result<Box<dyn ModelInstance>, CapabilityError> {
    let factory = self.classes.get(class_name).ok_or_else(|| {
      CapabilityError::new(format!(
        "module '{}' has no attribute '{}'",
        self.name, class_name
      ))
    })?;
    factory(config)
  }
}
