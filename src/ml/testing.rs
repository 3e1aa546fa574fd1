//! Recording model capability used by unit tests.

use super::capability::{ModelInstance, ModelLoader, ModelModule};
use crate::error::CapabilityError;
use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Event {
  Load(String, String),
  Instantiate(String, Value),
  Call(String, Value),
  ReleaseInstance,
  ReleaseModule,
}

#[derive(Default)]
struct Shared {
  events: Vec<Event>,
  failing: HashSet<String>,
}

/// Loader whose modules and instances record every interaction.
#[derive(Clone)]
pub(crate) struct MockLoader {
  shared: Arc<Mutex<Shared>>,
  fit_result: Value,
  fail_load: bool,
  fail_instantiate: bool,
  fail_release: bool,
}

impl Default for MockLoader {
  fn default() -> Self {
    Self {
      shared: Arc::default(),
      fit_result: json!({"loss": 2.0, "accuracy": 1.0}),
      fail_load: false,
      fail_instantiate: false,
      fail_release: false,
    }
  }
}

impl MockLoader {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_fit_result(mut self, result: Value) -> Self {
    self.fit_result = result;
    self
  }

  pub fn failing_load(mut self) -> Self {
    self.fail_load = true;
    self
  }

  pub fn failing_instantiate(mut self) -> Self {
    self.fail_instantiate = true;
    self
  }

  pub fn failing_release(mut self) -> Self {
    self.fail_release = true;
    self
  }

  /// Makes every later call of `method` fail.
  pub fn fail_method(&self, method: &str) {
    self.shared.lock().unwrap().failing.insert(method.to_string());
  }

  pub fn heal_method(&self, method: &str) {
    self.shared.lock().unwrap().failing.remove(method);
  }

  pub fn events(&self) -> Vec<Event> {
    self.shared.lock().unwrap().events.clone()
  }

  /// Every batch passed to `fit`, in call order.
  pub fn fit_batches(&self) -> Vec<Vec<Value>> {
    self
      .events()
      .into_iter()
      .filter_map(|event| match event {
        Event::Call(method, Value::Array(batch)) if method == "fit" => Some(batch),
        _ => None,
      })
      .collect()
  }

  pub fn calls(&self) -> Vec<(String, Value)> {
    self
      .events()
      .into_iter()
      .filter_map(|event| match event {
        Event::Call(method, arg) => Some((method, arg)),
        _ => None,
      })
      .collect()
  }

  fn record(&self, event: Event) {
    self.shared.lock().unwrap().events.push(event);
  }

  fn release_result(&self) -> Result<(), CapabilityError> {
    if self.fail_release {
      Err(CapabilityError::new("release failed"))
    } else {
      Ok(())
    }
  }
}

impl ModelLoader for MockLoader {
  fn load(
    &self,
    module_path: &str,
    module_name: &str,
  ) -> Result<Box<dyn ModelModule>, CapabilityError> {
    self.record(Event::Load(module_path.to_string(), module_name.to_string()));
    if self.fail_load {
      return Err(CapabilityError::new(format!("No module named '{}'", module_name)));
    }
    Ok(Box::new(MockModule(self.clone())))
  }
}

struct MockModule(MockLoader);

impl ModelModule for MockModule {
  fn instantiate(
    &self,
    class_name: &str,
    config: &Value,
  ) -> Result<Box<dyn ModelInstance>, CapabilityError> {
    self
      .0
      .record(Event::Instantiate(class_name.to_string(), config.clone()));
    if self.0.fail_instantiate {
      return Err(CapabilityError::new("constructor raised"));
    }
    Ok(Box::new(MockInstance(self.0.clone())))
  }

  fn release(&mut self) -> Result<(), CapabilityError> {
    self.0.record(Event::ReleaseModule);
    self.0.release_result()
  }
}

struct MockInstance(MockLoader);

impl ModelInstance for MockInstance {
  fn call(&mut self, method: &str, arg: Value) -> Result<Value, CapabilityError> {
    self.0.record(Event::Call(method.to_string(), arg.clone()));
    if self.0.shared.lock().unwrap().failing.contains(method) {
      return Err(CapabilityError::new(format!("{} raised", method)));
    }
    match method {
      "fit" => Ok(self.0.fit_result.clone()),
      "predict" => Ok(json!({ "prediction": arg })),
      _ => Ok(arg),
    }
  }

  fn release(&mut self) -> Result<(), CapabilityError> {
    self.0.record(Event::ReleaseInstance);
    self.0.release_result()
  }
}
