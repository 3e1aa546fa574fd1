//! Typed configuration for the components built from engine parameters.
//!
//! The host engine hands creators a flat parameter map (the `WITH` clause
//! of a create statement). Each config type deserializes that map with
//! serde, filling in defaults for optional keys. A missing or ill-typed key
//! is a [`MlStateError::Config`] and nothing gets created.
//!
//! ```rust
//! use mlweave::config::DatasetSourceConfig;
//! use serde_json::json;
//!
//! let params = json!({
//!   "images_file_name": "train-images.idx3-ubyte",
//!   "labels_file_name": "train-labels.idx1-ubyte",
//!   "data_size": 60000,
//!   "batch_size": 100,
//! });
//! let config = DatasetSourceConfig::from_params(params.as_object().unwrap()).unwrap();
//! assert_eq!(config.image_element_size, 784);
//! assert!(config.random);
//! ```

use crate::dataset::Dataset;
use crate::error::{MlStateError, Result};
use crate::ml::{ModelLoader, ModelState};
use crate::producers::dataset::DatasetProducer;
use crate::state::StateRegistry;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Pixels in a 28x28 MNIST image.
pub const DEFAULT_IMAGE_ELEMENT_SIZE: usize = 784;

fn from_map<T: DeserializeOwned>(params: &Map<String, Value>) -> Result<T> {
  serde_json::from_value(Value::Object(params.clone()))
    .map_err(|e| MlStateError::Config(e.to_string()))
}

fn require_positive(key: &str, value: usize) -> Result<()> {
  if value == 0 {
    return Err(MlStateError::Config(format!(
      "{} must be greater than zero",
      key
    )));
  }
  Ok(())
}

fn default_true() -> bool {
  true
}

fn default_image_element_size() -> usize {
  DEFAULT_IMAGE_ELEMENT_SIZE
}

/// Parameters of a model state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelStateConfig {
  /// Directory searched for the model module. Empty means the loader's
  /// default search path.
  #[serde(default)]
  pub module_path: String,
  /// Module that defines the model class.
  pub module_name: String,
  /// Model class to instantiate.
  pub class_name: String,
  /// Buffered records that trigger a fit.
  pub batch_train_size: usize,
  /// Model configuration file handed to the class constructor.
  #[serde(default)]
  pub model_file_path: String,
}

impl ModelStateConfig {
  /// Parses and validates a parameter map.
  ///
  /// # Errors
  ///
  /// [`MlStateError::Config`] if a required key is missing, a value has the
  /// wrong type, an unknown key is present, or `batch_train_size` is zero.
  pub fn from_params(params: &Map<String, Value>) -> Result<Self> {
    let config: Self = from_map(params)?;
    require_positive("batch_train_size", config.batch_train_size)?;
    Ok(config)
  }
}

/// Parameters of a dataset source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetSourceConfig {
  /// Image file path.
  pub images_file_name: PathBuf,
  /// Label file path.
  pub labels_file_name: PathBuf,
  /// Number of records in both files.
  pub data_size: usize,
  /// Pixels per image.
  #[serde(default = "default_image_element_size")]
  pub image_element_size: usize,
  /// Records per batch.
  pub batch_size: usize,
  /// Whether every run shuffles the records.
  #[serde(default = "default_true")]
  pub random: bool,
}

impl DatasetSourceConfig {
  /// Parses and validates a parameter map.
  ///
  /// # Errors
  ///
  /// [`MlStateError::Config`] if a required key is missing, a value has the
  /// wrong type, an unknown key is present, or `batch_size` or
  /// `image_element_size` is zero.
  pub fn from_params(params: &Map<String, Value>) -> Result<Self> {
    let config: Self = from_map(params)?;
    require_positive("batch_size", config.batch_size)?;
    require_positive("image_element_size", config.image_element_size)?;
    Ok(config)
  }
}

/// Builds model states from parameter maps.
#[derive(Clone)]
pub struct ModelStateCreator {
  loader: Arc<dyn ModelLoader>,
}

impl ModelStateCreator {
  /// Creates model states through `loader`.
  pub fn new(loader: Arc<dyn ModelLoader>) -> Self {
    Self { loader }
  }

  /// Loads the configured model.
  ///
  /// # Errors
  ///
  /// [`MlStateError::Config`] for a malformed map, otherwise whatever
  /// [`ModelState::new`] returns.
  pub fn create(&self, params: &Map<String, Value>) -> Result<ModelState> {
    let config = ModelStateConfig::from_params(params)?;
    self.create_from_config(&config)
  }

  /// Loads the model described by `config`.
  pub fn create_from_config(&self, config: &ModelStateConfig) -> Result<ModelState> {
    ModelState::new(
      self.loader.as_ref(),
      &config.module_path,
      &config.module_name,
      &config.class_name,
      config.batch_train_size,
      &config.model_file_path,
    )
  }

  /// Loads the configured model and registers it under `name`.
  ///
  /// If registration fails the freshly loaded model is terminated before
  /// the error is returned.
  pub fn create_registered(
    &self,
    registry: &dyn StateRegistry,
    name: &str,
    params: &Map<String, Value>,
  ) -> Result<Arc<ModelState>> {
    let state = Arc::new(self.create(params)?);
    if let Err(error) = registry.register(name, Arc::clone(&state) as _) {
      state.terminate()?;
      return Err(error);
    }
    info!(name, "model state created");
    Ok(state)
  }
}

impl std::fmt::Debug for ModelStateCreator {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ModelStateCreator").finish_non_exhaustive()
  }
}

/// Builds dataset producers from parameter maps.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatasetSourceCreator;

impl DatasetSourceCreator {
  /// Reads the configured dataset and wraps it in a producer.
  ///
  /// # Errors
  ///
  /// [`MlStateError::Config`] for a malformed map, and the reader's I/O or
  /// truncation errors.
  pub fn create(&self, params: &Map<String, Value>) -> Result<DatasetProducer> {
    let config = DatasetSourceConfig::from_params(params)?;
    self.create_from_config(&config)
  }

  /// Reads the dataset described by `config` and wraps it in a producer.
  pub fn create_from_config(&self, config: &DatasetSourceConfig) -> Result<DatasetProducer> {
    let dataset = Dataset::open(
      &config.images_file_name,
      &config.labels_file_name,
      config.data_size,
      config.image_element_size,
    )?;
    info!(
      images = %config.images_file_name.display(),
      records = dataset.len(),
      random = config.random,
      "dataset source created"
    );
    DatasetProducer::new(Arc::new(dataset), config.batch_size, config.random)
  }
}
