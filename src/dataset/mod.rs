//! In-memory labeled image datasets.
//!
//! A [`Dataset`] holds the labels and normalized pixel vectors read from a
//! pair of MNIST-style binary files (see [`reader`]). Records are addressed
//! by index and exposed as [`Example`] values, which serialize to
//! `{"label": <int>, "data": [<float>, ...]}`.
//!
//! # Example
//!
//! ```rust,no_run
//! use mlweave::dataset::Dataset;
//!
//! let dataset = Dataset::open("train-images.idx3-ubyte", "train-labels.idx1-ubyte", 60_000, 784)?;
//! let first = dataset.example(0).expect("non-empty dataset");
//! assert_eq!(first.data.len(), 784);
//! # Ok::<(), mlweave::error::MlStateError>(())
//! ```

pub mod reader;

pub use reader::read_dataset;

use crate::error::{MlStateError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// One labeled image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
  /// Class label.
  pub label: i32,
  /// Pixel intensities in `[0, 1]`.
  pub data: Vec<f32>,
}

impl Example {
  /// JSON form handed to models: `{"label": .., "data": [..]}`.
  pub fn to_value(&self) -> Value {
    // Two plain fields; serialization cannot fail.
    serde_json::to_value(self).unwrap_or(Value::Null)
  }
}

/// Labels and images loaded from disk. Immutable after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
  labels: Vec<u8>,
  images: Vec<Vec<f32>>,
  element_size: usize,
}

impl Dataset {
  /// Reads a dataset of `data_size` records from the given files.
  ///
  /// # Errors
  ///
  /// See [`read_dataset`].
  pub fn open(
    images_path: impl AsRef<Path>,
    labels_path: impl AsRef<Path>,
    data_size: usize,
    element_size: usize,
  ) -> Result<Self> {
    let (labels, images) = read_dataset(images_path, labels_path, data_size, element_size)?;
    Ok(Self {
      labels,
      images,
      element_size,
    })
  }

  /// Builds a dataset from already-decoded parts.
  ///
  /// # Errors
  ///
  /// [`MlStateError::Config`] when the label and image counts differ or
  /// when an image is not `element_size` pixels long.
  pub fn from_parts(labels: Vec<u8>, images: Vec<Vec<f32>>, element_size: usize) -> Result<Self> {
    if labels.len() != images.len() {
      return Err(MlStateError::Config(format!(
        "{} labels for {} images",
        labels.len(),
        images.len()
      )));
    }
    if let Some((idx, image)) = images
      .iter()
      .enumerate()
      .find(|(_, image)| image.len() != element_size)
    {
      return Err(MlStateError::Config(format!(
        "image {} has {} elements, expected {}",
        idx,
        image.len(),
        element_size
      )));
    }
    Ok(Self {
      labels,
      images,
      element_size,
    })
  }

  /// Number of records.
  pub fn len(&self) -> usize {
    self.labels.len()
  }

  /// Whether the dataset has no records.
  pub fn is_empty(&self) -> bool {
    self.labels.is_empty()
  }

  /// Pixels per image.
  pub fn element_size(&self) -> usize {
    self.element_size
  }

  /// The record at `idx`, or `None` if out of range.
  pub fn example(&self, idx: usize) -> Option<Example> {
    let label = *self.labels.get(idx)?;
    let data = self.images.get(idx)?.clone();
    Some(Example {
      label: i32::from(label),
      data,
    })
  }

  /// All labels, in file order.
  pub fn labels(&self) -> &[u8] {
    &self.labels
  }

  /// All images, in file order.
  pub fn images(&self) -> &[Vec<f32>] {
    &self.images
  }
}
