//! # mlweave
//!
//! Batched, stateful machine-learning models for stream processing, plus
//! replayable dataset streams to train them with.
//!
//! ## Key Features
//!
//! - **Model State**: a long-lived model behind a mutex that buffers
//!   incoming records and fits the model every time a batch fills up
//! - **Named Operations**: fit, predict, flush and arbitrary method calls
//!   addressed by registry name
//! - **Dataset Streams**: MNIST-style binary files read into memory and
//!   streamed in index or freshly shuffled order, restartable on demand
//! - **Pluggable Models**: any model reachable through the
//!   [`ModelLoader`](ml::ModelLoader) capability, including plain Rust types
//!   registered with a [`FactoryLoader`](ml::FactoryLoader)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mlweave::config::{DatasetSourceCreator, ModelStateCreator};
//! use mlweave::consumers::model_state::ModelStateWriter;
//! use mlweave::ml::FactoryLoader;
//! use mlweave::ops::ModelStateOps;
//! use mlweave::state::InMemoryStateRegistry;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let loader = FactoryLoader::new(); // register model classes here
//! let registry = Arc::new(InMemoryStateRegistry::new());
//!
//! let model_params = json!({
//!   "module_name": "models",
//!   "class_name": "Mlp",
//!   "batch_train_size": 100,
//! });
//! let state = ModelStateCreator::new(Arc::new(loader))
//!   .create_registered(&*registry, "mlp", model_params.as_object().unwrap())?;
//!
//! let source_params = json!({
//!   "images_file_name": "train-images.idx3-ubyte",
//!   "labels_file_name": "train-labels.idx1-ubyte",
//!   "data_size": 60000,
//!   "batch_size": 100,
//! });
//! let mut source = DatasetSourceCreator.create(source_params.as_object().unwrap())?;
//! source.generate_stream(&mut ModelStateWriter::new(state))?;
//!
//! let ops = ModelStateOps::new(registry);
//! let prediction = ops.predict("mlp", json!(vec![0.0; 784]))?;
//! ops.terminate("mlp")?;
//! # let _ = prediction;
//! # Ok(())
//! # }
//! ```

// Documentation enforcement - treat missing docs as errors
#![deny(missing_docs)]

/// Typed configuration and creators built from engine parameters.
pub mod config;
/// Consumer trait for components that drain streams.
pub mod consumer;
/// Built-in consumers.
pub mod consumers;
/// Labeled image datasets and their binary reader.
pub mod dataset;
/// Error types and error handling strategies.
pub mod error;
/// Input trait for components that consume streams.
pub mod input;
/// Message envelope carried by streams.
pub mod message;
/// Stateful model support.
pub mod ml;
/// Model operations addressed by state name.
pub mod ops;
/// Output trait for components that produce streams.
pub mod output;
/// Producer trait and push-based writer interface.
pub mod producer;
/// Built-in producers.
pub mod producers;
/// Named shared states and their registry.
pub mod state;
