//! # Consumer Trait
//!
//! Consumers are the end point of a pipeline: they drain a stream of
//! [`Message`](crate::message::Message)s into some destination.
//!
//! ## Overview
//!
//! - **Stream Consumption**: async consumption of input streams
//! - **Error Handling**: a per-consumer [`ErrorStrategy`] decides whether a
//!   failed item stops consumption or is skipped
//! - **Configuration**: [`ConsumerConfig`] for naming and error strategy
//!
//! See [`ModelStateConsumer`](crate::consumers::model_state::ModelStateConsumer)
//! for the consumer that trains a model state from a stream.

use crate::error::{ErrorStrategy, MlStateError, Result};
use crate::input::Input;
use async_trait::async_trait;

/// Configuration for a consumer component.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsumerConfig {
  /// The error handling strategy applied to each failed item.
  pub error_strategy: ErrorStrategy<MlStateError>,
  /// The name of this consumer component.
  pub name: String,
}

impl ConsumerConfig {
  /// Sets the error handling strategy for this consumer configuration.
  ///
  /// # Arguments
  ///
  /// * `strategy` - The error handling strategy to use.
  #[must_use]
  pub fn with_error_strategy(mut self, strategy: ErrorStrategy<MlStateError>) -> Self {
    self.error_strategy = strategy;
    self
  }

  /// Sets the name for this consumer configuration.
  #[must_use]
  pub fn with_name(mut self, name: String) -> Self {
    self.name = name;
    self
  }

  /// Returns the current error handling strategy.
  pub fn error_strategy(&self) -> ErrorStrategy<MlStateError> {
    self.error_strategy.clone()
  }

  /// Returns the current name.
  pub fn name(&self) -> &str {
    &self.name
  }
}

/// Trait for components that consume data streams.
#[async_trait]
pub trait Consumer: Input {
  /// Drains `stream`.
  ///
  /// # Errors
  ///
  /// The first item error the error strategy decides to stop on.
  async fn consume(&mut self, stream: Self::InputStream) -> Result<()>;

  /// Returns a reference to the consumer's configuration.
  fn config(&self) -> &ConsumerConfig {
    self.get_config_impl()
  }

  /// Sets the error strategy for this consumer.
  #[must_use]
  fn with_error_strategy(mut self, strategy: ErrorStrategy<MlStateError>) -> Self
  where
    Self: Sized,
  {
    self.get_config_mut_impl().error_strategy = strategy;
    self
  }

  /// Sets the name for this consumer.
  #[must_use]
  fn with_name(mut self, name: String) -> Self
  where
    Self: Sized,
  {
    self.get_config_mut_impl().name = name;
    self
  }

  /// Name used in logs, falling back to `default_name` when unset.
  fn component_name(&self, default_name: &str) -> String {
    match self.config().name() {
      "" => default_name.to_string(),
      name => name.to_string(),
    }
  }

  /// Returns a reference to the stored configuration.
  fn get_config_impl(&self) -> &ConsumerConfig;

  /// Returns a mutable reference to the stored configuration.
  fn get_config_mut_impl(&mut self) -> &mut ConsumerConfig;
}
