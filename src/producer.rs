//! Producer trait for components that generate data streams.
//!
//! Producers are the starting point of a pipeline. Calling
//! [`Producer::produce`] returns a fresh, lazy stream each time, so a
//! producer backed by replayable data can be rewound simply by producing
//! again.
//!
//! Push-based sources instead drive a [`TupleWriter`] and stop when the
//! writer answers with a halt signal.

use crate::error::SourceError;
use crate::message::Message;
use crate::output::Output;

/// Configuration shared by producers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProducerConfig {
  /// Optional name for identifying this producer in logs.
  pub name: Option<String>,
}

impl ProducerConfig {
  /// Sets the name for this producer configuration.
  #[must_use]
  pub fn with_name(mut self, name: String) -> Self {
    self.name = Some(name);
    self
  }

  /// Returns the current name, if set.
  pub fn name(&self) -> Option<String> {
    self.name.clone()
  }
}

/// Trait for components that produce data streams.
pub trait Producer: Output {
  /// Produces a new stream of items.
  fn produce(&mut self) -> Self::OutputStream;

  /// Returns a reference to the producer's configuration.
  fn config(&self) -> &ProducerConfig {
    self.get_config_impl()
  }

  /// Sets the name for this producer.
  #[must_use]
  fn with_name(mut self, name: String) -> Self
  where
    Self: Sized,
  {
    self.get_config_mut_impl().name = Some(name);
    self
  }

  /// Name used in logs, falling back to `default_name`.
  fn component_name(&self, default_name: &str) -> String {
    self
      .config()
      .name()
      .unwrap_or_else(|| default_name.to_string())
  }

  /// Returns a reference to the stored configuration.
  fn get_config_impl(&self) -> &ProducerConfig;

  /// Returns a mutable reference to the stored configuration.
  fn get_config_mut_impl(&mut self) -> &mut ProducerConfig;
}

/// Receiver of tuples from a push-based source.
///
/// Returning [`SourceError::Rewound`] or [`SourceError::Stopped`] halts the
/// source; any other error is handled by the source's error strategy.
pub trait TupleWriter<T> {
  /// Accepts one tuple.
  fn write(&mut self, message: Message<T>) -> Result<(), SourceError>;
}

impl<T, F> TupleWriter<T> for F
where
  F: FnMut(Message<T>) -> Result<(), SourceError>,
{
  fn write(&mut self, message: Message<T>) -> Result<(), SourceError> {
    self(message)
  }
}
