//! # Error Handling
//!
//! Error types shared by the model-state bridge, the operation façade and
//! the dataset generator.
//!
//! ## Overview
//!
//! - **[`MlStateError`]**: every failure of model-state construction, the
//!   named operations, the registry and the dataset reader.
//! - **[`CapabilityError`]**: an error reported by the external model
//!   capability (module load, instantiate, method call, release).
//! - **[`SourceError`]**: the halt signals and write failures exchanged
//!   between the generator and the writer it feeds.
//! - **[`ErrorAction`] / [`ErrorStrategy`]**: how the generator reacts to a
//!   writer error that is not a halt signal, and how the model-state
//!   consumer reacts to a failed write.
//!
//! ## Propagation
//!
//! Errors are returned to the immediate caller. Only three cases are
//! swallowed: post-fit diagnostic extraction, release failures during
//! terminate, and errors a component was configured to skip with
//! [`ErrorStrategy::Skip`].

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T, E = MlStateError> = std::result::Result<T, E>;

/// Error type for model-state, registry, configuration and dataset operations.
#[derive(Error, Debug)]
pub enum MlStateError {
  /// A required parameter is missing or malformed. No state was created.
  #[error("configuration error: {0}")]
  Config(String),

  /// A dataset file could not be opened or read.
  #[error("failed to read {}: {source}", .path.display())]
  Io {
    /// The file that failed.
    path: PathBuf,
    /// The underlying I/O error.
    #[source]
    source: std::io::Error,
  },

  /// A dataset file ended before the declared number of bytes.
  #[error("{} is truncated: expected {expected} bytes, found {actual}", .path.display())]
  Truncated {
    /// The short file.
    path: PathBuf,
    /// Bytes required by the declared sizes (header included).
    expected: u64,
    /// Bytes actually available.
    actual: u64,
  },

  /// The model module or instance could not be resolved.
  #[error("failed to load model: {0}")]
  Load(#[source] CapabilityError),

  /// A method call on the model instance failed.
  #[error("model method '{method}' failed: {source}")]
  Invocation {
    /// Method name passed to the capability.
    method: String,
    /// The capability's error.
    #[source]
    source: CapabilityError,
  },

  /// No state is registered under the name.
  #[error("state '{0}' was not found")]
  NotFound(String),

  /// A state exists under the name but is of a different kind.
  #[error("state '{name}' isn't a {expected}")]
  TypeMismatch {
    /// Registry name.
    name: String,
    /// The kind the caller asked for.
    expected: &'static str,
  },

  /// A state is already registered under the name.
  #[error("state '{0}' is already registered")]
  AlreadyRegistered(String),

  /// The model state was terminated and its handles released.
  #[error("model state has been terminated")]
  Terminated,

  /// A lock guarding shared state was poisoned by a panicking holder.
  #[error("state lock is poisoned")]
  LockPoisoned,

  /// A record could not be converted to a model value.
  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  /// A blocking task running a model call did not complete.
  #[error("model task failed: {0}")]
  Task(String),
}

impl MlStateError {
  pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    Self::Io {
      path: path.into(),
      source,
    }
  }

  pub(crate) fn invocation(method: &str, source: CapabilityError) -> Self {
    Self::Invocation {
      method: method.to_string(),
      source,
    }
  }
}

/// An error reported by the external model capability.
///
/// The capability is opaque, so the error only carries its message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct CapabilityError {
  message: String,
}

impl CapabilityError {
  /// Creates a capability error from any displayable message.
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
    }
  }

  /// The error message.
  pub fn message(&self) -> &str {
    &self.message
  }
}

/// Signals and failures exchanged between a source and its writer.
///
/// `Rewound` and `Stopped` are halt signals: a source that receives one
/// stops emitting and returns it unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
  /// The source was rewound by the engine.
  #[error("the source has been rewound")]
  Rewound,
  /// The source was stopped.
  #[error("the source has been stopped")]
  Stopped,
  /// Writing a single tuple failed.
  #[error("failed to write tuple: {0}")]
  Write(String),
}

impl SourceError {
  /// Returns true for `Rewound` and `Stopped`.
  pub fn is_halt(&self) -> bool {
    matches!(self, SourceError::Rewound | SourceError::Stopped)
  }
}

/// Action to take when a component hits a non-fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
  /// Return the error and stop processing.
  Stop,
  /// Drop the offending item and keep going.
  Skip,
}

type CustomErrorHandler<E> = Arc<dyn Fn(&E) -> ErrorAction + Send + Sync>;

/// Strategy deciding the [`ErrorAction`] for an error of type `E`.
///
/// # Example
///
/// ```rust
/// use mlweave::error::{ErrorAction, ErrorStrategy, SourceError};
///
/// // Give up only on errors mentioning the disk.
/// let strategy = ErrorStrategy::new_custom(|error: &SourceError| match error {
///   SourceError::Write(msg) if msg.contains("disk") => ErrorAction::Stop,
///   _ => ErrorAction::Skip,
/// });
/// assert_eq!(strategy.action(&SourceError::Write("disk full".into())), ErrorAction::Stop);
/// assert_eq!(strategy.action(&SourceError::Write("bad row".into())), ErrorAction::Skip);
/// ```
pub enum ErrorStrategy<E> {
  /// Stop at the first error. This is the default.
  Stop,
  /// Log and skip every error.
  Skip,
  /// Decide per error.
  Custom(CustomErrorHandler<E>),
}

impl<E> ErrorStrategy<E> {
  /// Creates a custom strategy from a handler function.
  pub fn new_custom<F>(f: F) -> Self
  where
    F: Fn(&E) -> ErrorAction + Send + Sync + 'static,
  {
    Self::Custom(Arc::new(f))
  }

  /// Resolves the action for an error.
  pub fn action(&self, error: &E) -> ErrorAction {
    match self {
      ErrorStrategy::Stop => ErrorAction::Stop,
      ErrorStrategy::Skip => ErrorAction::Skip,
      ErrorStrategy::Custom(handler) => handler(error),
    }
  }
}

impl<E> Default for ErrorStrategy<E> {
  fn default() -> Self {
    ErrorStrategy::Stop
  }
}

impl<E> Clone for ErrorStrategy<E> {
  fn clone(&self) -> Self {
    match self {
      ErrorStrategy::Stop => ErrorStrategy::Stop,
      ErrorStrategy::Skip => ErrorStrategy::Skip,
      ErrorStrategy::Custom(handler) => ErrorStrategy::Custom(Arc::clone(handler)),
    }
  }
}

impl<E> fmt::Debug for ErrorStrategy<E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ErrorStrategy::Stop => write!(f, "ErrorStrategy::Stop"),
      ErrorStrategy::Skip => write!(f, "ErrorStrategy::Skip"),
      ErrorStrategy::Custom(_) => write!(f, "ErrorStrategy::Custom"),
    }
  }
}

impl<E> PartialEq for ErrorStrategy<E> {
  fn eq(&self, other: &Self) -> bool {
    matches!(
      (self, other),
      (ErrorStrategy::Stop, ErrorStrategy::Stop)
        | (ErrorStrategy::Skip, ErrorStrategy::Skip)
        | (ErrorStrategy::Custom(_), ErrorStrategy::Custom(_))
    )
  }
}
