//! Input trait for components that consume input streams.
//!
//! # Example
//!
//! ```rust
//! use mlweave::input::Input;
//! use mlweave::message::Message;
//! use futures::Stream;
//! use std::pin::Pin;
//!
//! struct MySink;
//!
//! impl Input for MySink {
//!   type Input = Message<i32>;
//!   type InputStream = Pin<Box<dyn Stream<Item = Message<i32>> + Send>>;
//! }
//! ```

use futures::Stream;

/// Components consuming a stream of `Self::Input`.
pub trait Input {
  /// Item type of the stream.
  type Input: Send + 'static;
  /// The stream type.
  type InputStream: Stream<Item = Self::Input> + Send;
}
