//! Output trait for components that produce output streams.
//!
//! # Example
//!
//! ```rust
//! use mlweave::output::Output;
//! use mlweave::message::Message;
//! use futures::Stream;
//! use std::pin::Pin;
//!
//! struct MyProducer;
//!
//! impl Output for MyProducer {
//!   type Output = Message<i32>;
//!   type OutputStream = Pin<Box<dyn Stream<Item = Message<i32>> + Send>>;
//! }
//! ```

use futures::Stream;

/// Components producing a stream of `Self::Output`.
pub trait Output {
  /// Item type of the stream.
  type Output: Send + 'static;
  /// The stream type.
  type OutputStream: Stream<Item = Self::Output> + Send;
}
