//! Model state consumer module.
//!
//! This module drains record streams into a
//! [`ModelState`](crate::ml::ModelState), either asynchronously with
//! [`ModelStateConsumer`] or synchronously as the [`ModelStateWriter`] a
//! push-based source writes into.

/// Consumer trait implementation for the model state consumer.
pub mod consumer;
/// Input type definitions for the model state consumer.
pub mod input;
/// The model state consumer implementation.
pub mod model_state_consumer;
/// Tuple writer feeding a model state.
pub mod model_state_writer;

pub use model_state_consumer::ModelStateConsumer;
pub use model_state_writer::ModelStateWriter;
