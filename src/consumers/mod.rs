//! Built-in consumer implementations.

/// Consumer that trains a model state from a stream.
pub mod model_state;
