//! Dataset producer module.
//!
//! This module provides a producer that streams the records of an
//! in-memory [`Dataset`](crate::dataset::Dataset), optionally shuffled.

/// The dataset producer implementation.
pub mod dataset_producer;
/// Output types for the dataset producer.
pub mod output;
/// Producer trait implementation for the dataset producer.
pub mod producer;

pub use dataset_producer::{DatasetProducer, StreamState, permutation};

#[cfg(test)]
mod dataset_producer_test;
