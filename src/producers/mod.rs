//! Producers that feed pipelines.

pub mod dataset;
