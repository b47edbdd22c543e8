//! Hashing, drift detection and the integrity pipelines

pub mod config;
pub mod digest;
pub mod drift;
pub mod error;
pub mod monitor;
