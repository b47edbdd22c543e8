//! Baseline record and its durable store

pub mod record;
pub mod store;
pub mod timestamp;

pub use record::{Baseline, FileRecord};
pub use store::{BaselineStore, CreatedBaseline, DEFAULT_BASELINE_FILE};
