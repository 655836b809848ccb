//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements outbound port traits that do not need a network connection.

mod duty_source;
mod history_store;

pub use duty_source::SharedDutySource;
pub use history_store::{FileHistoryStore, InMemoryHistoryStore};

use crate::config::AttesterConfig;
use crate::error::AttesterResult;
use crate::ports::outbound::HistoryStore;
use std::sync::Arc;

/// On-disk store when `history_dir` is set, in-memory otherwise.
pub fn history_store_from_config(config: &AttesterConfig) -> AttesterResult<Arc<dyn HistoryStore>> {
    config.validate()?;
    let period = config.weak_subjectivity_period;
    match &config.history_dir {
        Some(dir) => Ok(Arc::new(FileHistoryStore::open(dir, period)?)),
        None => Ok(Arc::new(InMemoryHistoryStore::new(period)?)),
    }
}
