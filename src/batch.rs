use std::sync::Arc;

use crate::error::ConfigError;

/// A fixed group of instruments served by one streaming connection.
///
/// Membership is decided once at partition time and never changes:
/// recovery re-subscribes the same batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    index: usize,
    instruments: Arc<[String]>,
}

impl Batch {
    pub fn new(index: usize, instruments: Vec<String>) -> Self {
        Self {
            index,
            instruments: instruments.into(),
        }
    }

    /// Position in the partition sequence.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn instruments(&self) -> &[String] {
        &self.instruments
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }
}

/// Splits the instrument universe into ordered, disjoint batches of at
/// most `size` instruments. Only the last batch may be shorter.
pub fn partition(instruments: &[String], size: usize) -> Result<Vec<Batch>, ConfigError> {
    if size == 0 {
        return Err(ConfigError::ZeroBatchSize);
    }

    Ok(instruments
        .chunks(size)
        .enumerate()
        .map(|(index, chunk)| Batch::new(index, chunk.to_vec()))
        .collect())
}
