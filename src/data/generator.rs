use crate::data::batch::Batch;
use crate::data::dataset::InMemoryDataset;
use crate::error::{Result, ValidError};

/// A finite, rewindable stream of batches.
///
/// `next_batch` returns `None` once the sweep is exhausted; `reset` positions
/// the source at the start of a new sweep.
pub trait BatchSource {
    fn next_batch(&mut self) -> Option<Batch>;
    fn reset(&mut self);
}

/// Yields consecutive, in-order batches of `batch_size` samples. The last
/// batch of a sweep may be shorter.
#[derive(Debug, Clone)]
pub struct BatchGenerator {
    dataset: InMemoryDataset,
    batch_size: usize,
    cursor: usize,
}

impl BatchGenerator {
    /// Fails with `ZeroBatchSize` if `batch_size == 0`.
    pub fn new(dataset: InMemoryDataset, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(ValidError::ZeroBatchSize);
        }
        Ok(Self { dataset, batch_size, cursor: 0 })
    }

    #[inline]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    #[inline]
    pub fn dataset(&self) -> &InMemoryDataset {
        &self.dataset
    }
}

impl BatchSource for BatchGenerator {
    fn next_batch(&mut self) -> Option<Batch> {
        if self.cursor >= self.dataset.len() {
            return None;
        }

        let end = (self.cursor + self.batch_size).min(self.dataset.len());
        let inputs = self.dataset.inputs().slice_rows(self.cursor, end);
        let labels = self.dataset.labels()[self.cursor..end].to_vec();
        self.cursor = end;

        Some(Batch::from_parts(inputs, labels))
    }

    fn reset(&mut self) {
        self.cursor = 0;
    }
}
