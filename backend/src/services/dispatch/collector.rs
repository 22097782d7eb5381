//! Merges out-of-order completions back into row order.

use common::model::dispatch::DispatchResult;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CollectError {
    #[error("row {row_index} is outside a batch of {total}")]
    OutOfRange { row_index: usize, total: usize },

    #[error("row {0} completed twice")]
    Duplicate(usize),

    #[error("rows never completed: {0:?}")]
    Incomplete(Vec<usize>),
}

/// One slot per row; each slot is written exactly once.
#[derive(Debug)]
pub struct ResultCollector {
    slots: Vec<Option<DispatchResult>>,
    completed: usize,
}

impl ResultCollector {
    pub fn new(total: usize) -> Self {
        Self {
            slots: vec![None; total],
            completed: 0,
        }
    }

    pub fn total(&self) -> usize {
        self.slots.len()
    }

    /// Number of rows that have reached a terminal state.
    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn is_complete(&self) -> bool {
        self.completed == self.slots.len()
    }

    /// Stores `result` in its row's slot and returns the new completed count.
    pub fn record(&mut self, result: DispatchResult) -> Result<usize, CollectError> {
        let total = self.slots.len();
        let slot = self
            .slots
            .get_mut(result.row_index)
            .ok_or(CollectError::OutOfRange {
                row_index: result.row_index,
                total,
            })?;
        if slot.is_some() {
            return Err(CollectError::Duplicate(result.row_index));
        }
        *slot = Some(result);
        self.completed += 1;
        Ok(self.completed)
    }

    /// The results in row order; fails if any row is still missing.
    pub fn finish(self) -> Result<Vec<DispatchResult>, CollectError> {
        let missing: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .map(|(i, _)| i)
            .collect();
        if !missing.is_empty() {
            return Err(CollectError::Incomplete(missing));
        }
        Ok(self.slots.into_iter().flatten().collect())
    }
}
