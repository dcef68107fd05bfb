//! Token id allocation.

use super::error::{LedgerError, LedgerResult};
use crate::config::MAX_ID_KEY;
use crate::storage::{DbError, WriteSet};
use crate::token::TokenId;

/// Hands out strictly increasing token ids for one invocation.
///
/// The durable counter is read lazily on the first allocation (absent means
/// nothing has been issued yet) and written back by [`IdAllocator::persist`]
/// into the invocation's [`WriteSet`]. If the invocation aborts the staged
/// counter is dropped with everything else, so ids consumed by a failed call
/// are handed out again by the next one.
#[derive(Debug, Default)]
pub struct IdAllocator {
    loaded: Option<TokenId>,
    current: Option<TokenId>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    fn load(&mut self, writes: &WriteSet<'_>) -> LedgerResult<TokenId> {
        if let Some(current) = self.current {
            return Ok(current);
        }
        let stored = match writes.metadata(MAX_ID_KEY)? {
            Some(raw) => TokenId::parse_canonical(&raw).ok_or_else(|| {
                DbError::Serialization(format!("{MAX_ID_KEY} is not a canonical id: {raw:?}"))
            })?,
            None => TokenId::ZERO,
        };
        self.loaded = Some(stored);
        self.current = Some(stored);
        Ok(stored)
    }

    /// Allocate the next id.
    pub fn allocate(&mut self, writes: &WriteSet<'_>) -> LedgerResult<TokenId> {
        let next = self
            .load(writes)?
            .next()
            .ok_or(LedgerError::IdSpaceExhausted)?;
        self.current = Some(next);
        Ok(next)
    }

    /// Stage the advanced counter. A no-op if nothing was allocated.
    pub fn persist(&self, writes: &mut WriteSet<'_>) {
        if let (Some(loaded), Some(current)) = (self.loaded, self.current) {
            if current != loaded {
                writes.put_metadata(MAX_ID_KEY, current.to_string());
            }
        }
    }
}
