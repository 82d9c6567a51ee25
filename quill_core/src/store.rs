use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

/// Failure reported by a host when a block write does not go through.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The block no longer exists.
    #[error("block {block_id} not found")]
    NotFound {
        /// Block that was requested.
        block_id: String,
    },
    /// The host refused the write.
    #[error("update rejected: {reason}")]
    Rejected {
        /// Host-provided reason.
        reason: String,
    },
}

/// Host document access used when applying an edit.
///
/// Text is the flattened plain text of the block, the same text selections
/// were captured against.
pub trait BlockStore: Send + Sync {
    /// Current text of `block_id`, or `None` when it cannot be read.
    fn block_text(&self, block_id: &str) -> Option<String>;

    /// Replace the text of `block_id`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the host does not accept the update.
    fn update_block_text(&self, block_id: &str, text: &str) -> Result<(), StoreError>;
}

/// Block store held in memory, keyed by block id.
#[derive(Debug, Default)]
pub struct MemoryBlockStore {
    blocks: Mutex<BTreeMap<String, String>>,
}

impl MemoryBlockStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with one block.
    #[must_use]
    pub fn with_block(self, block_id: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(block_id, text);
        self
    }

    /// Insert or overwrite a block.
    pub fn insert(&self, block_id: impl Into<String>, text: impl Into<String>) {
        self.blocks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(block_id.into(), text.into());
    }
}

impl BlockStore for MemoryBlockStore {
    fn block_text(&self, block_id: &str) -> Option<String> {
        self.blocks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(block_id)
            .cloned()
    }

    fn update_block_text(&self, block_id: &str, text: &str) -> Result<(), StoreError> {
        let mut blocks = self.blocks.lock().unwrap_or_else(PoisonError::into_inner);
        let slot = blocks.get_mut(block_id).ok_or_else(|| StoreError::NotFound {
            block_id: block_id.to_owned(),
        })?;
        text.clone_into(slot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn updates_existing_blocks_only() {
        let store = MemoryBlockStore::new().with_block("b1", "old");
        store.update_block_text("b1", "new").expect("update");
        assert_eq!(store.block_text("b1").as_deref(), Some("new"));
        assert_eq!(
            store.update_block_text("missing", "x"),
            Err(StoreError::NotFound {
                block_id: "missing".into()
            })
        );
    }
}
