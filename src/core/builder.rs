//! Mutable trie used only while a vocabulary is being ingested.
//!
//! The builder is optimized for cheap incremental insertion, not lookup:
//! children live in a plain `Vec` in insertion order and get sorted during
//! compilation. Nodes own their children outright, so dropping the root
//! releases the whole tree.

use thiserror::Error;

/// Errors raised while building a trie from a vocabulary.
#[derive(Error, Debug)]
pub enum BuildError {
    /// An allocation failed. The partially built structures are released
    /// before this surfaces; no partial trie ever escapes.
    #[error("allocation failed while building the trie: {0}")]
    OutOfMemory(#[from] std::collections::TryReserveError),
    /// Reserved for stricter validation. The current policy is permissive:
    /// empty entries are skipped, byte-identical duplicates overwrite.
    #[error("malformed vocabulary: {0}")]
    MalformedVocabulary(String),
}

/// One position in the construction-time trie.
#[derive(Debug)]
pub(crate) struct BuilderNode {
    pub(crate) key: u8,
    /// Vocabulary position if this node terminates an entry, -1 otherwise.
    pub(crate) token_id: i32,
    /// Insertion order; at most 256 entries (one per distinct byte value).
    pub(crate) children: Vec<BuilderNode>,
}

impl BuilderNode {
    /// Root of an empty builder trie.
    ///
    /// The root's key is meaningless (it represents the empty prefix) and
    /// its `token_id` stays -1: the empty string is never a valid token.
    pub(crate) fn root() -> Self {
        BuilderNode {
            key: 0,
            token_id: -1,
            children: Vec::new(),
        }
    }

    /// Insert `token` with vocabulary position `id`.
    ///
    /// Empty tokens are skipped silently. Byte-identical duplicates
    /// overwrite the earlier id (last write wins).
    pub(crate) fn insert(&mut self, token: &[u8], id: i32) -> Result<(), BuildError> {
        if token.is_empty() {
            return Ok(());
        }

        let mut node = self;
        for &byte in token {
            let idx = match node.children.iter().position(|c| c.key == byte) {
                Some(idx) => idx,
                None => {
                    node.children.try_reserve(1)?;
                    node.children.push(BuilderNode {
                        key: byte,
                        token_id: -1,
                        children: Vec::new(),
                    });
                    node.children.len() - 1
                }
            };
            node = &mut node.children[idx];
        }

        if node.token_id != -1 {
            log::debug!(
                "duplicate vocabulary entry: id {} overwritten by {}",
                node.token_id,
                id
            );
        }
        node.token_id = id;
        Ok(())
    }
}
