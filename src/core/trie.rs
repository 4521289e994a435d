//! Immutable, cache-line-aligned compact trie and its compiler.
//!
//! A [`CompactTrie`] is produced once from a builder trie and never mutated
//! afterwards, which is what makes lock-free concurrent tokenization sound:
//! any number of threads may walk the same handle at the same time. The
//! handle is the single owner of the node arena; dropping it (or calling
//! [`CompactTrie::destroy`]) releases every node exactly once.

use crate::core::builder::{BuildError, BuilderNode};
use crate::core::simd::{find_child, LANE_WIDTH};

/// Tag stored in every live handle. `tokenize` refuses a handle without it
/// instead of walking garbage, which catches zeroed or otherwise corrupted
/// memory arriving over an unsafe boundary.
const TRIE_MAGIC: u64 = 0x4752_5048_5452_4945; // "GRPHTRIE"

/// One finalized trie position.
///
/// Field invariants, established by compilation and never changed after:
/// - the first `child_count` bytes of `keys` are strictly ascending, and
///   `keys.len()` is a multiple of 32 with zero fill beyond `child_count`
/// - `children[i]` is the subtree reached through `keys[i]`
/// - `child_bitmap` has bit `k` set for every child key `k < 64`
/// - the arena is a rooted tree: no cycles, no shared children
#[derive(Debug)]
#[repr(align(64))]
pub struct CompactNode {
    token_id: i32,
    child_count: u16,
    child_bitmap: u64,
    keys: Box<[u8]>,
    children: Box<[CompactNode]>,
}

impl CompactNode {
    fn from_builder(mut node: BuilderNode) -> Result<Self, BuildError> {
        // Keys are unique within a node, so any comparison sort yields the
        // strictly ascending order the locator depends on.
        node.children.sort_by_key(|c| c.key);

        let count = node.children.len();
        debug_assert!(count <= 256);

        let padded = count.div_ceil(LANE_WIDTH) * LANE_WIDTH;
        let mut keys = Vec::new();
        keys.try_reserve_exact(padded)?;
        keys.extend(node.children.iter().map(|c| c.key));
        keys.resize(padded, 0);

        let mut bitmap = 0u64;
        for &key in &keys[..count] {
            if key < 64 {
                bitmap |= 1u64 << key;
            }
        }

        let mut children = Vec::new();
        children.try_reserve_exact(count)?;
        for child in node.children {
            children.push(CompactNode::from_builder(child)?);
        }

        Ok(CompactNode {
            token_id: node.token_id,
            child_count: count as u16,
            child_bitmap: bitmap,
            keys: keys.into_boxed_slice(),
            children: children.into_boxed_slice(),
        })
    }

    /// Vocabulary position terminated at this node, or -1.
    #[inline]
    pub fn token_id(&self) -> i32 {
        self.token_id
    }

    #[inline]
    pub fn child_count(&self) -> usize {
        self.child_count as usize
    }

    /// Presence mask over child keys 0..64.
    #[inline]
    pub fn child_bitmap(&self) -> u64 {
        self.child_bitmap
    }

    /// Sorted child key array, zero-padded to a multiple of 32.
    #[inline]
    pub fn keys(&self) -> &[u8] {
        &self.keys
    }

    /// O(1) pre-filter: a clear bit proves the child is absent. A set bit
    /// (or any key >= 64) still requires the key-array scan for the index.
    #[inline]
    pub fn maybe_has_child(&self, key: u8) -> bool {
        key >= 64 || self.child_bitmap & (1u64 << key) != 0
    }

    /// Locate the child reached through `key`.
    #[inline]
    pub fn find_child(&self, key: u8) -> Option<&CompactNode> {
        if !self.maybe_has_child(key) {
            return None;
        }
        find_child(&self.keys, self.child_count as usize, key).map(|i| &self.children[i])
    }
}

/// Owned handle to a compiled trie.
#[derive(Debug)]
pub struct CompactTrie {
    magic: u64,
    root: CompactNode,
}

impl CompactTrie {
    /// Compile a vocabulary into a compact trie.
    ///
    /// Entry positions become token ids. Empty entries are skipped (their
    /// positions stay reserved but unreachable); byte-identical duplicates
    /// resolve to the later position.
    pub fn build<T: AsRef<[u8]>>(vocab: &[T]) -> Result<Self, BuildError> {
        let mut builder = BuilderNode::root();
        for (id, token) in vocab.iter().enumerate() {
            builder.insert(token.as_ref(), id as i32)?;
        }
        Self::compile(builder)
    }

    pub(crate) fn compile(builder: BuilderNode) -> Result<Self, BuildError> {
        let root = CompactNode::from_builder(builder)?;
        debug_assert_eq!(root.token_id(), -1);

        #[cfg(target_arch = "x86_64")]
        if !is_x86_feature_detected!("avx2") {
            log::warn!("AVX2 not available; child lookup will use the scalar path");
        }
        log::debug!("compiled compact trie ({} root children)", root.child_count());

        Ok(CompactTrie {
            magic: TRIE_MAGIC,
            root,
        })
    }

    #[inline]
    pub fn root(&self) -> &CompactNode {
        &self.root
    }

    /// Validity tag check performed by `tokenize` before any traversal.
    #[inline]
    pub(crate) fn check_handle(&self) -> bool {
        self.magic == TRIE_MAGIC
    }

    /// Tear the trie down, releasing the whole node arena.
    ///
    /// Equivalent to dropping the handle; provided so callers porting from
    /// the raw-pointer API have an explicit destroy operation. Ownership
    /// makes a second destroy unrepresentable.
    pub fn destroy(self) {}
}
