//! Graphite - Greedy longest-match trie tokenizer core.
//!
//! A high-throughput tokenizer featuring:
//! - Cache-line-aligned compact trie built once from a fixed vocabulary
//! - Greedy longest-match segmentation with unknown-token fallback
//! - AVX2-accelerated child lookup with a cross-tested scalar fallback
//! - Rayon parallelism for batch tokenization over the shared, immutable trie
//! - FxHashMap-backed vocabulary wrapper with text/JSON loaders

pub mod core;

pub use crate::core::{
    classify_whitespace, compare_bytes, tokenize, tokenize_batch, tokenize_with_options,
    BuildError, CompactNode, CompactTrie, TokenizeError, TokenizeOptions, VocabError, VocabFormat,
    Vocabulary,
};
