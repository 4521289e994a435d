//! Core tokenization engine for graphite.
//!
//! This module contains the trie tokenizer implementation with:
//! - A transient builder trie used only while a vocabulary is ingested
//! - A compiler that lays the trie out as a cache-line-aligned node arena
//! - A vectorized child locator (AVX2 with a cross-tested scalar fallback)
//! - The greedy longest-match segmentation loop
//! - A vocabulary wrapper with text/JSON loaders and id-to-token decoding
//!
//! # Architecture
//!
//! The core is organized around one data-flow:
//!
//! vocabulary → builder trie → [`CompactTrie::build`] → [`CompactTrie`]
//! → [`tokenize`] (any number of concurrent calls) → drop
//!
//! - [`CompactTrie`]: immutable, 64-byte-aligned node arena; the only
//!   structure consulted at tokenization time, owned by exactly one handle
//! - [`tokenize`] / [`tokenize_batch`]: deterministic longest-match scan;
//!   batches fan out across Rayon workers without locking
//! - [`Vocabulary`]: token/id maps plus the compiled trie, for callers that
//!   want decoding and file loading alongside the raw scan
//!
//! # Performance Optimizations
//!
//! - **64-byte node alignment**: one child-lookup touches one cache line
//! - **Sorted key array + ASCII bitmap**: O(1) absence pre-filter before the
//!   key scan for byte values below 64
//! - **AVX2 equality scan**: 32 child keys compared per lane, with zero
//!   padding making full-lane loads safe at any child count
//! - **Rayon parallelism**: the compiled trie is immutable and shared
//!   read-only across batch workers

mod builder;
pub mod simd;
mod tokenizer;
mod trie;
mod vocab;

pub use builder::BuildError;
pub use simd::{classify_whitespace, compare_bytes, find_child, find_child_scalar};
pub use tokenizer::{
    tokenize, tokenize_batch, tokenize_with_options, TokenizeError, TokenizeOptions,
};
pub use trie::{CompactNode, CompactTrie};
pub use vocab::{VocabError, VocabFormat, Vocabulary};
