//! Vocabulary wrapper: the token list, both lookup directions, and the
//! compiled trie.
//!
//! This is the convenience layer over the raw trie API for callers that
//! want decoding and file loading next to segmentation. Supported formats:
//!
//! - plain text: one token per line, blank lines skipped
//! - JSON: either an array of token strings (`["the", "he", ...]`) or an
//!   object mapping token to id (`{"the": 0, "he": 1, ...}`, ordered by id)
//!
//! Ids are always positions in the original token list: duplicates keep the
//! later position (matching the trie) and empty entries keep their slot but
//! are unreachable by segmentation.

use std::path::Path;

use rustc_hash::FxHashMap;
use serde_json::Value;
use thiserror::Error;

use crate::core::builder::BuildError;
use crate::core::tokenizer::{tokenize_with_options, TokenizeOptions};
use crate::core::trie::CompactTrie;

/// Errors that can occur when loading or saving vocabularies.
#[derive(Error, Debug)]
pub enum VocabError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid vocabulary JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported vocabulary format: {0}")]
    Format(String),
    #[error(transparent)]
    Build(#[from] BuildError),
}

/// On-disk vocabulary representations understood by [`Vocabulary::save`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VocabFormat {
    /// One token per line.
    Text,
    /// JSON object mapping token to id.
    Json,
}

/// Fixed vocabulary with O(1) id lookup and O(L) longest-match segmentation.
pub struct Vocabulary {
    tokens: Vec<String>,
    token_to_id: FxHashMap<String, i32>,
    unk_token: String,
    unk_id: i32,
    trie: CompactTrie,
    options: TokenizeOptions,
}

impl Vocabulary {
    /// Build a vocabulary from a pre-computed token list.
    ///
    /// Token order determines ids. `unk_token` resolves to its position in
    /// the list, or id 0 when absent.
    pub fn new(tokens: Vec<String>, unk_token: &str) -> Result<Self, VocabError> {
        let trie = CompactTrie::build(&tokens)?;

        let mut token_to_id = FxHashMap::default();
        for (id, token) in tokens.iter().enumerate() {
            // Last write wins, mirroring the trie's duplicate policy.
            token_to_id.insert(token.clone(), id as i32);
        }
        let unk_id = token_to_id.get(unk_token).copied().unwrap_or(0);

        Ok(Vocabulary {
            tokens,
            token_to_id,
            unk_token: unk_token.to_string(),
            unk_id,
            trie,
            options: TokenizeOptions::default(),
        })
    }

    /// Replace the segmentation options (e.g. to cap lookahead).
    pub fn with_options(mut self, options: TokenizeOptions) -> Self {
        self.options = options;
        self
    }

    /// Parse a plain-text vocabulary: one token per line, surrounding
    /// whitespace trimmed, blank lines skipped.
    pub fn from_lines(data: &str, unk_token: &str) -> Result<Self, VocabError> {
        let tokens = data
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();
        Self::new(tokens, unk_token)
    }

    /// Load a plain-text vocabulary file.
    pub fn from_file<P: AsRef<Path>>(path: P, unk_token: &str) -> Result<Self, VocabError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_lines(&data, unk_token)
    }

    /// Parse a JSON vocabulary: an array of tokens, or an object mapping
    /// token to id (tokens are ordered by their ids).
    pub fn from_json(data: &str, unk_token: &str) -> Result<Self, VocabError> {
        let value: Value = serde_json::from_str(data)?;

        let tokens = match value {
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(token) => Ok(token),
                    other => Err(VocabError::Format(format!(
                        "expected string token, got {other}"
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()?,
            Value::Object(map) => {
                let mut pairs = Vec::with_capacity(map.len());
                for (token, id) in map {
                    let id = id.as_i64().ok_or_else(|| {
                        VocabError::Format(format!("non-integer id for token {token:?}"))
                    })?;
                    pairs.push((id, token));
                }
                pairs.sort_by_key(|&(id, _)| id);
                pairs.into_iter().map(|(_, token)| token).collect()
            }
            other => {
                return Err(VocabError::Format(format!(
                    "expected JSON array or object, got {other}"
                )))
            }
        };

        Self::new(tokens, unk_token)
    }

    /// Load a JSON vocabulary file.
    pub fn from_json_file<P: AsRef<Path>>(path: P, unk_token: &str) -> Result<Self, VocabError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data, unk_token)
    }

    /// Save the vocabulary in the requested format.
    pub fn save<P: AsRef<Path>>(&self, path: P, format: VocabFormat) -> Result<(), VocabError> {
        match format {
            VocabFormat::Text => {
                let mut out = String::new();
                for token in &self.tokens {
                    out.push_str(token);
                    out.push('\n');
                }
                std::fs::write(path, out)?;
            }
            VocabFormat::Json => {
                let map: serde_json::Map<String, Value> = self
                    .tokens
                    .iter()
                    .enumerate()
                    .map(|(id, token)| (token.clone(), Value::from(id as i64)))
                    .collect();
                std::fs::write(path, serde_json::to_string_pretty(&Value::Object(map))?)?;
            }
        }
        Ok(())
    }

    /// Segment `text` into token ids.
    pub fn tokenize(&self, text: &str) -> Vec<i32> {
        tokenize_with_options(&self.trie, text.as_bytes(), self.unk_id, self.options)
            // The handle is owned by `self` and always passes its tag check.
            .expect("owned trie handle is always valid")
    }

    /// Decode ids back to a string. Ids outside the vocabulary render as the
    /// unknown token.
    pub fn decode(&self, ids: &[i32]) -> String {
        let mut out = String::new();
        for &id in ids {
            out.push_str(self.token(id).unwrap_or(&self.unk_token));
        }
        out
    }

    /// Token string for `id`, if the id is in range.
    pub fn token(&self, id: i32) -> Option<&str> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.tokens.get(i))
            .map(String::as_str)
    }

    /// Id for an exact token string.
    pub fn id(&self, token: &str) -> Option<i32> {
        self.token_to_id.get(token).copied()
    }

    pub fn unk_id(&self) -> i32 {
        self.unk_id
    }

    pub fn unk_token(&self) -> &str {
        &self.unk_token
    }

    /// Number of vocabulary positions, including duplicates and empties.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The compiled trie, for callers driving the raw scan API directly.
    pub fn trie(&self) -> &CompactTrie {
        &self.trie
    }
}
