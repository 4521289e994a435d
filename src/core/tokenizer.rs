//! Greedy longest-match segmentation over a compiled trie.

use std::num::NonZeroUsize;

use rayon::prelude::*;
use thiserror::Error;

use crate::core::trie::CompactTrie;

/// Errors raised at tokenization time.
///
/// An unmatched byte is never an error: it emits the caller's unknown id
/// and the scan moves on.
#[derive(Error, Debug)]
pub enum TokenizeError {
    /// The handle failed its validity tag check. Recoverable: retry with a
    /// valid handle.
    #[error("invalid trie handle")]
    InvalidHandle,
}

/// Knobs for the segmentation loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenizeOptions {
    /// Cap on how deep a single match may descend. `None` (the default)
    /// bounds the descent only by the remaining input. Earlier engine
    /// revisions shipped a fixed 256-byte cap; configure it here instead of
    /// relying on a hidden constant. A cap shorter than the longest
    /// vocabulary entry makes the longer entries unreachable.
    pub max_lookahead: Option<NonZeroUsize>,
}

impl TokenizeOptions {
    /// Bounded-lookahead variant.
    pub fn with_max_lookahead(cap: NonZeroUsize) -> Self {
        TokenizeOptions {
            max_lookahead: Some(cap),
        }
    }
}

/// Segment `text` into vocabulary ids by greedy longest match.
///
/// Deterministic single pass: every position either consumes the longest
/// vocabulary prefix present in the trie, or emits `unk_id` and advances one
/// byte. The scan therefore always covers the whole input, emits at most
/// `text.len()` ids, and never reads past the end of `text`. Empty input
/// yields empty output.
///
/// The trie is immutable, so any number of threads may call this on the
/// same handle concurrently; the only allocation is the output vector.
pub fn tokenize(trie: &CompactTrie, text: &[u8], unk_id: i32) -> Result<Vec<i32>, TokenizeError> {
    tokenize_with_options(trie, text, unk_id, TokenizeOptions::default())
}

/// [`tokenize`] with explicit [`TokenizeOptions`].
pub fn tokenize_with_options(
    trie: &CompactTrie,
    text: &[u8],
    unk_id: i32,
    options: TokenizeOptions,
) -> Result<Vec<i32>, TokenizeError> {
    if !trie.check_handle() {
        return Err(TokenizeError::InvalidHandle);
    }

    let mut out = Vec::with_capacity(text.len() / 4 + 1);
    let mut pos = 0;

    while pos < text.len() {
        let remaining = text.len() - pos;
        let limit = match options.max_lookahead {
            Some(cap) => remaining.min(cap.get()),
            None => remaining,
        };

        let (best_id, best_len) = longest_match(trie, &text[pos..pos + limit]);

        if best_len > 0 {
            out.push(best_id);
            pos += best_len;
        } else {
            out.push(unk_id);
            pos += 1;
        }
    }

    Ok(out)
}

/// Deepest terminal reached from the root along `window`.
///
/// The trie holds exactly one path per byte sequence, so the deepest
/// terminal on that path is the longest match. Returns `(-1, 0)` when not
/// even the first byte matches.
fn longest_match(trie: &CompactTrie, window: &[u8]) -> (i32, usize) {
    let mut node = trie.root();
    let mut best_id = -1;
    let mut best_len = 0;

    for (steps, &byte) in window.iter().enumerate() {
        match node.find_child(byte) {
            Some(child) => node = child,
            None => break,
        }
        if node.token_id() != -1 {
            best_id = node.token_id();
            best_len = steps + 1;
        }
    }

    (best_id, best_len)
}

/// Tokenize independent inputs in parallel.
///
/// Fans out across Rayon workers; the compiled trie is shared read-only
/// without locking. Output order matches input order.
pub fn tokenize_batch<T: AsRef<[u8]> + Sync>(
    trie: &CompactTrie,
    texts: &[T],
    unk_id: i32,
) -> Result<Vec<Vec<i32>>, TokenizeError> {
    texts
        .par_iter()
        .map(|text| tokenize(trie, text.as_ref(), unk_id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(vocab: &[&str]) -> CompactTrie {
        let entries: Vec<&[u8]> = vocab.iter().map(|t| t.as_bytes()).collect();
        CompactTrie::build(&entries).unwrap()
    }

    #[test]
    fn test_longest_match_wins() {
        let trie = build(&["a", "ab", "abc"]);
        let ids = tokenize(&trie, b"abcab", 99).unwrap();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_unknown_fallback_consumes_one_byte() {
        let trie = build(&[]);
        let ids = tokenize(&trie, b"xyz", 0).unwrap();
        assert_eq!(ids, vec![0, 0, 0]);
    }

    #[test]
    fn test_partial_descent_backtracks_to_best_terminal() {
        // "ab" descends a->b but only "a" is terminal.
        let trie = build(&["a", "abc"]);
        let ids = tokenize(&trie, b"abx", 7).unwrap();
        assert_eq!(ids, vec![0, 7, 7]);
    }

    #[test]
    fn test_empty_input() {
        let trie = build(&["a"]);
        assert!(tokenize(&trie, b"", 0).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_entry_takes_later_id() {
        let trie = build(&["x", "x"]);
        assert_eq!(tokenize(&trie, b"x", 9).unwrap(), vec![1]);
    }

    #[test]
    fn test_empty_entry_keeps_positions() {
        let trie = build(&["", "a"]);
        assert_eq!(tokenize(&trie, b"a", 9).unwrap(), vec![1]);
    }

    #[test]
    fn test_determinism() {
        let trie = build(&["ba", "ban", "banana", "na"]);
        let first = tokenize(&trie, b"bananaban", 0).unwrap();
        let second = tokenize(&trie, b"bananaban", 0).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_lookahead_cap_masks_long_entries() {
        let trie = build(&["a", "aaaa"]);
        let capped = TokenizeOptions::with_max_lookahead(NonZeroUsize::new(2).unwrap());

        // Unbounded: "aaaa" then nothing left.
        assert_eq!(tokenize(&trie, b"aaaa", 9).unwrap(), vec![1]);
        // Capped at 2: only "a" is reachable.
        assert_eq!(
            tokenize_with_options(&trie, b"aaaa", 9, capped).unwrap(),
            vec![0, 0, 0, 0]
        );
    }

    #[test]
    fn test_batch_matches_sequential() {
        let trie = build(&["ab", "b", "c"]);
        let texts = vec![b"abbc".to_vec(), b"".to_vec(), b"zzz".to_vec()];

        let batch = tokenize_batch(&trie, &texts, -7).unwrap();
        for (text, ids) in texts.iter().zip(&batch) {
            assert_eq!(ids, &tokenize(&trie, text, -7).unwrap());
        }
    }
}
