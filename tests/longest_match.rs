//! End-to-end segmentation tests: longest-match selection, unknown
//! fallback, coverage, and determinism over randomized inputs.

use graphite::{tokenize, tokenize_batch, CompactTrie, Vocabulary};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn build(vocab: &[&str]) -> CompactTrie {
    let entries: Vec<&[u8]> = vocab.iter().map(|t| t.as_bytes()).collect();
    CompactTrie::build(&entries).unwrap()
}

#[test]
fn test_longest_match_reference_case() {
    // {"a","ab","abc"} over "abcab" must consume 0..3 then 3..5.
    let trie = build(&["a", "ab", "abc"]);
    assert_eq!(tokenize(&trie, b"abcab", 42).unwrap(), vec![2, 1]);
}

#[test]
fn test_unknown_fallback_on_empty_vocabulary() {
    let trie = build(&[]);
    assert_eq!(tokenize(&trie, b"xyz", 0).unwrap(), vec![0, 0, 0]);
}

#[test]
fn test_prefix_vocabulary_prefers_deepest_terminal() {
    let vocab = ["apple", "app", "application", "banana", "band", "b"];
    let trie = build(&vocab);

    // "apple" + "band", never "app" + anything.
    let ids = tokenize(&trie, b"appleband", -1).unwrap();
    assert_eq!(ids, vec![0, 4]);

    // "application" wins over its own prefixes.
    let ids = tokenize(&trie, b"applicationb", -1).unwrap();
    assert_eq!(ids, vec![2, 5]);
}

#[test]
fn test_output_never_longer_than_input() {
    let trie = build(&["aa", "aaa"]);
    for text in [&b"aaaaaaa"[..], &b"a"[..], &b""[..], &b"zzzz"[..]] {
        let ids = tokenize(&trie, text, -1).unwrap();
        assert!(ids.len() <= text.len());
    }
}

#[test]
fn test_coverage_random_inputs() {
    // Every emitted id accounts for exactly the bytes it consumed; the
    // total must equal the input length. unk is -1 so it can never collide
    // with a vocabulary position.
    let vocab = ["t", "th", "the", "he", "hello", "ell", "o ", " "];
    let trie = build(&vocab);
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for _ in 0..200 {
        let len = rng.gen_range(0..120);
        let text: Vec<u8> = (0..len)
            .map(|_| b"theo l!x"[rng.gen_range(0..8)])
            .collect();

        let ids = tokenize(&trie, &text, -1).unwrap();
        let consumed: usize = ids
            .iter()
            .map(|&id| {
                if id == -1 {
                    1
                } else {
                    vocab[id as usize].len()
                }
            })
            .sum();
        assert_eq!(consumed, text.len());
        assert!(ids.len() <= text.len());
    }
}

#[test]
fn test_determinism_random_inputs() {
    let trie = build(&["ab", "ba", "aba", "bab", "a"]);
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..50 {
        let len = rng.gen_range(0..200);
        let text: Vec<u8> = (0..len).map(|_| [b'a', b'b'][rng.gen_range(0..2)]).collect();

        let first = tokenize(&trie, &text, 0).unwrap();
        let second = tokenize(&trie, &text, 0).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_duplicate_and_empty_entry_bookkeeping() {
    // Duplicate: later position wins.
    let trie = build(&["x", "x"]);
    assert_eq!(tokenize(&trie, b"x", 9).unwrap(), vec![1]);

    // Empty entry: contributes nothing but keeps its position reserved.
    let trie = build(&["", "a"]);
    assert_eq!(tokenize(&trie, b"a", 9).unwrap(), vec![1]);
}

#[test]
fn test_binary_input_is_opaque_bytes() {
    let vocab: Vec<Vec<u8>> = vec![vec![0xC3, 0xA9], vec![0x00], vec![0xFF, 0xFE]];
    let trie = CompactTrie::build(&vocab).unwrap();

    let ids = tokenize(&trie, &[0xC3, 0xA9, 0x00, 0xFF, 0xFE, 0xFF], -1).unwrap();
    assert_eq!(ids, vec![0, 1, 2, -1]);
}

#[test]
fn test_batch_results_match_sequential_order() {
    let trie = build(&["ab", "cd", "abcd"]);
    let texts: Vec<Vec<u8>> = vec![
        b"abcdab".to_vec(),
        b"".to_vec(),
        b"xxabxx".to_vec(),
        b"cdcdcd".to_vec(),
    ];

    let batch = tokenize_batch(&trie, &texts, -1).unwrap();
    assert_eq!(batch.len(), texts.len());
    for (text, ids) in texts.iter().zip(&batch) {
        assert_eq!(ids, &tokenize(&trie, text, -1).unwrap());
    }
}

#[test]
fn test_vocabulary_wrapper_end_to_end() {
    let tokens: Vec<String> = ["<UNK>", "un", "fortunate", "ly", "unfortunate", "man"]
        .iter()
        .map(|t| t.to_string())
        .collect();
    let vocab = Vocabulary::new(tokens, "<UNK>").unwrap();

    let ids = vocab.tokenize("unfortunately");
    assert_eq!(ids, vec![4, 3]);
    assert_eq!(vocab.decode(&ids), "unfortunately");

    // Unknown byte surfaces as the unk token id and decodes to its string.
    let ids = vocab.tokenize("unfortunatxely");
    assert!(ids.contains(&vocab.unk_id()));
}
