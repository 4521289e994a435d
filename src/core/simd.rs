//! Vectorized byte-scan primitives used by the compact trie.
//!
//! Every primitive here has a portable scalar implementation and, on
//! x86_64, an AVX2 path selected at runtime with `is_x86_feature_detected!`.
//! The two paths must return byte-identical results for all inputs; the
//! randomized cross-checks live in `tests/locator.rs`.

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

/// Child counts below this use a plain linear scan: vector setup costs more
/// than it saves at small N. Tunable, not load-bearing for correctness.
pub const LINEAR_SCAN_THRESHOLD: usize = 16;

/// Width of one comparison lane in bytes. Child key arrays are zero-padded
/// to a multiple of this so full-lane loads never read outside the
/// allocation.
pub const LANE_WIDTH: usize = 32;

/// Locate `target` among the first `count` bytes of `keys`.
///
/// `keys` must be zero-padded to a multiple of [`LANE_WIDTH`]; the search is
/// bounded by `count`, so padding bytes are never reported as matches. Keys
/// within a node are sorted and unique, which makes "lowest matching index"
/// simply "the" index.
#[inline]
pub fn find_child(keys: &[u8], count: usize, target: u8) -> Option<usize> {
    debug_assert!(count <= keys.len());
    debug_assert_eq!(keys.len() % LANE_WIDTH, 0);

    if count < LINEAR_SCAN_THRESHOLD {
        return find_child_scalar(keys, count, target);
    }

    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") {
            // SAFETY: AVX2 support was just detected, and the padding
            // contract above keeps every 32-byte load inside `keys`.
            return unsafe { find_child_avx2(keys, count, target) };
        }
    }

    find_child_scalar(keys, count, target)
}

/// Reference implementation of [`find_child`]; also the fallback for small
/// nodes and non-AVX2 hosts.
#[inline]
pub fn find_child_scalar(keys: &[u8], count: usize, target: u8) -> Option<usize> {
    keys[..count].iter().position(|&k| k == target)
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn find_child_avx2(keys: &[u8], count: usize, target: u8) -> Option<usize> {
    let target_vec = _mm256_set1_epi8(target as i8);

    let mut i = 0;
    while i < count {
        // Padding guarantees the full-lane load stays inside the array even
        // when fewer than LANE_WIDTH logical keys remain.
        let lane = _mm256_loadu_si256(keys.as_ptr().add(i) as *const __m256i);
        let eq = _mm256_cmpeq_epi8(lane, target_vec);
        let mut mask = _mm256_movemask_epi8(eq) as u32;

        // Drop hits that fall inside the zero padding.
        let remaining = count - i;
        if remaining < LANE_WIDTH {
            mask &= (1u32 << remaining) - 1;
        }

        if mask != 0 {
            return Some(i + mask.trailing_zeros() as usize);
        }
        i += LANE_WIDTH;
    }

    None
}

/// Lexicographic comparison of the first `len` bytes of `a` and `b`.
///
/// Returns the signed difference of the first mismatching byte pair, or 0
/// when the prefixes are equal. This is a verification/prefix utility and
/// stays off the tokenization hot path.
///
/// # Panics
///
/// Panics if either slice is shorter than `len`.
pub fn compare_bytes(a: &[u8], b: &[u8], len: usize) -> i32 {
    assert!(len <= a.len() && len <= b.len());

    #[cfg(target_arch = "x86_64")]
    {
        if len >= LANE_WIDTH && is_x86_feature_detected!("avx2") {
            // SAFETY: AVX2 detected; lane loads are bounded by `len`, which
            // both slices are long enough for.
            return unsafe { compare_bytes_avx2(a, b, len) };
        }
    }

    compare_bytes_scalar(a, b, len)
}

fn compare_bytes_scalar(a: &[u8], b: &[u8], len: usize) -> i32 {
    for i in 0..len {
        if a[i] != b[i] {
            return a[i] as i32 - b[i] as i32;
        }
    }
    0
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn compare_bytes_avx2(a: &[u8], b: &[u8], len: usize) -> i32 {
    let mut i = 0;
    while i + LANE_WIDTH <= len {
        let va = _mm256_loadu_si256(a.as_ptr().add(i) as *const __m256i);
        let vb = _mm256_loadu_si256(b.as_ptr().add(i) as *const __m256i);
        let eq = _mm256_cmpeq_epi8(va, vb);
        let mask = _mm256_movemask_epi8(eq) as u32;

        if mask != u32::MAX {
            // The mask has 0 bits where bytes differ; the lowest one is the
            // first mismatch in this lane.
            let offset = (!mask).trailing_zeros() as usize;
            return a[i + offset] as i32 - b[i + offset] as i32;
        }
        i += LANE_WIDTH;
    }

    compare_bytes_scalar(&a[i..], &b[i..], len - i)
}

/// Byte-per-byte whitespace classification mask.
///
/// The output holds one byte per input byte: 0xFF where the input byte is
/// the ASCII space character, 0x00 everywhere else. Only the space predicate
/// is a committed contract here; alphabetic/digit classes are deliberately
/// absent (their encoding was never finalized upstream) and nothing on the
/// tokenization path may assume them.
pub fn classify_whitespace(input: &[u8]) -> Vec<u8> {
    let mut mask = vec![0u8; input.len()];

    #[cfg(target_arch = "x86_64")]
    {
        if input.len() >= LANE_WIDTH && is_x86_feature_detected!("avx2") {
            // SAFETY: AVX2 detected; loads and stores are bounded by the
            // equal lengths of `input` and `mask`.
            unsafe { classify_whitespace_avx2(input, &mut mask) };
            return mask;
        }
    }

    classify_whitespace_scalar(input, &mut mask);
    mask
}

fn classify_whitespace_scalar(input: &[u8], mask: &mut [u8]) {
    for (m, &b) in mask.iter_mut().zip(input) {
        *m = if b == b' ' { 0xFF } else { 0x00 };
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn classify_whitespace_avx2(input: &[u8], mask: &mut [u8]) {
    let space = _mm256_set1_epi8(b' ' as i8);

    let mut i = 0;
    while i + LANE_WIDTH <= input.len() {
        let chunk = _mm256_loadu_si256(input.as_ptr().add(i) as *const __m256i);
        let is_space = _mm256_cmpeq_epi8(chunk, space);
        _mm256_storeu_si256(mask.as_mut_ptr().add(i) as *mut __m256i, is_space);
        i += LANE_WIDTH;
    }

    classify_whitespace_scalar(&input[i..], &mut mask[i..]);
}
