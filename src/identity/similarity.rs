// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Ratcliff/Obershelp similarity.
//!
//! `ratio = 2·M / (|a| + |b|)` where M counts the characters matched by
//! recursively taking the longest common substring and recursing on the
//! unmatched pieces to its left and right.

/// Similarity of two strings in `[0, 1]`; 1 for identical strings
/// (including two empty ones).
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let (i, j, len) = longest_common_run(a, b);
    if len == 0 {
        return 0;
    }
    len + matching_chars(&a[..i], &b[..j]) + matching_chars(&a[i + len..], &b[j + len..])
}

/// Longest common substring as `(start in a, start in b, length)`; the
/// earliest in `a`, then in `b`, among equally long runs.
fn longest_common_run(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    // prev[j + 1] = length of the common suffix of a[..i] and b[..=j].
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    for (i, &ca) in a.iter().enumerate() {
        for (j, &cb) in b.iter().enumerate() {
            cur[j + 1] = if ca == cb { prev[j] + 1 } else { 0 };
            let len = cur[j + 1];
            let (si, sj) = (i + 1 - len, j + 1 - len);
            if len > best.2 || (len == best.2 && len > 0 && (si, sj) < (best.0, best.1)) {
                best = (si, sj, len);
            }
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    best
}
