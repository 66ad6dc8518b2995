// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Reed-Solomon error correction over GF(2^8).
//!
//! RS(255, k) with the primitive polynomial 0x11D (x^8+x^4+x^3+x^2+1) and
//! first consecutive root α^0. Systematic encoding; Berlekamp-Massey decoding
//! with Chien search and Forney. Any block shorter than 255 symbols is a
//! shortened code: the missing leading symbols are implicit zeros.

use std::sync::OnceLock;

use thiserror::Error;

/// Primitive polynomial for GF(2^8): x^8 + x^4 + x^3 + x^2 + 1 = 0x11D.
const PRIM_POLY: u16 = 0x11D;

/// Maximum RS block size.
pub const N_MAX: usize = 255;

// --- GF(2^8) Arithmetic ---

struct GfTables {
    exp: [u8; 512],
    log: [u8; 256],
}

fn build_gf_tables() -> GfTables {
    let mut exp = [0u8; 512];
    let mut log = [0u8; 256];

    let mut x: u16 = 1;
    for i in 0..255u16 {
        exp[i as usize] = x as u8;
        exp[(i + 255) as usize] = x as u8; // wrap-around for modular access
        log[x as usize] = i as u8;
        x <<= 1;
        if x & 0x100 != 0 {
            x ^= PRIM_POLY;
        }
    }
    exp[510] = exp[0];
    exp[511] = exp[1];

    GfTables { exp, log }
}

fn gf_tables() -> &'static GfTables {
    static TABLES: OnceLock<GfTables> = OnceLock::new();
    TABLES.get_or_init(build_gf_tables)
}

fn gf_mul(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    let t = gf_tables();
    t.exp[t.log[a as usize] as usize + t.log[b as usize] as usize]
}

/// Multiplicative inverse. Callers guarantee `a != 0`.
fn gf_inv(a: u8) -> u8 {
    debug_assert_ne!(a, 0, "cannot invert zero in GF(2^8)");
    let t = gf_tables();
    t.exp[255 - t.log[a as usize] as usize]
}

/// α^p for any exponent, including negative ones via `p mod 255`.
fn alpha_pow(p: isize) -> u8 {
    gf_tables().exp[p.rem_euclid(255) as usize]
}

/// Evaluate polynomial at x. `poly[0]` is the highest-degree coefficient.
fn poly_eval(poly: &[u8], x: u8) -> u8 {
    poly.iter().fold(0u8, |acc, &coeff| gf_mul(acc, x) ^ coeff)
}

/// Evaluate polynomial in ascending power format at x.
fn eval_asc(poly: &[u8], x: u8) -> u8 {
    poly.iter().rev().fold(0u8, |acc, &coeff| gf_mul(acc, x) ^ coeff)
}

fn poly_mul(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut result = vec![0u8; a.len() + b.len() - 1];
    for (i, &ac) in a.iter().enumerate() {
        for (j, &bc) in b.iter().enumerate() {
            result[i + j] ^= gf_mul(ac, bc);
        }
    }
    result
}

/// Error returned when a block cannot be corrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Reed-Solomon: too many errors to correct")]
pub struct RsDecodeError;

/// A Reed-Solomon code with a fixed number of parity symbols.
///
/// Holds the generator polynomial so repeated encodes and decodes (the
/// extractor runs thousands) do not rebuild it.
#[derive(Debug, Clone)]
pub struct ReedSolomon {
    parity_len: usize,
    /// g(x) = prod_{i=0}^{parity_len-1} (x - α^i), highest degree first.
    generator: Vec<u8>,
}

impl ReedSolomon {
    /// Build a code with `parity_len` parity symbols.
    ///
    /// # Panics
    /// Panics if `parity_len` is 0 or leaves no room for data
    /// (`parity_len >= 255`). Configuration validation rejects both earlier.
    pub fn new(parity_len: usize) -> Self {
        assert!(
            parity_len > 0 && parity_len < N_MAX,
            "parity length {parity_len} must be in 1..{N_MAX}"
        );
        let mut generator = vec![1u8];
        for i in 0..parity_len {
            generator = poly_mul(&generator, &[1, alpha_pow(i as isize)]);
        }
        Self { parity_len, generator }
    }

    pub fn parity_len(&self) -> usize {
        self.parity_len
    }

    /// Symbol errors correctable per block: `parity_len / 2`.
    pub fn correction_capacity(&self) -> usize {
        self.parity_len / 2
    }

    /// Largest data length a single block can carry.
    pub fn max_data_len(&self) -> usize {
        N_MAX - self.parity_len
    }

    /// Systematic encode: returns `data || parity`.
    ///
    /// # Panics
    /// Panics if `data.len() > self.max_data_len()`.
    pub fn encode(&self, data: &[u8]) -> Vec<u8> {
        assert!(
            data.len() <= self.max_data_len(),
            "data length {} exceeds max {} for parity {}",
            data.len(),
            self.max_data_len(),
            self.parity_len
        );

        let n = self.parity_len;
        let gpoly = &self.generator;
        let mut shift_reg = vec![0u8; n];
        for &byte in data {
            let feedback = byte ^ shift_reg[0];
            for j in 0..n - 1 {
                shift_reg[j] = shift_reg[j + 1] ^ gf_mul(feedback, gpoly[j + 1]);
            }
            shift_reg[n - 1] = gf_mul(feedback, gpoly[n]);
        }

        let mut encoded = Vec::with_capacity(data.len() + n);
        encoded.extend_from_slice(data);
        encoded.extend_from_slice(&shift_reg);
        encoded
    }

    /// Decode a received block of `data_len + parity_len` symbols.
    ///
    /// Returns the corrected data (parity stripped) and the number of symbol
    /// errors corrected. Blocks no longer than the parity, or longer than
    /// 255 symbols, are rejected as undecodable rather than panicking.
    pub fn decode(&self, received: &[u8]) -> Result<(Vec<u8>, usize), RsDecodeError> {
        let len = received.len();
        if len <= self.parity_len || len > N_MAX {
            return Err(RsDecodeError);
        }
        let data_len = len - self.parity_len;

        // Leading zeros of the shortened code do not change r(α^i).
        let syndromes = self.syndromes(received);
        if syndromes.iter().all(|&s| s == 0) {
            return Ok((received[..data_len].to_vec(), 0));
        }

        let sigma = berlekamp_massey(&syndromes);
        let num_errors = sigma.len() - 1;
        if num_errors == 0 || num_errors > self.correction_capacity() {
            return Err(RsDecodeError);
        }

        let positions = chien_search(&sigma, len).ok_or(RsDecodeError)?;
        let magnitudes = forney(&sigma, &syndromes, &positions);

        let mut corrected = received.to_vec();
        for (&(_, index), &magnitude) in positions.iter().zip(&magnitudes) {
            if magnitude == 0 {
                return Err(RsDecodeError);
            }
            corrected[index] ^= magnitude;
        }

        if self.syndromes(&corrected).iter().any(|&s| s != 0) {
            return Err(RsDecodeError);
        }

        corrected.truncate(data_len);
        Ok((corrected, num_errors))
    }

    /// S_i = r(α^i) for i in 0..parity_len.
    fn syndromes(&self, received: &[u8]) -> Vec<u8> {
        (0..self.parity_len)
            .map(|i| poly_eval(received, alpha_pow(i as isize)))
            .collect()
    }

    #[cfg(test)]
    fn generator(&self) -> &[u8] {
        &self.generator
    }
}

/// Berlekamp-Massey: error locator σ(x) in ascending powers, `σ[0] = 1`,
/// trimmed to degree L.
fn berlekamp_massey(syndromes: &[u8]) -> Vec<u8> {
    let mut c = vec![1u8];
    let mut b = vec![1u8];
    let mut ell = 0usize;
    let mut bval = 1u8;
    let mut m = 1usize;

    for r in 0..syndromes.len() {
        let mut delta = syndromes[r];
        for i in 1..=ell.min(c.len() - 1) {
            delta ^= gf_mul(c[i], syndromes[r - i]);
        }

        if delta == 0 {
            m += 1;
            continue;
        }

        let factor = gf_mul(delta, gf_inv(bval));
        let previous = c.clone();
        if c.len() < b.len() + m {
            c.resize(b.len() + m, 0);
        }
        for (j, &bj) in b.iter().enumerate() {
            c[j + m] ^= gf_mul(factor, bj);
        }

        if 2 * ell <= r {
            ell = r + 1 - ell;
            b = previous;
            bval = delta;
            m = 1;
        } else {
            m += 1;
        }
    }

    c.resize(ell + 1, 0);
    c
}

/// Chien search over the positions of a `len`-symbol block.
///
/// An error at array index k sits at exponent p = len-1-k, and σ has a root
/// at α^{-p}. Returns `(p, k)` pairs, or `None` when σ does not have exactly
/// deg σ distinct roots inside the block (roots in the implicit zero padding
/// of a shortened code count as failure).
fn chien_search(sigma: &[u8], len: usize) -> Option<Vec<(usize, usize)>> {
    let degree = sigma.len() - 1;
    let mut found = Vec::with_capacity(degree);
    for p in 0..len {
        if eval_asc(sigma, alpha_pow(-(p as isize))) == 0 {
            found.push((p, len - 1 - p));
        }
    }
    (found.len() == degree).then_some(found)
}

/// Forney with FCR=0: e = X · Ω(X⁻¹) / σ'(X⁻¹), Ω = S·σ mod x^{2t}.
fn forney(sigma: &[u8], syndromes: &[u8], positions: &[(usize, usize)]) -> Vec<u8> {
    let two_t = syndromes.len();

    let mut omega = vec![0u8; two_t];
    for (i, &s) in sigma.iter().enumerate().take(two_t) {
        for (j, &syn) in syndromes.iter().enumerate().take(two_t - i) {
            omega[i + j] ^= gf_mul(s, syn);
        }
    }

    // Formal derivative: only odd powers survive in characteristic 2.
    let mut sigma_prime = vec![0u8; sigma.len().saturating_sub(1)];
    for i in (1..sigma.len()).step_by(2) {
        sigma_prime[i - 1] = sigma[i];
    }

    positions
        .iter()
        .map(|&(p, _)| {
            let x = alpha_pow(p as isize);
            let x_inv = alpha_pow(-(p as isize));
            let denom = eval_asc(&sigma_prime, x_inv);
            if denom == 0 {
                0
            } else {
                gf_mul(x, gf_mul(eval_asc(&omega, x_inv), gf_inv(denom)))
            }
        })
        .collect()
}
