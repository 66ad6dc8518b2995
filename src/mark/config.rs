// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Watermark parameters.
//!
//! One canonical scheme, parameterized: carrier channel, coefficient pair,
//! marker, redundancy and strength are all configuration. Embedder and
//! extractor must agree on everything except the search limits.

use serde::{Deserialize, Serialize};

use super::error::{Result, WatermarkError};
use super::modulation::CoefficientPair;

/// Colour component used as the carrier.
///
/// Grayscale images always use their single luma plane regardless of this
/// setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CarrierChannel {
    Red,
    #[default]
    Green,
    Blue,
}

impl CarrierChannel {
    /// Component index in an RGB(A) pixel.
    pub fn index(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Green => 1,
            Self::Blue => 2,
        }
    }
}

/// Full configuration for embedding and extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkConfig {
    /// Colour component carrying the watermark.
    pub carrier: CarrierChannel,
    /// Prefix that identifies a genuine decode.
    pub marker: String,
    /// Reed-Solomon parity bytes; `parity_len / 2` byte errors are corrected.
    pub parity_len: usize,
    /// The two DCT positions whose order encodes a bit.
    pub pair: CoefficientPair,
    /// Initial target separation α between the pair values.
    pub strength: f64,
    /// Added to α after each failed round-trip check.
    pub strength_step: f64,
    /// Separation that must survive the simulated round trip.
    pub margin: f64,
    /// Bound on strength attempts per block.
    pub max_attempts: u32,
    /// Longest signature (bytes) accepted by the embedder and searched for
    /// by the extractor.
    pub max_signature_len: usize,
    /// Stop searching once one signature has this many votes.
    pub early_exit_votes: usize,
    /// Cap on Reed-Solomon decode attempts per extraction.
    pub max_decode_attempts: usize,
    /// How many of the strongest alignments get the stride-fold search.
    pub fold_alignments: usize,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            carrier: CarrierChannel::Green,
            marker: "###".to_string(),
            parity_len: 16,
            pair: CoefficientPair::default(),
            strength: 40.0,
            strength_step: 10.0,
            margin: 30.0,
            max_attempts: 5,
            max_signature_len: 40,
            early_exit_votes: 3,
            max_decode_attempts: 200_000,
            fold_alignments: 4,
        }
    }
}

impl WatermarkConfig {
    /// Reject out-of-range values before any work is done.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(WatermarkError::InvalidConfig(msg));

        if self.parity_len < 2 || self.parity_len > 128 {
            return fail(format!("parity_len {} outside 2..=128", self.parity_len));
        }
        let room = 255 - self.parity_len;
        if self.marker.len() >= room {
            return fail(format!("marker of {} bytes leaves no payload room", self.marker.len()));
        }
        if self.marker.chars().any(char::is_control) {
            return fail("marker contains control characters".to_string());
        }
        if !self.pair.is_valid() {
            return fail(format!("coefficient pair {:?} is not two distinct AC positions", self.pair));
        }
        if !(self.margin.is_finite() && self.margin > 0.0) {
            return fail(format!("margin {} must be positive", self.margin));
        }
        if !(self.strength.is_finite() && self.strength >= self.margin) {
            return fail(format!("strength {} must be at least the margin {}", self.strength, self.margin));
        }
        if !(self.strength_step.is_finite() && self.strength_step >= 0.0) {
            return fail(format!("strength_step {} must be non-negative", self.strength_step));
        }
        if self.max_attempts == 0 {
            return fail("max_attempts must be at least 1".to_string());
        }
        if self.max_signature_len == 0 {
            return fail("max_signature_len must be at least 1".to_string());
        }
        if self.early_exit_votes == 0 {
            return fail("early_exit_votes must be at least 1".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        WatermarkConfig::default().validate().unwrap();
    }

    #[test]
    fn strength_below_margin_is_rejected() {
        let config = WatermarkConfig { strength: 10.0, ..Default::default() };
        assert!(matches!(config.validate(), Err(WatermarkError::InvalidConfig(_))));
    }

    #[test]
    fn bad_parity_is_rejected() {
        for parity_len in [0, 1, 200] {
            let config = WatermarkConfig { parity_len, ..Default::default() };
            assert!(config.validate().is_err(), "parity {parity_len}");
        }
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: WatermarkConfig =
            serde_json::from_str(r#"{ "carrier": "blue", "strength": 55.0 }"#).unwrap();
        assert_eq!(config.carrier, CarrierChannel::Blue);
        assert_eq!(config.strength, 55.0);
        assert_eq!(config.parity_len, WatermarkConfig::default().parity_len);
        assert_eq!(config.marker, "###");
    }
}
