// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Extract, then resolve the recovered token against known identities.

use tracing::{info, instrument};

use crate::identity::{IdentityResolver, Resolution};
use crate::raster::Channel;

use super::config::WatermarkConfig;
use super::error::Result;
use super::extract::{extract_channel, Extraction};

/// Outcome of [`verify_channel`].
#[derive(Debug, Clone, PartialEq)]
pub struct Verification {
    pub extraction: Extraction,
    /// Resolution of the decoded signature, or of the raw hint when nothing
    /// decoded. `None` when there was neither.
    pub resolution: Option<Resolution>,
}

impl Verification {
    /// A signature decoded and at least one side is a known identity.
    pub fn is_attributed(&self) -> bool {
        self.extraction.is_found() && self.resolution.as_ref().is_some_and(Resolution::matched)
    }
}

#[instrument(skip_all, fields(known = resolver.identities().len()))]
pub fn verify_channel(channel: &Channel, resolver: &IdentityResolver, config: &WatermarkConfig) -> Result<Verification> {
    let extraction = extract_channel(channel, config)?;
    let token = extraction.signature().or_else(|| extraction.hint());
    let resolution = token.map(|t| resolver.resolve(t));
    if let Some(r) = &resolution {
        info!(
            found = extraction.is_found(),
            sender = %r.sender_display(),
            receiver = %r.receiver_display(),
            "verification"
        );
    }
    Ok(Verification { extraction, resolution })
}
