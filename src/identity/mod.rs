// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Identity resolution for recovered signature tokens.
//!
//! A recovered token is `"<sender><-><receiver>"`, possibly with a few
//! wrong characters if it came from a damaged image's hint. Each half is
//! compared with every known code: exact equality first, then
//! [`similarity_ratio`] against a threshold. One matching side is enough
//! for a partial match; malformed input never fails, it just matches
//! nothing.

pub mod similarity;

use std::collections::BTreeMap;

use tracing::debug;

use crate::mark::signature::SEPARATOR;

pub use similarity::similarity_ratio;

/// Similarity needed for an approximate match.
pub const DEFAULT_THRESHOLD: f64 = 0.7;

/// Display text for a side that matched nobody.
pub const UNKNOWN: &str = "unknown";

/// A known account: display name bound to a code such as `USR_0001`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub code: String,
}

impl Identity {
    /// `"name (CODE)"`.
    pub fn display(&self) -> String {
        format!("{} ({})", self.name, self.code)
    }
}

/// One side of a resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityMatch {
    pub identity: Identity,
    /// 1.0 for an exact match.
    pub similarity: f64,
}

impl IdentityMatch {
    pub fn is_exact(&self) -> bool {
        self.similarity >= 1.0
    }
}

/// Best-effort reading of a raw token.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// The token with control characters removed.
    pub cleaned: String,
    pub sender: Option<IdentityMatch>,
    pub receiver: Option<IdentityMatch>,
}

impl Resolution {
    /// At least one side was recognized.
    pub fn matched(&self) -> bool {
        self.sender.is_some() || self.receiver.is_some()
    }

    /// Both sides were recognized.
    pub fn is_complete(&self) -> bool {
        self.sender.is_some() && self.receiver.is_some()
    }

    pub fn sender_display(&self) -> String {
        side_display(&self.sender)
    }

    pub fn receiver_display(&self) -> String {
        side_display(&self.receiver)
    }

    /// `(matched, sender_display, receiver_display, cleaned_text)`.
    pub fn into_tuple(self) -> (bool, String, String, String) {
        (self.matched(), self.sender_display(), self.receiver_display(), self.cleaned)
    }
}

fn side_display(side: &Option<IdentityMatch>) -> String {
    side.as_ref().map_or_else(|| UNKNOWN.to_string(), |m| m.identity.display())
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Sender,
    Receiver,
}

/// Matches tokens against a read-only set of known identities.
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    identities: Vec<Identity>,
    threshold: f64,
}

impl IdentityResolver {
    /// Build from `(name, code)` pairs. Entries with an empty code are
    /// ignored; order of the input does not matter.
    pub fn new<I, N, C>(known: I) -> Self
    where
        I: IntoIterator<Item = (N, C)>,
        N: Into<String>,
        C: Into<String>,
    {
        let mut identities: Vec<Identity> = known
            .into_iter()
            .map(|(name, code)| Identity { name: name.into(), code: code.into() })
            .filter(|id| !id.code.is_empty())
            .collect();
        identities.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.code.cmp(&b.code)));
        Self { identities, threshold: DEFAULT_THRESHOLD }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn identities(&self) -> &[Identity] {
        &self.identities
    }

    pub fn resolve(&self, raw: &str) -> Resolution {
        let cleaned: String = raw.chars().filter(|c| !c.is_control()).collect();
        let (sender, receiver) = match cleaned.split_once(SEPARATOR) {
            Some((left, right)) => (
                self.best_match(left.trim(), Side::Sender),
                self.best_match(right.trim(), Side::Receiver),
            ),
            None => (None, None),
        };
        debug!(
            token = %cleaned,
            sender = sender.as_ref().map(|m| m.similarity),
            receiver = receiver.as_ref().map(|m| m.similarity),
            "resolved token"
        );
        Resolution { cleaned, sender, receiver }
    }

    /// Best code for one half. The sender code is compared with the tail of
    /// the left half and the receiver code with the head of the right half,
    /// each cut to the code's length. Exact beats approximate; ties keep the
    /// first identity by name.
    fn best_match(&self, half: &str, side: Side) -> Option<IdentityMatch> {
        let chars: Vec<char> = half.chars().collect();
        let mut best: Option<IdentityMatch> = None;

        for identity in &self.identities {
            let n = identity.code.chars().count().min(chars.len());
            let fragment: String = match side {
                Side::Sender => chars[chars.len() - n..].iter().collect(),
                Side::Receiver => chars[..n].iter().collect(),
            };
            let similarity = if fragment == identity.code {
                1.0
            } else {
                similarity_ratio(&fragment, &identity.code)
            };
            if similarity < self.threshold {
                continue;
            }
            if best.as_ref().map_or(true, |b| similarity > b.similarity) {
                best = Some(IdentityMatch { identity: identity.clone(), similarity });
            }
        }
        best
    }
}

/// Resolve `raw_token` against a `name -> code` map:
/// `(matched, sender_display, receiver_display, cleaned_text)`.
pub fn resolve_identity(raw_token: &str, known: &BTreeMap<String, String>) -> (bool, String, String, String) {
    IdentityResolver::new(known.iter().map(|(n, c)| (n.as_str(), c.as_str())))
        .resolve(raw_token)
        .into_tuple()
}
