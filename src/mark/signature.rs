// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Provenance signatures: `"<SENDER_CODE><-><RECEIVER_CODE>"`.

use std::fmt;
use std::str::FromStr;

use super::error::WatermarkError;

/// Token between sender and receiver codes.
pub const SEPARATOR: &str = "<->";

/// A validated sender/receiver pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    sender: String,
    receiver: String,
}

impl Signature {
    pub fn new(sender: impl Into<String>, receiver: impl Into<String>) -> Result<Self, WatermarkError> {
        let sender = sender.into();
        let receiver = receiver.into();
        check_code("sender", &sender)?;
        check_code("receiver", &receiver)?;
        Ok(Self { sender, receiver })
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn receiver(&self) -> &str {
        &self.receiver
    }
}

fn check_code(role: &str, code: &str) -> Result<(), WatermarkError> {
    let reason = if code.is_empty() {
        "is empty"
    } else if code.contains(SEPARATOR) {
        "contains the separator"
    } else if code.chars().any(|c| c.is_control() || c.is_whitespace()) {
        "contains whitespace or control characters"
    } else {
        return Ok(());
    };
    Err(WatermarkError::InvalidSignature(format!("{role} code {code:?} {reason}")))
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SEPARATOR}{}", self.sender, self.receiver)
    }
}

impl FromStr for Signature {
    type Err = WatermarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (sender, receiver) = s.split_once(SEPARATOR).ok_or_else(|| {
            WatermarkError::InvalidSignature(format!("{s:?} has no {SEPARATOR} separator"))
        })?;
        Self::new(sender, receiver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parse_agree() {
        let sig = Signature::new("USR_0001", "USR_0002").unwrap();
        assert_eq!(sig.to_string(), "USR_0001<->USR_0002");
        assert_eq!("USR_0001<->USR_0002".parse::<Signature>().unwrap(), sig);
    }

    #[test]
    fn separator_inside_code_is_rejected() {
        assert!(Signature::new("A<->B", "C").is_err());
        assert!("A<->B<->C".parse::<Signature>().is_err());
    }

    #[test]
    fn missing_parts_are_rejected() {
        assert!("USR_0001".parse::<Signature>().is_err());
        assert!("<->USR_0002".parse::<Signature>().is_err());
        assert!(Signature::new("USR 1", "USR_2").is_err());
    }
}
