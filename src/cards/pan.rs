// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Card number (PAN) recognition.
//!
//! | Network | Prefix | Length |
//! |---------|--------|--------|
//! | Visa | `4` | 13 or 16 |
//! | MasterCard | `51`-`55` | 16 |
//! | American Express | `34`, `37` | 15 |
//! | Discover | `6011`, `65` | 16 |
//! | JCB | `2131`, `1800` | 15 |
//! | JCB | `35` | 16 |

use base64ct::{Base64, Encoding};
use serde::Serialize;

use super::CardError;

/// Number of leading digits kept in the relational store.
pub const RESIDUE_LEN: usize = 4;

/// Card networks accepted by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CardNetwork {
    Visa,
    MasterCard,
    AmericanExpress,
    Discover,
    Jcb,
}

/// Identify the network of a digit string, or `None` if it matches no
/// accepted network.
pub fn detect_network(pan: &str) -> Option<CardNetwork> {
    if pan.is_empty() || !pan.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let len = pan.len();
    let second = pan.as_bytes().get(1).copied().unwrap_or_default();

    if pan.starts_with('4') && (len == 13 || len == 16) {
        Some(CardNetwork::Visa)
    } else if pan.starts_with('5') && (b'1'..=b'5').contains(&second) && len == 16 {
        Some(CardNetwork::MasterCard)
    } else if (pan.starts_with("34") || pan.starts_with("37")) && len == 15 {
        Some(CardNetwork::AmericanExpress)
    } else if (pan.starts_with("6011") || pan.starts_with("65")) && len == 16 {
        Some(CardNetwork::Discover)
    } else if ((pan.starts_with("2131") || pan.starts_with("1800")) && len == 15)
        || (pan.starts_with("35") && len == 16)
    {
        Some(CardNetwork::Jcb)
    } else {
        None
    }
}

/// Whether the digit string is a card number of an accepted network.
pub fn is_valid_card_number(pan: &str) -> bool {
    detect_network(pan).is_some()
}

/// The part of a validated PAN that may be persisted.
pub fn residue(pan: &str) -> &str {
    &pan[..RESIDUE_LEN.min(pan.len())]
}

/// Decode the base64 plaintext returned by the transit engine into the
/// card's digit string.
pub fn decode_plaintext(plaintext: &str) -> Result<String, CardError> {
    let bytes = Base64::decode_vec(plaintext.trim())
        .map_err(|e| CardError::Decode(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| CardError::Decode(e.to_string()))
}
