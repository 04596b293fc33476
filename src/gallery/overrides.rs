// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Wire codec for tri-state override values. Admin payloads carry overrides
//! as string tokens; `None` ("inherit") is a first-class value and must
//! survive every decode/encode round trip.

use crate::gallery::{MAX_COLUMNS, MIN_COLUMNS, Transition};

pub const INHERIT_TOKEN: &str = "inherit";

const TRUE_TOKENS: &[&str] = &["1", "true", "yes", "on"];
const FALSE_TOKENS: &[&str] = &["0", "false", "no", "off"];

fn is_inherit(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case(INHERIT_TOKEN)
}

/// Decode a boolean override token. Unrecognized non-empty tokens coerce via
/// generic truthiness (non-empty and not "0" is true); stored payloads from
/// older admin clients rely on that fallback.
pub fn decode_bool_override(raw: &str) -> Option<bool> {
    if is_inherit(raw) {
        return None;
    }
    let token = raw.trim().to_ascii_lowercase();
    if TRUE_TOKENS.contains(&token.as_str()) {
        return Some(true);
    }
    if FALSE_TOKENS.contains(&token.as_str()) {
        return Some(false);
    }
    log::debug!("Unrecognized bool override token '{}', coercing", raw);
    Some(token != "0")
}

/// Decode an integer override token, clamped into `[min, max]`.
pub fn decode_int_override(raw: &str, min: i64, max: i64) -> Option<i64> {
    if is_inherit(raw) {
        return None;
    }
    match raw.trim().parse::<i64>() {
        Ok(value) => Some(value.clamp(min, max)),
        Err(_) => {
            log::debug!("Unrecognized int override token '{}', inheriting", raw);
            None
        }
    }
}

pub fn decode_columns_override(raw: &str) -> Option<u8> {
    decode_int_override(raw, MIN_COLUMNS as i64, MAX_COLUMNS as i64).map(|value| value as u8)
}

/// Decode a transition override token. Unknown effects inherit rather than
/// fail; the viewer treats a missing effect as the global one.
pub fn decode_transition_override(raw: &str) -> Option<Transition> {
    if is_inherit(raw) {
        return None;
    }
    Transition::parse(raw)
}

pub fn encode_bool_override(value: Option<bool>) -> String {
    match value {
        None => INHERIT_TOKEN.to_string(),
        Some(true) => "1".to_string(),
        Some(false) => "0".to_string(),
    }
}

pub fn encode_columns_override(value: Option<u8>) -> String {
    match value {
        None => INHERIT_TOKEN.to_string(),
        Some(columns) => columns.to_string(),
    }
}

pub fn encode_transition_override(value: Option<Transition>) -> String {
    match value {
        None => INHERIT_TOKEN.to_string(),
        Some(transition) => transition.as_str().to_string(),
    }
}
