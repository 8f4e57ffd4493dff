//! Bounded action tokens
//!
//! A token is `prefix#fingerprint#i[#j[#k]]`: an ASCII namespace prefix, the
//! 32-bit fingerprint of the listing it was issued against, and the
//! positions chosen at each level. Names never appear in a token, so its
//! length does not depend on how long the names are.

use crate::core::error::{AppError, AppResult};

/// Telegram caps callback data at 64 bytes
pub const MAX_TOKEN_LEN: usize = 64;

/// Longest prefix accepted by [`encode`]; keeps the worst case under the cap
pub const MAX_PREFIX_LEN: usize = 8;

/// Deepest path a token can carry (category, subcategory, name)
pub const MAX_DEPTH: usize = 3;

const SEPARATOR: char = '#';

/// Position inside a sorted listing
pub type Position = u32;

/// Decoded token payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub fingerprint: u32,
    pub positions: Vec<Position>,
}

impl Address {
    pub fn new(fingerprint: u32, positions: Vec<Position>) -> Self {
        Self {
            fingerprint,
            positions,
        }
    }

    pub fn depth(&self) -> usize {
        self.positions.len()
    }
}

/// Converts a listing index into a token position.
///
/// Indices beyond `u32` cannot come from a real listing; they saturate and
/// later resolve as stale.
pub fn position(index: usize) -> Position {
    Position::try_from(index).unwrap_or(Position::MAX)
}

/// Builds a token. Pure and deterministic.
///
/// # Examples
/// ```
/// use chanpost::navigation::token::encode;
///
/// assert_eq!(encode("tpl:v", 7, &[0, 2, 1]), "tpl:v#7#0#2#1");
/// ```
pub fn encode(prefix: &str, fingerprint: u32, positions: &[Position]) -> String {
    debug_assert!(prefix.len() <= MAX_PREFIX_LEN && !prefix.contains(SEPARATOR));
    debug_assert!(positions.len() <= MAX_DEPTH);

    let mut token = String::with_capacity(MAX_TOKEN_LEN);
    token.push_str(prefix);
    token.push(SEPARATOR);
    token.push_str(&fingerprint.to_string());
    for p in positions {
        token.push(SEPARATOR);
        token.push_str(&p.to_string());
    }
    token
}

/// Parses a token issued with `prefix` and exactly `arity` positions.
///
/// Anything else (other prefix, wrong number of fields, non-numeric or
/// signed fields) is `MalformedToken`.
pub fn decode(token: &str, prefix: &str, arity: usize) -> AppResult<Address> {
    let malformed = || AppError::MalformedToken(token.to_string());

    if token.len() > MAX_TOKEN_LEN {
        return Err(malformed());
    }
    let mut parts = token.split(SEPARATOR);
    if parts.next() != Some(prefix) {
        return Err(malformed());
    }
    let fingerprint = parts.next().and_then(parse_number::<u32>).ok_or_else(malformed)?;
    let positions = parts
        .map(|p| parse_number::<Position>(p).ok_or_else(malformed))
        .collect::<AppResult<Vec<_>>>()?;
    if positions.len() != arity {
        return Err(malformed());
    }
    Ok(Address::new(fingerprint, positions))
}

/// Strict decimal: digits only, no sign, no whitespace
fn parse_number<T: std::str::FromStr>(raw: &str) -> Option<T> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_round_trips_encoded_token() {
        let token = encode("tpl:s", 4_000_000_000, &[3, 12]);
        assert_eq!(decode(&token, "tpl:s", 2).unwrap(), Address::new(4_000_000_000, vec![3, 12]));
    }

    #[test]
    fn test_worst_case_fits_budget() {
        let token = encode("12345678", u32::MAX, &[u32::MAX, u32::MAX, u32::MAX]);
        assert!(token.len() <= MAX_TOKEN_LEN, "{} bytes", token.len());
    }

    #[test]
    fn test_decode_rejects_malformed() {
        for bad in [
            "tpl:v#1#0#0",
            "tpl:v#1#0#0#0#0",
            "tpl:v#x#0#0#0",
            "tpl:v#1#0#-1#0",
            "tpl:v#1#0# 1#0",
            "tpl:v#1#0##0",
            "tpl:c#1#0#0#0",
            "",
        ] {
            assert!(
                matches!(decode(bad, "tpl:v", 3), Err(AppError::MalformedToken(_))),
                "{:?} must be malformed",
                bad
            );
        }
    }

    #[test]
    fn test_decode_rejects_overflowing_numbers() {
        assert!(matches!(decode("m:dp#99999999999#0", "m:dp", 1), Err(AppError::MalformedToken(_))));
    }

    #[test]
    fn test_position_saturates() {
        assert_eq!(position(5), 5);
        assert_eq!(position(usize::MAX), Position::MAX);
    }
}
