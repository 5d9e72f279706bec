//! Seed field handling.
//!
//! The seed is edited as free text; an empty field means "let the server
//! choose".

use rand::Rng;

use crate::error::CoreError;

/// Exclusive upper bound for randomly chosen seeds (32-bit range).
pub const MAX_RANDOM_SEED: i64 = 4_294_967_295;

/// A fresh random seed in `0..MAX_RANDOM_SEED`.
pub fn random_seed() -> i64 {
    rand::rng().random_range(0..MAX_RANDOM_SEED)
}

/// Parse the editable seed field.
pub fn parse_seed(raw: &str) -> Result<Option<i64>, CoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.parse::<i64>() {
        Ok(seed) if seed >= 0 => Ok(Some(seed)),
        _ => Err(CoreError::Validation(format!(
            "Seed must be a non-negative integer, got '{trimmed}'"
        ))),
    }
}

/// Render a resolved seed back into the editable field.
pub fn format_seed(seed: Option<i64>) -> String {
    seed.map(|s| s.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_field_means_server_choice() {
        assert_eq!(parse_seed("").unwrap(), None);
        assert_eq!(parse_seed("   ").unwrap(), None);
    }

    #[test]
    fn numeric_field_parses() {
        assert_eq!(parse_seed(" 123 ").unwrap(), Some(123));
    }

    #[test]
    fn garbage_and_negative_rejected() {
        assert!(parse_seed("abc").is_err());
        assert!(parse_seed("-4").is_err());
    }

    #[test]
    fn random_seed_in_range() {
        for _ in 0..100 {
            let seed = random_seed();
            assert!((0..MAX_RANDOM_SEED).contains(&seed));
        }
    }

    #[test]
    fn format_round_trips_through_field() {
        assert_eq!(format_seed(Some(123)), "123");
        assert_eq!(format_seed(None), "");
    }
}
