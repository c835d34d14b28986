//! Human-readable identifiers for Services and Providers.
//!
//! Slugs are immutable once created, unique per collection and URL-safe:
//! lowercase alphanumerics and hyphens only.

use crate::errors::ModelError;

pub fn validate_slug(slug: &str) -> Result<(), ModelError> {
    if slug.is_empty() || slug.len() > 64 {
        return Err(ModelError::Validation("id must be 1-64 characters".into()));
    }
    if !slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
        return Err(ModelError::Validation(
            "id may only contain lowercase letters, digits and hyphens".into(),
        ));
    }
    Ok(())
}

/// Lowercase an incoming identifier before validation, mirroring the
/// case-folding the store applies on lookup.
pub fn normalize_slug(slug: &str) -> String {
    slug.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_simple_slugs() {
        assert!(validate_slug("hair-cuts-2").is_ok());
    }

    #[test]
    fn rejects_uppercase_and_spaces() {
        assert!(validate_slug("Hair").is_err());
        assert!(validate_slug("hair cuts").is_err());
        assert!(validate_slug("").is_err());
    }

    #[test]
    fn normalize_lowercases_and_trims() {
        assert_eq!(normalize_slug("  Hair-Cuts "), "hair-cuts");
    }
}
