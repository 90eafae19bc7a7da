//! Points type settings.
//!
//! A points type is a named currency partition. Balances and log entries are
//! always scoped to exactly one points type, identified by its slug. The
//! slug is derived from the display name at creation and is immutable.

use serde::{Deserialize, Serialize};

/// Settings for one points type.
///
/// Replaces the loose associative settings of the original system with named
/// optional fields. Unset optional fields fall back to defaults: minimum 0,
/// storage key `tally_points-{slug}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsType {
    /// Display name, e.g. `"Points"`. Also the source of the slug.
    pub name: String,

    /// String prepended when formatting a value for display, e.g. `"$"`.
    #[serde(default)]
    pub prefix: String,

    /// String appended when formatting a value for display, e.g. `"pts"`.
    #[serde(default)]
    pub suffix: String,

    /// Minimum balance override. `None` means the global default of 0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<i64>,

    /// Balance storage key override. `None` derives the key from the slug.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_key: Option<String>,
}

impl PointsType {
    /// Create a points type with the given display name and defaults for
    /// everything else.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: String::new(),
            suffix: String::new(),
            minimum: None,
            storage_key: None,
        }
    }

    /// The balance store row-key namespace for this type.
    ///
    /// The configured override wins; otherwise the key is derived from the
    /// slug so that distinct types can never collide.
    #[must_use]
    pub fn storage_key(&self, slug: &str) -> String {
        self.storage_key
            .clone()
            .unwrap_or_else(|| format!("tally_points-{slug}"))
    }

    /// The minimum balance this type may settle at, before override filters.
    #[must_use]
    pub fn base_minimum(&self) -> i64 {
        self.minimum.unwrap_or(0)
    }

    /// Format a points value for display with this type's prefix and suffix.
    #[must_use]
    pub fn format(&self, value: i64) -> String {
        format!("{}{value}{}", self.prefix, self.suffix)
    }
}

/// Derive a slug from a points type display name.
///
/// Lowercases the name and keeps only alphanumerics, `-` and `_`, mapping
/// whitespace runs to a single `-`.
///
/// # Errors
///
/// Returns `SlugError::Empty` if nothing usable remains.
pub fn points_type_slug(name: &str) -> Result<String, SlugError> {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_sep = true;

    for ch in name.trim().chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
            slug.extend(ch.to_lowercase());
            last_was_sep = false;
        } else if ch.is_whitespace() && !last_was_sep {
            slug.push('-');
            last_was_sep = true;
        }
    }

    let slug = slug.trim_end_matches('-').to_string();

    if slug.is_empty() {
        return Err(SlugError::Empty);
    }

    Ok(slug)
}

/// Errors that can occur when deriving a points type slug.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlugError {
    /// The name contains no slug-safe characters.
    #[error("points type name produces an empty slug")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_from_name() {
        assert_eq!(points_type_slug("Points").unwrap(), "points");
        assert_eq!(points_type_slug("Karma  Points").unwrap(), "karma-points");
        assert_eq!(points_type_slug("  gold_coins! ").unwrap(), "gold_coins");
    }

    #[test]
    fn slug_rejects_unusable_names() {
        assert_eq!(points_type_slug("!!!"), Err(SlugError::Empty));
        assert_eq!(points_type_slug("   "), Err(SlugError::Empty));
    }

    #[test]
    fn storage_key_default_and_override() {
        let mut pt = PointsType::named("Points");
        assert_eq!(pt.storage_key("points"), "tally_points-points");

        pt.storage_key = Some("legacy_points".into());
        assert_eq!(pt.storage_key("points"), "legacy_points");
    }

    #[test]
    fn format_applies_prefix_and_suffix() {
        let mut pt = PointsType::named("Credits");
        pt.prefix = "$".into();
        assert_eq!(pt.format(50), "$50");

        pt.prefix = String::new();
        pt.suffix = "pts".into();
        assert_eq!(pt.format(-3), "-3pts");
    }

    #[test]
    fn base_minimum_defaults_to_zero() {
        let mut pt = PointsType::named("Points");
        assert_eq!(pt.base_minimum(), 0);
        pt.minimum = Some(-100);
        assert_eq!(pt.base_minimum(), -100);
    }
}
