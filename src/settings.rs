//! Sheet settings.
//!
//! `SheetSettings` holds the knobs a character document passes to the
//! engine. Settings are loaded from a JSON object; any key left out keeps
//! its default, so a partial settings file is valid.

use crate::error::DocumentError;
use crate::nameable::DEFAULT_MARKER;
use serde::{Deserialize, Serialize};

/// Per-document engine configuration.
///
/// # Examples
///
/// ```rust
/// use gurps_bonus::SheetSettings;
///
/// let settings = SheetSettings::from_json(r#"{ "allow_default_chains": true }"#).unwrap();
/// assert!(settings.allow_default_chains);
/// assert_eq!(settings.nameable_marker, '@');
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetSettings {
    /// Character bounding nameable placeholders.
    pub nameable_marker: char,
    /// Let a skill default from another skill that is itself only known
    /// through a default.
    pub allow_default_chains: bool,
    /// List each bonus in level tooltips instead of only the total.
    pub include_bonus_breakdown: bool,
}

impl SheetSettings {
    /// Create settings with every default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from a JSON object, defaulting missing keys.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Render as JSON.
    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Default for SheetSettings {
    fn default() -> Self {
        Self {
            nameable_marker: DEFAULT_MARKER,
            allow_default_chains: false,
            include_bonus_breakdown: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings = SheetSettings::from_json("{}").unwrap();
        assert_eq!(settings, SheetSettings::default());
    }

    #[test]
    fn test_settings_partial() {
        let settings = SheetSettings::from_json(r#"{ "nameable_marker": "%" }"#).unwrap();
        assert_eq!(settings.nameable_marker, '%');
        assert!(settings.include_bonus_breakdown);
    }

    #[test]
    fn test_settings_rejects_bad_json() {
        assert!(SheetSettings::from_json("{ nope").is_err());
    }
}
