//! Character attributes skills and bonuses refer to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A primary or secondary attribute.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attribute {
    /// Strength.
    St,
    /// Dexterity.
    Dx,
    /// Intelligence.
    Iq,
    /// Health.
    Ht,
    /// Will.
    Will,
    /// Perception.
    Per,
}

impl Attribute {
    /// Every attribute, in sheet order.
    pub const ALL: [Attribute; 6] = [
        Attribute::St,
        Attribute::Dx,
        Attribute::Iq,
        Attribute::Ht,
        Attribute::Will,
        Attribute::Per,
    ];

    /// The short name shown on a sheet.
    pub fn abbreviation(self) -> &'static str {
        match self {
            Attribute::St => "ST",
            Attribute::Dx => "DX",
            Attribute::Iq => "IQ",
            Attribute::Ht => "HT",
            Attribute::Will => "Will",
            Attribute::Per => "Per",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

/// Error returned when a string names no attribute.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown attribute: {0}")]
pub struct UnknownAttribute(pub String);

impl FromStr for Attribute {
    type Err = UnknownAttribute;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Attribute::ALL
            .into_iter()
            .find(|attr| attr.abbreviation().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownAttribute(s.to_string()))
    }
}
