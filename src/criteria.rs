//! Criteria module.
//!
//! Criteria are the typed predicates features use to decide whether they
//! apply to a trait. A criteria pairs a compare type with a qualifier and
//! answers `matches(candidate)` as a pure, total function.
//!
//! String comparisons follow one policy throughout the crate: `Is` and
//! `IsNot` compare the full qualifier case-sensitively, every other string
//! compare type ignores case.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// How a [`StringCriteria`] compares its qualifier against a candidate.
///
/// `Unrecognized` only comes out of loading a document whose compare token
/// this build does not know. It matches everything and saves back the
/// token it was loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StringCompareType {
    /// Any value, including the empty string.
    IsAnything,
    /// Exact, case-sensitive equality.
    Is,
    /// Exact, case-sensitive inequality.
    IsNot,
    /// Case-insensitive substring.
    Contains,
    /// Negation of `Contains`.
    DoesNotContain,
    /// Case-insensitive prefix.
    StartsWith,
    /// Negation of `StartsWith`.
    DoesNotStartWith,
    /// Case-insensitive suffix.
    EndsWith,
    /// Negation of `EndsWith`.
    DoesNotEndWith,
    /// A compare token from a document that could not be recognized.
    Unrecognized(String),
}

impl StringCompareType {
    /// All known compare types, in the order an editor offers them.
    pub const KNOWN: [StringCompareType; 9] = [
        StringCompareType::IsAnything,
        StringCompareType::Is,
        StringCompareType::IsNot,
        StringCompareType::Contains,
        StringCompareType::DoesNotContain,
        StringCompareType::StartsWith,
        StringCompareType::DoesNotStartWith,
        StringCompareType::EndsWith,
        StringCompareType::DoesNotEndWith,
    ];

    /// The stable token used in saved documents.
    pub fn token(&self) -> &str {
        match self {
            StringCompareType::IsAnything => "is_anything",
            StringCompareType::Is => "is",
            StringCompareType::IsNot => "is_not",
            StringCompareType::Contains => "contains",
            StringCompareType::DoesNotContain => "does_not_contain",
            StringCompareType::StartsWith => "starts_with",
            StringCompareType::DoesNotStartWith => "does_not_start_with",
            StringCompareType::EndsWith => "ends_with",
            StringCompareType::DoesNotEndWith => "does_not_end_with",
            StringCompareType::Unrecognized(token) => token,
        }
    }

    /// Whether this compare type accepts every value.
    pub fn is_wildcard(&self) -> bool {
        matches!(
            self,
            StringCompareType::IsAnything | StringCompareType::Unrecognized(_)
        )
    }

    /// Whether this compare type is the negation of another.
    pub fn is_negated(&self) -> bool {
        matches!(
            self,
            StringCompareType::IsNot
                | StringCompareType::DoesNotContain
                | StringCompareType::DoesNotStartWith
                | StringCompareType::DoesNotEndWith
        )
    }

    /// Whether this came from an unrecognized document token.
    pub fn is_unrecognized(&self) -> bool {
        matches!(self, StringCompareType::Unrecognized(_))
    }

    fn phrase(&self) -> &str {
        match self {
            StringCompareType::IsAnything | StringCompareType::Unrecognized(_) => "is anything",
            StringCompareType::Is => "is",
            StringCompareType::IsNot => "is not",
            StringCompareType::Contains => "contains",
            StringCompareType::DoesNotContain => "does not contain",
            StringCompareType::StartsWith => "starts with",
            StringCompareType::DoesNotStartWith => "does not start with",
            StringCompareType::EndsWith => "ends with",
            StringCompareType::DoesNotEndWith => "does not end with",
        }
    }
}

impl FromStr for StringCompareType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compare = StringCompareType::KNOWN
            .iter()
            .find(|known| known.token() == s)
            .cloned()
            .unwrap_or_else(|| StringCompareType::Unrecognized(s.to_string()));
        Ok(compare)
    }
}

impl fmt::Display for StringCompareType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.phrase())
    }
}

impl Serialize for StringCompareType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.token().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for StringCompareType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let token = String::deserialize(deserializer)?;
        let compare = token.parse().unwrap_or(StringCompareType::IsAnything);
        if let StringCompareType::Unrecognized(ref token) = compare {
            tracing::warn!(token = %token, "unrecognized string compare type, treating as wildcard");
        }
        Ok(compare)
    }
}

/// How a numeric criteria compares its qualifier against a candidate.
///
/// The qualifier is always the right-hand operand: `AtLeast` means
/// `value >= qualifier`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NumericCompareType {
    /// `value == qualifier`
    Is,
    /// `value >= qualifier`
    AtLeast,
    /// `value <= qualifier`
    AtMost,
    /// A compare token from a document that could not be recognized.
    Unrecognized(String),
}

impl NumericCompareType {
    /// All known compare types.
    pub const KNOWN: [NumericCompareType; 3] = [
        NumericCompareType::Is,
        NumericCompareType::AtLeast,
        NumericCompareType::AtMost,
    ];

    /// The stable token used in saved documents.
    pub fn token(&self) -> &str {
        match self {
            NumericCompareType::Is => "is",
            NumericCompareType::AtLeast => "at_least",
            NumericCompareType::AtMost => "at_most",
            NumericCompareType::Unrecognized(token) => token,
        }
    }

    /// Whether this came from an unrecognized document token.
    pub fn is_unrecognized(&self) -> bool {
        matches!(self, NumericCompareType::Unrecognized(_))
    }

    fn compare<T: PartialOrd>(&self, value: T, qualifier: T) -> bool {
        match self {
            NumericCompareType::Is => value == qualifier,
            NumericCompareType::AtLeast => value >= qualifier,
            NumericCompareType::AtMost => value <= qualifier,
            NumericCompareType::Unrecognized(_) => true,
        }
    }

    fn phrase(&self) -> &str {
        match self {
            NumericCompareType::Is => "is",
            NumericCompareType::AtLeast => "at least",
            NumericCompareType::AtMost => "at most",
            NumericCompareType::Unrecognized(_) => "is anything",
        }
    }
}

impl FromStr for NumericCompareType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compare = NumericCompareType::KNOWN
            .iter()
            .find(|known| known.token() == s)
            .cloned()
            .unwrap_or_else(|| NumericCompareType::Unrecognized(s.to_string()));
        Ok(compare)
    }
}

impl fmt::Display for NumericCompareType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.phrase())
    }
}

impl Serialize for NumericCompareType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.token().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for NumericCompareType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let token = String::deserialize(deserializer)?;
        let compare = token.parse().unwrap_or(NumericCompareType::AtLeast);
        if let NumericCompareType::Unrecognized(ref token) = compare {
            tracing::warn!(token = %token, "unrecognized numeric compare type, treating as wildcard");
        }
        Ok(compare)
    }
}

/// A string predicate.
///
/// # Examples
///
/// ```rust
/// use gurps_bonus::criteria::{StringCompareType, StringCriteria};
///
/// let criteria = StringCriteria::new(StringCompareType::StartsWith, "kar");
/// assert!(criteria.matches("Karate"));
/// assert!(!criteria.matches("Judo"));
///
/// let exact = StringCriteria::is("Karate");
/// assert!(!exact.matches("karate"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StringCriteria {
    pub(crate) compare: StringCompareType,
    #[serde(default)]
    pub(crate) qualifier: String,
}

impl StringCriteria {
    /// Create a new criteria.
    pub fn new(compare: StringCompareType, qualifier: impl Into<String>) -> Self {
        Self {
            compare,
            qualifier: qualifier.into(),
        }
    }

    /// Shorthand for an exact `Is` match.
    pub fn is(qualifier: impl Into<String>) -> Self {
        Self::new(StringCompareType::Is, qualifier)
    }

    /// A criteria that matches every value.
    pub fn anything() -> Self {
        Self::new(StringCompareType::IsAnything, "")
    }

    /// The compare type.
    pub fn compare(&self) -> &StringCompareType {
        &self.compare
    }

    /// The qualifier.
    pub fn qualifier(&self) -> &str {
        &self.qualifier
    }

    /// Set the compare type. Returns `true` if it changed.
    pub fn set_compare(&mut self, compare: StringCompareType) -> bool {
        if self.compare == compare {
            return false;
        }
        self.compare = compare;
        true
    }

    /// Set the qualifier. Returns `true` if it changed.
    pub fn set_qualifier(&mut self, qualifier: impl Into<String>) -> bool {
        let qualifier = qualifier.into();
        if self.qualifier == qualifier {
            return false;
        }
        self.qualifier = qualifier;
        true
    }

    /// Test a single value.
    pub fn matches(&self, value: &str) -> bool {
        match &self.compare {
            StringCompareType::IsAnything | StringCompareType::Unrecognized(_) => true,
            StringCompareType::Is => value == self.qualifier,
            StringCompareType::IsNot => value != self.qualifier,
            other => {
                let value = value.to_lowercase();
                let qualifier = self.qualifier.to_lowercase();
                match other {
                    StringCompareType::Contains => value.contains(&qualifier),
                    StringCompareType::DoesNotContain => !value.contains(&qualifier),
                    StringCompareType::StartsWith => value.starts_with(&qualifier),
                    StringCompareType::DoesNotStartWith => !value.starts_with(&qualifier),
                    StringCompareType::EndsWith => value.ends_with(&qualifier),
                    _ => !value.ends_with(&qualifier),
                }
            }
        }
    }

    /// Test a list of values, such as a trait's categories.
    ///
    /// Positive compare types need one matching element, negated ones need
    /// every element to match. An empty list is tested as the empty string.
    pub fn matches_any<'a, I>(&self, values: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        if self.compare.is_wildcard() {
            return true;
        }
        let mut values = values.into_iter().peekable();
        if values.peek().is_none() {
            return self.matches("");
        }
        if self.compare.is_negated() {
            values.all(|value| self.matches(value))
        } else {
            values.any(|value| self.matches(value))
        }
    }

    /// Human readable form for tooltips.
    pub fn describe(&self) -> String {
        if self.compare.is_wildcard() {
            return self.compare.to_string();
        }
        format!("{} \"{}\"", self.compare, self.qualifier)
    }
}

impl Default for StringCriteria {
    fn default() -> Self {
        Self::anything()
    }
}

/// A numeric predicate over `T`.
///
/// # Examples
///
/// ```rust
/// use gurps_bonus::criteria::{IntegerCriteria, NumericCompareType};
///
/// let criteria = IntegerCriteria::new(NumericCompareType::AtLeast, 10);
/// assert!(criteria.matches(10));
/// assert!(!criteria.matches(9));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericCriteria<T> {
    pub(crate) compare: NumericCompareType,
    pub(crate) qualifier: T,
}

/// Integer criteria.
pub type IntegerCriteria = NumericCriteria<i32>;

/// Decimal criteria.
pub type DoubleCriteria = NumericCriteria<f64>;

impl<T: Copy + PartialOrd + fmt::Display> NumericCriteria<T> {
    /// Create a new criteria.
    pub fn new(compare: NumericCompareType, qualifier: T) -> Self {
        Self { compare, qualifier }
    }

    /// The compare type.
    pub fn compare(&self) -> &NumericCompareType {
        &self.compare
    }

    /// The qualifier.
    pub fn qualifier(&self) -> T {
        self.qualifier
    }

    /// Set the compare type. Returns `true` if it changed.
    pub fn set_compare(&mut self, compare: NumericCompareType) -> bool {
        if self.compare == compare {
            return false;
        }
        self.compare = compare;
        true
    }

    /// Set the qualifier. Returns `true` if it changed.
    pub fn set_qualifier(&mut self, qualifier: T) -> bool {
        if self.qualifier == qualifier {
            return false;
        }
        self.qualifier = qualifier;
        true
    }

    /// Test a value.
    pub fn matches(&self, value: T) -> bool {
        self.compare.compare(value, self.qualifier)
    }

    /// Human readable form for tooltips.
    pub fn describe(&self) -> String {
        if self.compare.is_unrecognized() {
            return self.compare.to_string();
        }
        format!("{} {}", self.compare, self.qualifier)
    }
}

impl IntegerCriteria {
    /// The permissive level criteria new weapon bonuses start with.
    pub fn at_least_zero() -> Self {
        Self::new(NumericCompareType::AtLeast, 0)
    }
}
