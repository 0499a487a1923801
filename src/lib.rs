//! # gurps-bonus - Trait and Bonus Resolution for GURPS Character Sheets
//!
//! The rules core of a character sheet editor:
//! - **Criteria**: typed string and numeric predicates features use to pick
//!   the traits they apply to
//! - **Bonus index**: every active feature filed under a match key, rebuilt
//!   from scratch after each structural edit
//! - **Level calculation**: skill, spell, ritual magic and weapon levels
//!   with a breakdown of where each number came from
//! - **Nameables**: `@placeholder@` substitution through nested traits
//!
//! ## Core Concepts
//!
//! ### Pipeline
//!
//! ```text
//! [Trait tree] → BonusIndex::rebuild → [BonusIndex] → LevelCalculator → [SkillLevel]
//! ```
//!
//! 1. **Traits** own features ("+2 to Karate")
//! 2. **The index** files each feature under `kind/name` or `kind/*`
//! 3. **The calculator** looks bonuses up per trait and applies them in a
//!    fixed stage order
//!
//! ## Example
//!
//! ```rust
//! use gurps_bonus::*;
//!
//! let mut character = Character::new("Mai");
//! character.set_attribute(Attribute::Dx, 12);
//! character.add_trait(Trait::skill("Karate", Attribute::Dx, SkillDifficulty::Hard).with_points(4));
//! character.add_trait(Trait::advantage("Karate Master").with_feature(SkillBonus::named("Karate", 2.0)));
//!
//! let pass = character.calculate_all();
//! let karate = &pass.levels[&TraitPath(vec![0])];
//! assert_eq!(karate.skill_level().display(), "14/+2");
//! ```
//!
//! ## Modules
//!
//! - [`criteria`] - String and numeric predicates
//! - [`nameable`] - Placeholder extraction and substitution
//! - [`key`] - Match key type
//! - [`feature`] - Bonus variants
//! - [`traits`] - Character sheet entries
//! - [`index`] - Bonus index
//! - [`graph`] - Level dependency graph
//! - [`level`] - Level calculation
//! - [`character`] - Character document
//! - [`document`] - JSON load and save
//! - [`settings`] - Sheet settings
//! - [`error`] - Error and diagnostic types

pub mod attribute;
pub mod character;
pub mod criteria;
pub mod document;
pub mod error;
pub mod feature;
pub mod graph;
pub mod index;
pub mod key;
pub mod level;
pub mod nameable;
pub mod settings;
pub mod traits;

// Re-export main types for convenience
pub use attribute::Attribute;
pub use character::{Character, CharacterContext};
pub use criteria::{DoubleCriteria, IntegerCriteria, NumericCompareType, StringCompareType, StringCriteria};
pub use error::{Diagnostic, DocumentError};
pub use feature::{
    AttributeBonus, Feature, FeatureKind, LeveledAmount, MatchCandidate, SkillBonus, SkillPointBonus, SpellBonus,
    SpellMatchType, WeaponBonus,
};
pub use index::{BonusIndex, BonusLookup, Contribution};
pub use key::MatchKey;
pub use level::{Level, LevelCalculator, LevelPass, SkillLevel, WeaponLevel};
pub use settings::SheetSettings;
pub use traits::{SkillDefault, SkillDifficulty, Trait, TraitCategory, TraitPath};
