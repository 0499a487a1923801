//! Document module.
//!
//! The load/save boundary. Documents are JSON. A feature is written as a
//! single-entry object keyed by its tag:
//!
//! ```json
//! { "skill_bonus": { "name": { "compare": "is", "qualifier": "Karate" }, "amount": 2.0 } }
//! ```
//!
//! Tags are dispatched through one table. A tag that is not in the table
//! loads as [`Feature::Unrecognized`] and is written back unchanged, as are
//! unknown fields inside known features. Saving what was loaded and loading
//! it again gives a byte-identical second save.

use crate::attribute::Attribute;
use crate::character::Character;
use crate::error::DocumentError;
use crate::feature::{Feature, UnrecognizedFeature};
use crate::settings::SheetSettings;
use crate::traits::Trait;
use serde::de::Error as _;
use serde::ser::{Error as _, SerializeMap};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Tag of [`Feature::SkillBonus`].
pub const SKILL_BONUS: &str = "skill_bonus";
/// Tag of [`Feature::SpellBonus`].
pub const SPELL_BONUS: &str = "spell_bonus";
/// Tag of [`Feature::WeaponBonus`].
pub const WEAPON_BONUS: &str = "weapon_bonus";
/// Tag of [`Feature::AttributeBonus`].
pub const ATTRIBUTE_BONUS: &str = "attribute_bonus";
/// Tag of [`Feature::SkillPointBonus`].
pub const SKILL_POINT_BONUS: &str = "skill_point_bonus";

/// Every tag this build reads and writes.
pub const FEATURE_TAGS: [&str; 5] = [SKILL_BONUS, SPELL_BONUS, WEAPON_BONUS, ATTRIBUTE_BONUS, SKILL_POINT_BONUS];

/// The stable tag a feature is saved under.
pub fn feature_tag(feature: &Feature) -> &str {
    match feature {
        Feature::SkillBonus(_) => SKILL_BONUS,
        Feature::SpellBonus(_) => SPELL_BONUS,
        Feature::WeaponBonus(_) => WEAPON_BONUS,
        Feature::AttributeBonus(_) => ATTRIBUTE_BONUS,
        Feature::SkillPointBonus(_) => SKILL_POINT_BONUS,
        Feature::Unrecognized(unknown) => unknown.tag.as_str(),
    }
}

fn feature_from_entry(tag: String, body: Value) -> Result<Feature, DocumentError> {
    let feature = match tag.as_str() {
        SKILL_BONUS => Feature::SkillBonus(serde_json::from_value(body)?),
        SPELL_BONUS => Feature::SpellBonus(serde_json::from_value(body)?),
        WEAPON_BONUS => Feature::WeaponBonus(serde_json::from_value(body)?),
        ATTRIBUTE_BONUS => Feature::AttributeBonus(serde_json::from_value(body)?),
        SKILL_POINT_BONUS => Feature::SkillPointBonus(serde_json::from_value(body)?),
        _ => {
            warn!(tag = %tag, "keeping unrecognized feature");
            Feature::Unrecognized(UnrecognizedFeature { tag, body })
        }
    };
    Ok(feature)
}

/// Build a feature from its single-entry JSON object.
pub fn feature_from_value(value: Value) -> Result<Feature, DocumentError> {
    match value {
        Value::Object(map) if map.len() == 1 => match map.into_iter().next() {
            Some((tag, body)) => feature_from_entry(tag, body),
            None => Err(DocumentError::FeatureShape(String::from("{}"))),
        },
        other => Err(DocumentError::FeatureShape(other.to_string())),
    }
}

impl Serialize for Feature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(1))?;
        let tag = feature_tag(self);
        match self {
            Feature::SkillBonus(b) => map.serialize_entry(tag, b)?,
            Feature::SpellBonus(b) => map.serialize_entry(tag, b)?,
            Feature::WeaponBonus(b) => map.serialize_entry(tag, b)?,
            Feature::AttributeBonus(b) => map.serialize_entry(tag, b)?,
            Feature::SkillPointBonus(b) => map.serialize_entry(tag, b)?,
            Feature::Unrecognized(unknown) => {
                if unknown.tag.is_empty() {
                    return Err(S::Error::custom("feature tag must not be empty"));
                }
                map.serialize_entry(tag, &unknown.body)?
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Feature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        feature_from_value(value).map_err(D::Error::custom)
    }
}

/// Load one feature.
///
/// # Examples
///
/// ```rust
/// use gurps_bonus::document;
/// use gurps_bonus::feature::Feature;
///
/// let feature = document::load_feature(r#"{ "skill_bonus": { "name": { "compare": "is", "qualifier": "Karate" }, "amount": 2 } }"#).unwrap();
/// assert_eq!(feature.match_key().unwrap().as_str(), "skill/Karate");
///
/// let unknown = document::load_feature(r#"{ "reaction_bonus": { "amount": 1 } }"#).unwrap();
/// assert!(matches!(unknown, Feature::Unrecognized(_)));
/// ```
pub fn load_feature(json: &str) -> Result<Feature, DocumentError> {
    let value: Value = serde_json::from_str(json)?;
    feature_from_value(value)
}

/// Save one feature as a single-entry tag object.
pub fn save_feature(feature: &Feature) -> Result<String, DocumentError> {
    Ok(serde_json::to_string_pretty(feature)?)
}

/// Load a trait list.
pub fn load_traits(json: &str) -> Result<Vec<Trait>, DocumentError> {
    let traits: Vec<Trait> = serde_json::from_str(json)?;
    debug!(traits = traits.len(), "loaded traits");
    Ok(traits)
}

/// Save a trait list as pretty-printed JSON.
pub fn save_traits(traits: &[Trait]) -> Result<String, DocumentError> {
    Ok(serde_json::to_string_pretty(traits)?)
}

#[derive(Serialize)]
struct CharacterOut<'a> {
    name: &'a str,
    attributes: &'a BTreeMap<Attribute, i32>,
    settings: &'a SheetSettings,
    traits: &'a [Trait],
}

#[derive(Deserialize)]
struct CharacterIn {
    #[serde(default)]
    name: String,
    #[serde(default)]
    attributes: BTreeMap<Attribute, i32>,
    #[serde(default)]
    settings: SheetSettings,
    #[serde(default)]
    traits: Vec<Trait>,
}

/// Load a character and build its bonus index.
///
/// # Examples
///
/// ```rust
/// use gurps_bonus::{document, Attribute};
///
/// let json = r#"{
///     "name": "Mai",
///     "attributes": { "dx": 12 },
///     "traits": [
///         { "name": "Karate", "points": 4, "kind": { "skill": { "attribute": "dx", "difficulty": "h" } } }
///     ]
/// }"#;
/// let character = document::load_character(json).unwrap();
/// assert_eq!(character.attribute(Attribute::Dx), 12);
///
/// let karate = &character.traits()[0];
/// assert_eq!(character.level_calculator().skill_level(karate).level, 12);
/// ```
pub fn load_character(json: &str) -> Result<Character, DocumentError> {
    let data: CharacterIn = serde_json::from_str(json)?;
    let character = Character::from_parts(data.name, data.attributes, data.settings, data.traits);
    debug!(
        character = %character.name(),
        traits = character.traits().len(),
        diagnostics = character.index().diagnostics().len(),
        "loaded character"
    );
    Ok(character)
}

/// Save a character; its index is not written and is rebuilt on load.
pub fn save_character(character: &Character) -> Result<String, DocumentError> {
    let out = CharacterOut {
        name: &character.name,
        attributes: &character.attributes,
        settings: &character.settings,
        traits: &character.traits,
    };
    Ok(serde_json::to_string_pretty(&out)?)
}
