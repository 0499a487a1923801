//! Character module.
//!
//! Provides the `Character` type, which owns a trait list, base attributes,
//! sheet settings and the [`BonusIndex`] built from the traits. It is the
//! main entry point: edit the traits, rebuild the index, then ask for
//! levels.

use crate::attribute::Attribute;
use crate::index::BonusIndex;
use crate::level::{LevelCalculator, LevelPass};
use crate::settings::SheetSettings;
use crate::traits::{walk_list, Trait, TraitCategory, TraitPath};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Base value every attribute starts at.
pub const DEFAULT_ATTRIBUTE: i32 = 10;

/// What level calculation needs to know about the character it runs for.
pub trait CharacterContext {
    /// Current value of an attribute, bonuses included.
    fn attribute_value(&self, attribute: Attribute) -> i32;

    /// Every trait of a category in the character's trait tree, depth
    /// first, with its path.
    fn traits_by_kind(&self, category: TraitCategory) -> Vec<(TraitPath, &Trait)>;

    fn settings(&self) -> &SheetSettings;
}

/// A character sheet.
///
/// The bonus index is derived data. Methods that change the trait list
/// through this type rebuild it; after editing traits through
/// [`Character::traits_mut`] call [`Character::rebuild_index`].
///
/// # Examples
///
/// ```rust
/// use gurps_bonus::{Attribute, AttributeBonus, Character, LeveledAmount, Trait};
///
/// let mut character = Character::new("Mai");
/// character.set_attribute(Attribute::St, 11);
/// character.add_trait(Trait::advantage("Lifting ST").with_feature(AttributeBonus::new(Attribute::St, LeveledAmount::flat(2.0))));
///
/// assert_eq!(character.base_attribute(Attribute::St), 11);
/// assert_eq!(character.attribute(Attribute::St), 13);
/// ```
#[derive(Debug, Clone)]
pub struct Character {
    pub(crate) name: String,
    pub(crate) attributes: BTreeMap<Attribute, i32>,
    pub(crate) settings: SheetSettings,
    pub(crate) traits: Vec<Trait>,
    index: BonusIndex,
}

impl Character {
    /// A character with every attribute at its default and no traits.
    pub fn new(name: &str) -> Self {
        Self::from_parts(name.to_string(), BTreeMap::new(), SheetSettings::default(), Vec::new())
    }

    pub(crate) fn from_parts(
        name: String,
        attributes: BTreeMap<Attribute, i32>,
        settings: SheetSettings,
        traits: Vec<Trait>,
    ) -> Self {
        let index = BonusIndex::rebuild(&traits);
        Self {
            name,
            attributes,
            settings,
            traits,
            index,
        }
    }

    /// The character's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the character. Returns `true` if it changed.
    pub fn set_name(&mut self, name: &str) -> bool {
        if self.name == name {
            return false;
        }
        self.name = name.to_string();
        true
    }

    /// Base value of an attribute, before bonuses.
    pub fn base_attribute(&self, attribute: Attribute) -> i32 {
        self.attributes.get(&attribute).copied().unwrap_or(DEFAULT_ATTRIBUTE)
    }

    /// Set the base value of an attribute. Returns `true` if it changed.
    pub fn set_attribute(&mut self, attribute: Attribute, value: i32) -> bool {
        if self.base_attribute(attribute) == value && self.attributes.contains_key(&attribute) {
            return false;
        }
        self.attributes.insert(attribute, value);
        true
    }

    /// Current value of an attribute: base plus attribute bonuses, rounded
    /// down.
    pub fn attribute(&self, attribute: Attribute) -> i32 {
        let bonus = self.index.attribute_bonus(attribute).floor() as i32;
        self.base_attribute(attribute) + bonus
    }

    /// Current value of an attribute given by name, e.g. `"DX"` or `"will"`.
    pub fn attribute_named(&self, name: &str) -> Option<i32> {
        name.parse::<Attribute>().ok().map(|attribute| self.attribute(attribute))
    }

    /// Sheet settings in effect for this character.
    pub fn settings(&self) -> &SheetSettings {
        &self.settings
    }

    /// Replace the settings. Returns `true` if they changed.
    pub fn set_settings(&mut self, settings: SheetSettings) -> bool {
        if self.settings == settings {
            return false;
        }
        self.settings = settings;
        true
    }

    /// Top-level traits, in sheet order.
    pub fn traits(&self) -> &[Trait] {
        &self.traits
    }

    /// Mutable access to the trait list. The index goes stale until
    /// [`Character::rebuild_index`] is called.
    pub fn traits_mut(&mut self) -> &mut Vec<Trait> {
        &mut self.traits
    }

    /// Append a top-level trait and rebuild the index.
    pub fn add_trait(&mut self, t: Trait) {
        self.traits.push(t);
        self.rebuild_index();
    }

    /// Remove a top-level trait and rebuild the index.
    pub fn remove_trait(&mut self, position: usize) -> Option<Trait> {
        if position >= self.traits.len() {
            return None;
        }
        let removed = self.traits.remove(position);
        self.rebuild_index();
        Some(removed)
    }

    /// The trait at `path`, if any.
    pub fn trait_at(&self, path: &TraitPath) -> Option<&Trait> {
        let (first, rest) = path.0.split_first()?;
        let mut current = self.traits.get(*first)?;
        for &index in rest {
            current = current.children().get(index)?;
        }
        Some(current)
    }

    /// Replace the index with one built from the current traits.
    pub fn rebuild_index(&mut self) {
        self.index = BonusIndex::rebuild(&self.traits);
        debug!(character = %self.name, features = self.index.len(), "character index rebuilt");
    }

    /// The bonus index as of the last rebuild.
    pub fn index(&self) -> &BonusIndex {
        &self.index
    }

    /// A calculator bound to this character and its index.
    pub fn level_calculator(&self) -> LevelCalculator<'_> {
        LevelCalculator::new(Some(self as &dyn CharacterContext), &self.index)
    }

    /// Levels of every skill, spell and weapon.
    pub fn calculate_all(&self) -> LevelPass {
        self.level_calculator().calculate_all()
    }

    /// Placeholder names used anywhere in the trait tree.
    pub fn nameable_keys(&self) -> BTreeSet<String> {
        let mut set = BTreeSet::new();
        for t in &self.traits {
            t.fill_with_nameable_keys(&mut set, self.settings.nameable_marker);
        }
        set
    }

    /// Substitute placeholders throughout the trait tree and rebuild the
    /// index if anything changed.
    pub fn apply_nameable_keys(&mut self, map: &HashMap<String, String>) -> bool {
        let marker = self.settings.nameable_marker;
        let mut changed = false;
        for t in &mut self.traits {
            changed |= t.apply_nameable_keys(map, marker);
        }
        if changed {
            self.rebuild_index();
        }
        changed
    }
}

impl CharacterContext for Character {
    fn attribute_value(&self, attribute: Attribute) -> i32 {
        self.attribute(attribute)
    }

    fn traits_by_kind(&self, category: TraitCategory) -> Vec<(TraitPath, &Trait)> {
        walk_list(&self.traits)
            .into_iter()
            .filter(|(_, t)| t.kind().category() == category)
            .collect()
    }

    fn settings(&self) -> &SheetSettings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{AttributeBonus, LeveledAmount, SkillBonus};
    use crate::traits::SkillDifficulty;

    #[test]
    fn test_attribute_defaults() {
        let character = Character::new("Test");
        assert_eq!(character.attribute(Attribute::Iq), DEFAULT_ATTRIBUTE);
        assert_eq!(character.attribute_named("iq"), Some(DEFAULT_ATTRIBUTE));
        assert_eq!(character.attribute_named("Luck"), None);
    }

    #[test]
    fn test_attribute_bonus_applies() {
        let mut character = Character::new("Test");
        character.add_trait(
            Trait::advantage("Catlike")
                .with_levels(2)
                .with_feature(AttributeBonus::new(Attribute::Dx, LeveledAmount::per_level(1.0))),
        );
        assert_eq!(character.attribute(Attribute::Dx), 12);
        character.remove_trait(0);
        assert_eq!(character.attribute(Attribute::Dx), 10);
    }

    #[test]
    fn test_stale_index_until_rebuild() {
        let mut character = Character::new("Test");
        character.add_trait(Trait::advantage("Karate Master").with_feature(SkillBonus::named("Karate", 2.0)));
        assert_eq!(character.index().len(), 1);

        character.traits_mut().clear();
        assert_eq!(character.index().len(), 1);
        character.rebuild_index();
        assert!(character.index().is_empty());
    }

    #[test]
    fn test_trait_at_and_kind_filter() {
        let mut character = Character::new("Test");
        character.add_trait(
            Trait::container("Combat").with_child(Trait::skill("Karate", Attribute::Dx, SkillDifficulty::Hard)),
        );
        let skills = character.traits_by_kind(TraitCategory::Skill);
        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].0, TraitPath(vec![0, 0]));
        assert_eq!(character.trait_at(&skills[0].0).map(Trait::name), Some("Karate"));
        assert!(character.trait_at(&TraitPath(vec![3])).is_none());
    }

    #[test]
    fn test_nameables_rebuild_index() {
        let mut character = Character::new("Test");
        character.add_trait(Trait::advantage("Weapon Master").with_feature(SkillBonus::named("@Weapon@", 2.0)));
        assert!(character.nameable_keys().contains("Weapon"));

        let mut map = HashMap::new();
        map.insert("Weapon".to_string(), "Rapier".to_string());
        assert!(character.apply_nameable_keys(&map));
        assert_eq!(character.index().bucket(&"skill/Rapier".into()).len(), 1);
    }
}
