//! Trait module.
//!
//! A trait is one entry on a character sheet: an advantage, a skill, a
//! spell, a weapon, or a container grouping other traits. Every trait can
//! own features; leaf skills, spells and weapons also resolve to a level.

use crate::attribute::Attribute;
use crate::feature::{Feature, MatchCandidate};
use crate::nameable;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Skill and spell difficulty.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SkillDifficulty {
    #[serde(rename = "e")]
    Easy,
    #[serde(rename = "a")]
    Average,
    #[serde(rename = "h")]
    Hard,
    #[serde(rename = "vh")]
    VeryHard,
}

impl SkillDifficulty {
    /// Difficulties a regular spell may have.
    pub const SPELL: [SkillDifficulty; 2] = [SkillDifficulty::Hard, SkillDifficulty::VeryHard];

    /// Difficulties a ritual magic spell may have.
    pub const RITUAL_MAGIC: [SkillDifficulty; 2] = [SkillDifficulty::Average, SkillDifficulty::Hard];

    /// Relative level for the first point spent.
    pub fn base_relative_level(self) -> i32 {
        match self {
            SkillDifficulty::Easy => 0,
            SkillDifficulty::Average => -1,
            SkillDifficulty::Hard => -2,
            SkillDifficulty::VeryHard => -3,
        }
    }

    /// Relative level bought by `points`, or `None` when nothing was spent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use gurps_bonus::SkillDifficulty;
    ///
    /// assert_eq!(SkillDifficulty::Average.relative_level_for_points(0), None);
    /// assert_eq!(SkillDifficulty::Average.relative_level_for_points(1), Some(-1));
    /// assert_eq!(SkillDifficulty::Average.relative_level_for_points(2), Some(0));
    /// assert_eq!(SkillDifficulty::Average.relative_level_for_points(4), Some(1));
    /// assert_eq!(SkillDifficulty::Hard.relative_level_for_points(8), Some(1));
    /// ```
    pub fn relative_level_for_points(self, points: i32) -> Option<i32> {
        if points <= 0 {
            return None;
        }
        let base = self.base_relative_level();
        Some(match points {
            1 => base,
            2 | 3 => base + 1,
            _ => base + 1 + points / 4,
        })
    }

    /// One-letter form used on the sheet: `E`, `A`, `H`, `VH`.
    pub fn abbreviation(self) -> &'static str {
        match self {
            SkillDifficulty::Easy => "E",
            SkillDifficulty::Average => "A",
            SkillDifficulty::Hard => "H",
            SkillDifficulty::VeryHard => "VH",
        }
    }
}

impl fmt::Display for SkillDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

/// What a default is based on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultTarget {
    Attribute(Attribute),
    Skill {
        name: String,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        specialization: String,
    },
}

/// "Based on X at a penalty": how a trait can be used without points.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SkillDefault {
    pub target: DefaultTarget,
    #[serde(default)]
    pub modifier: i32,
}

impl SkillDefault {
    /// Default to an attribute, e.g. DX-5.
    pub fn attribute(attribute: Attribute, modifier: i32) -> Self {
        Self {
            target: DefaultTarget::Attribute(attribute),
            modifier,
        }
    }

    /// Default to another skill, e.g. Broadsword-2.
    pub fn skill(name: &str, specialization: &str, modifier: i32) -> Self {
        Self {
            target: DefaultTarget::Skill {
                name: name.to_string(),
                specialization: specialization.to_string(),
            },
            modifier,
        }
    }

    /// Text such as `DX-5` or `Broadsword (Fencing)+0`.
    pub fn describe(&self) -> String {
        let base = match &self.target {
            DefaultTarget::Attribute(attr) => attr.to_string(),
            DefaultTarget::Skill { name, specialization } if specialization.is_empty() => name.clone(),
            DefaultTarget::Skill { name, specialization } => format!("{name} ({specialization})"),
        };
        format!("{base}{:+}", self.modifier)
    }
}

/// Rule data of a skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillData {
    pub attribute: Attribute,
    pub difficulty: SkillDifficulty,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub defaults: Vec<SkillDefault>,
}

/// Marks a spell as a ritual magic spell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RitualMagic {
    /// Each prerequisite spell is a -1 to the spell's default.
    #[serde(default)]
    pub prerequisite_count: i32,
}

fn default_spell_attribute() -> Attribute {
    Attribute::Iq
}

fn default_spell_difficulty() -> SkillDifficulty {
    SkillDifficulty::Hard
}

/// Rule data of a spell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpellData {
    #[serde(default)]
    pub college: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub power_source: String,
    #[serde(default = "default_spell_attribute")]
    pub attribute: Attribute,
    #[serde(default = "default_spell_difficulty")]
    pub difficulty: SkillDifficulty,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ritual: Option<RitualMagic>,
}

/// Rule data of a weapon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponData {
    #[serde(default)]
    pub damage: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub defaults: Vec<SkillDefault>,
}

/// The shape of a trait.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraitKind {
    /// Groups children; has no level of its own.
    Container,
    Advantage,
    Skill(SkillData),
    Spell(SpellData),
    Weapon(WeaponData),
}

/// Coarse kind used by [`crate::character::CharacterContext::traits_by_kind`].
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum TraitCategory {
    Container,
    Advantage,
    Skill,
    Spell,
    Weapon,
}

impl TraitKind {
    /// The fieldless category of this kind.
    pub fn category(&self) -> TraitCategory {
        match self {
            TraitKind::Container => TraitCategory::Container,
            TraitKind::Advantage => TraitCategory::Advantage,
            TraitKind::Skill(_) => TraitCategory::Skill,
            TraitKind::Spell(_) => TraitCategory::Spell,
            TraitKind::Weapon(_) => TraitCategory::Weapon,
        }
    }
}

/// Position of a trait in a trait list: child indices from the root.
#[derive(Debug, Clone, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct TraitPath(pub Vec<usize>);

impl TraitPath {
    /// Path of the `index`-th child of the trait at this path.
    pub fn child(&self, index: usize) -> TraitPath {
        let mut path = self.0.clone();
        path.push(index);
        TraitPath(path)
    }
}

impl fmt::Display for TraitPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(usize::to_string).collect();
        f.write_str(&parts.join("."))
    }
}

/// Parse a comma separated category list, trimming blanks.
pub fn parse_categories(text: &str) -> BTreeSet<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// A character sheet entry.
///
/// # Examples
///
/// ```rust
/// use gurps_bonus::{Attribute, SkillDifficulty, Trait};
///
/// let skill = Trait::skill("Karate", Attribute::Dx, SkillDifficulty::Hard)
///     .with_points(4)
///     .with_categories("Combat, Melee");
/// assert_eq!(skill.categories_as_string(), "Combat, Melee");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trait {
    pub(crate) name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub(crate) specialization: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) tech_level: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub(crate) categories: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub(crate) notes: String,
    #[serde(default)]
    pub(crate) points: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) levels: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) features: Vec<Feature>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) children: Vec<Trait>,
    pub(crate) kind: TraitKind,
}

impl Trait {
    fn with_kind(name: &str, kind: TraitKind) -> Self {
        Self {
            name: name.to_string(),
            specialization: String::new(),
            tech_level: None,
            categories: BTreeSet::new(),
            notes: String::new(),
            points: 0,
            levels: None,
            features: Vec::new(),
            children: Vec::new(),
            kind,
        }
    }

    /// A container grouping other traits.
    pub fn container(name: &str) -> Self {
        Self::with_kind(name, TraitKind::Container)
    }

    /// An advantage, disadvantage or perk: a plain owner of features.
    pub fn advantage(name: &str) -> Self {
        Self::with_kind(name, TraitKind::Advantage)
    }

    /// A skill with no points and no defaults.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use gurps_bonus::{Attribute, SkillDifficulty, Trait};
    ///
    /// let karate = Trait::skill("Karate", Attribute::Dx, SkillDifficulty::Hard).with_points(4);
    /// assert_eq!(karate.points(), 4);
    /// assert!(!karate.is_container());
    /// ```
    pub fn skill(name: &str, attribute: Attribute, difficulty: SkillDifficulty) -> Self {
        Self::with_kind(
            name,
            TraitKind::Skill(SkillData {
                attribute,
                difficulty,
                defaults: Vec::new(),
            }),
        )
    }

    /// A spell in `college`, based on IQ.
    pub fn spell(name: &str, college: &str, difficulty: SkillDifficulty) -> Self {
        Self::with_kind(
            name,
            TraitKind::Spell(SpellData {
                college: college.to_string(),
                power_source: String::new(),
                attribute: Attribute::Iq,
                difficulty,
                ritual: None,
            }),
        )
    }

    /// A ritual magic spell: defaults to the Ritual Magic skill for its
    /// college at -1 per prerequisite spell.
    pub fn ritual_magic_spell(name: &str, college: &str, difficulty: SkillDifficulty, prerequisite_count: i32) -> Self {
        Self::with_kind(
            name,
            TraitKind::Spell(SpellData {
                college: college.to_string(),
                power_source: String::new(),
                attribute: Attribute::Iq,
                difficulty,
                ritual: Some(RitualMagic { prerequisite_count }),
            }),
        )
    }

    /// A weapon dealing `damage`; add defaults to give it a level.
    pub fn weapon(name: &str, damage: &str) -> Self {
        Self::with_kind(
            name,
            TraitKind::Weapon(WeaponData {
                damage: damage.to_string(),
                defaults: Vec::new(),
            }),
        )
    }

    /// Set the specialization.
    pub fn with_specialization(mut self, specialization: &str) -> Self {
        self.specialization = specialization.to_string();
        self
    }

    /// Set the points spent.
    pub fn with_points(mut self, points: i32) -> Self {
        self.points = points;
        self
    }

    /// Give the trait a level count, used by per-level amounts.
    pub fn with_levels(mut self, levels: i32) -> Self {
        self.levels = Some(levels);
        self
    }

    /// Set categories from a comma-separated list.
    pub fn with_categories(mut self, categories: &str) -> Self {
        self.categories = parse_categories(categories);
        self
    }

    /// Add a feature owned by this trait.
    pub fn with_feature(mut self, feature: impl Into<Feature>) -> Self {
        self.features.push(feature.into());
        self
    }

    /// Append a child; only meaningful for containers.
    pub fn with_child(mut self, child: Trait) -> Self {
        self.children.push(child);
        self
    }

    /// Add a default to a skill or weapon. Other kinds ignore it.
    pub fn with_default(mut self, default: SkillDefault) -> Self {
        match &mut self.kind {
            TraitKind::Skill(data) => data.defaults.push(default),
            TraitKind::Weapon(data) => data.defaults.push(default),
            _ => {}
        }
        self
    }

    /// Set a spell's power source. Other kinds ignore it.
    pub fn with_power_source(mut self, power_source: &str) -> Self {
        if let TraitKind::Spell(data) = &mut self.kind {
            data.power_source = power_source.to_string();
        }
        self
    }

    /// The trait's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Specialization, empty when there is none.
    pub fn specialization(&self) -> &str {
        &self.specialization
    }

    /// Tech level, if the trait has one.
    pub fn tech_level(&self) -> Option<&str> {
        self.tech_level.as_deref()
    }

    /// Categories, sorted and without duplicates.
    pub fn categories(&self) -> &BTreeSet<String> {
        &self.categories
    }

    /// Categories joined with ", ".
    pub fn categories_as_string(&self) -> String {
        self.categories.iter().cloned().collect::<Vec<_>>().join(", ")
    }

    /// Free-form notes.
    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// Character points spent on the trait itself.
    pub fn points(&self) -> i32 {
        self.points
    }

    /// Level count, `None` for traits without levels.
    pub fn levels(&self) -> Option<i32> {
        self.levels
    }

    /// Features owned directly by this trait.
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Mutable access to the features. Any change to their criteria must be
    /// followed by an index rebuild.
    pub fn features_mut(&mut self) -> &mut Vec<Feature> {
        &mut self.features
    }

    /// Child traits, in sheet order.
    pub fn children(&self) -> &[Trait] {
        &self.children
    }

    /// Mutable children. Rebuild the owning character's index after editing.
    pub fn children_mut(&mut self) -> &mut Vec<Trait> {
        &mut self.children
    }

    /// Kind-specific rule data.
    pub fn kind(&self) -> &TraitKind {
        &self.kind
    }

    /// Whether the trait only groups children.
    pub fn is_container(&self) -> bool {
        matches!(self.kind, TraitKind::Container)
    }

    /// Difficulty of a skill or spell.
    pub fn difficulty(&self) -> Option<SkillDifficulty> {
        match &self.kind {
            TraitKind::Skill(data) => Some(data.difficulty),
            TraitKind::Spell(data) => Some(data.difficulty),
            _ => None,
        }
    }

    /// Defaults of a skill or weapon.
    pub fn defaults(&self) -> &[SkillDefault] {
        match &self.kind {
            TraitKind::Skill(data) => &data.defaults,
            TraitKind::Weapon(data) => &data.defaults,
            _ => &[],
        }
    }

    /// Rename the trait. Returns `true` if it changed.
    pub fn set_name(&mut self, name: &str) -> bool {
        set_if_changed(&mut self.name, name.to_string())
    }

    /// Returns `true` if the specialization changed.
    pub fn set_specialization(&mut self, specialization: &str) -> bool {
        set_if_changed(&mut self.specialization, specialization.to_string())
    }

    /// Returns `true` if the tech level changed.
    pub fn set_tech_level(&mut self, tech_level: Option<&str>) -> bool {
        set_if_changed(&mut self.tech_level, tech_level.map(str::to_string))
    }

    /// Replace the categories from a comma separated list.
    pub fn set_categories(&mut self, categories: &str) -> bool {
        set_if_changed(&mut self.categories, parse_categories(categories))
    }

    /// Returns `true` if the notes changed.
    pub fn set_notes(&mut self, notes: &str) -> bool {
        set_if_changed(&mut self.notes, notes.to_string())
    }

    /// Returns `true` if the points changed.
    pub fn set_points(&mut self, points: i32) -> bool {
        set_if_changed(&mut self.points, points)
    }

    /// Returns `true` if the level count changed.
    pub fn set_levels(&mut self, levels: Option<i32>) -> bool {
        set_if_changed(&mut self.levels, levels)
    }

    /// Change the difficulty of a skill or spell. Difficulties a spell may
    /// not have are refused and reported as unchanged.
    pub fn set_difficulty(&mut self, difficulty: SkillDifficulty) -> bool {
        match &mut self.kind {
            TraitKind::Skill(data) => set_if_changed(&mut data.difficulty, difficulty),
            TraitKind::Spell(data) => {
                let allowed: &[SkillDifficulty] = if data.ritual.is_some() {
                    &SkillDifficulty::RITUAL_MAGIC
                } else {
                    &SkillDifficulty::SPELL
                };
                allowed.contains(&difficulty) && set_if_changed(&mut data.difficulty, difficulty)
            }
            _ => false,
        }
    }

    /// Change the prerequisite count of a ritual magic spell.
    pub fn set_prerequisite_count(&mut self, count: i32) -> bool {
        match &mut self.kind {
            TraitKind::Spell(SpellData {
                ritual: Some(ritual),
                ..
            }) => set_if_changed(&mut ritual.prerequisite_count, count),
            _ => false,
        }
    }

    /// Set a spell's college. Returns `true` if it changed; other kinds
    /// never change.
    pub fn set_college(&mut self, college: &str) -> bool {
        match &mut self.kind {
            TraitKind::Spell(data) => set_if_changed(&mut data.college, college.to_string()),
            _ => false,
        }
    }

    /// The identity fields feature criteria are tested against.
    pub fn candidate(&self) -> MatchCandidate<'_> {
        let candidate = MatchCandidate::new(&self.name, &self.specialization).with_categories(&self.categories);
        match &self.kind {
            TraitKind::Spell(data) => candidate.with_spell(&data.college, &data.power_source),
            _ => candidate,
        }
    }

    /// This trait and all its descendants, depth first.
    pub fn walk(&self) -> Vec<&Trait> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.walk());
        }
        out
    }

    pub(crate) fn walk_with_path<'a>(&'a self, path: TraitPath, out: &mut Vec<(TraitPath, &'a Trait)>) {
        for (index, child) in self.children.iter().enumerate() {
            let child_path = path.child(index);
            out.push((child_path.clone(), child));
            child.walk_with_path(child_path, out);
        }
    }

    /// Collect placeholder names from this trait's text, its features and
    /// its children.
    pub fn fill_with_nameable_keys(&self, set: &mut BTreeSet<String>, marker: char) {
        nameable::extract_into(set, &self.name, marker);
        nameable::extract_into(set, &self.specialization, marker);
        nameable::extract_into(set, &self.notes, marker);
        for feature in &self.features {
            feature.fill_with_nameable_keys(set, marker);
        }
        for child in &self.children {
            child.fill_with_nameable_keys(set, marker);
        }
    }

    /// Substitute placeholders throughout the subtree. Returns `true` if
    /// anything changed.
    pub fn apply_nameable_keys(&mut self, map: &HashMap<String, String>, marker: char) -> bool {
        let mut changed = nameable::apply(&mut self.name, map, marker);
        changed |= nameable::apply(&mut self.specialization, map, marker);
        changed |= nameable::apply(&mut self.notes, map, marker);
        for feature in &mut self.features {
            changed |= feature.apply_nameable_keys(map, marker);
        }
        for child in &mut self.children {
            changed |= child.apply_nameable_keys(map, marker);
        }
        changed
    }
}

/// Every trait in `traits`, depth first, with its path.
pub fn walk_list(traits: &[Trait]) -> Vec<(TraitPath, &Trait)> {
    let mut out = Vec::new();
    for (index, t) in traits.iter().enumerate() {
        let path = TraitPath(vec![index]);
        out.push((path.clone(), t));
        t.walk_with_path(path, &mut out);
    }
    out
}

fn set_if_changed<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::SkillBonus;

    #[test]
    fn test_points_table() {
        let hard = SkillDifficulty::Hard;
        assert_eq!(hard.relative_level_for_points(1), Some(-2));
        assert_eq!(hard.relative_level_for_points(2), Some(-1));
        assert_eq!(hard.relative_level_for_points(3), Some(-1));
        assert_eq!(hard.relative_level_for_points(4), Some(0));
        assert_eq!(hard.relative_level_for_points(12), Some(2));
        assert_eq!(SkillDifficulty::VeryHard.relative_level_for_points(-3), None);
    }

    #[test]
    fn test_setters_report_changes() {
        let mut skill = Trait::skill("Karate", Attribute::Dx, SkillDifficulty::Hard);
        assert!(!skill.set_name("Karate"));
        assert!(skill.set_name("Judo"));
        assert!(skill.set_points(2));
        assert!(!skill.set_points(2));
        assert!(skill.set_categories("Combat,  Melee ,"));
        assert_eq!(skill.categories().len(), 2);
        assert!(!skill.set_categories("Melee, Combat"));
    }

    #[test]
    fn test_spell_difficulty_restrictions() {
        let mut spell = Trait::spell("Fireball", "Fire", SkillDifficulty::Hard);
        assert!(!spell.set_difficulty(SkillDifficulty::Easy));
        assert!(spell.set_difficulty(SkillDifficulty::VeryHard));

        let mut ritual = Trait::ritual_magic_spell("Fireball", "Fire", SkillDifficulty::Hard, 2);
        assert!(ritual.set_difficulty(SkillDifficulty::Average));
        assert!(!ritual.set_difficulty(SkillDifficulty::VeryHard));
        assert!(ritual.set_prerequisite_count(3));
        assert!(!spell.set_prerequisite_count(3));
    }

    #[test]
    fn test_walk_list_paths() {
        let traits = vec![
            Trait::container("Combat")
                .with_child(Trait::skill("Karate", Attribute::Dx, SkillDifficulty::Hard))
                .with_child(Trait::container("Weapons").with_child(Trait::weapon("Fist", "thr-1"))),
            Trait::advantage("Combat Reflexes"),
        ];
        let walked: Vec<String> = walk_list(&traits)
            .into_iter()
            .map(|(path, t)| format!("{path}:{}", t.name()))
            .collect();
        assert_eq!(
            walked,
            vec!["0:Combat", "0.0:Karate", "0.1:Weapons", "0.1.0:Fist", "1:Combat Reflexes"]
        );
    }

    #[test]
    fn test_trait_nameables_bottom_up() {
        let mut t = Trait::advantage("Weapon Master (@Weapon@)")
            .with_feature(SkillBonus::named("@Weapon@", 1.0))
            .with_child(Trait::advantage("Trained by @Mentor@"));
        let mut set = BTreeSet::new();
        t.fill_with_nameable_keys(&mut set, '@');
        assert_eq!(set.len(), 2);

        let mut map = HashMap::new();
        map.insert("Weapon".to_string(), "Rapier".to_string());
        assert!(t.apply_nameable_keys(&map, '@'));
        assert_eq!(t.name(), "Weapon Master (Rapier)");
        assert_eq!(t.children()[0].name(), "Trained by @Mentor@");
        assert_eq!(t.features()[0].match_key().unwrap().as_str(), "skill/Rapier");
    }

    #[test]
    fn test_default_describe() {
        assert_eq!(SkillDefault::attribute(Attribute::Dx, -5).describe(), "DX-5");
        assert_eq!(SkillDefault::skill("Broadsword", "", 0).describe(), "Broadsword+0");
    }
}
