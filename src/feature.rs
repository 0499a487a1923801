//! Feature module.
//!
//! A feature is a conditional modifier a trait contributes while it is part
//! of a character: "+2 to Karate", "+1 to all Fire college spells",
//! "+1 damage with Broadsword at skill 12+". Each variant carries criteria
//! deciding which traits it applies to and a [`LeveledAmount`].
//!
//! The set of variants is closed. A feature tag that this build does not
//! know is kept as [`Feature::Unrecognized`] so it survives a save, but it
//! never contributes to anything.

use crate::attribute::Attribute;
use crate::criteria::{IntegerCriteria, StringCompareType, StringCriteria};
use crate::key::MatchKey;
use crate::nameable;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};

static NO_CATEGORIES: BTreeSet<String> = BTreeSet::new();

/// What a feature contributes to, and the prefix of its match keys.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum FeatureKind {
    /// Skill level.
    Skill,
    /// Spell level, matched on the spell's name.
    Spell,
    /// Spell level, matched on the spell's college.
    SpellCollege,
    /// Spell level, matched on the spell's power source.
    SpellPowerSource,
    /// Weapon damage, matched on the wielding skill.
    Weapon,
    /// Points spent on a skill.
    SkillPoints,
    /// A raw attribute.
    Attribute,
}

impl FeatureKind {
    /// The match key prefix.
    pub fn prefix(self) -> &'static str {
        match self {
            FeatureKind::Skill => "skill",
            FeatureKind::Spell => "spell",
            FeatureKind::SpellCollege => "spell.college",
            FeatureKind::SpellPowerSource => "spell.power_source",
            FeatureKind::Weapon => "weapon",
            FeatureKind::SkillPoints => "skill_points",
            FeatureKind::Attribute => "attribute",
        }
    }

    /// Spell bonuses are filed under three kinds depending on what they
    /// target; spell lookups probe all of them.
    pub const SPELL_KINDS: [FeatureKind; 3] = [
        FeatureKind::Spell,
        FeatureKind::SpellCollege,
        FeatureKind::SpellPowerSource,
    ];
}

/// A bonus amount, optionally multiplied by the owning trait's level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeveledAmount {
    #[serde(default = "LeveledAmount::default_amount")]
    pub amount: f64,
    #[serde(default)]
    pub per_level: bool,
}

impl LeveledAmount {
    fn default_amount() -> f64 {
        1.0
    }

    /// A flat amount.
    pub fn flat(amount: f64) -> Self {
        Self {
            amount,
            per_level: false,
        }
    }

    /// An amount applied once per level of the owning trait.
    pub fn per_level(amount: f64) -> Self {
        Self {
            amount,
            per_level: true,
        }
    }

    /// The amount given the owner's level count. An owner without levels
    /// counts as level 1.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use gurps_bonus::LeveledAmount;
    ///
    /// assert_eq!(LeveledAmount::flat(2.0).effective(Some(3)), 2.0);
    /// assert_eq!(LeveledAmount::per_level(2.0).effective(Some(3)), 6.0);
    /// assert_eq!(LeveledAmount::per_level(2.0).effective(None), 2.0);
    /// ```
    pub fn effective(&self, levels: Option<i32>) -> f64 {
        if self.per_level {
            self.amount * f64::from(levels.unwrap_or(1))
        } else {
            self.amount
        }
    }

    /// Signed text for tooltips, e.g. `+2` or `-1 per level`.
    pub fn describe(&self) -> String {
        let sign = if self.amount >= 0.0 { "+" } else { "" };
        if self.per_level {
            format!("{sign}{} per level", self.amount)
        } else {
            format!("{sign}{}", self.amount)
        }
    }
}

impl Default for LeveledAmount {
    fn default() -> Self {
        Self::flat(Self::default_amount())
    }
}

/// The identity fields of a trait that feature criteria are tested against.
#[derive(Debug, Clone, Copy)]
pub struct MatchCandidate<'a> {
    pub name: &'a str,
    pub specialization: &'a str,
    pub categories: &'a BTreeSet<String>,
    /// Wielding skill level for weapon bonuses.
    pub level: Option<i32>,
    pub college: &'a str,
    pub power_source: &'a str,
}

impl<'a> MatchCandidate<'a> {
    /// A candidate with a name and specialization and nothing else.
    pub fn new(name: &'a str, specialization: &'a str) -> Self {
        Self {
            name,
            specialization,
            categories: &NO_CATEGORIES,
            level: None,
            college: "",
            power_source: "",
        }
    }

    /// Attach categories.
    pub fn with_categories(mut self, categories: &'a BTreeSet<String>) -> Self {
        self.categories = categories;
        self
    }

    /// Attach a level.
    pub fn with_level(mut self, level: i32) -> Self {
        self.level = Some(level);
        self
    }

    /// Attach spell college and power source.
    pub fn with_spell(mut self, college: &'a str, power_source: &'a str) -> Self {
        self.college = college;
        self.power_source = power_source;
        self
    }

    /// The value an exact-name bucket of `kind` is probed with.
    pub fn probe_name(&self, kind: FeatureKind) -> &'a str {
        match kind {
            FeatureKind::SpellCollege => self.college,
            FeatureKind::SpellPowerSource => self.power_source,
            _ => self.name,
        }
    }
}

fn empty_is() -> StringCriteria {
    StringCriteria::is("")
}

/// Two-tier key policy: exact name when the name is an `Is` match and the
/// secondary criteria accepts anything, a wildcard bucket otherwise.
/// `malformed` forces the wildcard bucket for features whose other criteria
/// carry an unrecognized compare type.
fn key_for(
    kind: FeatureKind,
    name: &StringCriteria,
    secondary: Option<&StringCriteria>,
    malformed: bool,
) -> MatchKey {
    let secondary_open = secondary.map_or(true, |c| *c.compare() == StringCompareType::IsAnything);
    if !malformed && *name.compare() == StringCompareType::Is && secondary_open {
        MatchKey::exact(kind.prefix(), name.qualifier())
    } else {
        MatchKey::wildcard(kind.prefix())
    }
}

/// A bonus to the level of skills matching its criteria.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillBonus {
    #[serde(default = "empty_is")]
    pub(crate) name: StringCriteria,
    #[serde(default)]
    pub(crate) specialization: StringCriteria,
    #[serde(default)]
    pub(crate) category: StringCriteria,
    #[serde(flatten)]
    pub(crate) amount: LeveledAmount,
    #[serde(flatten)]
    pub(crate) extra: Map<String, Value>,
}

impl SkillBonus {
    /// An exact-name bonus of `amount`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use gurps_bonus::feature::{MatchCandidate, SkillBonus};
    ///
    /// let bonus = SkillBonus::named("Karate", 2.0);
    /// assert_eq!(bonus.match_key().as_str(), "skill/Karate");
    /// assert!(bonus.contributes(&MatchCandidate::new("Karate", "Judo")));
    /// assert!(!bonus.contributes(&MatchCandidate::new("Karate Style", "")));
    /// ```
    pub fn named(name: &str, amount: f64) -> Self {
        Self {
            name: StringCriteria::is(name),
            amount: LeveledAmount::flat(amount),
            ..Self::default()
        }
    }

    /// The name criteria.
    pub fn name(&self) -> &StringCriteria {
        &self.name
    }

    /// Mutable name criteria. Rebuild the index after changing it.
    pub fn name_mut(&mut self) -> &mut StringCriteria {
        &mut self.name
    }

    /// The specialization criteria.
    pub fn specialization(&self) -> &StringCriteria {
        &self.specialization
    }

    /// Mutable specialization criteria.
    pub fn specialization_mut(&mut self) -> &mut StringCriteria {
        &mut self.specialization
    }

    /// The category criteria, tested against each of the owner's categories.
    pub fn category(&self) -> &StringCriteria {
        &self.category
    }

    /// Mutable category criteria.
    pub fn category_mut(&mut self) -> &mut StringCriteria {
        &mut self.category
    }

    /// The amount granted, before per-level scaling.
    pub fn amount(&self) -> &LeveledAmount {
        &self.amount
    }

    /// Set the amount. Returns `true` if it changed.
    pub fn set_amount(&mut self, amount: LeveledAmount) -> bool {
        if self.amount == amount {
            return false;
        }
        self.amount = amount;
        true
    }

    /// The index bucket this bonus belongs in right now.
    pub fn match_key(&self) -> MatchKey {
        key_for(
            FeatureKind::Skill,
            &self.name,
            Some(&self.specialization),
            self.category.compare().is_unrecognized(),
        )
    }

    /// Whether every criteria accepts the candidate.
    pub fn contributes(&self, candidate: &MatchCandidate<'_>) -> bool {
        self.name.matches(candidate.name)
            && self.specialization.matches(candidate.specialization)
            && self.category.matches_any(candidate.categories.iter().map(String::as_str))
    }
}

impl Default for SkillBonus {
    fn default() -> Self {
        Self {
            name: empty_is(),
            specialization: StringCriteria::anything(),
            category: StringCriteria::anything(),
            amount: LeveledAmount::default(),
            extra: Map::new(),
        }
    }
}

/// A bonus to the number of points spent on matching skills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillPointBonus {
    #[serde(default = "empty_is")]
    pub(crate) name: StringCriteria,
    #[serde(default)]
    pub(crate) specialization: StringCriteria,
    #[serde(default)]
    pub(crate) category: StringCriteria,
    #[serde(flatten)]
    pub(crate) amount: LeveledAmount,
    #[serde(flatten)]
    pub(crate) extra: Map<String, Value>,
}

impl SkillPointBonus {
    /// An exact-name bonus of `points`.
    pub fn named(name: &str, points: f64) -> Self {
        Self {
            name: StringCriteria::is(name),
            amount: LeveledAmount::flat(points),
            ..Self::default()
        }
    }

    /// The name criteria.
    pub fn name(&self) -> &StringCriteria {
        &self.name
    }

    /// Mutable name criteria. Rebuild the index after changing it.
    pub fn name_mut(&mut self) -> &mut StringCriteria {
        &mut self.name
    }

    /// The specialization criteria.
    pub fn specialization(&self) -> &StringCriteria {
        &self.specialization
    }

    /// Mutable specialization criteria.
    pub fn specialization_mut(&mut self) -> &mut StringCriteria {
        &mut self.specialization
    }

    /// Mutable category criteria.
    pub fn category_mut(&mut self) -> &mut StringCriteria {
        &mut self.category
    }

    /// The amount granted, before per-level scaling.
    pub fn amount(&self) -> &LeveledAmount {
        &self.amount
    }

    /// Set the amount. Returns `true` if it changed.
    pub fn set_amount(&mut self, amount: LeveledAmount) -> bool {
        if self.amount == amount {
            return false;
        }
        self.amount = amount;
        true
    }

    /// The index bucket this bonus belongs in right now.
    pub fn match_key(&self) -> MatchKey {
        key_for(
            FeatureKind::SkillPoints,
            &self.name,
            Some(&self.specialization),
            self.category.compare().is_unrecognized(),
        )
    }

    /// Whether every criteria accepts the candidate.
    pub fn contributes(&self, candidate: &MatchCandidate<'_>) -> bool {
        self.name.matches(candidate.name)
            && self.specialization.matches(candidate.specialization)
            && self.category.matches_any(candidate.categories.iter().map(String::as_str))
    }
}

impl Default for SkillPointBonus {
    fn default() -> Self {
        Self {
            name: empty_is(),
            specialization: StringCriteria::anything(),
            category: StringCriteria::anything(),
            amount: LeveledAmount::default(),
            extra: Map::new(),
        }
    }
}

/// A bonus to the damage of weapons wielded with matching skills.
///
/// `level` is tested against the weapon's resolved skill level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponBonus {
    #[serde(default = "empty_is")]
    pub(crate) name: StringCriteria,
    #[serde(default)]
    pub(crate) specialization: StringCriteria,
    #[serde(default = "IntegerCriteria::at_least_zero")]
    pub(crate) level: IntegerCriteria,
    #[serde(default)]
    pub(crate) category: StringCriteria,
    #[serde(flatten)]
    pub(crate) amount: LeveledAmount,
    #[serde(flatten)]
    pub(crate) extra: Map<String, Value>,
}

impl WeaponBonus {
    /// An exact-skill-name bonus of `amount`.
    pub fn named(name: &str, amount: f64) -> Self {
        Self {
            name: StringCriteria::is(name),
            amount: LeveledAmount::flat(amount),
            ..Self::default()
        }
    }

    /// The name criteria.
    pub fn name(&self) -> &StringCriteria {
        &self.name
    }

    /// Mutable name criteria. Rebuild the index after changing it.
    pub fn name_mut(&mut self) -> &mut StringCriteria {
        &mut self.name
    }

    /// The specialization criteria.
    pub fn specialization(&self) -> &StringCriteria {
        &self.specialization
    }

    /// Mutable specialization criteria.
    pub fn specialization_mut(&mut self) -> &mut StringCriteria {
        &mut self.specialization
    }

    /// The criteria tested against the wielding skill level.
    pub fn level(&self) -> &IntegerCriteria {
        &self.level
    }

    /// Mutable level criteria.
    pub fn level_mut(&mut self) -> &mut IntegerCriteria {
        &mut self.level
    }

    /// Mutable category criteria.
    pub fn category_mut(&mut self) -> &mut StringCriteria {
        &mut self.category
    }

    /// The amount granted, before per-level scaling.
    pub fn amount(&self) -> &LeveledAmount {
        &self.amount
    }

    /// Set the amount. Returns `true` if it changed.
    pub fn set_amount(&mut self, amount: LeveledAmount) -> bool {
        if self.amount == amount {
            return false;
        }
        self.amount = amount;
        true
    }

    /// The index bucket this bonus belongs in right now.
    pub fn match_key(&self) -> MatchKey {
        let malformed = self.level.compare().is_unrecognized() || self.category.compare().is_unrecognized();
        key_for(FeatureKind::Weapon, &self.name, Some(&self.specialization), malformed)
    }

    /// A candidate without a level only passes a level criteria that
    /// accepts anything.
    pub fn contributes(&self, candidate: &MatchCandidate<'_>) -> bool {
        let level_ok = match candidate.level {
            Some(level) => self.level.matches(level),
            None => self.level.compare().is_unrecognized(),
        };
        level_ok
            && self.name.matches(candidate.name)
            && self.specialization.matches(candidate.specialization)
            && self.category.matches_any(candidate.categories.iter().map(String::as_str))
    }
}

impl Default for WeaponBonus {
    fn default() -> Self {
        Self {
            name: empty_is(),
            specialization: StringCriteria::anything(),
            level: IntegerCriteria::at_least_zero(),
            category: StringCriteria::anything(),
            amount: LeveledAmount::default(),
            extra: Map::new(),
        }
    }
}

/// What a [`SpellBonus`] compares its name criteria against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpellMatchType {
    /// Every spell; the name criteria is ignored.
    AllColleges,
    /// The spell's college.
    #[default]
    CollegeName,
    /// The spell's power source.
    PowerSourceName,
    /// The spell's own name.
    SpellName,
}

impl SpellMatchType {
    fn kind(self) -> FeatureKind {
        match self {
            SpellMatchType::AllColleges | SpellMatchType::CollegeName => FeatureKind::SpellCollege,
            SpellMatchType::PowerSourceName => FeatureKind::SpellPowerSource,
            SpellMatchType::SpellName => FeatureKind::Spell,
        }
    }
}

/// A bonus to the level of spells matching its criteria.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpellBonus {
    #[serde(default)]
    pub(crate) match_type: SpellMatchType,
    #[serde(default = "empty_is")]
    pub(crate) name: StringCriteria,
    #[serde(default)]
    pub(crate) category: StringCriteria,
    #[serde(flatten)]
    pub(crate) amount: LeveledAmount,
    #[serde(flatten)]
    pub(crate) extra: Map<String, Value>,
}

impl SpellBonus {
    /// A bonus for the spells `match_type` selects by exact `name`.
    pub fn new(match_type: SpellMatchType, name: &str, amount: LeveledAmount) -> Self {
        Self {
            match_type,
            name: StringCriteria::is(name),
            amount,
            ..Self::default()
        }
    }

    /// What the name criteria is compared against.
    pub fn match_type(&self) -> SpellMatchType {
        self.match_type
    }

    /// Set the match type. Returns `true` if it changed.
    pub fn set_match_type(&mut self, match_type: SpellMatchType) -> bool {
        if self.match_type == match_type {
            return false;
        }
        self.match_type = match_type;
        true
    }

    /// The name criteria.
    pub fn name(&self) -> &StringCriteria {
        &self.name
    }

    /// Mutable name criteria. Rebuild the index after changing it.
    pub fn name_mut(&mut self) -> &mut StringCriteria {
        &mut self.name
    }

    /// Mutable category criteria.
    pub fn category_mut(&mut self) -> &mut StringCriteria {
        &mut self.category
    }

    /// The amount granted, before per-level scaling.
    pub fn amount(&self) -> &LeveledAmount {
        &self.amount
    }

    /// Set the amount. Returns `true` if it changed.
    pub fn set_amount(&mut self, amount: LeveledAmount) -> bool {
        if self.amount == amount {
            return false;
        }
        self.amount = amount;
        true
    }

    /// The feature kind selected by the match type.
    pub fn kind(&self) -> FeatureKind {
        self.match_type.kind()
    }

    /// The index bucket this bonus belongs in right now.
    pub fn match_key(&self) -> MatchKey {
        if self.match_type == SpellMatchType::AllColleges {
            return MatchKey::wildcard(self.kind().prefix());
        }
        key_for(self.kind(), &self.name, None, self.category.compare().is_unrecognized())
    }

    /// Whether every criteria accepts the candidate.
    pub fn contributes(&self, candidate: &MatchCandidate<'_>) -> bool {
        let target_ok = match self.match_type {
            SpellMatchType::AllColleges => true,
            SpellMatchType::CollegeName => self.name.matches(candidate.college),
            SpellMatchType::PowerSourceName => self.name.matches(candidate.power_source),
            SpellMatchType::SpellName => self.name.matches(candidate.name),
        };
        target_ok && self.category.matches_any(candidate.categories.iter().map(String::as_str))
    }
}

impl Default for SpellBonus {
    fn default() -> Self {
        Self {
            match_type: SpellMatchType::default(),
            name: empty_is(),
            category: StringCriteria::anything(),
            amount: LeveledAmount::default(),
            extra: Map::new(),
        }
    }
}

/// A bonus to a raw attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeBonus {
    pub(crate) attribute: Attribute,
    #[serde(flatten)]
    pub(crate) amount: LeveledAmount,
    #[serde(flatten)]
    pub(crate) extra: Map<String, Value>,
}

impl AttributeBonus {
    /// A bonus of `amount` to `attribute`.
    pub fn new(attribute: Attribute, amount: LeveledAmount) -> Self {
        Self {
            attribute,
            amount,
            extra: Map::new(),
        }
    }

    /// The attribute this bonus raises.
    pub fn attribute(&self) -> Attribute {
        self.attribute
    }

    /// Set the attribute. Returns `true` if it changed.
    pub fn set_attribute(&mut self, attribute: Attribute) -> bool {
        if self.attribute == attribute {
            return false;
        }
        self.attribute = attribute;
        true
    }

    /// The amount granted, before per-level scaling.
    pub fn amount(&self) -> &LeveledAmount {
        &self.amount
    }

    /// Set the amount. Returns `true` if it changed.
    pub fn set_amount(&mut self, amount: LeveledAmount) -> bool {
        if self.amount == amount {
            return false;
        }
        self.amount = amount;
        true
    }

    /// The index bucket this bonus belongs in right now.
    pub fn match_key(&self) -> MatchKey {
        MatchKey::exact(FeatureKind::Attribute.prefix(), self.attribute.abbreviation())
    }

    /// Whether every criteria accepts the candidate.
    pub fn contributes(&self, candidate: &MatchCandidate<'_>) -> bool {
        candidate.name.eq_ignore_ascii_case(self.attribute.abbreviation())
    }
}

/// A feature whose tag this build does not know, kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct UnrecognizedFeature {
    pub tag: String,
    pub body: Value,
}

/// A conditional modifier owned by a trait.
#[derive(Debug, Clone, PartialEq)]
pub enum Feature {
    SkillBonus(SkillBonus),
    SpellBonus(SpellBonus),
    WeaponBonus(WeaponBonus),
    AttributeBonus(AttributeBonus),
    SkillPointBonus(SkillPointBonus),
    Unrecognized(UnrecognizedFeature),
}

impl Feature {
    /// What this feature contributes to; `None` for unrecognized features.
    pub fn kind(&self) -> Option<FeatureKind> {
        match self {
            Feature::SkillBonus(_) => Some(FeatureKind::Skill),
            Feature::SpellBonus(b) => Some(b.kind()),
            Feature::WeaponBonus(_) => Some(FeatureKind::Weapon),
            Feature::AttributeBonus(_) => Some(FeatureKind::Attribute),
            Feature::SkillPointBonus(_) => Some(FeatureKind::SkillPoints),
            Feature::Unrecognized(_) => None,
        }
    }

    /// The index bucket for this feature, computed from its current
    /// criteria. `None` for unrecognized features, which are never indexed.
    pub fn match_key(&self) -> Option<MatchKey> {
        match self {
            Feature::SkillBonus(b) => Some(b.match_key()),
            Feature::SpellBonus(b) => Some(b.match_key()),
            Feature::WeaponBonus(b) => Some(b.match_key()),
            Feature::AttributeBonus(b) => Some(b.match_key()),
            Feature::SkillPointBonus(b) => Some(b.match_key()),
            Feature::Unrecognized(_) => None,
        }
    }

    /// Whether this feature applies to `candidate`.
    pub fn contributes(&self, candidate: &MatchCandidate<'_>) -> bool {
        match self {
            Feature::SkillBonus(b) => b.contributes(candidate),
            Feature::SpellBonus(b) => b.contributes(candidate),
            Feature::WeaponBonus(b) => b.contributes(candidate),
            Feature::AttributeBonus(b) => b.contributes(candidate),
            Feature::SkillPointBonus(b) => b.contributes(candidate),
            Feature::Unrecognized(_) => false,
        }
    }

    /// The amount, `None` for unrecognized features.
    pub fn amount(&self) -> Option<&LeveledAmount> {
        match self {
            Feature::SkillBonus(b) => Some(&b.amount),
            Feature::SpellBonus(b) => Some(&b.amount),
            Feature::WeaponBonus(b) => Some(&b.amount),
            Feature::AttributeBonus(b) => Some(&b.amount),
            Feature::SkillPointBonus(b) => Some(&b.amount),
            Feature::Unrecognized(_) => None,
        }
    }

    /// Names of criteria fields whose compare type was not recognized at
    /// load time.
    pub fn malformed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        let mut check = |field: &'static str, bad: bool| {
            if bad {
                fields.push(field);
            }
        };
        match self {
            Feature::SkillBonus(b) => {
                check("name", b.name.compare().is_unrecognized());
                check("specialization", b.specialization.compare().is_unrecognized());
                check("category", b.category.compare().is_unrecognized());
            }
            Feature::SkillPointBonus(b) => {
                check("name", b.name.compare().is_unrecognized());
                check("specialization", b.specialization.compare().is_unrecognized());
                check("category", b.category.compare().is_unrecognized());
            }
            Feature::WeaponBonus(b) => {
                check("name", b.name.compare().is_unrecognized());
                check("specialization", b.specialization.compare().is_unrecognized());
                check("level", b.level.compare().is_unrecognized());
                check("category", b.category.compare().is_unrecognized());
            }
            Feature::SpellBonus(b) => {
                check("name", b.name.compare().is_unrecognized());
                check("category", b.category.compare().is_unrecognized());
            }
            Feature::AttributeBonus(_) | Feature::Unrecognized(_) => {}
        }
        fields
    }

    fn nameable_criteria(&self) -> Vec<&StringCriteria> {
        match self {
            Feature::SkillBonus(b) => vec![&b.name, &b.specialization],
            Feature::SkillPointBonus(b) => vec![&b.name, &b.specialization],
            Feature::WeaponBonus(b) => vec![&b.name, &b.specialization],
            Feature::SpellBonus(b) => vec![&b.name],
            Feature::AttributeBonus(_) | Feature::Unrecognized(_) => Vec::new(),
        }
    }

    fn nameable_criteria_mut(&mut self) -> Vec<&mut StringCriteria> {
        match self {
            Feature::SkillBonus(b) => vec![&mut b.name, &mut b.specialization],
            Feature::SkillPointBonus(b) => vec![&mut b.name, &mut b.specialization],
            Feature::WeaponBonus(b) => vec![&mut b.name, &mut b.specialization],
            Feature::SpellBonus(b) => vec![&mut b.name],
            Feature::AttributeBonus(_) | Feature::Unrecognized(_) => Vec::new(),
        }
    }

    /// Collect the placeholder names used by this feature's qualifiers.
    pub fn fill_with_nameable_keys(&self, set: &mut BTreeSet<String>, marker: char) {
        for criteria in self.nameable_criteria() {
            nameable::extract_into(set, criteria.qualifier(), marker);
        }
    }

    /// Substitute placeholders in this feature's qualifiers. Returns `true`
    /// if anything changed; the caller must rebuild the index afterwards.
    pub fn apply_nameable_keys(&mut self, map: &HashMap<String, String>, marker: char) -> bool {
        let mut changed = false;
        for criteria in self.nameable_criteria_mut() {
            changed |= nameable::apply(&mut criteria.qualifier, map, marker);
        }
        changed
    }
}

impl From<SkillBonus> for Feature {
    fn from(bonus: SkillBonus) -> Self {
        Feature::SkillBonus(bonus)
    }
}

impl From<SpellBonus> for Feature {
    fn from(bonus: SpellBonus) -> Self {
        Feature::SpellBonus(bonus)
    }
}

impl From<WeaponBonus> for Feature {
    fn from(bonus: WeaponBonus) -> Self {
        Feature::WeaponBonus(bonus)
    }
}

impl From<AttributeBonus> for Feature {
    fn from(bonus: AttributeBonus) -> Self {
        Feature::AttributeBonus(bonus)
    }
}

impl From<SkillPointBonus> for Feature {
    fn from(bonus: SkillPointBonus) -> Self {
        Feature::SkillPointBonus(bonus)
    }
}
