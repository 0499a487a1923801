//! Level calculation module.
//!
//! `LevelCalculator` turns a skill, spell or weapon into the number a
//! player rolls against. For a skill the stages are:
//!
//! ```text
//! attribute → points through the difficulty table (or best default) → bonuses → floor
//! ```
//!
//! A level below zero at any stage collapses to the [`UNTRAINED`] sentinel
//! and the remaining stages are skipped. Results are produced fresh on each
//! call; nothing is cached between edits.

use crate::character::CharacterContext;
use crate::error::Diagnostic;
use crate::feature::{FeatureKind, MatchCandidate};
use crate::graph::LevelGraph;
use crate::index::{BonusLookup, Contribution};
use crate::settings::SheetSettings;
use crate::traits::{
    DefaultTarget, SkillData, SkillDefault, SkillDifficulty, SpellData, Trait, TraitCategory, TraitKind,
    TraitPath, WeaponData,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, warn};

/// Sentinel level for "untrained / not computable". Display only; never
/// feed it into arithmetic.
pub const UNTRAINED: i32 = -1;

/// The skill ritual magic spells are based on.
pub const RITUAL_MAGIC_SKILL: &str = "Ritual Magic";

/// Format a number with an explicit sign: `+0`, `+2`, `-1`.
pub fn format_with_forced_sign(value: i32) -> String {
    format!("{value:+}")
}

/// Text for a level field, `12/+2`, or `-` for the sentinel.
///
/// # Examples
///
/// ```rust
/// use gurps_bonus::level::format_level;
///
/// assert_eq!(format_level(12, 2), "12/+2");
/// assert_eq!(format_level(10, 0), "10/+0");
/// assert_eq!(format_level(9, -1), "9/-1");
/// assert_eq!(format_level(-1, 0), "-");
/// ```
pub fn format_level(level: i32, relative_level: i32) -> String {
    if level < 0 {
        return String::from("-");
    }
    format!("{level}/{}", format_with_forced_sign(relative_level))
}

/// A resolved skill or spell level with its breakdown.
///
/// `breakdown` lists each stage as `(description, value)` in the order the
/// stages ran, so a tooltip can explain where the number came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillLevel {
    pub level: i32,
    pub relative_level: i32,
    pub tooltip: String,
    pub breakdown: Vec<(String, i32)>,
}

impl SkillLevel {
    fn new() -> Self {
        Self {
            level: 0,
            relative_level: 0,
            tooltip: String::new(),
            breakdown: Vec::new(),
        }
    }

    /// The sentinel result.
    pub fn untrained() -> Self {
        Self {
            level: UNTRAINED,
            ..Self::new()
        }
    }

    /// Whether this is the `-1` sentinel.
    pub fn is_untrained(&self) -> bool {
        self.level < 0
    }

    /// Record a stage of the calculation.
    pub fn add_step(&mut self, description: impl Into<String>, value: i32) {
        self.breakdown.push((description.into(), value));
    }

    /// Text for a level field.
    pub fn display(&self) -> String {
        format_level(self.level, self.relative_level)
    }
}

/// A resolved weapon: the level it is used at and its damage bonus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponLevel {
    pub skill: SkillLevel,
    pub damage_bonus: i32,
    pub damage_tooltip: String,
}

impl WeaponLevel {
    /// A weapon nobody can wield: sentinel level, no damage bonus.
    pub fn untrained() -> Self {
        Self {
            skill: SkillLevel::untrained(),
            damage_bonus: 0,
            damage_tooltip: String::new(),
        }
    }
}

/// The result for one leveled trait.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Level {
    Skill(SkillLevel),
    Spell(SkillLevel),
    Weapon(WeaponLevel),
}

impl Level {
    fn untrained_for(t: &Trait) -> Option<Level> {
        match t.kind() {
            TraitKind::Skill(_) => Some(Level::Skill(SkillLevel::untrained())),
            TraitKind::Spell(_) => Some(Level::Spell(SkillLevel::untrained())),
            TraitKind::Weapon(_) => Some(Level::Weapon(WeaponLevel::untrained())),
            TraitKind::Container | TraitKind::Advantage => None,
        }
    }

    /// The level a player rolls against.
    pub fn skill_level(&self) -> &SkillLevel {
        match self {
            Level::Skill(level) | Level::Spell(level) => level,
            Level::Weapon(weapon) => &weapon.skill,
        }
    }

    /// The final level, whatever the trait kind.
    pub fn level(&self) -> i32 {
        self.skill_level().level
    }
}

/// All levels of a character from one resolution pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelPass {
    pub levels: BTreeMap<TraitPath, Level>,
    pub diagnostics: Vec<Diagnostic>,
}

/// A skill already resolved in the current pass, usable as a default.
struct KnownSkill<'t> {
    path: TraitPath,
    owner: &'t Trait,
    level: i32,
    /// Has points spent on it, as opposed to being known only by default.
    bought: bool,
}

struct PassState<'t> {
    leveled: Vec<(TraitPath, &'t Trait)>,
    known: Vec<KnownSkill<'t>>,
    levels: BTreeMap<TraitPath, Level>,
    diagnostics: Vec<Diagnostic>,
}

type Blocked<'f> = &'f dyn Fn(&KnownSkill<'_>) -> bool;

struct ChosenDefault {
    description: String,
    level: i32,
    modifier: i32,
}

/// Computes skill, spell and weapon levels for one character.
///
/// Holds the character and the bonus source for the duration of a
/// calculation. With no character bound (editing a template or library
/// entry) every level is the sentinel and no bonus is looked up.
///
/// # Examples
///
/// ```rust
/// use gurps_bonus::{Attribute, Character, SkillBonus, SkillDifficulty, Trait};
///
/// let mut character = Character::new("Mai");
/// character.set_attribute(Attribute::Dx, 12);
/// character.add_trait(Trait::skill("Karate", Attribute::Dx, SkillDifficulty::Hard).with_points(4));
/// character.add_trait(Trait::advantage("Karate Master").with_feature(SkillBonus::named("Karate", 2.0)));
///
/// let karate = &character.traits()[0];
/// let level = character.level_calculator().skill_level(karate);
/// assert_eq!(level.level, 14);
/// assert_eq!(level.display(), "14/+2");
/// ```
pub struct LevelCalculator<'a> {
    character: Option<&'a dyn CharacterContext>,
    bonuses: &'a dyn BonusLookup,
}

impl<'a> LevelCalculator<'a> {
    /// A calculator bound to `character`, reading bonuses from `bonuses`.
    ///
    /// Without a character every trait resolves to the untrained sentinel
    /// and `bonuses` is never consulted.
    pub fn new(character: Option<&'a dyn CharacterContext>, bonuses: &'a dyn BonusLookup) -> Self {
        Self { character, bonuses }
    }

    /// Resolve one trait. `None` for containers and advantages.
    ///
    /// A trait borrowed from the bound character gets the same result as
    /// in [`LevelCalculator::calculate_all`]. Any other trait (an editor's
    /// scratch copy, say) is resolved against the character's other traits.
    pub fn calculate(&self, target: &Trait) -> Option<Level> {
        let untrained = Level::untrained_for(target)?;
        let Some(character) = self.character else {
            return Some(untrained);
        };

        let mut pass = self.run_pass(character);
        if let Some(path) = pass
            .leveled
            .iter()
            .find(|(_, t)| std::ptr::eq(*t, target))
            .map(|(path, _)| path.clone())
        {
            return pass.levels.remove(&path);
        }

        let same_identity = |k: &KnownSkill<'_>| {
            k.owner.name() == target.name() && k.owner.specialization() == target.specialization()
        };
        self.resolve(character, target, &pass.known, &same_identity)
            .map(|(level, _)| level)
    }

    /// Resolve one trait and return the level to roll against, or the
    /// sentinel for traits without a level.
    pub fn skill_level(&self, target: &Trait) -> SkillLevel {
        self.calculate(target)
            .map(|level| level.skill_level().clone())
            .unwrap_or_else(SkillLevel::untrained)
    }

    /// Resolve a weapon, including its damage bonus.
    pub fn weapon_level(&self, target: &Trait) -> WeaponLevel {
        match self.calculate(target) {
            Some(Level::Weapon(weapon)) => weapon,
            _ => WeaponLevel::untrained(),
        }
    }

    /// Resolve every leveled trait of the bound character.
    pub fn calculate_all(&self) -> LevelPass {
        let Some(character) = self.character else {
            return LevelPass::default();
        };
        let pass = self.run_pass(character);
        LevelPass {
            levels: pass.levels,
            diagnostics: pass.diagnostics,
        }
    }

    fn run_pass(&self, character: &'a dyn CharacterContext) -> PassState<'a> {
        let skills = character.traits_by_kind(TraitCategory::Skill);
        let mut leveled = skills.clone();
        leveled.extend(character.traits_by_kind(TraitCategory::Spell));
        leveled.extend(character.traits_by_kind(TraitCategory::Weapon));

        let mut graph = LevelGraph::new();
        for (path, t) in &leveled {
            graph.add_node(path.clone());
            // A skill with points never reads its defaults.
            if matches!(t.kind(), TraitKind::Skill(_)) && t.points() + self.point_bonus(t) > 0 {
                continue;
            }
            for dependency in dependency_paths(path, t, &skills) {
                graph.add_edge(path.clone(), dependency);
            }
        }

        let by_path: HashMap<TraitPath, &'a Trait> = leveled.iter().cloned().collect();
        let resolution = graph.resolution_order();
        let mut diagnostics = Vec::new();
        let mut cycle_of: HashMap<TraitPath, usize> = HashMap::new();
        for (id, cycle) in resolution.cycles.iter().enumerate() {
            let names: Vec<String> = cycle
                .iter()
                .filter_map(|path| by_path.get(path))
                .map(|t| t.name().to_string())
                .collect();
            warn!(cycle = %names.join(" -> "), "ignoring defaults inside a dependency cycle");
            diagnostics.push(Diagnostic::DefaultCycle { path: names });
            for path in cycle {
                cycle_of.insert(path.clone(), id);
            }
        }

        let mut state = PassState {
            leveled,
            known: Vec::new(),
            levels: BTreeMap::new(),
            diagnostics,
        };
        for path in resolution.order {
            let Some(&owner) = by_path.get(&path) else {
                continue;
            };
            let cycle = cycle_of.get(&path).copied();
            let in_same_cycle =
                |k: &KnownSkill<'_>| cycle.is_some() && cycle_of.get(&k.path).copied() == cycle;
            if let Some((level, bought)) = self.resolve(character, owner, &state.known, &in_same_cycle) {
                if let Level::Skill(skill) = &level {
                    state.known.push(KnownSkill {
                        path: path.clone(),
                        owner,
                        level: skill.level,
                        bought,
                    });
                }
                state.levels.insert(path, level);
            }
        }
        debug!(
            traits = state.levels.len(),
            cycles = state.diagnostics.len(),
            "resolved levels"
        );
        state
    }

    fn resolve(
        &self,
        character: &dyn CharacterContext,
        t: &Trait,
        known: &[KnownSkill<'_>],
        blocked: Blocked<'_>,
    ) -> Option<(Level, bool)> {
        match t.kind() {
            TraitKind::Skill(data) => {
                let (level, points) = self.skill(character, t, data, known, blocked);
                Some((Level::Skill(level), points > 0))
            }
            TraitKind::Spell(data) => {
                let level = if data.ritual.is_some() {
                    self.ritual_magic_spell(character, t, data, known, blocked)
                } else {
                    self.spell(character, t, data)
                };
                Some((Level::Spell(level), t.points() > 0))
            }
            TraitKind::Weapon(data) => Some((Level::Weapon(self.weapon(character, t, data, known, blocked)), false)),
            TraitKind::Container | TraitKind::Advantage => None,
        }
    }

    /// Returns the level and the points it was bought with, bonus points
    /// included.
    fn skill(
        &self,
        character: &dyn CharacterContext,
        t: &Trait,
        data: &SkillData,
        known: &[KnownSkill<'_>],
        blocked: Blocked<'_>,
    ) -> (SkillLevel, i32) {
        let candidate = t.candidate();
        let attribute = character.attribute_value(data.attribute);
        let mut result = SkillLevel::new();
        result.add_step(data.attribute.abbreviation(), attribute);

        let point_bonus = self.point_bonus(t);
        let points = t.points() + point_bonus;
        if point_bonus != 0 {
            result.add_step("Bonus points", point_bonus);
        }

        let relative = match data.difficulty.relative_level_for_points(points) {
            Some(relative) => {
                result.add_step(format!("{points} points ({})", data.difficulty), relative);
                relative
            }
            None => {
                let require_points = !character.settings().allow_default_chains;
                match self.best_default(character, &data.defaults, known, blocked, require_points) {
                    Some(chosen) => {
                        let relative = chosen.level - attribute;
                        result.add_step(format!("Default {}", chosen.description), relative);
                        relative
                    }
                    None => return (SkillLevel::untrained(), points),
                }
            }
        };
        if attribute + relative < 0 {
            return (SkillLevel::untrained(), points);
        }

        let contributions = self.bonuses.bonuses(FeatureKind::Skill, &candidate);
        (finish(result, attribute, relative, &contributions, character.settings()), points)
    }

    fn point_bonus(&self, t: &Trait) -> i32 {
        total(&self.bonuses.bonuses(FeatureKind::SkillPoints, &t.candidate())).floor() as i32
    }

    fn spell(&self, character: &dyn CharacterContext, t: &Trait, data: &SpellData) -> SkillLevel {
        let attribute = character.attribute_value(data.attribute);
        let mut result = SkillLevel::new();
        result.add_step(data.attribute.abbreviation(), attribute);

        let Some(relative) = data.difficulty.relative_level_for_points(t.points()) else {
            return SkillLevel::untrained();
        };
        result.add_step(format!("{} points ({})", t.points(), data.difficulty), relative);
        if attribute + relative < 0 {
            return SkillLevel::untrained();
        }

        let contributions = self.spell_bonuses(t);
        finish(result, attribute, relative, &contributions, character.settings())
    }

    /// Ritual magic spells default to the Ritual Magic skill for their
    /// college at -1 per prerequisite spell. Points buy that penalty off
    /// like a technique, never past the skill itself.
    fn ritual_magic_spell(
        &self,
        character: &dyn CharacterContext,
        t: &Trait,
        data: &SpellData,
        known: &[KnownSkill<'_>],
        blocked: Blocked<'_>,
    ) -> SkillLevel {
        let prerequisites = data.ritual.map_or(0, |ritual| ritual.prerequisite_count.max(0));
        let base = best_skill(known, RITUAL_MAGIC_SKILL, Some(data.college.as_str()), blocked, false)
            .or_else(|| best_skill(known, RITUAL_MAGIC_SKILL, Some(""), blocked, false));
        let Some(base) = base else {
            return SkillLevel::untrained();
        };

        let mut result = SkillLevel::new();
        let base_name = if base.owner.specialization().is_empty() {
            RITUAL_MAGIC_SKILL.to_string()
        } else {
            format!("{RITUAL_MAGIC_SKILL} ({})", base.owner.specialization())
        };
        result.add_step(base_name, base.level);
        result.add_step("Prerequisite spells", -prerequisites);
        if base.level - prerequisites < 0 {
            return SkillLevel::untrained();
        }

        let improvement = technique_improvement(data.difficulty, t.points()).min(prerequisites);
        if improvement > 0 {
            result.add_step(format!("{} points ({})", t.points(), data.difficulty), improvement);
        }
        let relative = improvement - prerequisites;

        let contributions = self.spell_bonuses(t);
        finish(result, base.level, relative, &contributions, character.settings())
    }

    fn spell_bonuses(&self, t: &Trait) -> Vec<Contribution> {
        let candidate = t.candidate();
        FeatureKind::SPELL_KINDS
            .iter()
            .flat_map(|&kind| self.bonuses.bonuses(kind, &candidate))
            .collect()
    }

    fn weapon(
        &self,
        character: &dyn CharacterContext,
        t: &Trait,
        data: &WeaponData,
        known: &[KnownSkill<'_>],
        blocked: Blocked<'_>,
    ) -> WeaponLevel {
        let Some(chosen) = self.best_default(character, &data.defaults, known, blocked, false) else {
            return WeaponLevel::untrained();
        };
        if chosen.level < 0 {
            return WeaponLevel::untrained();
        }

        let mut skill = SkillLevel::new();
        skill.add_step(chosen.description, chosen.level);
        skill.level = chosen.level;
        skill.relative_level = chosen.modifier;

        let mut seen = HashSet::new();
        let mut contributions = Vec::new();
        for default in &data.defaults {
            let DefaultTarget::Skill { name, specialization } = &default.target else {
                continue;
            };
            let candidate = MatchCandidate::new(name, specialization)
                .with_categories(t.categories())
                .with_level(skill.level);
            for contribution in self.bonuses.bonuses(FeatureKind::Weapon, &candidate) {
                if seen.insert(contribution.sequence) {
                    contributions.push(contribution);
                }
            }
        }

        WeaponLevel {
            damage_bonus: total(&contributions).floor() as i32,
            damage_tooltip: bonus_tooltip(&contributions, character.settings()),
            skill,
        }
    }

    fn best_default(
        &self,
        character: &dyn CharacterContext,
        defaults: &[SkillDefault],
        known: &[KnownSkill<'_>],
        blocked: Blocked<'_>,
        require_points: bool,
    ) -> Option<ChosenDefault> {
        let mut best: Option<ChosenDefault> = None;
        for default in defaults {
            let level = match &default.target {
                DefaultTarget::Attribute(attribute) => Some(character.attribute_value(*attribute)),
                DefaultTarget::Skill { name, specialization } => {
                    let specialization = (!specialization.is_empty()).then_some(specialization.as_str());
                    best_skill(known, name, specialization, blocked, require_points).map(|k| k.level)
                }
            };
            let Some(level) = level.map(|level| level + default.modifier) else {
                continue;
            };
            if best.as_ref().map_or(true, |b| level > b.level) {
                best = Some(ChosenDefault {
                    description: default.describe(),
                    level,
                    modifier: default.modifier,
                });
            }
        }
        best
    }
}

/// Highest-level resolved skill named `name`. `specialization` of `None`
/// accepts any specialization. Ties go to the earlier skill.
fn best_skill<'k, 't>(
    known: &'k [KnownSkill<'t>],
    name: &str,
    specialization: Option<&str>,
    blocked: Blocked<'_>,
    require_points: bool,
) -> Option<&'k KnownSkill<'t>> {
    let mut best: Option<&KnownSkill<'t>> = None;
    for k in known {
        let usable = k.owner.name() == name
            && specialization.map_or(true, |s| k.owner.specialization() == s)
            && k.level >= 0
            && (k.bought || !require_points)
            && !blocked(k);
        if usable && best.map_or(true, |b| k.level > b.level) {
            best = Some(k);
        }
    }
    best
}

/// Skills a trait's level can depend on, never the trait itself.
fn dependency_paths(own: &TraitPath, t: &Trait, skills: &[(TraitPath, &Trait)]) -> Vec<TraitPath> {
    let matching = |name: &str, specialization: &str| {
        skills
            .iter()
            .filter(move |(path, s)| {
                path != own
                    && s.name() == name
                    && (specialization.is_empty() || s.specialization() == specialization)
            })
            .map(|(path, _)| path.clone())
            .collect::<Vec<_>>()
    };
    match t.kind() {
        TraitKind::Skill(SkillData { defaults, .. }) | TraitKind::Weapon(WeaponData { defaults, .. }) => defaults
            .iter()
            .filter_map(|d| match &d.target {
                DefaultTarget::Skill { name, specialization } => Some(matching(name.as_str(), specialization.as_str())),
                DefaultTarget::Attribute(_) => None,
            })
            .flatten()
            .collect(),
        TraitKind::Spell(SpellData { ritual: Some(_), .. }) => matching(RITUAL_MAGIC_SKILL, ""),
        _ => Vec::new(),
    }
}

/// Levels a technique-style improvement buys: one per point for Average,
/// the first level costing two points otherwise.
fn technique_improvement(difficulty: SkillDifficulty, points: i32) -> i32 {
    match difficulty {
        SkillDifficulty::Easy | SkillDifficulty::Average => points.max(0),
        SkillDifficulty::Hard | SkillDifficulty::VeryHard => (points - 1).max(0),
    }
}

fn total(contributions: &[Contribution]) -> f64 {
    contributions.iter().map(|c| c.amount).sum()
}

fn bonus_tooltip(contributions: &[Contribution], settings: &SheetSettings) -> String {
    if contributions.is_empty() {
        return String::new();
    }
    if !settings.include_bonus_breakdown {
        return format!("Includes modifiers totaling {}", format_amount(total(contributions)));
    }
    let mut tooltip = String::from("Includes modifiers from:");
    for contribution in contributions {
        tooltip.push_str(&format!("\n  {} [{}]", contribution.source, format_amount(contribution.amount)));
    }
    tooltip
}

fn format_amount(amount: f64) -> String {
    if amount >= 0.0 {
        format!("+{amount}")
    } else {
        amount.to_string()
    }
}

/// Final stage: add bonuses to `baseline + relative`, floor, and apply the
/// sentinel rule.
fn finish(
    mut result: SkillLevel,
    baseline: i32,
    relative: i32,
    contributions: &[Contribution],
    settings: &SheetSettings,
) -> SkillLevel {
    let bonus = total(contributions);
    let level = (f64::from(baseline) + f64::from(relative) + bonus).floor() as i32;
    if level < 0 {
        return SkillLevel::untrained();
    }
    if !contributions.is_empty() {
        result.add_step("Bonuses", level - baseline - relative);
    }
    result.level = level;
    result.relative_level = level - baseline;
    result.tooltip = bonus_tooltip(contributions, settings);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_with_forced_sign() {
        assert_eq!(format_with_forced_sign(0), "+0");
        assert_eq!(format_with_forced_sign(2), "+2");
        assert_eq!(format_with_forced_sign(-3), "-3");
    }

    #[test]
    fn test_untrained_display() {
        assert_eq!(SkillLevel::untrained().display(), "-");
        assert!(SkillLevel::untrained().is_untrained());
    }

    #[test]
    fn test_technique_improvement() {
        assert_eq!(technique_improvement(SkillDifficulty::Average, 2), 2);
        assert_eq!(technique_improvement(SkillDifficulty::Hard, 1), 0);
        assert_eq!(technique_improvement(SkillDifficulty::Hard, 3), 2);
        assert_eq!(technique_improvement(SkillDifficulty::Hard, -2), 0);
    }

    #[test]
    fn test_finish_floors_fractional_bonus() {
        let contributions = vec![
            Contribution {
                amount: 0.5,
                source: "A".into(),
                sequence: 0,
            },
            Contribution {
                amount: 0.75,
                source: "B".into(),
                sequence: 1,
            },
        ];
        let level = finish(SkillLevel::new(), 10, 1, &contributions, &SheetSettings::default());
        assert_eq!(level.level, 12);
        assert_eq!(level.relative_level, 2);
        assert!(level.tooltip.contains("A [+0.5]"));
    }

    #[test]
    fn test_finish_negative_is_untrained() {
        let contributions = vec![Contribution {
            amount: -5.0,
            source: "Curse".into(),
            sequence: 0,
        }];
        let level = finish(SkillLevel::new(), 3, 0, &contributions, &SheetSettings::default());
        assert_eq!(level.level, UNTRAINED);
    }

    #[test]
    fn test_tooltip_total_only() {
        let settings = SheetSettings {
            include_bonus_breakdown: false,
            ..SheetSettings::default()
        };
        let contributions = vec![Contribution {
            amount: 2.0,
            source: "A".into(),
            sequence: 0,
        }];
        assert_eq!(bonus_tooltip(&contributions, &settings), "Includes modifiers totaling +2");
    }
}
