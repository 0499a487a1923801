//! Tests for the bonus index.
//!
//! These tests verify:
//! - Exact and wildcard bucket placement
//! - Lookup filtering among many unrelated bonuses
//! - Order stability under permutation of the trait list
//! - Malformed criteria and unknown features degrading without failing

use gurps_bonus::document;
use gurps_bonus::*;
use std::collections::BTreeSet;

fn karate_master() -> Trait {
    Trait::advantage("Karate Master").with_feature(SkillBonus::named("Karate", 2.0))
}

/// 99 bonuses that never apply to Karate, plus the one that does.
fn crowded_sheet() -> Vec<Trait> {
    let mut traits = Vec::new();
    for i in 0..99 {
        let feature: Feature = match i % 3 {
            0 => SkillBonus::named(&format!("Skill {i}"), 1.0).into(),
            1 => {
                let mut bonus = SkillBonus::named(&format!("Zz{i}"), 1.0);
                bonus.name_mut().set_compare(StringCompareType::StartsWith);
                bonus.into()
            }
            _ => WeaponBonus::named("Karate", 1.0).into(),
        };
        traits.push(Trait::advantage(&format!("Filler {i}")).with_feature(feature));
    }
    traits.insert(50, karate_master());
    traits
}

// ============================================================================
// Bucket placement and lookup
// ============================================================================

#[test]
fn test_karate_scenario_among_many() {
    let traits = crowded_sheet();
    let index = BonusIndex::rebuild(&traits);
    assert_eq!(index.len(), 100);
    assert_eq!(index.bucket(&MatchKey::from("skill/Karate")).len(), 1);

    let judo = index.lookup(FeatureKind::Skill, &MatchCandidate::new("Karate", "Judo"));
    assert_eq!(judo.len(), 1);
    assert_eq!(judo[0].owner(), "Karate Master");

    let plain = index.lookup(FeatureKind::Skill, &MatchCandidate::new("Karate", ""));
    assert_eq!(plain.len(), 1);

    let style = index.lookup(FeatureKind::Skill, &MatchCandidate::new("Karate Style", ""));
    assert!(style.is_empty());
}

#[test]
fn test_specialization_criteria_goes_to_wildcard() {
    let mut pistol = SkillBonus::named("Guns", 1.0);
    pistol.specialization_mut().set_compare(StringCompareType::Is);
    pistol.specialization_mut().set_qualifier("Pistol");
    let index = BonusIndex::rebuild(&[Trait::advantage("Gunslinger").with_feature(pistol)]);

    assert_eq!(index.bucket(&MatchKey::wildcard("skill")).len(), 1);
    assert_eq!(index.lookup(FeatureKind::Skill, &MatchCandidate::new("Guns", "Pistol")).len(), 1);
    assert!(index.lookup(FeatureKind::Skill, &MatchCandidate::new("Guns", "Rifle")).is_empty());
}

#[test]
fn test_all_colleges_spell_bonus() {
    let all = SpellBonus::new(SpellMatchType::AllColleges, "", LeveledAmount::flat(1.0));
    let index = BonusIndex::rebuild(&[Trait::advantage("Magery").with_feature(all)]);
    assert_eq!(index.bucket(&MatchKey::from("spell.college/*")).len(), 1);

    let fireball = Trait::spell("Fireball", "Fire", SkillDifficulty::Hard);
    assert_eq!(index.lookup(FeatureKind::SpellCollege, &fireball.candidate()).len(), 1);
    assert!(index.lookup(FeatureKind::Spell, &fireball.candidate()).is_empty());
}

#[test]
fn test_per_level_bonus_scales_with_owner() {
    let mut bonus = SkillBonus::named("Karate", 0.0);
    assert!(bonus.set_amount(LeveledAmount::per_level(1.0)));
    let talent = Trait::advantage("Born Fighter").with_levels(2).with_feature(bonus);
    let index = BonusIndex::rebuild(&[talent]);
    let total: f64 = index
        .bonuses(FeatureKind::Skill, &MatchCandidate::new("Karate", ""))
        .iter()
        .map(|c| c.amount)
        .sum();
    assert_eq!(total, 2.0);
}

// ============================================================================
// Rebuild semantics
// ============================================================================

#[test]
fn test_permutation_keeps_set_and_insertion_order() {
    let mut wildcard = SkillBonus::named("kar", 1.0);
    wildcard.name_mut().set_compare(StringCompareType::Contains);
    let traits = vec![
        Trait::advantage("A").with_feature(SkillBonus::named("Karate", 1.0)),
        Trait::advantage("B").with_feature(wildcard),
        Trait::advantage("C").with_feature(SkillBonus::named("Karate", 3.0)),
        Trait::advantage("D").with_feature(SkillBonus::named("Judo", 3.0)),
    ];
    let mut reversed = traits.clone();
    reversed.reverse();

    let candidate = MatchCandidate::new("Karate", "");
    let owners = |traits: &[Trait]| -> Vec<String> {
        BonusIndex::rebuild(traits)
            .lookup(FeatureKind::Skill, &candidate)
            .iter()
            .map(|entry| entry.owner().to_string())
            .collect()
    };

    let forward = owners(&traits);
    let backward = owners(&reversed);
    assert_eq!(forward, vec!["A", "B", "C"]);
    assert_eq!(backward, vec!["C", "B", "A"]);

    let forward_set: BTreeSet<String> = forward.into_iter().collect();
    let backward_set: BTreeSet<String> = backward.into_iter().collect();
    assert_eq!(forward_set, backward_set);
}

#[test]
fn test_index_is_stale_until_rebuilt() {
    let mut traits = vec![karate_master()];
    let index = BonusIndex::rebuild(&traits);

    if let Feature::SkillBonus(bonus) = &mut traits[0].features_mut()[0] {
        bonus.name_mut().set_qualifier("Judo");
    }
    assert_eq!(index.bucket(&MatchKey::from("skill/Karate")).len(), 1);

    let rebuilt = BonusIndex::rebuild(&traits);
    assert!(rebuilt.bucket(&MatchKey::from("skill/Karate")).is_empty());
    assert_eq!(rebuilt.bucket(&MatchKey::from("skill/Judo")).len(), 1);
}

#[test]
fn test_rebuild_is_deterministic() {
    let traits = crowded_sheet();
    let first = BonusIndex::rebuild(&traits);
    let second = BonusIndex::rebuild(&traits);
    let candidate = MatchCandidate::new("Karate", "").with_level(12);
    for kind in [FeatureKind::Skill, FeatureKind::Weapon] {
        let a: Vec<usize> = first.lookup(kind, &candidate).iter().map(|e| e.sequence()).collect();
        let b: Vec<usize> = second.lookup(kind, &candidate).iter().map(|e| e.sequence()).collect();
        assert_eq!(a, b);
    }
}

// ============================================================================
// Degraded data
// ============================================================================

#[test]
fn test_malformed_compare_is_wildcard_with_diagnostic() {
    let json = r#"[
        {
            "name": "Odd Mentor",
            "kind": "advantage",
            "features": [
                { "skill_bonus": { "name": { "compare": "sounds_like", "qualifier": "Karate" }, "amount": 1.0 } }
            ]
        }
    ]"#;
    let traits = document::load_traits(json).unwrap();
    let index = BonusIndex::rebuild(&traits);

    assert_eq!(index.bucket(&MatchKey::wildcard("skill")).len(), 1);
    assert_eq!(index.lookup(FeatureKind::Skill, &MatchCandidate::new("Anything", "")).len(), 1);
    assert_eq!(
        index.diagnostics(),
        &[Diagnostic::MalformedCriteria {
            owner: "Odd Mentor".into(),
            field: "name".into(),
            token: "sounds_like".into(),
        }]
    );

    let saved = document::save_traits(&traits).unwrap();
    assert!(saved.contains("\"sounds_like\""));
}

#[test]
fn test_malformed_level_is_wildcard() {
    let json = r#"[
        {
            "name": "Sword Master",
            "kind": "advantage",
            "features": [
                {
                    "weapon_bonus": {
                        "name": { "compare": "is", "qualifier": "Broadsword" },
                        "level": { "compare": "bogus", "qualifier": 10 },
                        "amount": 1
                    }
                }
            ]
        }
    ]"#;
    let traits = document::load_traits(json).unwrap();
    let index = BonusIndex::rebuild(&traits);

    assert!(index.bucket(&MatchKey::from("weapon/Broadsword")).is_empty());
    assert_eq!(index.bucket(&MatchKey::wildcard("weapon")).len(), 1);
    let candidate = MatchCandidate::new("Broadsword", "").with_level(4);
    assert_eq!(index.lookup(FeatureKind::Weapon, &candidate).len(), 1);
    assert!(matches!(
        index.diagnostics(),
        [Diagnostic::MalformedCriteria { field, token, .. }] if field == "level" && token == "bogus"
    ));
}

#[test]
fn test_malformed_category_is_wildcard() {
    let json = r#"[
        {
            "name": "Dojo Training",
            "kind": "advantage",
            "features": [
                {
                    "skill_bonus": {
                        "name": { "compare": "is", "qualifier": "Karate" },
                        "category": { "compare": "resembles", "qualifier": "Combat" },
                        "amount": 1
                    }
                }
            ]
        }
    ]"#;
    let traits = document::load_traits(json).unwrap();
    let index = BonusIndex::rebuild(&traits);

    assert!(index.bucket(&MatchKey::from("skill/Karate")).is_empty());
    assert_eq!(index.bucket(&MatchKey::wildcard("skill")).len(), 1);
    assert_eq!(index.lookup(FeatureKind::Skill, &MatchCandidate::new("Karate", "")).len(), 1);
    assert!(matches!(
        index.diagnostics(),
        [Diagnostic::MalformedCriteria { field, .. }] if field == "category"
    ));
}

#[test]
fn test_unknown_feature_is_not_indexed() {
    let json = r#"[
        { "name": "Charming", "kind": "advantage", "features": [ { "reaction_bonus": { "amount": 2 } } ] }
    ]"#;
    let traits = document::load_traits(json).unwrap();
    let index = BonusIndex::rebuild(&traits);

    assert!(index.is_empty());
    assert!(matches!(
        index.diagnostics(),
        [Diagnostic::StructuralInconsistency { owner, .. }] if owner == "Charming"
    ));
}
