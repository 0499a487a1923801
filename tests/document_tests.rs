//! Tests for loading and saving documents.
//!
//! These tests verify:
//! - Every feature variant survives save and load, minimal and fully populated
//! - Unknown feature tags and unknown fields are written back
//! - A second save is byte-identical to the first
//! - Characters reload with their index rebuilt

use gurps_bonus::document::{self, load_character, load_feature, load_traits, save_character, save_feature, save_traits};
use gurps_bonus::*;

fn assert_stable(feature: &Feature) {
    let first = save_feature(feature).unwrap();
    let loaded = load_feature(&first).unwrap();
    assert_eq!(&loaded, feature);
    let second = save_feature(&loaded).unwrap();
    assert_eq!(first, second);
}

fn full_skill_bonus() -> SkillBonus {
    let mut bonus = SkillBonus::named("Guns", 1.0);
    bonus.specialization_mut().set_compare(StringCompareType::StartsWith);
    bonus.specialization_mut().set_qualifier("Pis");
    bonus.category_mut().set_compare(StringCompareType::Contains);
    bonus.category_mut().set_qualifier("Combat");
    bonus.set_amount(LeveledAmount::per_level(0.5));
    bonus
}

// ============================================================================
// Feature variants
// ============================================================================

#[test]
fn test_minimal_variants_round_trip() {
    let minimal: Vec<Feature> = vec![
        SkillBonus::default().into(),
        SpellBonus::default().into(),
        WeaponBonus::default().into(),
        AttributeBonus::new(Attribute::Will, LeveledAmount::default()).into(),
        SkillPointBonus::default().into(),
    ];
    for feature in &minimal {
        assert_stable(feature);
    }
}

#[test]
fn test_populated_variants_round_trip() {
    let mut weapon = WeaponBonus::named("sword", 2.0);
    weapon.name_mut().set_compare(StringCompareType::EndsWith);
    weapon.level_mut().set_compare(NumericCompareType::AtMost);
    weapon.level_mut().set_qualifier(14);

    let mut spell = SpellBonus::new(SpellMatchType::PowerSourceName, "Divine", LeveledAmount::per_level(1.0));
    spell.category_mut().set_compare(StringCompareType::DoesNotContain);
    spell.category_mut().set_qualifier("Evil");

    let mut points = SkillPointBonus::named("Karate", 4.0);
    points.specialization_mut().set_compare(StringCompareType::IsNot);
    points.specialization_mut().set_qualifier("Sport");

    let populated: Vec<Feature> = vec![
        full_skill_bonus().into(),
        weapon.into(),
        spell.into(),
        AttributeBonus::new(Attribute::Per, LeveledAmount::per_level(-1.0)).into(),
        points.into(),
    ];
    for feature in &populated {
        assert_stable(feature);
    }
}

#[test]
fn test_stable_tag_names() {
    let saved = save_feature(&WeaponBonus::named("Broadsword", 1.0).into()).unwrap();
    assert!(saved.contains("\"weapon_bonus\""));
    assert!(saved.contains("\"name\""));
    assert!(saved.contains("\"level\""));
    assert!(saved.contains("\"amount\""));
    assert!(saved.contains("\"per_level\""));
}

// ============================================================================
// Unknown data
// ============================================================================

#[test]
fn test_unknown_tag_preserved() {
    let json = r#"{ "reaction_bonus": { "amount": 2, "situation": "from royalty" } }"#;
    let feature = load_feature(json).unwrap();
    let Feature::Unrecognized(unknown) = &feature else {
        panic!("expected an unrecognized feature");
    };
    assert_eq!(unknown.tag, "reaction_bonus");
    assert!(feature.match_key().is_none());

    let saved = save_feature(&feature).unwrap();
    assert!(saved.contains("from royalty"));
    assert_stable(&feature);
}

#[test]
fn test_unknown_fields_preserved() {
    let json = r#"{
        "skill_bonus": {
            "name": { "compare": "is", "qualifier": "Karate" },
            "amount": 2.0,
            "limitation": "unarmed only"
        }
    }"#;
    let feature = load_feature(json).unwrap();
    assert_eq!(feature.match_key().unwrap().as_str(), "skill/Karate");

    let saved = save_feature(&feature).unwrap();
    assert!(saved.contains("\"limitation\": \"unarmed only\""));
    assert_stable(&feature);
}

#[test]
fn test_unknown_compare_token_saved_back() {
    let json = r#"{ "spell_bonus": { "match_type": "spell_name", "name": { "compare": "rhymes_with", "qualifier": "ball" } } }"#;
    let feature = load_feature(json).unwrap();
    assert_eq!(feature.match_key().unwrap().as_str(), "spell/*");
    assert!(save_feature(&feature).unwrap().contains("rhymes_with"));
    assert_stable(&feature);
}

// ============================================================================
// Traits and characters
// ============================================================================

fn sample_traits() -> Vec<Trait> {
    vec![
        Trait::container("Martial Arts")
            .with_child(
                Trait::skill("Karate", Attribute::Dx, SkillDifficulty::Hard)
                    .with_points(4)
                    .with_categories("Combat, Melee"),
            )
            .with_child(Trait::advantage("Karate Master").with_feature(SkillBonus::named("Karate", 2.0))),
        Trait::ritual_magic_spell("Fireball", "Fire", SkillDifficulty::Hard, 2).with_points(1),
        Trait::weapon("Broadsword", "sw+1").with_default(SkillDefault::skill("Broadsword", "", 0)),
        Trait::advantage("Talent").with_levels(2).with_feature(full_skill_bonus()),
    ]
}

#[test]
fn test_traits_round_trip() {
    let traits = sample_traits();
    let first = save_traits(&traits).unwrap();
    let loaded = load_traits(&first).unwrap();
    assert_eq!(loaded, traits);
    assert_eq!(save_traits(&loaded).unwrap(), first);
}

#[test]
fn test_character_round_trip() {
    let mut character = Character::new("Mai");
    character.set_attribute(Attribute::Dx, 13);
    character.set_settings(SheetSettings {
        nameable_marker: '%',
        ..SheetSettings::default()
    });
    for t in sample_traits() {
        character.add_trait(t);
    }

    let first = save_character(&character).unwrap();
    let loaded = load_character(&first).unwrap();
    assert_eq!(loaded.name(), "Mai");
    assert_eq!(loaded.base_attribute(Attribute::Dx), 13);
    assert_eq!(loaded.settings().nameable_marker, '%');
    assert_eq!(loaded.index().len(), character.index().len());
    assert_eq!(save_character(&loaded).unwrap(), first);

    let karate = loaded.trait_at(&TraitPath(vec![0, 0])).unwrap();
    assert_eq!(loaded.level_calculator().skill_level(karate).level, 15);
}

#[test]
fn test_character_defaults_when_fields_missing() {
    let character = load_character("{}").unwrap();
    assert_eq!(character.name(), "");
    assert!(character.traits().is_empty());
    assert_eq!(character.settings(), &SheetSettings::default());
}

#[test]
fn test_malformed_json_is_an_error() {
    assert!(matches!(load_traits("[{"), Err(DocumentError::Json(_))));
    assert!(matches!(
        load_traits(r#"[{ "name": "X", "kind": "advantage", "features": [ [] ] }]"#),
        Err(DocumentError::Json(_))
    ));
    assert!(document::load_character(r#"{ "attributes": { "luck": 3 } }"#).is_err());
}
