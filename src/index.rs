//! Bonus index module.
//!
//! The `BonusIndex` files every active feature of a character under its
//! match key so level calculation can find the bonuses for a trait without
//! testing every feature on the sheet. Exact-name features land in their own
//! bucket; everything else lands in the wildcard bucket of its kind and is
//! filtered by criteria at lookup time.
//!
//! The index is never updated in place. After any structural change to the
//! trait list (adding, removing or renaming traits, editing criteria) the
//! owner builds a fresh index with [`BonusIndex::rebuild`] and drops the old
//! one.

use crate::attribute::Attribute;
use crate::error::Diagnostic;
use crate::feature::{Feature, FeatureKind, MatchCandidate};
use crate::key::MatchKey;
use crate::traits::{walk_list, Trait};
use std::collections::HashMap;
use tracing::{debug, trace, warn};

/// A feature as filed in the index, with the owner data needed to apply it.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedFeature {
    sequence: usize,
    feature: Feature,
    owner: String,
    owner_levels: Option<i32>,
}

impl IndexedFeature {
    /// Position in the rebuild pass; lookups return features in this order.
    pub fn sequence(&self) -> usize {
        self.sequence
    }

    /// The indexed copy of the feature.
    pub fn feature(&self) -> &Feature {
        &self.feature
    }

    /// Name of the trait that owns the feature.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// The feature's amount with per-level multiplication applied.
    pub fn effective_amount(&self) -> f64 {
        self.feature
            .amount()
            .map_or(0.0, |amount| amount.effective(self.owner_levels))
    }
}

/// One bonus applied to a value, for totals and tooltips.
#[derive(Debug, Clone, PartialEq)]
pub struct Contribution {
    pub amount: f64,
    /// Who granted it, usually the owning trait's name.
    pub source: String,
    /// Identity of the granting feature within its lookup source, so a
    /// bonus reached through several queries is counted once.
    pub sequence: usize,
}

/// Source of bonuses for level calculation.
///
/// [`BonusIndex`] is the production implementation; tests substitute their
/// own to observe how the calculator queries bonuses.
pub trait BonusLookup {
    /// Bonuses of `kind` that apply to `candidate`, in a stable order.
    fn bonuses(&self, kind: FeatureKind, candidate: &MatchCandidate<'_>) -> Vec<Contribution>;
}

/// Match-key multimap of a character's active features.
///
/// # Examples
///
/// ```rust
/// use gurps_bonus::{BonusIndex, FeatureKind, MatchCandidate, SkillBonus, Trait};
///
/// let traits = vec![Trait::advantage("Karate Master").with_feature(SkillBonus::named("Karate", 2.0))];
/// let index = BonusIndex::rebuild(&traits);
///
/// let found = index.lookup(FeatureKind::Skill, &MatchCandidate::new("Karate", "Judo"));
/// assert_eq!(found.len(), 1);
/// assert_eq!(found[0].owner(), "Karate Master");
/// ```
#[derive(Debug, Clone, Default)]
pub struct BonusIndex {
    buckets: HashMap<MatchKey, Vec<IndexedFeature>>,
    len: usize,
    diagnostics: Vec<Diagnostic>,
}

impl BonusIndex {
    /// An empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index over every feature owned by `traits` and their
    /// descendants, in depth-first order.
    ///
    /// Nothing here fails: unrecognized features are skipped and features
    /// with unrecognized compare types are filed under their wildcard key,
    /// each with a [`Diagnostic`].
    pub fn rebuild(traits: &[Trait]) -> Self {
        let mut index = Self::new();
        for (path, owner) in walk_list(traits) {
            for feature in owner.features() {
                let Some(key) = feature.match_key() else {
                    let tag = match feature {
                        Feature::Unrecognized(unknown) => unknown.tag.as_str(),
                        _ => "?",
                    };
                    warn!(owner = owner.name(), %path, tag, "ignoring unrecognized feature");
                    index.diagnostics.push(Diagnostic::StructuralInconsistency {
                        owner: owner.name().to_string(),
                        detail: format!("unrecognized feature '{tag}' ignored"),
                    });
                    continue;
                };
                for field in feature.malformed_fields() {
                    let token = malformed_token(feature, field);
                    warn!(owner = owner.name(), field, token = %token, key = %key, "malformed criteria indexed as wildcard");
                    index.diagnostics.push(Diagnostic::MalformedCriteria {
                        owner: owner.name().to_string(),
                        field: field.to_string(),
                        token,
                    });
                }
                index.insert(key, feature.clone(), owner);
            }
        }
        debug!(
            features = index.len,
            buckets = index.buckets.len(),
            diagnostics = index.diagnostics.len(),
            "rebuilt bonus index"
        );
        index
    }

    fn insert(&mut self, key: MatchKey, feature: Feature, owner: &Trait) {
        let entry = IndexedFeature {
            sequence: self.len,
            feature,
            owner: owner.name().to_string(),
            owner_levels: owner.levels(),
        };
        self.buckets.entry(key).or_default().push(entry);
        self.len += 1;
    }

    /// Number of indexed features.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no feature was indexed.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Anomalies found by the rebuild that produced this index.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// The raw contents of one bucket.
    pub fn bucket(&self, key: &MatchKey) -> &[IndexedFeature] {
        self.buckets.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Features of `kind` that apply to `candidate`.
    ///
    /// Probes the exact-name bucket, always scans the wildcard bucket, keeps
    /// only features whose criteria all accept the candidate, and returns
    /// them in rebuild order.
    pub fn lookup(&self, kind: FeatureKind, candidate: &MatchCandidate<'_>) -> Vec<&IndexedFeature> {
        let exact = MatchKey::exact(kind.prefix(), candidate.probe_name(kind));
        let wildcard = MatchKey::wildcard(kind.prefix());

        let mut found: Vec<&IndexedFeature> = self.bucket(&wildcard).iter().collect();
        if exact != wildcard {
            found.extend(self.bucket(&exact));
        }
        found.retain(|entry| entry.feature.kind() == Some(kind) && entry.feature.contributes(candidate));
        found.sort_by_key(|entry| entry.sequence);
        trace!(%exact, matches = found.len(), "bonus lookup");
        found
    }

    /// Total of the attribute bonuses for `attribute`.
    pub fn attribute_bonus(&self, attribute: Attribute) -> f64 {
        let key = MatchKey::exact(FeatureKind::Attribute.prefix(), attribute.abbreviation());
        self.bucket(&key).iter().map(IndexedFeature::effective_amount).sum()
    }
}

fn malformed_token(feature: &Feature, field: &str) -> String {
    let token = match (feature, field) {
        (Feature::SkillBonus(b), "name") => b.name().compare().token(),
        (Feature::SkillBonus(b), "specialization") => b.specialization().compare().token(),
        (Feature::SkillBonus(b), _) => b.category().compare().token(),
        (Feature::SkillPointBonus(b), "name") => b.name().compare().token(),
        (Feature::SkillPointBonus(b), "specialization") => b.specialization().compare().token(),
        (Feature::SkillPointBonus(b), _) => b.category.compare().token(),
        (Feature::WeaponBonus(b), "name") => b.name().compare().token(),
        (Feature::WeaponBonus(b), "specialization") => b.specialization().compare().token(),
        (Feature::WeaponBonus(b), "level") => b.level().compare().token(),
        (Feature::WeaponBonus(b), _) => b.category.compare().token(),
        (Feature::SpellBonus(b), "name") => b.name().compare().token(),
        (Feature::SpellBonus(b), _) => b.category.compare().token(),
        _ => "",
    };
    token.to_string()
}

impl BonusLookup for BonusIndex {
    fn bonuses(&self, kind: FeatureKind, candidate: &MatchCandidate<'_>) -> Vec<Contribution> {
        self.lookup(kind, candidate)
            .into_iter()
            .map(|entry| Contribution {
                amount: entry.effective_amount(),
                source: entry.owner.clone(),
                sequence: entry.sequence,
            })
            .collect()
    }
}
