//! Resolver: runs the cascade over two skeletons and assembles the result.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use hashbrown::HashMap;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::cascade::{strategy_for, MatchContext, SkeletonFacts};
use crate::config::{PassKind, ResolverConfig};
use crate::error::{Result, RigError};
use crate::ids::{JointId, JointRef};
use crate::normalize::normalize_name;
use crate::skeleton::Skeleton;
use crate::synonyms::{SynonymTable, TypeClassifier};
use crate::synthesis::{MissingJointSynthesizer, SynthesisFailureReason, SynthesizedJoint};
use crate::table::{CorrespondenceTable, ResolutionMethod};
use crate::taxonomy::CanonicalType;

/// Manual pairing of a reference joint with a target joint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Override {
    pub reference: JointRef,
    pub target: JointRef,
}

impl Override {
    pub fn new(reference: impl Into<JointRef>, target: impl Into<JointRef>) -> Self {
        Self {
            reference: reference.into(),
            target: target.into(),
        }
    }
}

/// Caller input beyond the two skeletons.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveRequest {
    /// Validated canonical types for reference joints. When present, name
    /// classification of the reference is skipped entirely.
    pub reference_types: Option<HashMap<JointId, CanonicalType>>,
    pub overrides: Vec<Override>,
    pub exclusions: Vec<JointRef>,
}

impl ResolveRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reference_types(mut self, types: HashMap<JointId, CanonicalType>) -> Self {
        self.reference_types = Some(types);
        self
    }

    pub fn with_override(
        mut self,
        reference: impl Into<JointRef>,
        target: impl Into<JointRef>,
    ) -> Self {
        self.overrides.push(Override::new(reference, target));
        self
    }

    pub fn with_exclusion(mut self, reference: impl Into<JointRef>) -> Self {
        self.exclusions.push(reference.into());
        self
    }
}

/// Non-fatal conditions reported alongside a resolution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolveIssue {
    /// No reference joint carries a canonical type; only name and spatial
    /// passes ran.
    UnclassifiableReference,
    /// A reference joint ended without any entry.
    UnresolvedJoint { joint: JointId },
    /// An essential joint could not be synthesized.
    SynthesisFailure {
        ty: CanonicalType,
        joint: JointId,
        reason: SynthesisFailureReason,
    },
    /// An override or exclusion named a joint that does not exist.
    UnknownOverride { key: String },
    /// The work budget ran out before these passes.
    BudgetExhausted {
        skipped: Vec<PassKind>,
        synthesis_skipped: bool,
    },
}

impl std::fmt::Display for ResolveIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveIssue::UnclassifiableReference => {
                write!(f, "reference skeleton has no canonical types")
            }
            ResolveIssue::UnresolvedJoint { joint } => write!(f, "joint {joint} unresolved"),
            ResolveIssue::SynthesisFailure { ty, joint, reason } => {
                write!(f, "could not synthesize {ty} ({joint}): {reason}")
            }
            ResolveIssue::UnknownOverride { key } => write!(f, "unknown override joint {key}"),
            ResolveIssue::BudgetExhausted {
                skipped,
                synthesis_skipped,
            } => write!(
                f,
                "budget exhausted, skipped {skipped:?} (synthesis skipped: {synthesis_skipped})"
            ),
        }
    }
}

/// Counters for one run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolveStats {
    pub by_method: BTreeMap<ResolutionMethod, usize>,
    pub passes_run: Vec<PassKind>,
    pub comparisons: u64,
    pub synthesized: usize,
    pub elapsed_millis: u64,
}

/// Output of [`Resolver::resolve`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub table: CorrespondenceTable,
    pub synthesized: Vec<SynthesizedJoint>,
    /// Essential types the reference has but the target still lacks.
    pub unresolved_essentials: Vec<CanonicalType>,
    /// Indexed reference joints without any entry.
    pub unresolved: Vec<JointId>,
    pub issues: Vec<ResolveIssue>,
    pub stats: ResolveStats,
}

/// Joint-correspondence resolver. Holds only read-only configuration, so one
/// instance can serve any number of runs.
#[derive(Clone, Debug)]
pub struct Resolver {
    config: ResolverConfig,
    classifier: TypeClassifier,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(ResolverConfig::default())
    }
}

impl Resolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self::with_synonyms(config, SynonymTable::standard())
    }

    pub fn with_synonyms(config: ResolverConfig, table: Arc<SynonymTable>) -> Self {
        let classifier = TypeClassifier::new(table, config.name_mode);
        Self { config, classifier }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn classifier(&self) -> &TypeClassifier {
        &self.classifier
    }

    /// Match `reference` against `target`.
    ///
    /// Only synthesis mutates `target`, and only by appending joints. Fails
    /// with [`RigError::InvalidInput`] for an empty skeleton or reference
    /// types naming joints the reference does not have.
    pub fn resolve(
        &self,
        reference: &Skeleton,
        target: &mut Skeleton,
        request: &ResolveRequest,
    ) -> Result<Resolution> {
        let started = Instant::now();
        if reference.is_empty() {
            return Err(RigError::invalid("reference skeleton is empty"));
        }
        if target.is_empty() {
            return Err(RigError::invalid("target skeleton is empty"));
        }
        if let Some(types) = &request.reference_types {
            if let Some(bad) = types.keys().find(|id| !reference.contains(**id)) {
                return Err(RigError::invalid(format!(
                    "reference type assigned to unknown joint {bad}"
                )));
            }
        }

        let config = &self.config;
        let reference_facts = SkeletonFacts::build(
            reference,
            &self.classifier,
            request.reference_types.as_ref(),
            config,
        )
        .ok_or_else(|| RigError::invalid("reference skeleton has no root"))?;
        let target_facts = SkeletonFacts::build(target, &self.classifier, None, config)
            .ok_or_else(|| RigError::invalid("target skeleton has no root"))?;

        let mut table = CorrespondenceTable::new();
        let mut issues = Vec::new();
        let mut stats = ResolveStats::default();

        self.apply_manual(reference, target, request, &mut table, &mut issues);
        self.apply_auto_exclusions(&reference_facts, &mut table);

        let classified = reference_facts.has_types();
        if !classified {
            issues.push(ResolveIssue::UnclassifiableReference);
        }

        // Matching passes.
        let comparisons = Cell::new(0u64);
        let mut skipped = Vec::new();
        let candidates = target_facts.index.order().to_vec();
        for &kind in &config.passes {
            if !classified && matches!(kind, PassKind::CanonicalType | PassKind::HierarchyPattern) {
                continue;
            }
            if self.budget_spent(started, comparisons.get()) {
                skipped.push(kind);
                continue;
            }
            let strategy = strategy_for(kind);
            for &joint in reference_facts.index.order() {
                if table.contains(joint) {
                    continue;
                }
                let found = {
                    let cx = MatchContext::new(
                        reference,
                        target,
                        &reference_facts,
                        &target_facts,
                        &table,
                        config,
                        &comparisons,
                    );
                    strategy.find(joint, &candidates, &cx)
                };
                if let Some(t) = found {
                    debug!(
                        "{:?}: '{}' -> '{}'",
                        kind,
                        reference.name_of(joint).unwrap_or_default(),
                        target.name_of(t).unwrap_or_default()
                    );
                    table.assign(joint, Some(t), strategy.method(), false);
                }
            }
            stats.passes_run.push(kind);
        }

        // Synthesis of essential joints.
        let synthesis_wanted = config.synthesis.enabled && classified;
        let synthesis_skipped =
            synthesis_wanted && self.budget_spent(started, comparisons.get());
        let mut synth =
            MissingJointSynthesizer::new(reference, &reference_facts, config.synthesis.max_depth);
        if synthesis_wanted && !synthesis_skipped {
            for &ty in &config.essential {
                let Some(joint) = synth.representative(ty) else {
                    continue;
                };
                if table.contains(joint) {
                    continue;
                }
                if let Err(reason) = synth.synthesize(joint, target, &mut table) {
                    issues.push(ResolveIssue::SynthesisFailure { ty, joint, reason });
                }
            }
        }
        if !skipped.is_empty() || synthesis_skipped {
            issues.push(ResolveIssue::BudgetExhausted {
                skipped,
                synthesis_skipped,
            });
        }

        let unresolved_essentials: Vec<CanonicalType> = if classified {
            config
                .essential
                .iter()
                .copied()
                .filter(|&ty| synth.representative(ty).is_some_and(|j| !table.contains(j)))
                .collect()
        } else {
            Vec::new()
        };
        let synthesized = synth.into_created();

        let unresolved: Vec<JointId> = reference_facts
            .index
            .order()
            .iter()
            .copied()
            .filter(|&j| !table.contains(j))
            .collect();

        for issue in &issues {
            warn!("resolve '{}' -> '{}': {}", reference.name, target.name, issue);
        }
        for &joint in &unresolved {
            debug!(
                "unresolved: '{}'",
                reference.name_of(joint).unwrap_or_default()
            );
            issues.push(ResolveIssue::UnresolvedJoint { joint });
        }

        for entry in table.iter() {
            *stats.by_method.entry(entry.method).or_insert(0) += 1;
        }
        stats.comparisons = comparisons.get();
        stats.synthesized = synthesized.len();
        stats.elapsed_millis = started.elapsed().as_millis() as u64;
        info!(
            "resolved '{}' -> '{}': {} entries, {} synthesized, {} unresolved, {:?}",
            reference.name,
            target.name,
            table.len(),
            synthesized.len(),
            unresolved.len(),
            stats.by_method
        );

        Ok(Resolution {
            table,
            synthesized,
            unresolved_essentials,
            unresolved,
            issues,
            stats,
        })
    }

    /// Exclusions first, then overrides; an excluded joint cannot be overridden.
    fn apply_manual(
        &self,
        reference: &Skeleton,
        target: &Skeleton,
        request: &ResolveRequest,
        table: &mut CorrespondenceTable,
        issues: &mut Vec<ResolveIssue>,
    ) {
        for key in &request.exclusions {
            match reference.resolve(key) {
                Ok(joint) => {
                    table.assign(joint, None, ResolutionMethod::ExplicitlyExcluded, true);
                }
                Err(_) => issues.push(ResolveIssue::UnknownOverride {
                    key: key.to_string(),
                }),
            }
        }
        for pair in &request.overrides {
            match (reference.resolve(&pair.reference), target.resolve(&pair.target)) {
                (Ok(r), Ok(t)) => {
                    table.assign(r, Some(t), ResolutionMethod::ManualOverride, true);
                }
                _ => issues.push(ResolveIssue::UnknownOverride {
                    key: format!("{} -> {}", pair.reference, pair.target),
                }),
            }
        }
    }

    fn apply_auto_exclusions(&self, facts: &SkeletonFacts, table: &mut CorrespondenceTable) {
        let keywords: Vec<String> = self
            .config
            .auto_exclude_keywords
            .iter()
            .map(|k| normalize_name(k, self.config.name_mode))
            .filter(|k| !k.is_empty())
            .collect();
        if keywords.is_empty() {
            return;
        }
        for &joint in facts.index.order() {
            let Some(f) = facts.get(joint) else {
                continue;
            };
            if keywords.iter().any(|k| f.normalized.contains(k.as_str())) {
                table.assign(joint, None, ResolutionMethod::ExplicitlyExcluded, false);
            }
        }
    }

    fn budget_spent(&self, started: Instant, comparisons: u64) -> bool {
        let budget = &self.config.budget;
        budget.max_comparisons.is_some_and(|max| comparisons >= max)
            || budget
                .max_millis
                .is_some_and(|max| started.elapsed().as_millis() as u64 >= max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::test_support::skeleton;

    fn reference() -> Skeleton {
        skeleton(
            "body",
            &[
                ("Armature", 0, [0.0, 0.0, 0.0]),
                ("Hips", 0, [0.0, 1.0, 0.0]),
                ("Spine", 1, [0.0, 0.1, 0.0]),
                ("Chest", 2, [0.0, 0.1, 0.0]),
                ("Tail", 1, [0.0, 0.0, -0.3]),
            ],
        )
    }

    fn target() -> Skeleton {
        skeleton(
            "outfit",
            &[
                ("Armature", 0, [0.0, 0.0, 0.0]),
                ("Hips", 0, [0.0, 1.0, 0.0]),
                ("spine_01", 1, [0.0, 0.1, 0.0]),
                ("Chest", 2, [0.0, 0.1, 0.0]),
                ("Skirt", 1, [0.0, -0.1, -0.3]),
            ],
        )
    }

    #[test]
    fn empty_skeletons_are_invalid_input() {
        let resolver = Resolver::default();
        let mut empty = Skeleton::new("empty");
        let err = resolver
            .resolve(&reference(), &mut empty, &ResolveRequest::new())
            .unwrap_err();
        assert!(matches!(err, RigError::InvalidInput { .. }));
        let err = resolver
            .resolve(&Skeleton::new("none"), &mut target(), &ResolveRequest::new())
            .unwrap_err();
        assert_eq!(err.category(), "validation");
    }

    #[test]
    fn unknown_reference_type_ids_are_invalid_input() {
        let mut types = HashMap::new();
        types.insert(JointId(42), CanonicalType::Hips);
        let request = ResolveRequest::new().with_reference_types(types);
        let err = Resolver::default()
            .resolve(&reference(), &mut target(), &request)
            .unwrap_err();
        assert!(matches!(err, RigError::InvalidInput { .. }));
    }

    #[test]
    fn reference_types_round_trip_through_json() {
        let reference = reference();
        let mut types = HashMap::new();
        types.insert(reference.find_by_name("Hips").unwrap(), CanonicalType::Hips);
        types.insert(reference.find_by_name("Chest").unwrap(), CanonicalType::Chest);
        let request = ResolveRequest::new()
            .with_reference_types(types)
            .with_override("Tail", "Skirt");
        let json = serde_json::to_string(&request).unwrap();
        let back: ResolveRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, request);

        let out = Resolver::default()
            .resolve(&reference, &mut target(), &back)
            .unwrap();
        let spine = reference.find_by_name("Spine").unwrap();
        // Only the supplied types count, so Spine is untyped here.
        assert_ne!(out.table.get(spine).map(|e| e.method), Some(ResolutionMethod::CanonicalType));
    }

    #[test]
    fn passes_fill_in_order() {
        let reference = reference();
        let mut target = target();
        let out = Resolver::default()
            .resolve(&reference, &mut target, &ResolveRequest::new())
            .unwrap();
        let method = |name: &str| {
            out.table
                .get(reference.find_by_name(name).unwrap())
                .map(|e| e.method)
        };
        assert_eq!(method("Hips"), Some(ResolutionMethod::ExactName));
        assert_eq!(method("Spine"), Some(ResolutionMethod::NormalizedName));
        assert_eq!(method("Chest"), Some(ResolutionMethod::ExactName));
        assert_eq!(out.stats.passes_run, PassKind::DEFAULT_ORDER.to_vec());
        assert!(out.stats.comparisons > 0);
    }

    #[test]
    fn manual_overrides_and_exclusions() {
        let reference = reference();
        let mut target = target();
        let request = ResolveRequest::new()
            .with_exclusion("Tail")
            .with_exclusion("Missing")
            .with_override("Tail", "Skirt")
            .with_override("Chest", "spine_01");
        let out = Resolver::default()
            .resolve(&reference, &mut target, &request)
            .unwrap();

        let tail = out.table.get(reference.find_by_name("Tail").unwrap()).unwrap();
        assert_eq!(tail.method, ResolutionMethod::ExplicitlyExcluded);
        assert_eq!(tail.target, None);
        assert!(tail.manual);

        let chest = out.table.get(reference.find_by_name("Chest").unwrap()).unwrap();
        assert_eq!(chest.method, ResolutionMethod::ManualOverride);
        assert_eq!(chest.target, target.find_by_name("spine_01"));
        assert!(out.issues.contains(&ResolveIssue::UnknownOverride {
            key: "'Missing'".to_string()
        }));
    }

    #[test]
    fn accessory_keywords_exclude_automatically() {
        let reference = reference();
        let mut target = target();
        let resolver = Resolver::new(ResolverConfig::default().with_accessory_exclusions());
        let out = resolver
            .resolve(&reference, &mut target, &ResolveRequest::new())
            .unwrap();
        let tail = out.table.get(reference.find_by_name("Tail").unwrap()).unwrap();
        assert_eq!(tail.method, ResolutionMethod::ExplicitlyExcluded);
        assert!(!tail.manual);
    }

    #[test]
    fn comparison_budget_skips_later_passes() {
        let reference = reference();
        let mut target = target();
        let mut config = ResolverConfig::default();
        config.budget.max_comparisons = Some(1);
        let out = Resolver::new(config)
            .resolve(&reference, &mut target, &ResolveRequest::new())
            .unwrap();
        assert_eq!(out.stats.passes_run, vec![PassKind::ExactName]);
        let skipped = out.issues.iter().find_map(|i| match i {
            ResolveIssue::BudgetExhausted { skipped, .. } => Some(skipped.clone()),
            _ => None,
        });
        assert_eq!(skipped.map(|s| s.len()), Some(4));
    }

    #[test]
    fn empty_reference_types_degrade_to_name_and_spatial() {
        let reference = reference();
        let mut target = target();
        let request = ResolveRequest::new().with_reference_types(HashMap::new());
        let out = Resolver::default()
            .resolve(&reference, &mut target, &request)
            .unwrap();
        assert!(out.issues.contains(&ResolveIssue::UnclassifiableReference));
        assert!(!out.stats.passes_run.contains(&PassKind::CanonicalType));
        assert!(!out.stats.passes_run.contains(&PassKind::HierarchyPattern));
        assert!(out.synthesized.is_empty());
        assert!(out.unresolved_essentials.is_empty());
    }
}
