//! Correspondence table: the output of one resolution run.

use std::collections::BTreeMap;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::ids::JointId;
use crate::skeleton::Skeleton;

/// How a correspondence was established.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResolutionMethod {
    ExactName,
    NormalizedName,
    CanonicalType,
    HierarchyPattern,
    SpatialProximity,
    Synthesized,
    ManualOverride,
    ExplicitlyExcluded,
}

impl ResolutionMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            ResolutionMethod::ExactName => "exact_name",
            ResolutionMethod::NormalizedName => "normalized_name",
            ResolutionMethod::CanonicalType => "canonical_type",
            ResolutionMethod::HierarchyPattern => "hierarchy_pattern",
            ResolutionMethod::SpatialProximity => "spatial_proximity",
            ResolutionMethod::Synthesized => "synthesized",
            ResolutionMethod::ManualOverride => "manual_override",
            ResolutionMethod::ExplicitlyExcluded => "explicitly_excluded",
        }
    }
}

impl std::fmt::Display for ResolutionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrespondenceEntry {
    pub reference: JointId,
    /// `None` only for excluded joints.
    pub target: Option<JointId>,
    pub method: ResolutionMethod,
    pub manual: bool,
}

/// Reference joint -> entry, at most one entry per reference joint.
///
/// Several reference joints may share a target (exact-name aliasing); the
/// claim counts record that instead of forbidding it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrespondenceTable {
    entries: BTreeMap<JointId, CorrespondenceEntry>,
    #[serde(skip)]
    claims: HashMap<JointId, u32>,
}

impl CorrespondenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entry unless the reference joint already has one.
    /// Returns whether the entry was stored.
    pub(crate) fn assign(
        &mut self,
        reference: JointId,
        target: Option<JointId>,
        method: ResolutionMethod,
        manual: bool,
    ) -> bool {
        if self.entries.contains_key(&reference) {
            return false;
        }
        if let Some(t) = target {
            *self.claims.entry(t).or_insert(0) += 1;
        }
        self.entries.insert(
            reference,
            CorrespondenceEntry {
                reference,
                target,
                method,
                manual,
            },
        );
        true
    }

    pub fn get(&self, reference: JointId) -> Option<&CorrespondenceEntry> {
        self.entries.get(&reference)
    }

    pub fn target_of(&self, reference: JointId) -> Option<JointId> {
        self.entries.get(&reference).and_then(|e| e.target)
    }

    pub fn contains(&self, reference: JointId) -> bool {
        self.entries.contains_key(&reference)
    }

    pub fn is_claimed(&self, target: JointId) -> bool {
        self.claim_count(target) > 0
    }

    pub fn claim_count(&self, target: JointId) -> u32 {
        self.claims.get(&target).copied().unwrap_or(0)
    }

    /// First reference joint (by id) mapped onto `target`.
    pub fn reference_for(&self, target: JointId) -> Option<JointId> {
        self.entries
            .values()
            .find(|e| e.target == Some(target))
            .map(|e| e.reference)
    }

    /// Entries ordered by reference joint id.
    pub fn iter(&self) -> impl Iterator<Item = &CorrespondenceEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count_by_method(&self, method: ResolutionMethod) -> usize {
        self.entries.values().filter(|e| e.method == method).count()
    }

    /// Map a per-vertex bone array (reference joints) onto target joints.
    /// Unmapped and excluded joints fall back to `fallback`.
    pub fn remap_bones(&self, bones: &[JointId], fallback: JointId) -> Vec<JointId> {
        bones
            .iter()
            .map(|&b| self.target_of(b).unwrap_or(fallback))
            .collect()
    }

    /// `(reference name, target name)` pairs, the form presets store.
    pub fn name_pairs(&self, reference: &Skeleton, target: &Skeleton) -> Vec<(String, String)> {
        self.entries
            .values()
            .filter_map(|e| {
                let r = reference.name_of(e.reference)?;
                let t = target.name_of(e.target?)?;
                Some((r.to_string(), t.to_string()))
            })
            .collect()
    }

    /// Rebuild claim counts after deserialization.
    pub fn reindex(&mut self) {
        self.claims.clear();
        for target in self.entries.values().filter_map(|e| e.target) {
            *self.claims.entry(target).or_insert(0) += 1;
        }
    }
}
