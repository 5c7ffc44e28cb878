//! Matching cascade: per-skeleton analysis and the strategy interface.
//!
//! Each pass is a [`MatchStrategy`]: a pure function from one reference joint,
//! the target candidates and a read-only [`MatchContext`] to an optional
//! target joint. The resolver owns pass order and writes the table.

use std::cell::Cell;

use hashbrown::HashMap;

use crate::config::{PassKind, ResolverConfig};
use crate::hierarchy::HierarchyIndex;
use crate::ids::JointId;
use crate::normalize::{normalize_name, side_of, Side};
use crate::skeleton::Skeleton;
use crate::synonyms::{Classification, TypeClassifier};
use crate::table::{CorrespondenceTable, ResolutionMethod};
use crate::taxonomy::CanonicalType;

mod spatial;
mod strategies;

pub use spatial::SpatialProximity;
pub use strategies::{CanonicalTypeMatch, ExactName, HierarchyPattern, NormalizedName};

/// Everything the passes need to know about one joint.
#[derive(Clone, Debug, PartialEq)]
pub struct JointFacts {
    pub normalized: String,
    pub class: Option<Classification>,
    pub side: Option<Side>,
    /// World position mapped into the skeleton's own [-1, 1] box.
    pub spatial: [f32; 3],
    /// Twist/roll/end helper joint.
    pub helper: bool,
}

impl JointFacts {
    pub fn ty(&self) -> Option<CanonicalType> {
        self.class.map(|c| c.ty)
    }
}

/// Hierarchy index plus per-joint facts for the indexed part of a skeleton.
#[derive(Clone, Debug)]
pub struct SkeletonFacts {
    pub index: HierarchyIndex,
    facts: HashMap<JointId, JointFacts>,
    /// Axes wide enough to tell joints apart.
    pub axes: [bool; 3],
    /// Sign of the normalized x of left-side typed joints; -1 when unknown.
    pub left_sign: f32,
}

impl SkeletonFacts {
    /// Analyse `skeleton`. With `types` given, classification comes from the
    /// map alone and joints missing from it stay untyped.
    pub fn build(
        skeleton: &Skeleton,
        classifier: &TypeClassifier,
        types: Option<&HashMap<JointId, CanonicalType>>,
        config: &ResolverConfig,
    ) -> Option<SkeletonFacts> {
        let index = HierarchyIndex::build(skeleton, &config.root_container_names, classifier)?;
        let bounds = index.bounds()?;
        let min_extent = config.spatial.min_extent;
        let mut facts = HashMap::with_capacity(index.len());
        for &id in index.order() {
            let Some(joint) = skeleton.get(id) else {
                continue;
            };
            let normalized = normalize_name(&joint.name, config.name_mode);
            let class = match types {
                Some(map) => map.get(&id).map(|&ty| Classification {
                    ty,
                    exact: true,
                    residual: 0,
                }),
                None => classifier.classify(&normalized),
            };
            let helper = classifier.table().is_helper(&normalized);
            facts.insert(
                id,
                JointFacts {
                    side: side_of(&joint.name),
                    spatial: bounds.normalize(joint.world_position(), min_extent),
                    normalized,
                    class,
                    helper,
                },
            );
        }
        let lateral: f32 = facts
            .values()
            .filter_map(|f| match f.ty().and_then(CanonicalType::side) {
                Some(Side::Left) => Some(f.spatial[0]),
                Some(Side::Right) => Some(-f.spatial[0]),
                None => None,
            })
            .sum();
        Some(SkeletonFacts {
            axes: bounds.discriminating_axes(min_extent),
            left_sign: if lateral > 0.0 { 1.0 } else { -1.0 },
            index,
            facts,
        })
    }

    pub fn get(&self, id: JointId) -> Option<&JointFacts> {
        self.facts.get(&id)
    }

    pub fn ty(&self, id: JointId) -> Option<CanonicalType> {
        self.facts.get(&id).and_then(JointFacts::ty)
    }

    /// Any indexed joint carries a type.
    pub fn has_types(&self) -> bool {
        self.facts.values().any(|f| f.class.is_some())
    }
}

/// Read-only view handed to a strategy for one reference joint.
pub struct MatchContext<'a> {
    pub reference: &'a Skeleton,
    pub target: &'a Skeleton,
    pub reference_facts: &'a SkeletonFacts,
    pub target_facts: &'a SkeletonFacts,
    pub table: &'a CorrespondenceTable,
    pub config: &'a ResolverConfig,
    comparisons: &'a Cell<u64>,
}

impl<'a> MatchContext<'a> {
    pub fn new(
        reference: &'a Skeleton,
        target: &'a Skeleton,
        reference_facts: &'a SkeletonFacts,
        target_facts: &'a SkeletonFacts,
        table: &'a CorrespondenceTable,
        config: &'a ResolverConfig,
        comparisons: &'a Cell<u64>,
    ) -> Self {
        Self {
            reference,
            target,
            reference_facts,
            target_facts,
            table,
            config,
            comparisons,
        }
    }

    #[inline]
    pub fn is_claimed(&self, target: JointId) -> bool {
        self.table.is_claimed(target)
    }

    /// Count one candidate evaluation against the budget.
    #[inline]
    pub fn tick(&self) {
        self.comparisons.set(self.comparisons.get() + 1);
    }

    /// Distance between normalized positions over the axes both skeletons
    /// can discriminate on.
    pub fn spatial_distance(&self, reference: JointId, target: JointId) -> Option<f32> {
        let a = self.reference_facts.get(reference)?.spatial;
        let b = self.target_facts.get(target)?.spatial;
        let mut sum = 0.0f32;
        for axis in 0..3 {
            if self.reference_facts.axes[axis] && self.target_facts.axes[axis] {
                let d = a[axis] - b[axis];
                sum += d * d;
            }
        }
        Some(sum.sqrt())
    }
}

/// One pass of the cascade.
pub trait MatchStrategy {
    fn kind(&self) -> PassKind;

    fn method(&self) -> ResolutionMethod;

    /// Best target for `reference` among `candidates` (target scope order), if any.
    fn find(
        &self,
        reference: JointId,
        candidates: &[JointId],
        cx: &MatchContext<'_>,
    ) -> Option<JointId>;
}

/// Built-in strategy for a pass kind.
pub fn strategy_for(kind: PassKind) -> Box<dyn MatchStrategy> {
    match kind {
        PassKind::ExactName => Box::new(ExactName),
        PassKind::NormalizedName => Box::new(NormalizedName),
        PassKind::CanonicalType => Box::new(CanonicalTypeMatch),
        PassKind::HierarchyPattern => Box::new(HierarchyPattern),
        PassKind::SpatialProximity => Box::new(SpatialProximity),
    }
}

/// Types disagree only when both sides carry one.
#[inline]
pub(crate) fn types_conflict(a: Option<CanonicalType>, b: Option<CanonicalType>) -> bool {
    matches!((a, b), (Some(x), Some(y)) if x != y)
}

#[inline]
pub(crate) fn sides_conflict(a: Option<Side>, b: Option<Side>) -> bool {
    matches!((a, b), (Some(x), Some(y)) if x != y)
}
