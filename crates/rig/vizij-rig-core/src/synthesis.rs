//! Creation of missing target joints.
//!
//! A reference joint without a counterpart is recreated in the target under
//! the target of its expected parent type. Parents are taken from the table,
//! from joints created earlier in the run, or synthesized recursively. The
//! recursion is bounded by `max_depth`, and failed joints are not retried.

use hashbrown::HashMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::cascade::SkeletonFacts;
use crate::ids::JointId;
use crate::skeleton::Skeleton;
use crate::table::{CorrespondenceTable, ResolutionMethod};
use crate::taxonomy::CanonicalType;
use crate::transform::Transform;

/// A joint appended to the target skeleton.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SynthesizedJoint {
    /// New joint in the target skeleton.
    pub joint: JointId,
    /// Reference joint it stands in for.
    pub reference: JointId,
    pub ty: CanonicalType,
    /// Target parent it was attached to.
    pub parent: JointId,
    pub name: String,
    /// Local transform copied from the reference joint.
    pub local: Transform,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynthesisFailureReason {
    /// The joint has no canonical type, or its type has no parent type (hips).
    NoParentType,
    /// No expected parent type could be resolved.
    ParentUnresolved,
    /// Parent recursion went deeper than the configured bound.
    ChainExhausted,
    /// The target skeleton refused the new joint.
    Rejected,
}

impl std::fmt::Display for SynthesisFailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SynthesisFailureReason::NoParentType => "no parent type",
            SynthesisFailureReason::ParentUnresolved => "parent unresolved",
            SynthesisFailureReason::ChainExhausted => "ancestor chain exhausted",
            SynthesisFailureReason::Rejected => "rejected by target skeleton",
        })
    }
}

/// Per-run synthesis state.
pub struct MissingJointSynthesizer<'a> {
    reference: &'a Skeleton,
    facts: &'a SkeletonFacts,
    by_type: HashMap<CanonicalType, JointId>,
    max_depth: usize,
    created: Vec<SynthesizedJoint>,
    failed: HashMap<JointId, SynthesisFailureReason>,
}

impl<'a> MissingJointSynthesizer<'a> {
    pub fn new(reference: &'a Skeleton, facts: &'a SkeletonFacts, max_depth: usize) -> Self {
        // One representative per type: the first exactly classified joint in
        // scope order, else the first one containing a synonym.
        let mut by_type: HashMap<CanonicalType, JointId> = HashMap::new();
        for exact_pass in [true, false] {
            for &id in facts.index.order() {
                let Some(class) = facts.get(id).and_then(|f| f.class) else {
                    continue;
                };
                if class.exact == exact_pass {
                    by_type.entry(class.ty).or_insert(id);
                }
            }
        }
        Self {
            reference,
            facts,
            by_type,
            max_depth,
            created: Vec::new(),
            failed: HashMap::new(),
        }
    }

    /// Reference joint standing for `ty`, if the reference has one.
    pub fn representative(&self, ty: CanonicalType) -> Option<JointId> {
        self.by_type.get(&ty).copied()
    }

    /// Target joint for `joint`, creating it (and missing parents) if needed.
    pub fn synthesize(
        &mut self,
        joint: JointId,
        target: &mut Skeleton,
        table: &mut CorrespondenceTable,
    ) -> Result<JointId, SynthesisFailureReason> {
        self.synthesize_at(joint, target, table, 0)
    }

    pub fn created(&self) -> &[SynthesizedJoint] {
        &self.created
    }

    pub fn into_created(self) -> Vec<SynthesizedJoint> {
        self.created
    }

    fn synthesize_at(
        &mut self,
        joint: JointId,
        target: &mut Skeleton,
        table: &mut CorrespondenceTable,
        depth: usize,
    ) -> Result<JointId, SynthesisFailureReason> {
        if let Some(t) = table.target_of(joint) {
            return Ok(t);
        }
        if let Some(made) = self.created.iter().find(|s| s.reference == joint) {
            return Ok(made.joint);
        }
        if let Some(&reason) = self.failed.get(&joint) {
            return Err(reason);
        }
        if depth > self.max_depth {
            return Err(SynthesisFailureReason::ChainExhausted);
        }
        let Some(ty) = self.facts.ty(joint) else {
            return self.fail(joint, SynthesisFailureReason::NoParentType);
        };
        if ty.expected_parents().is_empty() {
            return self.fail(joint, SynthesisFailureReason::NoParentType);
        }

        let mut parent = None;
        let mut last_err = SynthesisFailureReason::ParentUnresolved;
        for &parent_ty in ty.expected_parents() {
            let Some(parent_ref) = self.representative(parent_ty) else {
                continue;
            };
            if let Some(entry) = table.get(parent_ref) {
                if let Some(t) = entry.target {
                    parent = Some(t);
                    break;
                }
                // Excluded parents are never recreated.
                continue;
            }
            match self.synthesize_at(parent_ref, target, table, depth + 1) {
                Ok(t) => {
                    parent = Some(t);
                    break;
                }
                Err(reason) => last_err = reason,
            }
        }
        let Some(parent) = parent else {
            return match last_err {
                SynthesisFailureReason::ChainExhausted => Err(last_err),
                _ => self.fail(joint, SynthesisFailureReason::ParentUnresolved),
            };
        };

        let Some(source) = self.reference.get(joint) else {
            return self.fail(joint, SynthesisFailureReason::Rejected);
        };
        let name = source.name.clone();
        let local = source.local;
        let Ok(new_id) = target.add_joint(parent, name.clone(), local) else {
            return self.fail(joint, SynthesisFailureReason::Rejected);
        };
        table.assign(joint, Some(new_id), ResolutionMethod::Synthesized, false);
        debug!(
            "synthesized '{}' ({}) under {} in '{}'",
            name, ty, parent, target.name
        );
        self.created.push(SynthesizedJoint {
            joint: new_id,
            reference: joint,
            ty,
            parent,
            name,
            local,
        });
        Ok(new_id)
    }

    fn fail(
        &mut self,
        joint: JointId,
        reason: SynthesisFailureReason,
    ) -> Result<JointId, SynthesisFailureReason> {
        self.failed.insert(joint, reason);
        Err(reason)
    }
}
