//! Name, type and hierarchy passes.

use crate::config::PassKind;
use crate::ids::JointId;
use crate::normalize::names_overlap;
use crate::table::ResolutionMethod;
use crate::taxonomy::CanonicalType;

use super::{sides_conflict, types_conflict, MatchContext, MatchStrategy};

/// Literal name equality. May alias a target another entry already claimed.
pub struct ExactName;

impl MatchStrategy for ExactName {
    fn kind(&self) -> PassKind {
        PassKind::ExactName
    }

    fn method(&self) -> ResolutionMethod {
        ResolutionMethod::ExactName
    }

    fn find(
        &self,
        reference: JointId,
        candidates: &[JointId],
        cx: &MatchContext<'_>,
    ) -> Option<JointId> {
        let name = cx.reference.name_of(reference)?;
        candidates.iter().copied().find(|&t| {
            cx.tick();
            cx.target.name_of(t) == Some(name)
        })
    }
}

/// Normalized equality, then symmetric containment.
///
/// Equal keys win over containment; among containments the closest length
/// wins. Candidates of another canonical type or the mirrored side are skipped.
pub struct NormalizedName;

impl MatchStrategy for NormalizedName {
    fn kind(&self) -> PassKind {
        PassKind::NormalizedName
    }

    fn method(&self) -> ResolutionMethod {
        ResolutionMethod::NormalizedName
    }

    fn find(
        &self,
        reference: JointId,
        candidates: &[JointId],
        cx: &MatchContext<'_>,
    ) -> Option<JointId> {
        let rf = cx.reference_facts.get(reference)?;
        if rf.normalized.is_empty() {
            return None;
        }
        let ref_len = rf.normalized.chars().count();
        let mut best: Option<((bool, usize, usize), JointId)> = None;
        for (order, &t) in candidates.iter().enumerate() {
            if cx.is_claimed(t) {
                continue;
            }
            cx.tick();
            let Some(tf) = cx.target_facts.get(t) else {
                continue;
            };
            if types_conflict(rf.ty(), tf.ty()) || sides_conflict(rf.side, tf.side) {
                continue;
            }
            let equal = rf.normalized == tf.normalized;
            if !equal && !names_overlap(&rf.normalized, &tf.normalized, cx.config.min_overlap_len) {
                continue;
            }
            let key = (!equal, ref_len.abs_diff(tf.normalized.chars().count()), order);
            if best.map_or(true, |(k, _)| key < k) {
                best = Some((key, t));
            }
        }
        best.map(|(_, t)| t)
    }
}

/// Same canonical type on both sides.
///
/// An exact classification beats a name that merely contains a synonym, and
/// primary joints beat twist/roll helpers.
pub struct CanonicalTypeMatch;

impl MatchStrategy for CanonicalTypeMatch {
    fn kind(&self) -> PassKind {
        PassKind::CanonicalType
    }

    fn method(&self) -> ResolutionMethod {
        ResolutionMethod::CanonicalType
    }

    fn find(
        &self,
        reference: JointId,
        candidates: &[JointId],
        cx: &MatchContext<'_>,
    ) -> Option<JointId> {
        let ty = cx.reference_facts.ty(reference)?;
        let mut best: Option<((bool, bool, usize, usize), JointId)> = None;
        for (order, &t) in candidates.iter().enumerate() {
            if cx.is_claimed(t) {
                continue;
            }
            cx.tick();
            let Some(tf) = cx.target_facts.get(t) else {
                continue;
            };
            let Some(class) = tf.class.filter(|c| c.ty == ty) else {
                continue;
            };
            let key = (!class.exact, tf.helper, class.residual, order);
            if best.map_or(true, |(k, _)| key < k) {
                best = Some((key, t));
            }
        }
        best.map(|(_, t)| t)
    }
}

/// Structural inference from already-resolved neighbours.
///
/// Typed reference joints look below the target of their nearest resolved
/// ancestor (parent, then grandparent). Without one, target joints of an
/// expected parent type serve as anchors. Untyped reference joints fall back
/// to root-relative path similarity at equal depth.
pub struct HierarchyPattern;

impl MatchStrategy for HierarchyPattern {
    fn kind(&self) -> PassKind {
        PassKind::HierarchyPattern
    }

    fn method(&self) -> ResolutionMethod {
        ResolutionMethod::HierarchyPattern
    }

    fn find(
        &self,
        reference: JointId,
        candidates: &[JointId],
        cx: &MatchContext<'_>,
    ) -> Option<JointId> {
        match cx.reference_facts.ty(reference) {
            Some(ty) => typed_match(reference, ty, candidates, cx),
            None => path_match(reference, candidates, cx),
        }
    }
}

fn anchors_for(reference: JointId, ty: CanonicalType, cx: &MatchContext<'_>) -> Vec<JointId> {
    let resolved = cx
        .reference
        .ancestors(reference)
        .take(2)
        .find_map(|a| cx.table.target_of(a));
    if let Some(anchor) = resolved {
        return vec![anchor];
    }
    for &parent_ty in ty.expected_parents() {
        let anchors: Vec<JointId> = cx
            .target_facts
            .index
            .order()
            .iter()
            .copied()
            .filter(|&t| cx.target_facts.ty(t) == Some(parent_ty))
            .collect();
        if !anchors.is_empty() {
            return anchors;
        }
    }
    Vec::new()
}

fn typed_match(
    reference: JointId,
    ty: CanonicalType,
    candidates: &[JointId],
    cx: &MatchContext<'_>,
) -> Option<JointId> {
    let anchors = anchors_for(reference, ty, cx);
    if anchors.is_empty() {
        return None;
    }
    let anchor_types: Vec<CanonicalType> = anchors
        .iter()
        .filter_map(|&a| cx.target_facts.ty(a))
        .collect();

    let mut best: Option<((bool, u8, bool, u8, usize), JointId)> = None;
    for (order, &t) in candidates.iter().enumerate() {
        if anchors.contains(&t) {
            continue;
        }
        cx.tick();
        let Some(tf) = cx.target_facts.get(t) else {
            continue;
        };
        if types_conflict(Some(ty), tf.ty()) || sides_conflict(ty.side(), tf.side) {
            continue;
        }
        let claimed = cx.is_claimed(t);
        if claimed && tf.ty() != Some(ty) {
            continue;
        }
        let Some(parent) = cx.target.parent(t) else {
            continue;
        };
        let relation = if anchors.contains(&parent) {
            0
        } else if cx.config.hierarchy.allow_grandparent
            && !cx.is_claimed(parent)
            && cx.target.parent(parent).is_some_and(|g| anchors.contains(&g))
        {
            1
        } else if cx
            .target_facts
            .ty(parent)
            .is_some_and(|p| anchor_types.contains(&p))
        {
            2
        } else {
            continue;
        };
        if !covers_resolved_children(reference, t, cx) {
            continue;
        }
        let quality = match tf.class {
            Some(c) if c.exact => 0,
            Some(_) => 1,
            None => 2,
        };
        let key = (claimed, quality, tf.helper, relation, order);
        if best.map_or(true, |(k, _)| key < k) {
            best = Some((key, t));
        }
    }
    best.map(|(_, t)| t)
}

/// The candidate must sit above the targets of the reference joint's
/// already-resolved children; otherwise it belongs to another branch.
fn covers_resolved_children(reference: JointId, candidate: JointId, cx: &MatchContext<'_>) -> bool {
    cx.reference
        .children(reference)
        .iter()
        .filter_map(|&child| cx.table.target_of(child))
        .all(|mapped| cx.target.ancestors(mapped).any(|a| a == candidate))
}

fn path_match(reference: JointId, candidates: &[JointId], cx: &MatchContext<'_>) -> Option<JointId> {
    let path = cx.reference_facts.index.path(reference)?;
    let threshold = cx.config.hierarchy.path_similarity_threshold;
    let mut best: Option<(f32, JointId)> = None;
    for &t in candidates {
        if cx.is_claimed(t) {
            continue;
        }
        cx.tick();
        let Some(score) = cx
            .target_facts
            .index
            .path(t)
            .and_then(|p| path.similarity(p, cx.config.name_mode))
        else {
            continue;
        };
        if score > threshold && best.map_or(true, |(s, _)| score > s) {
            best = Some((score, t));
        }
    }
    best.map(|(_, t)| t)
}
