//! Spatial proximity pass.

use crate::config::PassKind;
use crate::ids::JointId;
use crate::normalize::names_overlap;
use crate::table::ResolutionMethod;
use crate::taxonomy::CanonicalType;

use super::{sides_conflict, types_conflict, MatchContext, MatchStrategy};

/// Where the major joints sit inside a humanoid's normalized box, left side
/// at -x. Finger and upper chest placements vary too much to list.
pub fn template_position(ty: CanonicalType) -> Option<[f32; 3]> {
    use CanonicalType::*;
    let p = match ty {
        Head => [0.0, 0.8, 0.0],
        Neck => [0.0, 0.7, 0.0],
        Chest => [0.0, 0.6, 0.0],
        Spine => [0.0, 0.5, 0.0],
        Hips => [0.0, 0.4, 0.0],
        LeftShoulder => [-0.2, 0.7, 0.0],
        LeftUpperArm => [-0.3, 0.65, 0.0],
        LeftLowerArm => [-0.4, 0.5, 0.0],
        LeftHand => [-0.5, 0.4, 0.0],
        RightShoulder => [0.2, 0.7, 0.0],
        RightUpperArm => [0.3, 0.65, 0.0],
        RightLowerArm => [0.4, 0.5, 0.0],
        RightHand => [0.5, 0.4, 0.0],
        LeftUpperLeg => [-0.15, 0.3, 0.0],
        LeftLowerLeg => [-0.15, 0.2, 0.0],
        LeftFoot => [-0.15, 0.05, 0.1],
        LeftToes => [-0.15, 0.0, 0.2],
        RightUpperLeg => [0.15, 0.3, 0.0],
        RightLowerLeg => [0.15, 0.2, 0.0],
        RightFoot => [0.15, 0.05, 0.1],
        RightToes => [0.15, 0.0, 0.2],
        _ => return None,
    };
    Some(p)
}

/// Nearest joint in bounds-normalized space, scored together with name overlap.
///
/// `score = distance_weight * (1 - d / distance_cap) + name_weight * overlap`
/// must exceed `accept_threshold`. Essential joints that miss the threshold
/// still take the nearest candidate when it lies within `fallback_distance`.
/// Against a target without any canonical types, a typed reference joint
/// finally takes the candidate nearest its [`template_position`], mirrored to
/// the reference's handedness, within `template_threshold`.
/// Positions are normalized per skeleton, so uniform scaling of either
/// skeleton does not change the outcome.
pub struct SpatialProximity;

impl MatchStrategy for SpatialProximity {
    fn kind(&self) -> PassKind {
        PassKind::SpatialProximity
    }

    fn method(&self) -> ResolutionMethod {
        ResolutionMethod::SpatialProximity
    }

    fn find(
        &self,
        reference: JointId,
        candidates: &[JointId],
        cx: &MatchContext<'_>,
    ) -> Option<JointId> {
        let rf = cx.reference_facts.get(reference)?;
        let cfg = &cx.config.spatial;
        let mut best: Option<(f32, JointId)> = None;
        let mut nearest: Option<(f32, JointId)> = None;
        for &t in candidates {
            if cx.is_claimed(t) {
                continue;
            }
            cx.tick();
            let Some(tf) = cx.target_facts.get(t) else {
                continue;
            };
            if types_conflict(rf.ty(), tf.ty()) {
                continue;
            }
            let Some(d) = cx.spatial_distance(reference, t) else {
                continue;
            };
            let closeness = (1.0 - d / cfg.distance_cap).max(0.0);
            let overlap = if names_overlap(&rf.normalized, &tf.normalized, cx.config.min_overlap_len) {
                1.0
            } else {
                0.0
            };
            let score = cfg.distance_weight * closeness + cfg.name_weight * overlap;
            if best.map_or(true, |(s, _)| score > s) {
                best = Some((score, t));
            }
            if nearest.map_or(true, |(n, _)| d < n) {
                nearest = Some((d, t));
            }
        }

        if let Some((score, t)) = best {
            if score > cfg.accept_threshold {
                return Some(t);
            }
        }
        let essential = rf.ty().is_some_and(|ty| cx.config.is_essential(ty));
        match nearest {
            Some((d, t)) if essential && d < cfg.fallback_distance => Some(t),
            _ => self.by_template(reference, candidates, cx),
        }
    }
}

impl SpatialProximity {
    fn by_template(
        &self,
        reference: JointId,
        candidates: &[JointId],
        cx: &MatchContext<'_>,
    ) -> Option<JointId> {
        if cx.target_facts.has_types() {
            return None;
        }
        let rf = cx.reference_facts.get(reference)?;
        let mut anchor = template_position(rf.ty()?)?;
        anchor[0] *= -cx.reference_facts.left_sign;

        let axes = cx.target_facts.axes;
        if !axes.iter().any(|&a| a) {
            return None;
        }
        let mut nearest: Option<(f32, JointId)> = None;
        for &t in candidates {
            if cx.is_claimed(t) {
                continue;
            }
            cx.tick();
            let Some(tf) = cx.target_facts.get(t) else {
                continue;
            };
            if sides_conflict(rf.side, tf.side) {
                continue;
            }
            let d = (0..3)
                .filter(|&axis| axes[axis])
                .map(|axis| (tf.spatial[axis] - anchor[axis]).powi(2))
                .sum::<f32>()
                .sqrt();
            if nearest.map_or(true, |(n, _)| d < n) {
                nearest = Some((d, t));
            }
        }
        match nearest {
            Some((d, t)) if d < cx.config.spatial.template_threshold => Some(t),
            _ => None,
        }
    }
}
