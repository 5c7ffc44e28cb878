//! Post-resolution rig checks and scale estimation.
//!
//! Diagnostics only report; fixes are suggestions the caller may apply to
//! its own copy of the rig.

use serde::{Deserialize, Serialize};

use crate::ids::JointId;
use crate::resolver::Resolution;
use crate::skeleton::Skeleton;
use crate::synonyms::TypeClassifier;
use crate::table::CorrespondenceTable;
use crate::taxonomy::CanonicalType;
use crate::transform::distance;

/// Local scale outside `[MIN_SCALE, MAX_SCALE]` on any axis is suspicious.
pub const MAX_SCALE: f32 = 5.0;
pub const MIN_SCALE: f32 = 0.1;
/// Largest tolerated difference between two scale axes.
pub const MAX_SCALE_SKEW: f32 = 0.5;
/// Largest tolerated local rotation difference of a matched pair, in degrees.
pub const MAX_ROTATION_DEG: f32 = 30.0;

/// Suggested correction for a diagnostic.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SuggestedFix {
    SetScale { scale: [f32; 3] },
    SetRotation { rotation: [f32; 4] },
    Synthesize { ty: CanonicalType },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// An essential type is present in the reference but not in the target.
    MissingJoint { ty: CanonicalType },
    ScaleOutOfRange {
        joint: JointId,
        scale: [f32; 3],
        fix: SuggestedFix,
    },
    NonUniformScale {
        joint: JointId,
        scale: [f32; 3],
        fix: SuggestedFix,
    },
    /// Matched pair whose local rotations disagree.
    RotationMismatch {
        joint: JointId,
        reference: JointId,
        degrees: f32,
        fix: SuggestedFix,
    },
}

/// Check target joints for scale and rotation problems and list missing
/// essential types.
pub fn diagnose(reference: &Skeleton, target: &Skeleton, resolution: &Resolution) -> Vec<Diagnostic> {
    let table = &resolution.table;
    let mut out: Vec<Diagnostic> = resolution
        .unresolved_essentials
        .iter()
        .map(|&ty| Diagnostic::MissingJoint { ty })
        .collect();

    for joint in target.joints() {
        let scale = joint.local.scale;
        let matched = table.reference_for(joint.id).and_then(|r| reference.get(r));

        if scale.iter().any(|&s| !(MIN_SCALE..=MAX_SCALE).contains(&s)) {
            let fixed = matched.map(|r| r.local.scale).unwrap_or([1.0; 3]);
            out.push(Diagnostic::ScaleOutOfRange {
                joint: joint.id,
                scale,
                fix: SuggestedFix::SetScale { scale: fixed },
            });
        }

        let skewed = (0..3).any(|i| (scale[i] - scale[(i + 1) % 3]).abs() > MAX_SCALE_SKEW);
        if skewed {
            let max = scale[0].max(scale[1]).max(scale[2]);
            out.push(Diagnostic::NonUniformScale {
                joint: joint.id,
                scale,
                fix: SuggestedFix::SetScale { scale: [max; 3] },
            });
        }

        if let Some(r) = matched {
            let degrees = joint.local.rotation_angle_deg(&r.local);
            if degrees > MAX_ROTATION_DEG {
                out.push(Diagnostic::RotationMismatch {
                    joint: joint.id,
                    reference: r.id,
                    degrees,
                    fix: SuggestedFix::SetRotation {
                        rotation: r.local.rotation,
                    },
                });
            }
        }
    }
    out
}

/// Ratio of the reference `from`->`to` world distance to the distance between
/// their targets. `None` when either joint is unmapped or the target span is
/// degenerate.
pub fn scale_ratio(
    reference: &Skeleton,
    target: &Skeleton,
    table: &CorrespondenceTable,
    from: JointId,
    to: JointId,
) -> Option<f32> {
    let ref_span = distance(reference.world_position(from)?, reference.world_position(to)?);
    let tgt_span = distance(
        target.world_position(table.target_of(from)?)?,
        target.world_position(table.target_of(to)?)?,
    );
    (tgt_span > f32::EPSILON).then(|| ref_span / tgt_span)
}

/// Hips-to-head [`scale_ratio`], picking the reference joints by type.
pub fn estimate_scale_ratio(
    reference: &Skeleton,
    target: &Skeleton,
    table: &CorrespondenceTable,
    classifier: &TypeClassifier,
) -> Option<f32> {
    let find = |ty: CanonicalType| {
        let root = reference.root()?;
        reference.walk(root).into_iter().find(|&id| {
            classifier
                .classify_raw(reference.name_of(id).unwrap_or_default())
                .is_some_and(|c| c.ty == ty && c.exact)
        })
    };
    scale_ratio(
        reference,
        target,
        table,
        find(CanonicalType::Hips)?,
        find(CanonicalType::Head)?,
    )
}
