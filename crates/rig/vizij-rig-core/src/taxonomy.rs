//! Closed taxonomy of canonical joint roles.

use serde::{Deserialize, Serialize};

use crate::normalize::Side;

/// Semantic role of a joint in a humanoid rig.
///
/// Finger types name the whole finger chain; proximal/intermediate/distal
/// segments all classify to the same type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CanonicalType {
    Hips,
    Spine,
    Chest,
    UpperChest,
    Neck,
    Head,

    LeftShoulder,
    LeftUpperArm,
    LeftLowerArm,
    LeftHand,
    RightShoulder,
    RightUpperArm,
    RightLowerArm,
    RightHand,

    LeftUpperLeg,
    LeftLowerLeg,
    LeftFoot,
    LeftToes,
    RightUpperLeg,
    RightLowerLeg,
    RightFoot,
    RightToes,

    LeftThumb,
    LeftIndex,
    LeftMiddle,
    LeftRing,
    LeftLittle,
    RightThumb,
    RightIndex,
    RightMiddle,
    RightRing,
    RightLittle,
}

use CanonicalType::*;

impl CanonicalType {
    /// Every member, spine first then limbs then fingers.
    pub const ALL: [CanonicalType; 32] = [
        Hips, Spine, Chest, UpperChest, Neck, Head,
        LeftShoulder, LeftUpperArm, LeftLowerArm, LeftHand,
        RightShoulder, RightUpperArm, RightLowerArm, RightHand,
        LeftUpperLeg, LeftLowerLeg, LeftFoot, LeftToes,
        RightUpperLeg, RightLowerLeg, RightFoot, RightToes,
        LeftThumb, LeftIndex, LeftMiddle, LeftRing, LeftLittle,
        RightThumb, RightIndex, RightMiddle, RightRing, RightLittle,
    ];

    /// Types a rig cannot deform properly without.
    pub const ESSENTIAL: [CanonicalType; 20] = [
        Hips, Spine, Chest, UpperChest, Neck, Head,
        LeftShoulder, LeftUpperArm, LeftLowerArm, LeftHand,
        RightShoulder, RightUpperArm, RightLowerArm, RightHand,
        LeftUpperLeg, LeftLowerLeg, LeftFoot,
        RightUpperLeg, RightLowerLeg, RightFoot,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Hips => "Hips",
            Spine => "Spine",
            Chest => "Chest",
            UpperChest => "UpperChest",
            Neck => "Neck",
            Head => "Head",
            LeftShoulder => "LeftShoulder",
            LeftUpperArm => "LeftUpperArm",
            LeftLowerArm => "LeftLowerArm",
            LeftHand => "LeftHand",
            RightShoulder => "RightShoulder",
            RightUpperArm => "RightUpperArm",
            RightLowerArm => "RightLowerArm",
            RightHand => "RightHand",
            LeftUpperLeg => "LeftUpperLeg",
            LeftLowerLeg => "LeftLowerLeg",
            LeftFoot => "LeftFoot",
            LeftToes => "LeftToes",
            RightUpperLeg => "RightUpperLeg",
            RightLowerLeg => "RightLowerLeg",
            RightFoot => "RightFoot",
            RightToes => "RightToes",
            LeftThumb => "LeftThumb",
            LeftIndex => "LeftIndex",
            LeftMiddle => "LeftMiddle",
            LeftRing => "LeftRing",
            LeftLittle => "LeftLittle",
            RightThumb => "RightThumb",
            RightIndex => "RightIndex",
            RightMiddle => "RightMiddle",
            RightRing => "RightRing",
            RightLittle => "RightLittle",
        }
    }

    pub fn side(self) -> Option<Side> {
        match self {
            Hips | Spine | Chest | UpperChest | Neck | Head => None,
            LeftShoulder | LeftUpperArm | LeftLowerArm | LeftHand | LeftUpperLeg
            | LeftLowerLeg | LeftFoot | LeftToes | LeftThumb | LeftIndex | LeftMiddle
            | LeftRing | LeftLittle => Some(Side::Left),
            _ => Some(Side::Right),
        }
    }

    pub fn is_finger(self) -> bool {
        matches!(
            self,
            LeftThumb | LeftIndex | LeftMiddle | LeftRing | LeftLittle | RightThumb
                | RightIndex | RightMiddle | RightRing | RightLittle
        )
    }

    /// Acceptable parent types, most specific first. Empty for the hips,
    /// which anchor the whole chain.
    pub fn expected_parents(self) -> &'static [CanonicalType] {
        match self {
            Hips => &[],
            Spine => &[Hips],
            Chest => &[Spine],
            UpperChest => &[Chest],
            Neck | LeftShoulder | RightShoulder => &[UpperChest, Chest, Spine],
            Head => &[Neck],
            LeftUpperArm => &[LeftShoulder],
            LeftLowerArm => &[LeftUpperArm],
            LeftHand => &[LeftLowerArm],
            RightUpperArm => &[RightShoulder],
            RightLowerArm => &[RightUpperArm],
            RightHand => &[RightLowerArm],
            LeftUpperLeg | RightUpperLeg => &[Hips],
            LeftLowerLeg => &[LeftUpperLeg],
            LeftFoot => &[LeftLowerLeg],
            LeftToes => &[LeftFoot],
            RightLowerLeg => &[RightUpperLeg],
            RightFoot => &[RightLowerLeg],
            RightToes => &[RightFoot],
            LeftThumb | LeftIndex | LeftMiddle | LeftRing | LeftLittle => &[LeftHand],
            RightThumb | RightIndex | RightMiddle | RightRing | RightLittle => &[RightHand],
        }
    }

    /// Longest chain of expected parents from this type up to the hips.
    pub fn ancestor_chain_len(self) -> usize {
        self.expected_parents()
            .iter()
            .map(|p| 1 + p.ancestor_chain_len())
            .max()
            .unwrap_or(0)
    }
}

impl std::fmt::Display for CanonicalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
