//! Resolver configuration.
//!
//! Every numeric threshold of the cascade lives here with its default; none
//! of them is a fixed contract.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::normalize::NormalizeMode;
use crate::taxonomy::CanonicalType;

/// Keywords of accessory joints (wings, tails, hair, face parts) that usually
/// have no body counterpart. Opt in through `auto_exclude_keywords`.
pub const ACCESSORY_KEYWORDS: [&str; 7] = ["wing", "tail", "eye", "ear", "hair", "tongue", "jaw"];

/// Default root container keywords.
pub const ROOT_CONTAINER_KEYWORDS: [&str; 4] = ["root", "skeleton", "armature", "rig"];

/// Automatic matching passes, in the order the cascade runs them.
/// Synthesis is not listed: it always runs last.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassKind {
    ExactName,
    NormalizedName,
    CanonicalType,
    HierarchyPattern,
    SpatialProximity,
}

impl PassKind {
    pub const DEFAULT_ORDER: [PassKind; 5] = [
        PassKind::ExactName,
        PassKind::NormalizedName,
        PassKind::CanonicalType,
        PassKind::HierarchyPattern,
        PassKind::SpatialProximity,
    ];
}

/// Spatial proximity scoring.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialConfig {
    pub distance_weight: f32,
    pub name_weight: f32,
    /// Normalized distance at which the distance term reaches zero.
    pub distance_cap: f32,
    /// Combined score must exceed this.
    pub accept_threshold: f32,
    /// Distance-only fallback for essential joints: maximum normalized distance.
    pub fallback_distance: f32,
    /// Axes whose extent does not exceed this are ignored.
    pub min_extent: f32,
    /// Maximum normalized distance to the humanoid template position, used
    /// when the target carries no canonical types at all.
    pub template_threshold: f32,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            distance_weight: 0.6,
            name_weight: 0.4,
            distance_cap: 3.5,
            accept_threshold: 0.5,
            fallback_distance: 0.6,
            min_extent: 1e-4,
            template_threshold: 0.5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyConfig {
    /// Minimum averaged path similarity for reference joints without a type.
    pub path_similarity_threshold: f32,
    /// Accept a candidate whose grandparent (not parent) is the anchor.
    pub allow_grandparent: bool,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            path_similarity_threshold: 0.5,
            allow_grandparent: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    pub enabled: bool,
    /// Recursion bound for parent-chain synthesis. Defaults to 8 so a finger
    /// can rebuild its whole chain down to the hips.
    pub max_depth: usize,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_depth: 8,
        }
    }
}

/// Work limits checked between passes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    pub max_comparisons: Option<u64>,
    pub max_millis: Option<u64>,
}

/// Configuration for a [`crate::Resolver`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub name_mode: NormalizeMode,
    /// Shortest name that may take part in a containment match.
    pub min_overlap_len: usize,
    pub spatial: SpatialConfig,
    pub hierarchy: HierarchyConfig,
    pub synthesis: SynthesisConfig,
    /// Types synthesized when still unmatched after the matching passes.
    pub essential: Vec<CanonicalType>,
    /// Keywords of the structural root container. The shallowest joint whose
    /// normalized name contains one and that has no canonical type is the
    /// container.
    pub root_container_names: Vec<String>,
    /// Reference joints whose normalized name contains one of these are excluded.
    pub auto_exclude_keywords: Vec<String>,
    pub budget: BudgetConfig,
    pub passes: Vec<PassKind>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            name_mode: NormalizeMode::default(),
            min_overlap_len: 3,
            spatial: SpatialConfig::default(),
            hierarchy: HierarchyConfig::default(),
            synthesis: SynthesisConfig::default(),
            essential: CanonicalType::ESSENTIAL.to_vec(),
            root_container_names: ROOT_CONTAINER_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            auto_exclude_keywords: Vec::new(),
            budget: BudgetConfig::default(),
            passes: PassKind::DEFAULT_ORDER.to_vec(),
        }
    }
}

impl ResolverConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Enable the accessory keyword list.
    pub fn with_accessory_exclusions(mut self) -> Self {
        self.auto_exclude_keywords = ACCESSORY_KEYWORDS.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn with_passes(mut self, passes: impl Into<Vec<PassKind>>) -> Self {
        self.passes = passes.into();
        self
    }

    pub fn is_essential(&self, ty: CanonicalType) -> bool {
        self.essential.contains(&ty)
    }
}
