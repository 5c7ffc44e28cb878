//! Vizij Rig Core (engine-agnostic)
//!
//! Resolves joint correspondences between a reference skeleton (a body rig)
//! and a target skeleton (a garment rig) so that geometry skinned to the
//! target can be rebound to the reference. Resolution is a cascade of
//! matching passes (exact name, normalized name, canonical type, hierarchy
//! pattern, spatial proximity) followed by synthesis of missing essential
//! joints. Manual overrides and exclusions take precedence over every pass.

pub mod cascade;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod hierarchy;
pub mod ids;
pub mod normalize;
pub mod preset;
pub mod resolver;
pub mod skeleton;
pub mod synonyms;
pub mod synthesis;
pub mod table;
pub mod taxonomy;
pub mod transform;

// Re-exports for consumers
pub use cascade::{JointFacts, MatchContext, MatchStrategy, SkeletonFacts};
pub use config::{PassKind, ResolverConfig, ACCESSORY_KEYWORDS};
pub use diagnostics::{diagnose, estimate_scale_ratio, scale_ratio, Diagnostic, SuggestedFix};
pub use error::{Result, RigError};
pub use hierarchy::{HierarchyIndex, HierarchyPath};
pub use ids::{JointId, JointRef};
pub use normalize::{names_overlap, normalize_name, side_of, NormalizeMode, Side};
pub use preset::{MappingPreset, PresetLibrary};
pub use resolver::{
    Override, Resolution, ResolveIssue, ResolveRequest, ResolveStats, Resolver,
};
pub use skeleton::{Bounds, Joint, JointDesc, Skeleton, SkeletonDesc};
pub use synonyms::{Classification, SynonymEntry, SynonymTable, TypeClassifier};
pub use synthesis::{MissingJointSynthesizer, SynthesisFailureReason, SynthesizedJoint};
pub use table::{CorrespondenceEntry, CorrespondenceTable, ResolutionMethod};
pub use taxonomy::CanonicalType;
pub use transform::Transform;
