use hashbrown::HashMap;

use vizij_rig_core::{
    PassKind, ResolutionMethod, ResolveIssue, ResolveRequest, Resolver, ResolverConfig, Skeleton,
    Transform,
};

/// Build a skeleton from `(name, parent row, local position)` rows; row 0 is the root.
fn rig(name: &str, rows: &[(&str, usize, [f32; 3])]) -> Skeleton {
    let mut s = Skeleton::new(name);
    let mut ids = Vec::with_capacity(rows.len());
    for (i, &(joint, parent, pos)) in rows.iter().enumerate() {
        let local = Transform::from_position(pos);
        let id = if i == 0 {
            s.add_root(joint, local).expect("root")
        } else {
            s.add_joint(ids[parent], joint, local).expect("joint")
        };
        ids.push(id);
    }
    s
}

fn method_of(
    resolution: &vizij_rig_core::Resolution,
    reference: &Skeleton,
    name: &str,
) -> Option<ResolutionMethod> {
    let id = reference.find_by_name(name)?;
    resolution.table.get(id).map(|e| e.method)
}

fn target_name<'a>(
    resolution: &vizij_rig_core::Resolution,
    reference: &Skeleton,
    target: &'a Skeleton,
    name: &str,
) -> Option<&'a str> {
    let id = reference.find_by_name(name)?;
    target.name_of(resolution.table.target_of(id)?)
}

#[test]
fn namespaced_forearm_matches_numbered_lower_arm() {
    let reference = rig(
        "body",
        &[
            ("Armature", 0, [0.0, 0.0, 0.0]),
            ("mixamorig:LeftForeArm", 0, [0.4, 1.4, 0.0]),
        ],
    );
    let mut target = rig(
        "outfit",
        &[
            ("Armature", 0, [0.0, 0.0, 0.0]),
            ("LeftLowerArm_01", 0, [0.4, 1.4, 0.0]),
        ],
    );
    let resolution = Resolver::default()
        .resolve(&reference, &mut target, &ResolveRequest::new())
        .expect("resolve");

    assert_eq!(
        target_name(&resolution, &reference, &target, "mixamorig:LeftForeArm"),
        Some("LeftLowerArm_01")
    );
    let method = method_of(&resolution, &reference, "mixamorig:LeftForeArm").unwrap();
    assert!(
        matches!(
            method,
            ResolutionMethod::CanonicalType | ResolutionMethod::HierarchyPattern
        ),
        "unexpected method {method}"
    );
    assert!(resolution.unresolved.is_empty());
}

#[test]
fn untyped_reference_falls_back_to_normalized_position() {
    // Reference spans 0..2 vertically, target 0..1; no names overlap.
    let reference = rig(
        "body",
        &[
            ("Armature", 0, [0.0, 0.0, 0.0]),
            ("Hips", 0, [0.0, 1.0, 0.0]),
            ("Head", 1, [0.0, 1.0, 0.0]),
        ],
    );
    let mut target = rig(
        "costume",
        &[
            ("Costume", 0, [0.0, 0.0, 0.0]),
            ("root_pelvis", 0, [0.0, 0.5, 0.0]),
            ("collar", 1, [0.0, 0.5, 0.0]),
        ],
    );
    let request = ResolveRequest::new().with_reference_types(HashMap::new());
    let resolution = Resolver::default()
        .resolve(&reference, &mut target, &request)
        .expect("resolve");

    assert_eq!(
        target_name(&resolution, &reference, &target, "Hips"),
        Some("root_pelvis")
    );
    assert_eq!(
        method_of(&resolution, &reference, "Hips"),
        Some(ResolutionMethod::SpatialProximity)
    );
    assert!(resolution
        .issues
        .contains(&ResolveIssue::UnclassifiableReference));
    assert!(!resolution.stats.passes_run.contains(&PassKind::CanonicalType));
    assert!(resolution.synthesized.is_empty());
}

#[test]
fn missing_upper_chest_is_synthesized_under_chest() {
    let tilt = [0.0, 0.0, 0.0871557, 0.9961947];
    let mut reference = rig(
        "body",
        &[
            ("Armature", 0, [0.0, 0.0, 0.0]),
            ("Hips", 0, [0.0, 1.0, 0.0]),
            ("Spine", 1, [0.0, 0.1, 0.0]),
            ("Chest", 2, [0.0, 0.15, 0.0]),
        ],
    );
    let chest = reference.find_by_name("Chest").unwrap();
    let upper_local = Transform::new([0.0, 0.13, 0.01], tilt, [1.0; 3]);
    let upper = reference.add_joint(chest, "UpperChest", upper_local).unwrap();
    reference
        .add_joint(upper, "Neck", Transform::from_position([0.0, 0.12, 0.0]))
        .unwrap();

    let mut target = rig(
        "outfit",
        &[
            ("Armature", 0, [0.0, 0.0, 0.0]),
            ("Hips", 0, [0.0, 1.0, 0.0]),
            ("Spine", 1, [0.0, 0.1, 0.0]),
            ("Chest", 2, [0.0, 0.18, 0.0]),
            ("Neck", 3, [0.0, 0.22, 0.0]),
        ],
    );
    let before = target.len();
    let resolution = Resolver::default()
        .resolve(&reference, &mut target, &ResolveRequest::new())
        .expect("resolve");

    assert_eq!(resolution.synthesized.len(), 1);
    let made = &resolution.synthesized[0];
    assert_eq!(made.name, "UpperChest");
    assert_eq!(made.reference, upper);
    assert_eq!(made.local, upper_local);
    assert_eq!(target.len(), before + 1);

    let target_chest = target.find_by_name("Chest").unwrap();
    assert_eq!(made.parent, target_chest);
    assert_eq!(target.parent(made.joint), Some(target_chest));
    assert_eq!(target.get(made.joint).unwrap().local, upper_local);
    assert_eq!(resolution.table.target_of(upper), Some(made.joint));
    assert_eq!(
        method_of(&resolution, &reference, "UpperChest"),
        Some(ResolutionMethod::Synthesized)
    );
    assert!(resolution.unresolved_essentials.is_empty());
}

fn spine_pair() -> (Skeleton, Skeleton) {
    let reference = rig(
        "body",
        &[
            ("Armature", 0, [0.0, 0.0, 0.0]),
            ("Hips", 0, [0.0, 1.0, 0.0]),
            ("Spine1", 1, [0.0, 0.1, 0.0]),
        ],
    );
    let target = rig(
        "outfit",
        &[
            ("Armature", 0, [0.0, 0.0, 0.0]),
            ("Hips", 0, [0.0, 1.0, 0.0]),
            ("Spine", 1, [0.0, 0.1, 0.0]),
            ("Belly", 2, [0.0, 0.02, 0.08]),
        ],
    );
    (reference, target)
}

#[test]
fn manual_override_replaces_automatic_result() {
    let resolver = Resolver::default();

    let (reference, mut target) = spine_pair();
    let automatic = resolver
        .resolve(&reference, &mut target, &ResolveRequest::new())
        .expect("resolve");
    assert_eq!(
        target_name(&automatic, &reference, &target, "Spine1"),
        Some("Spine")
    );

    let (reference, mut target) = spine_pair();
    let request = ResolveRequest::new().with_override("Spine1", "Belly");
    let resolution = resolver
        .resolve(&reference, &mut target, &request)
        .expect("resolve");
    let spine1 = reference.find_by_name("Spine1").unwrap();
    let entry = resolution.table.get(spine1).unwrap();
    assert_eq!(entry.method, ResolutionMethod::ManualOverride);
    assert!(entry.manual);
    assert_eq!(
        target_name(&resolution, &reference, &target, "Spine1"),
        Some("Belly")
    );
}

#[test]
fn primary_arm_beats_twist_helper() {
    let reference = rig(
        "body",
        &[
            ("Armature", 0, [0.0, 0.0, 0.0]),
            ("Hips", 0, [0.0, 1.0, 0.0]),
            ("LeftUpperArm", 1, [0.2, 0.4, 0.0]),
        ],
    );
    // The helper comes first in scope order and sits closer to the reference joint.
    let mut target = rig(
        "outfit",
        &[
            ("Armature", 0, [0.0, 0.0, 0.0]),
            ("Hips", 0, [0.0, 1.0, 0.0]),
            ("L_Arm_Twist", 1, [0.2, 0.4, 0.0]),
            ("L_Arm", 1, [0.25, 0.4, 0.0]),
        ],
    );
    let resolution = Resolver::default()
        .resolve(&reference, &mut target, &ResolveRequest::new())
        .expect("resolve");

    assert_eq!(
        target_name(&resolution, &reference, &target, "LeftUpperArm"),
        Some("L_Arm")
    );
    assert_eq!(
        method_of(&resolution, &reference, "LeftUpperArm"),
        Some(ResolutionMethod::CanonicalType)
    );
}

#[test]
fn exclusion_suppresses_every_pass() {
    let reference = rig(
        "body",
        &[
            ("Armature", 0, [0.0, 0.0, 0.0]),
            ("Hips", 0, [0.0, 1.0, 0.0]),
            ("Tail", 1, [0.0, 0.0, -0.2]),
        ],
    );
    let mut target = rig(
        "outfit",
        &[
            ("Armature", 0, [0.0, 0.0, 0.0]),
            ("Hips", 0, [0.0, 1.0, 0.0]),
            ("Tail", 1, [0.0, 0.0, -0.2]),
        ],
    );
    let request = ResolveRequest::new().with_exclusion("Tail");
    let resolution = Resolver::default()
        .resolve(&reference, &mut target, &request)
        .expect("resolve");

    let tail = reference.find_by_name("Tail").unwrap();
    let entry = resolution.table.get(tail).unwrap();
    assert_eq!(entry.method, ResolutionMethod::ExplicitlyExcluded);
    assert_eq!(entry.target, None);
    assert!(entry.manual);
    assert!(!resolution.unresolved.contains(&tail));
}

#[test]
fn exclusion_wins_over_override_for_the_same_joint() {
    let (reference, mut target) = spine_pair();
    let request = ResolveRequest::new()
        .with_override("Spine1", "Belly")
        .with_exclusion("Spine1");
    let resolution = Resolver::default()
        .resolve(&reference, &mut target, &request)
        .expect("resolve");
    assert_eq!(
        method_of(&resolution, &reference, "Spine1"),
        Some(ResolutionMethod::ExplicitlyExcluded)
    );
}

#[test]
fn skin_rebinding_falls_back_for_unmapped_bones() {
    let (reference, mut target) = spine_pair();
    let request = ResolveRequest::new().with_exclusion("Spine1");
    let resolution = Resolver::default()
        .resolve(&reference, &mut target, &request)
        .expect("resolve");

    let hips = reference.find_by_name("Hips").unwrap();
    let spine1 = reference.find_by_name("Spine1").unwrap();
    let target_hips = target.find_by_name("Hips").unwrap();
    let fallback = target.find_by_name("Armature").unwrap();
    let remapped = resolution.table.remap_bones(&[hips, spine1, hips], fallback);
    assert_eq!(remapped, vec![target_hips, fallback, target_hips]);
}

#[test]
fn passes_can_be_reordered_and_dropped() {
    let (reference, mut target) = spine_pair();
    let config = ResolverConfig::default().with_passes(vec![PassKind::SpatialProximity]);
    let resolution = Resolver::new(config)
        .resolve(&reference, &mut target, &ResolveRequest::new())
        .expect("resolve");
    assert_eq!(resolution.stats.passes_run, vec![PassKind::SpatialProximity]);
    assert_eq!(
        method_of(&resolution, &reference, "Hips"),
        Some(ResolutionMethod::SpatialProximity)
    );
}
