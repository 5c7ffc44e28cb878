use once_cell::sync::Lazy;
use proptest::prelude::*;
use vizij_rig_core::{
    names_overlap, normalize_name, CanonicalType, JointId, JointRef, NormalizeMode, PassKind,
    ResolutionMethod, ResolveRequest, Resolver, ResolverConfig, Skeleton, SkeletonDesc, Transform,
};

fn fixture(name: &str) -> Skeleton {
    let desc: SkeletonDesc =
        vizij_test_fixtures::skeletons::load(name).expect("load skeleton fixture");
    Skeleton::from_desc(&desc).expect("build skeleton")
}

static BODY: Lazy<Skeleton> = Lazy::new(|| fixture("humanoid-body"));
static HOODIE: Lazy<Skeleton> = Lazy::new(|| fixture("hoodie"));

fn flat(name: &str, joints: &[String]) -> Skeleton {
    let mut s = Skeleton::new(name);
    let root = s.add_root("Armature", Transform::identity()).unwrap();
    for (i, joint) in joints.iter().enumerate() {
        let pos = [i as f32 * 0.1, 1.0, 0.0];
        s.add_joint(root, joint.as_str(), Transform::from_position(pos))
            .unwrap();
    }
    s
}

fn mode() -> impl Strategy<Value = NormalizeMode> {
    prop_oneof![Just(NormalizeMode::Loose), Just(NormalizeMode::Strict)]
}

proptest! {
    #[test]
    fn normalization_is_idempotent(raw in "\\PC{0,24}", mode in mode()) {
        let once = normalize_name(&raw, mode);
        prop_assert_eq!(normalize_name(&once, mode), once);
    }

    #[test]
    fn rig_like_names_normalize_idempotently(
        raw in "([a-z]{2,6}:)?[A-Za-z]{1,8}([_ .-][A-Za-z0-9]{1,4}){0,3}",
        mode in mode(),
    ) {
        let once = normalize_name(&raw, mode);
        prop_assert!(!once.contains(':'));
        prop_assert_eq!(normalize_name(&once, mode), once);
    }

    #[test]
    fn overlap_does_not_depend_on_operand_order(
        a in "[a-z]{0,10}",
        b in "[a-z]{0,10}",
        min_len in 0usize..5,
    ) {
        prop_assert_eq!(names_overlap(&a, &b, min_len), names_overlap(&b, &a, min_len));
    }

    #[test]
    fn overlap_holds_for_embedded_names(
        prefix in "[a-z]{0,4}",
        core in "[a-z]{3,8}",
        suffix in "[a-z]{0,4}",
    ) {
        let long = format!("{prefix}{core}{suffix}");
        prop_assert!(names_overlap(&core, &long, 3));
        prop_assert!(names_overlap(&long, &core, 3));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn exact_names_always_resolve_by_exact_name(
        names in prop::collection::hash_set("[A-Za-z_]{1,10}", 1..12),
        noise in prop::collection::vec("[A-Za-z]{3,8}", 0..6),
    ) {
        let names: Vec<String> = names.into_iter().collect();
        let reference = flat("reference", &names);
        let mut shuffled: Vec<String> = names.iter().rev().cloned().collect();
        shuffled.extend(noise);
        let mut target = flat("target", &shuffled);

        let resolution = Resolver::default()
            .resolve(&reference, &mut target, &ResolveRequest::new())
            .unwrap();
        for name in &names {
            let id = reference.find_by_name(name).unwrap();
            let entry = resolution.table.get(id).unwrap();
            prop_assert_eq!(entry.method, ResolutionMethod::ExactName);
            let mapped = target.name_of(entry.target.unwrap()).unwrap();
            prop_assert_eq!(mapped, name.as_str());
        }
    }

    #[test]
    fn overrides_win_over_the_cascade(
        r in 0usize..64,
        t in 0usize..64,
    ) {
        let reference = BODY.clone();
        let mut target = HOODIE.clone();
        let r = JointId((r % reference.len()) as u32);
        let t = JointId((t % target.len()) as u32);
        let request = ResolveRequest::new().with_override(r, t);

        let resolution = Resolver::default()
            .resolve(&reference, &mut target, &request)
            .unwrap();
        let entry = resolution.table.get(r).unwrap();
        prop_assert_eq!(entry.method, ResolutionMethod::ManualOverride);
        prop_assert_eq!(entry.target, Some(t));
        prop_assert!(entry.manual);
    }

    #[test]
    fn uniform_target_scale_keeps_spatial_matches(exp in -3i32..=3) {
        let config = ResolverConfig {
            synthesis: vizij_rig_core::config::SynthesisConfig {
                enabled: false,
                ..Default::default()
            },
            ..ResolverConfig::default()
        }
        .with_passes(vec![PassKind::SpatialProximity]);
        let resolver = Resolver::new(config);

        let reference = BODY.clone();
        let mut base = HOODIE.clone();
        let mut scaled = HOODIE.scaled(2f32.powi(exp));
        let a = resolver
            .resolve(&reference, &mut base, &ResolveRequest::new())
            .unwrap();
        let b = resolver
            .resolve(&reference, &mut scaled, &ResolveRequest::new())
            .unwrap();
        prop_assert_eq!(
            a.table.name_pairs(&reference, &base),
            b.table.name_pairs(&reference, &scaled)
        );
        prop_assert_eq!(a.unresolved, b.unresolved);
    }

    #[test]
    fn synthesis_terminates_for_any_essential_order(
        essential in Just(CanonicalType::ESSENTIAL.to_vec()).prop_shuffle(),
        max_depth in 0usize..10,
    ) {
        let config = ResolverConfig {
            essential,
            synthesis: vizij_rig_core::config::SynthesisConfig {
                enabled: true,
                max_depth,
            },
            ..ResolverConfig::default()
        };
        let reference = BODY.clone();
        let mut target = Skeleton::new("stub");
        let root = target.add_root("Armature", Transform::identity()).unwrap();
        target
            .add_joint(root, "Hips", Transform::from_position([0.0, 1.0, 0.0]))
            .unwrap();

        let resolution = Resolver::new(config)
            .resolve(&reference, &mut target, &ResolveRequest::new())
            .unwrap();
        prop_assert!(resolution.synthesized.len() < CanonicalType::ESSENTIAL.len());
        for made in &resolution.synthesized {
            prop_assert_eq!(target.parent(made.joint), Some(made.parent));
        }
        // Hand -> lower arm -> upper arm -> shoulder -> upper chest -> chest
        // -> spine is the longest chain above the mapped hips.
        if max_depth >= 6 {
            prop_assert!(resolution.unresolved_essentials.is_empty());
            prop_assert_eq!(resolution.synthesized.len(), CanonicalType::ESSENTIAL.len() - 1);
        }
    }
}

#[test]
fn resolution_is_repeatable() {
    let resolver = Resolver::default();
    let reference = BODY.clone();
    let mut first_target = HOODIE.clone();
    let mut second_target = HOODIE.clone();
    let first = resolver
        .resolve(&reference, &mut first_target, &ResolveRequest::new())
        .unwrap();
    let second = resolver
        .resolve(&reference, &mut second_target, &ResolveRequest::new())
        .unwrap();

    assert_eq!(first.table, second.table);
    assert_eq!(first.synthesized, second.synthesized);
    assert_eq!(first.issues, second.issues);
    assert_eq!(first_target, second_target);
}

#[test]
fn name_overrides_resolve_like_id_overrides() {
    let reference = BODY.clone();
    let mut target = HOODIE.clone();
    let request = ResolveRequest::new().with_override(
        JointRef::Name("LeftHand".into()),
        JointRef::Name("Zipper".into()),
    );
    let resolution = Resolver::default()
        .resolve(&reference, &mut target, &request)
        .unwrap();
    let hand = reference.find_by_name("LeftHand").unwrap();
    assert_eq!(
        resolution.table.target_of(hand),
        target.find_by_name("Zipper")
    );
    // No other reference joint takes the hoodie hand instead.
    let hoodie_hand = target.find_by_name("Hand_L").unwrap();
    assert!(!resolution.table.is_claimed(hoodie_hand));
}
