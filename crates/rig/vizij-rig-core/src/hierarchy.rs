//! Root-relative paths, depths and bounds for one skeleton.

use hashbrown::HashMap;

use crate::ids::JointId;
use crate::normalize::{names_overlap, normalize_name, side_of, NormalizeMode};
use crate::skeleton::{Bounds, Skeleton};
use crate::synonyms::TypeClassifier;

/// Names from the structural root down to a joint (both inclusive).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HierarchyPath {
    pub segments: Vec<String>,
}

impl HierarchyPath {
    /// Hops below the structural root.
    pub fn depth(&self) -> usize {
        self.segments.len().saturating_sub(1)
    }

    /// `/`-joined form, handy for logs and fixtures.
    pub fn display(&self) -> String {
        self.segments.join("/")
    }

    /// Averaged per-segment similarity; `None` when depths differ.
    ///
    /// Segment scores: case-insensitive equality 1.0, equality after
    /// normalization 0.9, containment 0.7, same left/right side 0.8.
    pub fn similarity(&self, other: &HierarchyPath, mode: NormalizeMode) -> Option<f32> {
        if self.segments.len() != other.segments.len() || self.segments.is_empty() {
            return None;
        }
        let total: f32 = self
            .segments
            .iter()
            .zip(&other.segments)
            .map(|(a, b)| segment_score(a, b, mode))
            .sum();
        Some(total / self.segments.len() as f32)
    }
}

fn segment_score(a: &str, b: &str, mode: NormalizeMode) -> f32 {
    if a.to_lowercase() == b.to_lowercase() {
        return 1.0;
    }
    let (na, nb) = (normalize_name(a, mode), normalize_name(b, mode));
    if !na.is_empty() && na == nb {
        0.9
    } else if names_overlap(&na, &nb, 1) {
        0.7
    } else if side_of(a).is_some() && side_of(a) == side_of(b) {
        0.8
    } else {
        0.0
    }
}

/// Single-traversal index over the part of a skeleton under its structural root.
#[derive(Clone, Debug)]
pub struct HierarchyIndex {
    root: JointId,
    order: Vec<JointId>,
    paths: HashMap<JointId, HierarchyPath>,
    bounds: Option<Bounds>,
}

impl HierarchyIndex {
    /// Index `skeleton` from its structural root container.
    ///
    /// The container is the shallowest joint (breadth-first) whose normalized
    /// name contains one of the keywords, skipping joints that classify to a
    /// body type (`root_pelvis` is a pelvis, not a container). Without a
    /// container the whole tree is used.
    pub fn build(
        skeleton: &Skeleton,
        root_container_names: &[String],
        classifier: &TypeClassifier,
    ) -> Option<HierarchyIndex> {
        let tree_root = skeleton.root()?;
        let root = find_container(skeleton, tree_root, root_container_names, classifier)
            .unwrap_or(tree_root);

        let order = skeleton.walk(root);
        let mut paths: HashMap<JointId, HierarchyPath> = HashMap::with_capacity(order.len());
        let mut bounds: Option<Bounds> = None;
        for &id in &order {
            let Some(joint) = skeleton.get(id) else {
                continue;
            };
            let mut segments = match joint.parent.and_then(|p| paths.get(&p)) {
                Some(parent) if id != root => parent.segments.clone(),
                _ => Vec::new(),
            };
            segments.push(joint.name.clone());
            paths.insert(id, HierarchyPath { segments });

            let p = joint.world_position();
            match bounds.as_mut() {
                Some(b) => b.extend(p),
                None => bounds = Some(Bounds::from_point(p)),
            }
        }
        Some(HierarchyIndex {
            root,
            order,
            paths,
            bounds,
        })
    }

    /// The designated structural root.
    pub fn root(&self) -> JointId {
        self.root
    }

    /// Indexed joints in depth-first pre-order.
    pub fn order(&self) -> &[JointId] {
        &self.order
    }

    pub fn path(&self, id: JointId) -> Option<&HierarchyPath> {
        self.paths.get(&id)
    }

    pub fn depth(&self, id: JointId) -> Option<usize> {
        self.paths.get(&id).map(HierarchyPath::depth)
    }

    pub fn contains(&self, id: JointId) -> bool {
        self.paths.contains_key(&id)
    }

    /// Bounds of the indexed joints only.
    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

fn find_container(
    skeleton: &Skeleton,
    start: JointId,
    names: &[String],
    classifier: &TypeClassifier,
) -> Option<JointId> {
    let mode = classifier.mode();
    let keys: Vec<String> = names
        .iter()
        .map(|n| normalize_name(n, mode))
        .filter(|k| !k.is_empty())
        .collect();
    if keys.is_empty() {
        return None;
    }

    let mut queue = std::collections::VecDeque::from([start]);
    while let Some(id) = queue.pop_front() {
        let Some(joint) = skeleton.get(id) else {
            continue;
        };
        let normalized = normalize_name(&joint.name, mode);
        if keys.iter().any(|k| normalized.contains(k.as_str()))
            && classifier.classify(&normalized).is_none()
        {
            return Some(id);
        }
        queue.extend(joint.children.iter().copied());
    }
    None
}
