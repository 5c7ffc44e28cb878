//! Arena-backed skeleton tree.
//!
//! Joints live in a flat `Vec` and refer to each other by [`JointId`]. The
//! arena only ever grows: joints are appended (e.g. by synthesis) but never
//! removed or re-parented, which keeps the tree acyclic by construction and
//! keeps every issued id valid.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RigError};
use crate::ids::{JointId, JointRef};
use crate::transform::Transform;

/// One node of a skeleton.
#[derive(Clone, Debug, PartialEq)]
pub struct Joint {
    pub id: JointId,
    pub name: String,
    pub local: Transform,
    pub parent: Option<JointId>,
    pub children: Vec<JointId>,
    world: Transform,
}

impl Joint {
    /// World transform derived from the parent chain.
    #[inline]
    pub fn world(&self) -> &Transform {
        &self.world
    }

    #[inline]
    pub fn world_position(&self) -> [f32; 3] {
        self.world.position
    }
}

/// Axis-aligned bounding volume over joint world positions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Bounds {
    pub fn from_point(p: [f32; 3]) -> Self {
        Bounds { min: p, max: p }
    }

    pub fn extend(&mut self, p: [f32; 3]) {
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(p[axis]);
            self.max[axis] = self.max[axis].max(p[axis]);
        }
    }

    pub fn center(&self) -> [f32; 3] {
        [
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
            (self.min[2] + self.max[2]) * 0.5,
        ]
    }

    pub fn size(&self) -> [f32; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    /// Axes whose extent reaches `min_extent`; the others cannot tell joints apart.
    pub fn discriminating_axes(&self, min_extent: f32) -> [bool; 3] {
        let size = self.size();
        [
            size[0] > min_extent,
            size[1] > min_extent,
            size[2] > min_extent,
        ]
    }

    /// Map `p` into [-1, 1] per axis, centered on and scaled by the half-extent.
    /// Degenerate axes collapse to 0.
    pub fn normalize(&self, p: [f32; 3], min_extent: f32) -> [f32; 3] {
        let center = self.center();
        let size = self.size();
        let mut out = [0.0; 3];
        for axis in 0..3 {
            if size[axis] > min_extent {
                out[axis] = (p[axis] - center[axis]) / (size[axis] * 0.5);
            }
        }
        out
    }
}

/// A rooted tree of joints plus its cached bounding volume.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Skeleton {
    pub name: String,
    joints: Vec<Joint>,
    bounds: Option<Bounds>,
}

impl Skeleton {
    pub fn new(name: impl Into<String>) -> Self {
        Skeleton {
            name: name.into(),
            joints: Vec::new(),
            bounds: None,
        }
    }

    /// Create the root joint. A skeleton has exactly one root.
    pub fn add_root(&mut self, name: impl Into<String>, local: Transform) -> Result<JointId> {
        if !self.joints.is_empty() {
            return Err(RigError::invalid(format!(
                "skeleton '{}' already has a root",
                self.name
            )));
        }
        Ok(self.push(name.into(), local, None, local))
    }

    /// Append a joint under `parent`.
    pub fn add_joint(
        &mut self,
        parent: JointId,
        name: impl Into<String>,
        local: Transform,
    ) -> Result<JointId> {
        let parent_world = match self.joints.get(parent.index()) {
            Some(p) => p.world,
            None => {
                return Err(RigError::invalid(format!(
                    "parent {parent} does not exist in skeleton '{}'",
                    self.name
                )))
            }
        };
        let world = parent_world.compose(&local);
        let id = self.push(name.into(), local, Some(parent), world);
        self.joints[parent.index()].children.push(id);
        Ok(id)
    }

    fn push(
        &mut self,
        name: String,
        local: Transform,
        parent: Option<JointId>,
        world: Transform,
    ) -> JointId {
        let id = JointId::from_index(self.joints.len());
        match self.bounds.as_mut() {
            Some(b) => b.extend(world.position),
            None => self.bounds = Some(Bounds::from_point(world.position)),
        }
        self.joints.push(Joint {
            id,
            name,
            local,
            parent,
            children: Vec::new(),
            world,
        });
        id
    }

    #[inline]
    pub fn root(&self) -> Option<JointId> {
        self.joints.first().map(|j| j.id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.joints.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    #[inline]
    pub fn get(&self, id: JointId) -> Option<&Joint> {
        self.joints.get(id.index())
    }

    #[inline]
    pub fn contains(&self, id: JointId) -> bool {
        id.index() < self.joints.len()
    }

    pub fn name_of(&self, id: JointId) -> Option<&str> {
        self.get(id).map(|j| j.name.as_str())
    }

    #[inline]
    pub fn parent(&self, id: JointId) -> Option<JointId> {
        self.get(id).and_then(|j| j.parent)
    }

    pub fn children(&self, id: JointId) -> &[JointId] {
        self.get(id).map(|j| j.children.as_slice()).unwrap_or(&[])
    }

    /// Ancestors from the parent up to the root.
    pub fn ancestors(&self, id: JointId) -> impl Iterator<Item = JointId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
    }

    pub fn depth(&self, id: JointId) -> usize {
        self.ancestors(id).count()
    }

    pub fn world_position(&self, id: JointId) -> Option<[f32; 3]> {
        self.get(id).map(|j| j.world.position)
    }

    /// Min/max world position across every joint.
    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    /// Joints in arena (insertion) order.
    pub fn joints(&self) -> impl Iterator<Item = &Joint> {
        self.joints.iter()
    }

    /// Depth-first pre-order traversal starting at `start`, children in order.
    pub fn walk(&self, start: JointId) -> Vec<JointId> {
        let mut order = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let Some(joint) = self.get(id) else {
                continue;
            };
            order.push(id);
            stack.extend(joint.children.iter().rev().copied());
        }
        order
    }

    /// First joint (depth-first) whose name equals `name` exactly.
    pub fn find_by_name(&self, name: &str) -> Option<JointId> {
        let root = self.root()?;
        self.walk(root)
            .into_iter()
            .find(|&id| self.name_of(id) == Some(name))
    }

    pub fn resolve(&self, key: &JointRef) -> Result<JointId> {
        let found = match key {
            JointRef::Id(id) => self.contains(*id).then_some(*id),
            JointRef::Name(name) => self.find_by_name(name),
        };
        found.ok_or_else(|| RigError::JointNotFound {
            skeleton: self.name.clone(),
            key: key.to_string(),
        })
    }

    /// Uniformly scale every joint offset. Rotations and scales are untouched,
    /// so the tree keeps its shape at a different size.
    pub fn scaled(&self, factor: f32) -> Skeleton {
        let mut out = Skeleton::new(self.name.clone());
        let Some(root) = self.root() else {
            return out;
        };
        let mut remap = vec![JointId(0); self.joints.len()];
        for id in self.walk(root) {
            let Some(joint) = self.get(id) else {
                continue;
            };
            let local = joint.local.with_scaled_position(factor);
            let new_id = match joint.parent {
                None => out.push(joint.name.clone(), local, None, local),
                Some(parent) => {
                    let parent_new = remap[parent.index()];
                    let world = out.joints[parent_new.index()].world.compose(&local);
                    let nid = out.push(joint.name.clone(), local, Some(parent_new), world);
                    out.joints[parent_new.index()].children.push(nid);
                    nid
                }
            };
            remap[id.index()] = new_id;
        }
        out
    }

    pub fn from_desc(desc: &SkeletonDesc) -> Result<Skeleton> {
        let mut skeleton = Skeleton::new(desc.name.clone());
        let root = skeleton.add_root(desc.root.name.clone(), desc.root.transform)?;
        let mut stack: Vec<(JointId, &JointDesc)> = desc
            .root
            .children
            .iter()
            .rev()
            .map(|child| (root, child))
            .collect();
        while let Some((parent, node)) = stack.pop() {
            let id = skeleton.add_joint(parent, node.name.clone(), node.transform)?;
            for child in node.children.iter().rev() {
                stack.push((id, child));
            }
        }
        Ok(skeleton)
    }

    pub fn to_desc(&self) -> Option<SkeletonDesc> {
        let root = self.root()?;
        Some(SkeletonDesc {
            name: self.name.clone(),
            root: self.desc_of(root)?,
        })
    }

    fn desc_of(&self, id: JointId) -> Option<JointDesc> {
        let joint = self.get(id)?;
        Some(JointDesc {
            name: joint.name.clone(),
            transform: joint.local,
            children: joint
                .children
                .iter()
                .filter_map(|&c| self.desc_of(c))
                .collect(),
        })
    }

    pub fn from_json(json: &str) -> Result<Skeleton> {
        let desc: SkeletonDesc = serde_json::from_str(json)?;
        Skeleton::from_desc(&desc)
    }
}

/// Nested JSON form of a skeleton.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkeletonDesc {
    #[serde(default)]
    pub name: String,
    pub root: JointDesc,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JointDesc {
    pub name: String,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default)]
    pub children: Vec<JointDesc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> Skeleton {
        let mut s = Skeleton::new("body");
        let root = s.add_root("Armature", Transform::identity()).unwrap();
        let hips = s
            .add_joint(root, "Hips", Transform::from_position([0.0, 1.0, 0.0]))
            .unwrap();
        s.add_joint(hips, "Spine", Transform::from_position([0.0, 0.2, 0.0]))
            .unwrap();
        s.add_joint(hips, "LeftUpLeg", Transform::from_position([0.1, -0.1, 0.0]))
            .unwrap();
        s
    }

    #[test]
    fn world_positions_follow_parents() {
        let s = small();
        let spine = s.find_by_name("Spine").unwrap();
        let p = s.world_position(spine).unwrap();
        assert!((p[1] - 1.2).abs() < 1e-6);
        assert_eq!(s.depth(spine), 2);
    }

    #[test]
    fn bounds_track_appended_joints() {
        let mut s = small();
        let b = s.bounds().unwrap();
        assert_eq!(b.min[1], 0.0);
        assert!((b.max[1] - 1.2).abs() < 1e-6);
        let spine = s.find_by_name("Spine").unwrap();
        s.add_joint(spine, "Head", Transform::from_position([0.0, 0.5, 0.0]))
            .unwrap();
        assert!((s.bounds().unwrap().max[1] - 1.7).abs() < 1e-6);
    }

    #[test]
    fn second_root_is_rejected() {
        let mut s = small();
        assert!(matches!(
            s.add_root("Other", Transform::identity()),
            Err(RigError::InvalidInput { .. })
        ));
        assert!(s.add_joint(JointId(99), "x", Transform::identity()).is_err());
    }

    #[test]
    fn walk_is_depth_first_in_child_order() {
        let s = small();
        let names: Vec<&str> = s
            .walk(s.root().unwrap())
            .into_iter()
            .map(|id| s.name_of(id).unwrap())
            .collect();
        assert_eq!(names, vec!["Armature", "Hips", "Spine", "LeftUpLeg"]);
    }

    #[test]
    fn foreign_ids_are_absent_not_fatal() {
        let s = small();
        let stray = JointId(42);
        assert!(s.walk(stray).is_empty());
        assert_eq!(s.get(stray), None);
        assert_eq!(s.name_of(stray), None);
        assert!(s.children(stray).is_empty());
        assert_eq!(s.depth(stray), 0);
    }

    #[test]
    fn desc_round_trip_preserves_structure() {
        let s = small();
        let desc = s.to_desc().unwrap();
        let back = Skeleton::from_desc(&desc).unwrap();
        assert_eq!(s, back);
    }

    #[test]
    fn scaled_multiplies_world_positions() {
        let s = small();
        let big = s.scaled(2.0);
        let spine = big.find_by_name("Spine").unwrap();
        assert!((big.world_position(spine).unwrap()[1] - 2.4).abs() < 1e-6);
    }

    #[test]
    fn bounds_normalize_ignores_flat_axes() {
        let b = Bounds {
            min: [-1.0, 0.0, 0.0],
            max: [1.0, 2.0, 0.0],
        };
        assert_eq!(b.normalize([0.5, 2.0, 0.0], 1e-4), [0.5, 1.0, 0.0]);
        assert_eq!(b.discriminating_axes(1e-4), [true, true, false]);
    }
}
