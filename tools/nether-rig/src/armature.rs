//! Armature bone hierarchy
//!
//! Bones are stored in an arena indexed by [`BoneId`]. A bone can only be
//! attached to a parent that is already in the arena, so parents always have a
//! lower index than their children and the hierarchy cannot contain a loop.

use glam::Vec3;

use crate::error::RigError;

bitflags::bitflags! {
    /// Per-bone flags read by the hierarchy helpers
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BoneFlags: u32 {
        /// Head is glued to the parent's tail
        const CONNECTED = 1 << 0;
        /// Bone does not deform meshes (control/helper bone)
        const NO_DEFORM = 1 << 1;
    }
}

/// Index of a bone inside its [`Armature`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoneId(usize);

impl BoneId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A single bone
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub name: String,
    pub parent: Option<BoneId>,
    pub children: Vec<BoneId>,
    pub flags: BoneFlags,
    pub head: Vec3,
    pub tail: Vec3,
    pub roll: f32,
    /// Layer bitfield (see [`crate::layers`])
    pub layers: u32,
}

impl Bone {
    pub fn is_deform(&self) -> bool {
        !self.flags.contains(BoneFlags::NO_DEFORM)
    }

    pub fn is_connected(&self) -> bool {
        self.flags.contains(BoneFlags::CONNECTED)
    }
}

/// A named bone hierarchy
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Armature {
    name: String,
    bones: Vec<Bone>,
}

impl Armature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bones: Vec::new(),
        }
    }

    /// Hierarchy identity used to key per-armature import state
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// Add a bone under `parent` (or as a root)
    ///
    /// Bone names are unique within an armature.
    pub fn add_bone(
        &mut self,
        name: impl Into<String>,
        parent: Option<BoneId>,
        flags: BoneFlags,
    ) -> Result<BoneId, RigError> {
        let name = name.into();
        if self.find_bone(&name).is_some() {
            return Err(RigError::DuplicateBone(name));
        }
        if let Some(parent) = parent
            && parent.0 >= self.bones.len()
        {
            return Err(RigError::UnknownBone(format!("#{}", parent.0)));
        }

        let id = BoneId(self.bones.len());
        let head = parent.map(|p| self.bones[p.0].tail).unwrap_or(Vec3::ZERO);
        self.bones.push(Bone {
            name,
            parent,
            children: Vec::new(),
            flags,
            head,
            tail: head + Vec3::Y,
            roll: 0.0,
            layers: 0,
        });
        if let Some(parent) = parent {
            self.bones[parent.0].children.push(id);
        }

        Ok(id)
    }

    /// Get a bone by id
    ///
    /// Ids are only handed out by [`Armature::add_bone`], so an id from another
    /// armature is a caller bug and panics.
    pub fn bone(&self, id: BoneId) -> &Bone {
        &self.bones[id.0]
    }

    pub fn bone_mut(&mut self, id: BoneId) -> &mut Bone {
        &mut self.bones[id.0]
    }

    /// Iterate bones in insertion order (parents before children)
    pub fn bones(&self) -> impl Iterator<Item = (BoneId, &Bone)> {
        self.bones.iter().enumerate().map(|(i, b)| (BoneId(i), b))
    }

    /// Look up a bone by name
    pub fn find_bone(&self, name: &str) -> Option<BoneId> {
        self.bones.iter().position(|b| b.name == name).map(BoneId)
    }

    /// Walk from `id` to the tree root, starting with `id` itself
    pub fn self_and_ancestors(&self, id: BoneId) -> impl Iterator<Item = BoneId> + '_ {
        std::iter::successors(Some(id), move |&current| self.bones[current.0].parent)
    }

    /// Top-most bones, see [`is_root_bone`]
    pub fn roots(&self, deform_bones_only: bool) -> Vec<BoneId> {
        self.bones()
            .map(|(id, _)| id)
            .filter(|&id| is_root_bone(self, id, deform_bones_only))
            .collect()
    }

    /// Length of the longest connected chain starting at each bone
    ///
    /// A bone without connected children has length 1. Indexed by
    /// [`BoneId::index`].
    pub fn chain_lengths(&self) -> Vec<usize> {
        let mut lengths = vec![1usize; self.bones.len()];
        // Children always come after their parent, so a reverse sweep sees
        // every child before the parent that reads it.
        for index in (0..self.bones.len()).rev() {
            let longest = self.bones[index]
                .children
                .iter()
                .filter(|child| self.bones[child.0].is_connected())
                .map(|child| lengths[child.0])
                .max()
                .unwrap_or(0);
            lengths[index] = longest + 1;
        }
        lengths
    }

    pub fn chain_length(&self, id: BoneId) -> usize {
        self.chain_lengths()[id.0]
    }
}

/// Check if a bone is the top-most exportable bone of its hierarchy
///
/// Without `deform_bones_only` only parentless bones are roots. With it, the
/// root of a branch is the highest deforming bone on the path to the tree
/// root, so a deforming bone below a chain of control bones is a root only if
/// no deforming bone sits above that chain.
pub fn is_root_bone(armature: &Armature, bone: BoneId, deform_bones_only: bool) -> bool {
    if !deform_bones_only {
        return armature.bone(bone).parent.is_none();
    }

    let root = armature
        .self_and_ancestors(bone)
        .filter(|&id| armature.bone(id).is_deform())
        .last();
    root == Some(bone)
}

/// A bone is a leaf when none of its children is connected to it
pub fn is_leaf_bone(armature: &Armature, bone: BoneId) -> bool {
    !armature
        .bone(bone)
        .children
        .iter()
        .any(|&child| armature.bone(child).is_connected())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// root -> a -> b -> leaf, with `a` and `b` flagged as control bones
    fn control_chain(root_flags: BoneFlags) -> (Armature, [BoneId; 4]) {
        let mut arm = Armature::new("Armature");
        let root = arm.add_bone("root", None, root_flags).unwrap();
        let a = arm.add_bone("a", Some(root), BoneFlags::NO_DEFORM).unwrap();
        let b = arm.add_bone("b", Some(a), BoneFlags::NO_DEFORM).unwrap();
        let leaf = arm.add_bone("leaf", Some(b), BoneFlags::empty()).unwrap();
        (arm, [root, a, b, leaf])
    }

    #[test]
    fn test_root_without_deform_filter() {
        let (arm, [root, a, _, leaf]) = control_chain(BoneFlags::empty());
        assert!(is_root_bone(&arm, root, false));
        assert!(!is_root_bone(&arm, a, false));
        assert!(!is_root_bone(&arm, leaf, false));
    }

    #[test]
    fn test_deform_root_below_control_bones() {
        let (arm, [root, a, b, leaf]) = control_chain(BoneFlags::NO_DEFORM);
        assert!(is_root_bone(&arm, leaf, true));
        assert!(!is_root_bone(&arm, root, true));
        assert!(!is_root_bone(&arm, a, true));
        assert!(!is_root_bone(&arm, b, true));
        assert_eq!(arm.roots(true), vec![leaf]);
    }

    #[test]
    fn test_deforming_tree_root_wins() {
        let (arm, [root, a, _, leaf]) = control_chain(BoneFlags::empty());
        assert!(is_root_bone(&arm, root, true));
        assert!(!is_root_bone(&arm, leaf, true));
        assert!(!is_root_bone(&arm, a, true));
    }

    #[test]
    fn test_leaf_bone() {
        let mut arm = Armature::new("Armature");
        let parent = arm.add_bone("parent", None, BoneFlags::empty()).unwrap();
        let connected = arm
            .add_bone("connected", Some(parent), BoneFlags::CONNECTED)
            .unwrap();
        let loose = arm.add_bone("loose", Some(parent), BoneFlags::empty()).unwrap();
        let only_loose = arm.add_bone("only_loose", None, BoneFlags::empty()).unwrap();
        arm.add_bone("dangling", Some(only_loose), BoneFlags::empty())
            .unwrap();

        assert!(!is_leaf_bone(&arm, parent));
        assert!(is_leaf_bone(&arm, connected));
        assert!(is_leaf_bone(&arm, loose));
        assert!(is_leaf_bone(&arm, only_loose));
    }

    #[test]
    fn test_add_bone_rejects_duplicates() {
        let mut arm = Armature::new("Armature");
        arm.add_bone("hips", None, BoneFlags::empty()).unwrap();
        assert_eq!(
            arm.add_bone("hips", None, BoneFlags::empty()),
            Err(RigError::DuplicateBone("hips".to_string()))
        );
    }

    #[test]
    fn test_add_bone_rejects_parent_from_elsewhere() {
        let mut other = Armature::new("Other");
        other.add_bone("a", None, BoneFlags::empty()).unwrap();
        let foreign = other.add_bone("b", None, BoneFlags::empty()).unwrap();

        let mut arm = Armature::new("Armature");
        assert_eq!(
            arm.add_bone("arm", Some(foreign), BoneFlags::empty()),
            Err(RigError::UnknownBone("#1".to_string()))
        );
        assert!(arm.is_empty());
    }

    #[test]
    fn test_add_bone_links_parent_and_head() {
        let mut arm = Armature::new("Armature");
        let hips = arm.add_bone("hips", None, BoneFlags::empty()).unwrap();
        arm.bone_mut(hips).tail = Vec3::new(0.0, 0.0, 2.0);
        let spine = arm.add_bone("spine", Some(hips), BoneFlags::CONNECTED).unwrap();

        assert_eq!(arm.bone(hips).children, vec![spine]);
        assert_eq!(arm.bone(spine).head, Vec3::new(0.0, 0.0, 2.0));
        assert_eq!(arm.find_bone("spine"), Some(spine));
        assert_eq!(arm.find_bone("tail"), None);
    }

    #[test]
    fn test_chain_lengths() {
        let mut arm = Armature::new("Armature");
        let hips = arm.add_bone("hips", None, BoneFlags::empty()).unwrap();
        let spine = arm.add_bone("spine", Some(hips), BoneFlags::CONNECTED).unwrap();
        let chest = arm.add_bone("chest", Some(spine), BoneFlags::CONNECTED).unwrap();
        let thigh = arm.add_bone("thigh", Some(hips), BoneFlags::empty()).unwrap();

        assert_eq!(arm.chain_length(hips), 3);
        assert_eq!(arm.chain_length(spine), 2);
        assert_eq!(arm.chain_length(chest), 1);
        assert_eq!(arm.chain_length(thigh), 1);
    }
}
