//! Scene objects and parenting
//!
//! A minimal object arena holding what the import/export helpers touch:
//! parent links, transforms, modifiers, layers and the export mark.
//!
//! Transforms follow the usual parent chain: an object's world matrix is
//! `parent.world * parent_inverse * local`.

use glam::{Mat4, Vec3};
use std::f32::consts::FRAC_PI_2;

use crate::armature::Armature;
use crate::error::RigError;
use crate::mesh::{Mesh, MeshType};

/// Index of an object inside its [`Scene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(usize);

impl ObjectId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Empty,
    Mesh,
    Armature,
    Camera,
    Light,
}

/// Data block owned by an object
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ObjectData {
    #[default]
    None,
    Mesh(Mesh),
    Armature(Armature),
}

impl ObjectData {
    pub fn is_some(&self) -> bool {
        !matches!(self, ObjectData::None)
    }
}

/// How an object follows its parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParentType {
    /// Plain object parent
    #[default]
    Object,
    /// Deformed by the parent armature
    Skeleton,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifierKind {
    /// Deform by an armature object
    Armature { object: Option<ObjectId> },
    /// Split faces into triangles
    Triangulate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Modifier {
    pub kind: ModifierKind,
    pub show_viewport: bool,
    pub show_render: bool,
}

impl Modifier {
    pub fn new(kind: ModifierKind) -> Self {
        Self {
            kind,
            show_viewport: true,
            show_render: true,
        }
    }

    pub fn is_enabled(&self, mesh_type: MeshType) -> bool {
        match mesh_type {
            MeshType::View => self.show_viewport,
            MeshType::Render => self.show_render,
        }
    }
}

bitflags::bitflags! {
    /// Parts of an object that need recomputation
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Recalc: u8 {
        const OBJECT = 1 << 0;
        const DATA = 1 << 1;
        const TIME = 1 << 2;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    pub name: String,
    pub kind: ObjectKind,
    pub data: ObjectData,
    pub parent: Option<ObjectId>,
    pub parent_type: ParentType,
    /// Transform relative to the parent space
    pub local: Mat4,
    /// Inverse of the parent's world matrix at parenting time
    pub parent_inverse: Mat4,
    /// Last computed world matrix
    pub world: Mat4,
    pub modifiers: Vec<Modifier>,
    pub layers: u32,
    /// Export tag
    pub marked: bool,
    pub selected: bool,
    pub recalc: Recalc,
}

impl Object {
    fn new(kind: ObjectKind, name: String) -> Self {
        let data = match kind {
            ObjectKind::Mesh => ObjectData::Mesh(Mesh::new(name.as_str())),
            ObjectKind::Armature => ObjectData::Armature(Armature::new(name.as_str())),
            _ => ObjectData::None,
        };
        Self {
            name,
            kind,
            data,
            parent: None,
            parent_type: ParentType::Object,
            local: Mat4::IDENTITY,
            parent_inverse: Mat4::IDENTITY,
            world: Mat4::IDENTITY,
            modifiers: Vec::new(),
            layers: 1,
            marked: false,
            selected: false,
            recalc: Recalc::empty(),
        }
    }
}

/// Unit and up-axis of an interchange file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpAxis {
    X,
    Y,
    #[default]
    Z,
}

/// Converts file space (unit length, up axis) into scene space (meters, Z up)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitConverter {
    /// Length of one file unit in meters
    pub meter: f32,
    pub up_axis: UpAxis,
}

impl Default for UnitConverter {
    fn default() -> Self {
        Self {
            meter: 1.0,
            up_axis: UpAxis::Z,
        }
    }
}

impl UnitConverter {
    pub fn scale(&self) -> Mat4 {
        Mat4::from_scale(Vec3::splat(self.meter))
    }

    pub fn rotation(&self) -> Mat4 {
        match self.up_axis {
            UpAxis::X => Mat4::from_rotation_y(-FRAC_PI_2),
            UpAxis::Y => Mat4::from_rotation_x(FRAC_PI_2),
            UpAxis::Z => Mat4::IDENTITY,
        }
    }
}

/// Object arena
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    objects: Vec<Object>,
    /// Layers given to new objects
    pub layers: u32,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            objects: Vec::new(),
            layers: 1,
        }
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Add a new object with default data for its kind
    ///
    /// The object lands on the scene layers, is selected and tagged for a full
    /// recalc. Names are made unique with a `.001` style suffix.
    pub fn add_object(&mut self, kind: ObjectKind, name: &str) -> ObjectId {
        let name = self.unique_name(name);
        let mut object = Object::new(kind, name);
        object.layers = self.layers;
        object.selected = true;
        object.recalc = Recalc::all();

        let id = ObjectId(self.objects.len());
        self.objects.push(object);
        id
    }

    fn unique_name(&self, name: &str) -> String {
        if self.find_object(name).is_none() {
            return name.to_string();
        }
        (1..)
            .map(|n| format!("{name}.{n:03}"))
            .find(|candidate| self.find_object(candidate).is_none())
            .unwrap_or_else(|| name.to_string())
    }

    /// Get an object by id, panicking on ids from another scene
    pub fn object(&self, id: ObjectId) -> &Object {
        &self.objects[id.0]
    }

    pub fn object_mut(&mut self, id: ObjectId) -> &mut Object {
        &mut self.objects[id.0]
    }

    /// Checked lookup for ids coming from outside the scene
    pub fn get(&self, id: ObjectId) -> Result<&Object, RigError> {
        self.objects.get(id.0).ok_or(RigError::UnknownObject(id.0))
    }

    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &Object)> {
        self.objects.iter().enumerate().map(|(i, o)| (ObjectId(i), o))
    }

    pub fn find_object(&self, name: &str) -> Option<ObjectId> {
        self.objects.iter().position(|o| o.name == name).map(ObjectId)
    }

    pub fn is_marked(&self, id: ObjectId) -> bool {
        self.object(id).marked
    }

    pub fn set_mark(&mut self, id: ObjectId) {
        self.object_mut(id).marked = true;
    }

    pub fn remove_mark(&mut self, id: ObjectId) {
        self.object_mut(id).marked = false;
    }

    /// Walk the parent chain of `id`, excluding `id`
    ///
    /// Stops after as many steps as there are objects, so a corrupted parent
    /// loop cannot hang the walk.
    pub fn ancestors(&self, id: ObjectId) -> impl Iterator<Item = ObjectId> + '_ {
        std::iter::successors(self.object(id).parent, move |&current| {
            self.object(current).parent
        })
        .take(self.objects.len())
    }

    /// World matrix computed from the parent chain
    pub fn world_matrix(&self, id: ObjectId) -> Mat4 {
        let chain: Vec<ObjectId> = std::iter::once(id).chain(self.ancestors(id)).collect();
        chain.iter().rev().fold(Mat4::IDENTITY, |parent_world, &current| {
            let object = self.object(current);
            if object.parent.is_some() {
                parent_world * object.parent_inverse * object.local
            } else {
                object.local
            }
        })
    }

    /// Recompute and store the world matrix of one object
    pub fn update_world(&mut self, id: ObjectId) -> Mat4 {
        let world = self.world_matrix(id);
        self.object_mut(id).world = world;
        world
    }

    /// Highest ancestor reachable through marked parents, or `id` itself
    ///
    /// The walk stops at the first parent that does not satisfy `marked`.
    pub fn highest_selected_ancestor_or_self<F>(&self, id: ObjectId, marked: F) -> ObjectId
    where
        F: Fn(&Object) -> bool,
    {
        self.ancestors(id)
            .take_while(|&parent| marked(self.object(parent)))
            .last()
            .unwrap_or(id)
    }

    /// An object is a base node when no marked parent sits above it
    pub fn is_base_node<F>(&self, id: ObjectId, marked: F) -> bool
    where
        F: Fn(&Object) -> bool,
    {
        self.highest_selected_ancestor_or_self(id, marked) == id
    }

    /// Check whether `object` is `parent` or one of its ancestors
    pub fn test_parent_loop(&self, parent: ObjectId, object: ObjectId) -> bool {
        parent == object || self.ancestors(parent).any(|ancestor| ancestor == object)
    }

    /// Parent `child` to `parent`, keeping the child's world transform
    ///
    /// With `apply_parent_space` the child's current transform is taken as
    /// relative to the parent and moved into world space first. Both objects
    /// are tagged for recalc.
    pub fn set_parent(
        &mut self,
        child: ObjectId,
        parent: Option<ObjectId>,
        apply_parent_space: bool,
    ) -> Result<(), RigError> {
        let parent = parent.ok_or(RigError::MissingParent)?;
        self.get(child)?;
        self.get(parent)?;

        if self.test_parent_loop(parent, child) {
            return Err(RigError::ParentLoop {
                child: self.object(child).name.clone(),
                parent: self.object(parent).name.clone(),
            });
        }

        let parent_world = self.update_world(parent);
        let mut world = self.world_matrix(child);
        if apply_parent_space {
            world = parent_world * world;
        }

        let object = self.object_mut(child);
        object.parent = Some(parent);
        object.parent_type = ParentType::Object;
        object.local = world;
        object.parent_inverse = parent_world.inverse();
        object.world = world;
        object.recalc |= Recalc::OBJECT | Recalc::DATA;
        self.object_mut(parent).recalc |= Recalc::OBJECT;

        tracing::trace!(
            "Parented '{}' to '{}'",
            self.object(child).name,
            self.object(parent).name
        );
        Ok(())
    }

    /// Armature deforming an object, if any
    ///
    /// A skeleton parent of armature kind wins; otherwise the last armature
    /// modifier with a target is used.
    pub fn assigned_armature(&self, id: ObjectId) -> Option<ObjectId> {
        let object = self.object(id);
        if let Some(parent) = object.parent
            && object.parent_type == ParentType::Skeleton
            && self.object(parent).kind == ObjectKind::Armature
        {
            return Some(parent);
        }

        object
            .modifiers
            .iter()
            .filter_map(|m| match m.kind {
                ModifierKind::Armature { object } => object,
                _ => None,
            })
            .last()
    }

    /// Check if any object in the export set has `kind` and carries data
    pub fn has_object_type(&self, export_set: &[ObjectId], kind: ObjectKind) -> bool {
        export_set.iter().any(|&id| {
            let object = self.object(id);
            object.kind == kind && object.data.is_some()
        })
    }

    /// Sort an export set by object name
    pub fn sort_export_set_by_name(&self, export_set: &mut [ObjectId]) {
        export_set.sort_by(|&a, &b| self.object(a).name.cmp(&self.object(b).name));
    }

    /// Bring an object from file units and axes into scene space
    pub fn match_scale(&mut self, id: ObjectId, unit: &UnitConverter, scale_to_scene: bool) {
        let mut world = self.world_matrix(id);
        if scale_to_scene {
            world = unit.scale() * world;
        }
        world = unit.rotation() * world;

        let parent_space = match self.object(id).parent {
            Some(parent) => self.world_matrix(parent) * self.object(id).parent_inverse,
            None => Mat4::IDENTITY,
        };
        let object = self.object_mut(id);
        object.local = parent_space.inverse() * world;
        object.world = world;
    }

    /// [`Scene::match_scale`] on every parentless object of `objects`
    pub fn match_scale_roots(
        &mut self,
        objects: &[ObjectId],
        unit: &UnitConverter,
        scale_to_scene: bool,
    ) {
        for &id in objects {
            if self.object(id).parent.is_none() {
                self.match_scale(id, unit, scale_to_scene);
            }
        }
    }
}

/// Check if an object is part of the export set
pub fn is_in_export_set(export_set: &[ObjectId], id: ObjectId) -> bool {
    export_set.contains(&id)
}
