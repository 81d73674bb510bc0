//! Export selection
//!
//! Applies the `[export]` settings: which objects are written and in what
//! order, which bones go out, and how meshes are prepared.

use crate::armature::{Armature, BoneId};
use crate::config::ExportSettings;
use crate::error::RigError;
use crate::mesh::{Mesh, mesh_copy};
use crate::scene::{ObjectId, Scene};

/// Objects to export
///
/// With `selected_only` only selected objects are kept. With `sort_by_name`
/// the set is ordered by object name, otherwise scene order is kept.
pub fn export_set(scene: &Scene, settings: &ExportSettings) -> Vec<ObjectId> {
    let mut set: Vec<ObjectId> = scene
        .objects()
        .filter(|(_, object)| !settings.selected_only || object.selected)
        .map(|(id, _)| id)
        .collect();

    if settings.sort_by_name {
        scene.sort_export_set_by_name(&mut set);
    }

    tracing::debug!("Export set: {} of {} objects", set.len(), scene.len());
    set
}

/// Mesh of an exported object, prepared per the export settings
pub fn export_mesh(
    scene: &Scene,
    id: ObjectId,
    settings: &ExportSettings,
) -> Result<Mesh, RigError> {
    mesh_copy(
        scene.get(id)?,
        settings.mesh_type,
        settings.apply_modifiers,
        settings.triangulate,
    )
}

/// Bones to write, in armature order
pub fn export_bones(armature: &Armature, settings: &ExportSettings) -> Vec<BoneId> {
    armature
        .bones()
        .filter(|(_, bone)| !settings.deform_bones_only || bone.is_deform())
        .map(|(id, _)| id)
        .collect()
}

/// Bones that start a hierarchy in the exported skeleton
pub fn export_roots(armature: &Armature, settings: &ExportSettings) -> Vec<BoneId> {
    armature.roots(settings.deform_bones_only)
}
