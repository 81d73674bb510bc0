//! Import session state
//!
//! Everything that must live exactly as long as one import: the layer label
//! table and the bone extension records. Build one per import and drop it at
//! the end.

use crate::armature::{Armature, BoneFlags, BoneId, is_root_bone};
use crate::config::ImportSettings;
use crate::error::RigError;
use crate::extension::BoneExtended;
use crate::layers::LayerLabels;
use crate::registry::BoneExtensionManager;
use crate::scene::{ObjectId, Scene, UnitConverter};

/// State shared by all armatures of one import
#[derive(Debug, Default)]
pub struct ImportSession {
    pub settings: ImportSettings,
    pub layer_labels: LayerLabels,
    pub extensions: BoneExtensionManager,
}

impl ImportSession {
    pub fn new(settings: ImportSettings) -> Self {
        Self {
            settings,
            layer_labels: LayerLabels::new(),
            extensions: BoneExtensionManager::new(),
        }
    }

    /// Record the layer string read for a bone
    pub fn set_bone_layers(&mut self, armature_id: &str, bone_name: &str, layer_string: &str) {
        let Self {
            layer_labels,
            extensions,
            ..
        } = self;
        extensions
            .extended_bone(armature_id, bone_name)
            .set_bone_layers(layer_string, layer_labels);
    }

    /// Root classification under the `deform_bones_only` import setting
    pub fn is_root_bone(&self, armature: &Armature, bone: BoneId) -> bool {
        is_root_bone(armature, bone, self.settings.deform_bones_only)
    }

    /// Parent an imported object, reading its transform in parent space when
    /// the `parent_space` setting is on
    pub fn link_parent(
        &self,
        scene: &mut Scene,
        child: ObjectId,
        parent: ObjectId,
    ) -> Result<(), RigError> {
        scene.set_parent(child, Some(parent), self.settings.parent_space)
    }

    /// Bring the imported root objects into scene axes, rescaling them to
    /// meters when the `import_units` setting is on
    pub fn apply_units(&self, scene: &mut Scene, objects: &[ObjectId], unit: &UnitConverter) {
        scene.match_scale_roots(objects, unit, self.settings.import_units);
    }

    /// Write the collected records onto the armature and run the fix-ups
    ///
    /// Custom tails, rolls, connect states and the effective layer field go
    /// onto the bones. Leaf detection and chain lengths then run on the
    /// updated hierarchy and are stored in the extension records.
    pub fn finish_armature(&mut self, armature: &mut Armature) {
        let map = self.extensions.extension_map(armature.name());
        let ids: Vec<_> = armature.bones().map(|(id, _)| id).collect();
        for id in ids {
            let bone = armature.bone_mut(id);
            let ext = map
                .entry_ref(bone.name.as_str())
                .or_insert_with(|| BoneExtended::new(&bone.name));

            if ext.has_tail() {
                bone.tail = ext.tail();
            }
            if ext.has_roll() {
                bone.roll = ext.roll();
            }
            if let Some(connect) = ext.use_connect() {
                bone.flags
                    .set(BoneFlags::CONNECTED, connect && bone.parent.is_some());
            }
            bone.layers = ext.bone_layers();
        }

        self.extensions.fix_leaf_bones(armature);

        tracing::info!(
            "Imported armature '{}' ({} bones, {} layer labels)",
            armature.name(),
            armature.len(),
            self.layer_labels.len()
        );
    }
}
