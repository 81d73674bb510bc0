//! Bone extension registry
//!
//! Holds one [`BoneExtended`] per bone, grouped by armature, for the duration
//! of an import. Everything is owned by value and released when the manager
//! is dropped (or cleared).

use hashbrown::HashMap;

use crate::armature::{Armature, is_leaf_bone};
use crate::extension::BoneExtended;

/// Extension records of one armature, keyed by bone name
pub type BoneExtensionMap = HashMap<String, BoneExtended>;

/// Owner of all extension records of an import
#[derive(Debug, Default)]
pub struct BoneExtensionManager {
    extended_bone_maps: HashMap<String, BoneExtensionMap>,
}

impl BoneExtensionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the extension map of an armature, creating it on first access
    pub fn extension_map(&mut self, armature_id: &str) -> &mut BoneExtensionMap {
        self.extended_bone_maps
            .entry_ref(armature_id)
            .or_default()
    }

    /// Look up an extension map without creating it
    pub fn get_extension_map(&self, armature_id: &str) -> Option<&BoneExtensionMap> {
        self.extended_bone_maps.get(armature_id)
    }

    /// Get the record of one bone, creating it (and its map) on first access
    pub fn extended_bone(&mut self, armature_id: &str, bone_name: &str) -> &mut BoneExtended {
        self.extension_map(armature_id)
            .entry_ref(bone_name)
            .or_insert_with(|| BoneExtended::new(bone_name))
    }

    /// Number of armatures with an extension map
    pub fn armature_count(&self) -> usize {
        self.extended_bone_maps.len()
    }

    /// Total number of extension records over all armatures
    pub fn record_count(&self) -> usize {
        self.extended_bone_maps.values().map(|m| m.len()).sum()
    }

    /// Store leaf status and chain length for every bone of `armature`
    ///
    /// Records are created for bones that have none yet. Values read from the
    /// file (tail, roll, layers) are left alone.
    pub fn fix_leaf_bones(&mut self, armature: &Armature) {
        let chain_lengths = armature.chain_lengths();
        let map = self.extension_map(armature.name());

        let mut leaves = 0usize;
        for (id, bone) in armature.bones() {
            let leaf = is_leaf_bone(armature, id);
            let ext = map
                .entry_ref(bone.name.as_str())
                .or_insert_with(|| BoneExtended::new(&bone.name));
            ext.set_leaf_bone(leaf);
            ext.set_chain_length(chain_lengths[id.index()]);
            leaves += usize::from(leaf);
        }

        tracing::debug!(
            "Fixed up armature '{}': {} bones, {} leaves",
            armature.name(),
            armature.len(),
            leaves
        );
    }

    /// Release all maps and records
    pub fn clear(&mut self) {
        let released = self.record_count();
        self.extended_bone_maps.clear();
        if released > 0 {
            tracing::debug!("Released {} bone extension records", released);
        }
    }
}

impl Drop for BoneExtensionManager {
    fn drop(&mut self) {
        self.clear();
    }
}
