//! Rig description parsing
//!
//! A rig file describes one armature in TOML:
//!
//! ```toml
//! name = "Armature"
//!
//! [[bones]]
//! name = "hips"
//! layers = "0 body"
//!
//! [[bones]]
//! name = "spine"
//! parent = "hips"
//! connected = true
//! tail = [0.0, 0.0, 1.5]
//! ```
//!
//! Parents must be listed before their children.

use anyhow::{Context, Result};
use glam::Vec3;
use serde::Deserialize;
use std::path::Path;

use crate::armature::{Armature, BoneFlags};
use crate::error::RigError;
use crate::session::ImportSession;

/// Root rig structure
#[derive(Debug, Clone, Deserialize)]
pub struct RigManifest {
    pub name: String,
    #[serde(default)]
    pub bones: Vec<BoneEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoneEntry {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default = "default_deform")]
    pub deform: bool,
    #[serde(default)]
    pub connected: bool,
    #[serde(default)]
    pub head: Option<[f32; 3]>,
    #[serde(default)]
    pub tail: Option<[f32; 3]>,
    #[serde(default)]
    pub roll: Option<f32>,
    /// Layer numbers and/or labels, whitespace separated
    #[serde(default)]
    pub layers: Option<String>,
}

fn default_deform() -> bool {
    true
}

impl BoneEntry {
    fn flags(&self) -> BoneFlags {
        let mut flags = BoneFlags::empty();
        flags.set(BoneFlags::NO_DEFORM, !self.deform);
        flags.set(BoneFlags::CONNECTED, self.connected && self.parent.is_some());
        flags
    }
}

impl RigManifest {
    /// Build the armature, feeding file-only attributes through the session
    pub fn build(&self, session: &mut ImportSession) -> Result<Armature, RigError> {
        let mut armature = Armature::new(self.name.as_str());

        for entry in &self.bones {
            let parent = match &entry.parent {
                Some(name) => Some(
                    armature
                        .find_bone(name)
                        .ok_or_else(|| RigError::UnknownBone(name.clone()))?,
                ),
                None => None,
            };
            let id = armature.add_bone(entry.name.as_str(), parent, entry.flags())?;

            if let Some(head) = entry.head {
                armature.bone_mut(id).head = Vec3::from_array(head);
            }

            let ext = session.extensions.extended_bone(&self.name, &entry.name);
            if let Some(tail) = entry.tail {
                ext.set_tail(Vec3::from_array(tail));
            }
            if let Some(roll) = entry.roll {
                ext.set_roll(roll);
            }
            if let Some(layers) = &entry.layers {
                session.set_bone_layers(&self.name, &entry.name, layers);
            }
        }

        session.finish_armature(&mut armature);
        Ok(armature)
    }
}

/// Parse a rig description from TOML text
pub fn parse_manifest(content: &str) -> Result<RigManifest> {
    let manifest: RigManifest = toml::from_str(content).context("Failed to parse rig")?;
    Ok(manifest)
}

/// Load and parse a rig file
pub fn load_manifest(path: &Path) -> Result<RigManifest> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read rig: {:?}", path))?;
    parse_manifest(&content).with_context(|| format!("Invalid rig file: {:?}", path))
}

/// Validate a rig description without keeping the result
pub fn validate(manifest: &RigManifest) -> Result<()> {
    let mut session = ImportSession::default();
    let armature = manifest
        .build(&mut session)
        .with_context(|| format!("Rig '{}' is invalid", manifest.name))?;

    if armature.is_empty() {
        tracing::warn!("Rig '{}' has no bones", manifest.name);
    }
    Ok(())
}
