//! Per-bone import state
//!
//! [`BoneExtended`] carries what the interchange file says about a bone that
//! the armature itself has no room for: the tail and roll written by the
//! exporter, whether the bone should be connected, its layer labels, and the
//! results of the leaf/chain fix-up passes.

use glam::Vec3;

use crate::layers::{self, LayerLabels};

/// Maximum bone name length in bytes
pub const MAX_BONE_NAME: usize = 63;

/// Tail used until the file provides one
pub const DEFAULT_TAIL: Vec3 = Vec3::new(0.0, 0.5, 0.0);

/// Import-time attributes of one bone
#[derive(Debug, Clone, PartialEq)]
pub struct BoneExtended {
    name: String,
    chain_length: usize,
    is_leaf: bool,
    tail: Vec3,
    has_custom_tail: bool,
    roll: f32,
    has_custom_roll: bool,
    use_connect: Option<bool>,
    bone_layers: u32,
}

impl BoneExtended {
    pub fn new(name: &str) -> Self {
        Self {
            name: truncate_name(name).to_string(),
            chain_length: 0,
            is_leaf: false,
            tail: DEFAULT_TAIL,
            has_custom_tail: false,
            roll: 0.0,
            has_custom_roll: false,
            use_connect: None,
            bone_layers: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = truncate_name(name).to_string();
    }

    pub fn chain_length(&self) -> usize {
        self.chain_length
    }

    pub fn set_chain_length(&mut self, length: usize) {
        self.chain_length = length;
    }

    pub fn is_leaf_bone(&self) -> bool {
        self.is_leaf
    }

    pub fn set_leaf_bone(&mut self, state: bool) {
        self.is_leaf = state;
    }

    pub fn tail(&self) -> Vec3 {
        self.tail
    }

    /// Set the tail from the file; the record reports a custom tail from now on
    pub fn set_tail(&mut self, tail: Vec3) {
        self.tail = tail;
        self.has_custom_tail = true;
    }

    pub fn has_tail(&self) -> bool {
        self.has_custom_tail
    }

    pub fn roll(&self) -> f32 {
        self.roll
    }

    /// Set the roll from the file; the record reports a custom roll from now on
    pub fn set_roll(&mut self, roll: f32) {
        self.roll = roll;
        self.has_custom_roll = true;
    }

    pub fn has_roll(&self) -> bool {
        self.has_custom_roll
    }

    /// `None` while the file did not say whether the bone is connected
    pub fn use_connect(&self) -> Option<bool> {
        self.use_connect
    }

    pub fn set_use_connect(&mut self, use_connect: Option<bool>) {
        self.use_connect = use_connect;
    }

    /// Add the layers named in `layer_string` to this bone
    pub fn set_bone_layers(&mut self, layer_string: &str, labels: &mut LayerLabels) {
        self.bone_layers |= layers::decode_layers(layer_string, labels);
    }

    /// Layer bitfield, never empty (see [`layers::effective_layers`])
    pub fn bone_layers(&self) -> u32 {
        layers::effective_layers(self.bone_layers)
    }

    /// Layer bitfield exactly as collected from the file
    pub fn raw_bone_layers(&self) -> u32 {
        self.bone_layers
    }

    /// Layers as a space separated index list
    pub fn encode_bone_layers(&self) -> String {
        layers::encode_layers(self.bone_layers())
    }
}

fn truncate_name(name: &str) -> &str {
    if name.len() <= MAX_BONE_NAME {
        return name;
    }
    let mut end = MAX_BONE_NAME;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let ext = BoneExtended::new("hand.L");
        assert_eq!(ext.name(), "hand.L");
        assert_eq!(ext.chain_length(), 0);
        assert!(!ext.is_leaf_bone());
        assert_eq!(ext.tail(), Vec3::new(0.0, 0.5, 0.0));
        assert!(!ext.has_tail());
        assert_eq!(ext.roll(), 0.0);
        assert!(!ext.has_roll());
        assert_eq!(ext.use_connect(), None);
        assert_eq!(ext.raw_bone_layers(), 0);
        assert_eq!(ext.bone_layers(), 1);
        assert_eq!(ext.encode_bone_layers(), "0");
    }

    #[test]
    fn test_custom_tail_and_roll_stick() {
        let mut ext = BoneExtended::new("forearm");
        ext.set_tail(DEFAULT_TAIL);
        assert!(ext.has_tail());
        ext.set_roll(0.0);
        assert!(ext.has_roll());

        ext.set_roll(1.5);
        ext.set_tail(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(ext.roll(), 1.5);
        assert_eq!(ext.tail(), Vec3::new(1.0, 2.0, 3.0));
        assert!(ext.has_tail() && ext.has_roll());
    }

    #[test]
    fn test_bone_layers_accumulate() {
        let mut labels = LayerLabels::new();
        let mut ext = BoneExtended::new("spine");
        ext.set_bone_layers("2", &mut labels);
        ext.set_bone_layers("deform 4", &mut labels);

        assert_eq!(ext.bone_layers(), 0b10101);
        assert_eq!(ext.encode_bone_layers(), "0 2 4");
        assert_eq!(labels.labels(), ["deform"]);
    }

    #[test]
    fn test_long_names_are_truncated() {
        let long = "x".repeat(80);
        assert_eq!(BoneExtended::new(&long).name().len(), MAX_BONE_NAME);

        // Multi-byte characters are never split
        let wide = "é".repeat(40);
        let ext = BoneExtended::new(&wide);
        assert_eq!(ext.name().len(), 62);
        assert!(ext.name().chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_use_connect_tristate() {
        let mut ext = BoneExtended::new("thigh");
        ext.set_use_connect(Some(false));
        assert_eq!(ext.use_connect(), Some(false));
        ext.set_use_connect(Some(true));
        assert_eq!(ext.use_connect(), Some(true));
        ext.set_use_connect(None);
        assert_eq!(ext.use_connect(), None);
    }
}
