//! nether-rig library
//!
//! Helpers used while moving rigged scenes in and out of interchange files:
//! bone layer bitfields, bone hierarchy classification and fix-ups, object
//! parenting, mesh preparation for export and gizmo group polling.

pub mod armature;
pub mod config;
pub mod error;
pub mod export;
pub mod extension;
pub mod gizmo;
pub mod layers;
pub mod manifest;
pub mod mesh;
pub mod names;
pub mod registry;
pub mod scene;
pub mod session;

pub use error::RigError;

// Re-export the layer codec
pub use layers::{
    LayerLabels, decode_layers, effective_layers, enable_layer, encode_layers, set_layer,
};

// Re-export bone hierarchy types
pub use armature::{Armature, Bone, BoneFlags, BoneId, is_leaf_bone, is_root_bone};
pub use extension::BoneExtended;
pub use registry::{BoneExtensionManager, BoneExtensionMap};
pub use session::ImportSession;

// Re-export scene, mesh and export helpers
pub use export::{export_bones, export_mesh, export_roots, export_set};
pub use mesh::{Mesh, MeshType, mesh_copy, triangulate};
pub use scene::{Object, ObjectId, ObjectKind, Scene, UnitConverter, is_in_export_set};
