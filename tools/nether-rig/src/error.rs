//! Error types for rig and scene helpers

/// Errors raised by the rig, scene and mesh helpers
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RigError {
    /// `set_parent` was called without a parent object
    #[error("cannot parent to a missing object")]
    MissingParent,

    /// Parenting would make an object its own ancestor
    #[error("parenting '{child}' to '{parent}' would create a parent loop")]
    ParentLoop { child: String, parent: String },

    /// Layer index outside the 32-bit field
    #[error("layer index {0} is out of range (must be 0-31)")]
    LayerOutOfRange(u32),

    /// Bone name not present in the armature
    #[error("bone '{0}' not found")]
    UnknownBone(String),

    /// Two bones with the same name in one armature
    #[error("bone '{0}' is defined more than once")]
    DuplicateBone(String),

    /// Object has no mesh data to copy
    #[error("object '{0}' has no mesh data")]
    NotAMesh(String),

    /// Object id does not belong to the scene
    #[error("object id {0} is not part of this scene")]
    UnknownObject(usize),
}
