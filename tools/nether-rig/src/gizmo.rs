//! Gizmo group polling
//!
//! Gizmo groups that belong to a tool or to the last redo-able operator poll
//! themselves away once that tool or operator is no longer current. The unlink
//! is delayed: it is queued during the poll and carried out by the owner when
//! it flushes the registry, outside of any draw or event handling.

use hashbrown::HashMap;

/// A registered gizmo group type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GizmoGroupType {
    pub idname: String,
}

impl GizmoGroupType {
    pub fn new(idname: impl Into<String>) -> Self {
        Self {
            idname: idname.into(),
        }
    }
}

/// Runtime data of the active tool
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ToolRuntime {
    pub idname: String,
    /// Gizmo group shown while the tool is active (may be empty)
    pub gizmo_group: String,
}

/// What the polls read from the editor state
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    /// Idname of the last operator that can be redone
    pub last_redo_operator: Option<String>,
    pub active_tool: Option<ToolRuntime>,
}

/// Registered gizmo group types plus pending unlinks
#[derive(Debug, Default)]
pub struct GizmoGroupRegistry {
    groups: HashMap<String, GizmoGroupType>,
    unlink_queue: Vec<String>,
}

impl GizmoGroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, group: GizmoGroupType) {
        self.groups.insert(group.idname.clone(), group);
    }

    pub fn contains(&self, idname: &str) -> bool {
        self.groups.contains_key(idname)
    }

    /// Queue a group type for unlinking; repeated requests are merged
    pub fn unlink_delayed(&mut self, idname: &str) {
        if !self.unlink_queue.iter().any(|queued| queued == idname) {
            self.unlink_queue.push(idname.to_string());
        }
    }

    pub fn pending_unlinks(&self) -> &[String] {
        &self.unlink_queue
    }

    /// Remove every queued group type, returning the idnames that were unlinked
    pub fn flush_unlinks(&mut self) -> Vec<String> {
        let queued = std::mem::take(&mut self.unlink_queue);
        queued
            .into_iter()
            .filter(|idname| self.groups.remove(idname).is_some())
            .inspect(|idname| tracing::debug!("Unlinked gizmo group '{}'", idname))
            .collect()
    }
}

/// Keep a gizmo group only while `idname` is the last redo operator
///
/// Usable as the poll function of operator-bound gizmo groups.
pub fn poll_or_unlink_delayed_from_operator(
    ctx: &ToolContext,
    registry: &mut GizmoGroupRegistry,
    group: &GizmoGroupType,
    idname: &str,
) -> bool {
    if ctx.last_redo_operator.as_deref() != Some(idname) {
        registry.unlink_delayed(&group.idname);
        return false;
    }
    true
}

/// Keep a gizmo group only while the active tool shows it
pub fn poll_or_unlink_delayed_from_tool(
    ctx: &ToolContext,
    registry: &mut GizmoGroupRegistry,
    group: &GizmoGroupType,
) -> bool {
    let shown = ctx
        .active_tool
        .as_ref()
        .is_some_and(|tool| tool.gizmo_group == group.idname);
    if !shown {
        registry.unlink_delayed(&group.idname);
        return false;
    }
    true
}
