//! Import/export settings (rig.toml)
//!
//! Settings are stored in TOML with an `[import]` and an `[export]` section.
//! Missing sections and fields fall back to their defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::mesh::MeshType;

/// All settings of a rig conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Import settings
    #[serde(default)]
    pub import: ImportSettings,
    /// Export settings
    #[serde(default)]
    pub export: ExportSettings,
}

/// Settings applied while importing armatures and objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportSettings {
    /// Treat the top-most deforming bones as roots (default: false)
    #[serde(default)]
    pub deform_bones_only: bool,
    /// Rescale imported roots so one file unit keeps its size in the scene (default: true)
    #[serde(default = "default_true")]
    pub import_units: bool,
    /// Child transforms in the file are relative to their parent (default: true)
    #[serde(default = "default_true")]
    pub parent_space: bool,
}

/// Settings applied while exporting objects and meshes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSettings {
    /// Only export bones that deform meshes (default: false)
    #[serde(default)]
    pub deform_bones_only: bool,
    /// Only export marked objects (default: true)
    #[serde(default = "default_true")]
    pub selected_only: bool,
    /// Evaluate modifiers before export (default: false)
    #[serde(default)]
    pub apply_modifiers: bool,
    /// Which modifier visibility to evaluate (default: view)
    #[serde(default)]
    pub mesh_type: MeshType,
    /// Split quads and n-gons into triangles (default: true)
    #[serde(default = "default_true")]
    pub triangulate: bool,
    /// Write objects sorted by name (default: false)
    #[serde(default)]
    pub sort_by_name: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            deform_bones_only: false,
            import_units: default_true(),
            parent_space: default_true(),
        }
    }
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            deform_bones_only: false,
            selected_only: default_true(),
            apply_modifiers: false,
            mesh_type: MeshType::default(),
            triangulate: default_true(),
            sort_by_name: false,
        }
    }
}

/// Load settings from a TOML file
pub fn load_settings(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings: {:?}", path))?;
    let settings: Settings = toml::from_str(&content)
        .with_context(|| format!("Failed to parse settings: {:?}", path))?;
    Ok(settings)
}

/// Write settings to a TOML file
pub fn save_settings(settings: &Settings, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(settings).context("Failed to serialize settings")?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write settings: {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.import.import_units);
        assert!(settings.export.triangulate);
        assert_eq!(settings.export.mesh_type, MeshType::View);
    }

    #[test]
    fn test_partial_sections() {
        let settings: Settings = toml::from_str(
            r#"
            [import]
            deform_bones_only = true

            [export]
            mesh_type = "render"
            apply_modifiers = true
            "#,
        )
        .unwrap();

        assert!(settings.import.deform_bones_only);
        assert!(settings.import.parent_space);
        assert_eq!(settings.export.mesh_type, MeshType::Render);
        assert!(settings.export.apply_modifiers);
        assert!(settings.export.selected_only);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rig.toml");

        let mut settings = Settings::default();
        settings.export.sort_by_name = true;
        settings.import.import_units = false;
        save_settings(&settings, &path).unwrap();

        assert_eq!(load_settings(&path).unwrap(), settings);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_settings(&dir.path().join("missing.toml")).is_err());
    }
}
