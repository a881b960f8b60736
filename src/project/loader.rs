//! Loading a project directory into a [`SourceSet`] and writing edits back.
//!
//! A project directory holds a `navmacro.yaml` descriptor plus source files.
//! The descriptor carries the manifest, the layouts, the theme flag and an
//! optional `engine:` configuration section:
//!
//! ```yaml
//! manifest:
//!   package: com.example
//!   activities:
//!     - name: .Main
//!       intent-filters:
//!         - actions: [android.intent.action.MAIN]
//!           categories: [android.intent.category.LAUNCHER]
//! layouts:
//!   main:
//!     tag: LinearLayout
//!     children:
//!       - tag: Button
//!         attributes: { "android:id": "@+id/go" }
//! ```

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use walkdir::WalkDir;

use super::{Manifest, ProjectHost, SourceSet, ViewElement};
use crate::{config::EngineConfig, nav_err, NavError};

pub const DESCRIPTOR_FILE: &str = "navmacro.yaml";
pub const SOURCE_EXTENSION: &str = "java";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ProjectDescriptor {
    #[serde(default)]
    pub manifest: Manifest,
    #[serde(default)]
    pub layouts: BTreeMap<String, ViewElement>,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub engine: EngineConfig,
    /// Source roots relative to the project directory.
    #[serde(default = "default_sources")]
    pub sources: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Theme {
    #[serde(default = "default_true")]
    pub window_action_bar: bool,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            window_action_bar: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_sources() -> Vec<PathBuf> {
    vec![PathBuf::from("src")]
}

#[derive(Debug, Clone)]
pub struct LoadedProject {
    pub root: PathBuf,
    pub sources: SourceSet,
    pub config: EngineConfig,
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Reads and parses `navmacro.yaml` only.
pub fn read_descriptor(dir: &Path) -> Result<ProjectDescriptor, NavError> {
    let descriptor_path = dir.join(DESCRIPTOR_FILE);
    let text = fs::read_to_string(&descriptor_path).map_err(|e| NavError::io(&descriptor_path, e))?;
    serde_yaml::from_str(&text).map_err(|e| {
        NavError::config(
            format!("invalid project descriptor {}", descriptor_path.display()),
            Some(e),
        )
    })
}

/// Reads the descriptor and every source file under the declared roots.
pub fn load_project(dir: &Path) -> Result<LoadedProject, NavError> {
    let descriptor = read_descriptor(dir)?;

    let mut sources = SourceSet::new(descriptor.manifest);
    sources.set_window_action_bar(descriptor.theme.window_action_bar);
    for (name, layout) in descriptor.layouts {
        sources.add_layout(name, layout);
    }

    for root in &descriptor.sources {
        let root = dir.join(root);
        if !root.is_dir() {
            return Err(nav_err!(
                Project,
                "source root {} is not a directory",
                root.display()
            ));
        }
        for entry in WalkDir::new(&root).sort_by_file_name() {
            let entry = entry.map_err(|e| nav_err!(Project, "cannot walk {}: {}", root.display(), e))?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(SOURCE_EXTENSION)
            {
                continue;
            }
            let text = fs::read_to_string(path).map_err(|e| NavError::io(path, e))?;
            let relative = relative_path(dir, path);
            debug!(path = %relative, "parsing source");
            sources.add_source(relative, &text)?;
        }
    }

    info!(
        dir = %dir.display(),
        files = sources.files().count(),
        classes = sources.class_names().count(),
        "project loaded"
    );
    Ok(LoadedProject {
        root: dir.to_path_buf(),
        sources,
        config: descriptor.engine,
    })
}

/// Writes every edited file back under the project root. Returns the
/// written paths.
pub fn save_project(project: &LoadedProject) -> Result<Vec<PathBuf>, NavError> {
    let mut written = Vec::new();
    for relative in project.sources.edited_files() {
        let Some(text) = project.sources.file_text(relative) else {
            continue;
        };
        let path = project.root.join(relative);
        fs::write(&path, text).map_err(|e| NavError::io(&path, e))?;
        info!(path = %path.display(), "wrote source");
        written.push(path);
    }
    Ok(written)
}

// ============================================================================
// INTERNAL HELPERS
// ============================================================================

/// Project-relative path with `/` separators, used as the file key.
fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::ProjectIndex;

    #[test]
    fn descriptor_defaults() {
        let descriptor: ProjectDescriptor = serde_yaml::from_str("manifest: {package: a.b}\n").unwrap();
        assert!(descriptor.theme.window_action_bar);
        assert_eq!(descriptor.sources, vec![PathBuf::from("src")]);
        assert_eq!(descriptor.engine, EngineConfig::default());
    }

    #[test]
    fn loads_sources_and_layouts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(DESCRIPTOR_FILE),
            "manifest:\n  package: com.example\nlayouts:\n  main:\n    tag: LinearLayout\ntheme:\n  window-action-bar: false\n",
        )
        .unwrap();
        let src = dir.path().join("src/com/example");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("Main.java"), "package com.example; class Main {}").unwrap();
        fs::write(src.join("notes.txt"), "ignored").unwrap();

        let project = load_project(dir.path()).unwrap();
        assert!(project.sources.find_class("com.example.Main").is_some());
        assert!(project.sources.file("src/com/example/Main.java").is_some());
        assert!(project.sources.layout("main").is_some());
        assert!(!project.sources.window_action_bar());
    }

    #[test]
    fn missing_descriptor_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_project(dir.path()).unwrap_err();
        assert!(matches!(err, NavError::Io { .. }));
    }
}
