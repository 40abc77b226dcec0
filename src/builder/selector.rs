use std::path::{Path, PathBuf};

use anyhow::Result;
use globset::GlobSet;

use crate::config::BuilderConfig;
use crate::shared::glob::{build_folder_globset, build_globset};

/// Decides which parts of a project a build pass looks at.
///
/// All three predicates must be free of side effects.
pub trait SelectionPolicy: Send + Sync {
    /// Whether the project should be checked at all
    fn is_project_eligible(&self) -> bool;

    fn allow_visit_folder(&self, folder: &Path) -> bool;

    fn allow_visit_file(&self, file: &Path) -> bool;
}

/// Glob-based selection from [`BuilderConfig`]
#[derive(Debug, Clone)]
pub struct ResourceSelector {
    root: PathBuf,
    enabled: bool,
    include: GlobSet,
    exclude: GlobSet,
    exclude_folders: GlobSet,
}

impl ResourceSelector {
    pub fn new(root: &Path, config: &BuilderConfig) -> Result<Self> {
        Ok(Self {
            root: root.to_path_buf(),
            enabled: config.enabled,
            include: build_globset(&config.include)?,
            exclude: build_globset(&config.exclude)?,
            exclude_folders: build_folder_globset(&config.exclude_folders)?,
        })
    }

    fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }
}

impl SelectionPolicy for ResourceSelector {
    fn is_project_eligible(&self) -> bool {
        self.enabled && self.root.is_dir()
    }

    fn allow_visit_folder(&self, folder: &Path) -> bool {
        let relative = self.relative(folder);
        if relative.as_os_str().is_empty() {
            return true;
        }

        // Folder patterns match either the folder name or its project path
        let by_name = relative
            .file_name()
            .is_some_and(|name| self.exclude_folders.is_match(name));
        !by_name && !self.exclude_folders.is_match(relative)
    }

    fn allow_visit_file(&self, file: &Path) -> bool {
        let relative = self.relative(file);
        self.include.is_match(relative) && !self.exclude.is_match(relative)
    }
}
