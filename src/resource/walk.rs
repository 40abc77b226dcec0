//! Traversal protocol: walkers call a visitor once per node, top-down
//!
//! The visitor decides whether the walker descends into a node's children.
//! Walking is always sequential on the calling thread.

use std::ffi::OsStr;
use std::path::{Component, Path};
use std::sync::Arc;

use tracing::warn;
use walkdir::WalkDir;

use super::{FsResource, Resource, ResourceRef};

/// Callback invoked by a walker for each node
pub trait ResourceVisitor {
    type Error;

    /// Visit one node and return whether to descend into its children
    fn visit(&mut self, resource: &ResourceRef) -> Result<bool, Self::Error>;

    /// Visit one node of a delta; by default this visits the changed resource
    fn visit_delta(&mut self, delta: &ResourceDelta) -> Result<bool, Self::Error> {
        self.visit(delta.resource())
    }
}

/// Walk the directory tree rooted at `root` in file-name order.
///
/// Entries that cannot be read are logged and skipped.
pub fn walk_tree<V: ResourceVisitor>(
    root: &Path,
    charset: &str,
    visitor: &mut V,
) -> Result<(), V::Error> {
    let mut entries = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = entries.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Walk error: {}", e);
                continue;
            }
        };

        // Links are not followed, but a link to a folder is still a folder
        let is_dir =
            entry.file_type().is_dir() || (entry.path_is_symlink() && entry.path().is_dir());
        let resource: ResourceRef = if is_dir {
            Arc::new(FsResource::folder(entry.path()))
        } else {
            Arc::new(FsResource::file(entry.path(), charset))
        };

        let descend = visitor.visit(&resource)?;
        if is_dir && !descend {
            entries.skip_current_dir();
        }
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaKind {
    Added,
    Changed,
    Removed,
}

/// A tree of changes since the previous build
#[derive(Debug, Clone)]
pub struct ResourceDelta {
    resource: ResourceRef,
    kind: DeltaKind,
    children: Vec<ResourceDelta>,
}

impl ResourceDelta {
    pub fn new(resource: ResourceRef, kind: DeltaKind) -> Self {
        Self {
            resource,
            kind,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: ResourceDelta) -> Self {
        self.children.push(child);
        self
    }

    pub fn resource(&self) -> &ResourceRef {
        &self.resource
    }

    pub fn kind(&self) -> DeltaKind {
        self.kind
    }

    pub fn children(&self) -> &[ResourceDelta] {
        &self.children
    }

    /// Build a delta rooted at `root` from a list of changed file paths.
    ///
    /// Relative paths are taken relative to `root` and `..` is resolved
    /// lexically. Files and folders that no longer exist become `Removed`
    /// entries; paths that end up outside `root` are ignored.
    pub fn from_changed_paths<P: AsRef<Path>>(root: &Path, paths: &[P], charset: &str) -> Self {
        let mut tree = ResourceDelta::new(Arc::new(FsResource::folder(root)), DeltaKind::Changed);

        for path in paths {
            let path = path.as_ref();
            let relative = if path.is_absolute() {
                match path.strip_prefix(root) {
                    Ok(relative) => relative,
                    Err(_) => {
                        warn!("Ignoring change outside project: {}", path.display());
                        continue;
                    }
                }
            } else {
                path
            };

            match normalized_names(relative) {
                Some(names) => tree.insert(root, &names, charset),
                None => warn!("Ignoring change outside project: {}", path.display()),
            }
        }

        tree
    }

    fn insert(&mut self, parent: &Path, names: &[&OsStr], charset: &str) {
        let Some((name, rest)) = names.split_first() else {
            return;
        };
        let path = parent.join(name);

        let index = match self
            .children
            .iter()
            .position(|child| child.resource.path() == path)
        {
            Some(index) => index,
            None => {
                let child = if rest.is_empty() {
                    let resource = FsResource::from_path(&path, charset);
                    let kind = if resource.exists() {
                        DeltaKind::Changed
                    } else {
                        DeltaKind::Removed
                    };
                    ResourceDelta::new(Arc::new(resource), kind)
                } else {
                    let kind = if path.is_dir() {
                        DeltaKind::Changed
                    } else {
                        DeltaKind::Removed
                    };
                    ResourceDelta::new(Arc::new(FsResource::folder(&path)), kind)
                };
                self.children.push(child);
                self.children.len() - 1
            }
        };

        self.children[index].insert(&path, rest, charset);
    }
}

/// Path components of `relative` with `.` and `..` resolved lexically.
///
/// Returns `None` when the path climbs above its starting point.
fn normalized_names(relative: &Path) -> Option<Vec<&OsStr>> {
    let mut names = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(name) => names.push(name),
            Component::ParentDir => {
                names.pop()?;
            }
            Component::CurDir => {}
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(names)
}

/// Walk a delta tree, descending into a node's children only when the
/// visitor asks for it.
pub fn walk_delta<V: ResourceVisitor>(delta: &ResourceDelta, visitor: &mut V) -> Result<(), V::Error> {
    if visitor.visit_delta(delta)? {
        for child in &delta.children {
            walk_delta(child, visitor)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{MemoryResource, ResourceKind};
    use std::convert::Infallible;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Records visited paths and refuses to descend into folders named `skip`
    #[derive(Default)]
    struct Recorder {
        visited: Vec<PathBuf>,
    }

    impl ResourceVisitor for Recorder {
        type Error = Infallible;

        fn visit(&mut self, resource: &ResourceRef) -> Result<bool, Infallible> {
            self.visited.push(resource.path().to_path_buf());
            Ok(resource.path().file_name() != Some(OsStr::new("skip")))
        }
    }

    #[test]
    fn test_walk_tree_honours_descend() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("skip")).unwrap();
        fs::write(root.join("src/a.js"), "").unwrap();
        fs::write(root.join("skip/hidden.js"), "").unwrap();
        fs::write(root.join("b.js"), "").unwrap();

        let mut recorder = Recorder::default();
        walk_tree(root, "utf-8", &mut recorder).unwrap();

        assert_eq!(
            recorder.visited,
            vec![
                root.to_path_buf(),
                root.join("b.js"),
                root.join("skip"),
                root.join("src"),
                root.join("src/a.js"),
            ]
        );
    }

    #[test]
    fn test_from_changed_paths_builds_tree() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("src/lib")).unwrap();
        fs::write(root.join("src/lib/a.js"), "").unwrap();
        fs::write(root.join("src/b.js"), "").unwrap();

        let delta = ResourceDelta::from_changed_paths(
            root,
            &[
                PathBuf::from("src/lib/a.js"),
                root.join("src/b.js"),
                PathBuf::from("src/gone.js"),
                PathBuf::from("/elsewhere/c.js"),
            ],
            "utf-8",
        );

        assert_eq!(delta.resource().path(), root);
        assert_eq!(delta.children().len(), 1);

        let src = &delta.children()[0];
        assert_eq!(src.resource().path(), root.join("src"));
        assert_eq!(src.resource().kind(), ResourceKind::Container);
        assert_eq!(src.children().len(), 3);

        let gone = &src.children()[2];
        assert_eq!(gone.resource().path(), root.join("src/gone.js"));
        assert_eq!(gone.kind(), DeltaKind::Removed);
        assert_eq!(gone.resource().kind(), ResourceKind::Leaf);
    }

    #[test]
    fn test_from_changed_paths_resolves_parent_components() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("lib")).unwrap();
        fs::write(root.join("lib/a.js"), "").unwrap();

        let delta = ResourceDelta::from_changed_paths(
            root,
            &[
                PathBuf::from("src/../lib/./a.js"),
                PathBuf::from("../outside.js"),
                root.join("lib/../../escape.js"),
            ],
            "utf-8",
        );

        assert_eq!(delta.children().len(), 1);
        let lib = &delta.children()[0];
        assert_eq!(lib.resource().path(), root.join("lib"));
        assert_eq!(lib.children().len(), 1);

        let a = &lib.children()[0];
        assert_eq!(a.resource().path(), root.join("lib/a.js"));
        assert_eq!(a.kind(), DeltaKind::Changed);
    }

    #[test]
    fn test_from_changed_paths_marks_missing_folders_removed() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        let delta =
            ResourceDelta::from_changed_paths(root, &[PathBuf::from("src/old/a.js")], "utf-8");

        let src = &delta.children()[0];
        assert_eq!(src.kind(), DeltaKind::Removed);
        assert_eq!(src.resource().kind(), ResourceKind::Container);
        let old = &src.children()[0];
        assert_eq!(old.kind(), DeltaKind::Removed);
        assert_eq!(old.children()[0].kind(), DeltaKind::Removed);
    }

    #[cfg(unix)]
    #[test]
    fn test_walk_tree_treats_folder_links_as_folders() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("real")).unwrap();
        fs::write(root.join("real/a.js"), "").unwrap();
        std::os::unix::fs::symlink(root.join("real"), root.join("link")).unwrap();

        struct Kinds(Vec<(PathBuf, ResourceKind)>);

        impl ResourceVisitor for Kinds {
            type Error = Infallible;

            fn visit(&mut self, resource: &ResourceRef) -> Result<bool, Infallible> {
                self.0.push((resource.path().to_path_buf(), resource.kind()));
                Ok(true)
            }
        }

        let mut kinds = Kinds(Vec::new());
        walk_tree(root, "utf-8", &mut kinds).unwrap();

        assert!(kinds.0.contains(&(root.join("link"), ResourceKind::Container)));
        // Links are not followed
        assert!(!kinds.0.iter().any(|(path, _)| path.starts_with(root.join("link/a.js"))));
    }

    #[test]
    fn test_walk_delta_skips_children_when_not_descending() {
        let skipped = ResourceDelta::new(Arc::new(MemoryResource::folder("/p/skip")), DeltaKind::Changed)
            .with_child(ResourceDelta::new(
                Arc::new(MemoryResource::file("/p/skip/x.js", "")),
                DeltaKind::Added,
            ));
        let delta = ResourceDelta::new(Arc::new(MemoryResource::folder("/p")), DeltaKind::Changed)
            .with_child(skipped)
            .with_child(ResourceDelta::new(
                Arc::new(MemoryResource::file("/p/y.js", "")),
                DeltaKind::Changed,
            ));

        let mut recorder = Recorder::default();
        walk_delta(&delta, &mut recorder).unwrap();

        assert_eq!(
            recorder.visited,
            vec![
                PathBuf::from("/p"),
                PathBuf::from("/p/skip"),
                PathBuf::from("/p/y.js"),
            ]
        );
    }
}
