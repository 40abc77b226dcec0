//! Resources: the file and folder nodes a build pass visits
//!
//! A build pass never creates or deletes resources. It reads their content
//! and annotates them with diagnostics through a sink.

mod memory;
mod text;
mod walk;

pub use memory::MemoryResource;
pub use text::{DecodeError, Text};
pub use walk::{DeltaKind, ResourceDelta, ResourceVisitor, walk_delta, walk_tree};

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::ReadError;

/// Charset assumed when a resource does not declare one
pub const DEFAULT_CHARSET: &str = "utf-8";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Container,
    Leaf,
}

/// A node in the resource tree
pub trait Resource: fmt::Debug + Send + Sync {
    /// Identity of the resource
    fn path(&self) -> &Path;

    fn kind(&self) -> ResourceKind;

    fn exists(&self) -> bool;

    /// Raw content bytes (leaves only)
    fn contents(&self) -> io::Result<Vec<u8>>;

    /// Declared encoding of the content
    fn charset(&self) -> &str;
}

/// Shared handle to a resource, captured by check tasks
pub type ResourceRef = Arc<dyn Resource>;

/// Read and decode the content of a leaf resource.
pub fn read_text(resource: &dyn Resource) -> Result<Text, ReadError> {
    let bytes = resource.contents().map_err(|source| ReadError::Io {
        path: resource.path().to_path_buf(),
        source,
    })?;

    Text::decode(&bytes, resource.charset()).map_err(|source| ReadError::Decode {
        path: resource.path().to_path_buf(),
        charset: resource.charset().to_string(),
        source,
    })
}

/// A resource backed by the local file system
#[derive(Debug, Clone)]
pub struct FsResource {
    path: PathBuf,
    kind: ResourceKind,
    charset: String,
}

impl FsResource {
    pub fn file<P: AsRef<Path>>(path: P, charset: &str) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            kind: ResourceKind::Leaf,
            charset: charset.to_string(),
        }
    }

    pub fn folder<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            kind: ResourceKind::Container,
            charset: DEFAULT_CHARSET.to_string(),
        }
    }

    /// Classify `path` by asking the file system whether it is a directory
    pub fn from_path<P: AsRef<Path>>(path: P, charset: &str) -> Self {
        if path.as_ref().is_dir() {
            Self::folder(path)
        } else {
            Self::file(path, charset)
        }
    }
}

impl Resource for FsResource {
    fn path(&self) -> &Path {
        &self.path
    }

    fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn exists(&self) -> bool {
        self.path.exists()
    }

    fn contents(&self) -> io::Result<Vec<u8>> {
        match self.kind {
            ResourceKind::Leaf => std::fs::read(&self.path),
            ResourceKind::Container => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is a folder", self.path.display()),
            )),
        }
    }

    fn charset(&self) -> &str {
        &self.charset
    }
}
