//! In-memory resources for embedding hosts and tests

use std::io;
use std::path::{Path, PathBuf};

use super::{DEFAULT_CHARSET, Resource, ResourceKind};

#[derive(Debug, Clone)]
enum Content {
    Bytes(Vec<u8>),
    Unreadable(io::ErrorKind),
}

/// A resource whose content lives in memory
#[derive(Debug, Clone)]
pub struct MemoryResource {
    path: PathBuf,
    kind: ResourceKind,
    exists: bool,
    content: Content,
    charset: String,
}

impl MemoryResource {
    pub fn file<P: AsRef<Path>>(path: P, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            kind: ResourceKind::Leaf,
            exists: true,
            content: Content::Bytes(content.into()),
            charset: DEFAULT_CHARSET.to_string(),
        }
    }

    pub fn folder<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            kind: ResourceKind::Container,
            exists: true,
            content: Content::Unreadable(io::ErrorKind::InvalidInput),
            charset: DEFAULT_CHARSET.to_string(),
        }
    }

    /// A file whose content can never be read
    pub fn unreadable<P: AsRef<Path>>(path: P, kind: io::ErrorKind) -> Self {
        Self {
            content: Content::Unreadable(kind),
            ..Self::file(path, Vec::new())
        }
    }

    /// A file that has been deleted
    pub fn removed<P: AsRef<Path>>(path: P) -> Self {
        Self {
            exists: false,
            ..Self::unreadable(path, io::ErrorKind::NotFound)
        }
    }

    pub fn with_charset(mut self, charset: &str) -> Self {
        self.charset = charset.to_string();
        self
    }
}

impl Resource for MemoryResource {
    fn path(&self) -> &Path {
        &self.path
    }

    fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn exists(&self) -> bool {
        self.exists
    }

    fn contents(&self) -> io::Result<Vec<u8>> {
        match &self.content {
            Content::Bytes(bytes) => Ok(bytes.clone()),
            Content::Unreadable(kind) => Err(io::Error::new(
                *kind,
                format!("{} cannot be read", self.path.display()),
            )),
        }
    }

    fn charset(&self) -> &str {
        &self.charset
    }
}
