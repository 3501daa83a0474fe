//! Document handle: a parsed tree plus the path it came from

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::application::{parser, serializer, ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{DomainResult, NodeId, Tree};
use crate::infrastructure::traits::{FileSystem, RealFileSystem};

/// A Defold document.
#[derive(Debug, Clone, Default)]
pub struct Document {
    tree: Tree,
    path: Option<PathBuf>,
}

impl Document {
    /// An empty document without a path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and parse the file at `path`.
    pub fn parse(path: impl AsRef<Path>) -> ApplicationResult<Self> {
        Self::parse_with(&RealFileSystem, path.as_ref())
    }

    #[instrument(level = "debug", skip(fs))]
    pub fn parse_with(fs: &dyn FileSystem, path: &Path) -> ApplicationResult<Self> {
        let text = fs
            .read_to_string(path)
            .with_path_context("read document", path)?;
        let tree = parser::parse(&text, Some(path))?;
        debug!(path = %path.display(), "parsed document");
        Ok(Self {
            tree,
            path: Some(path.to_path_buf()),
        })
    }

    /// Parse in-memory text; the document has no path.
    pub fn from_string(text: &str) -> ApplicationResult<Self> {
        let tree = parser::parse(text, None)?;
        Ok(Self { tree, path: None })
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    /// Path the document was parsed from.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Serialize the whole document.
    pub fn serialize(&self) -> DomainResult<String> {
        serializer::serialize(&self.tree, self.tree.root(), false)
    }

    /// Write the document to `path`, or back to where it was parsed from.
    pub fn write(&self, path: Option<&Path>) -> ApplicationResult<()> {
        self.write_with(&RealFileSystem, path)
    }

    #[instrument(level = "debug", skip(self, fs))]
    pub fn write_with(&self, fs: &dyn FileSystem, path: Option<&Path>) -> ApplicationResult<()> {
        let target = path
            .or(self.path.as_deref())
            .ok_or(ApplicationError::MissingPath)?;
        let text = self.serialize()?;
        fs.write(target, &text)
            .with_path_context("write document", target)?;
        debug!(path = %target.display(), bytes = text.len(), "wrote document");
        Ok(())
    }

    /// Print the serialized document to stdout.
    pub fn dump(&self) -> ApplicationResult<()> {
        dump(&self.tree, self.tree.root())
    }
}

/// Print the serialization of `element` to stdout.
pub fn dump(tree: &Tree, element: NodeId) -> ApplicationResult<()> {
    let text = serializer::serialize(tree, element, false)?;
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.flush())
        .map_err(|e| ApplicationError::Io {
            context: "write to stdout".to_string(),
            source: e,
        })
}
