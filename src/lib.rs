//! Parse, edit and write Defold project files.
//!
//! Documents are parsed into an arena-backed [`Tree`] of elements and typed
//! attributes and serialized back byte for byte, including embedded `data`
//! documents at any nesting depth.
//!
//! ```
//! let text = "name: \"main\"\nscale_along_z: 0\n";
//! let document = deftree::from_string(text).unwrap();
//! assert_eq!(document.serialize().unwrap(), text);
//! ```

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod tree_traits;
pub mod util;

use std::path::Path;

pub use application::{ApplicationError, ApplicationResult, Document, ParseError};
pub use domain::{DomainError, DomainResult, Kind, NodeId, RawValue, Tree, Value};

/// Read and parse the file at `path`.
pub fn parse(path: impl AsRef<Path>) -> ApplicationResult<Document> {
    Document::parse(path)
}

/// Parse in-memory text.
pub fn from_string(text: &str) -> ApplicationResult<Document> {
    Document::from_string(text)
}

/// Serialize the children of `element`.
pub fn to_string(tree: &Tree, element: NodeId) -> DomainResult<String> {
    application::serializer::serialize(tree, element, false)
}

/// Compare `text` with the file at `path_or_text`, or with `path_or_text` itself.
pub fn validate(text: &str, path_or_text: &str) -> ApplicationResult<bool> {
    application::hash::validate(text, path_or_text)
}

/// Print the serialization of `element` to stdout.
pub fn dump(tree: &Tree, element: NodeId) -> ApplicationResult<()> {
    application::dump(tree, element)
}
