//! Domain layer: document tree and typed attribute values
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod error;
pub mod tree;
pub mod value;

pub use error::{DomainError, DomainResult};
pub use tree::{Ancestors, Descendants, NodeId, NodeKind, Tree, TreeNode};
pub use value::{format_float, Kind, RawValue, Value};
