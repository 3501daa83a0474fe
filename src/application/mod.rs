//! Application layer: parsing, serialization and document I/O
//!
//! This layer drives the domain tree and depends on I/O boundary traits.

pub mod document;
pub mod error;
pub mod error_ext;
pub mod escape;
pub mod hash;
pub mod parser;
pub mod serializer;

pub use document::{dump, Document};
pub use error::{ApplicationError, ApplicationResult, ParseError};
pub use error_ext::IoResultExt;
pub use hash::{content_hash, validate};
