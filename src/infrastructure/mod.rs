//! Infrastructure layer: I/O implementations
//!
//! This layer implements the I/O boundary traits used by the application layer.

pub mod traits;

pub use traits::{FileSystem, RealFileSystem};
