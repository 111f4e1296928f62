//! # Mechstore
//!
//! Persistence for collections of "mechanism" records.
//!
//! A mechanism is an ordered mapping from field names to values that are
//! mostly numeric arrays (initial states, edge lists, rate vectors). Collections
//! are saved to and restored from two interchangeable formats:
//!
//! - **Binary**: an opaque blob that keeps every array's element type and rank
//! - **Text**: pretty-printed JSON, with arrays reconstructed on load from the
//!   shape and element kinds of the stored lists
//!
//! ## Example
//!
//! ```rust,ignore
//! use mechstore::{Mapping, NdArray, load, save};
//!
//! let mut mechanism = Mapping::new();
//! mechanism.insert("x0", NdArray::from_f64(vec![3], vec![1.0, 2.0, 3.0])?);
//! mechanism.insert("label", "decay");
//! save(&[mechanism], "out/mechanisms.json", None, false)?;
//!
//! let restored = load("out/mechanisms.json")?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use std::path::PathBuf;
use thiserror::Error as ThisError;

// Module declarations
pub mod config;
pub mod io;
pub mod models;
pub mod observability;

// Re-exports for convenience
pub use config::StoreConfig;
pub use io::{
    BincodeCodec, BlobCodec, Format, MechanismStore, SaveOptions, SaveResult, load,
    load_mechanisms, save, select_format,
};
pub use models::{ArrayData, DType, Mapping, Mechanism, MechanismCollection, NdArray, Number, Value};

/// Error type for mechstore operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `AlreadyExists` | Save target exists and overwrite was not requested |
/// | `UnsupportedFormat` | Format hint or file extension is not recognized |
/// | `NotFound` | Load path does not exist |
/// | `InvalidInput` | Array shape/data mismatch, unparsable document, wrong top-level shape |
/// | `OperationFailed` | Filesystem I/O or blob codec failures |
#[derive(Debug, ThisError)]
pub enum Error {
    /// The save target already exists.
    #[error("file {} already exists (set overwrite to replace it)", .path.display())]
    AlreadyExists {
        /// The path that was about to be written.
        path: PathBuf,
    },

    /// The format hint or file extension is not recognized.
    ///
    /// Raised before any I/O is performed.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The file to load does not exist.
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - An array's shape does not match its element count
    /// - A JSON document cannot be parsed
    /// - A binary blob is corrupt or nests deeper than [`models::MAX_DEPTH`]
    /// - A loaded document is not a sequence of mappings where one was required
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - Filesystem reads, writes, or directory creation fail
    /// - The blob codec cannot encode or decode a value
    /// - Logging initialization fails
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Builds an [`Error::OperationFailed`] from an operation name and any displayable cause.
    pub(crate) fn failed(operation: &str, cause: impl std::fmt::Display) -> Self {
        Self::OperationFailed {
            operation: operation.to_string(),
            cause: cause.to_string(),
        }
    }
}

/// Result type alias for mechstore operations.
pub type Result<T> = std::result::Result<T, Error>;
