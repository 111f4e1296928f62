//! Mechanism persistence subsystem.
//!
//! Saves collections of mechanisms to disk and loads them back, in one of two
//! interchangeable formats.
//!
//! # Architecture
//!
//! - **Format selection** ([`Format`]) resolves an explicit hint or the path
//!   extension into a codec
//! - **Guard** ([`guard`]) protects existing files and creates parent
//!   directories
//! - **Codecs** ([`formats::binary`], [`formats::text`]) turn collections into
//!   bytes and back
//! - **Store** ([`MechanismStore`]) composes the three
//!
//! # Supported Formats
//!
//! | Format | Save extensions | Load extensions | Type fidelity |
//! |--------|-----------------|-----------------|---------------|
//! | Binary | `.npy`, `.bin`, none | `.npy`, `.npz`, `.bin`, none | Exact |
//! | Text | `.json` | `.json` | Numeric; integer arrays may widen |
//!
//! # Examples
//!
//! ```rust,ignore
//! use mechstore::io::{load, save};
//!
//! save(&mechanisms, "runs/mechanisms.json", None, false)?;
//! let restored = load("runs/mechanisms.json")?;
//! ```

pub mod formats;
pub mod guard;
pub mod services;
pub mod traits;

// Re-exports for convenience
pub use formats::binary::BincodeCodec;
pub use formats::{Format, select_format};
pub use guard::check_writable;
pub use services::store::{MechanismStore, SaveOptions, SaveResult};
pub use traits::BlobCodec;

use crate::Result;
use crate::models::{Mechanism, MechanismCollection, Value};
use std::path::Path;

/// Saves `mechanisms` to `path` with the default store.
///
/// `format` is an optional case-insensitive hint (`"binary"`, `"text"`, ...);
/// without it the extension decides and a bare path is saved as binary.
///
/// # Errors
///
/// Returns [`crate::Error::UnsupportedFormat`] for an unknown hint or
/// extension, [`crate::Error::AlreadyExists`] if the file exists and
/// `overwrite` is false, and [`crate::Error::OperationFailed`] on I/O failure.
pub fn save(
    mechanisms: &[Mechanism],
    path: impl AsRef<Path>,
    format: Option<&str>,
    overwrite: bool,
) -> Result<SaveResult> {
    let format = format.map(str::parse::<Format>).transpose()?;
    MechanismStore::new().save(
        mechanisms,
        path.as_ref(),
        &SaveOptions { format, overwrite },
    )
}

/// Loads the document stored at `path` with the default store.
///
/// # Errors
///
/// Returns [`crate::Error::NotFound`] if the file does not exist and
/// [`crate::Error::UnsupportedFormat`] for an unknown extension.
pub fn load(path: impl AsRef<Path>) -> Result<Value> {
    MechanismStore::new().load(path.as_ref())
}

/// Loads a file that must hold a sequence of mechanisms.
///
/// # Errors
///
/// Same as [`load`], plus [`crate::Error::InvalidInput`] if the document is
/// not a sequence of mappings.
pub fn load_mechanisms(path: impl AsRef<Path>) -> Result<MechanismCollection> {
    MechanismStore::new().load_mechanisms(path.as_ref())
}
