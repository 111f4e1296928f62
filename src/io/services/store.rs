//! Mechanism store service.
//!
//! Composes format selection, the overwrite guard, and the two codecs into
//! `save`/`load` operations on a filesystem path.

use crate::config::StoreConfig;
use crate::io::formats::binary::{self, BincodeCodec};
use crate::io::formats::{Format, text};
use crate::io::guard;
use crate::io::traits::BlobCodec;
use crate::models::{Mechanism, MechanismCollection, Value};
use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Options for a save operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SaveOptions {
    /// Explicit format; `None` selects from the path extension.
    pub format: Option<Format>,
    /// Replace an existing file at the target path.
    pub overwrite: bool,
}

impl SaveOptions {
    /// Sets an explicit format.
    #[must_use]
    pub const fn with_format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    /// Allows replacing an existing file.
    #[must_use]
    pub const fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

/// Result of a save operation.
#[derive(Debug, Clone)]
pub struct SaveResult {
    /// Number of mechanisms written.
    pub saved: usize,
    /// Format used.
    pub format: Format,
    /// Absolute path of the written file.
    pub path: PathBuf,
    /// Size of the written file in bytes.
    pub bytes: usize,
}

/// Saves and loads mechanism collections.
///
/// The binary format goes through the injected [`BlobCodec`]; the text format
/// is always JSON.
#[derive(Debug, Clone, Default)]
pub struct MechanismStore<C = BincodeCodec> {
    codec: C,
    /// Format for paths without an extension.
    fallback_format: Format,
}

impl MechanismStore {
    /// Creates a store backed by [`BincodeCodec`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store from configuration.
    #[must_use]
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new().with_fallback_format(config.default_format.unwrap_or_default())
    }
}

impl<C: BlobCodec> MechanismStore<C> {
    /// Creates a store backed by a custom blob codec.
    #[must_use]
    pub fn with_codec(codec: C) -> Self {
        Self {
            codec,
            fallback_format: Format::Binary,
        }
    }

    /// Sets the format used for paths without an extension.
    #[must_use]
    pub const fn with_fallback_format(mut self, format: Format) -> Self {
        self.fallback_format = format;
        self
    }

    /// Returns the blob codec backing the binary format.
    pub const fn codec(&self) -> &C {
        &self.codec
    }

    /// Saves a collection to `path`.
    ///
    /// The format is resolved before any I/O. The document is fully encoded
    /// before the file is opened, so a failed encode leaves nothing behind.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedFormat`] if the path extension is not recognized
    /// - [`Error::AlreadyExists`] if the file exists and `overwrite` is false
    /// - [`Error::OperationFailed`] on encode or I/O failure
    #[instrument(skip_all, fields(path = %path.display(), count = mechanisms.len()))]
    pub fn save(
        &self,
        mechanisms: &[Mechanism],
        path: &Path,
        options: &SaveOptions,
    ) -> Result<SaveResult> {
        let format = match options.format {
            Some(format) => format,
            None => Format::select_or(path, None, self.fallback_format)?,
        };

        guard::check_writable(path, options.overwrite)?;

        let bytes = match format {
            Format::Binary => binary::encode(&self.codec, mechanisms)?,
            Format::Text => text::encode(mechanisms)?,
        };

        fs::write(path, &bytes)
            .map_err(|e| Error::failed("write_mechanisms", format!("{}: {e}", path.display())))?;

        let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        tracing::info!(
            count = mechanisms.len(),
            format = %format,
            path = %absolute.display(),
            "Saved {} mechanisms",
            mechanisms.len()
        );

        Ok(SaveResult {
            saved: mechanisms.len(),
            format,
            path: absolute,
            bytes: bytes.len(),
        })
    }

    /// Loads whatever document is stored at `path`.
    ///
    /// The format comes from the extension alone. A binary file yields exactly
    /// what was saved; a text file yields its JSON with arrays restored in each
    /// mechanism's top-level values.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if `path` does not exist
    /// - [`Error::UnsupportedFormat`] if the extension is not recognized
    /// - [`Error::InvalidInput`] if the file cannot be decoded
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load(&self, path: &Path) -> Result<Value> {
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        let format = Format::from_load_path(path)?;

        let bytes = fs::read(path)
            .map_err(|e| Error::failed("read_mechanisms", format!("{}: {e}", path.display())))?;

        let value = match format {
            Format::Binary => binary::decode(&self.codec, &bytes)?,
            Format::Text => text::decode(&bytes)?,
        };

        tracing::debug!(
            format = %format,
            codec = self.codec.name(),
            bytes = bytes.len(),
            kind = value.kind_name(),
            "Loaded mechanism document"
        );
        Ok(value)
    }

    /// Loads a file that must hold a sequence of mechanisms.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the document is not a sequence of
    /// mappings, plus every error of [`MechanismStore::load`].
    pub fn load_mechanisms(&self, path: &Path) -> Result<MechanismCollection> {
        let value = self.load(path)?;
        let kind = value.kind_name();
        value.into_collection().ok_or_else(|| {
            Error::InvalidInput(format!(
                "{} holds a {kind}, not a sequence of mechanisms",
                path.display()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Mapping, NdArray};
    use std::cell::Cell;
    use tempfile::TempDir;

    /// Codec that counts encodes and delegates to bincode.
    #[derive(Default)]
    struct CountingCodec {
        encoded: Cell<usize>,
    }

    impl BlobCodec for CountingCodec {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn encode(&self, value: &Value) -> Result<Vec<u8>> {
            self.encoded.set(self.encoded.get() + 1);
            BincodeCodec.encode(value)
        }

        fn decode(&self, bytes: &[u8]) -> Result<Value> {
            BincodeCodec.decode(bytes)
        }
    }

    fn mechanism() -> Mechanism {
        let mut m = Mapping::new();
        m.insert("x0", NdArray::from_f64(vec![3], vec![1.0, 2.0, 3.0]).unwrap());
        m
    }

    #[test]
    fn test_injected_codec_is_used_for_binary() {
        let dir = TempDir::new().unwrap();
        let store = MechanismStore::with_codec(CountingCodec::default());

        store
            .save(&[mechanism()], &dir.path().join("m.bin"), &SaveOptions::default())
            .unwrap();
        store
            .save(&[mechanism()], &dir.path().join("m.json"), &SaveOptions::default())
            .unwrap();
        assert_eq!(store.codec().encoded.get(), 1);

        let loaded = store.load_mechanisms(&dir.path().join("m.bin")).unwrap();
        assert_eq!(loaded, vec![mechanism()]);
    }

    #[test]
    fn test_fallback_format_applies_without_extension() {
        let dir = TempDir::new().unwrap();
        let store = MechanismStore::new().with_fallback_format(Format::Text);
        let result = store
            .save(&[mechanism()], &dir.path().join("m"), &SaveOptions::default())
            .unwrap();
        assert_eq!(result.format, Format::Text);

        let explicit = store
            .save(
                &[mechanism()],
                &dir.path().join("n.json"),
                &SaveOptions::default().with_format(Format::Binary),
            )
            .unwrap();
        assert_eq!(explicit.format, Format::Binary);
    }

    #[test]
    fn test_from_config() {
        let dir = TempDir::new().unwrap();
        let config = StoreConfig::new()
            .with_default_format(Format::Text)
            .with_overwrite(true);
        let store = MechanismStore::from_config(&config);
        let options = SaveOptions::default().with_overwrite(config.overwrite);
        let path = dir.path().join("m");

        let first = store.save(&[mechanism()], &path, &options).unwrap();
        assert_eq!(first.format, Format::Text);
        assert!(fs::read_to_string(&path).unwrap().starts_with('['));

        let second = store
            .save(&[mechanism(), mechanism()], &path, &options)
            .unwrap();
        assert_eq!(second.saved, 2);
    }

    #[test]
    fn test_save_result_reports_absolute_path() {
        let dir = TempDir::new().unwrap();
        let result = MechanismStore::new()
            .save(
                &[mechanism(), mechanism()],
                &dir.path().join("out").join("m.json"),
                &SaveOptions::default(),
            )
            .unwrap();
        assert_eq!(result.saved, 2);
        assert!(result.path.is_absolute());
        assert!(result.bytes > 0);
    }

    #[test]
    fn test_unsupported_extension_performs_no_io() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("sub").join("m.csv");
        let err = MechanismStore::new()
            .save(&[mechanism()], &target, &SaveOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
        assert!(!target.parent().unwrap().exists());
    }

    #[test]
    fn test_load_mechanisms_rejects_other_documents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scalar.json");
        fs::write(&path, "42").unwrap();
        let store = MechanismStore::new();
        assert_eq!(store.load(&path).unwrap(), Value::from(42));
        assert!(matches!(
            store.load_mechanisms(&path),
            Err(Error::InvalidInput(_))
        ));
    }
}
