//! Format adapters for mechanism persistence.
//!
//! [`Format`] selects between the [`binary`] and [`text`] codecs, either from an
//! explicit hint or from the target path's extension.

pub mod binary;
pub mod text;

use crate::{Error, Result};
use std::path::Path;
use std::str::FromStr;

/// Supported on-disk formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    /// Opaque blob preserving exact element types and ranks.
    #[default]
    Binary,
    /// Pretty-printed JSON.
    Text,
}

impl Format {
    /// Returns the canonical file extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Binary => "npy",
            Self::Text => "json",
        }
    }

    /// Selects the format used to save to `path`.
    ///
    /// An explicit hint wins; otherwise the extension decides, and a path with
    /// no extension falls back to [`Format::Binary`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] if the hint or the extension is not
    /// recognized.
    pub fn select(path: &Path, explicit: Option<&str>) -> Result<Self> {
        Self::select_or(path, explicit, Self::Binary)
    }

    /// Like [`Format::select`], with a caller-provided format for paths without
    /// an extension.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] if the hint or the extension is not
    /// recognized.
    pub fn select_or(path: &Path, explicit: Option<&str>, fallback: Self) -> Result<Self> {
        match explicit {
            Some(hint) => hint.parse(),
            None => match extension_of(path).as_str() {
                "" => Ok(fallback),
                "npy" | "bin" => Ok(Self::Binary),
                "json" => Ok(Self::Text),
                ext => Err(Error::UnsupportedFormat(format!(
                    "cannot save to extension .{ext} (use .npy, .bin or .json)"
                ))),
            },
        }
    }

    /// Detects the format of an existing file from its extension alone.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] if the extension is not recognized.
    pub fn from_load_path(path: &Path) -> Result<Self> {
        match extension_of(path).as_str() {
            "" | "npy" | "npz" | "bin" => Ok(Self::Binary),
            "json" => Ok(Self::Text),
            ext => Err(Error::UnsupportedFormat(format!(
                "cannot load extension .{ext} (use .npy, .npz, .bin or .json)"
            ))),
        }
    }
}

/// Selects the save format for `path`, see [`Format::select`].
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`] if the hint or the extension is not
/// recognized.
pub fn select_format(path: &Path, explicit: Option<&str>) -> Result<Format> {
    Format::select(path, explicit)
}

/// Lowercased text after the last dot of the file name, or empty.
fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "binary" | "bin" | "npy" => Ok(Self::Binary),
            "text" | "json" => Ok(Self::Text),
            _ => Err(Error::UnsupportedFormat(format!(
                "unknown format '{s}' (use 'binary' or 'text')"
            ))),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Binary => write!(f, "binary"),
            Self::Text => write!(f, "text"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("binary", Format::Binary ; "binary word")]
    #[test_case("NPY", Format::Binary ; "numpy style upper")]
    #[test_case("Bin", Format::Binary ; "bin mixed case")]
    #[test_case("text", Format::Text ; "text word")]
    #[test_case("JSON", Format::Text ; "json upper")]
    fn test_format_from_str(hint: &str, expected: Format) {
        assert_eq!(Format::from_str(hint).unwrap(), expected);
    }

    #[test]
    fn test_unknown_hint_rejected() {
        let err = Format::from_str("yaml").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test_case("mechanisms.npy", Format::Binary ; "npy")]
    #[test_case("out/run.BIN", Format::Binary ; "bin upper")]
    #[test_case("out/run.Json", Format::Text ; "json mixed")]
    #[test_case("m", Format::Binary ; "no extension")]
    #[test_case("dir.v2/m", Format::Binary ; "dot in directory only")]
    fn test_select_from_extension(path: &str, expected: Format) {
        assert_eq!(select_format(Path::new(path), None).unwrap(), expected);
    }

    #[test]
    fn test_hint_overrides_extension() {
        let format = select_format(Path::new("m.npy"), Some("text")).unwrap();
        assert_eq!(format, Format::Text);
    }

    #[test]
    fn test_unknown_save_extension_rejected() {
        let err = select_format(Path::new("m.csv"), None).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
        // npz is an archive; accepted on load only
        assert!(select_format(Path::new("m.npz"), None).is_err());
    }

    #[test]
    fn test_fallback_only_for_missing_extension() {
        let path = Path::new("m");
        assert_eq!(
            Format::select_or(path, None, Format::Text).unwrap(),
            Format::Text
        );
        assert_eq!(
            Format::select_or(Path::new("m.npy"), None, Format::Text).unwrap(),
            Format::Binary
        );
    }

    #[test_case("m.npy", Format::Binary ; "npy")]
    #[test_case("m.npz", Format::Binary ; "npz")]
    #[test_case("m", Format::Binary ; "no extension")]
    #[test_case("M.JSON", Format::Text ; "json upper")]
    fn test_load_detection(path: &str, expected: Format) {
        assert_eq!(Format::from_load_path(Path::new(path)).unwrap(), expected);
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        assert!(Format::from_load_path(Path::new("m.txt")).is_err());
    }

    #[test]
    fn test_extension_and_display() {
        assert_eq!(Format::Binary.extension(), "npy");
        assert_eq!(Format::Text.extension(), "json");
        assert_eq!(Format::Text.to_string(), "text");
    }
}
