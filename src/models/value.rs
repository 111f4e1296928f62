//! Dynamically shaped mechanism values.

use super::{Mapping, MechanismCollection, NdArray};
use serde::{Deserialize, Deserializer, Serialize};
use std::cell::Cell;
use std::fmt;

/// Deepest nesting of arrays, sequences and mappings accepted on decode.
pub const MAX_DEPTH: usize = 64;

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Holds one level of decode nesting; released on drop.
struct DepthGuard;

impl DepthGuard {
    fn enter() -> Option<Self> {
        DEPTH.with(|depth| {
            let current = depth.get();
            (current < MAX_DEPTH).then(|| {
                depth.set(current + 1);
                Self
            })
        })
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Decodes a container variant, failing instead of recursing past [`MAX_DEPTH`].
fn nested<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let _guard = DepthGuard::enter().ok_or_else(|| {
        serde::de::Error::custom(format!("value nesting exceeds {MAX_DEPTH} levels"))
    })?;
    T::deserialize(deserializer)
}

/// A scalar number, keeping the integer/floating-point distinction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Number {
    /// Signed integer.
    Int(i64),
    /// Double precision float.
    Float(f64),
}

impl Number {
    /// Returns the number widened to `f64`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_f64(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }

    /// Returns the integer value, if this is an integer.
    #[must_use]
    pub const fn as_i64(self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(i),
            Self::Float(_) => None,
        }
    }

    /// Returns `true` for [`Number::Int`].
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(self, Self::Int(_))
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x:?}"),
        }
    }
}

impl From<i64> for Number {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Number {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Number {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<f32> for Number {
    fn from(f: f32) -> Self {
        Self::Float(f64::from(f))
    }
}

/// A field value inside a mechanism.
///
/// Arrays are kept apart from plain sequences: an [`NdArray`] is rectangular and
/// homogeneously typed, a `Sequence` may hold anything.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Value {
    /// Absent value.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// Scalar number.
    Number(Number),
    /// UTF-8 string.
    String(String),
    /// Rectangular typed array.
    Array(#[serde(deserialize_with = "nested")] NdArray),
    /// Ordered list of arbitrary values.
    Sequence(#[serde(deserialize_with = "nested")] Vec<Self>),
    /// Ordered string-keyed mapping.
    Mapping(#[serde(deserialize_with = "nested")] Mapping),
}

impl Value {
    /// Short name of the variant, used in summaries and error messages.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(Number::Int(_)) => "int",
            Self::Number(Number::Float(_)) => "float",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Sequence(_) => "sequence",
            Self::Mapping(_) => "mapping",
        }
    }

    /// Returns the number widened to `f64`, if this is a number.
    #[must_use]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    /// Returns the string slice, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the array, if this is one.
    #[must_use]
    pub const fn as_array(&self) -> Option<&NdArray> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Returns the sequence elements, if this is a sequence.
    #[must_use]
    pub fn as_sequence(&self) -> Option<&[Self]> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the mapping, if this is one.
    #[must_use]
    pub const fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Self::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Converts a sequence of mappings into a mechanism collection.
    ///
    /// Returns `None` if this is not a sequence or any element is not a mapping.
    #[must_use]
    pub fn into_collection(self) -> Option<MechanismCollection> {
        match self {
            Self::Sequence(items) => items
                .into_iter()
                .map(|item| match item {
                    Self::Mapping(m) => Some(m),
                    _ => None,
                })
                .collect(),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Number(Number::Int(i))
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Number(Number::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Number(Number::Float(f))
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Self::Number(Number::from(f))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<NdArray> for Value {
    fn from(a: NdArray) -> Self {
        Self::Array(a)
    }
}

impl From<Mapping> for Value {
    fn from(m: Mapping) -> Self {
        Self::Mapping(m)
    }
}

impl From<Vec<Self>> for Value {
    fn from(items: Vec<Self>) -> Self {
        Self::Sequence(items)
    }
}

impl From<MechanismCollection> for Value {
    fn from(mechanisms: MechanismCollection) -> Self {
        Self::Sequence(mechanisms.into_iter().map(Self::Mapping).collect())
    }
}
