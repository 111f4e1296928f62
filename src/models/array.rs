//! Rectangular typed arrays.
//!
//! An [`NdArray`] stores its elements in a flat row-major buffer next to its
//! shape. The element type travels with the buffer ([`ArrayData`]) so the
//! binary format can restore it exactly.

use super::{Number, Value};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Element type of an [`NdArray`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DType {
    /// Booleans.
    Bool,
    /// 32-bit signed integers.
    Int32,
    /// 64-bit signed integers.
    Int64,
    /// 32-bit floats.
    Float32,
    /// 64-bit floats.
    Float64,
    /// Generic elements, each an arbitrary [`Value`].
    Object,
}

impl DType {
    /// Returns the short type name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Object => "object",
        }
    }

    /// Returns `true` for every element type except [`DType::Object`].
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        !matches!(self, Self::Object)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flat element buffer of an [`NdArray`], tagged by element type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArrayData {
    /// Boolean elements.
    Bool(Vec<bool>),
    /// 32-bit integer elements.
    Int32(Vec<i32>),
    /// 64-bit integer elements.
    Int64(Vec<i64>),
    /// 32-bit float elements.
    Float32(Vec<f32>),
    /// 64-bit float elements.
    Float64(Vec<f64>),
    /// Generic elements.
    Object(Vec<Value>),
}

impl ArrayData {
    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Bool(v) => v.len(),
            Self::Int32(v) => v.len(),
            Self::Int64(v) => v.len(),
            Self::Float32(v) => v.len(),
            Self::Float64(v) => v.len(),
            Self::Object(v) => v.len(),
        }
    }

    /// Returns `true` if there are no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element type of the buffer.
    #[must_use]
    pub const fn dtype(&self) -> DType {
        match self {
            Self::Bool(_) => DType::Bool,
            Self::Int32(_) => DType::Int32,
            Self::Int64(_) => DType::Int64,
            Self::Float32(_) => DType::Float32,
            Self::Float64(_) => DType::Float64,
            Self::Object(_) => DType::Object,
        }
    }

    /// Returns the element at flat index `idx` as a scalar value.
    #[must_use]
    pub fn get(&self, idx: usize) -> Option<Value> {
        match self {
            Self::Bool(v) => v.get(idx).map(|&b| Value::Bool(b)),
            Self::Int32(v) => v.get(idx).map(|&i| Value::from(i)),
            Self::Int64(v) => v.get(idx).map(|&i| Value::from(i)),
            Self::Float32(v) => v.get(idx).map(|&f| Value::from(f)),
            Self::Float64(v) => v.get(idx).map(|&f| Value::from(f)),
            Self::Object(v) => v.get(idx).cloned(),
        }
    }
}

/// Raw form used while deserializing, before the shape is checked.
#[derive(Deserialize)]
struct RawNdArray {
    shape: Vec<usize>,
    data: ArrayData,
}

impl TryFrom<RawNdArray> for NdArray {
    type Error = Error;

    fn try_from(raw: RawNdArray) -> Result<Self> {
        Self::new(raw.shape, raw.data)
    }
}

/// A rectangular array of arbitrary rank.
///
/// A rank-0 array (empty shape) holds exactly one element and stands for an
/// array-backed scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawNdArray")]
pub struct NdArray {
    shape: Vec<usize>,
    data: ArrayData,
}

impl NdArray {
    /// Creates an array from a shape and a row-major buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the product of `shape` does not equal
    /// the number of elements in `data`.
    pub fn new(shape: Vec<usize>, data: ArrayData) -> Result<Self> {
        let expected = shape
            .iter()
            .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
            .ok_or_else(|| Error::InvalidInput(format!("array shape {shape:?} overflows")))?;
        if expected != data.len() {
            return Err(Error::InvalidInput(format!(
                "array shape {shape:?} needs {expected} elements, got {}",
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }

    /// Creates a boolean array.
    ///
    /// # Errors
    ///
    /// Returns an error if the shape does not match the element count.
    pub fn from_bool(shape: Vec<usize>, data: Vec<bool>) -> Result<Self> {
        Self::new(shape, ArrayData::Bool(data))
    }

    /// Creates a 32-bit integer array.
    ///
    /// # Errors
    ///
    /// Returns an error if the shape does not match the element count.
    pub fn from_i32(shape: Vec<usize>, data: Vec<i32>) -> Result<Self> {
        Self::new(shape, ArrayData::Int32(data))
    }

    /// Creates a 64-bit integer array.
    ///
    /// # Errors
    ///
    /// Returns an error if the shape does not match the element count.
    pub fn from_i64(shape: Vec<usize>, data: Vec<i64>) -> Result<Self> {
        Self::new(shape, ArrayData::Int64(data))
    }

    /// Creates a 32-bit float array.
    ///
    /// # Errors
    ///
    /// Returns an error if the shape does not match the element count.
    pub fn from_f32(shape: Vec<usize>, data: Vec<f32>) -> Result<Self> {
        Self::new(shape, ArrayData::Float32(data))
    }

    /// Creates a 64-bit float array.
    ///
    /// # Errors
    ///
    /// Returns an error if the shape does not match the element count.
    pub fn from_f64(shape: Vec<usize>, data: Vec<f64>) -> Result<Self> {
        Self::new(shape, ArrayData::Float64(data))
    }

    /// Creates a rank-1 array from any buffer.
    #[must_use]
    pub fn vector(data: ArrayData) -> Self {
        Self {
            shape: vec![data.len()],
            data,
        }
    }

    /// Creates a rank-1 array of generic elements.
    #[must_use]
    pub fn objects(items: Vec<Value>) -> Self {
        Self::vector(ArrayData::Object(items))
    }

    /// Creates a rank-0 array holding a single number.
    #[must_use]
    pub fn scalar(n: Number) -> Self {
        let data = match n {
            Number::Int(i) => ArrayData::Int64(vec![i]),
            Number::Float(f) => ArrayData::Float64(vec![f]),
        };
        Self {
            shape: Vec::new(),
            data,
        }
    }

    /// Creates an empty rank-1 float array.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            shape: vec![0],
            data: ArrayData::Float64(Vec::new()),
        }
    }

    /// Dimensions of the array.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of dimensions.
    #[must_use]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Total number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the array holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Element type.
    #[must_use]
    pub const fn dtype(&self) -> DType {
        self.data.dtype()
    }

    /// Flat element buffer.
    #[must_use]
    pub const fn data(&self) -> &ArrayData {
        &self.data
    }

    /// Element at a flat row-major index.
    #[must_use]
    pub fn get(&self, idx: usize) -> Option<Value> {
        self.data.get(idx)
    }

    /// Numeric elements widened to `f64`, or `None` for object arrays.
    #[must_use]
    pub fn to_f64_vec(&self) -> Option<Vec<f64>> {
        match &self.data {
            ArrayData::Bool(v) => Some(v.iter().map(|&b| f64::from(u8::from(b))).collect()),
            ArrayData::Int32(v) => Some(v.iter().map(|&i| f64::from(i)).collect()),
            #[allow(clippy::cast_precision_loss)]
            ArrayData::Int64(v) => Some(v.iter().map(|&i| i as f64).collect()),
            ArrayData::Float32(v) => Some(v.iter().map(|&f| f64::from(f)).collect()),
            ArrayData::Float64(v) => Some(v.clone()),
            ArrayData::Object(_) => None,
        }
    }

    /// Converts to plain values following the shape.
    ///
    /// A rank-0 array becomes its single element; higher ranks become nested
    /// [`Value::Sequence`]s.
    #[must_use]
    pub fn to_list(&self) -> Value {
        self.nest(&self.shape, 0)
    }

    fn nest(&self, dims: &[usize], offset: usize) -> Value {
        match dims.split_first() {
            None => self.data.get(offset).unwrap_or_default(),
            Some((&len, rest)) => {
                let stride: usize = rest.iter().product();
                Value::Sequence(
                    (0..len)
                        .map(|i| self.nest(rest, offset + i * stride))
                        .collect(),
                )
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_must_match_data() {
        assert!(NdArray::from_f64(vec![2, 2], vec![1.0, 2.0, 3.0, 4.0]).is_ok());
        let err = NdArray::from_f64(vec![2, 3], vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(NdArray::from_i64(vec![usize::MAX, 3], vec![]).is_err());
    }

    #[test]
    fn test_to_list_rank2() {
        let a = NdArray::from_i64(vec![2, 2], vec![0, 1, 1, 2]).unwrap();
        let expected = Value::Sequence(vec![
            Value::Sequence(vec![Value::from(0i64), Value::from(1i64)]),
            Value::Sequence(vec![Value::from(1i64), Value::from(2i64)]),
        ]);
        assert_eq!(a.to_list(), expected);
    }

    #[test]
    fn test_to_list_scalar_and_empty() {
        assert_eq!(NdArray::scalar(Number::Float(2.5)).to_list(), Value::from(2.5));
        assert_eq!(NdArray::empty().to_list(), Value::Sequence(vec![]));

        let zero_rows = NdArray::from_f64(vec![2, 0], vec![]).unwrap();
        assert_eq!(
            zero_rows.to_list(),
            Value::Sequence(vec![Value::Sequence(vec![]), Value::Sequence(vec![])])
        );
    }

    #[test]
    fn test_dtype_and_widening() {
        let a = NdArray::from_i32(vec![3], vec![1, 2, 3]).unwrap();
        assert_eq!(a.dtype(), DType::Int32);
        assert_eq!(a.to_f64_vec(), Some(vec![1.0, 2.0, 3.0]));
        assert!(DType::Float32.is_numeric());
        assert!(!NdArray::objects(vec![]).dtype().is_numeric());
        assert_eq!(NdArray::objects(vec![]).to_f64_vec(), None);
    }
}
