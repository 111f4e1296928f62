//! Binary codec.
//!
//! Collections are written as a single blob through a [`BlobCodec`]. The
//! collection is wrapped in a rank-1 object array on save, and a top-level
//! object array is unwrapped back into a plain sequence on load.

use crate::io::traits::BlobCodec;
use crate::models::{DType, Mechanism, NdArray, Value};
use crate::{Error, Result};

fn bin_config() -> bincode::config::Configuration {
    bincode::config::standard()
}

/// [`BlobCodec`] backed by `bincode` over the serde form of [`Value`].
#[derive(Debug, Default, Clone, Copy)]
pub struct BincodeCodec;

impl BlobCodec for BincodeCodec {
    fn name(&self) -> &'static str {
        "bincode"
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>> {
        bincode::serde::encode_to_vec(value, bin_config())
            .map_err(|e| Error::failed("encode_binary", e))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value> {
        let (value, read): (Value, usize) = bincode::serde::decode_from_slice(bytes, bin_config())
            .map_err(|e| Error::InvalidInput(format!("Failed to decode binary blob: {e}")))?;
        if read != bytes.len() {
            return Err(Error::InvalidInput(format!(
                "Failed to decode binary blob: {} trailing bytes",
                bytes.len() - read
            )));
        }
        Ok(value)
    }
}

/// Encodes a collection as one blob.
pub fn encode<C: BlobCodec + ?Sized>(codec: &C, mechanisms: &[Mechanism]) -> Result<Vec<u8>> {
    let wrapped = NdArray::objects(mechanisms.iter().cloned().map(Value::Mapping).collect());
    codec.encode(&Value::Array(wrapped))
}

/// Decodes a blob and normalizes a top-level object array to a sequence.
pub fn decode<C: BlobCodec + ?Sized>(codec: &C, bytes: &[u8]) -> Result<Value> {
    codec.decode(bytes).map(normalize)
}

/// Unwraps a generic-element array into nested sequences; anything else is
/// returned as-is.
#[must_use]
pub fn normalize(value: Value) -> Value {
    match value {
        Value::Array(array) if array.dtype() == DType::Object => array.to_list(),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Mapping, Number};

    fn sample() -> Mechanism {
        let mut m = Mapping::new();
        m.insert("x0", NdArray::from_f32(vec![3], vec![0.1, 0.2, 0.3]).unwrap());
        m.insert("edges", NdArray::from_i32(vec![2, 2], vec![0, 1, 1, 2]).unwrap());
        m.insert("mask", NdArray::from_bool(vec![2], vec![true, false]).unwrap());
        m.insert("k", NdArray::scalar(Number::Float(0.25)));
        m.insert("label", "toggle");
        m
    }

    #[test]
    fn test_bincode_roundtrip_is_exact() {
        let codec = BincodeCodec;
        let bytes = encode(&codec, &[sample(), Mapping::new()]).unwrap();
        let decoded = decode(&codec, &bytes).unwrap();
        assert_eq!(
            decoded,
            Value::Sequence(vec![Value::Mapping(sample()), Value::Mapping(Mapping::new())])
        );
    }

    #[test]
    fn test_normalize_leaves_numeric_arrays() {
        let a = NdArray::from_i64(vec![2], vec![1, 2]).unwrap();
        assert_eq!(normalize(Value::Array(a.clone())), Value::Array(a));
        assert_eq!(normalize(Value::from(1)), Value::from(1));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let codec = BincodeCodec;
        assert!(codec.decode(&[0xff, 0xff, 0xff]).is_err());

        let mut bytes = codec.encode(&Value::from(1)).unwrap();
        bytes.push(0);
        assert!(matches!(codec.decode(&bytes), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_decode_rejects_deep_nesting() {
        let codec = BincodeCodec;
        // tag and length of a one-element sequence
        let header = codec.encode(&Value::Sequence(vec![Value::Null])).unwrap()[..2].to_vec();
        let mut bytes = header.repeat(200_000);
        bytes.push(0);
        let err = codec.decode(&bytes).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let mut deepest = Value::Null;
        for _ in 0..crate::models::MAX_DEPTH {
            deepest = Value::Sequence(vec![deepest]);
        }
        let bytes = codec.encode(&deepest).unwrap();
        assert_eq!(codec.decode(&bytes).unwrap(), deepest);

        let too_deep = Value::Sequence(vec![deepest]);
        let bytes = codec.encode(&too_deep).unwrap();
        assert!(codec.decode(&bytes).is_err());
    }

    #[test]
    fn test_decode_rejects_inconsistent_shape() {
        #[derive(serde::Serialize)]
        struct Forged {
            shape: Vec<usize>,
            data: crate::models::ArrayData,
        }
        #[derive(serde::Serialize)]
        enum ForgedValue {
            #[allow(dead_code)]
            Null,
            #[allow(dead_code)]
            Bool(bool),
            #[allow(dead_code)]
            Number(Number),
            #[allow(dead_code)]
            String(String),
            Array(Forged),
        }
        let forged = ForgedValue::Array(Forged {
            shape: vec![4],
            data: crate::models::ArrayData::Int64(vec![1, 2]),
        });
        let bytes = bincode::serde::encode_to_vec(&forged, bin_config()).unwrap();
        assert!(BincodeCodec.decode(&bytes).is_err());
    }
}
