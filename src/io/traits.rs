//! Core traits for mechanism persistence.
//!
//! The binary format is an injected capability: anything that can turn a
//! [`Value`] into bytes and back can back the binary codec.

use crate::Result;
use crate::models::Value;

/// Opaque blob encoder/decoder used by the binary format.
///
/// Implementations must round-trip every [`Value`] exactly: element types,
/// ranks, key order, and nesting all survive `decode(encode(v))`.
///
/// # Example Implementation
///
/// ```rust,ignore
/// impl BlobCodec for MsgpackCodec {
///     fn name(&self) -> &'static str {
///         "msgpack"
///     }
///
///     fn encode(&self, value: &Value) -> Result<Vec<u8>> {
///         rmp_serde::to_vec(value).map_err(|e| Error::failed("encode_binary", e))
///     }
///
///     fn decode(&self, bytes: &[u8]) -> Result<Value> {
///         rmp_serde::from_slice(bytes).map_err(|e| Error::InvalidInput(e.to_string()))
///     }
/// }
/// ```
pub trait BlobCodec {
    /// Short backend name, used in log events.
    fn name(&self) -> &'static str;

    /// Serializes a value graph into a blob.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot encode the value.
    fn encode(&self, value: &Value) -> Result<Vec<u8>>;

    /// Deserializes a blob produced by [`BlobCodec::encode`].
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a valid blob.
    fn decode(&self, bytes: &[u8]) -> Result<Value>;
}
