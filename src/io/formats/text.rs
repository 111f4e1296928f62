//! JSON text codec.
//!
//! JSON has no array type, so saving flattens every [`NdArray`] into nested
//! lists ([`to_text_safe`]) and loading rebuilds arrays from lists whose shape
//! and element kinds allow it ([`restore_arrays`]).
//!
//! Restoration only looks at the top-level values of each mechanism. Lists
//! nested inside a mapping, or inside another list beyond two levels, come
//! back as plain sequences.
//!
//! Non-finite floats are written as the bare literals `NaN`, `Infinity` and
//! `-Infinity`, and the parser accepts them back. Strict JSON readers reject
//! such files; every other document is plain JSON.

use crate::models::{ArrayData, Mapping, Mechanism, NdArray, Number, Value};
use crate::{Error, Result};
use serde::de::{self, DeserializeSeed, MapAccess, SeqAccess, Visitor};
use serde::{Serialize, Serializer};
use serde_json::ser::{Formatter, PrettyFormatter};
use std::collections::VecDeque;
use std::fmt;
use std::io;

/// Converts a value into JSON-representable primitives.
///
/// Arrays become nested sequences following their shape; rank-0 arrays become
/// a plain number. Everything else is kept, recursing into sequences and
/// mappings. The result holds no [`Value::Array`].
#[must_use]
pub fn to_text_safe(value: &Value) -> Value {
    match value {
        Value::Array(array) => to_text_safe(&array.to_list()),
        Value::Sequence(items) => Value::Sequence(items.iter().map(to_text_safe).collect()),
        Value::Mapping(mapping) => Value::Mapping(
            mapping
                .iter()
                .map(|(k, v)| (k, to_text_safe(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Literal for a float JSON cannot spell as a number.
fn non_finite_literal(f: f64) -> Option<&'static str> {
    if f.is_nan() {
        Some("NaN")
    } else if f.is_infinite() {
        Some(if f > 0.0 { "Infinity" } else { "-Infinity" })
    } else {
        None
    }
}

/// Serde view of a value in its text form.
struct TextValue<'a>(&'a Value);

/// Serde view of a mapping in its text form.
struct TextMapping<'a>(&'a Mapping);

impl Serialize for TextValue<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.0 {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(Number::Int(i)) => serializer.serialize_i64(*i),
            // `TextFormatter` writes byte payloads verbatim
            Value::Number(Number::Float(f)) => match non_finite_literal(*f) {
                Some(literal) => serializer.serialize_bytes(literal.as_bytes()),
                None => serializer.serialize_f64(*f),
            },
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(_) => TextValue(&to_text_safe(self.0)).serialize(serializer),
            Value::Sequence(items) => serializer.collect_seq(items.iter().map(TextValue)),
            Value::Mapping(mapping) => TextMapping(mapping).serialize(serializer),
        }
    }
}

impl Serialize for TextMapping<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(k, v)| (k, TextValue(v))))
    }
}

/// Two-space pretty printer that emits byte payloads as raw tokens.
#[derive(Default)]
struct TextFormatter {
    pretty: PrettyFormatter<'static>,
}

impl Formatter for TextFormatter {
    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_array(writer)
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.pretty.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object(writer)
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.pretty.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object_value(writer)
    }

    fn write_byte_array<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        value: &[u8],
    ) -> io::Result<()> {
        writer.write_all(value)
    }
}

fn write_pretty<T: Serialize>(document: &T) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, TextFormatter::default());
    document
        .serialize(&mut serializer)
        .map_err(|e| Error::failed("encode_text", e))?;
    Ok(out)
}

/// Renders any value as pretty-printed (2-space) text.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if serialization fails.
pub fn to_pretty_json(value: &Value) -> Result<Vec<u8>> {
    write_pretty(&TextValue(value))
}

/// Encodes a collection as a pretty-printed (2-space) JSON document.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if serialization fails.
pub fn encode(mechanisms: &[Mechanism]) -> Result<Vec<u8>> {
    write_pretty(&mechanisms.iter().map(TextMapping).collect::<Vec<_>>())
}

/// Tokens that parse as JSON `null` after masking, with the float each stands
/// for. A real `null` stands for nothing.
const NULL_LIKE: [(&str, Option<f64>); 4] = [
    ("null", None),
    ("NaN", Some(f64::NAN)),
    ("-Infinity", Some(f64::NEG_INFINITY)),
    ("Infinity", Some(f64::INFINITY)),
];

/// Replaces non-finite literals outside strings with `null`.
///
/// Returns the masked text and, in document order, one entry per `null` token
/// of the masked text: the float it replaced, or `None` for an original null.
fn mask_non_finite(text: &str) -> (String, VecDeque<Option<f64>>) {
    let bytes = text.as_bytes();
    let mut masked = String::with_capacity(text.len());
    let mut nulls = VecDeque::new();
    let mut copied = 0;
    let mut in_string = false;
    let mut i = 0;

    while i < bytes.len() {
        if in_string {
            match bytes[i] {
                b'\\' => i += 1,
                b'"' => in_string = false,
                _ => {},
            }
            i += 1;
            continue;
        }
        if bytes[i] == b'"' {
            in_string = true;
            i += 1;
            continue;
        }
        match NULL_LIKE
            .iter()
            .find(|(token, _)| bytes[i..].starts_with(token.as_bytes()))
        {
            Some((token, stands_for)) => {
                if stands_for.is_some() {
                    masked.push_str(&text[copied..i]);
                    masked.push_str("null");
                    copied = i + token.len();
                }
                nulls.push_back(*stands_for);
                i += token.len();
            },
            None => i += 1,
        }
    }
    masked.push_str(&text[copied..]);
    (masked, nulls)
}

/// Builds a [`Value`] from masked JSON, putting masked floats back in place of
/// their `null`s. The deserializer visits values in document order, which is
/// the order the mask recorded them in.
struct DocumentSeed<'q> {
    nulls: &'q mut VecDeque<Option<f64>>,
}

impl<'de> DeserializeSeed<'de> for DocumentSeed<'_> {
    type Value = Value;

    fn deserialize<D: de::Deserializer<'de>>(
        self,
        deserializer: D,
    ) -> std::result::Result<Value, D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for DocumentSeed<'_> {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Value, E> {
        Ok(Value::from(v))
    }

    #[allow(clippy::cast_precision_loss)]
    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Value, E> {
        Ok(i64::try_from(v).map_or(Value::from(v as f64), Value::from))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Value, E> {
        Ok(self
            .nulls
            .pop_front()
            .flatten()
            .map_or(Value::Null, Value::from))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Value, A::Error> {
        let nulls = self.nulls;
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element_seed(DocumentSeed { nulls: &mut *nulls })? {
            items.push(item);
        }
        Ok(Value::Sequence(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Value, A::Error> {
        let nulls = self.nulls;
        let mut mapping = Mapping::with_capacity(map.size_hint().unwrap_or(0));
        while let Some(key) = map.next_key::<String>()? {
            let value = map.next_value_seed(DocumentSeed { nulls: &mut *nulls })?;
            mapping.insert(key, value);
        }
        Ok(Value::Mapping(mapping))
    }
}

/// Parses JSON text into a [`Value`] without rebuilding any arrays.
///
/// Accepts the non-finite literals written by [`encode`].
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the text is not a single JSON document.
pub fn parse(text: &str) -> Result<Value> {
    let (masked, mut nulls) = mask_non_finite(text);
    let mut deserializer = serde_json::Deserializer::from_str(&masked);
    let value = DocumentSeed { nulls: &mut nulls }
        .deserialize(&mut deserializer)
        .and_then(|value| deserializer.end().map(|()| value))
        .map_err(|e| Error::InvalidInput(format!("Failed to parse JSON document: {e}")))?;
    Ok(value)
}

/// Scalar element of a list that may become an array.
#[derive(Debug, Clone, Copy)]
enum Element {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl Element {
    const fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(Number::Int(i)) => Some(Self::Int(*i)),
            Value::Number(Number::Float(f)) => Some(Self::Float(*f)),
            _ => None,
        }
    }

    fn as_i64(self) -> i64 {
        match self {
            Self::Bool(b) => i64::from(b),
            Self::Int(i) => i,
            #[allow(clippy::cast_possible_truncation)]
            Self::Float(f) => f as i64,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn as_f64(self) -> f64 {
        match self {
            Self::Bool(b) => f64::from(u8::from(b)),
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }
}

/// Widest element kind wins: all booleans stay boolean, any float makes the
/// whole buffer float, anything else is integer.
fn build_array(shape: Vec<usize>, elements: &[Element]) -> Option<NdArray> {
    let data = if elements.iter().all(|e| matches!(e, Element::Bool(_))) {
        ArrayData::Bool(
            elements
                .iter()
                .map(|e| matches!(e, Element::Bool(true)))
                .collect(),
        )
    } else if elements.iter().any(|e| matches!(e, Element::Float(_))) {
        ArrayData::Float64(elements.iter().map(|e| e.as_f64()).collect())
    } else {
        ArrayData::Int64(elements.iter().map(|e| e.as_i64()).collect())
    };
    NdArray::new(shape, data).ok()
}

/// All-scalar list as a flat element buffer.
fn scalar_row(items: &[Value]) -> Option<Vec<Element>> {
    items.iter().map(Element::from_value).collect()
}

fn restore_vector(items: &[Value]) -> Option<NdArray> {
    let row = scalar_row(items)?;
    build_array(vec![row.len()], &row)
}

fn restore_matrix(items: &[Value]) -> Option<NdArray> {
    let mut width = None;
    let mut elements = Vec::new();
    for item in items {
        let Value::Sequence(row) = item else {
            return None;
        };
        if row.is_empty() || width.is_some_and(|w| w != row.len()) {
            return None;
        }
        width = Some(row.len());
        elements.extend(scalar_row(row)?);
    }
    build_array(vec![items.len(), width?], &elements)
}

/// Rebuilds an array from a loaded value when its shape allows it.
///
/// 1. Anything that is not a sequence is returned unchanged.
/// 2. An empty sequence becomes an empty float array.
/// 3. A sequence of numbers/booleans becomes a 1-D array.
/// 4. A sequence of equally long, non-empty sequences of numbers/booleans
///    becomes a 2-D array.
/// 5. Everything else (strings, mixed kinds, ragged rows, deeper nesting) is
///    returned as a plain sequence.
#[must_use]
pub fn restore_arrays(value: Value) -> Value {
    let Value::Sequence(items) = value else {
        return value;
    };
    if items.is_empty() {
        return Value::Array(NdArray::empty());
    }
    match restore_vector(&items).or_else(|| restore_matrix(&items)) {
        Some(array) => Value::Array(array),
        None => Value::Sequence(items),
    }
}

/// Applies [`restore_arrays`] to a whole loaded document.
///
/// For a top-level sequence, each mapping element has its immediate values
/// restored and any other element is restored directly. Any other document is
/// restored as a single value.
#[must_use]
pub fn restore_document(document: Value) -> Value {
    match document {
        Value::Sequence(items) => Value::Sequence(
            items
                .into_iter()
                .map(|item| match item {
                    Value::Mapping(fields) => Value::Mapping(
                        fields
                            .into_iter()
                            .map(|(k, v)| (k, restore_arrays(v)))
                            .collect(),
                    ),
                    other => restore_arrays(other),
                })
                .collect(),
        ),
        other => restore_arrays(other),
    }
}

/// Parses a JSON document and restores its arrays.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the bytes are not UTF-8 JSON.
pub fn decode(bytes: &[u8]) -> Result<Value> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| Error::InvalidInput(format!("Failed to parse JSON document: {e}")))?;
    parse(text).map(restore_document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DType;

    fn json(text: &str) -> Value {
        parse(text).unwrap()
    }

    fn render(value: &Value) -> String {
        String::from_utf8(to_pretty_json(value).unwrap()).unwrap()
    }

    #[test]
    fn test_to_text_safe_arrays() {
        let a = NdArray::from_i64(vec![2, 2], vec![0, 1, 1, 2]).unwrap();
        assert_eq!(to_text_safe(&Value::Array(a)), json("[[0, 1], [1, 2]]"));

        let f = NdArray::from_f32(vec![2], vec![0.5, 1.5]).unwrap();
        assert_eq!(to_text_safe(&Value::Array(f)), json("[0.5, 1.5]"));

        let scalar = NdArray::scalar(Number::Int(3));
        assert_eq!(to_text_safe(&Value::Array(scalar)), Value::from(3));
    }

    #[test]
    fn test_to_text_safe_nested() {
        let mut inner = Mapping::new();
        inner.insert("k", NdArray::from_bool(vec![2], vec![true, false]).unwrap());
        let mut outer = Mapping::new();
        outer.insert("name", "decay");
        outer.insert("params", inner);
        outer.insert(
            "mixed",
            vec![Value::from(1), Value::from("a"), Value::Null],
        );
        assert_eq!(
            to_text_safe(&Value::Mapping(outer)),
            json(r#"{"name": "decay", "params": {"k": [true, false]}, "mixed": [1, "a", null]}"#)
        );
    }

    #[test]
    fn test_number_kind_survives_rendering() {
        assert_eq!(render(&Value::from(2)), "2");
        assert_eq!(render(&Value::from(2.0)), "2.0");
        assert_eq!(json("2"), Value::from(2));
        assert_eq!(json("2.0"), Value::from(2.0));
    }

    #[test]
    fn test_to_text_safe_object_array() {
        let objects = NdArray::objects(vec![Value::from("a"), Value::from(1)]);
        assert_eq!(to_text_safe(&Value::Array(objects)), json(r#"["a", 1]"#));
    }

    #[test]
    fn test_non_finite_literals_written() {
        let a = NdArray::from_f64(vec![4], vec![1.0, f64::INFINITY, f64::NAN, f64::NEG_INFINITY])
            .unwrap();
        let text = render(&Value::Array(a));
        assert_eq!(text, "[\n  1.0,\n  Infinity,\n  NaN,\n  -Infinity\n]");
    }

    #[test]
    fn test_non_finite_literals_parsed() {
        let Value::Sequence(items) = json(r#"[1.0, NaN, null, -Infinity, "NaN", Infinity]"#) else {
            panic!("expected sequence");
        };
        assert_eq!(items[0], Value::from(1.0));
        assert!(items[1].as_f64().unwrap().is_nan());
        assert_eq!(items[2], Value::Null);
        assert_eq!(items[3], Value::from(f64::NEG_INFINITY));
        assert_eq!(items[4], Value::from("NaN"));
        assert_eq!(items[5], Value::from(f64::INFINITY));
    }

    #[test]
    fn test_mask_skips_strings_and_escapes() {
        let (masked, nulls) = mask_non_finite(r#"{"a\"NaN": NaN, "b": "x\\", "c": null}"#);
        assert_eq!(masked, r#"{"a\"NaN": null, "b": "x\\", "c": null}"#);
        assert_eq!(nulls.len(), 2);
        assert!(nulls[0].is_some_and(f64::is_nan));
        assert_eq!(nulls[1], None);
    }

    #[test]
    fn test_restore_vector() {
        let Value::Array(a) = restore_arrays(json("[1.0, 2.0, 3.0]")) else {
            panic!("expected array");
        };
        assert_eq!(a.shape(), &[3]);
        assert_eq!(a.dtype(), DType::Float64);

        let Value::Array(ints) = restore_arrays(json("[1, 2, true]")) else {
            panic!("expected array");
        };
        assert_eq!(ints.dtype(), DType::Int64);
        assert_eq!(ints.to_f64_vec(), Some(vec![1.0, 2.0, 1.0]));

        let Value::Array(bools) = restore_arrays(json("[true, false]")) else {
            panic!("expected array");
        };
        assert_eq!(bools.dtype(), DType::Bool);
    }

    #[test]
    fn test_restore_matrix() {
        let Value::Array(a) = restore_arrays(json("[[0, 1], [1, 2]]")) else {
            panic!("expected array");
        };
        assert_eq!(a.shape(), &[2, 2]);
        assert_eq!(a.dtype(), DType::Int64);

        let Value::Array(widened) = restore_arrays(json("[[0, 1], [1.5, 2]]")) else {
            panic!("expected array");
        };
        assert_eq!(widened.dtype(), DType::Float64);
    }

    #[test]
    fn test_restore_empty() {
        let Value::Array(a) = restore_arrays(json("[]")) else {
            panic!("expected array");
        };
        assert!(a.is_empty());
        assert_eq!(a.shape(), &[0]);
    }

    #[test]
    fn test_restore_fallbacks() {
        let ragged = restore_arrays(json("[[1, 2], [3]]"));
        assert_eq!(
            ragged,
            Value::Sequence(vec![
                Value::Sequence(vec![Value::from(1), Value::from(2)]),
                Value::Sequence(vec![Value::from(3)]),
            ])
        );

        let strings = restore_arrays(json(r#"["a", "b"]"#));
        assert_eq!(strings, Value::Sequence(vec![Value::from("a"), Value::from("b")]));

        let empty_row = restore_arrays(json("[[], []]"));
        assert!(empty_row.as_sequence().is_some());

        let deep = restore_arrays(json("[[[1]], [[2]]]"));
        assert!(deep.as_sequence().is_some());

        let with_null = restore_arrays(json("[1.0, null]"));
        assert!(with_null.as_sequence().is_some());

        assert_eq!(restore_arrays(json(r#""x""#)), Value::from("x"));
        assert_eq!(restore_arrays(json("4")), Value::from(4));
    }

    #[test]
    fn test_restore_document_is_shallow() {
        let doc = json(r#"[{"x0": [1, 2], "nested": {"v": [1, 2]}}, [3, 4]]"#);
        let Value::Sequence(items) = restore_document(doc) else {
            panic!("expected sequence");
        };
        let first = items[0].as_mapping().unwrap();
        assert!(first.get("x0").unwrap().as_array().is_some());
        let nested = first.get("nested").unwrap().as_mapping().unwrap();
        assert!(nested.get("v").unwrap().as_sequence().is_some());
        assert!(items[1].as_array().is_some());
    }

    #[test]
    fn test_restore_document_non_list() {
        let Value::Mapping(m) = restore_document(json(r#"{"a": [1, 2]}"#)) else {
            panic!("expected mapping");
        };
        // a lone top-level mapping is not scanned
        assert!(m.get("a").unwrap().as_sequence().is_some());
    }

    #[test]
    fn test_encode_is_pretty() {
        let mut m = Mapping::new();
        m.insert("x0", NdArray::from_f64(vec![2], vec![1.0, 2.0]).unwrap());
        let text = String::from_utf8(encode(&[m]).unwrap()).unwrap();
        assert!(text.starts_with("[\n  {\n    \"x0\": ["));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode(b"{not json"), Err(Error::InvalidInput(_))));
        assert!(matches!(decode(b"[1] [2]"), Err(Error::InvalidInput(_))));
        assert!(matches!(decode(&[0xff, 0xfe]), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_decode_u64_beyond_i64_is_float() {
        assert_eq!(decode(b"18446744073709551615").unwrap(), Value::from(u64::MAX as f64));
    }
}
