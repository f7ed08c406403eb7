//! Value <-> cookie string conversion.
//!
//! Primitives (strings, numbers, booleans) are stored as their plain text form so
//! that other consumers of the cookie can read them directly. Structured values
//! (objects, arrays) are stored as compact JSON. The result is then passed through
//! the configured [`TransportEncoding`].
//!
//! Decoding inspects the transport-decoded text: `{…}` and `[…]` are parsed as
//! JSON, anything else is coerced into the requested primitive type.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::ser::Impossible;
use serde::Serialize;
use serde_json::Value;

use crate::config::TransportEncoding;
use crate::errors::{CookieError, Result};

/// Stateless encoder; safe to share between requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct Encoder {
    encoding: TransportEncoding,
}

impl Encoder {
    pub fn new(encoding: TransportEncoding) -> Self {
        Self { encoding }
    }

    pub fn encoding(&self) -> TransportEncoding {
        self.encoding
    }

    /// Turns `value` into a header-safe cookie string.
    ///
    /// Non-finite floats have no JSON form and are rejected rather than stored as null.
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        if shape_of(value) == Shape::NonFiniteFloat {
            return Err(CookieError::Serialization("non-finite number cannot be stored".to_string()));
        }

        let text = match serde_json::to_value(value)? {
            Value::Null => String::new(),
            Value::String(s) => s,
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            structured @ (Value::Array(_) | Value::Object(_)) => serde_json::to_string(&structured)?,
        };

        Ok(self.apply_transport(&text))
    }

    /// Reverses [`encode`](Self::encode) into the requested type.
    pub fn decode<T: DeserializeOwned>(&self, encoded: &str) -> Result<T> {
        let text = self.decode_raw(encoded)?;

        if is_structured(&text) {
            // A plain string that merely looks like JSON, e.g. "[draft]", still has to
            // come back out as a string.
            return match serde_json::from_str(&text) {
                Ok(v) => Ok(v),
                Err(e) => coerce_primitive(text).map_err(|_| CookieError::from(e)),
            };
        }

        coerce_primitive(text)
    }

    /// Reverses only the transport encoding.
    pub fn decode_raw(&self, encoded: &str) -> Result<String> {
        match self.encoding {
            TransportEncoding::None => Ok(encoded.to_string()),
            TransportEncoding::Url => urlencoding::decode(encoded)
                .map(|s| s.into_owned())
                .map_err(|e| CookieError::Serialization(format!("invalid percent-encoding: {e}"))),
            TransportEncoding::Base64 => {
                let bytes = URL_SAFE_NO_PAD
                    .decode(encoded)
                    .map_err(|e| CookieError::Serialization(format!("invalid base64: {e}")))?;
                String::from_utf8(bytes)
                    .map_err(|e| CookieError::Serialization(format!("invalid utf-8: {e}")))
            }
        }
    }

    fn apply_transport(&self, text: &str) -> String {
        match self.encoding {
            TransportEncoding::None => text.to_string(),
            TransportEncoding::Url => urlencoding::encode(text).into_owned(),
            TransportEncoding::Base64 => URL_SAFE_NO_PAD.encode(text.as_bytes()),
        }
    }
}

/// Top-level kind of a value, as far as the null check cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shape {
    /// `None`, `()` or a unit struct.
    Null,
    NonFiniteFloat,
    Other,
}

/// Classifies `value` without serializing its contents.
///
/// `serde_json::to_value` maps NaN and infinities to `null`, so nullness has to be
/// decided on the serde data model instead.
pub(crate) fn shape_of<T: Serialize + ?Sized>(value: &T) -> Shape {
    value.serialize(ShapeProbe).unwrap_or(Shape::Other)
}

// Compound values bail out through the error path; their shape is always `Other`.
#[derive(Debug)]
struct Compound;

impl std::fmt::Display for Compound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("compound value")
    }
}

impl std::error::Error for Compound {}

impl serde::ser::Error for Compound {
    fn custom<T: std::fmt::Display>(_msg: T) -> Self {
        Compound
    }
}

struct ShapeProbe;

macro_rules! other {
    ($($method:ident($ty:ty)),* $(,)?) => {
        $(fn $method(self, _v: $ty) -> std::result::Result<Shape, Compound> {
            Ok(Shape::Other)
        })*
    };
}

impl serde::Serializer for ShapeProbe {
    type Ok = Shape;
    type Error = Compound;
    type SerializeSeq = Impossible<Shape, Compound>;
    type SerializeTuple = Impossible<Shape, Compound>;
    type SerializeTupleStruct = Impossible<Shape, Compound>;
    type SerializeTupleVariant = Impossible<Shape, Compound>;
    type SerializeMap = Impossible<Shape, Compound>;
    type SerializeStruct = Impossible<Shape, Compound>;
    type SerializeStructVariant = Impossible<Shape, Compound>;

    other!(
        serialize_bool(bool),
        serialize_i8(i8),
        serialize_i16(i16),
        serialize_i32(i32),
        serialize_i64(i64),
        serialize_u8(u8),
        serialize_u16(u16),
        serialize_u32(u32),
        serialize_u64(u64),
        serialize_char(char),
        serialize_str(&str),
        serialize_bytes(&[u8]),
    );

    fn serialize_f32(self, v: f32) -> std::result::Result<Shape, Compound> {
        Ok(if v.is_finite() { Shape::Other } else { Shape::NonFiniteFloat })
    }

    fn serialize_f64(self, v: f64) -> std::result::Result<Shape, Compound> {
        Ok(if v.is_finite() { Shape::Other } else { Shape::NonFiniteFloat })
    }

    fn serialize_none(self) -> std::result::Result<Shape, Compound> {
        Ok(Shape::Null)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> std::result::Result<Shape, Compound> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> std::result::Result<Shape, Compound> {
        Ok(Shape::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> std::result::Result<Shape, Compound> {
        Ok(Shape::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
    ) -> std::result::Result<Shape, Compound> {
        Ok(Shape::Other)
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> std::result::Result<Shape, Compound> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> std::result::Result<Shape, Compound> {
        Ok(Shape::Other)
    }

    fn serialize_seq(self, _len: Option<usize>) -> std::result::Result<Self::SerializeSeq, Compound> {
        Err(Compound)
    }

    fn serialize_tuple(self, _len: usize) -> std::result::Result<Self::SerializeTuple, Compound> {
        Err(Compound)
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> std::result::Result<Self::SerializeTupleStruct, Compound> {
        Err(Compound)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> std::result::Result<Self::SerializeTupleVariant, Compound> {
        Err(Compound)
    }

    fn serialize_map(self, _len: Option<usize>) -> std::result::Result<Self::SerializeMap, Compound> {
        Err(Compound)
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> std::result::Result<Self::SerializeStruct, Compound> {
        Err(Compound)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> std::result::Result<Self::SerializeStructVariant, Compound> {
        Err(Compound)
    }
}

fn is_structured(text: &str) -> bool {
    (text.starts_with('{') && text.ends_with('}')) || (text.starts_with('[') && text.ends_with(']'))
}

// A string target takes the text verbatim, so "42" stays "42" for `String`. Other
// targets get the text read as a JSON scalar, so "42" becomes 42 and "true" true.
fn coerce_primitive<T: DeserializeOwned>(text: String) -> Result<T> {
    match serde_json::from_value::<T>(Value::String(text.clone())) {
        Ok(v) => Ok(v),
        Err(as_string) => serde_json::from_str::<T>(&text).map_err(|_| {
            CookieError::Serialization(format!("cannot coerce {text:?} into requested type: {as_string}"))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Prefs {
        lang: String,
        notify: bool,
    }

    fn all() -> [Encoder; 3] {
        [
            Encoder::new(TransportEncoding::None),
            Encoder::new(TransportEncoding::Url),
            Encoder::new(TransportEncoding::Base64),
        ]
    }

    #[test]
    fn primitives_round_trip() {
        for enc in all() {
            assert_eq!(enc.decode::<String>(&enc.encode("dark").unwrap()).unwrap(), "dark");
            assert_eq!(enc.decode::<i64>(&enc.encode(&-42i64).unwrap()).unwrap(), -42);
            assert_eq!(enc.decode::<u8>(&enc.encode(&7u8).unwrap()).unwrap(), 7);
            assert_eq!(enc.decode::<f64>(&enc.encode(&1.5f64).unwrap()).unwrap(), 1.5);
            assert!(enc.decode::<bool>(&enc.encode(&true).unwrap()).unwrap());
            assert_eq!(enc.decode::<char>(&enc.encode(&'x').unwrap()).unwrap(), 'x');
        }
    }

    #[test]
    fn structured_round_trip() {
        let prefs = Prefs { lang: "en".into(), notify: true };
        let list = vec![1, 2, 3];
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), "x; y=z".to_string());

        for enc in all() {
            assert_eq!(enc.decode::<Prefs>(&enc.encode(&prefs).unwrap()).unwrap(), prefs);
            assert_eq!(enc.decode::<Vec<i32>>(&enc.encode(&list).unwrap()).unwrap(), list);
            assert_eq!(enc.decode::<BTreeMap<String, String>>(&enc.encode(&map).unwrap()).unwrap(), map);
        }
    }

    #[test]
    fn primitive_is_stored_as_plain_text() {
        let enc = Encoder::new(TransportEncoding::None);
        assert_eq!(enc.encode("dark").unwrap(), "dark");
        assert_eq!(enc.encode(&42).unwrap(), "42");
        assert_eq!(enc.encode(&false).unwrap(), "false");
        assert_eq!(enc.encode(&Prefs { lang: "en".into(), notify: true }).unwrap(), r#"{"lang":"en","notify":true}"#);
    }

    #[test]
    fn url_encoding_strips_header_separators() {
        let enc = Encoder::new(TransportEncoding::Url);
        let s = enc.encode("a; b=c, d").unwrap();
        assert!(!s.contains(';') && !s.contains(' ') && !s.contains(','));
        assert_eq!(enc.decode::<String>(&s).unwrap(), "a; b=c, d");
    }

    #[test]
    fn base64_output_is_cookie_safe() {
        let enc = Encoder::new(TransportEncoding::Base64);
        let s = enc.encode(&Prefs { lang: "ünï".into(), notify: false }).unwrap();
        assert!(s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_'));
    }

    #[test]
    fn numeric_string_stays_a_string() {
        let enc = Encoder::default();
        assert_eq!(enc.decode::<String>(&enc.encode("42").unwrap()).unwrap(), "42");
    }

    #[test]
    fn bracketed_string_stays_a_string() {
        for enc in all() {
            assert_eq!(enc.decode::<String>(&enc.encode("[draft]").unwrap()).unwrap(), "[draft]");
            assert_eq!(enc.decode::<String>(&enc.encode("{x}").unwrap()).unwrap(), "{x}");
        }
    }

    #[test]
    fn non_finite_floats_are_rejected() {
        for enc in all() {
            assert!(enc.encode(&f64::INFINITY).unwrap_err().is_serialization());
            assert!(enc.encode(&f64::NEG_INFINITY).unwrap_err().is_serialization());
            assert!(enc.encode(&f32::NAN).unwrap_err().is_serialization());
            assert!(enc.encode(&Some(f64::NAN)).unwrap_err().is_serialization());
        }
    }

    #[test]
    fn shape_separates_null_from_nan() {
        assert_eq!(shape_of(&Option::<i32>::None), Shape::Null);
        assert_eq!(shape_of(&()), Shape::Null);
        assert_eq!(shape_of(&Some(3)), Shape::Other);
        assert_eq!(shape_of(&f64::NAN), Shape::NonFiniteFloat);
        assert_eq!(shape_of(&2.5f64), Shape::Other);
        assert_eq!(shape_of("x"), Shape::Other);
        assert_eq!(shape_of(&vec![Option::<i32>::None]), Shape::Other);
        assert_eq!(shape_of(&Prefs { lang: "en".into(), notify: true }), Shape::Other);
    }

    #[test]
    fn coercion_failure_is_serialization_error() {
        let enc = Encoder::default();
        let err = enc.decode::<i32>("dark").unwrap_err();
        assert!(err.is_serialization());

        let err = enc.decode::<Prefs>("[1,2]").unwrap_err();
        assert!(err.is_serialization());
    }

    #[test]
    fn corrupt_transport_is_serialization_error() {
        let enc = Encoder::new(TransportEncoding::Base64);
        assert!(enc.decode_raw("not base64!").unwrap_err().is_serialization());

        let enc = Encoder::new(TransportEncoding::Url);
        assert!(enc.decode_raw("%FF%FE").unwrap_err().is_serialization());
    }
}
