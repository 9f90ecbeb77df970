//! PDF object types.
//!
//! Annotation dictionaries are exported to and imported from this object
//! model. Streams carry their data as [`bytes::Bytes`] so appearance streams can
//! be shared between exported dictionaries without copying.

use crate::error::{Error, Result};
use std::collections::HashMap;

/// A PDF dictionary.
pub type Dict = HashMap<String, Object>;

/// PDF object representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    /// Null object
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Real (floating-point) value
    Real(f64),
    /// String (byte array)
    String(Vec<u8>),
    /// Name (starting with /)
    Name(String),
    /// Array of objects
    Array(Vec<Object>),
    /// Dictionary (key-value pairs)
    Dictionary(Dict),
    /// Stream (dictionary + data)
    Stream {
        /// Stream dictionary
        dict: Dict,
        /// Stream data
        data: bytes::Bytes,
    },
    /// Indirect object reference
    Reference(ObjectRef),
}

/// Reference to an indirect object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    /// Object number
    pub id: u32,
    /// Generation number
    pub gen: u16,
}

impl ObjectRef {
    /// Create a new object reference.
    pub fn new(id: u32, gen: u16) -> Self {
        Self { id, gen }
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.id, self.gen)
    }
}

impl Object {
    /// Create a name object.
    pub fn name(name: impl Into<String>) -> Self {
        Object::Name(name.into())
    }

    /// Create a text string, UTF-16BE encoded with a byte order mark when the
    /// text is not plain ASCII.
    pub fn text(text: &str) -> Self {
        if text.is_ascii() {
            return Object::String(text.as_bytes().to_vec());
        }
        let mut bytes = vec![0xFE, 0xFF];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        Object::String(bytes)
    }

    /// Create a real number array.
    pub fn reals(values: impl IntoIterator<Item = f32>) -> Self {
        Object::Array(values.into_iter().map(|v| Object::Real(v as f64)).collect())
    }

    /// Get the type name of this object (without data).
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Null => "Null",
            Object::Boolean(_) => "Boolean",
            Object::Integer(_) => "Integer",
            Object::Real(_) => "Real",
            Object::String(_) => "String",
            Object::Name(_) => "Name",
            Object::Array(_) => "Array",
            Object::Dictionary(_) => "Dictionary",
            Object::Stream { .. } => "Stream",
            Object::Reference(_) => "Reference",
        }
    }

    /// Try to cast to integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Object::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to cast to name.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Object::Name(s) => Some(s),
            _ => None,
        }
    }

    /// Try to cast to dictionary. Works for both Dictionary and Stream objects.
    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Object::Dictionary(d) => Some(d),
            Object::Stream { dict, .. } => Some(dict),
            _ => None,
        }
    }

    /// Try to cast to array.
    pub fn as_array(&self) -> Option<&Vec<Object>> {
        match self {
            Object::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Try to cast to reference.
    pub fn as_reference(&self) -> Option<ObjectRef> {
        match self {
            Object::Reference(r) => Some(*r),
            _ => None,
        }
    }

    /// Try to cast to boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Object::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to cast to real number.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Object::Real(r) => Some(*r),
            _ => None,
        }
    }

    /// Numeric value of an Integer or Real.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Object::Integer(i) => Some(*i as f64),
            Object::Real(r) => Some(*r),
            _ => None,
        }
    }

    /// Try to cast to string (bytes).
    pub fn as_string(&self) -> Option<&[u8]> {
        match self {
            Object::String(s) => Some(s),
            _ => None,
        }
    }

    /// Decode a text string. UTF-16BE strings carry a byte order mark; other
    /// strings are read byte-per-character.
    pub fn as_text(&self) -> Option<String> {
        let bytes = self.as_string()?;
        if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
            let units: Vec<u16> = bytes[2..]
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            return Some(String::from_utf16_lossy(&units));
        }
        Some(bytes.iter().map(|&b| b as char).collect())
    }

    /// Numbers of an array, or `None` if any element is not numeric.
    pub fn as_number_array(&self) -> Option<Vec<f32>> {
        self.as_array()?
            .iter()
            .map(|o| o.as_number().map(|v| v as f32))
            .collect()
    }

    /// Check if object is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }
}

/// Look up a dictionary entry that must be a name.
pub(crate) fn require_name<'a>(dict: &'a Dict, key: &str) -> Result<&'a str> {
    let obj = dict.get(key).ok_or_else(|| Error::MissingKey(key.to_string()))?;
    obj.as_name().ok_or_else(|| Error::InvalidObjectType {
        expected: "Name".to_string(),
        found: obj.type_name().to_string(),
    })
}

/// Look up a dictionary entry that must be a numeric array of `len` elements.
pub(crate) fn require_numbers(dict: &Dict, key: &str, len: usize) -> Result<Vec<f32>> {
    let obj = dict.get(key).ok_or_else(|| Error::MissingKey(key.to_string()))?;
    match obj.as_number_array() {
        Some(values) if values.len() == len => Ok(values),
        _ => Err(Error::InvalidObjectType {
            expected: format!("Array of {} numbers", len),
            found: obj.type_name().to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_integer() {
        let obj = Object::Integer(42);
        assert_eq!(obj.as_integer(), Some(42));
        assert_eq!(obj.as_number(), Some(42.0));
        assert_eq!(obj.as_name(), None);
    }

    #[test]
    fn test_object_name() {
        let obj = Object::name("Highlight");
        assert_eq!(obj.as_name(), Some("Highlight"));
        assert_eq!(obj.type_name(), "Name");
    }

    #[test]
    fn test_text_ascii() {
        let obj = Object::text("plain");
        assert_eq!(obj.as_string(), Some(&b"plain"[..]));
        assert_eq!(obj.as_text().as_deref(), Some("plain"));
    }

    #[test]
    fn test_text_unicode_roundtrip() {
        let obj = Object::text("Grüße ✓");
        let bytes = obj.as_string().unwrap();
        assert_eq!(&bytes[..2], &[0xFE, 0xFF]);
        assert_eq!(obj.as_text().as_deref(), Some("Grüße ✓"));
    }

    #[test]
    fn test_number_array() {
        let obj = Object::Array(vec![Object::Integer(1), Object::Real(2.5)]);
        assert_eq!(obj.as_number_array(), Some(vec![1.0, 2.5]));
        let mixed = Object::Array(vec![Object::Integer(1), Object::Null]);
        assert_eq!(mixed.as_number_array(), None);
    }

    #[test]
    fn test_object_stream_dict_access() {
        let mut dict = Dict::new();
        dict.insert("Length".to_string(), Object::Integer(3));
        let obj = Object::Stream {
            dict,
            data: bytes::Bytes::from_static(b"q Q"),
        };
        assert_eq!(obj.as_dict().and_then(|d| d.get("Length")), Some(&Object::Integer(3)));
    }

    #[test]
    fn test_object_ref_display() {
        assert_eq!(format!("{}", ObjectRef::new(10, 0)), "10 0 R");
    }

    #[test]
    fn test_require_name() {
        let mut dict = Dict::new();
        dict.insert("Subtype".to_string(), Object::name("Square"));
        dict.insert("Rect".to_string(), Object::Integer(1));
        assert_eq!(require_name(&dict, "Subtype").unwrap(), "Square");
        assert!(matches!(require_name(&dict, "Rect"), Err(Error::InvalidObjectType { .. })));
        assert!(matches!(require_name(&dict, "T"), Err(Error::MissingKey(_))));
    }

    #[test]
    fn test_require_numbers() {
        let mut dict = Dict::new();
        dict.insert("Rect".to_string(), Object::reals([0.0, 0.0, 10.0, 10.0]));
        assert_eq!(require_numbers(&dict, "Rect", 4).unwrap(), vec![0.0, 0.0, 10.0, 10.0]);
        assert!(require_numbers(&dict, "Rect", 6).is_err());
    }
}
