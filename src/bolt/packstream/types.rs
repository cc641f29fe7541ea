//! PackStream value model.

use std::collections::HashMap;
use std::fmt;

/// Map of string keys to values, as carried by SUCCESS and most request fields.
pub type Metadata = HashMap<String, PackStreamValue>;

/// A value that can cross the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum PackStreamValue {
    /// Null value
    Null,
    /// Boolean value
    Boolean(bool),
    /// 64-bit signed integer; every integer width decodes to this
    Integer(i64),
    /// 64-bit IEEE-754 float
    Float(f64),
    /// Byte array
    Bytes(Vec<u8>),
    /// UTF-8 string
    String(String),
    /// Ordered list
    List(Vec<PackStreamValue>),
    /// String-keyed map; key order is not significant
    Map(Metadata),
    /// Tagged structure
    Structure(PackStreamStructure),
}

/// A tagged structure: one tag byte plus ordered fields.
#[derive(Debug, Clone, PartialEq)]
pub struct PackStreamStructure {
    /// Structure tag
    pub tag: u8,
    /// Fields in declared order
    pub fields: Vec<PackStreamValue>,
}

impl PackStreamStructure {
    /// Create a new structure.
    pub fn new(tag: u8, fields: Vec<PackStreamValue>) -> Self {
        Self { tag, fields }
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the structure has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field at `index`.
    pub fn field(&self, index: usize) -> Option<&PackStreamValue> {
        self.fields.get(index)
    }
}

impl PackStreamValue {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, PackStreamValue::Null)
    }

    /// Try to get as boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PackStreamValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            PackStreamValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as float. Integers are not widened.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            PackStreamValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Try to get as string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PackStreamValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as byte slice.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            PackStreamValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Try to get as list slice.
    pub fn as_list(&self) -> Option<&[PackStreamValue]> {
        match self {
            PackStreamValue::List(l) => Some(l),
            _ => None,
        }
    }

    /// Try to get as map.
    pub fn as_map(&self) -> Option<&Metadata> {
        match self {
            PackStreamValue::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Try to get as structure.
    pub fn as_structure(&self) -> Option<&PackStreamStructure> {
        match self {
            PackStreamValue::Structure(s) => Some(s),
            _ => None,
        }
    }

    /// A list whose every element is a string.
    ///
    /// Returns `None` if this is not a list or any element is not a string.
    pub fn as_string_list(&self) -> Option<Vec<String>> {
        self.as_list()?
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect()
    }

    /// Follow a path of map keys, e.g. `["rt", "servers"]`.
    pub fn get_path(&self, path: &[&str]) -> Option<&PackStreamValue> {
        path.iter()
            .try_fold(self, |value, key| value.as_map()?.get(*key))
    }

    /// Wire type name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            PackStreamValue::Null => "Null",
            PackStreamValue::Boolean(_) => "Boolean",
            PackStreamValue::Integer(_) => "Integer",
            PackStreamValue::Float(_) => "Float",
            PackStreamValue::Bytes(_) => "Bytes",
            PackStreamValue::String(_) => "String",
            PackStreamValue::List(_) => "List",
            PackStreamValue::Map(_) => "Map",
            PackStreamValue::Structure(_) => "Structure",
        }
    }

    /// List of strings.
    pub fn string_list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PackStreamValue::List(
            items
                .into_iter()
                .map(|s| PackStreamValue::String(s.into()))
                .collect(),
        )
    }
}

impl fmt::Display for PackStreamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackStreamValue::Null => write!(f, "null"),
            PackStreamValue::Boolean(b) => write!(f, "{}", b),
            PackStreamValue::Integer(i) => write!(f, "{}", i),
            PackStreamValue::Float(v) => write!(f, "{}", v),
            PackStreamValue::Bytes(b) => write!(f, "bytes[{}]", b.len()),
            PackStreamValue::String(s) => write!(f, "{:?}", s),
            PackStreamValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            PackStreamValue::Map(map) => {
                // Sorted so log lines are stable.
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort();
                write!(f, "{{")?;
                for (i, key) in keys.into_iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, map[key])?;
                }
                write!(f, "}}")
            }
            PackStreamValue::Structure(s) => {
                write!(f, "Structure<0x{:02X}>(", s.tag)?;
                for (i, field) in s.fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", field)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl From<bool> for PackStreamValue {
    fn from(v: bool) -> Self {
        PackStreamValue::Boolean(v)
    }
}

impl From<i64> for PackStreamValue {
    fn from(v: i64) -> Self {
        PackStreamValue::Integer(v)
    }
}

impl From<i32> for PackStreamValue {
    fn from(v: i32) -> Self {
        PackStreamValue::Integer(i64::from(v))
    }
}

impl From<f64> for PackStreamValue {
    fn from(v: f64) -> Self {
        PackStreamValue::Float(v)
    }
}

impl From<String> for PackStreamValue {
    fn from(v: String) -> Self {
        PackStreamValue::String(v)
    }
}

impl From<&str> for PackStreamValue {
    fn from(v: &str) -> Self {
        PackStreamValue::String(v.to_string())
    }
}

impl From<Vec<u8>> for PackStreamValue {
    fn from(v: Vec<u8>) -> Self {
        PackStreamValue::Bytes(v)
    }
}

impl From<Vec<PackStreamValue>> for PackStreamValue {
    fn from(v: Vec<PackStreamValue>) -> Self {
        PackStreamValue::List(v)
    }
}

impl From<Metadata> for PackStreamValue {
    fn from(v: Metadata) -> Self {
        PackStreamValue::Map(v)
    }
}

impl From<PackStreamStructure> for PackStreamValue {
    fn from(v: PackStreamStructure) -> Self {
        PackStreamValue::Structure(v)
    }
}

impl<T: Into<PackStreamValue>> From<Option<T>> for PackStreamValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(PackStreamValue::Null)
    }
}
