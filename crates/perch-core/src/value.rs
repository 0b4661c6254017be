use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::path::{Key, Path};

/// A dynamically typed state tree node.
///
/// `Undefined` marks holes in auto-vivified lists and doubles as the
/// "delete this key" write value; `Pending` is the marker an in-flight
/// async write installs in its target slot.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Pending(Rc<PendingMarker>),
}

/// Identity anchor for an in-flight async write.
///
/// The token is checked when the write settles: a settlement is honored only
/// while its marker still occupies the slot, so a faster later write wins
/// over a slower earlier one. The face is what readers observe meanwhile.
#[derive(Debug)]
pub struct PendingMarker {
    pub(crate) token: u64,
    pub(crate) face: Face,
}

impl PendingMarker {
    pub fn token(&self) -> u64 {
        self.token
    }
}

/// What a pending slot shows to readers.
#[derive(Clone)]
pub enum Face {
    /// Show the previous slot value (materialized to `Shown` at write time).
    Keep,
    /// Show the raw pending marker.
    Raw,
    /// Show a concrete placeholder.
    Shown(Value),
    /// Derive the placeholder from the previous slot value
    /// (materialized to `Shown` at write time).
    Derive(Rc<dyn Fn(&Value) -> Value>),
}

impl fmt::Debug for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Face::Keep => write!(f, "Keep"),
            Face::Raw => write!(f, "Raw"),
            Face::Shown(v) => f.debug_tuple("Shown").field(v).finish(),
            Face::Derive(_) => write!(f, "Derive(..)"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            // Pending values compare by identity, not by face.
            (Value::Pending(a), Value::Pending(b)) => a.token == b.token,
            _ => false,
        }
    }
}

impl Value {
    pub fn map() -> Value {
        Value::Map(BTreeMap::new())
    }

    pub fn list() -> Value {
        Value::List(Vec::new())
    }

    pub(crate) fn pending_marker(token: u64, face: Face) -> Value {
        Value::Pending(Rc::new(PendingMarker { token, face }))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Value::Pending(_))
    }

    pub(crate) fn is_container(&self) -> bool {
        matches!(self, Value::List(_) | Value::Map(_))
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Sees through a pending slot to its visible face.
    pub fn settled(&self) -> &Value {
        let mut cur = self;
        loop {
            match cur {
                Value::Pending(m) => match &m.face {
                    Face::Shown(v) => cur = v,
                    _ => return cur,
                },
                _ => return cur,
            }
        }
    }

    fn get_key(&self, key: &Key) -> Option<&Value> {
        match (self.settled(), key) {
            (Value::Map(map), Key::Field(name)) => map.get(name),
            (Value::Map(map), Key::Index(i)) => map.get(&i.to_string()),
            (Value::List(items), Key::Index(i)) => items.get(*i),
            _ => None,
        }
    }

    pub(crate) fn contains_key(&self, key: &Key) -> bool {
        self.get_key(key).is_some()
    }

    /// Read-only navigation; `Append` has no meaning on reads.
    pub fn get_path(&self, keys: &[Key]) -> Option<&Value> {
        let mut cur = self;
        for key in keys {
            cur = cur.get_key(key)?;
        }
        Some(cur)
    }

    pub fn get(&self, path: impl Into<Path>) -> Option<&Value> {
        let path = path.into();
        self.get_path(path.keys())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Map(map)
    }
}
