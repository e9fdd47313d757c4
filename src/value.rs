use std::cmp::Ordering;

use indexmap::IndexMap;

/// Object members, in the order they were written.
pub type Map = IndexMap<String, Value>;

/// A runtime value produced by evaluating an expression.
///
/// This type represents all valid JSON types with a distinction between
/// integers and floats (unlike standard JSON which only has "number").
///
/// # Equality
///
/// The derived `PartialEq` is *strict*: variants must match, so
/// `Integer(1) != Float(1.0)`. The `$eq` family of operators uses
/// [`Value::loose_eq`] instead, which compares numbers numerically and
/// coerces strings against numbers and booleans.
///
/// # Examples
///
/// ```
/// use jse_lang::{Value, value::Map};
///
/// let integer = Value::Integer(42);
/// let float = Value::Float(42.0);
/// assert_ne!(integer, float);
/// assert!(integer.loose_eq(&float));
///
/// let mut obj = Map::new();
/// obj.insert("key".to_string(), Value::String("value".to_string()));
/// let object = Value::Object(obj);
/// assert_eq!(object.lookup(&["key"]), Some(&Value::String("value".into())));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// JSON null
    #[default]
    Null,

    /// JSON boolean (true/false)
    Boolean(bool),

    /// Floating-point number
    Float(f64),

    /// Integer number (preserved separately from floats)
    Integer(i64),

    /// UTF-8 string
    String(String),

    /// Array of values (homogeneous or heterogeneous)
    Array(Vec<Value>),

    /// Object with string keys, keeping insertion order
    Object(Map),
}

impl Value {
    /// Check if the value is truthy (for conditions)
    ///
    /// Null, `false`, zero, and empty strings/collections are falsy.
    pub fn is_truthy(&self) -> bool {
        use Value::*;
        match self {
            Null => false,
            Boolean(b) => *b,
            Float(n) => *n != 0.0,
            Integer(n) => *n != 0,
            String(s) => !s.is_empty(),
            Array(arr) => !arr.is_empty(),
            Object(obj) => !obj.is_empty(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get as float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            Value::Float(n) => Some(n.round() as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The string form of a value, as used by `$regex` and `#concat`.
    ///
    /// Strings are returned unquoted; arrays and objects render as compact JSON.
    pub fn as_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Float(n) => n.to_string(),
            Value::Integer(n) => n.to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Null => "null".to_string(),
            Value::Array(_) | Value::Object(_) => crate::convert::value_to_json(self).to_string(),
        }
    }

    /// Returns a human-readable type name
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Loose equality used by `$eq`, `$ne`, `$in` and `$nin`.
    ///
    /// - integers and floats compare numerically
    /// - a string against a number or boolean is parsed to the other side's type
    /// - arrays and objects compare member-wise with the same rules
    /// - any other pair of different variants is unequal
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Float(b)) | (Value::Float(b), Value::Integer(a)) => {
                (*a as f64) == *b
            }
            (Value::String(s), n @ (Value::Integer(_) | Value::Float(_)))
            | (n @ (Value::Integer(_) | Value::Float(_)), Value::String(s)) => {
                parse_number(s).is_some_and(|parsed| parsed.loose_eq(n))
            }
            (Value::String(s), Value::Boolean(b)) | (Value::Boolean(b), Value::String(s)) => {
                s.trim().parse::<bool>() == Ok(*b)
            }
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loose_eq(y))
            }
            (Value::Object(a), Value::Object(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(k, x)| b.get(k).is_some_and(|y| x.loose_eq(y)))
            }
            _ => self == other,
        }
    }

    /// Ordering used by `$gt`, `$lt`, `$between` and friends.
    ///
    /// Numbers compare numerically, strings lexically and booleans with
    /// `false < true`. Every other combination has no ordering.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Integer(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// A total order over all values, used by the `#compare` builtin.
    ///
    /// Values of different kinds order as
    /// null < boolean < number < string < array < object.
    pub fn canonical_cmp(&self, other: &Value) -> Ordering {
        fn rank(v: &Value) -> u8 {
            match v {
                Value::Null => 0,
                Value::Boolean(_) => 1,
                Value::Integer(_) | Value::Float(_) => 2,
                Value::String(_) => 3,
                Value::Array(_) => 4,
                Value::Object(_) => 5,
            }
        }

        match (self, other) {
            (Value::Array(a), Value::Array(b)) => a
                .iter()
                .zip(b)
                .map(|(x, y)| x.canonical_cmp(y))
                .find(|o| o.is_ne())
                .unwrap_or_else(|| a.len().cmp(&b.len())),
            (Value::Object(a), Value::Object(b)) => a.len().cmp(&b.len()),
            _ => match self.compare(other) {
                Some(ordering) => ordering,
                None => rank(self).cmp(&rank(other)),
            },
        }
    }

    /// Get a direct member by a single path segment.
    ///
    /// Objects are indexed by key. Arrays are indexed by an integer segment,
    /// negative indices counting from the end (`-1` is the last element).
    pub fn get(&self, segment: &str) -> Option<&Value> {
        match self {
            Value::Object(map) => map.get(segment),
            Value::Array(arr) => {
                let n: i64 = segment.parse().ok()?;
                let index = if n < 0 {
                    let abs = n.unsigned_abs() as usize;
                    if abs > arr.len() {
                        return None;
                    }
                    arr.len() - abs
                } else {
                    n as usize
                };
                arr.get(index)
            }
            _ => None,
        }
    }

    /// Walk a namespace path segment by segment.
    ///
    /// Returns `None` as soon as a segment is missing at any depth; callers
    /// treat that as null. An empty path resolves to the value itself.
    pub fn lookup<S: AsRef<str>>(&self, path: &[S]) -> Option<&Value> {
        path.iter()
            .try_fold(self, |current, segment| current.get(segment.as_ref()))
    }

    /// Mutable counterpart of [`Value::lookup`] that creates missing objects
    /// along the way. Non-object intermediates are replaced by objects.
    pub fn entry_path<S: AsRef<str>>(&mut self, path: &[S]) -> &mut Value {
        let Some((first, rest)) = path.split_first() else {
            return self;
        };
        match self {
            Value::Object(map) => map
                .entry(first.as_ref().to_string())
                .or_default()
                .entry_path(rest),
            other => {
                *other = Value::Object(Map::new());
                other.entry_path(path)
            }
        }
    }
}

/// Parse a string as a number, preferring integers.
pub(crate) fn parse_number(s: &str) -> Option<Value> {
    let s = s.trim();
    if let Ok(i) = s.parse::<i64>() {
        return Some(Value::Integer(i));
    }
    s.parse::<f64>().ok().filter(|f| f.is_finite()).map(Value::Float)
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}
