//! read-only navigation over decoded twitter json
//!
//! the two timeline schemas nest their pagination metadata at different and
//! sometimes variable depths, so instead of one giant struct we walk the raw
//! `Value` with a view that fails loudly on type mismatches and quietly on
//! missing keys

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ScrapeError, ScrapeResult};

/// the shape of whatever a `Node` points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
  Object,
  Array,
  String,
  Number,
  Bool,
  Null,
  Missing,
}

impl Kind {
  pub const fn name(self) -> &'static str {
    match self {
      Self::Object => "object",
      Self::Array => "array",
      Self::String => "string",
      Self::Number => "number",
      Self::Bool => "bool",
      Self::Null => "null",
      Self::Missing => "missing",
    }
  }
}

/// cheap, copyable view into a json tree. `None` is the "missing" sentinel
/// returned when a key is absent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node<'a>(Option<&'a Value>);

impl<'a> Node<'a> {
  pub const fn new(value: &'a Value) -> Self {
    Self(Some(value))
  }

  pub fn kind(&self) -> Kind {
    match self.0 {
      None => Kind::Missing,
      Some(Value::Object(_)) => Kind::Object,
      Some(Value::Array(_)) => Kind::Array,
      Some(Value::String(_)) => Kind::String,
      Some(Value::Number(_)) => Kind::Number,
      Some(Value::Bool(_)) => Kind::Bool,
      Some(Value::Null) => Kind::Null,
    }
  }

  pub fn is_missing(&self) -> bool {
    self.0.is_none()
  }

  /// missing, or present but `null`. twitter uses both for "not there"
  pub fn is_absent(&self) -> bool {
    matches!(self.0, None | Some(Value::Null))
  }

  fn mismatch(&self, expected: &'static str) -> ScrapeError {
    ScrapeError::TypeMismatch {
      expected,
      found: self.kind().name(),
    }
  }

  /// child of an object. an absent key gives a missing node, anything that
  /// isn't an object is a type mismatch
  pub fn field(&self, name: &str) -> ScrapeResult<Node<'a>> {
    match self.0 {
      Some(Value::Object(map)) => Ok(Node(map.get(name))),
      _ => Err(self.mismatch("object")),
    }
  }

  /// like `field`, but never fails. used for probing optional wrappers
  pub fn lookup(&self, name: &str) -> Node<'a> {
    match self.0 {
      Some(Value::Object(map)) => Node(map.get(name)),
      _ => Node(None),
    }
  }

  /// walk several keys. a missing or null intermediate stops the walk and
  /// yields a missing node, any other non-object is still a type mismatch
  pub fn path(&self, names: &[&str]) -> ScrapeResult<Node<'a>> {
    let mut node = *self;
    for name in names {
      if node.is_absent() {
        return Ok(Node(None));
      }
      node = node.field(name)?;
    }
    Ok(node)
  }

  pub fn has(&self, name: &str) -> bool {
    !self.lookup(name).is_missing()
  }

  pub fn as_str(&self) -> ScrapeResult<&'a str> {
    match self.0 {
      Some(Value::String(s)) => Ok(s.as_str()),
      _ => Err(self.mismatch("string")),
    }
  }

  pub fn as_i64(&self) -> ScrapeResult<i64> {
    match self.0 {
      Some(Value::Number(n)) => n.as_i64().ok_or_else(|| self.mismatch("integer")),
      _ => Err(self.mismatch("integer")),
    }
  }

  pub fn as_u64(&self) -> ScrapeResult<u64> {
    match self.0 {
      Some(Value::Number(n)) => n.as_u64().ok_or_else(|| self.mismatch("unsigned integer")),
      _ => Err(self.mismatch("unsigned integer")),
    }
  }

  pub fn as_f64(&self) -> ScrapeResult<f64> {
    match self.0 {
      Some(Value::Number(n)) => n.as_f64().ok_or_else(|| self.mismatch("number")),
      _ => Err(self.mismatch("number")),
    }
  }

  pub fn as_bool(&self) -> ScrapeResult<bool> {
    match self.0 {
      Some(Value::Bool(b)) => Ok(*b),
      _ => Err(self.mismatch("bool")),
    }
  }

  pub fn as_seq(&self) -> ScrapeResult<Vec<Node<'a>>> {
    match self.0 {
      Some(Value::Array(items)) => Ok(items.iter().map(Node::new).collect()),
      _ => Err(self.mismatch("array")),
    }
  }

  /// key/child pairs of an object, in the map's iteration order
  pub fn members(&self) -> ScrapeResult<Vec<(&'a str, Node<'a>)>> {
    match self.0 {
      Some(Value::Object(map)) => Ok(map.iter().map(|(k, v)| (k.as_str(), Node::new(v))).collect()),
      _ => Err(self.mismatch("object")),
    }
  }

  /// a string field that may be missing or null
  pub fn opt_str(&self, name: &str) -> ScrapeResult<Option<&'a str>> {
    let child = self.lookup(name);
    if child.is_absent() {
      return Ok(None);
    }
    child.as_str().map(Some)
  }

  pub fn raw(&self) -> Option<&'a Value> {
    self.0
  }

  /// hand the subtree to serde for the parts of the payload that do have a
  /// stable shape
  pub fn decode<T: DeserializeOwned>(&self) -> ScrapeResult<T> {
    match self.0 {
      Some(value) => Ok(T::deserialize(value)?),
      None => Err(self.mismatch("value")),
    }
  }
}
