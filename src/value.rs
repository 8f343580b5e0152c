//! Dynamic property values.
//!
//! The detector walks graphs without static type knowledge, so every edge it
//! follows is carried as a [`Value`]. Scalars compare by value; objects
//! compare by identity, never structurally.
use std::{
  fmt::{Debug, Formatter},
  rc::Rc,
};

use crate::notify::Trackable;

/// Shared handle to an object that may take part in change detection.
pub type ObjectRef = Rc<dyn Trackable>;

/// Identity of a shared allocation.
///
/// Stable for as long as any `ObjectRef` to the allocation is alive. The
/// tracking table holds a strong reference to every entry, so an id can not
/// be recycled while it is tracked.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct ObjectId(usize);

impl ObjectId {
  #[inline]
  pub fn of(obj: &ObjectRef) -> Self { Self(Rc::as_ptr(obj) as *const () as usize) }
}

/// A property value or collection element.
#[derive(Clone, Default)]
pub enum Value {
  #[default]
  Null,
  Bool(bool),
  Int(i64),
  Float(f64),
  Str(Rc<str>),
  Object(ObjectRef),
}

impl Value {
  /// Wraps a concrete object.
  pub fn object<T: Trackable>(obj: Rc<T>) -> Self { Value::Object(obj) }

  #[inline]
  pub fn is_null(&self) -> bool { matches!(self, Value::Null) }

  #[inline]
  pub fn as_object(&self) -> Option<&ObjectRef> {
    match self {
      Value::Object(obj) => Some(obj),
      _ => None,
    }
  }

  #[inline]
  pub fn as_int(&self) -> Option<i64> {
    match self {
      Value::Int(v) => Some(*v),
      _ => None,
    }
  }

  #[inline]
  pub fn as_str(&self) -> Option<&str> {
    match self {
      Value::Str(v) => Some(v),
      _ => None,
    }
  }
}

impl PartialEq for Value {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (Value::Null, Value::Null) => true,
      (Value::Bool(a), Value::Bool(b)) => a == b,
      (Value::Int(a), Value::Int(b)) => a == b,
      // NaN reassigned to NaN is not a change.
      (Value::Float(a), Value::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
      (Value::Str(a), Value::Str(b)) => a == b,
      (Value::Object(a), Value::Object(b)) => ObjectId::of(a) == ObjectId::of(b),
      _ => false,
    }
  }
}

impl Debug for Value {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Value::Null => f.write_str("Null"),
      Value::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
      Value::Int(v) => f.debug_tuple("Int").field(v).finish(),
      Value::Float(v) => f.debug_tuple("Float").field(v).finish(),
      Value::Str(v) => f.debug_tuple("Str").field(v).finish(),
      Value::Object(obj) => {
        f.debug_tuple("Object").field(&obj.type_name()).field(&ObjectId::of(obj)).finish()
      }
    }
  }
}

macro_rules! value_from {
  ($($ty:ty => $variant:ident),* $(,)?) => {
    $(
      impl From<$ty> for Value {
        #[inline]
        fn from(v: $ty) -> Self { Value::$variant(v.into()) }
      }
    )*
  };
}

value_from! {
  bool => Bool,
  i32 => Int,
  i64 => Int,
  u32 => Int,
  f64 => Float,
  &str => Str,
  String => Str,
  Rc<str> => Str,
}

impl From<ObjectRef> for Value {
  #[inline]
  fn from(obj: ObjectRef) -> Self { Value::Object(obj) }
}

impl From<&ObjectRef> for Value {
  #[inline]
  fn from(obj: &ObjectRef) -> Self { Value::Object(obj.clone()) }
}

impl<T: Trackable> From<Rc<T>> for Value {
  #[inline]
  fn from(obj: Rc<T>) -> Self { Value::Object(obj) }
}

impl<T: Trackable> From<&Rc<T>> for Value {
  #[inline]
  fn from(obj: &Rc<T>) -> Self { Value::Object(obj.clone()) }
}

impl<T: Into<Value>> From<Option<T>> for Value {
  #[inline]
  fn from(v: Option<T>) -> Self { v.map_or(Value::Null, Into::into) }
}

impl From<&Value> for Value {
  #[inline]
  fn from(v: &Value) -> Self { v.clone() }
}
