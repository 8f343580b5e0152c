//! Capabilities an object can expose to take part in change detection.
//!
//! Every graph member implements [`Trackable`]. By default it is inert: the
//! detector treats it as a leaf, does not track it and does not look inside
//! it. An object opts in by returning itself from
//! [`Trackable::as_property_observable`] and/or
//! [`Trackable::as_collection_observable`].
//!
//! ```rust
//! use std::{borrow::Cow, cell::Cell};
//! use change_detector::prelude::*;
//!
//! #[derive(Default)]
//! struct Counter {
//!   value: Cell<i64>,
//!   changed: Listeners<dyn Fn(&str)>,
//! }
//!
//! impl Counter {
//!   fn set(&self, v: i64) {
//!     self.value.set(v);
//!     self.changed.broadcast(|l| l("Value"));
//!   }
//! }
//!
//! impl Trackable for Counter {
//!   fn as_property_observable(&self) -> Option<&dyn PropertyObservable> { Some(self) }
//! }
//!
//! impl PropertyObservable for Counter {
//!   fn properties(&self) -> Vec<Cow<'static, str>> { vec!["Value".into()] }
//!
//!   fn property(&self, name: &str) -> Result<Value, PropertyError> {
//!     match name {
//!       "Value" => Ok(self.value.get().into()),
//!       _ => Err(PropertyError::unknown(self.type_name(), name)),
//!     }
//!   }
//!
//!   fn add_property_listener(&self, listener: PropertyListener) -> ListenerId {
//!     self.changed.add(listener.into())
//!   }
//!
//!   fn remove_property_listener(&self, id: ListenerId) -> bool {
//!     self.changed.remove(id).is_some()
//!   }
//! }
//! ```
use std::borrow::Cow;

use crate::{error::PropertyError, listeners::ListenerId, value::Value};

/// Listener for property changes, called with the changed property's name.
pub type PropertyListener = Box<dyn Fn(&str)>;

/// Listener for membership changes of a collection.
pub type CollectionListener = Box<dyn Fn(&CollectionChange)>;

/// Base trait of every object that can appear in an observed graph.
pub trait Trackable: 'static {
  /// Name used in log events.
  fn type_name(&self) -> &'static str { std::any::type_name::<Self>() }

  fn as_property_observable(&self) -> Option<&dyn PropertyObservable> { None }

  fn as_collection_observable(&self) -> Option<&dyn CollectionObservable> { None }
}

/// An object that announces changes of its properties.
pub trait PropertyObservable {
  /// Names of the public, readable, non-indexed properties.
  fn properties(&self) -> Vec<Cow<'static, str>>;

  /// Reads the current value of a property.
  ///
  /// Must not hold internal borrows that a listener could conflict with: the
  /// detector calls this from inside notifications.
  fn property(&self, name: &str) -> Result<Value, PropertyError>;

  fn add_property_listener(&self, listener: PropertyListener) -> ListenerId;

  /// Returns `false` when no listener is registered under `id`.
  fn remove_property_listener(&self, id: ListenerId) -> bool;
}

/// An enumerable object that announces membership changes.
pub trait CollectionObservable {
  /// Current elements in iteration order.
  fn items(&self) -> Vec<Value>;

  fn add_collection_listener(&self, listener: CollectionListener) -> ListenerId;

  fn remove_collection_listener(&self, id: ListenerId) -> bool;
}

/// Kind of membership change.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CollectionAction {
  Add,
  Remove,
  Replace,
  Move,
  /// Contents changed drastically and the affected elements are unknown.
  Reset,
}

/// Payload of a collection-change notification.
#[derive(Clone, Debug)]
pub struct CollectionChange {
  pub action: CollectionAction,
  pub new_items: Vec<Value>,
  pub old_items: Vec<Value>,
}

impl CollectionChange {
  pub fn added(items: Vec<Value>) -> Self {
    Self { action: CollectionAction::Add, new_items: items, old_items: Vec::new() }
  }

  pub fn removed(items: Vec<Value>) -> Self {
    Self { action: CollectionAction::Remove, new_items: Vec::new(), old_items: items }
  }

  pub fn replaced(new_item: Value, old_item: Value) -> Self {
    Self { action: CollectionAction::Replace, new_items: vec![new_item], old_items: vec![old_item] }
  }

  pub fn moved(item: Value) -> Self {
    Self { action: CollectionAction::Move, new_items: vec![item.clone()], old_items: vec![item] }
  }

  pub fn reset() -> Self {
    Self { action: CollectionAction::Reset, new_items: Vec::new(), old_items: Vec::new() }
  }

  #[inline]
  pub fn is_reset(&self) -> bool { self.action == CollectionAction::Reset }
}
