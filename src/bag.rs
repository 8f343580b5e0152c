use std::{borrow::Cow, cell::RefCell, rc::Rc};

use crate::{
  error::PropertyError,
  listeners::{ListenerId, Listeners},
  notify::{PropertyListener, PropertyObservable, Trackable},
  value::Value,
};

/// A record of named, dynamically typed properties that announces every
/// assignment.
///
/// Stands in for a hand-written model type when the shape of the data is only
/// known at runtime.
///
/// ```rust
/// use std::rc::Rc;
/// use change_detector::prelude::*;
///
/// let user = Rc::new(PropertyBag::new().with("Id", "1").with("Name", "I"));
/// user.set("Name", "You");
/// assert_eq!(user.get("Name"), Some(Value::from("You")));
/// ```
#[derive(Default)]
pub struct PropertyBag {
  values: RefCell<Vec<(Rc<str>, Value)>>,
  property_changed: Listeners<dyn Fn(&str)>,
}

impl PropertyBag {
  #[inline]
  pub fn new() -> Self { Self::default() }

  /// Declares a property with an initial value, without notifying.
  pub fn with(self, name: &str, value: impl Into<Value>) -> Self {
    self.store(name, value.into());
    self
  }

  pub fn get(&self, name: &str) -> Option<Value> {
    self.values.borrow().iter().find(|(n, _)| &**n == name).map(|(_, v)| v.clone())
  }

  /// Assigns a property, declaring it if needed, and announces the change.
  ///
  /// The change is announced even when the new value equals the old one, the
  /// way a plain setter behaves; deciding whether anything changed is the
  /// observer's job.
  pub fn set(&self, name: &str, value: impl Into<Value>) {
    self.store(name, value.into());
    self.property_changed.broadcast(|l| l(name));
  }

  /// Removes a property, returning its last value.
  ///
  /// The property is first announced as `Null`, so observers release whatever
  /// it held, and then dropped from the bag. A listener that reassigns the
  /// property during that announcement keeps it declared.
  pub fn remove_property(&self, name: &str) -> Option<Value> {
    let old = self.get(name)?;
    self.set(name, Value::Null);
    let removed = {
      let mut values = self.values.borrow_mut();
      let index = values.iter().position(|(n, v)| &**n == name && v.is_null());
      index.map(|index| values.remove(index))
    };
    drop(removed);
    Some(old)
  }

  /// Number of registered property listeners.
  pub fn listener_count(&self) -> usize { self.property_changed.len() }

  pub fn names(&self) -> Vec<Rc<str>> {
    self.values.borrow().iter().map(|(n, _)| n.clone()).collect()
  }

  fn store(&self, name: &str, value: Value) {
    let old = {
      let mut values = self.values.borrow_mut();
      match values.iter_mut().find(|(n, _)| &**n == name) {
        Some((_, slot)) => Some(std::mem::replace(slot, value)),
        None => {
          values.push((name.into(), value));
          None
        }
      }
    };
    // Dropped outside the borrow: releasing an object may reenter this bag.
    drop(old);
  }
}

impl Trackable for PropertyBag {
  fn type_name(&self) -> &'static str { "PropertyBag" }

  fn as_property_observable(&self) -> Option<&dyn PropertyObservable> { Some(self) }
}

impl PropertyObservable for PropertyBag {
  fn properties(&self) -> Vec<Cow<'static, str>> {
    self.values.borrow().iter().map(|(n, _)| Cow::Owned(n.to_string())).collect()
  }

  fn property(&self, name: &str) -> Result<Value, PropertyError> {
    self.get(name).ok_or_else(|| PropertyError::unknown(self.type_name(), name))
  }

  fn add_property_listener(&self, listener: PropertyListener) -> ListenerId {
    self.property_changed.add(listener.into())
  }

  fn remove_property_listener(&self, id: ListenerId) -> bool {
    self.property_changed.remove(id).is_some()
  }
}
