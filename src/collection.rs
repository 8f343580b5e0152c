use std::{borrow::Cow, cell::RefCell};

use crate::{
  error::PropertyError,
  listeners::{ListenerId, Listeners},
  notify::{
    CollectionChange, CollectionListener, CollectionObservable, PropertyListener,
    PropertyObservable, Trackable,
  },
  value::Value,
};

/// Name of the element-count property.
pub const COUNT: &str = "Count";
/// Name announced for indexer changes. Not a readable property.
pub const INDEXER: &str = "Item[]";

/// A vector that announces its mutations.
///
/// It is both property- and collection-observable. Every mutation raises, in
/// order:
///
/// 1. a [`COUNT`] property change, when the length changed,
/// 2. an [`INDEXER`] property change,
/// 3. one [`CollectionChange`].
///
/// [`clear`](Self::clear) announces a `Remove` of every element instead of a
/// `Reset`, so observers can release exactly what left.
///
/// No borrow is held while listeners run; they may read or mutate the vector.
#[derive(Default)]
pub struct ObservableVec {
  items: RefCell<Vec<Value>>,
  pub(crate) property_changed: Listeners<dyn Fn(&str)>,
  pub(crate) collection_changed: Listeners<dyn Fn(&CollectionChange)>,
}

impl ObservableVec {
  #[inline]
  pub fn new() -> Self { Self::default() }

  pub fn from_values<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
    let vec = Self::default();
    vec.items.borrow_mut().extend(values.into_iter().map(Into::into));
    vec
  }

  #[inline]
  pub fn len(&self) -> usize { self.items.borrow().len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.items.borrow().is_empty() }

  pub fn get(&self, index: usize) -> Option<Value> { self.items.borrow().get(index).cloned() }

  pub fn to_vec(&self) -> Vec<Value> { self.items.borrow().clone() }

  /// Number of registered property and collection listeners.
  pub fn listener_count(&self) -> usize {
    self.property_changed.len() + self.collection_changed.len()
  }

  pub fn push(&self, value: impl Into<Value>) {
    let value = value.into();
    self.items.borrow_mut().push(value.clone());
    self.raise(true, CollectionChange::added(vec![value]));
  }

  /// Inserts at `index`, or returns `false` without announcing anything if
  /// `index > len`.
  pub fn insert(&self, index: usize, value: impl Into<Value>) -> bool {
    let value = value.into();
    {
      let mut items = self.items.borrow_mut();
      if index > items.len() {
        return false;
      }
      items.insert(index, value.clone());
    }
    self.raise(true, CollectionChange::added(vec![value]));
    true
  }

  /// Removes the element at `index`, or returns `None` if out of bounds.
  pub fn remove(&self, index: usize) -> Option<Value> {
    let removed = {
      let mut items = self.items.borrow_mut();
      (index < items.len()).then(|| items.remove(index))
    }?;
    self.raise(true, CollectionChange::removed(vec![removed.clone()]));
    Some(removed)
  }

  /// Replaces the element at `index`, returning the previous one.
  pub fn set(&self, index: usize, value: impl Into<Value>) -> Option<Value> {
    let value = value.into();
    let old = {
      let mut items = self.items.borrow_mut();
      let slot = items.get_mut(index)?;
      std::mem::replace(slot, value.clone())
    };
    self.raise(false, CollectionChange::replaced(value, old.clone()));
    Some(old)
  }

  /// Moves the element at `from` so it ends up at `to`.
  pub fn move_item(&self, from: usize, to: usize) -> bool {
    let moved = {
      let mut items = self.items.borrow_mut();
      if from >= items.len() || to >= items.len() {
        return false;
      }
      let item = items.remove(from);
      items.insert(to, item.clone());
      item
    };
    self.raise(false, CollectionChange::moved(moved));
    true
  }

  pub fn clear(&self) {
    let removed = std::mem::take(&mut *self.items.borrow_mut());
    let count_changed = !removed.is_empty();
    self.raise(count_changed, CollectionChange::removed(removed));
  }

  fn raise(&self, count_changed: bool, change: CollectionChange) {
    if count_changed {
      self.property_changed.broadcast(|l| l(COUNT));
    }
    self.property_changed.broadcast(|l| l(INDEXER));
    self.collection_changed.broadcast(|l| l(&change));
  }
}

impl<V: Into<Value>> FromIterator<V> for ObservableVec {
  fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self { Self::from_values(iter) }
}

impl Trackable for ObservableVec {
  fn type_name(&self) -> &'static str { "ObservableVec" }

  fn as_property_observable(&self) -> Option<&dyn PropertyObservable> { Some(self) }

  fn as_collection_observable(&self) -> Option<&dyn CollectionObservable> { Some(self) }
}

impl PropertyObservable for ObservableVec {
  fn properties(&self) -> Vec<Cow<'static, str>> { vec![Cow::Borrowed(COUNT)] }

  fn property(&self, name: &str) -> Result<Value, PropertyError> {
    match name {
      COUNT => Ok(Value::Int(self.len() as i64)),
      _ => Err(PropertyError::unknown(self.type_name(), name)),
    }
  }

  fn add_property_listener(&self, listener: PropertyListener) -> ListenerId {
    self.property_changed.add(listener.into())
  }

  fn remove_property_listener(&self, id: ListenerId) -> bool {
    self.property_changed.remove(id).is_some()
  }
}

impl CollectionObservable for ObservableVec {
  fn items(&self) -> Vec<Value> { self.to_vec() }

  fn add_collection_listener(&self, listener: CollectionListener) -> ListenerId {
    self.collection_changed.add(listener.into())
  }

  fn remove_collection_listener(&self, id: ListenerId) -> bool {
    self.collection_changed.remove(id).is_some()
  }
}
