//! Snapshot store: the last value observed for every property of every
//! tracked property-observable object.
//!
//! Serves two purposes: suppressing notifications that reassign an equal
//! value, and remembering which child objects hang off an owner so they can be
//! detached when the property changes again or the owner goes away.
use std::rc::Rc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::value::{ObjectId, Value};

/// Properties of one owner, in the order they were first recorded.
pub(crate) type PropertyValues = SmallVec<[(Rc<str>, Value); 4]>;

#[derive(Default)]
pub(crate) struct SnapshotStore {
  owners: FxHashMap<ObjectId, PropertyValues>,
}

impl SnapshotStore {
  /// Stores `value` as the last observed value of `owner.name`, returning the
  /// value it replaces.
  pub(crate) fn record(&mut self, owner: ObjectId, name: &str, value: Value) -> Option<Value> {
    let properties = self.owners.entry(owner).or_default();
    match properties.iter_mut().find(|(n, _)| &**n == name) {
      Some((_, slot)) => Some(std::mem::replace(slot, value)),
      None => {
        properties.push((name.into(), value));
        None
      }
    }
  }

  pub(crate) fn get(&self, owner: ObjectId, name: &str) -> Option<&Value> {
    self.owners.get(&owner)?.iter().find(|(n, _)| &**n == name).map(|(_, v)| v)
  }

  /// Removes and returns every snapshot of `owner`.
  pub(crate) fn take(&mut self, owner: ObjectId) -> PropertyValues {
    self.owners.remove(&owner).unwrap_or_default()
  }

  #[inline]
  pub(crate) fn is_empty(&self) -> bool { self.owners.is_empty() }

  /// Removes every owner's snapshots at once.
  pub(crate) fn drain(&mut self) -> Vec<(ObjectId, PropertyValues)> {
    self.owners.drain().collect()
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::{notify::Trackable, value::ObjectRef};

  struct Owner;
  impl Trackable for Owner {}

  #[test]
  fn record_replaces_and_preserves_order() {
    let obj: ObjectRef = Rc::new(Owner);
    let id = ObjectId::of(&obj);
    let mut store = SnapshotStore::default();

    assert_eq!(store.record(id, "B", 1.into()), None);
    assert_eq!(store.record(id, "A", 2.into()), None);
    assert_eq!(store.record(id, "B", 3.into()), Some(Value::Int(1)));
    assert_eq!(store.get(id, "B"), Some(&Value::Int(3)));
    assert_eq!(store.get(id, "C"), None);

    let names: Vec<_> = store.take(id).into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec![Rc::<str>::from("B"), Rc::from("A")]);
    assert!(store.get(id, "a").is_none());
    assert!(store.is_empty());
  }
}
