//! Tracking table: which objects the detector is subscribed to, and how many
//! live attach paths reach each of them.
use rustc_hash::FxHashMap;

use crate::{
  listeners::ListenerId,
  value::{ObjectId, ObjectRef},
};

/// One tracked object.
pub(crate) struct TrackedEntry {
  pub(crate) object: ObjectRef,
  /// Number of still-active attach paths. Always `>= 1` while in the table.
  pub(crate) count: usize,
  pub(crate) property_listener: Option<ListenerId>,
  pub(crate) collection_listener: Option<ListenerId>,
}

/// Outcome of [`TrackingTable::release`].
pub(crate) enum Release {
  /// The object was not tracked.
  Untracked,
  /// Still referenced by other paths; nothing to unsubscribe yet.
  Retained(usize),
  /// Last reference gone. The entry has been removed from the table.
  Removed(TrackedEntry),
}

#[derive(Default)]
pub(crate) struct TrackingTable {
  entries: FxHashMap<ObjectId, TrackedEntry>,
}

impl TrackingTable {
  /// Bumps the count of an already tracked object. Returns `false` if `id` is
  /// not tracked.
  pub(crate) fn retain(&mut self, id: ObjectId) -> bool {
    match self.entries.get_mut(&id) {
      Some(entry) => {
        entry.count += 1;
        true
      }
      None => false,
    }
  }

  /// Starts tracking `object` with a count of one. Does nothing if it is
  /// already tracked.
  pub(crate) fn insert(&mut self, id: ObjectId, object: &ObjectRef) {
    self.entries.entry(id).or_insert_with(|| TrackedEntry {
      object: object.clone(),
      count: 1,
      property_listener: None,
      collection_listener: None,
    });
  }

  pub(crate) fn release(&mut self, id: ObjectId) -> Release {
    let Some(entry) = self.entries.get_mut(&id) else { return Release::Untracked };
    entry.count -= 1;
    if entry.count > 0 {
      return Release::Retained(entry.count);
    }
    match self.entries.remove(&id) {
      Some(entry) => Release::Removed(entry),
      None => Release::Untracked,
    }
  }

  /// Records the property listener registered for `id`. Hands the listener id
  /// back if the object is no longer tracked, so the caller can unregister it.
  pub(crate) fn set_property_listener(
    &mut self,
    id: ObjectId,
    listener: ListenerId,
  ) -> Option<ListenerId> {
    match self.entries.get_mut(&id) {
      Some(entry) => {
        entry.property_listener = Some(listener);
        None
      }
      None => Some(listener),
    }
  }

  /// Collection counterpart of [`Self::set_property_listener`].
  pub(crate) fn set_collection_listener(
    &mut self,
    id: ObjectId,
    listener: ListenerId,
  ) -> Option<ListenerId> {
    match self.entries.get_mut(&id) {
      Some(entry) => {
        entry.collection_listener = Some(listener);
        None
      }
      None => Some(listener),
    }
  }

  #[inline]
  pub(crate) fn contains(&self, id: ObjectId) -> bool { self.entries.contains_key(&id) }

  #[inline]
  pub(crate) fn count_of(&self, id: ObjectId) -> usize {
    self.entries.get(&id).map_or(0, |e| e.count)
  }

  pub(crate) fn object(&self, id: ObjectId) -> Option<ObjectRef> {
    self.entries.get(&id).map(|e| e.object.clone())
  }

  /// Number of distinct tracked identities.
  #[inline]
  pub(crate) fn len(&self) -> usize { self.entries.len() }

  #[inline]
  pub(crate) fn is_empty(&self) -> bool { self.entries.is_empty() }

  /// Copy of the key set, safe to iterate while the table is mutated.
  pub(crate) fn ids(&self) -> Vec<ObjectId> { self.entries.keys().copied().collect() }
}

#[cfg(test)]
mod test {
  use std::rc::Rc;

  use super::*;
  use crate::notify::Trackable;

  struct Node;
  impl Trackable for Node {}

  fn node() -> (ObjectId, ObjectRef) {
    let obj: ObjectRef = Rc::new(Node);
    (ObjectId::of(&obj), obj)
  }

  #[test]
  fn counts_multiplicity() {
    let mut table = TrackingTable::default();
    let (id, obj) = node();

    assert!(!table.retain(id));
    table.insert(id, &obj);
    assert!(table.retain(id));
    assert!(table.retain(id));
    assert_eq!(table.count_of(id), 3);
    assert_eq!(table.len(), 1);

    assert!(matches!(table.release(id), Release::Retained(2)));
    assert!(matches!(table.release(id), Release::Retained(1)));
    assert!(matches!(table.release(id), Release::Removed(_)));
    assert!(matches!(table.release(id), Release::Untracked));
    assert!(table.is_empty());
  }

  #[test]
  fn insert_keeps_existing_count() {
    let mut table = TrackingTable::default();
    let (id, obj) = node();
    table.insert(id, &obj);
    table.retain(id);
    table.insert(id, &obj);
    assert_eq!(table.count_of(id), 2);
  }

  #[test]
  fn listener_on_untracked_object_is_handed_back() {
    let mut table = TrackingTable::default();
    let (id, obj) = node();
    let listeners = crate::listeners::Listeners::<dyn Fn()>::new();
    let lid = listeners.add(Rc::new(|| {}));

    assert_eq!(table.set_property_listener(id, lid), Some(lid));
    table.insert(id, &obj);
    assert_eq!(table.set_property_listener(id, lid), None);
    match table.release(id) {
      Release::Removed(entry) => assert_eq!(entry.property_listener, Some(lid)),
      _ => panic!("expected removal"),
    }
  }
}
