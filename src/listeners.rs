use std::{
  cell::{Cell, RefCell},
  fmt::{Debug, Formatter},
  rc::Rc,
};

use smallvec::SmallVec;

/// Handle returned when a listener is registered, used to unregister it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ListenerId(usize);

/// A container of listeners with ID-based removal.
///
/// This is the building block observable types use to implement
/// [`PropertyObservable`](crate::notify::PropertyObservable) and
/// [`CollectionObservable`](crate::notify::CollectionObservable).
///
/// # Design
///
/// - **SmallVec Optimization**: most observed objects have zero to two
///   listeners (typically one per detector watching them), so the list is kept
///   inline.
/// - **Reentrancy**: [`broadcast`](Self::broadcast) iterates a copy of the
///   list. A listener may add or remove listeners on the same container (the
///   detector does exactly that when a change detaches the sender's own
///   subgraph). A listener removed during a broadcast is still called for that
///   round, the way a multicast delegate behaves.
pub struct Listeners<L: ?Sized> {
  next_id: Cell<usize>,
  items: RefCell<SmallVec<[(ListenerId, Rc<L>); 2]>>,
}

impl<L: ?Sized> Default for Listeners<L> {
  fn default() -> Self { Self { next_id: Cell::new(0), items: RefCell::new(SmallVec::new()) } }
}

impl<L: ?Sized> Listeners<L> {
  #[inline]
  pub fn new() -> Self { Self::default() }

  /// Add a listener and return its unique ID.
  pub fn add(&self, listener: Rc<L>) -> ListenerId {
    let id = ListenerId(self.next_id.get());
    self.next_id.set(id.0 + 1);
    self.items.borrow_mut().push((id, listener));
    id
  }

  /// Remove a listener by ID.
  pub fn remove(&self, id: ListenerId) -> Option<Rc<L>> {
    let mut items = self.items.borrow_mut();
    let pos = items.iter().position(|(i, _)| *i == id)?;
    Some(items.remove(pos).1)
  }

  #[inline]
  pub fn contains(&self, id: ListenerId) -> bool {
    self.items.borrow().iter().any(|(i, _)| *i == id)
  }

  #[inline]
  pub fn len(&self) -> usize { self.items.borrow().len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.items.borrow().is_empty() }

  /// Copy of the current listeners, detached from the container's borrow.
  pub fn snapshot(&self) -> SmallVec<[Rc<L>; 2]> {
    self.items.borrow().iter().map(|(_, l)| l.clone()).collect()
  }

  /// Call `f` with every listener registered when the broadcast starts.
  pub fn broadcast(&self, mut f: impl FnMut(&L)) {
    for listener in self.snapshot() {
      f(&*listener);
    }
  }
}

impl<L: ?Sized> Debug for Listeners<L> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Listeners").field("len", &self.len()).finish()
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn add_remove() {
    let listeners: Listeners<dyn Fn(&str)> = Listeners::new();
    let a = listeners.add(Rc::new(|_: &str| {}));
    let b = listeners.add(Rc::new(|_: &str| {}));
    assert_ne!(a, b);
    assert_eq!(listeners.len(), 2);

    assert!(listeners.remove(a).is_some());
    assert!(listeners.remove(a).is_none());
    assert!(!listeners.contains(a));
    assert!(listeners.contains(b));
    assert_eq!(listeners.len(), 1);
  }

  #[test]
  fn ids_are_not_reused() {
    let listeners: Listeners<dyn Fn()> = Listeners::new();
    let a = listeners.add(Rc::new(|| {}));
    listeners.remove(a);
    let b = listeners.add(Rc::new(|| {}));
    assert_ne!(a, b);
  }

  #[test]
  fn broadcast_tolerates_reentrant_removal() {
    let listeners: Rc<Listeners<dyn Fn()>> = Rc::new(Listeners::new());
    let calls = Rc::new(Cell::new(0));

    let first = Rc::new(Cell::new(None));
    let (l, c, f) = (listeners.clone(), calls.clone(), first.clone());
    let id = listeners.add(Rc::new(move || {
      c.set(c.get() + 1);
      if let Some(id) = f.get() {
        l.remove(id);
      }
    }));
    first.set(Some(id));

    let c = calls.clone();
    listeners.add(Rc::new(move || c.set(c.get() + 1)));

    listeners.broadcast(|l| l());
    assert_eq!(calls.get(), 2);
    assert_eq!(listeners.len(), 1);

    listeners.broadcast(|l| l());
    assert_eq!(calls.get(), 3);
  }
}
