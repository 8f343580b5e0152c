//! The change detector: attach/detach traversal, notification handling and
//! disposal.
use std::{
  cell::{Cell, RefCell},
  fmt::{Debug, Formatter},
  rc::{Rc, Weak},
};

use tracing::{debug, trace, warn};

use crate::{
  error::{ChangeDetectionError, PropertyError, Result},
  notify::{CollectionChange, CollectionListener, PropertyListener, Trackable},
  snapshot::SnapshotStore,
  tracking::{Release, TrackedEntry, TrackingTable},
  value::{ObjectId, ObjectRef, Value},
};

/// Watches every observable object reachable from a root and calls one
/// callback whenever any of them changes.
///
/// Objects are discovered through [`PropertyObservable::properties`] of
/// property-observable owners and [`CollectionObservable::items`] of
/// collection-observable owners. Objects with neither capability are leaves:
/// they are not tracked and nothing inside them is visited.
///
/// Each tracked object carries a reference count of the attach paths that
/// reach it, so shared and cyclic references are subscribed once and
/// unsubscribed only when the last path goes away.
///
/// The detector is disposed when dropped.
///
/// ```rust
/// use std::{cell::Cell, rc::Rc};
/// use change_detector::prelude::*;
///
/// let users = Rc::new(ObservableVec::new());
/// let renders = Rc::new(Cell::new(0));
/// let r = renders.clone();
/// let detector = ChangeDetector::create(&users, move || r.set(r.get() + 1));
///
/// let user = Rc::new(PropertyBag::new().with("Name", "I"));
/// users.push(&user);
/// assert_eq!(detector.tracked_count(), 2);
///
/// let before = renders.get();
/// user.set("Name", "You");
/// assert_eq!(renders.get(), before + 1);
/// ```
///
/// [`PropertyObservable::properties`]: crate::notify::PropertyObservable::properties
/// [`CollectionObservable::items`]: crate::notify::CollectionObservable::items
pub struct ChangeDetector {
  inner: Rc<Inner>,
}

/// Configures and constructs a [`ChangeDetector`].
#[derive(Default)]
pub struct ChangeDetectorBuilder {
  root: Value,
  on_changed: Option<Rc<dyn Fn()>>,
  label: Option<String>,
}

#[derive(Default)]
struct Tables {
  tracking: TrackingTable,
  snapshots: SnapshotStore,
}

struct Inner {
  tables: RefCell<Tables>,
  root: RefCell<Value>,
  on_changed: Rc<dyn Fn()>,
  disposed: Cell<bool>,
  label: Option<String>,
}

impl ChangeDetectorBuilder {
  /// The object graph to observe. Defaults to [`Value::Null`].
  pub fn root(mut self, root: impl Into<Value>) -> Self {
    self.root = root.into();
    self
  }

  /// The callback invoked once per observed change. Required.
  pub fn on_changed(mut self, on_changed: impl Fn() + 'static) -> Self {
    self.on_changed = Some(Rc::new(on_changed));
    self
  }

  /// A name attached to the detector's log events.
  pub fn label(mut self, label: impl Into<String>) -> Self {
    self.label = Some(label.into());
    self
  }

  /// Builds the detector and attaches the root.
  ///
  /// Fails with [`ChangeDetectionError::MissingCallback`] if no callback was
  /// given; nothing is subscribed in that case.
  pub fn build(mut self) -> Result<ChangeDetector> {
    let on_changed = self.on_changed.take().ok_or(ChangeDetectionError::MissingCallback)?;
    Ok(self.build_with(on_changed))
  }

  fn build_with(self, on_changed: Rc<dyn Fn()>) -> ChangeDetector {
    let inner = Rc::new(Inner {
      tables: RefCell::default(),
      root: RefCell::new(self.root.clone()),
      on_changed,
      disposed: Cell::new(false),
      label: self.label,
    });
    inner.attach(&self.root);
    debug!(
      label = inner.label.as_deref(),
      tracked = inner.tables.borrow().tracking.len(),
      "change detector created"
    );
    ChangeDetector { inner }
  }
}

impl Debug for ChangeDetectorBuilder {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ChangeDetectorBuilder")
      .field("root", &self.root)
      .field("on_changed", &self.on_changed.is_some())
      .field("label", &self.label)
      .finish()
  }
}

impl ChangeDetector {
  /// Starts configuring a detector; see [`ChangeDetectorBuilder`].
  pub fn builder() -> ChangeDetectorBuilder { ChangeDetectorBuilder::default() }

  /// Observes `root`, calling `on_changed` after every change.
  pub fn create(root: impl Into<Value>, on_changed: impl Fn() + 'static) -> Self {
    Self::builder().root(root).build_with(Rc::new(on_changed))
  }

  /// Starts observing `value` and everything reachable from it.
  ///
  /// Returns `true` only when this call started tracking `value`. Attaching
  /// an already tracked object just raises its reference count and returns
  /// `false`, as does attaching a scalar or an object without capabilities.
  pub fn attach(&self, value: impl Into<Value>) -> bool { self.inner.attach(&value.into()) }

  /// Drops one reference to `value`.
  ///
  /// When the last reference goes, `value` is unsubscribed and its children
  /// are detached in turn. Returns whether `value` was tracked before the
  /// call, whether or not this call released it.
  pub fn detach(&self, value: impl Into<Value>) -> bool { self.inner.detach(&value.into()) }

  /// Number of distinct tracked objects.
  pub fn tracked_count(&self) -> usize { self.inner.tables.borrow().tracking.len() }

  /// Whether `value` is an object currently reached by at least one attach.
  pub fn is_tracked(&self, value: impl Into<Value>) -> bool {
    match value.into() {
      Value::Object(obj) => self.inner.tables.borrow().tracking.contains(ObjectId::of(&obj)),
      _ => false,
    }
  }

  /// Number of attach paths currently reaching `value`; zero when untracked.
  pub fn reference_count(&self, value: impl Into<Value>) -> usize {
    match value.into() {
      Value::Object(obj) => self.inner.tables.borrow().tracking.count_of(ObjectId::of(&obj)),
      _ => 0,
    }
  }

  /// The label given to the builder, if any.
  pub fn label(&self) -> Option<&str> { self.inner.label.as_deref() }

  #[inline]
  pub fn is_disposed(&self) -> bool { self.inner.disposed.get() }

  /// Unsubscribes from everything and empties both tables.
  ///
  /// Idempotent. Afterwards the callback is never invoked again and
  /// [`attach`](Self::attach) is a no-op.
  pub fn dispose(&self) { self.inner.dispose() }
}

impl Drop for ChangeDetector {
  fn drop(&mut self) { self.inner.dispose() }
}

impl Debug for ChangeDetector {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ChangeDetector")
      .field("label", &self.inner.label)
      .field("tracked", &self.tracked_count())
      .field("disposed", &self.is_disposed())
      .finish()
  }
}

// No `tables` borrow is ever held across a call into an observed object or
// into `on_changed`: getters, listeners and the callback may all reenter.
impl Inner {
  fn attach(self: &Rc<Self>, value: &Value) -> bool {
    let Value::Object(obj) = value else { return false };
    if self.disposed.get() {
      trace!(type_name = obj.type_name(), "attach after dispose ignored");
      return false;
    }
    let id = ObjectId::of(obj);
    if self.tables.borrow_mut().tracking.retain(id) {
      trace!(
        type_name = obj.type_name(),
        count = self.tables.borrow().tracking.count_of(id),
        "already tracked"
      );
      return false;
    }

    if let Some(observable) = obj.as_property_observable() {
      self.tables.borrow_mut().tracking.insert(id, obj);
      for name in observable.properties() {
        let child = match observable.property(&name) {
          Ok(child) => child,
          Err(err) => {
            log_read_error(&err);
            continue;
          }
        };
        let replaced = {
          let mut tables = self.tables.borrow_mut();
          if !tables.tracking.contains(id) {
            // Released while its own properties were being walked.
            break;
          }
          tables.snapshots.record(id, &name, child.clone())
        };
        self.attach(&child);
        if let Some(replaced) = replaced {
          self.detach(&replaced);
        }
      }
      let listener = observable.add_property_listener(self.property_listener(obj));
      let stale = self.tables.borrow_mut().tracking.set_property_listener(id, listener);
      if let Some(listener) = stale {
        observable.remove_property_listener(listener);
      }
    }

    if let Some(observable) = obj.as_collection_observable() {
      self.tables.borrow_mut().tracking.insert(id, obj);
      for item in observable.items() {
        self.attach(&item);
      }
      let listener = observable.add_collection_listener(self.collection_listener(obj));
      let stale = self.tables.borrow_mut().tracking.set_collection_listener(id, listener);
      if let Some(listener) = stale {
        observable.remove_collection_listener(listener);
      }
    }

    let tracked = self.tables.borrow().tracking.contains(id);
    if tracked {
      trace!(type_name = obj.type_name(), "attached");
    }
    tracked
  }

  fn detach(self: &Rc<Self>, value: &Value) -> bool {
    let Value::Object(obj) = value else { return false };
    let id = ObjectId::of(obj);
    let release = self.tables.borrow_mut().tracking.release(id);
    match release {
      Release::Untracked => false,
      Release::Retained(count) => {
        trace!(type_name = obj.type_name(), count, "reference released");
        true
      }
      Release::Removed(entry) => {
        self.unsubscribe(id, entry);
        true
      }
    }
  }

  /// Tears down an object whose last reference was released.
  fn unsubscribe(self: &Rc<Self>, id: ObjectId, entry: TrackedEntry) {
    let obj = &entry.object;
    if let (Some(observable), Some(listener)) =
      (obj.as_property_observable(), entry.property_listener)
    {
      observable.remove_property_listener(listener);
    }
    let children = self.tables.borrow_mut().snapshots.take(id);
    for (_, child) in children {
      self.detach(&child);
    }
    if let Some(observable) = obj.as_collection_observable() {
      if let Some(listener) = entry.collection_listener {
        observable.remove_collection_listener(listener);
      }
      for item in observable.items() {
        self.detach(&item);
      }
    }
    trace!(type_name = obj.type_name(), "detached");
  }

  fn on_property_changed(self: &Rc<Self>, sender: &ObjectRef, name: &str) {
    if !self.accepts(sender) {
      return;
    }
    let Some(observable) = sender.as_property_observable() else { return };
    let id = ObjectId::of(sender);

    match observable.property(name) {
      Ok(value) => {
        let previous = self.tables.borrow().snapshots.get(id, name).cloned();
        if let Some(previous) = &previous {
          if *previous == value {
            trace!(type_name = sender.type_name(), property = name, "value unchanged");
            return;
          }
          self.detach(previous);
        }
        // Detaching the previous value may have released the sender itself
        // (a self reference holding its last count).
        if self.tables.borrow().tracking.contains(id) {
          self.attach(&value);
          let replaced = self.tables.borrow_mut().snapshots.record(id, name, value);
          // A reentrant notification recorded and attached its own value in
          // the meantime.
          if let Some(replaced) = replaced.filter(|r| Some(r) != previous.as_ref()) {
            self.detach(&replaced);
          }
        }
      }
      Err(err) => log_read_error(&err),
    }

    self.notify_changed();
  }

  fn on_collection_changed(self: &Rc<Self>, sender: &ObjectRef, change: &CollectionChange) {
    if !self.accepts(sender) {
      return;
    }
    if change.is_reset() {
      warn!(
        type_name = sender.type_name(),
        "reset notifications are not supported; tracked elements are left as they were"
      );
    } else {
      for item in &change.new_items {
        self.attach(item);
      }
      for item in &change.old_items {
        self.detach(item);
      }
    }

    self.notify_changed();
  }

  /// Whether a notification from `sender` should be handled at all.
  fn accepts(&self, sender: &ObjectRef) -> bool {
    if self.disposed.get() {
      trace!(type_name = sender.type_name(), "notification after dispose ignored");
      return false;
    }
    if !self.tables.borrow().tracking.contains(ObjectId::of(sender)) {
      trace!(type_name = sender.type_name(), "notification from untracked object ignored");
      return false;
    }
    true
  }

  fn notify_changed(&self) {
    if !self.disposed.get() {
      (self.on_changed)();
    }
  }

  fn property_listener(self: &Rc<Self>, sender: &ObjectRef) -> PropertyListener {
    let (detector, sender) = (Rc::downgrade(self), Rc::downgrade(sender));
    Box::new(move |name: &str| {
      if let Some((detector, sender)) = upgrade(&detector, &sender) {
        detector.on_property_changed(&sender, name);
      }
    })
  }

  fn collection_listener(self: &Rc<Self>, sender: &ObjectRef) -> CollectionListener {
    let (detector, sender) = (Rc::downgrade(self), Rc::downgrade(sender));
    Box::new(move |change: &CollectionChange| {
      if let Some((detector, sender)) = upgrade(&detector, &sender) {
        detector.on_collection_changed(&sender, change);
      }
    })
  }

  fn dispose(self: &Rc<Self>) {
    if self.disposed.replace(true) {
      return;
    }
    let root = self.root.take();
    self.detach(&root);

    // Whatever the root no longer reaches is held by cycles or by explicit
    // attaches; release every remaining count.
    loop {
      let ids = self.tables.borrow().tracking.ids();
      if ids.is_empty() {
        break;
      }
      for id in ids {
        loop {
          let obj = self.tables.borrow().tracking.object(id);
          let Some(obj) = obj else { break };
          self.detach(&Value::Object(obj));
        }
      }
    }

    let leftovers = self.tables.borrow_mut().snapshots.drain();
    for (_, properties) in leftovers {
      for (_, child) in properties {
        self.detach(&child);
      }
    }
    debug_assert!({
      let tables = self.tables.borrow();
      tables.tracking.is_empty() && tables.snapshots.is_empty()
    });
    debug!(label = self.label.as_deref(), "change detector disposed");
  }
}

fn upgrade(detector: &Weak<Inner>, sender: &Weak<dyn Trackable>) -> Option<(Rc<Inner>, ObjectRef)> {
  Some((detector.upgrade()?, sender.upgrade()?))
}

fn log_read_error(err: &PropertyError) {
  match err {
    PropertyError::Unknown { type_name, property } => {
      trace!(type_name = *type_name, property = property.as_str(), "property is not readable")
    }
    PropertyError::ReadFailed { type_name, property, reason } => warn!(
      type_name = *type_name,
      property = property.as_str(),
      reason = reason.as_str(),
      "failed to read property value"
    ),
  }
}
