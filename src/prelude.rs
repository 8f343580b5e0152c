//! Prelude module for convenient imports

pub use crate::{
  bag::PropertyBag,
  collection::{ObservableVec, COUNT, INDEXER},
  detector::{ChangeDetector, ChangeDetectorBuilder},
  error::{ChangeDetectionError, PropertyError},
  listeners::{ListenerId, Listeners},
  notify::{
    CollectionAction, CollectionChange, CollectionListener, CollectionObservable,
    PropertyListener, PropertyObservable, Trackable,
  },
  value::{ObjectId, ObjectRef, Value},
};
