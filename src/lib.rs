//! # change-detector: observer-graph change detection
//!
//! Point a [`ChangeDetector`] at the root of an object graph and give it one
//! callback. It subscribes to every property- or collection-observable object
//! reachable from the root, keeps those subscriptions in step as the graph is
//! rewired, and calls the callback once per real change.
//!
//! ```rust
//! use std::{cell::Cell, rc::Rc};
//! use change_detector::prelude::*;
//!
//! let group = Rc::new(PropertyBag::new().with("Name", "Admins"));
//! let renders = Rc::new(Cell::new(0));
//! let r = renders.clone();
//! let detector = ChangeDetector::create(&group, move || r.set(r.get() + 1));
//!
//! group.set("Name", "Admins"); // equal value: suppressed
//! group.set("Name", "Owners");
//! assert_eq!(renders.get(), 1);
//!
//! detector.dispose();
//! group.set("Name", "Guests");
//! assert_eq!(renders.get(), 1);
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Trackable`] | Base trait of every graph member; inert by default |
//! | [`PropertyObservable`] | Announces property changes by name |
//! | [`CollectionObservable`] | Announces added and removed elements |
//! | [`ChangeDetector`] | Walks the graph and forwards changes to one callback |
//! | [`ObservableVec`] / [`PropertyBag`] | Ready-made observables |
//!
//! The crate is single-threaded: everything is built on `Rc` and `RefCell`,
//! and notifications are handled synchronously and reentrantly.
//!
//! [`Trackable`]: notify::Trackable
//! [`PropertyObservable`]: notify::PropertyObservable
//! [`CollectionObservable`]: notify::CollectionObservable
//! [`ChangeDetector`]: detector::ChangeDetector
//! [`ObservableVec`]: collection::ObservableVec
//! [`PropertyBag`]: bag::PropertyBag
pub mod bag;
pub mod collection;
pub mod detector;
pub mod error;
pub mod listeners;
pub mod notify;
pub mod prelude;
mod snapshot;
mod tracking;
pub mod value;

pub use prelude::*;
