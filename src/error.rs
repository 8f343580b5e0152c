//! Error types.
//!
//! Only construction can fail from the caller's point of view. Property
//! read errors are produced by [`PropertyObservable`] implementations and are
//! recovered inside the detector: they are logged and the property is treated
//! as absent for that traversal step.
//!
//! [`PropertyObservable`]: crate::notify::PropertyObservable
use thiserror::Error;

/// Failure to construct a [`ChangeDetector`](crate::detector::ChangeDetector).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChangeDetectionError {
  /// The builder was finished without an `on_changed` callback.
  #[error("invalid argument: an `on_changed` callback is required")]
  MissingCallback,
}

/// Failure to read a property through
/// [`PropertyObservable::property`](crate::notify::PropertyObservable::property).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PropertyError {
  /// The object has no readable, non-indexed property with this name.
  ///
  /// Raised for indexer notifications such as `Item[]`.
  #[error("`{type_name}` has no readable property `{property}`")]
  Unknown { type_name: &'static str, property: String },

  /// The getter exists but failed.
  #[error("reading `{type_name}.{property}` failed: {reason}")]
  ReadFailed { type_name: &'static str, property: String, reason: String },
}

impl PropertyError {
  pub fn unknown(type_name: &'static str, property: impl Into<String>) -> Self {
    Self::Unknown { type_name, property: property.into() }
  }

  pub fn read_failed(
    type_name: &'static str,
    property: impl Into<String>,
    reason: impl Into<String>,
  ) -> Self {
    Self::ReadFailed { type_name, property: property.into(), reason: reason.into() }
  }

  /// True when the property simply does not exist, as opposed to a getter
  /// that failed.
  #[inline]
  pub fn is_unknown(&self) -> bool { matches!(self, Self::Unknown { .. }) }
}

pub type Result<T, E = ChangeDetectionError> = std::result::Result<T, E>;
