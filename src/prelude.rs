//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for easy access.

// Creation functions live under `observable::`
pub use crate::observable;
pub use crate::observable::{create, Observable};
// Observer trait and records
pub use crate::observer::{Notification, NotificationLog, Observer, PartialObserver};
// Operators
pub use crate::ops::{
  finalize, map, retry, scan, switch_map, try_map, try_scan, try_switch_map, RetryConfig,
  RetryPolicy,
};
pub use crate::subject::Subject;
pub use crate::subscriber::Subscriber;
// Subscription types
pub use crate::subscription::{
  Subscription, SubscriptionGuard, SubscriptionLike, Teardown, TeardownKey,
};
