//! # rxlite: a minimal reactive-stream engine
//!
//! A small, single-threaded implementation of
//! [Reactive Extensions](http://reactivex.io/): push-based streams with
//! explicit, composable cancellation.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::{cell::RefCell, rc::Rc};
//!
//! use rxlite::prelude::*;
//!
//! let seen = Rc::new(RefCell::new(vec![]));
//! let seen_c = seen.clone();
//! observable::from_iter::<_, ()>([1, 2, 4])
//!   .pipe(scan(|acc, v| acc + v, 0))
//!   .subscribe(move |v| seen_c.borrow_mut().push(v));
//!
//! assert_eq!(*seen.borrow(), vec![1, 3, 7]);
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Observable`] | A lazy, cold producer: every subscribe runs it again |
//! | [`Subject`] | A hot multicast hub, both observer and source |
//! | [`Observer`] | Consumes `next`, `error`, and `complete` events |
//! | [`Subscriber`] | The observer handed to producers, and the cancel handle |
//! | [`Subscription`] | A node in the teardown tree |
//!
//! Operators live in [`ops`] and are applied with [`Observable::pipe`].
//!
//! Everything here is `!Send`: notifications are delivered synchronously on
//! the caller's stack, and all shared state sits in `Rc`/`RefCell`.
//!
//! [`Observable`]: observable::Observable
//! [`Observable::pipe`]: observable::Observable::pipe
//! [`Subject`]: subject::Subject
//! [`Observer`]: observer::Observer
//! [`Subscriber`]: subscriber::Subscriber
//! [`Subscription`]: subscription::Subscription

pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod rc;
pub mod subject;
pub mod subscriber;
pub mod subscription;

// Re-export the prelude module
pub use prelude::*;
