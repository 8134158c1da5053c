//! Stream operators.
//!
//! Every operator is a function from its configuration to a transform
//! `Observable<T, E> -> Observable<R, E>`. Apply one directly, or chain
//! them with [`Observable::pipe`](crate::observable::Observable::pipe):
//!
//! ```rust
//! use rxlite::prelude::*;
//!
//! let log = NotificationLog::<i32, ()>::new();
//! observable::from_iter([1, 2, 3])
//!   .pipe(map(|v| v * 10))
//!   .pipe(scan(|acc, v| acc + v, 0))
//!   .subscribe_with(log.observer());
//!
//! assert_eq!(log.values(), vec![10, 30, 60]);
//! ```
//!
//! Callbacks that can fail come in a `try_` flavour returning `Result`. An
//! `Err` becomes the output's error notification and the source is
//! unsubscribed.

pub mod finalize;
pub mod map;
pub mod retry;
pub mod scan;
pub mod switch_map;

pub use finalize::finalize;
pub use map::{map, try_map};
pub use retry::{retry, RetryConfig, RetryPolicy};
pub use scan::{scan, try_scan};
pub use switch_map::{switch_map, try_switch_map};
