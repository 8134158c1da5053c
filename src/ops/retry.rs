//! Retry operator
//!
//! This module provides the `retry` operator for resubscribing to an observable
//! when it errors, based on a configurable retry policy.
//!
//! Simple retry with count:
//!
//! ```rust
//! use rxlite::prelude::*;
//!
//! let log = NotificationLog::new();
//! Observable::<i32, &str>::new(|subscriber| {
//!   subscriber.next(42);
//!   subscriber.error("test");
//!   Ok(())
//! })
//! .pipe(retry(3))
//! .subscribe_with(log.observer());
//!
//! assert_eq!(log.values(), vec![42, 42, 42, 42]);
//! ```
//!
//! Custom retry policy based on error type (e.g., HTTP status code):
//!
//! ```rust
//! use rxlite::prelude::*;
//!
//! #[derive(Clone)]
//! struct HttpRetryPolicy {
//!   max_retries: usize,
//! }
//!
//! impl RetryPolicy<u16> for HttpRetryPolicy {
//!   fn should_retry(&self, err: &u16, attempt: usize) -> bool {
//!     attempt < self.max_retries && (500..=599).contains(err)
//!   }
//! }
//!
//! observable::throw_err::<(), _>(404u16)
//!   .pipe(retry(HttpRetryPolicy { max_retries: 3 }))
//!   .subscribe(|_| {});
//! ```

use std::{cell::Cell, rc::Rc};

use tracing::debug;

use crate::{observable::Observable, observer::PartialObserver, subscriber::Subscriber};

/// Policy for determining whether to retry an error.
///
/// Simple policies like `usize` (count) and richer ones like [`RetryConfig`]
/// are provided. Implement this trait for custom retry logic.
pub trait RetryPolicy<Err>: Clone {
  /// Determines if a retry should occur.
  ///
  /// # Arguments
  ///
  /// * `err` - The error that occurred.
  /// * `attempt` - The number of retries already attempted (0-indexed).
  ///   - 0 means this is the first error (first retry check).
  ///   - 1 means this is the second error, etc.
  fn should_retry(&self, err: &Err, attempt: usize) -> bool;

  /// Whether to reset the retry count when a value is successfully emitted.
  ///
  /// If this returns `true`, the retry counter (attempt index) will be reset to
  /// 0 whenever the source observable emits a `next` value.
  fn reset_on_success(&self) -> bool { false }
}

impl<Err> RetryPolicy<Err> for usize {
  fn should_retry(&self, _err: &Err, attempt: usize) -> bool { attempt < *self }
}

/// `None` retries forever, `Some(n)` at most `n` times.
impl<Err> RetryPolicy<Err> for Option<usize> {
  fn should_retry(&self, _err: &Err, attempt: usize) -> bool {
    self.is_none_or(|count| attempt < count)
  }
}

/// A configuration struct for Retry.
///
/// Allows configuring:
/// - Maximum retry count (unlimited unless set)
/// - Whether to reset the retry count on successful emission
///
/// # Examples
///
/// ```rust
/// use rxlite::ops::RetryConfig;
///
/// let config = RetryConfig::new().count(5).reset_on_success();
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryConfig {
  count: Option<usize>,
  reset_on_success: bool,
}

impl RetryConfig {
  /// Creates a new default configuration (unlimited retries).
  pub fn new() -> Self { Self { count: None, reset_on_success: false } }

  /// Sets the maximum number of retry attempts.
  ///
  /// For example, `count(3)` allows for 3 retries, resulting in a maximum
  /// of 4 total subscription attempts (1 initial + 3 retries).
  pub fn count(mut self, count: usize) -> Self {
    self.count = Some(count);
    self
  }

  /// Enables resetting the retry count when a value is successfully emitted.
  pub fn reset_on_success(mut self) -> Self {
    self.reset_on_success = true;
    self
  }
}

impl Default for RetryConfig {
  fn default() -> Self { Self::new() }
}

impl<Err> RetryPolicy<Err> for RetryConfig {
  fn should_retry(&self, err: &Err, attempt: usize) -> bool {
    self.count.should_retry(err, attempt)
  }

  fn reset_on_success(&self) -> bool { self.reset_on_success }
}

/// Resubscribes to the source whenever it errors, as long as `policy`
/// allows it. Values emitted before each error still reach the output, and
/// once the policy gives up the latest error is forwarded. Completion passes
/// through.
pub fn retry<Item, Err, P>(
  policy: P,
) -> impl FnOnce(Observable<Item, Err>) -> Observable<Item, Err>
where
  Item: 'static,
  Err: 'static,
  P: RetryPolicy<Err> + 'static,
{
  move |source| {
    Observable::new(move |output: Subscriber<Item, Err>| {
      let state = Rc::new(RetryState {
        source: source.clone(),
        policy: policy.clone(),
        output,
        attempt: Cell::new(0),
        subscribing: Cell::new(false),
        pending: Cell::new(false),
      });
      state.subscribe();
      Ok(())
    })
  }
}

struct RetryState<Item, Err, P> {
  source: Observable<Item, Err>,
  policy: P,
  output: Subscriber<Item, Err>,
  attempt: Cell<usize>,
  subscribing: Cell<bool>,
  pending: Cell<bool>,
}

impl<Item, Err, P> RetryState<Item, Err, P>
where
  Item: 'static,
  Err: 'static,
  P: RetryPolicy<Err> + 'static,
{
  /// Subscribes to the source. A source that errors synchronously asks for
  /// the next attempt while the current `subscribe_child` is still on the
  /// stack, so those requests are queued and run by the outermost call
  /// instead of recursing.
  fn subscribe(self: &Rc<Self>) {
    if self.subscribing.replace(true) {
      self.pending.set(true);
      return;
    }
    loop {
      self.pending.set(false);
      if self.output.is_stopped() {
        break;
      }
      self
        .source
        .subscribe_child(self.output.as_subscription(), self.attempt_observer());
      if !self.pending.get() {
        break;
      }
    }
    self.subscribing.set(false);
  }

  fn attempt_observer(self: &Rc<Self>) -> PartialObserver<Item, Err> {
    let (next, error, complete) = (self.clone(), self.clone(), self.clone());
    PartialObserver::new()
      .on_next(move |v| {
        if next.policy.reset_on_success() {
          next.attempt.set(0);
        }
        next.output.next(v);
      })
      .on_error(move |err| error.on_error(err))
      .on_complete(move || complete.output.complete())
  }

  fn on_error(self: &Rc<Self>, err: Err) {
    if self.output.is_stopped() {
      return;
    }
    let attempt = self.attempt.get();
    if self.policy.should_retry(&err, attempt) {
      self.attempt.set(attempt + 1);
      debug!(attempt = attempt + 1, "retry: resubscribing to source");
      self.subscribe();
    } else {
      self.output.error(err);
    }
  }
}

#[cfg(test)]
mod test {
  use std::{cell::Cell, rc::Rc};

  use crate::prelude::*;

  fn failing_source(subscriptions: Rc<Cell<usize>>) -> Observable<i32, &'static str> {
    Observable::new(move |subscriber| {
      subscriptions.set(subscriptions.get() + 1);
      subscriber.next(42);
      subscriber.error("test");
      Ok(())
    })
  }

  #[rxlite_macro::test]
  fn retry_count() {
    let subscriptions = Rc::new(Cell::new(0));
    let log = NotificationLog::new();
    failing_source(subscriptions.clone())
      .pipe(retry(3))
      .subscribe_with(log.observer());

    assert_eq!(log.events(), vec![
      Notification::Next(42),
      Notification::Next(42),
      Notification::Next(42),
      Notification::Next(42),
      Notification::Error("test"),
    ]);
    assert_eq!(subscriptions.get(), 4);
  }

  #[rxlite_macro::test]
  fn zero_retries_forwards_first_error() {
    let log = NotificationLog::new();
    failing_source(Rc::new(Cell::new(0)))
      .pipe(retry(0))
      .subscribe_with(log.observer());
    assert_eq!(log.events(), vec![Notification::Next(42), Notification::Error("test")]);
  }

  #[rxlite_macro::test]
  fn unlimited_until_success() {
    let subscriptions = Rc::new(Cell::new(0));
    let s = subscriptions.clone();
    let flaky = Observable::<i32, &str>::new(move |subscriber| {
      s.set(s.get() + 1);
      if s.get() < 50 {
        subscriber.error("not yet");
      } else {
        subscriber.next(1);
        subscriber.complete();
      }
      Ok(())
    });

    let log = NotificationLog::new();
    flaky.pipe(retry(None::<usize>)).subscribe_with(log.observer());
    assert_eq!(log.events(), vec![Notification::Next(1), Notification::Complete]);
    assert_eq!(subscriptions.get(), 50);
  }

  #[rxlite_macro::test]
  fn complete_passes_through() {
    let log = NotificationLog::<i32, ()>::new();
    observable::from_iter([1, 2])
      .pipe(retry(RetryConfig::new()))
      .subscribe_with(log.observer());
    assert_eq!(log.events(), vec![
      Notification::Next(1),
      Notification::Next(2),
      Notification::Complete
    ]);
  }

  #[rxlite_macro::test]
  fn reset_on_success() {
    // Every subscription emits a value before failing, so with a reset the
    // counter never reaches the limit until the source stops emitting.
    let subscriptions = Rc::new(Cell::new(0));
    let s = subscriptions.clone();
    let source = Observable::<usize, &str>::new(move |subscriber| {
      s.set(s.get() + 1);
      if s.get() <= 5 {
        subscriber.next(s.get());
      }
      subscriber.error("fail");
      Ok(())
    });

    let log = NotificationLog::new();
    source
      .pipe(retry(RetryConfig::new().count(1).reset_on_success()))
      .subscribe_with(log.observer());

    assert_eq!(log.values(), vec![1, 2, 3, 4, 5]);
    assert_eq!(subscriptions.get(), 6);
    assert_eq!(log.events().last(), Some(&Notification::Error("fail")));
  }

  #[rxlite_macro::test]
  fn unsubscribe_tears_down_active_attempt() {
    let subject = Subject::<i32, &str>::new();
    let log = NotificationLog::new();
    let sub = subject
      .to_observable()
      .pipe(retry(RetryConfig::new()))
      .subscribe_with(log.observer());
    assert_eq!(subject.observer_count(), 1);

    subject.next(1);
    sub.unsubscribe();
    assert_eq!(subject.observer_count(), 0);
    subject.next(2);
    assert_eq!(log.values(), vec![1]);
  }

  #[rxlite_macro::test]
  fn asynchronous_error_resubscribes() {
    let subjects = Rc::new(std::cell::RefCell::new(Vec::<Subject<i32, &str>>::new()));
    let s = subjects.clone();
    let source = Observable::new(move |subscriber: Subscriber<i32, &'static str>| {
      let subject = Subject::new();
      s.borrow_mut().push(subject.clone());
      Ok(subject.subscribe_with(PartialObserver::forward_to(subscriber)))
    });

    let log = NotificationLog::new();
    source.pipe(retry(1)).subscribe_with(log.observer());

    let first = subjects.borrow()[0].clone();
    first.next(1);
    first.error("first");
    let second = subjects.borrow()[1].clone();
    second.next(2);
    second.error("second");

    assert_eq!(log.events(), vec![
      Notification::Next(1),
      Notification::Next(2),
      Notification::Error("second"),
    ]);
    assert_eq!(subjects.borrow().len(), 2);
  }
}
