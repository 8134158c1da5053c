//! Observer trait and the partial observer record
//!
//! The Observer trait defines the consumer of data in the reactive pattern.
//! It provides three methods: next (for values), error (for errors), and
//! complete (for stream completion).
//!
//! Callers rarely implement [`Observer`] themselves. They describe the
//! handlers they care about with a [`PartialObserver`], and the engine adapts
//! it into a full observer (a [`Subscriber`](crate::subscriber::Subscriber))
//! at subscribe time, defaulting every missing member to a no-op.

use std::fmt::{Debug, Formatter};

use crate::rc::{MutRc, RcDeref, RcDerefMut};

// ============================================================================
// Observer Trait
// ============================================================================

/// Observer trait: The consumer of data in reactive programming
///
/// An Observer receives values, errors, and completion notifications from
/// an Observable. Observers in this crate are shared handles, so every method
/// takes `&self`.
pub trait Observer<Item, Err> {
  /// Receive the next value from the observable
  fn next(&self, value: Item);

  /// Handle an error from the observable. No more values follow an error.
  fn error(&self, err: Err);

  /// Handle completion of the observable. No more values follow completion.
  fn complete(&self);

  /// Returns `true` if the observer is closed and will not accept more values.
  ///
  /// Sources looping over many values use this to stop early.
  fn is_closed(&self) -> bool;
}

// ============================================================================
// PartialObserver
// ============================================================================

pub(crate) type NextFn<Item> = Box<dyn Fn(Item)>;
pub(crate) type ErrorFn<Err> = Box<dyn FnOnce(Err)>;
pub(crate) type CompleteFn = Box<dyn FnOnce()>;

/// A structural observer record whose members are all optional.
///
/// `next` may run many times, `error` and `complete` at most once (and never
/// both), so the terminal handlers are `FnOnce`.
///
/// ```rust
/// use std::{cell::RefCell, rc::Rc};
///
/// use rxlite::prelude::*;
///
/// let seen = Rc::new(RefCell::new(vec![]));
/// let seen_c = seen.clone();
/// observable::from_iter([1, 2, 3]).subscribe_with(
///   PartialObserver::<i32, ()>::new()
///     .on_next(move |v| seen_c.borrow_mut().push(v))
///     .on_complete(|| println!("done")),
/// );
/// assert_eq!(*seen.borrow(), vec![1, 2, 3]);
/// ```
pub struct PartialObserver<Item, Err> {
  pub(crate) next: Option<NextFn<Item>>,
  pub(crate) error: Option<ErrorFn<Err>>,
  pub(crate) complete: Option<CompleteFn>,
}

impl<Item, Err> PartialObserver<Item, Err> {
  /// An observer with no handlers at all.
  pub fn new() -> Self { Self { next: None, error: None, complete: None } }

  pub fn on_next(mut self, f: impl Fn(Item) + 'static) -> Self {
    self.next = Some(Box::new(f));
    self
  }

  pub fn on_error(mut self, f: impl FnOnce(Err) + 'static) -> Self {
    self.error = Some(Box::new(f));
    self
  }

  pub fn on_complete(mut self, f: impl FnOnce() + 'static) -> Self {
    self.complete = Some(Box::new(f));
    self
  }

  /// Forwards every notification to `observer`.
  pub fn forward_to<O>(observer: O) -> Self
  where
    O: Observer<Item, Err> + Clone + 'static,
  {
    let (next, error) = (observer.clone(), observer.clone());
    Self::new()
      .on_next(move |v| next.next(v))
      .on_error(move |e| error.error(e))
      .on_complete(move || observer.complete())
  }
}

impl<Item, Err> Default for PartialObserver<Item, Err> {
  fn default() -> Self { Self::new() }
}

impl<Item, Err> Debug for PartialObserver<Item, Err> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("PartialObserver")
      .field("next", &self.next.is_some())
      .field("error", &self.error.is_some())
      .field("complete", &self.complete.is_some())
      .finish()
  }
}

// ============================================================================
// Notification recording
// ============================================================================

/// One notification as observed by a subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification<Item, Err> {
  Next(Item),
  Error(Err),
  Complete,
}

/// Records every notification delivered to the observers it hands out.
///
/// Two pipelines driven with identical call sequences can be compared by
/// comparing their logs.
pub struct NotificationLog<Item, Err>(MutRc<Vec<Notification<Item, Err>>>);

impl<Item, Err> NotificationLog<Item, Err> {
  pub fn new() -> Self { Self(MutRc::own(Vec::new())) }

  pub fn len(&self) -> usize { self.0.rc_deref().len() }

  pub fn is_empty(&self) -> bool { self.0.rc_deref().is_empty() }

  /// Takes the recorded notifications, leaving the log empty.
  pub fn take(&self) -> Vec<Notification<Item, Err>> { self.0.replace(Vec::new()) }

  fn push(&self, notification: Notification<Item, Err>) {
    self.0.rc_deref_mut().push(notification);
  }
}

impl<Item: 'static, Err: 'static> NotificationLog<Item, Err> {
  /// A fresh observer appending to this log.
  pub fn observer(&self) -> PartialObserver<Item, Err> {
    let (next, error, complete) = (self.clone(), self.clone(), self.clone());
    PartialObserver::new()
      .on_next(move |v| next.push(Notification::Next(v)))
      .on_error(move |e| error.push(Notification::Error(e)))
      .on_complete(move || complete.push(Notification::Complete))
  }
}

impl<Item: Clone, Err: Clone> NotificationLog<Item, Err> {
  /// Every notification recorded so far, in delivery order.
  pub fn events(&self) -> Vec<Notification<Item, Err>> { self.0.rc_deref().clone() }

  /// Just the `next` values recorded so far.
  pub fn values(&self) -> Vec<Item> {
    self
      .0
      .rc_deref()
      .iter()
      .filter_map(|n| match n {
        Notification::Next(v) => Some(v.clone()),
        _ => None,
      })
      .collect()
  }
}

impl<Item, Err> Clone for NotificationLog<Item, Err> {
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<Item, Err> Default for NotificationLog<Item, Err> {
  fn default() -> Self { Self::new() }
}

impl<Item: Debug, Err: Debug> Debug for NotificationLog<Item, Err> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_list().entries(self.0.rc_deref().iter()).finish()
  }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use super::*;

  #[derive(Clone, Default)]
  struct TestObserver {
    values: Rc<RefCell<Vec<i32>>>,
    completed: Rc<RefCell<bool>>,
  }

  impl Observer<i32, ()> for TestObserver {
    fn next(&self, value: i32) { self.values.borrow_mut().push(value); }

    fn error(&self, _: ()) {}

    fn complete(&self) { *self.completed.borrow_mut() = true; }

    fn is_closed(&self) -> bool { *self.completed.borrow() }
  }

  #[rxlite_macro::test]
  fn partial_observer_records_only_given_members() {
    let observer = PartialObserver::<i32, ()>::new().on_next(|_| {});
    assert!(observer.next.is_some());
    assert!(observer.error.is_none());
    assert!(observer.complete.is_none());
  }

  #[rxlite_macro::test]
  fn forward_to_observer() {
    let target = TestObserver::default();
    let observer = PartialObserver::forward_to(target.clone());

    let next = observer.next.as_ref().unwrap();
    next(1);
    next(2);
    (observer.complete.unwrap())();

    assert_eq!(*target.values.borrow(), vec![1, 2]);
    assert!(target.is_closed());
  }

  #[rxlite_macro::test]
  fn log_records_in_order() {
    let log = NotificationLog::<i32, &str>::new();
    let observer = log.observer();
    let next = observer.next.as_ref().unwrap();
    next(1);
    next(2);
    (observer.error.unwrap())("oops");

    assert_eq!(log.events(), vec![
      Notification::Next(1),
      Notification::Next(2),
      Notification::Error("oops"),
    ]);
    assert_eq!(log.values(), vec![1, 2]);
    assert_eq!(log.take().len(), 3);
    assert!(log.is_empty());
  }
}
