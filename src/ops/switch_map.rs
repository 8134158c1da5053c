//! SwitchMap operator
//!
//! Transforms each value emitted by the source into an inner Observable, and
//! forwards items from only the most recently created inner Observable. When a
//! new inner Observable is produced, the previous one is unsubscribed.
//!
//! Behavior summary:
//! - Only the latest inner Observable's emissions are forwarded downstream.
//! - The operator completes only after the source completes and the current
//!   inner Observable completes.
//! - Errors from the source or from the current inner Observable are propagated
//!   immediately.
//!
//! Example:
//!
//! ```rust
//! use rxlite::prelude::*;
//!
//! let source = Subject::<i32, ()>::new();
//! let log = NotificationLog::new();
//! source
//!   .to_observable()
//!   .pipe(switch_map(|v| observable::from_iter([v, v * 10])))
//!   .subscribe_with(log.observer());
//!
//! source.next(1);
//! source.next(2);
//! assert_eq!(log.values(), vec![1, 10, 2, 20]);
//! ```

use std::{cell::Cell, rc::Rc};

use tracing::debug;

use crate::{
  observable::Observable,
  observer::PartialObserver,
  rc::MutRc,
  subscriber::Subscriber,
  subscription::SubscriptionLike,
};

/// Maps every source value to an inner observable and mirrors only the
/// latest one. See the [module docs](self).
pub fn switch_map<Item, R, Err, F>(
  project: F,
) -> impl FnOnce(Observable<Item, Err>) -> Observable<R, Err>
where
  Item: 'static,
  R: 'static,
  Err: 'static,
  F: Fn(Item) -> Observable<R, Err> + 'static,
{
  try_switch_map(move |v| Ok(project(v)))
}

/// Like [`switch_map`], but the projection may fail. The first `Err` is
/// emitted as the output error and both the source and the current inner
/// observable are unsubscribed.
pub fn try_switch_map<Item, R, Err, F>(
  project: F,
) -> impl FnOnce(Observable<Item, Err>) -> Observable<R, Err>
where
  Item: 'static,
  R: 'static,
  Err: 'static,
  F: Fn(Item) -> Result<Observable<R, Err>, Err> + 'static,
{
  move |source| {
    let project: Rc<Project<Item, R, Err>> = Rc::new(project);
    Observable::new(move |output: Subscriber<R, Err>| {
      let state = Rc::new(SwitchState {
        project: project.clone(),
        output: output.clone(),
        outer_completed: Cell::new(false),
        generation: Cell::new(0),
        inner: MutRc::own(None),
      });
      let (next, complete) = (state.clone(), state);
      let error = output.clone();
      source.subscribe_child(
        output.as_subscription(),
        PartialObserver::new()
          .on_next(move |v| next.switch_to(v))
          .on_error(move |e| error.error(e))
          .on_complete(move || complete.outer_complete()),
      );
      Ok(())
    })
  }
}

type Project<Item, R, Err> = dyn Fn(Item) -> Result<Observable<R, Err>, Err>;

struct SwitchState<Item, R, Err> {
  project: Rc<Project<Item, R, Err>>,
  output: Subscriber<R, Err>,
  outer_completed: Cell<bool>,
  /// Bumped on every switch, so a switch that happens while an inner
  /// observable is still subscribing can tell it has been superseded.
  generation: Cell<usize>,
  inner: MutRc<Option<Subscriber<R, Err>>>,
}

impl<Item: 'static, R: 'static, Err: 'static> SwitchState<Item, R, Err> {
  fn switch_to(self: &Rc<Self>, value: Item) {
    if self.output.is_stopped() {
      return;
    }
    let generation = self.generation.get() + 1;
    self.generation.set(generation);
    if !self.inner.is_closed() {
      debug!(generation, "switch_map: unsubscribing previous inner observable");
    }
    self.inner.unsubscribe();

    let inner = match (self.project)(value) {
      Ok(inner) => inner,
      Err(e) => {
        self.output.error(e);
        return;
      }
    };

    let (next, error, complete) = (self.clone(), self.clone(), self.clone());
    let subscriber = inner.subscribe_child(
      self.output.as_subscription(),
      PartialObserver::new()
        .on_next(move |v| {
          if next.is_current(generation) {
            next.output.next(v);
          }
        })
        .on_error(move |e| {
          if error.is_current(generation) {
            error.output.error(e);
          }
        })
        .on_complete(move || {
          if complete.is_current(generation) && complete.outer_completed.get() {
            complete.output.complete();
          }
        }),
    );

    if self.generation.get() != generation {
      subscriber.unsubscribe();
    } else if !subscriber.is_closed() {
      self.inner.replace(Some(subscriber));
    }
  }

  fn is_current(&self, generation: usize) -> bool { self.generation.get() == generation }

  fn outer_complete(&self) {
    self.outer_completed.set(true);
    if self.inner.is_closed() {
      self.output.complete();
    }
  }
}
