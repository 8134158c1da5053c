//! Observables: lazy, cold producers.
//!
//! An [`Observable`] wraps a subscription factory. Nothing happens until
//! [`Observable::subscribe_with`] is called, and every call runs the factory
//! again from scratch against a fresh [`Subscriber`].

use std::{
  fmt::{Debug, Formatter},
  rc::Rc,
};

use tracing::trace;

use crate::{
  observer::PartialObserver,
  subscriber::Subscriber,
  subscription::{Subscription, Teardown},
};

mod from_iter;
mod of;
mod trivial;
pub use from_iter::from_iter;
pub use of::of;
pub use trivial::{empty, never, throw_err};

type Factory<Item, Err> = dyn Fn(Subscriber<Item, Err>) -> Result<Teardown, Err>;

/// A representation of any set of values over any amount of time.
///
/// The factory receives the subscriber to push notifications into and
/// returns the teardown to run when that subscriber closes. Returning `Err`
/// is the same as the factory failing: the error is routed to the
/// subscriber's `error` handler, never back to the caller of `subscribe`.
///
/// ```rust
/// use std::{cell::RefCell, rc::Rc};
///
/// use rxlite::prelude::*;
///
/// let numbers = Observable::<i32, ()>::new(|subscriber| {
///   subscriber.next(1);
///   subscriber.next(2);
///   subscriber.complete();
///   Ok(Teardown::action(|| println!("torn down")))
/// });
///
/// let seen = Rc::new(RefCell::new(vec![]));
/// let seen_c = seen.clone();
/// numbers.subscribe(move |v| seen_c.borrow_mut().push(v));
/// assert_eq!(*seen.borrow(), vec![1, 2]);
/// ```
pub struct Observable<Item, Err> {
  factory: Rc<Factory<Item, Err>>,
}

impl<Item: 'static, Err: 'static> Observable<Item, Err> {
  /// param `factory`: the function that is called when the Observable is
  /// subscribed to. This function is given a Subscriber, to which new values
  /// can be `next`ed, or an `error` method can be called to raise an error,
  /// or `complete` can be called to notify of a successful completion.
  pub fn new<F, T>(factory: F) -> Self
  where
    F: Fn(Subscriber<Item, Err>) -> Result<T, Err> + 'static,
    T: Into<Teardown>,
  {
    Observable { factory: Rc::new(move |subscriber| factory(subscriber).map(Into::into)) }
  }

  /// Subscribes `observer`, returning the subscriber that both receives the
  /// notifications and cancels the subscription.
  pub fn subscribe_with(&self, observer: PartialObserver<Item, Err>) -> Subscriber<Item, Err> {
    self.run_factory(Subscriber::new(observer))
  }

  /// Subscribes `observer` as a child of `parent`.
  ///
  /// The new subscriber is registered on `parent` before the factory runs,
  /// so closing the parent stops this source even while it is still
  /// emitting synchronously from inside `subscribe`. When the child closes
  /// first it detaches itself from the parent again. Operators subscribe to
  /// their source this way.
  pub fn subscribe_child(
    &self,
    parent: &Subscription,
    observer: PartialObserver<Item, Err>,
  ) -> Subscriber<Item, Err> {
    let subscriber = Subscriber::new(observer);
    let key = parent.add(subscriber.clone());
    if subscriber.is_closed() {
      return subscriber;
    }
    let parent = parent.clone();
    subscriber.add(Teardown::action(move || parent.remove(key)));
    self.run_factory(subscriber)
  }

  fn run_factory(&self, subscriber: Subscriber<Item, Err>) -> Subscriber<Item, Err> {
    match (self.factory)(subscriber.clone()) {
      Ok(teardown) => {
        subscriber.add(teardown);
      }
      Err(err) => {
        trace!("subscription factory failed");
        subscriber.error(err);
      }
    }
    subscriber
  }

  /// Subscribes with only a `next` handler.
  pub fn subscribe(&self, next: impl Fn(Item) + 'static) -> Subscriber<Item, Err> {
    self.subscribe_with(PartialObserver::new().on_next(next))
  }

  /// Applies an operator: `source.pipe(op)` is `op(source)`.
  pub fn pipe<R, E>(self, op: impl FnOnce(Self) -> Observable<R, E>) -> Observable<R, E> {
    op(self)
  }
}

/// Creates an observable from a subscription factory, see [`Observable::new`].
pub fn create<Item, Err, F, T>(factory: F) -> Observable<Item, Err>
where
  Item: 'static,
  Err: 'static,
  F: Fn(Subscriber<Item, Err>) -> Result<T, Err> + 'static,
  T: Into<Teardown>,
{
  Observable::new(factory)
}

impl<Item, Err> Clone for Observable<Item, Err> {
  fn clone(&self) -> Self { Observable { factory: self.factory.clone() } }
}

impl<Item, Err> Debug for Observable<Item, Err> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str("Observable") }
}
