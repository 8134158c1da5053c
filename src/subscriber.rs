use std::{
  cell::RefCell,
  fmt::{Debug, Formatter},
  rc::{Rc, Weak},
};

use crate::{
  observer::{CompleteFn, ErrorFn, Observer, PartialObserver},
  subscription::{Subscription, SubscriptionLike, Teardown, TeardownKey},
};

/// Implements the Observer trait and the Subscription capabilities. While the
/// Observer is the public API for consuming the values of an Observable, all
/// observers get converted to a Subscriber, in order to provide Subscription
/// capabilities.
///
/// A `Subscriber` delivers at most one terminal notification. The terminal
/// handler runs first and the subscriber unsubscribes afterwards, so the
/// handler always precedes every teardown. Once closed, `next`, `error` and
/// `complete` are all no-ops.
///
/// Cloning a `Subscriber` clones the handle, not the subscriber.
pub struct Subscriber<Item, Err>(Rc<SubscriberInner<Item, Err>>);

struct SubscriberInner<Item, Err> {
  subscription: Subscription,
  next: RefCell<Option<Rc<dyn Fn(Item)>>>,
  terminal: RefCell<Option<Terminal<Err>>>,
}

struct Terminal<Err> {
  error: ErrorFn<Err>,
  complete: CompleteFn,
}

impl<Item: 'static, Err: 'static> Subscriber<Item, Err> {
  pub fn new(observer: PartialObserver<Item, Err>) -> Self {
    let PartialObserver { next, error, complete } = observer;
    let next: Rc<dyn Fn(Item)> = match next {
      Some(next) => Rc::from(next),
      None => Rc::new(|_: Item| {}),
    };
    let terminal = Terminal {
      error: error.unwrap_or_else(|| Box::new(|_: Err| {})),
      complete: complete.unwrap_or_else(|| Box::new(|| {})),
    };

    Subscriber(Rc::new_cyclic(|weak: &Weak<SubscriberInner<Item, Err>>| {
      let weak = weak.clone();
      SubscriberInner {
        // Closing by any path releases the handlers, which breaks the
        // reference cycles operators build between subscribers.
        subscription: Subscription::with_action(move || {
          if let Some(inner) = weak.upgrade() {
            inner.release();
          }
        }),
        next: RefCell::new(Some(next)),
        terminal: RefCell::new(Some(terminal)),
      }
    }))
  }
}

impl<Item, Err> SubscriberInner<Item, Err> {
  fn release(&self) {
    let next = self.next.take();
    let terminal = self.terminal.take();
    drop((next, terminal));
  }

  /// Stops the subscriber ahead of a terminal notification, handing back the
  /// terminal handlers. `None` if already stopped or closed.
  fn stop(&self) -> Option<Terminal<Err>> {
    if self.subscription.is_closed() {
      return None;
    }
    let terminal = self.terminal.take()?;
    let next = self.next.take();
    drop(next);
    Some(terminal)
  }
}

impl<Item, Err> Subscriber<Item, Err> {
  pub fn next(&self, value: Item) {
    if self.0.subscription.is_closed() {
      return;
    }
    let next = self.0.next.borrow().clone();
    if let Some(next) = next {
      next(value);
    }
  }

  pub fn error(&self, err: Err) {
    if let Some(terminal) = self.0.stop() {
      (terminal.error)(err);
      self.unsubscribe();
    }
  }

  pub fn complete(&self) {
    if let Some(terminal) = self.0.stop() {
      (terminal.complete)();
      self.unsubscribe();
    }
  }

  #[inline]
  pub fn unsubscribe(&self) { self.0.subscription.unsubscribe() }

  #[inline]
  pub fn is_closed(&self) -> bool { self.0.subscription.is_closed() }

  /// `true` once a terminal notification started or the subscriber closed:
  /// nothing more will reach the wrapped observer.
  pub fn is_stopped(&self) -> bool {
    self.is_closed() || self.0.terminal.borrow().is_none()
  }

  /// See [`Subscription::add`].
  #[inline]
  pub fn add(&self, teardown: impl Into<Teardown>) -> TeardownKey {
    self.0.subscription.add(teardown)
  }

  /// See [`Subscription::remove`].
  #[inline]
  pub fn remove(&self, key: TeardownKey) { self.0.subscription.remove(key) }

  /// The subscription node backing this subscriber.
  #[inline]
  pub fn as_subscription(&self) -> &Subscription { &self.0.subscription }
}

impl<Item, Err> Clone for Subscriber<Item, Err> {
  #[inline]
  fn clone(&self) -> Self { Subscriber(self.0.clone()) }
}

impl<Item, Err> Observer<Item, Err> for Subscriber<Item, Err> {
  #[inline]
  fn next(&self, value: Item) { Subscriber::next(self, value) }

  #[inline]
  fn error(&self, err: Err) { Subscriber::error(self, err) }

  #[inline]
  fn complete(&self) { Subscriber::complete(self) }

  #[inline]
  fn is_closed(&self) -> bool { self.is_stopped() }
}

impl<Item, Err> SubscriptionLike for Subscriber<Item, Err> {
  #[inline]
  fn unsubscribe(&self) { Subscriber::unsubscribe(self) }

  #[inline]
  fn is_closed(&self) -> bool { Subscriber::is_closed(self) }
}

impl<Item: 'static, Err: 'static> From<Subscriber<Item, Err>> for Teardown {
  #[inline]
  fn from(subscriber: Subscriber<Item, Err>) -> Self { Teardown::closable(subscriber) }
}

impl<Item, Err> Debug for Subscriber<Item, Err> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Subscriber")
      .field("closed", &self.is_closed())
      .field("stopped", &self.is_stopped())
      .finish()
  }
}
