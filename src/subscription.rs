//! Subscriptions: closable resources owning an ordered list of teardowns.
//!
//! A [`Subscription`] is a shared handle to a node in a teardown tree. Nodes
//! are linked explicitly: [`Subscription::add`] registers a teardown (an
//! action or another closable resource) and returns the [`TeardownKey`] that
//! identifies the link, and [`Subscription::remove`] detaches it again.
//! Closing a node runs its teardowns exactly once, in registration order.

use std::{
  any::Any,
  fmt::{Debug, Formatter},
  panic::{self, AssertUnwindSafe},
  sync::atomic::{AtomicUsize, Ordering},
};

use smallvec::SmallVec;
use tracing::{trace, warn};

use crate::rc::{MutRc, RcDeref, RcDerefMut};

mod teardown;
pub use teardown::Teardown;

/// Anything that can be closed: the cancellation half of a subscription.
pub trait SubscriptionLike {
  /// Closes the resource. Calling it again is a no-op.
  fn unsubscribe(&self);

  fn is_closed(&self) -> bool;

  /// Activates "RAII" behavior for this subscription: `unsubscribe()` is
  /// called automatically as soon as the returned guard goes out of scope.
  ///
  /// **Attention:** If you don't assign the return value to a variable,
  /// `unsubscribe()` is called immediately, which is probably not what you
  /// want!
  fn unsubscribe_when_dropped(self) -> SubscriptionGuard<Self>
  where
    Self: Sized,
  {
    SubscriptionGuard(self)
  }
}

impl<T: SubscriptionLike + ?Sized> SubscriptionLike for Box<T> {
  #[inline]
  fn unsubscribe(&self) { (**self).unsubscribe() }

  #[inline]
  fn is_closed(&self) -> bool { (**self).is_closed() }
}

/// Identifies one teardown registered through [`Subscription::add`].
///
/// Keys are unique across all subscriptions, so a key handed out by one node
/// never detaches anything from another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TeardownKey(usize);

impl TeardownKey {
  fn next() -> Self {
    static NEXT: AtomicUsize = AtomicUsize::new(0);
    TeardownKey(NEXT.fetch_add(1, Ordering::Relaxed))
  }
}

/// A closable resource node.
///
/// `Subscription` is a cheap, cloneable handle; all clones refer to the
/// same node.
///
/// ```rust
/// use rxlite::prelude::*;
///
/// let subscription = Subscription::with_action(|| println!("closed"));
/// assert!(!subscription.is_closed());
///
/// subscription.unsubscribe();
/// subscription.unsubscribe(); // no-op
/// assert!(subscription.is_closed());
/// ```
#[derive(Clone, Default)]
pub struct Subscription(MutRc<Inner>);

#[derive(Default)]
struct Inner {
  closed: bool,
  initial: Option<Box<dyn FnOnce()>>,
  teardowns: SmallVec<[(TeardownKey, Teardown); 1]>,
}

impl Subscription {
  /// Creates an open subscription without a primary teardown.
  pub fn new() -> Self { Self::default() }

  /// Creates an open subscription that runs `action` when it closes, before
  /// any teardown registered later through [`Subscription::add`].
  pub fn with_action(action: impl FnOnce() + 'static) -> Self {
    let subscription = Self::default();
    subscription.0.rc_deref_mut().initial = Some(Box::new(action));
    subscription
  }

  /// Registers a teardown to run when this subscription closes.
  ///
  /// If the subscription is already closed the teardown runs immediately,
  /// before `add` returns, and the returned key refers to nothing.
  pub fn add(&self, teardown: impl Into<Teardown>) -> TeardownKey {
    let teardown = teardown.into();
    let key = TeardownKey::next();
    let mut inner = self.0.rc_deref_mut();
    if inner.closed {
      drop(inner);
      teardown.execute();
    } else if !teardown.is_none() {
      inner.teardowns.push((key, teardown));
    }
    key
  }

  /// Detaches the teardown registered under `key` without running it.
  ///
  /// Unknown keys, keys already removed and keys whose teardown already ran
  /// are ignored.
  pub fn remove(&self, key: TeardownKey) {
    let removed = {
      let mut inner = self.0.rc_deref_mut();
      let pos = inner.teardowns.iter().position(|(k, _)| *k == key);
      pos.map(|pos| inner.teardowns.remove(pos))
    };
    // Dropped outside the borrow: the detached value may own handles that
    // reach back into this node when released.
    drop(removed);
  }

  /// Number of teardowns currently registered (the primary action excluded).
  pub fn teardown_size(&self) -> usize { self.0.rc_deref().teardowns.len() }

  pub fn unsubscribe(&self) {
    let (initial, teardowns) = {
      let mut inner = self.0.rc_deref_mut();
      if inner.closed {
        return;
      }
      inner.closed = true;
      (inner.initial.take(), std::mem::take(&mut inner.teardowns))
    };

    let total = teardowns.len() + usize::from(initial.is_some());
    let initial = initial.map(Teardown::Action);
    let teardowns = initial
      .into_iter()
      .chain(teardowns.into_iter().map(|(_, t)| t));
    trace!(teardowns = total, "subscription closed");
    run_all(teardowns.map(|t| move || t.execute()), "teardown panicked during unsubscribe");
  }

  #[inline]
  pub fn is_closed(&self) -> bool { self.0.rc_deref().closed }
}

/// Runs every action even if some of them panic. Once all have run, the
/// first panic is resumed.
pub(crate) fn run_all<F: FnOnce()>(actions: impl IntoIterator<Item = F>, context: &str) {
  let mut panics: SmallVec<[Box<dyn Any + Send>; 1]> = SmallVec::new();
  for action in actions {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(action)) {
      panics.push(payload);
    }
  }
  if !panics.is_empty() {
    warn!(panicked = panics.len(), "{context}");
    panic::resume_unwind(panics.swap_remove(0));
  }
}

impl SubscriptionLike for Subscription {
  #[inline]
  fn unsubscribe(&self) { Subscription::unsubscribe(self) }

  #[inline]
  fn is_closed(&self) -> bool { Subscription::is_closed(self) }
}

impl Debug for Subscription {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let inner = self.0.rc_deref();
    f.debug_struct("Subscription")
      .field("closed", &inner.closed)
      .field("teardown_count", &inner.teardowns.len())
      .finish()
  }
}

/// An RAII implementation of a "scoped subscribed" of a subscription.
/// When this structure is dropped (falls out of scope), the subscription will
/// be unsubscribed.
///
/// If you want to drop it immediately, wrap it in its own scope.
#[derive(Debug)]
#[must_use]
pub struct SubscriptionGuard<T: SubscriptionLike>(T);

impl<T: SubscriptionLike> SubscriptionGuard<T> {
  /// Wraps an existing subscription with a guard to enable RAII behavior for
  /// it.
  pub fn new(subscription: T) -> SubscriptionGuard<T> { SubscriptionGuard(subscription) }

  /// Access the guarded subscription.
  pub fn inner(&self) -> &T { &self.0 }
}

impl<T: SubscriptionLike> Drop for SubscriptionGuard<T> {
  #[inline]
  fn drop(&mut self) { self.0.unsubscribe() }
}

#[cfg(test)]
mod tests {
  use bencher::{benchmark_group, Bencher};

  use std::{cell::Cell, rc::Rc};

  use super::*;

  fn counter() -> (Rc<Cell<usize>>, impl Fn() -> Box<dyn FnOnce()>) {
    let count = Rc::new(Cell::new(0));
    let c = count.clone();
    (count, move || {
      let c = c.clone();
      Box::new(move || c.set(c.get() + 1)) as Box<dyn FnOnce()>
    })
  }

  #[rxlite_macro::test]
  fn open_on_creation_closed_after_unsubscribe() {
    let sub = Subscription::new();
    assert!(!sub.is_closed());
    sub.unsubscribe();
    assert!(sub.is_closed());
    sub.unsubscribe();
    assert!(sub.is_closed());
  }

  #[rxlite_macro::test]
  fn primary_action_runs_once() {
    let (count, action) = counter();
    let sub = Subscription::with_action(action());

    sub.unsubscribe();
    sub.unsubscribe();
    sub.unsubscribe();

    assert_eq!(count.get(), 1);
  }

  #[rxlite_macro::test]
  fn teardowns_run_in_registration_order_after_primary() {
    let order = Rc::new(std::cell::RefCell::new(vec![]));
    let push = |tag: &'static str| {
      let order = order.clone();
      move || order.borrow_mut().push(tag)
    };

    let sub = Subscription::with_action(push("primary"));
    sub.add(Teardown::action(push("a")));
    sub.add(Teardown::action(push("b")));
    sub.add(Teardown::action(push("c")));
    sub.unsubscribe();

    assert_eq!(*order.borrow(), vec!["primary", "a", "b", "c"]);
  }

  #[rxlite_macro::test]
  fn add_after_close_runs_immediately() {
    let (count, action) = counter();
    let sub = Subscription::new();
    sub.unsubscribe();

    sub.add(action());
    assert_eq!(count.get(), 1);
    assert_eq!(sub.teardown_size(), 0);
  }

  #[rxlite_macro::test]
  fn child_closes_independently_of_parent() {
    let (parent_count, parent_action) = counter();
    let (child_count, child_action) = counter();
    let child = Subscription::with_action(child_action());
    let parent = Subscription::with_action(parent_action());
    parent.add(child.clone());

    child.unsubscribe();
    assert_eq!(child_count.get(), 1);
    assert_eq!(parent_count.get(), 0);

    parent.unsubscribe();
    assert_eq!(child_count.get(), 1);
    assert_eq!(parent_count.get(), 1);
  }

  #[rxlite_macro::test]
  fn shared_child_is_closed_once() {
    let (count, action) = counter();
    let shared = Subscription::with_action(action());
    let a = Subscription::new();
    let b = Subscription::new();
    a.add(shared.clone());
    b.add(shared.clone());

    a.unsubscribe();
    b.unsubscribe();
    assert_eq!(count.get(), 1);
  }

  #[rxlite_macro::test]
  fn same_action_added_twice_runs_twice() {
    let (count, action) = counter();
    let a = Subscription::new();
    let b = Subscription::new();
    a.add(action());
    b.add(action());

    a.unsubscribe();
    b.unsubscribe();
    assert_eq!(count.get(), 2);
  }

  #[rxlite_macro::test]
  fn remove_detaches_without_running() {
    let (parent_count, parent_action) = counter();
    let (child_count, child_action) = counter();
    let child = Subscription::with_action(child_action());
    let parent = Subscription::with_action(parent_action());

    let key = parent.add(child.clone());
    assert_eq!(parent.teardown_size(), 1);
    parent.remove(key);
    assert_eq!(parent.teardown_size(), 0);
    parent.unsubscribe();

    assert_eq!(child_count.get(), 0);
    assert_eq!(parent_count.get(), 1);

    child.unsubscribe();
    assert_eq!(child_count.get(), 1);
  }

  #[rxlite_macro::test]
  fn remove_unknown_key_is_noop() {
    let (count, action) = counter();
    let sub = Subscription::new();
    let other = Subscription::new();
    let foreign = other.add(());
    let key = sub.add(action());

    sub.remove(foreign);
    sub.remove(TeardownKey(usize::MAX));
    assert_eq!(sub.teardown_size(), 1);

    sub.remove(key);
    sub.remove(key);
    sub.unsubscribe();
    assert_eq!(count.get(), 0);
  }

  #[rxlite_macro::test]
  fn reentrant_unsubscribe_runs_each_teardown_once() {
    let (count, action) = counter();
    let sub = Subscription::new();
    let again = sub.clone();
    sub.add(Teardown::action(move || again.unsubscribe()));
    sub.add(action());
    let again = sub.clone();
    sub.add(Teardown::action(move || again.unsubscribe()));

    sub.unsubscribe();
    sub.unsubscribe();
    assert_eq!(count.get(), 1);
  }

  #[rxlite_macro::test]
  fn add_from_running_teardown_executes_immediately() {
    let (count, action) = counter();
    let sub = Subscription::new();
    let same = sub.clone();
    let late = Rc::new(Cell::new(Some(action())));
    sub.add(Teardown::action(move || {
      if let Some(late) = late.take() {
        same.add(late);
      }
    }));

    sub.unsubscribe();
    assert_eq!(count.get(), 1);
  }

  #[rxlite_macro::test]
  fn panicking_teardown_does_not_skip_the_rest() {
    let (count, action) = counter();
    let sub = Subscription::new();
    sub.add(Teardown::action(|| panic!("boom")));
    sub.add(action());

    let result = panic::catch_unwind(AssertUnwindSafe(|| sub.unsubscribe()));
    assert!(result.is_err());
    assert_eq!(count.get(), 1);
    assert!(sub.is_closed());
  }

  #[rxlite_macro::test]
  fn explicit_guard_exposes_inner() {
    let sub = Subscription::new();
    {
      let guard = SubscriptionGuard::new(sub.clone());
      assert!(!guard.inner().is_closed());
      guard.inner().add(Teardown::None);
      assert_eq!(sub.teardown_size(), 0);
    }
    assert!(sub.is_closed());
  }

  #[rxlite_macro::test]
  fn guard_unsubscribes_on_drop() {
    let sub = Subscription::new();
    {
      let _guard = sub.clone().unsubscribe_when_dropped();
      assert!(!sub.is_closed());
    }
    assert!(sub.is_closed());
  }

  #[rxlite_macro::test]
  fn unsubscribe_nested_tree() {
    let (count, action) = counter();
    let root = Subscription::new();
    for _ in 0..8 {
      let branch = Subscription::new();
      for _ in 0..8 {
        branch.add(action());
      }
      root.add(branch);
    }
    root.unsubscribe();
    assert_eq!(count.get(), 64);
  }

  #[test]
  fn bench() { do_bench(); }

  benchmark_group!(do_bench, bench_teardown_tree);

  fn bench_teardown_tree(b: &mut Bencher) { b.iter(unsubscribe_nested_tree); }
}
