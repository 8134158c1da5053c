use std::fmt::{Debug, Formatter};

use super::{Subscription, SubscriptionLike};

/// Cleanup registered on a [`Subscription`].
///
/// A teardown is either a one-shot action, a handle to another closable
/// resource, or nothing at all. Resources are shared handles: registering a
/// [`Subscription`] on a parent does not transfer ownership of it, and the
/// child can still be unsubscribed (or detached) on its own.
///
/// ```rust
/// use rxlite::prelude::*;
///
/// let parent = Subscription::new();
/// let child = Subscription::new();
///
/// parent.add(child.clone());
/// parent.add(Teardown::action(|| println!("parent closed")));
/// parent.add(());
///
/// parent.unsubscribe();
/// assert!(child.is_closed());
/// ```
#[derive(Default)]
pub enum Teardown {
  /// A no-argument action run exactly once.
  Action(Box<dyn FnOnce()>),
  /// Another closable resource, unsubscribed when the owner closes.
  Closable(Box<dyn SubscriptionLike>),
  /// Nothing to clean up.
  #[default]
  None,
}

impl Teardown {
  #[inline]
  pub fn action(f: impl FnOnce() + 'static) -> Self { Teardown::Action(Box::new(f)) }

  #[inline]
  pub fn closable(resource: impl SubscriptionLike + 'static) -> Self {
    Teardown::Closable(Box::new(resource))
  }

  /// `true` for [`Teardown::None`].
  #[inline]
  pub fn is_none(&self) -> bool { matches!(self, Teardown::None) }

  pub(crate) fn execute(self) {
    match self {
      Teardown::Action(action) => action(),
      Teardown::Closable(resource) => resource.unsubscribe(),
      Teardown::None => {}
    }
  }
}

impl Debug for Teardown {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Teardown::Action(_) => f.write_str("Teardown::Action"),
      Teardown::Closable(resource) => f
        .debug_struct("Teardown::Closable")
        .field("is_closed", &resource.is_closed())
        .finish(),
      Teardown::None => f.write_str("Teardown::None"),
    }
  }
}

impl From<()> for Teardown {
  #[inline]
  fn from(_: ()) -> Self { Teardown::None }
}

impl From<Subscription> for Teardown {
  #[inline]
  fn from(subscription: Subscription) -> Self { Teardown::closable(subscription) }
}

impl From<Box<dyn FnOnce()>> for Teardown {
  #[inline]
  fn from(action: Box<dyn FnOnce()>) -> Self { Teardown::Action(action) }
}

impl<T: Into<Teardown>> From<Option<T>> for Teardown {
  #[inline]
  fn from(teardown: Option<T>) -> Self { teardown.map_or(Teardown::None, Into::into) }
}
