//! Shared mutable cells used by subscriptions and operators.
//!
//! Everything in the engine is single-threaded, so shared state lives in an
//! `Rc<RefCell<_>>`. [`MutRc`] wraps that pair behind the [`RcDeref`] /
//! [`RcDerefMut`] accessors used throughout the crate.

use std::{
  cell::{Ref, RefCell, RefMut},
  rc::Rc,
};

use crate::subscription::SubscriptionLike;

pub trait RcDeref {
  type Target<'a>
  where
    Self: 'a;
  #[allow(clippy::needless_lifetimes)]
  fn rc_deref<'a>(&'a self) -> Self::Target<'a>;
}

pub trait RcDerefMut {
  type Target<'a>
  where
    Self: 'a;
  #[allow(clippy::needless_lifetimes)]
  fn rc_deref_mut<'a>(&'a self) -> Self::Target<'a>;
}

/// Reference-counted mutable cell for local (single-thread) state.
#[derive(Default)]
pub struct MutRc<T>(Rc<RefCell<T>>);

impl<T> MutRc<T> {
  pub fn own(t: T) -> Self { Self(Rc::new(RefCell::new(t))) }

  /// Returns `true` if both handles point to the same cell.
  #[inline]
  pub fn ptr_eq(&self, other: &Self) -> bool { Rc::ptr_eq(&self.0, &other.0) }

  /// Replaces the stored value, returning the previous one.
  ///
  /// The borrow ends before the caller touches the returned value, so the
  /// old value may freely call back into this cell when it is dropped or
  /// unsubscribed.
  #[inline]
  pub fn replace(&self, value: T) -> T { self.0.replace(value) }
}

impl<T> Clone for MutRc<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> RcDeref for MutRc<T> {
  type Target<'a>
    = Ref<'a, T>
  where
    Self: 'a;

  #[inline]
  #[allow(clippy::needless_lifetimes)]
  fn rc_deref<'a>(&'a self) -> Self::Target<'a> { self.0.borrow() }
}

impl<T> RcDerefMut for MutRc<T> {
  type Target<'a>
    = RefMut<'a, T>
  where
    Self: 'a;

  #[inline]
  #[allow(clippy::needless_lifetimes)]
  fn rc_deref_mut<'a>(&'a self) -> Self::Target<'a> { self.0.borrow_mut() }
}

/// A serial slot: holds at most one subscription at a time.
///
/// Unsubscribing the slot takes the current subscription out first and only
/// then unsubscribes it, so teardowns that reach back into the slot never
/// observe an active borrow.
impl<S: SubscriptionLike> SubscriptionLike for MutRc<Option<S>> {
  fn unsubscribe(&self) {
    let current = self.rc_deref_mut().take();
    if let Some(current) = current {
      current.unsubscribe();
    }
  }

  fn is_closed(&self) -> bool {
    self
      .rc_deref()
      .as_ref()
      .is_none_or(SubscriptionLike::is_closed)
  }
}
