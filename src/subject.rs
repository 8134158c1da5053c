//! Subject: a hot, multicast hub.
//!
//! A [`Subject`] is both an observer (push values into it with `next`,
//! `error` and `complete`) and a source (subscribe to it like an
//! observable). Every value pushed in is broadcast to the subscribers that
//! are attached at that moment; once the subject terminates, it remembers
//! how and replays that outcome to anyone who subscribes later.

use std::fmt::{Debug, Formatter};

use smallvec::SmallVec;
use tracing::trace;

use crate::{
  observable::Observable,
  observer::{Observer, PartialObserver},
  rc::{MutRc, RcDeref, RcDerefMut},
  subscriber::Subscriber,
  subscription::run_all,
};

/// Terminal state of a subject. Completion and error exclude each other by
/// construction, and the error is kept for late subscribers.
#[derive(Debug, Clone)]
enum SubjectStatus<Err> {
  Open,
  Completed,
  Errored(Err),
}

impl<Err> SubjectStatus<Err> {
  fn is_open(&self) -> bool { matches!(self, SubjectStatus::Open) }
}

struct SubjectState<Item, Err> {
  status: SubjectStatus<Err>,
  subscribers: SmallVec<[Subscriber<Item, Err>; 2]>,
}

/// A multicast hub, cloning a `Subject` clones the handle.
///
/// ```rust
/// use std::{cell::RefCell, rc::Rc};
///
/// use rxlite::prelude::*;
///
/// let subject = Subject::<i32, ()>::new();
/// let seen = Rc::new(RefCell::new(vec![]));
/// let seen_c = seen.clone();
/// subject.subscribe(move |v| seen_c.borrow_mut().push(v));
///
/// subject.next(1);
/// subject.next(2);
/// subject.complete();
/// subject.next(3);
///
/// assert_eq!(*seen.borrow(), vec![1, 2]);
/// ```
pub struct Subject<Item, Err>(MutRc<SubjectState<Item, Err>>);

impl<Item, Err> Subject<Item, Err> {
  pub fn new() -> Self {
    Subject(MutRc::own(SubjectState {
      status: SubjectStatus::Open,
      subscribers: SmallVec::new(),
    }))
  }

  /// `true` once the subject completed or errored.
  pub fn is_closed(&self) -> bool { !self.0.rc_deref().status.is_open() }

  /// Number of attached subscribers that are still open.
  pub fn observer_count(&self) -> usize {
    self
      .0
      .rc_deref()
      .subscribers
      .iter()
      .filter(|s| !s.is_closed())
      .count()
  }

  /// Completes every attached subscriber. No-op once the subject is closed.
  ///
  /// A panicking handler does not stop the others from being completed; the
  /// first panic is resumed afterwards.
  pub fn complete(&self) {
    let subscribers = {
      let mut state = self.0.rc_deref_mut();
      if !state.status.is_open() {
        return;
      }
      state.status = SubjectStatus::Completed;
      std::mem::take(&mut state.subscribers)
    };
    trace!(subscribers = subscribers.len(), "subject completed");
    run_all(
      subscribers.into_iter().map(|s| move || s.complete()),
      "subscriber panicked while completing",
    );
  }
}

impl<Item: Clone, Err> Subject<Item, Err> {
  /// Broadcasts `value` to the subscribers attached right now, in attachment
  /// order. No-op once the subject is closed.
  pub fn next(&self, value: Item) {
    let subscribers = {
      let state = self.0.rc_deref();
      if !state.status.is_open() {
        return;
      }
      state.subscribers.clone()
    };
    // The last subscriber gets the moved value, everybody else a clone.
    let mut iter = subscribers.iter().peekable();
    while let Some(subscriber) = iter.next() {
      if iter.peek().is_some() {
        subscriber.next(value.clone());
      } else {
        subscriber.next(value);
        break;
      }
    }
  }
}

impl<Item, Err: Clone> Subject<Item, Err> {
  /// Errors every attached subscriber and keeps `err` for late subscribers.
  /// No-op once the subject is closed. Panicking handlers are handled as in
  /// [`Subject::complete`].
  pub fn error(&self, err: Err) {
    let subscribers = {
      let mut state = self.0.rc_deref_mut();
      if !state.status.is_open() {
        return;
      }
      state.status = SubjectStatus::Errored(err.clone());
      std::mem::take(&mut state.subscribers)
    };
    trace!(subscribers = subscribers.len(), "subject errored");
    run_all(
      subscribers.into_iter().map(|s| {
        let err = err.clone();
        move || s.error(err)
      }),
      "subscriber panicked while erroring",
    );
  }
}

impl<Item: 'static, Err: Clone + 'static> Subject<Item, Err> {
  /// Attaches `observer`.
  ///
  /// A closed subject does not attach anything: the observer receives the
  /// terminal notification immediately and the returned subscriber is
  /// already closed.
  pub fn subscribe_with(&self, observer: PartialObserver<Item, Err>) -> Subscriber<Item, Err> {
    let subscriber = Subscriber::new(observer);
    let status = {
      let mut state = self.0.rc_deref_mut();
      if state.status.is_open() {
        state.subscribers.retain(|s| !s.is_closed());
        state.subscribers.push(subscriber.clone());
      }
      state.status.clone()
    };
    match status {
      SubjectStatus::Open => {}
      SubjectStatus::Completed => subscriber.complete(),
      SubjectStatus::Errored(err) => subscriber.error(err),
    }
    subscriber
  }

  /// Attaches a subscriber with only a `next` handler.
  pub fn subscribe(&self, next: impl Fn(Item) + 'static) -> Subscriber<Item, Err> {
    self.subscribe_with(PartialObserver::new().on_next(next))
  }

  /// An observable view of this subject: subscribing to it attaches to the
  /// subject, unsubscribing detaches again.
  pub fn to_observable(&self) -> Observable<Item, Err> {
    let subject = self.clone();
    Observable::new(move |subscriber| {
      Ok(subject.subscribe_with(PartialObserver::forward_to(subscriber)))
    })
  }
}

impl<Item: Clone + 'static, Err: Clone + 'static> Subject<Item, Err> {
  /// An observer pushing into this subject, handy for multicasting a cold
  /// observable:
  ///
  /// ```rust
  /// use rxlite::prelude::*;
  ///
  /// let subject = Subject::<i32, ()>::new();
  /// let log = NotificationLog::new();
  /// subject.subscribe_with(log.observer());
  /// subject.subscribe_with(log.observer());
  ///
  /// observable::from_iter([1, 2]).subscribe_with(subject.to_observer());
  /// assert_eq!(log.values(), vec![1, 1, 2, 2]);
  /// ```
  pub fn to_observer(&self) -> PartialObserver<Item, Err> {
    PartialObserver::forward_to(self.clone())
  }
}

impl<Item: Clone, Err: Clone> Observer<Item, Err> for Subject<Item, Err> {
  #[inline]
  fn next(&self, value: Item) { Subject::next(self, value) }

  #[inline]
  fn error(&self, err: Err) { Subject::error(self, err) }

  #[inline]
  fn complete(&self) { Subject::complete(self) }

  #[inline]
  fn is_closed(&self) -> bool { Subject::is_closed(self) }
}

impl<Item, Err> Clone for Subject<Item, Err> {
  #[inline]
  fn clone(&self) -> Self { Subject(self.0.clone()) }
}

impl<Item, Err> Default for Subject<Item, Err> {
  fn default() -> Self { Self::new() }
}

impl<Item, Err: Debug> Debug for Subject<Item, Err> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let state = self.0.rc_deref();
    f.debug_struct("Subject")
      .field("status", &state.status)
      .field("subscribers", &state.subscribers.len())
      .finish()
  }
}
