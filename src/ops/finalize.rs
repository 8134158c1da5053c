use std::rc::Rc;

use crate::{
  observable::Observable, observer::PartialObserver, subscriber::Subscriber,
  subscription::Teardown,
};

/// Calls `callback` once the output subscription ends, whichever way it ends:
/// the source completes, the source errors, or the subscriber unsubscribes.
///
/// The callback runs at most once per subscription, after the terminal
/// notification has been delivered and after the source is torn down. A
/// subscription that never ends never runs it.
///
/// ```rust
/// use std::{cell::Cell, rc::Rc};
///
/// use rxlite::prelude::*;
///
/// let finalized = Rc::new(Cell::new(0));
/// let f = finalized.clone();
/// observable::from_iter::<_, ()>([1, 2])
///   .pipe(finalize(move || f.set(f.get() + 1)))
///   .subscribe(|_| {});
///
/// assert_eq!(finalized.get(), 1);
/// ```
pub fn finalize<Item, Err, F>(
  callback: F,
) -> impl FnOnce(Observable<Item, Err>) -> Observable<Item, Err>
where
  Item: 'static,
  Err: 'static,
  F: Fn() + 'static,
{
  move |source| {
    let callback = Rc::new(callback);
    Observable::new(move |output: Subscriber<Item, Err>| {
      source.subscribe_child(output.as_subscription(), PartialObserver::forward_to(output.clone()));
      let callback = callback.clone();
      Ok(Teardown::action(move || callback()))
    })
  }
}

#[cfg(test)]
mod test {
  use std::{
    cell::{Cell, RefCell},
    rc::Rc,
  };

  use crate::prelude::*;

  fn counter() -> (Rc<Cell<usize>>, impl Fn() + 'static) {
    let count = Rc::new(Cell::new(0));
    let c = count.clone();
    (count, move || c.set(c.get() + 1))
  }

  #[rxlite_macro::test]
  fn finalize_on_complete() {
    let (count, callback) = counter();
    let subject = Subject::<i32, ()>::new();
    let log = NotificationLog::new();
    subject
      .to_observable()
      .pipe(finalize(callback))
      .subscribe_with(log.observer());

    subject.next(1);
    assert_eq!(count.get(), 0);
    subject.complete();
    assert_eq!(count.get(), 1);
    assert_eq!(log.events(), vec![Notification::Next(1), Notification::Complete]);
  }

  #[rxlite_macro::test]
  fn finalize_on_error() {
    let (count, callback) = counter();
    let subject = Subject::<i32, &str>::new();
    let sub = subject.to_observable().pipe(finalize(callback)).subscribe(|_| {});

    subject.error("oops");
    sub.unsubscribe();
    assert_eq!(count.get(), 1);
  }

  #[rxlite_macro::test]
  fn finalize_on_unsubscribe() {
    let (count, callback) = counter();
    let sub = observable::never::<i32, ()>()
      .pipe(finalize(callback))
      .subscribe(|_| {});

    assert_eq!(count.get(), 0);
    sub.unsubscribe();
    sub.unsubscribe();
    assert_eq!(count.get(), 1);
  }

  #[rxlite_macro::test]
  fn never_finalized_without_terminal_event() {
    let (count, callback) = counter();
    let _sub = observable::never::<i32, ()>()
      .pipe(finalize(callback))
      .subscribe(|_| {});
    assert_eq!(count.get(), 0);
  }

  #[rxlite_macro::test]
  fn runs_after_notification_and_source_teardown() {
    let order = Rc::new(RefCell::new(vec![]));
    let (o1, o2, o3) = (order.clone(), order.clone(), order.clone());
    let source = Observable::<i32, ()>::new(move |s| {
      s.complete();
      let o = o1.clone();
      Ok(Teardown::action(move || o.borrow_mut().push("source teardown")))
    });

    source
      .pipe(finalize(move || o2.borrow_mut().push("finalize")))
      .subscribe_with(PartialObserver::new().on_complete(move || o3.borrow_mut().push("complete")));

    assert_eq!(*order.borrow(), vec!["complete", "source teardown", "finalize"]);
  }

  #[rxlite_macro::test]
  fn each_subscription_finalizes_once() {
    let (count, callback) = counter();
    let o = observable::of::<_, ()>(1).pipe(finalize(callback));
    o.subscribe(|_| {});
    o.subscribe(|_| {});
    assert_eq!(count.get(), 2);
  }
}
