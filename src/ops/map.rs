use std::rc::Rc;

use crate::{observable::Observable, observer::PartialObserver, subscriber::Subscriber};

/// Creates a new stream which calls a closure on each element and uses
/// its return as the value.
///
/// `error` and `complete` pass through unchanged.
pub fn map<Item, R, Err, F>(
  f: F,
) -> impl FnOnce(Observable<Item, Err>) -> Observable<R, Err>
where
  Item: 'static,
  R: 'static,
  Err: 'static,
  F: Fn(Item) -> R + 'static,
{
  try_map(move |v| Ok(f(v)))
}

/// Like [`map`], but the projection may fail. The first `Err` is emitted as
/// the output error and the source is unsubscribed.
///
/// ```rust
/// use rxlite::prelude::*;
///
/// let log = NotificationLog::new();
/// observable::from_iter([1, 2, 3])
///   .pipe(try_map(|v| if v == 2 { Err("two") } else { Ok(v) }))
///   .subscribe_with(log.observer());
///
/// assert_eq!(log.events(), vec![Notification::Next(1), Notification::Error("two")]);
/// ```
pub fn try_map<Item, R, Err, F>(
  project: F,
) -> impl FnOnce(Observable<Item, Err>) -> Observable<R, Err>
where
  Item: 'static,
  R: 'static,
  Err: 'static,
  F: Fn(Item) -> Result<R, Err> + 'static,
{
  move |source| {
    let project = Rc::new(project);
    Observable::new(move |output: Subscriber<R, Err>| {
      let project = project.clone();
      let (next, error, complete) = (output.clone(), output.clone(), output.clone());
      source.subscribe_child(
        output.as_subscription(),
        PartialObserver::new()
          .on_next(move |v| {
            if next.is_stopped() {
              return;
            }
            match project(v) {
              Ok(v) => next.next(v),
              Err(e) => next.error(e),
            }
          })
          .on_error(move |e| error.error(e))
          .on_complete(move || complete.complete()),
      );
      Ok(())
    })
  }
}
