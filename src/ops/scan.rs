use std::rc::Rc;

use crate::{
  observable::Observable,
  observer::PartialObserver,
  rc::{MutRc, RcDeref},
  subscriber::Subscriber,
};

/// The Scan operator applies a function to the first item emitted by the
/// source observable and then emits the result of that function as its
/// own first emission. It also feeds the result of the function back into
/// the function along with the second item emitted by the source observable
/// in order to generate its second emission. It continues to feed back its
/// own subsequent emissions along with the subsequent emissions from the
/// source Observable in order to create the rest of its sequence.
///
/// Every subscription starts over from a fresh clone of `seed`.
///
/// ```rust
/// use rxlite::prelude::*;
///
/// let log = NotificationLog::<i32, ()>::new();
/// observable::from_iter([1, 2, 4])
///   .pipe(scan(|acc, v| acc + v, 0))
///   .subscribe_with(log.observer());
///
/// assert_eq!(log.values(), vec![1, 3, 7]);
/// ```
pub fn scan<Item, Acc, Err, F>(
  accumulator: F,
  seed: Acc,
) -> impl FnOnce(Observable<Item, Err>) -> Observable<Acc, Err>
where
  Item: 'static,
  Acc: Clone + 'static,
  Err: 'static,
  F: Fn(Acc, Item) -> Acc + 'static,
{
  try_scan(move |acc, v| Ok(accumulator(acc, v)), seed)
}

/// Like [`scan`], but the accumulator may fail. The first `Err` is emitted
/// as the output error and the source is unsubscribed.
pub fn try_scan<Item, Acc, Err, F>(
  accumulator: F,
  seed: Acc,
) -> impl FnOnce(Observable<Item, Err>) -> Observable<Acc, Err>
where
  Item: 'static,
  Acc: Clone + 'static,
  Err: 'static,
  F: Fn(Acc, Item) -> Result<Acc, Err> + 'static,
{
  move |source| {
    let accumulator = Rc::new(accumulator);
    Observable::new(move |output: Subscriber<Acc, Err>| {
      let accumulator = accumulator.clone();
      let acc = MutRc::own(seed.clone());
      let (next, error, complete) = (output.clone(), output.clone(), output.clone());
      source.subscribe_child(
        output.as_subscription(),
        PartialObserver::new()
          .on_next(move |v| {
            if next.is_stopped() {
              return;
            }
            // The cell keeps its value while the accumulator runs, so a value
            // the accumulator causes the source to emit folds in as usual.
            let current = acc.rc_deref().clone();
            match accumulator(current, v) {
              Ok(value) => {
                acc.replace(value.clone());
                next.next(value);
              }
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
