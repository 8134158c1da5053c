use crate::observable::Observable;

/// Creates an observable that produces values from an iterator.
///
/// Completes when all elements have been emitted. Never emits an error. The
/// iterator is cloned for every subscription, and emission stops early once
/// the subscriber is closed.
///
/// # Examples
///
/// ```
/// use rxlite::prelude::*;
///
/// observable::from_iter::<_, ()>(vec![0, 1, 2, 3]).subscribe(|v| println!("{},", v));
///
/// // print log:
/// // 0
/// // 1
/// // 2
/// // 3
/// ```
pub fn from_iter<Iter, Err>(iter: Iter) -> Observable<Iter::Item, Err>
where
  Iter: IntoIterator + Clone + 'static,
  Iter::Item: 'static,
  Err: 'static,
{
  Observable::new(move |subscriber| {
    for v in iter.clone() {
      if subscriber.is_stopped() {
        return Ok(());
      }
      subscriber.next(v);
    }
    subscriber.complete();
    Ok(())
  })
}
