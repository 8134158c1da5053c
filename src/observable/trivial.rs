use crate::observable::Observable;

/// Creates an observable that emits no items, just terminates with an error.
///
/// # Arguments
///
/// * `e` - An error to emit and terminate with
pub fn throw_err<Item, Err>(e: Err) -> Observable<Item, Err>
where
  Item: 'static,
  Err: Clone + 'static,
{
  Observable::new(move |subscriber| {
    subscriber.error(e.clone());
    Ok(())
  })
}

/// Creates an observable that produces no values.
///
/// Completes immediately. Never emits an error.
///
/// # Examples
/// ```
/// use rxlite::prelude::*;
///
/// observable::empty::<i32, ()>().subscribe(|v| println!("{},", v));
///
/// // Result: no thing printed
/// ```
pub fn empty<Item: 'static, Err: 'static>() -> Observable<Item, Err> {
  Observable::new(|subscriber| {
    subscriber.complete();
    Ok(())
  })
}

/// Creates an observable that never emits anything.
///
/// Neither emits a value, nor completes, nor emits an error.
pub fn never<Item: 'static, Err: 'static>() -> Observable<Item, Err> {
  Observable::new(|_| Ok(()))
}
