use crate::observable::Observable;

/// Creates an observable producing a single value.
///
/// Completes immediately after emitting the value given. Never emits an error.
///
/// # Examples
///
/// ```
/// use rxlite::prelude::*;
///
/// observable::of::<_, ()>(123).subscribe(|v| println!("{},", v));
/// ```
pub fn of<Item, Err>(v: Item) -> Observable<Item, Err>
where
  Item: Clone + 'static,
  Err: 'static,
{
  Observable::new(move |subscriber| {
    subscriber.next(v.clone());
    subscriber.complete();
    Ok(())
  })
}
