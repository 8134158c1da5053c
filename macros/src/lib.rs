use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, spanned::Spanned, ItemFn};

/// Marks a synchronous test that runs natively through `#[test]` and in the
/// browser through `wasm_bindgen_test`.
///
/// The engine has no runtime of its own, so async tests and flavor
/// arguments are rejected.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
  let input = parse_macro_input!(item as ItemFn);

  let raw_args = proc_macro2::TokenStream::from(attr);
  if !raw_args.is_empty() {
    return TokenStream::from(
      syn::Error::new(
        raw_args.span(),
        "rxlite_macro::test takes no arguments. Use #[rxlite_macro::test].",
      )
      .to_compile_error(),
    );
  }

  if let Some(asyncness) = input.sig.asyncness {
    return TokenStream::from(
      syn::Error::new(
        asyncness.span(),
        "rxlite_macro::test only supports synchronous tests: rxlite delivers every \
         notification on the caller's stack.",
      )
      .to_compile_error(),
    );
  }

  let expanded = quote! {
      #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
      #[cfg_attr(not(target_arch = "wasm32"), test)]
      #input
  };

  TokenStream::from(expanded)
}
