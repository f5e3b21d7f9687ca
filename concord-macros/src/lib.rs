//! Attribute macros for the Concord runtime.

mod utils;

use proc_macro::TokenStream;
use utils::{RuntimeArgs, compile_error, wrap_in_runtime};

/// Runs an `async fn main` on a Concord runtime.
///
/// Accepts `worker_threads = N` to size the executor.
///
/// ```rust,ignore
/// #[concord::main(worker_threads = 2)]
/// async fn main() {
///     // ...
/// }
/// ```
#[proc_macro_attribute]
pub fn main(attr: TokenStream, item: TokenStream) -> TokenStream {
    let tokens = RuntimeArgs::parse(attr).and_then(|args| wrap_in_runtime(item, &args));

    match tokens {
        Ok(tokens) => tokens.into_iter().collect(),
        Err(message) => compile_error(&message),
    }
}

/// Runs an `async` test on a fresh Concord runtime.
///
/// Accepts `worker_threads = N`; `worker_threads = 1` gives a strictly
/// single-threaded scheduler, useful to assert on wake-up order.
///
/// ```rust,ignore
/// #[concord::test(worker_threads = 1)]
/// async fn fifo() {
///     // ...
/// }
/// ```
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let tokens = RuntimeArgs::parse(attr).and_then(|args| wrap_in_runtime(item, &args));

    match tokens {
        Ok(tokens) => {
            let mut result: Vec<_> = "#[::core::prelude::v1::test]"
                .parse::<TokenStream>()
                .unwrap_or_default()
                .into_iter()
                .collect();
            result.extend(tokens);
            result.into_iter().collect()
        }
        Err(message) => compile_error(&message),
    }
}
