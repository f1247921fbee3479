//! Procedural macros for the `skein` runtime.
//!
//! Both macros accept `worker_threads = N` and any number of
//! `pool(name = N)` entries:
//!
//! ```rust,ignore
//! #[skein::main(worker_threads = 4, pool(io = 2))]
//! async fn main() {}
//! ```

mod utils;

use proc_macro::{TokenStream, TokenTree};
use utils::{Options, compile_error, rewrite_body};

/// Runs an `async fn main` on a freshly built runtime.
#[proc_macro_attribute]
pub fn main(attr: TokenStream, item: TokenStream) -> TokenStream {
    match expand(attr, item) {
        Ok(tokens) => tokens.into_iter().collect(),
        Err(message) => compile_error(&message),
    }
}

/// Turns an `async fn` into a `#[test]` running on its own runtime.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    match expand(attr, item) {
        Ok(tokens) => {
            let test_attr: TokenStream = "#[test]".parse().unwrap_or_default();
            test_attr.into_iter().chain(tokens).collect()
        }
        Err(message) => compile_error(&message),
    }
}

/// Wraps the body of an async function in `block_on` on a new runtime.
fn expand(attr: TokenStream, item: TokenStream) -> Result<Vec<TokenTree>, String> {
    let builder = Options::parse(attr)?.builder();

    rewrite_body(item, |body| {
        format!(
            "{{
                let runtime = {builder};
                runtime.block_on(async move {{ {body} }})
            }}"
        )
    })
}
