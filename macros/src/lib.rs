mod log;
mod loggable;
mod traceable;
mod variant;

use proc_macro::TokenStream;

/// Emits a `loggable!`/`traceable!` value at its declared level.
///
/// `log!(entry)` logs the message, `log!(entry, debug_info)` attaches a
/// `Debug` field next to it.
#[proc_macro]
pub fn log(input: TokenStream) -> TokenStream {
    log::log_impl(input)
}

/// Declares a log entry enum whose variants carry a message and a level.
#[proc_macro]
pub fn loggable(input: TokenStream) -> TokenStream {
    loggable::loggable_impl(input)
}

/// Declares an error enum whose variants carry a message, a level and,
/// unless marked `#[no_source]`, the message of the underlying cause.
#[proc_macro]
pub fn traceable(input: TokenStream) -> TokenStream {
    traceable::traceable_impl(input)
}
