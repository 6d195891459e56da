//! Errors potentially happening while `#[derive]`ing `Shape`.

use std::fmt;
use std::error;
use std::result;
use proc_macro2::{ Span, TokenStream };
use quote::ToTokens;

/// Returns `Err(Error)` built from a format string and its arguments.
macro_rules! err_fmt {
    ($($arg:tt)*) => {
        Err($crate::error::Error::new(format!($($arg)*)))
    }
}

/// Convenience type alias for a result that holds a `mongo_connector_derive::Error` value.
pub type Result<T> = result::Result<T, Error>;

/// An error that potentially happens while `#[derive]`ing `Shape`.
#[derive(Debug)]
pub struct Error {
    /// The error message.
    message: String,
    /// Where in the input the error should be reported.
    span: Span,
}

impl Error {
    /// Creates an `Error` instance with the specified message,
    /// pointing at the whole derive input.
    pub fn new<T: Into<String>>(message: T) -> Self {
        Error {
            message: message.into(),
            span: Span::call_site(),
        }
    }

    /// Creates an `Error` instance pointing at the given tokens.
    pub fn spanned<T: ToTokens, M: Into<String>>(tokens: T, message: M) -> Self {
        let span = tokens
            .into_token_stream()
            .into_iter()
            .next()
            .map_or_else(Span::call_site, |token| token.span());

        Error {
            message: message.into(),
            span,
        }
    }

    /// Turns the error into a `compile_error!()` invocation.
    pub fn into_compile_error(self) -> TokenStream {
        syn::Error::new(self.span, self.message).to_compile_error()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.message.fmt(f)
    }
}

impl error::Error for Error {}

impl From<syn::Error> for Error {
    fn from(error: syn::Error) -> Self {
        Error {
            message: error.to_string(),
            span: error.span(),
        }
    }
}
