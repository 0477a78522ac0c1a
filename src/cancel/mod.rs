//! Cancellation tokens.

mod token;

pub use token::CancelToken;
