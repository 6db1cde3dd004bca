//! Shared error types.
//!
//! - [`DeclarationError`] - raised while decorating a type
//! - [`Error`] / [`Result`] - everything a save or load can raise

mod error;

pub use error::*;
