//! Method body parsing.
//!
//! [`MethodBody`] decodes the tiny and fat method header formats along with the exception
//! handling data sections that follow the code. The raw clauses it produces are validated
//! and normalized later by [`crate::analysis::ExceptionRegionTable`].

mod body;
mod exceptions;
mod types;

pub use body::{MethodBody, TINY_MAX_STACK};
pub use exceptions::{ExceptionHandler, ExceptionHandlerFlags};
pub use types::*;
