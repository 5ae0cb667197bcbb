//! Raw byte access.
//!
//! - [`io`] - little-endian primitive reads with bounds checking
//! - [`parser`] - the cursor [`parser::Parser`] used by the decoder and body parser
//! - [`Physical`] - memory-mapped files, used to load documentation files

pub mod io;
pub mod parser;

mod physical;

pub use physical::Physical;
