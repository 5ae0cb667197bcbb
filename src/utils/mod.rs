//! Supporting infrastructure shared by the analysis and output layers.
//!
//! - [`graph`] - directed graphs with dominator computation, the base of the control flow graph
//! - [`CancellationToken`] - cooperative cancellation of long running requests

pub mod graph;
mod synchronization;

pub use synchronization::CancellationToken;
