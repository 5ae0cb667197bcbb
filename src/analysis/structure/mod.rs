//! Structural reduction of control flow graphs.
//!
//! Structured output renders a method body as nested `.try`, `.loop`, `.if` and `.else`
//! blocks. This module computes that nesting as a [`Region`] tree over the blocks of a
//! [`crate::analysis::ControlFlowGraph`]:
//!
//! - [`Region::TryHandler`] for every try range whose handlers follow it contiguously
//! - [`Region::Loop`] for every natural loop laid out contiguously
//! - [`Region::Conditional`] for two-way branches whose arms reconverge
//! - [`Region::Fallback`] for spans without a nested form, such as branches into the middle
//!   of a loop
//!
//! Reduction never fails. Unreducible spans are rendered flat and reported as
//! [`IrreducibleRegionWarning`]s.

mod reducer;
mod region;

pub use reducer::reduce;
pub use region::{HandlerRegion, IrreducibleRegionWarning, Region, RegionTree};
