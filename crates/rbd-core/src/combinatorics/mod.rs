//! Combinatorial pre-processing (C5, C6) that makes the generic and
//! identical K-of-N engines tractable: exact binomial coefficients and a
//! packed enumeration of every k-subset of the component indices.

pub mod binomial;
pub mod enumerate;

pub use binomial::{binomial, binomial_table};
pub use enumerate::{ComboDescriptor, CombinationTable};
