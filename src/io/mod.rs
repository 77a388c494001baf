//! Instance files and reference results.
//!
//! - [`parse_instance`] / [`read_instance`]: the whitespace-separated
//!   instance text format (cardinalities, type throughput, cost blocks,
//!   demands, availability blocks).
//! - [`parse_reference_costs`] / [`optimality_gap`]: comparing a found cost
//!   against a table of known optimal costs.

mod parser;
mod reference;

pub use parser::{parse_instance, read_instance};
pub use reference::{instance_name, optimality_gap, parse_reference_costs};
