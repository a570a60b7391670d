//! Read-only projections of a collated graph.

pub mod apparatus;
pub mod table;

pub use apparatus::{Apparatus, ApparatusEntry, EntryState};
pub use table::{AlignmentTable, TableRow};
