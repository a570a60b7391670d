//! Core types for the collation kernel.

pub mod token;
pub mod witness;
pub mod vertex;
pub mod edge;
pub mod transposition;
pub mod limits;

pub use token::{Sigil, Token, tokens_to_string};
pub use witness::{Witness, WitnessError};
pub use vertex::{Vertex, VertexId};
pub use edge::{Edge, EdgeId};
pub use transposition::{Transposition, TranspositionId};
pub use limits::{CollationLimits, LimitViolation};
