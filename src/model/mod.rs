//! # Hypergraph Model
//!
//! Plain data shared by every layer: atom types, handles, atoms,
//! truth values and execution values.
//!
//! Design rule: this module is pure data. No I/O, no locks, no store access.

pub mod atom_type;
pub mod atom;
pub mod truth;
pub mod value;

pub use atom_type::AtomType;
pub use atom::{Atom, AtomId, AtomKind, Handle, Outgoing, SpaceId};
pub use truth::TruthValue;
pub use value::Value;
