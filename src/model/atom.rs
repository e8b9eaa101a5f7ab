//! Atoms: interned nodes and links.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::{AtomType, TruthValue};

/// Opaque identifier of an atomspace instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpaceId(pub u64);

impl fmt::Display for SpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque atom identifier, unique within one atomspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AtomId(pub u64);

impl fmt::Display for AtomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to an atom. Only meaningful to the atomspace named by `space`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle {
    pub space: SpaceId,
    pub id: AtomId,
}

impl Handle {
    pub fn new(space: SpaceId, id: AtomId) -> Self {
        Self { space, id }
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.space, self.id)
    }
}

/// Outgoing set of a link. Most links have four or fewer members.
pub type Outgoing = SmallVec<[Handle; 4]>;

/// Payload distinguishing nodes from links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AtomKind {
    Node { name: String },
    Link { outgoing: Outgoing },
}

/// An atom stored in an atomspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    pub handle: Handle,
    pub atom_type: AtomType,
    pub kind: AtomKind,
    pub tv: TruthValue,
}

impl Atom {
    pub fn new_node(handle: Handle, atom_type: AtomType, name: impl Into<String>) -> Self {
        Self {
            handle,
            atom_type,
            kind: AtomKind::Node { name: name.into() },
            tv: TruthValue::DEFAULT,
        }
    }

    pub fn new_link(handle: Handle, atom_type: AtomType, outgoing: Outgoing) -> Self {
        Self {
            handle,
            atom_type,
            kind: AtomKind::Link { outgoing },
            tv: TruthValue::DEFAULT,
        }
    }

    pub fn is_node(&self) -> bool {
        matches!(self.kind, AtomKind::Node { .. })
    }

    pub fn is_link(&self) -> bool {
        matches!(self.kind, AtomKind::Link { .. })
    }

    /// Node name, or None for links.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            AtomKind::Node { name } => Some(name),
            AtomKind::Link { .. } => None,
        }
    }

    /// Outgoing set. Empty for nodes.
    pub fn outgoing(&self) -> &[Handle] {
        match &self.kind {
            AtomKind::Node { .. } => &[],
            AtomKind::Link { outgoing } => outgoing,
        }
    }

    pub fn arity(&self) -> usize {
        self.outgoing().len()
    }
}

/// Short, single-line form used in diagnostics: `(ConceptNode "atom1")`
/// or `(ListLink 1:3 1:4)`.
impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            AtomKind::Node { name } => write!(f, "({} \"{}\")", self.atom_type, escape(name)),
            AtomKind::Link { outgoing } => {
                write!(f, "({}", self.atom_type)?;
                for h in outgoing {
                    write!(f, " {h}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Escape a node name for s-expression output.
pub fn escape(name: &str) -> String {
    name.replace('\\', "\\\\").replace('"', "\\\"")
}
