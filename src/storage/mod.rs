//! # Storage Backend Trait
//!
//! This is the contract between the atomspace front end and any atom table.
//! Backends only store and index atoms; construction validation happens
//! before a backend is ever called, so a backend may assume its inputs
//! are well-formed.
//!
//! ## Implementations
//!
//! | Backend | Module | Description |
//! |---------|--------|-------------|
//! | `MemoryBackend` | `memory` | Interning in-memory atom table |

pub mod memory;

use crate::model::*;
use crate::Result;

pub use memory::MemoryBackend;

// ============================================================================
// StorageBackend Trait
// ============================================================================

/// The atom table contract.
///
/// Interning is the backend's job: inserting a node with an existing
/// `(type, name)` or a link with an existing `(type, outgoing)` must return
/// the handle already stored, not a new one.
pub trait StorageBackend: Send + Sync + 'static {
    /// Identifier stamped on every handle this backend issues.
    fn space_id(&self) -> SpaceId;

    // ========================================================================
    // Insertion (interning)
    // ========================================================================

    /// Insert a node, or return the existing one with the same type and name.
    fn insert_node(&self, atom_type: AtomType, name: &str) -> Result<Handle>;

    /// Insert a link, or return the existing one with the same type and
    /// outgoing set. Unordered link types arrive already canonicalized.
    fn insert_link(&self, atom_type: AtomType, outgoing: Outgoing) -> Result<Handle>;

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Get an atom by handle. Returns None if it is absent or foreign.
    fn get_atom(&self, handle: Handle) -> Result<Option<Atom>>;

    /// Find an existing node without creating it.
    fn find_node(&self, atom_type: AtomType, name: &str) -> Result<Option<Handle>>;

    /// Find an existing link without creating it.
    fn find_link(&self, atom_type: AtomType, outgoing: &[Handle]) -> Result<Option<Handle>>;

    /// Links that contain `handle` in their outgoing set.
    fn incoming(&self, handle: Handle) -> Result<Vec<Handle>>;

    /// All atoms of exactly `atom_type`, in creation order.
    fn atoms_of_type(&self, atom_type: AtomType) -> Result<Vec<Handle>>;

    /// Every stored atom, in creation order.
    fn all_atoms(&self) -> Result<Vec<Atom>>;

    fn atom_count(&self) -> Result<usize>;

    /// Does the store hold this handle?
    ///
    /// Default: a `get_atom` round trip.
    fn contains(&self, handle: Handle) -> Result<bool> {
        Ok(self.get_atom(handle)?.is_some())
    }

    /// All atoms of `atom_type` or any of its subtypes.
    ///
    /// Default: one `atoms_of_type` call per subtype.
    fn atoms_by_type(&self, atom_type: AtomType) -> Result<Vec<Handle>> {
        let mut out = Vec::new();
        for t in atom_type.subtypes() {
            out.extend(self.atoms_of_type(t)?);
        }
        out.sort();
        Ok(out)
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    fn set_truth_value(&self, handle: Handle, tv: TruthValue) -> Result<()>;

    /// Remove an atom. Returns true if it existed.
    /// Fails if the atom still has incoming links, unless `recursive`,
    /// in which case those links are removed first.
    fn remove_atom(&self, handle: Handle, recursive: bool) -> Result<bool>;

    /// Drop every atom.
    fn clear(&self) -> Result<()>;
}
