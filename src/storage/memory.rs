//! In-memory storage backend.
//!
//! This is the reference implementation of `StorageBackend`.
//! It uses HashMaps behind a single RwLock, so every insertion and
//! removal (including index maintenance) is atomic with respect to
//! other callers.
//!
//! ## Limitations
//!
//! - **No persistence**: dropping the last handle drops every atom.
//! - **Coarse locking**: one writer at a time for the whole table.
//!   Fine for single-threaded or read-heavy use.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use parking_lot::RwLock;

use crate::model::*;
use crate::{Error, Result};
use super::StorageBackend;

/// Source of process-unique space identifiers.
static NEXT_SPACE_ID: AtomicU64 = AtomicU64::new(1);

// ============================================================================
// MemoryBackend
// ============================================================================

/// In-memory atom table. Cloning shares the same table.
#[derive(Clone)]
pub struct MemoryBackend {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    space: SpaceId,
    table: RwLock<Table>,
    next_atom_id: AtomicU64,
}

#[derive(Default)]
struct Table {
    atoms: HashMap<AtomId, Atom>,
    /// (type, name) → node id
    nodes: HashMap<(AtomType, String), AtomId>,
    /// (type, outgoing) → link id
    links: HashMap<(AtomType, Outgoing), AtomId>,
    /// atom id → links holding it
    incoming: HashMap<AtomId, Vec<Handle>>,
    /// exact type → ids in creation order
    by_type: HashMap<AtomType, Vec<AtomId>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        let space = SpaceId(NEXT_SPACE_ID.fetch_add(1, Ordering::Relaxed));
        Self {
            inner: Arc::new(MemoryInner {
                space,
                table: RwLock::new(Table::default()),
                next_atom_id: AtomicU64::new(1),
            }),
        }
    }

    fn next_handle(&self) -> Handle {
        let id = AtomId(self.inner.next_atom_id.fetch_add(1, Ordering::Relaxed));
        Handle::new(self.inner.space, id)
    }

    fn is_local(&self, handle: Handle) -> bool {
        handle.space == self.inner.space
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Table {
    fn index(&mut self, atom: Atom) {
        let id = atom.handle.id;
        for h in atom.outgoing() {
            let inc = self.incoming.entry(h.id).or_default();
            if !inc.contains(&atom.handle) {
                inc.push(atom.handle);
            }
        }
        self.by_type.entry(atom.atom_type).or_default().push(id);
        self.atoms.insert(id, atom);
    }

    fn remove(&mut self, id: AtomId, recursive: bool) -> Result<bool> {
        let Some(atom) = self.atoms.get(&id) else {
            return Ok(false);
        };
        let handle = atom.handle;

        let holders = self.incoming.get(&id).map_or(0, Vec::len);
        if holders > 0 && !recursive {
            return Err(Error::ConstraintViolation(format!(
                "Cannot remove atom {handle} with {holders} incoming links. Remove them first."
            )));
        }

        // Everything that transitively holds `id`, found with an explicit
        // work stack so nesting depth never reaches the call stack.
        let mut doomed: HashSet<AtomId> = HashSet::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if !doomed.insert(next) {
                continue;
            }
            if let Some(inc) = self.incoming.get(&next) {
                stack.extend(inc.iter().map(|h| h.id));
            }
        }

        // Surviving atoms that lose incoming links.
        let mut touched: HashSet<AtomId> = HashSet::new();
        for gone in &doomed {
            let Some(atom) = self.atoms.remove(gone) else {
                continue;
            };
            match atom.kind {
                AtomKind::Node { name } => {
                    self.nodes.remove(&(atom.atom_type, name));
                }
                AtomKind::Link { outgoing } => {
                    touched.extend(outgoing.iter().map(|h| h.id).filter(|m| !doomed.contains(m)));
                    self.links.remove(&(atom.atom_type, outgoing));
                }
            }
            self.incoming.remove(gone);
        }
        for member in touched {
            if let Some(inc) = self.incoming.get_mut(&member) {
                inc.retain(|x| !doomed.contains(&x.id));
            }
        }
        for ids in self.by_type.values_mut() {
            ids.retain(|x| !doomed.contains(x));
        }
        Ok(true)
    }
}

// ============================================================================
// StorageBackend impl
// ============================================================================

impl StorageBackend for MemoryBackend {
    fn space_id(&self) -> SpaceId {
        self.inner.space
    }

    fn insert_node(&self, atom_type: AtomType, name: &str) -> Result<Handle> {
        let key = (atom_type, name.to_string());
        let mut table = self.inner.table.write();
        if let Some(id) = table.nodes.get(&key) {
            return Ok(Handle::new(self.inner.space, *id));
        }

        let handle = self.next_handle();
        table.nodes.insert(key, handle.id);
        table.index(Atom::new_node(handle, atom_type, name));
        Ok(handle)
    }

    fn insert_link(&self, atom_type: AtomType, outgoing: Outgoing) -> Result<Handle> {
        if let Some(foreign) = outgoing.iter().find(|h| !self.is_local(**h)) {
            return Err(Error::NotFound(format!("Atom {foreign} in atomspace {}", self.inner.space)));
        }

        let mut table = self.inner.table.write();
        if let Some(missing) = outgoing.iter().find(|h| !table.atoms.contains_key(&h.id)) {
            return Err(Error::NotFound(format!("Atom {missing}")));
        }

        let key = (atom_type, outgoing);
        if let Some(id) = table.links.get(&key) {
            return Ok(Handle::new(self.inner.space, *id));
        }

        let handle = self.next_handle();
        table.links.insert(key.clone(), handle.id);
        table.index(Atom::new_link(handle, atom_type, key.1));
        Ok(handle)
    }

    fn get_atom(&self, handle: Handle) -> Result<Option<Atom>> {
        if !self.is_local(handle) {
            return Ok(None);
        }
        Ok(self.inner.table.read().atoms.get(&handle.id).cloned())
    }

    fn find_node(&self, atom_type: AtomType, name: &str) -> Result<Option<Handle>> {
        let table = self.inner.table.read();
        Ok(table
            .nodes
            .get(&(atom_type, name.to_string()))
            .map(|id| Handle::new(self.inner.space, *id)))
    }

    fn find_link(&self, atom_type: AtomType, outgoing: &[Handle]) -> Result<Option<Handle>> {
        let table = self.inner.table.read();
        Ok(table
            .links
            .get(&(atom_type, Outgoing::from_slice(outgoing)))
            .map(|id| Handle::new(self.inner.space, *id)))
    }

    fn incoming(&self, handle: Handle) -> Result<Vec<Handle>> {
        if !self.is_local(handle) {
            return Ok(Vec::new());
        }
        Ok(self.inner.table.read().incoming.get(&handle.id).cloned().unwrap_or_default())
    }

    fn atoms_of_type(&self, atom_type: AtomType) -> Result<Vec<Handle>> {
        let table = self.inner.table.read();
        Ok(table
            .by_type
            .get(&atom_type)
            .map(|ids| ids.iter().map(|id| Handle::new(self.inner.space, *id)).collect())
            .unwrap_or_default())
    }

    fn all_atoms(&self) -> Result<Vec<Atom>> {
        let table = self.inner.table.read();
        let mut atoms: Vec<Atom> = table.atoms.values().cloned().collect();
        atoms.sort_by_key(|a| a.handle);
        Ok(atoms)
    }

    fn atom_count(&self) -> Result<usize> {
        Ok(self.inner.table.read().atoms.len())
    }

    fn set_truth_value(&self, handle: Handle, tv: TruthValue) -> Result<()> {
        let mut table = self.inner.table.write();
        let atom = table
            .atoms
            .get_mut(&handle.id)
            .filter(|a| a.handle == handle)
            .ok_or_else(|| Error::NotFound(format!("Atom {handle}")))?;
        atom.tv = tv;
        Ok(())
    }

    fn remove_atom(&self, handle: Handle, recursive: bool) -> Result<bool> {
        if !self.is_local(handle) {
            return Ok(false);
        }
        self.inner.table.write().remove(handle.id, recursive)
    }

    fn clear(&self) -> Result<()> {
        *self.inner.table.write() = Table::default();
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn test_node_interning() {
        let db = MemoryBackend::new();
        let a = db.insert_node(AtomType::ConceptNode, "atom1").unwrap();
        let b = db.insert_node(AtomType::ConceptNode, "atom1").unwrap();
        let c = db.insert_node(AtomType::PredicateNode, "atom1").unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(db.atom_count().unwrap(), 2);
    }

    #[test]
    fn test_link_interning_and_incoming() {
        let db = MemoryBackend::new();
        let a = db.insert_node(AtomType::ConceptNode, "a").unwrap();
        let b = db.insert_node(AtomType::ConceptNode, "b").unwrap();

        let l1 = db.insert_link(AtomType::ListLink, smallvec![a, b]).unwrap();
        let l2 = db.insert_link(AtomType::ListLink, smallvec![a, b]).unwrap();
        let l3 = db.insert_link(AtomType::ListLink, smallvec![b, a]).unwrap();

        assert_eq!(l1, l2);
        assert_ne!(l1, l3);
        assert_eq!(db.incoming(a).unwrap(), vec![l1, l3]);
        assert_eq!(db.find_link(AtomType::ListLink, &[a, b]).unwrap(), Some(l1));
    }

    #[test]
    fn test_repeated_member_counted_once() {
        let db = MemoryBackend::new();
        let a = db.insert_node(AtomType::ConceptNode, "a").unwrap();
        let l = db.insert_link(AtomType::ListLink, smallvec![a, a, a]).unwrap();
        assert_eq!(db.incoming(a).unwrap(), vec![l]);
    }

    #[test]
    fn test_cannot_remove_held_atom() {
        let db = MemoryBackend::new();
        let a = db.insert_node(AtomType::ConceptNode, "a").unwrap();
        db.insert_link(AtomType::ListLink, smallvec![a]).unwrap();

        assert!(matches!(db.remove_atom(a, false), Err(Error::ConstraintViolation(_))));
        assert!(db.contains(a).unwrap());
    }

    #[test]
    fn test_recursive_remove() {
        let db = MemoryBackend::new();
        let a = db.insert_node(AtomType::ConceptNode, "a").unwrap();
        let b = db.insert_node(AtomType::ConceptNode, "b").unwrap();
        let inner = db.insert_link(AtomType::ListLink, smallvec![a, b]).unwrap();
        db.insert_link(AtomType::SetLink, smallvec![inner]).unwrap();

        assert!(db.remove_atom(a, true).unwrap());
        assert_eq!(db.atom_count().unwrap(), 1);
        assert!(db.contains(b).unwrap());
        assert!(db.incoming(b).unwrap().is_empty());
        assert_eq!(db.find_node(AtomType::ConceptNode, "a").unwrap(), None);
    }

    #[test]
    fn test_recursive_remove_of_deep_chain() {
        let db = MemoryBackend::new();
        let leaf = db.insert_node(AtomType::ConceptNode, "leaf").unwrap();
        let keep = db.insert_node(AtomType::ConceptNode, "keep").unwrap();
        let mut top = leaf;
        for _ in 0..100_000 {
            top = db.insert_link(AtomType::ListLink, smallvec![top, keep]).unwrap();
        }
        assert_eq!(db.atom_count().unwrap(), 100_002);

        assert!(db.remove_atom(leaf, true).unwrap());
        assert_eq!(db.atom_count().unwrap(), 1);
        assert!(!db.contains(top).unwrap());
        assert!(db.incoming(keep).unwrap().is_empty());
        assert!(db.atoms_of_type(AtomType::ListLink).unwrap().is_empty());
    }

    #[test]
    fn test_foreign_handles() {
        let db1 = MemoryBackend::new();
        let db2 = MemoryBackend::new();
        assert_ne!(db1.space_id(), db2.space_id());

        let a = db1.insert_node(AtomType::ConceptNode, "a").unwrap();
        assert_eq!(db2.get_atom(a).unwrap(), None);
        assert!(matches!(
            db2.insert_link(AtomType::ListLink, smallvec![a]),
            Err(Error::NotFound(_))
        ));
        assert_eq!(db2.atom_count().unwrap(), 0);
    }

    #[test]
    fn test_atoms_by_type_includes_subtypes() {
        let db = MemoryBackend::new();
        let p = db.insert_node(AtomType::PredicateNode, "p").unwrap();
        let g = db.insert_node(AtomType::GroundedPredicateNode, "py:g").unwrap();
        db.insert_node(AtomType::ConceptNode, "c").unwrap();

        assert_eq!(db.atoms_by_type(AtomType::PredicateNode).unwrap(), vec![p, g]);
        assert_eq!(db.atoms_of_type(AtomType::PredicateNode).unwrap(), vec![p]);
    }

    #[test]
    fn test_truth_value_and_clear() {
        let db = MemoryBackend::new();
        let a = db.insert_node(AtomType::ConceptNode, "a").unwrap();
        db.set_truth_value(a, TruthValue::new(0.8, 0.9)).unwrap();
        assert_eq!(db.get_atom(a).unwrap().unwrap().tv, TruthValue::new(0.8, 0.9));

        db.clear().unwrap();
        assert_eq!(db.atom_count().unwrap(), 0);
        assert!(db.set_truth_value(a, TruthValue::TRUE).is_err());
    }
}
