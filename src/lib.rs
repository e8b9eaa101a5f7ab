//! # atomspace-rs — Typed Hypergraph Store
//!
//! An in-process AtomSpace: typed nodes and links with interning,
//! construction-time validation, grounded procedures, and an error
//! boundary that turns every failure (including a panicking procedure)
//! into an ordinary `Result::Err`.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `StorageBackend` is the contract between the front end and the atom table
//! 2. **Validate, then store**: a rejected construction never reaches the backend
//! 3. **Resolve late**: grounded names are looked up when evaluated, not when built
//! 4. **Nothing unwinds out**: public entry points run inside `boundary::guard`
//!
//! ## Quick Start
//!
//! ```rust
//! use atomspace::{AtomSpace, AtomType, Error};
//!
//! # fn example() -> atomspace::Result<()> {
//! let space = AtomSpace::new();
//! let atom1 = space.add_node(AtomType::ConceptNode, "atom1")?;
//!
//! // Malformed query links are rejected with a descriptive error.
//! let err = space.add_link(AtomType::GetLink, &[atom1, atom1, atom1]).unwrap_err();
//! assert!(matches!(err, Error::Validation(_)));
//! assert!(err.to_string().contains("Expecting"));
//!
//! // Unknown grounded predicates fail at evaluation time.
//! let gpn = space.add_node(AtomType::GroundedPredicateNode, "py:foobar")?;
//! let eval = space.add_link(AtomType::EvaluationLink, &[gpn, atom1, atom1, atom1])?;
//! let err = space.evaluate(eval).unwrap_err();
//! assert!(err.to_string().contains("not found in module"));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod storage;
pub mod validation;
pub mod procedures;
pub mod eval;
pub mod boundary;
pub mod context;
pub mod constructors;
pub mod config;
pub mod export;

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

// ============================================================================
// Re-exports: Model
// ============================================================================

pub use model::{
    Atom, AtomId, AtomKind, AtomType, Handle, Outgoing, SpaceId,
    TruthValue, Value,
};

// ============================================================================
// Re-exports: Storage, procedures, config
// ============================================================================

pub use storage::{StorageBackend, MemoryBackend};
pub use procedures::{Procedure, ProcedureRegistry, SchemaRef};
pub use config::SpaceConfig;
pub use context::{ContextGuard, initialize, finalize};

// ============================================================================
// Top-level AtomSpace handle
// ============================================================================

/// The primary entry point. An `AtomSpace` wraps a storage backend and
/// a grounded-procedure registry. Cloning yields another handle to the
/// same store.
pub struct AtomSpace<B: StorageBackend = MemoryBackend> {
    backend: Arc<B>,
    procedures: Arc<RwLock<ProcedureRegistry<B>>>,
    config: Arc<SpaceConfig>,
}

impl<B: StorageBackend> Clone for AtomSpace<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            procedures: Arc::clone(&self.procedures),
            config: Arc::clone(&self.config),
        }
    }
}

impl<B: StorageBackend> AtomSpace<B> {
    /// Create an AtomSpace over the given backend with default settings.
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
            procedures: Arc::new(RwLock::new(ProcedureRegistry::new())),
            config: Arc::new(SpaceConfig::default()),
        }
    }

    /// Create an AtomSpace over the given backend with explicit settings.
    pub fn with_backend_and_config(backend: B, config: SpaceConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            ..Self::with_backend(backend)
        })
    }

    pub fn id(&self) -> SpaceId {
        self.backend.space_id()
    }

    pub fn config(&self) -> &SpaceConfig {
        &self.config
    }

    /// Access the underlying backend (for advanced use).
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// True if both handles refer to the same store.
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.backend, &other.backend)
    }

    // ========================================================================
    // Construction
    // ========================================================================

    /// Create (or find) a node. Same type and name yield the same handle.
    pub fn add_node(&self, atom_type: AtomType, name: &str) -> Result<Handle> {
        boundary::guard("add_node", || {
            let name = validation::canonical_node_name(atom_type, name)?;
            let handle = self.backend.insert_node(atom_type, &name)?;
            debug!(space = %self.id(), %handle, %atom_type, name = %name, "node added");
            Ok(handle)
        })
    }

    /// Create (or find) a link after checking its shape.
    pub fn add_link(&self, atom_type: AtomType, outgoing: &[Handle]) -> Result<Handle> {
        boundary::guard("add_link", || {
            let members = self.resolve_members(outgoing)?;
            validation::check_link(atom_type, &members)?;

            let mut outgoing = Outgoing::from_slice(outgoing);
            if atom_type.is_unordered() {
                outgoing.sort();
            }
            let handle = self.backend.insert_link(atom_type, outgoing)?;
            debug!(space = %self.id(), %handle, %atom_type, arity = members.len(), "link added");
            Ok(handle)
        })
    }

    fn resolve_members(&self, outgoing: &[Handle]) -> Result<Vec<Atom>> {
        let space = self.id();
        outgoing
            .iter()
            .map(|h| {
                if h.space != space {
                    return Err(Error::Validation(format!(
                        "Expecting atoms from atomspace {space}, got {h} from atomspace {}",
                        h.space
                    )));
                }
                self.backend
                    .get_atom(*h)?
                    .ok_or_else(|| Error::NotFound(format!("Atom {h}")))
            })
            .collect()
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    pub fn get_atom(&self, handle: Handle) -> Result<Option<Atom>> {
        self.backend.get_atom(handle)
    }

    /// Like `get_atom`, but absence is an error.
    pub fn atom(&self, handle: Handle) -> Result<Atom> {
        self.backend
            .get_atom(handle)?
            .ok_or_else(|| Error::NotFound(format!("Atom {handle}")))
    }

    /// Find a node without creating it.
    pub fn get_node(&self, atom_type: AtomType, name: &str) -> Result<Option<Handle>> {
        match validation::canonical_node_name(atom_type, name) {
            Ok(name) => self.backend.find_node(atom_type, &name),
            Err(_) => Ok(None),
        }
    }

    /// Find a link without creating it.
    pub fn get_link(&self, atom_type: AtomType, outgoing: &[Handle]) -> Result<Option<Handle>> {
        let mut outgoing = Outgoing::from_slice(outgoing);
        if atom_type.is_unordered() {
            outgoing.sort();
        }
        self.backend.find_link(atom_type, &outgoing)
    }

    pub fn contains(&self, handle: Handle) -> Result<bool> {
        self.backend.contains(handle)
    }

    pub fn incoming(&self, handle: Handle) -> Result<Vec<Handle>> {
        self.backend.incoming(handle)
    }

    /// Atoms of `atom_type` and its subtypes.
    pub fn atoms_by_type(&self, atom_type: AtomType) -> Result<Vec<Handle>> {
        self.backend.atoms_by_type(atom_type)
    }

    pub fn atom_count(&self) -> Result<usize> {
        self.backend.atom_count()
    }

    pub fn truth_value(&self, handle: Handle) -> Result<TruthValue> {
        Ok(self.atom(handle)?.tv)
    }

    pub fn set_truth_value(&self, handle: Handle, tv: TruthValue) -> Result<()> {
        self.backend.set_truth_value(handle, tv)
    }

    /// Render an atom and everything below it as an s-expression.
    pub fn atom_to_string(&self, handle: Handle) -> Result<String> {
        export::render_atom(self, handle)
    }

    // ========================================================================
    // Removal
    // ========================================================================

    /// Remove an atom. Without `recursive`, atoms still held by links are refused.
    pub fn remove_atom(&self, handle: Handle, recursive: bool) -> Result<bool> {
        boundary::guard("remove_atom", || self.backend.remove_atom(handle, recursive))
    }

    pub fn clear(&self) -> Result<()> {
        self.backend.clear()
    }

    // ========================================================================
    // Grounded procedures
    // ========================================================================

    /// Register a procedure under `lang:module.function`.
    /// Returns true if an earlier registration was replaced.
    pub fn register_procedure<F>(&self, lang: &str, module: &str, function: &str, f: F) -> bool
    where
        F: Fn(&AtomSpace<B>, &[Handle]) -> Result<Value> + Send + Sync + 'static,
    {
        debug!(space = %self.id(), lang, module, function, "procedure registered");
        self.procedures.write().register(lang, module, function, f)
    }

    /// Remove the procedure a grounded name refers to.
    pub fn unregister_procedure(&self, name: &str) -> Result<bool> {
        let schema = SchemaRef::parse(name, &self.config.default_module)?;
        Ok(self.procedures.write().unregister(&schema))
    }

    /// Would `name` resolve right now?
    pub fn has_procedure(&self, name: &str) -> Result<bool> {
        let schema = SchemaRef::parse(name, &self.config.default_module)?;
        Ok(self.procedures.read().contains(&schema))
    }

    /// Resolve a grounded name. The registry lock is released on return.
    pub fn resolve_procedure(&self, name: &str) -> Result<(SchemaRef, Procedure<B>)> {
        let schema = SchemaRef::parse(name, &self.config.default_module)?;
        let procedure = self.procedures.read().resolve(&schema)?;
        debug!(space = %self.id(), %schema, "procedure resolved");
        Ok((schema, procedure))
    }

    // ========================================================================
    // Evaluation
    // ========================================================================

    /// Compute the truth value of an atom.
    pub fn evaluate(&self, handle: Handle) -> Result<TruthValue> {
        eval::evaluate(self, handle)
    }

    /// Reduce an atom to a value.
    pub fn execute(&self, handle: Handle) -> Result<Value> {
        eval::execute(self, handle)
    }
}

/// In-memory atomspace for testing and embedding.
impl AtomSpace<MemoryBackend> {
    pub fn new() -> Self {
        Self::with_backend(MemoryBackend::new())
    }

    pub fn with_config(config: SpaceConfig) -> Result<Self> {
        Self::with_backend_and_config(MemoryBackend::new(), config)
    }
}

impl Default for AtomSpace<MemoryBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: StorageBackend> fmt::Debug for AtomSpace<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtomSpace")
            .field("id", &self.id())
            .field("name", &self.config.name)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Resolution error: {0}")]
    Resolution(String),

    #[error("Type error: expected {expected}, got {got}")]
    TypeError { expected: String, got: String },

    #[error("Execution error: {0}")]
    ExecutionError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Context error: {0}")]
    Context(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification of an [`Error`], for catching by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Resolution,
    Type,
    Execution,
    NotFound,
    ConstraintViolation,
    Context,
    Io,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::Resolution(_) => ErrorKind::Resolution,
            Error::TypeError { .. } => ErrorKind::Type,
            Error::ExecutionError(_) => ErrorKind::Execution,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::ConstraintViolation(_) => ErrorKind::ConstraintViolation,
            Error::Context(_) => ErrorKind::Context,
            Error::Io(_) | Error::Json(_) => ErrorKind::Io,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
