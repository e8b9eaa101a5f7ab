//! Free constructors over the active atomspace.
//!
//! Each function builds in the atomspace bound by
//! [`initialize`](crate::context::initialize) on the calling thread and
//! fails with `Error::Context` when none is bound.
//!
//! ```rust
//! use atomspace::{constructors::*, AtomSpace};
//!
//! let space = AtomSpace::new();
//! atomspace::initialize(&space);
//! let cat = concept_node("cat").unwrap();
//! let animal = concept_node("animal").unwrap();
//! let pair = list_link(&[cat, animal]).unwrap();
//! assert!(space.contains(pair).unwrap());
//! atomspace::finalize();
//! ```

use crate::context;
use crate::model::{AtomType, Handle, TruthValue, Value};
use crate::validation::format_number;
use crate::Result;

// ============================================================================
// Generic
// ============================================================================

pub fn node(atom_type: AtomType, name: &str) -> Result<Handle> {
    context::active()?.add_node(atom_type, name)
}

pub fn link(atom_type: AtomType, outgoing: &[Handle]) -> Result<Handle> {
    context::active()?.add_link(atom_type, outgoing)
}

// ============================================================================
// Nodes
// ============================================================================

pub fn concept_node(name: &str) -> Result<Handle> {
    node(AtomType::ConceptNode, name)
}

pub fn predicate_node(name: &str) -> Result<Handle> {
    node(AtomType::PredicateNode, name)
}

/// `name` must have the form `lang:[module.]function`.
pub fn grounded_predicate_node(name: &str) -> Result<Handle> {
    node(AtomType::GroundedPredicateNode, name)
}

/// `name` must have the form `lang:[module.]function`.
pub fn grounded_schema_node(name: &str) -> Result<Handle> {
    node(AtomType::GroundedSchemaNode, name)
}

pub fn variable_node(name: &str) -> Result<Handle> {
    node(AtomType::VariableNode, name)
}

pub fn number_node(value: f64) -> Result<Handle> {
    node(AtomType::NumberNode, &format_number(value))
}

pub fn type_node(atom_type: AtomType) -> Result<Handle> {
    node(AtomType::TypeNode, atom_type.name())
}

// ============================================================================
// Links
// ============================================================================

pub fn list_link(outgoing: &[Handle]) -> Result<Handle> {
    link(AtomType::ListLink, outgoing)
}

/// `(GetLink [vardecl] body)`; any other arity is rejected.
pub fn get_link(outgoing: &[Handle]) -> Result<Handle> {
    link(AtomType::GetLink, outgoing)
}

/// `(EvaluationLink predicate args...)`
pub fn evaluation_link(predicate: Handle, args: &[Handle]) -> Result<Handle> {
    let mut outgoing = Vec::with_capacity(args.len() + 1);
    outgoing.push(predicate);
    outgoing.extend_from_slice(args);
    link(AtomType::EvaluationLink, &outgoing)
}

/// `(ExecutionOutputLink schema (ListLink args...))`
pub fn execution_output_link(schema: Handle, args: &[Handle]) -> Result<Handle> {
    let args = list_link(args)?;
    link(AtomType::ExecutionOutputLink, &[schema, args])
}

// ============================================================================
// Evaluation
// ============================================================================

pub fn evaluate_atom(handle: Handle) -> Result<TruthValue> {
    context::active()?.evaluate(handle)
}

pub fn execute_atom(handle: Handle) -> Result<Value> {
    context::active()?.execute(handle)
}
