//! Construction-time shape checks for nodes and links.
//!
//! Every rejection is an `Error::Validation` whose message starts with
//! "Expecting" and names the shape that was expected. Checks run before
//! the backend is touched, so a rejected construction leaves no trace.

use crate::model::{Atom, AtomType};
use crate::procedures::SchemaRef;
use crate::{Error, Result};

// ============================================================================
// Nodes
// ============================================================================

/// Validate a node and return the name it is stored under.
///
/// NumberNode names are canonicalized (`"3.0"` and `"3"` are the same node).
pub fn canonical_node_name(atom_type: AtomType, name: &str) -> Result<String> {
    check_concrete(atom_type)?;
    if !atom_type.is_node() {
        return Err(Error::Validation(format!("Expecting a node type, got {atom_type}")));
    }

    match atom_type {
        AtomType::NumberNode => {
            let v = parse_number(name).ok_or_else(|| {
                Error::Validation(format!("Expecting a number for NumberNode, got '{name}'"))
            })?;
            Ok(format_number(v))
        }
        AtomType::TypeNode => {
            name.parse::<AtomType>().map_err(|_| {
                Error::Validation(format!("Expecting a known atom type name for TypeNode, got '{name}'"))
            })?;
            Ok(name.to_string())
        }
        AtomType::GroundedPredicateNode | AtomType::GroundedSchemaNode => {
            SchemaRef::split(name)?;
            Ok(name.to_string())
        }
        _ => Ok(name.to_string()),
    }
}

fn parse_number(name: &str) -> Option<f64> {
    name.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Canonical NumberNode name: integral values print without a fraction.
pub fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

// ============================================================================
// Links
// ============================================================================

/// Validate a link of `atom_type` over the already-resolved `outgoing` atoms.
pub fn check_link(atom_type: AtomType, outgoing: &[Atom]) -> Result<()> {
    use AtomType::*;

    check_concrete(atom_type)?;
    if !atom_type.is_link() {
        return Err(Error::Validation(format!("Expecting a link type, got {atom_type}")));
    }

    match atom_type {
        LambdaLink | GetLink => check_scope(atom_type, outgoing, 1),
        BindLink => check_scope(atom_type, outgoing, 2),
        PutLink => {
            if !(2..=3).contains(&outgoing.len()) {
                return Err(arity_error(atom_type, "a body and its arguments", outgoing.len()));
            }
            if outgoing.len() == 3 {
                check_vardecl(atom_type, &outgoing[0])?;
            }
            Ok(())
        }
        EvaluationLink => {
            let Some(pred) = outgoing.first() else {
                return Err(arity_error(atom_type, "a predicate and its arguments", 0));
            };
            if !is_predicate(pred.atom_type) {
                return Err(Error::Validation(format!(
                    "Expecting a predicate as the first member of EvaluationLink, got {pred}"
                )));
            }
            Ok(())
        }
        ExecutionOutputLink => {
            if outgoing.len() != 2 {
                return Err(arity_error(atom_type, "a schema and its arguments", outgoing.len()));
            }
            let schema = &outgoing[0];
            if !is_schema(schema.atom_type) {
                return Err(Error::Validation(format!(
                    "Expecting a schema as the first member of ExecutionOutputLink, got {schema}"
                )));
            }
            Ok(())
        }
        TypedVariableLink => {
            if outgoing.len() != 2 {
                return Err(arity_error(atom_type, "a variable and a type specification", outgoing.len()));
            }
            if !matches!(outgoing[0].atom_type, VariableNode | GlobNode) {
                return Err(Error::Validation(format!(
                    "Expecting a variable in TypedVariableLink, got {}",
                    outgoing[0]
                )));
            }
            if !matches!(outgoing[1].atom_type, TypeNode | VariableNode) {
                return Err(Error::Validation(format!(
                    "Expecting a type specification in TypedVariableLink, got {}",
                    outgoing[1]
                )));
            }
            Ok(())
        }
        VariableList => {
            for member in outgoing {
                if !matches!(member.atom_type, VariableNode | GlobNode | TypedVariableLink) {
                    return Err(Error::Validation(format!(
                        "Expecting only variable declarations in VariableList, got {member}"
                    )));
                }
            }
            Ok(())
        }
        NotLink | QuoteLink | UnquoteLink => exact_arity(atom_type, outgoing, 1, "exactly one member"),
        InheritanceLink | MemberLink | GreaterThanLink | EqualLink | MinusLink | DivideLink => {
            exact_arity(atom_type, outgoing, 2, "exactly two members")
        }
        PlusLink | TimesLink => {
            if outgoing.is_empty() {
                return Err(arity_error(atom_type, "at least one member", 0));
            }
            Ok(())
        }
        TrueLink | FalseLink => exact_arity(atom_type, outgoing, 0, "no members"),
        _ => Ok(()),
    }
}

/// Scope links hold `parts` trailing members, optionally preceded by a
/// variable declaration.
fn check_scope(atom_type: AtomType, outgoing: &[Atom], parts: usize) -> Result<()> {
    let n = outgoing.len();
    if n == parts {
        return Ok(());
    }
    if n == parts + 1 {
        return check_vardecl(atom_type, &outgoing[0]);
    }
    let shape = if parts == 1 {
        "a variable declaration and a body"
    } else {
        "a variable declaration, a body and a rewrite"
    };
    Err(arity_error(atom_type, shape, n))
}

fn check_vardecl(atom_type: AtomType, decl: &Atom) -> Result<()> {
    if is_vardecl(decl.atom_type) {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "Expecting a variable declaration (VariableNode, TypedVariableLink or VariableList) in {atom_type}, got {decl}"
        )))
    }
}

fn exact_arity(atom_type: AtomType, outgoing: &[Atom], n: usize, shape: &str) -> Result<()> {
    if outgoing.len() == n {
        Ok(())
    } else {
        Err(arity_error(atom_type, shape, outgoing.len()))
    }
}

fn arity_error(atom_type: AtomType, shape: &str, got: usize) -> Error {
    Error::Validation(format!("Expecting {shape} for {atom_type}, got arity {got}"))
}

fn check_concrete(atom_type: AtomType) -> Result<()> {
    if atom_type.is_abstract() {
        return Err(Error::Validation(format!("Expecting a concrete atom type, got {atom_type}")));
    }
    Ok(())
}

pub fn is_vardecl(t: AtomType) -> bool {
    matches!(
        t,
        AtomType::VariableNode | AtomType::GlobNode | AtomType::TypedVariableLink | AtomType::VariableList
    )
}

fn is_predicate(t: AtomType) -> bool {
    t.is_a(AtomType::PredicateNode) || matches!(t, AtomType::LambdaLink | AtomType::VariableNode)
}

fn is_schema(t: AtomType) -> bool {
    t.is_a(AtomType::SchemaNode)
        || matches!(t, AtomType::LambdaLink | AtomType::VariableNode | AtomType::UnquoteLink)
}
