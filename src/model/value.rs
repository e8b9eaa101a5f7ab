//! Results produced by executing atoms and by grounded procedures.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Handle, TruthValue};

/// Execution result.
///
/// - `Atom`: a handle into the atomspace that produced it
/// - `Truth`: a truth value (what grounded predicates must return)
/// - `Float` / `String`: vectors of plain values
/// - `Void`: "nothing"; a grounded schema returning this is an error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    Void,
    Atom(Handle),
    Truth(TruthValue),
    Float(Vec<f64>),
    String(Vec<String>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Void => "Void",
            Value::Atom(_) => "Atom",
            Value::Truth(_) => "TruthValue",
            Value::Float(_) => "FloatValue",
            Value::String(_) => "StringValue",
        }
    }

    pub fn is_void(&self) -> bool { matches!(self, Value::Void) }

    pub fn as_atom(&self) -> Option<Handle> {
        match self {
            Value::Atom(h) => Some(*h),
            _ => None,
        }
    }

    pub fn as_truth(&self) -> Option<TruthValue> {
        match self {
            Value::Truth(tv) => Some(*tv),
            _ => None,
        }
    }

    /// First element of a single-element FloatValue.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) if v.len() == 1 => Some(v[0]),
            _ => None,
        }
    }
}

// ============================================================================
// Conversions (From impls)
// ============================================================================

impl From<Handle> for Value { fn from(h: Handle) -> Self { Value::Atom(h) } }
impl From<TruthValue> for Value { fn from(tv: TruthValue) -> Self { Value::Truth(tv) } }
impl From<bool> for Value { fn from(b: bool) -> Self { Value::Truth(TruthValue::from_bool(b)) } }
impl From<f64> for Value { fn from(v: f64) -> Self { Value::Float(vec![v]) } }
impl From<Vec<f64>> for Value { fn from(v: Vec<f64>) -> Self { Value::Float(v) } }
impl From<&str> for Value { fn from(s: &str) -> Self { Value::String(vec![s.to_owned()]) } }
impl From<String> for Value { fn from(s: String) -> Self { Value::String(vec![s]) } }

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => write!(f, "(VoidValue)"),
            Value::Atom(h) => write!(f, "<atom {h}>"),
            Value::Truth(tv) => write!(f, "{tv}"),
            Value::Float(v) => {
                write!(f, "(FloatValue")?;
                for x in v {
                    write!(f, " {x}")?;
                }
                write!(f, ")")
            }
            Value::String(v) => {
                write!(f, "(StringValue")?;
                for s in v {
                    write!(f, " \"{}\"", super::atom::escape(s))?;
                }
                write!(f, ")")
            }
        }
    }
}
