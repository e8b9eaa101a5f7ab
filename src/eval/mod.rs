//! Evaluation and execution.
//!
//! `evaluate` computes a truth value; `execute` reduces an atom to a
//! value. Grounded nodes are resolved against the space's procedure
//! registry at this point, and every procedure call runs inside its own
//! error boundary.
//!
//! Nesting is bounded per thread by `SpaceConfig::max_execution_depth`,
//! counting re-entrant calls made from inside grounded procedures.

pub mod variables;

use std::cell::Cell;

use tracing::{debug, trace};

use crate::boundary;
use crate::model::{Atom, AtomType, Handle, TruthValue, Value};
use crate::storage::StorageBackend;
use crate::validation::format_number;
use crate::{AtomSpace, Error, Result};

pub use variables::{beta_reduce, Variables};

/// Compute the truth value of `handle`.
pub fn evaluate<B: StorageBackend>(space: &AtomSpace<B>, handle: Handle) -> Result<TruthValue> {
    boundary::guard("evaluate", || Evaluator::new(space).evaluate(handle))
}

/// Reduce `handle` to a value.
pub fn execute<B: StorageBackend>(space: &AtomSpace<B>, handle: Handle) -> Result<Value> {
    boundary::guard("execute", || Evaluator::new(space).execute(handle))
}

// ============================================================================
// Depth accounting
// ============================================================================

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Holds one level of nesting; released on drop, including on unwind.
struct DepthGuard;

impl DepthGuard {
    fn enter(max: usize) -> Result<Self> {
        let depth = DEPTH.get() + 1;
        if depth > max {
            return Err(Error::ExecutionError(format!(
                "maximum execution depth {max} exceeded"
            )));
        }
        DEPTH.set(depth);
        Ok(DepthGuard)
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DEPTH.set(DEPTH.get().saturating_sub(1));
    }
}

// ============================================================================
// Evaluator
// ============================================================================

pub struct Evaluator<'a, B: StorageBackend> {
    space: &'a AtomSpace<B>,
}

impl<'a, B: StorageBackend> Evaluator<'a, B> {
    pub fn new(space: &'a AtomSpace<B>) -> Self {
        Self { space }
    }

    pub fn evaluate(&self, handle: Handle) -> Result<TruthValue> {
        let _depth = DepthGuard::enter(self.space.config().max_execution_depth)?;
        let atom = self.space.atom(handle)?;
        trace!(%handle, atom_type = %atom.atom_type, "evaluate");

        match atom.atom_type {
            AtomType::EvaluationLink => self.evaluate_evaluation(&atom),
            AtomType::TrueLink => Ok(TruthValue::TRUE),
            AtomType::FalseLink => Ok(TruthValue::FALSE),
            AtomType::NotLink => Ok(self.evaluate(member(&atom, 0)?)?.negate()),
            // And/Or are unordered: members were sorted by handle at interning,
            // so short-circuiting follows handle order, not construction order.
            AtomType::AndLink => {
                for h in atom.outgoing() {
                    if !self.evaluate(*h)?.is_true() {
                        return Ok(TruthValue::FALSE);
                    }
                }
                Ok(TruthValue::TRUE)
            }
            AtomType::OrLink => {
                for h in atom.outgoing() {
                    if self.evaluate(*h)?.is_true() {
                        return Ok(TruthValue::TRUE);
                    }
                }
                Ok(TruthValue::FALSE)
            }
            AtomType::GreaterThanLink => {
                let a = self.number(member(&atom, 0)?)?;
                let b = self.number(member(&atom, 1)?)?;
                Ok(TruthValue::from_bool(a > b))
            }
            AtomType::EqualLink => {
                let a = self.execute(member(&atom, 0)?)?;
                let b = self.execute(member(&atom, 1)?)?;
                Ok(TruthValue::from_bool(a == b))
            }
            _ => Ok(atom.tv),
        }
    }

    fn evaluate_evaluation(&self, link: &Atom) -> Result<TruthValue> {
        let predicate = self.space.atom(member(link, 0)?)?;
        let args = &link.outgoing()[1..];

        match predicate.atom_type {
            AtomType::GroundedPredicateNode => {
                let args = self.grounded_args(args)?;
                match self.call_grounded(&predicate, &args)? {
                    Value::Truth(tv) => Ok(tv),
                    other => Err(Error::TypeError {
                        expected: "TruthValue".into(),
                        got: other.type_name().into(),
                    }),
                }
            }
            AtomType::LambdaLink => {
                let args = self.unwrap_list(args)?;
                let body = beta_reduce(self.space, &predicate, &args)?;
                self.evaluate(body)
            }
            _ => Ok(link.tv),
        }
    }

    pub fn execute(&self, handle: Handle) -> Result<Value> {
        let _depth = DepthGuard::enter(self.space.config().max_execution_depth)?;
        let atom = self.space.atom(handle)?;
        trace!(%handle, atom_type = %atom.atom_type, "execute");

        match atom.atom_type {
            AtomType::ExecutionOutputLink => self.execute_output(&atom),
            AtomType::PutLink => self.execute_put(&atom),
            AtomType::PlusLink | AtomType::TimesLink | AtomType::MinusLink | AtomType::DivideLink => {
                self.arithmetic(&atom)
            }
            _ => Ok(Value::Atom(handle)),
        }
    }

    fn execute_output(&self, link: &Atom) -> Result<Value> {
        let schema = self.space.atom(member(link, 0)?)?;
        let args = member(link, 1)?;

        match schema.atom_type {
            AtomType::GroundedSchemaNode => {
                let args = self.grounded_args(&[args])?;
                let value = self.call_grounded(&schema, &args)?;
                if value.is_void() {
                    return Err(Error::ExecutionError(format!(
                        "Invalid return value from schema {schema}: procedure returned nothing"
                    )));
                }
                Ok(value)
            }
            AtomType::LambdaLink => {
                let args = self.execute_args(&self.unwrap_list(&[args])?)?;
                let reduced = beta_reduce(self.space, &schema, &args)?;
                self.execute_result(reduced)
            }
            _ => Ok(Value::Atom(link.handle)),
        }
    }

    /// `(PutLink body args)` or `(PutLink vardecl body args)`.
    fn execute_put(&self, link: &Atom) -> Result<Value> {
        let (vars, body, args) = match link.outgoing() {
            [decl, body, args] => (Variables::from_decl(self.space, *decl)?, *body, *args),
            [body, args] => {
                let body_atom = self.space.atom(*body)?;
                if body_atom.atom_type == AtomType::LambdaLink {
                    let (vars, inner) = variables::lambda_parts(self.space, &body_atom)?;
                    (vars, inner, *args)
                } else {
                    (Variables::free_in(self.space, *body)?, *body, *args)
                }
            }
            _ => {
                return Err(Error::Validation(format!(
                    "Expecting a body and its arguments for PutLink, got {link}"
                )));
            }
        };

        let args = if vars.len() == 1 { vec![args] } else { self.unwrap_list(&[args])? };
        let args = self.execute_args(&args)?;
        let reduced = vars.substitute(self.space, body, &args)?;
        self.execute_result(reduced)
    }

    fn arithmetic(&self, link: &Atom) -> Result<Value> {
        let nums = link
            .outgoing()
            .iter()
            .map(|h| self.number(*h))
            .collect::<Result<Vec<f64>>>()?;

        let result = match (link.atom_type, nums.as_slice()) {
            (AtomType::PlusLink, _) => nums.iter().sum(),
            (AtomType::TimesLink, _) => nums.iter().product(),
            (AtomType::MinusLink, [a, b]) => a - b,
            (AtomType::DivideLink, [_, b]) if *b == 0.0 => {
                return Err(Error::ExecutionError("DivideLink: division by zero".into()));
            }
            (AtomType::DivideLink, [a, b]) => a / b,
            _ => {
                return Err(Error::Validation(format!(
                    "Expecting exactly two members for {}, got arity {}",
                    link.atom_type,
                    nums.len()
                )));
            }
        };

        let node = self.space.add_node(AtomType::NumberNode, &format_number(result))?;
        Ok(Value::Atom(node))
    }

    /// Execute `handle` and read the result as a number.
    fn number(&self, handle: Handle) -> Result<f64> {
        match self.execute(handle)? {
            Value::Atom(h) => {
                let atom = self.space.atom(h)?;
                match (atom.atom_type, atom.name()) {
                    (AtomType::NumberNode, Some(name)) => name.parse::<f64>().map_err(|_| Error::TypeError {
                        expected: "number".into(),
                        got: format!("'{name}'"),
                    }),
                    _ => Err(Error::TypeError {
                        expected: "NumberNode".into(),
                        got: atom.atom_type.to_string(),
                    }),
                }
            }
            Value::Float(v) if v.len() == 1 => Ok(v[0]),
            other => Err(Error::TypeError {
                expected: "NumberNode".into(),
                got: other.type_name().into(),
            }),
        }
    }

    // ========================================================================
    // Grounded calls
    // ========================================================================

    fn call_grounded(&self, node: &Atom, args: &[Handle]) -> Result<Value> {
        let name = node.name().ok_or_else(|| {
            Error::Validation(format!("Expecting a grounded node, got {node}"))
        })?;
        let (schema, procedure) = self.space.resolve_procedure(name)?;
        debug!(%schema, arity = args.len(), "calling grounded procedure");
        boundary::guard(&format!("grounded procedure {schema}"), || procedure(self.space, args))
    }

    /// Arguments as a grounded procedure sees them: a lone ListLink is
    /// unwrapped, and executable members are executed first.
    fn grounded_args(&self, args: &[Handle]) -> Result<Vec<Handle>> {
        let args = self.unwrap_list(args)?;
        self.execute_args(&args)
    }

    fn unwrap_list(&self, args: &[Handle]) -> Result<Vec<Handle>> {
        if let [single] = args {
            let atom = self.space.atom(*single)?;
            if atom.atom_type == AtomType::ListLink {
                return Ok(atom.outgoing().to_vec());
            }
        }
        Ok(args.to_vec())
    }

    /// Execute executable members; keep the rest as they are. An
    /// executable member must produce an atom.
    fn execute_args(&self, args: &[Handle]) -> Result<Vec<Handle>> {
        args.iter()
            .map(|h| {
                let atom_type = self.space.atom(*h)?.atom_type;
                if !atom_type.is_executable() {
                    return Ok(*h);
                }
                match self.execute(*h)? {
                    Value::Atom(result) => Ok(result),
                    other => Err(Error::TypeError {
                        expected: "Atom".into(),
                        got: format!("{} from {atom_type} argument", other.type_name()),
                    }),
                }
            })
            .collect()
    }

    fn execute_result(&self, handle: Handle) -> Result<Value> {
        if self.space.atom(handle)?.atom_type.is_executable() {
            self.execute(handle)
        } else {
            Ok(Value::Atom(handle))
        }
    }
}

/// The `i`-th outgoing member, or a validation error.
fn member(atom: &Atom, i: usize) -> Result<Handle> {
    atom.outgoing().get(i).copied().ok_or_else(|| {
        Error::Validation(format!(
            "Expecting at least {} members in {}, got arity {}",
            i + 1,
            atom.atom_type,
            atom.arity()
        ))
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn num(space: &AtomSpace, v: f64) -> Handle {
        space.add_node(AtomType::NumberNode, &format_number(v)).unwrap()
    }

    fn name_of(space: &AtomSpace, v: &Value) -> String {
        space.atom(v.as_atom().unwrap()).unwrap().name().unwrap().to_string()
    }

    #[test]
    fn test_missing_grounded_predicate() {
        let space = AtomSpace::new();
        let a = space.add_node(AtomType::ConceptNode, "atom1").unwrap();
        let gpn = space.add_node(AtomType::GroundedPredicateNode, "py:foobar").unwrap();
        let link = space.add_link(AtomType::EvaluationLink, &[gpn, a, a, a]).unwrap();

        let err = evaluate(&space, link).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Resolution);
        assert!(err.to_string().contains("not found in module"));
    }

    #[test]
    fn test_grounded_predicate_receives_args() {
        let space = AtomSpace::new();
        space.register_procedure("py", "__main__", "three", |_, args| {
            Ok(Value::from(args.len() == 3))
        });
        let a = space.add_node(AtomType::ConceptNode, "a").unwrap();
        let gpn = space.add_node(AtomType::GroundedPredicateNode, "py:three").unwrap();

        let direct = space.add_link(AtomType::EvaluationLink, &[gpn, a, a, a]).unwrap();
        assert!(evaluate(&space, direct).unwrap().is_true());

        let list = space.add_link(AtomType::ListLink, &[a, a, a]).unwrap();
        let wrapped = space.add_link(AtomType::EvaluationLink, &[gpn, list]).unwrap();
        assert!(evaluate(&space, wrapped).unwrap().is_true());
    }

    #[test]
    fn test_predicate_must_return_truth() {
        let space = AtomSpace::new();
        space.register_procedure("py", "__main__", "num", |_, _| Ok(Value::from(1.0)));
        let gpn = space.add_node(AtomType::GroundedPredicateNode, "py:num").unwrap();
        let link = space.add_link(AtomType::EvaluationLink, &[gpn]).unwrap();

        let err = evaluate(&space, link).unwrap_err();
        assert!(matches!(err, Error::TypeError { .. }));
    }

    #[test]
    fn test_panicking_procedure_is_contained() {
        let space = AtomSpace::new();
        space.register_procedure("py", "__main__", "boom", |_, _| panic!("procedure exploded"));
        let gpn = space.add_node(AtomType::GroundedPredicateNode, "py:boom").unwrap();
        let link = space.add_link(AtomType::EvaluationLink, &[gpn]).unwrap();
        let before = space.atom_count().unwrap();

        let err = evaluate(&space, link).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Execution);
        assert!(err.to_string().contains("procedure exploded"));
        assert_eq!(space.atom_count().unwrap(), before);
        assert_eq!(DEPTH.get(), 0);
    }

    #[test]
    fn test_logic_links() {
        let space = AtomSpace::new();
        let t = space.add_link(AtomType::TrueLink, &[]).unwrap();
        let f = space.add_link(AtomType::FalseLink, &[]).unwrap();
        let and = space.add_link(AtomType::AndLink, &[t, f]).unwrap();
        let or = space.add_link(AtomType::OrLink, &[t, f]).unwrap();
        let not = space.add_link(AtomType::NotLink, &[and]).unwrap();

        assert!(!evaluate(&space, and).unwrap().is_true());
        assert!(evaluate(&space, or).unwrap().is_true());
        assert!(evaluate(&space, not).unwrap().is_true());
    }

    #[test]
    fn test_plain_atoms_evaluate_to_stored_tv() {
        let space = AtomSpace::new();
        let a = space.add_node(AtomType::ConceptNode, "a").unwrap();
        space.set_truth_value(a, TruthValue::new(0.2, 0.9)).unwrap();
        assert_eq!(evaluate(&space, a).unwrap(), TruthValue::new(0.2, 0.9));
    }

    #[test]
    fn test_arithmetic() {
        let space = AtomSpace::new();
        let two = num(&space, 2.0);
        let three = num(&space, 3.0);
        let plus = space.add_link(AtomType::PlusLink, &[two, three]).unwrap();
        let times = space.add_link(AtomType::TimesLink, &[plus, two]).unwrap();
        let minus = space.add_link(AtomType::MinusLink, &[two, three]).unwrap();
        let div = space.add_link(AtomType::DivideLink, &[three, two]).unwrap();

        assert_eq!(name_of(&space, &execute(&space, plus).unwrap()), "5");
        assert_eq!(name_of(&space, &execute(&space, times).unwrap()), "10");
        assert_eq!(name_of(&space, &execute(&space, minus).unwrap()), "-1");
        assert_eq!(name_of(&space, &execute(&space, div).unwrap()), "1.5");
    }

    #[test]
    fn test_arithmetic_errors() {
        let space = AtomSpace::new();
        let zero = num(&space, 0.0);
        let one = num(&space, 1.0);
        let a = space.add_node(AtomType::ConceptNode, "a").unwrap();

        let div = space.add_link(AtomType::DivideLink, &[one, zero]).unwrap();
        assert_eq!(execute(&space, div).unwrap_err().kind(), ErrorKind::Execution);

        let bad = space.add_link(AtomType::PlusLink, &[one, a]).unwrap();
        assert!(matches!(execute(&space, bad).unwrap_err(), Error::TypeError { .. }));
    }

    #[test]
    fn test_comparisons() {
        let space = AtomSpace::new();
        let one = num(&space, 1.0);
        let two = num(&space, 2.0);
        let sum = space.add_link(AtomType::PlusLink, &[one, one]).unwrap();
        let gt = space.add_link(AtomType::GreaterThanLink, &[two, one]).unwrap();
        let eq = space.add_link(AtomType::EqualLink, &[sum, two]).unwrap();

        assert!(evaluate(&space, gt).unwrap().is_true());
        assert!(evaluate(&space, eq).unwrap().is_true());
    }

    #[test]
    fn test_grounded_schema() {
        let space = AtomSpace::new();
        space.register_procedure("rs", "math", "double", |space, args| {
            let name = space.atom(args[0])?.name().unwrap_or_default().to_string();
            let v: f64 = name.parse().map_err(|_| Error::ExecutionError("not a number".into()))?;
            Ok(Value::Atom(space.add_node(AtomType::NumberNode, &format_number(v * 2.0))?))
        });
        let gsn = space.add_node(AtomType::GroundedSchemaNode, "rs:math.double").unwrap();
        let two = num(&space, 2.0);
        let three = num(&space, 3.0);
        let sum = space.add_link(AtomType::PlusLink, &[two, three]).unwrap();
        let args = space.add_link(AtomType::ListLink, &[sum]).unwrap();
        let exec = space.add_link(AtomType::ExecutionOutputLink, &[gsn, args]).unwrap();

        assert_eq!(name_of(&space, &execute(&space, exec).unwrap()), "10");
    }

    #[test]
    fn test_non_atom_argument_is_a_type_error() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let space = AtomSpace::new();
        let inner_calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&inner_calls);
        space.register_procedure("rs", "__main__", "float", move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Value::from(1.5))
        });
        space.register_procedure("rs", "__main__", "outer", |_, args| Ok(Value::Atom(args[0])));

        let inner_gsn = space.add_node(AtomType::GroundedSchemaNode, "rs:float").unwrap();
        let empty = space.add_link(AtomType::ListLink, &[]).unwrap();
        let inner = space.add_link(AtomType::ExecutionOutputLink, &[inner_gsn, empty]).unwrap();
        let outer_gsn = space.add_node(AtomType::GroundedSchemaNode, "rs:outer").unwrap();
        let args = space.add_link(AtomType::ListLink, &[inner]).unwrap();
        let outer = space.add_link(AtomType::ExecutionOutputLink, &[outer_gsn, args]).unwrap();

        let err = execute(&space, outer).unwrap_err();
        assert!(matches!(err, Error::TypeError { ref expected, .. } if expected == "Atom"));
        assert!(err.to_string().contains("FloatValue"), "{err}");
        assert_eq!(inner_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_and_or_follow_stored_order() {
        let space = AtomSpace::new();
        let gpn = space.add_node(AtomType::GroundedPredicateNode, "py:missing").unwrap();
        let failing = space.add_link(AtomType::EvaluationLink, &[gpn]).unwrap();
        let f = space.add_link(AtomType::FalseLink, &[]).unwrap();

        // The handle created first sorts first, whatever the argument order.
        let and = space.add_link(AtomType::AndLink, &[f, failing]).unwrap();
        assert_eq!(space.atom(and).unwrap().outgoing(), &[failing, f]);
        assert_eq!(evaluate(&space, and).unwrap_err().kind(), ErrorKind::Resolution);
    }

    #[test]
    fn test_void_schema_result() {
        let space = AtomSpace::new();
        space.register_procedure("rs", "__main__", "nothing", |_, _| Ok(Value::Void));
        let gsn = space.add_node(AtomType::GroundedSchemaNode, "rs:nothing").unwrap();
        let args = space.add_link(AtomType::ListLink, &[]).unwrap();
        let exec = space.add_link(AtomType::ExecutionOutputLink, &[gsn, args]).unwrap();

        let err = execute(&space, exec).unwrap_err();
        assert!(err.to_string().contains("Invalid return value"));
    }

    #[test]
    fn test_lambda_execution() {
        let space = AtomSpace::new();
        let x = space.add_node(AtomType::VariableNode, "$x").unwrap();
        let two = num(&space, 2.0);
        let body = space.add_link(AtomType::TimesLink, &[x, two]).unwrap();
        let lambda = space.add_link(AtomType::LambdaLink, &[x, body]).unwrap();
        let four = num(&space, 4.0);
        let args = space.add_link(AtomType::ListLink, &[four]).unwrap();
        let exec = space.add_link(AtomType::ExecutionOutputLink, &[lambda, args]).unwrap();

        assert_eq!(name_of(&space, &execute(&space, exec).unwrap()), "8");
    }

    #[test]
    fn test_put_link() {
        let space = AtomSpace::new();
        let x = space.add_node(AtomType::VariableNode, "$x").unwrap();
        let animal = space.add_node(AtomType::ConceptNode, "animal").unwrap();
        let cat = space.add_node(AtomType::ConceptNode, "cat").unwrap();
        let body = space.add_link(AtomType::InheritanceLink, &[x, animal]).unwrap();
        let put = space.add_link(AtomType::PutLink, &[body, cat]).unwrap();

        let result = execute(&space, put).unwrap().as_atom().unwrap();
        assert_eq!(space.atom(result).unwrap().outgoing(), &[cat, animal]);
    }

    #[test]
    fn test_depth_limit() {
        let space = AtomSpace::with_config(crate::SpaceConfig {
            max_execution_depth: 2,
            ..Default::default()
        })
        .unwrap();
        let one = num(&space, 1.0);
        let inner = space.add_link(AtomType::PlusLink, &[one]).unwrap();
        let middle = space.add_link(AtomType::PlusLink, &[inner]).unwrap();
        let outer = space.add_link(AtomType::PlusLink, &[middle]).unwrap();

        let err = execute(&space, outer).unwrap_err();
        assert!(err.to_string().contains("maximum execution depth"));
        assert_eq!(DEPTH.get(), 0);
    }

    #[test]
    fn test_recursive_procedure_is_bounded() {
        let space = AtomSpace::new();
        let gpn = space.add_node(AtomType::GroundedPredicateNode, "py:again").unwrap();
        let link = space.add_link(AtomType::EvaluationLink, &[gpn]).unwrap();
        space.register_procedure("py", "__main__", "again", move |space, _| {
            Ok(Value::Truth(space.evaluate(link)?))
        });

        let err = evaluate(&space, link).unwrap_err();
        assert!(err.to_string().contains("maximum execution depth"));
    }
}
