//! Variable declarations and beta-reduction.
//!
//! A scope link (`LambdaLink`, `GetLink`, `BindLink`, and the
//! three-member form of `PutLink`) either declares its variables
//! explicitly or binds every variable free in its body. Substitution
//! never descends into a `QuoteLink`, and never replaces a variable that
//! a nested scope rebinds.

use std::rc::Rc;

use hashbrown::HashMap;

use crate::model::{Atom, AtomType, Handle};
use crate::storage::StorageBackend;
use crate::{AtomSpace, Error, Result};

/// Ordered variables with optional type restrictions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Variables {
    pub vars: Vec<Handle>,
    types: HashMap<Handle, AtomType>,
}

impl Variables {
    /// Read an explicit declaration: a variable, a `TypedVariableLink`
    /// or a `VariableList` of either.
    pub fn from_decl<B: StorageBackend>(space: &AtomSpace<B>, decl: Handle) -> Result<Self> {
        let mut out = Variables::default();
        out.collect_decl(space, decl)?;
        Ok(out)
    }

    fn collect_decl<B: StorageBackend>(&mut self, space: &AtomSpace<B>, decl: Handle) -> Result<()> {
        let atom = space.atom(decl)?;
        match atom.atom_type {
            AtomType::VariableNode | AtomType::GlobNode => self.push(decl),
            AtomType::TypedVariableLink => {
                let (var, spec) = match atom.outgoing() {
                    [var, spec] => (*var, *spec),
                    _ => {
                        return Err(Error::Validation(format!(
                            "Expecting a variable and a type specification, got {atom}"
                        )));
                    }
                };
                self.push(var);
                let spec = space.atom(spec)?;
                if spec.atom_type == AtomType::TypeNode {
                    let name = spec.name().unwrap_or_default();
                    let restriction = name.parse::<AtomType>()?;
                    if restriction != AtomType::Atom {
                        self.types.insert(var, restriction);
                    }
                }
            }
            AtomType::VariableList => {
                for member in atom.outgoing() {
                    self.collect_decl(space, *member)?;
                }
            }
            _ => {
                return Err(Error::Validation(format!(
                    "Expecting a variable declaration, got {atom}"
                )));
            }
        }
        Ok(())
    }

    /// Variables free in `body`, in order of first appearance.
    pub fn free_in<B: StorageBackend>(space: &AtomSpace<B>, body: Handle) -> Result<Self> {
        let mut out = Variables::default();
        // Pre-order walk; members are pushed in reverse so they pop in order.
        let mut stack: Vec<(Handle, Rc<[Handle]>)> = vec![(body, Rc::from([]))];

        while let Some((h, shadowed)) = stack.pop() {
            let atom = space.atom(h)?;
            match atom.atom_type {
                AtomType::VariableNode | AtomType::GlobNode => {
                    if !shadowed.contains(&h) {
                        out.push(h);
                    }
                }
                AtomType::QuoteLink => {}
                t if t.is_a(AtomType::ScopeLink) => {
                    let Some((inner, body_at)) = explicit_decl(space, &atom)? else {
                        continue;
                    };
                    let shadowed: Rc<[Handle]> =
                        shadowed.iter().chain(inner.vars.iter()).copied().collect();
                    for member in atom.outgoing()[body_at..].iter().rev() {
                        stack.push((*member, Rc::clone(&shadowed)));
                    }
                }
                _ => {
                    for member in atom.outgoing().iter().rev() {
                        stack.push((*member, Rc::clone(&shadowed)));
                    }
                }
            }
        }
        Ok(out)
    }

    fn push(&mut self, var: Handle) {
        if !self.vars.contains(&var) {
            self.vars.push(var);
        }
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Declared type restriction, if any.
    pub fn restriction(&self, var: Handle) -> Option<AtomType> {
        self.types.get(&var).copied()
    }

    /// Check argument count and type restrictions.
    pub fn check_args<B: StorageBackend>(&self, space: &AtomSpace<B>, args: &[Handle]) -> Result<()> {
        if args.len() != self.vars.len() {
            return Err(Error::Validation(format!(
                "Expecting {} arguments, got {}",
                self.vars.len(),
                args.len()
            )));
        }
        for (var, arg) in self.vars.iter().zip(args) {
            if let Some(expected) = self.restriction(*var) {
                let got = space.atom(*arg)?.atom_type;
                if !got.is_a(expected) {
                    return Err(Error::TypeError {
                        expected: expected.to_string(),
                        got: got.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Replace each variable in `body` by the matching argument.
    pub fn substitute<B: StorageBackend>(
        &self,
        space: &AtomSpace<B>,
        body: Handle,
        args: &[Handle],
    ) -> Result<Handle> {
        self.check_args(space, args)?;
        let map: HashMap<Handle, Handle> = self.vars.iter().copied().zip(args.iter().copied()).collect();
        replace(space, body, &map, 0)
    }
}

/// If `scope` declares its variables explicitly, return them together
/// with the index of the first member after the declaration.
fn explicit_decl<B: StorageBackend>(space: &AtomSpace<B>, scope: &Atom) -> Result<Option<(Variables, usize)>> {
    let parts = match scope.atom_type {
        AtomType::BindLink => 2,
        _ => 1,
    };
    let outgoing = scope.outgoing();
    if outgoing.len() == parts + 1 {
        Ok(Some((Variables::from_decl(space, outgoing[0])?, 1)))
    } else {
        Ok(None)
    }
}

/// Split a `LambdaLink` into its variables and body.
pub fn lambda_parts<B: StorageBackend>(space: &AtomSpace<B>, lambda: &Atom) -> Result<(Variables, Handle)> {
    match lambda.outgoing() {
        [body] => Ok((Variables::free_in(space, *body)?, *body)),
        [decl, body] => Ok((Variables::from_decl(space, *decl)?, *body)),
        _ => Err(Error::Validation(format!(
            "Expecting a variable declaration and a body, got {lambda}"
        ))),
    }
}

/// Apply a `LambdaLink` to `args`.
pub fn beta_reduce<B: StorageBackend>(space: &AtomSpace<B>, lambda: &Atom, args: &[Handle]) -> Result<Handle> {
    let (vars, body) = lambda_parts(space, lambda)?;
    vars.substitute(space, body, args)
}

/// Rebuild `h` with `map` applied. Nesting below the body is bounded by
/// `max_execution_depth`.
fn replace<B: StorageBackend>(
    space: &AtomSpace<B>,
    h: Handle,
    map: &HashMap<Handle, Handle>,
    depth: usize,
) -> Result<Handle> {
    if map.is_empty() {
        return Ok(h);
    }
    if let Some(value) = map.get(&h) {
        return Ok(*value);
    }

    let atom = space.atom(h)?;
    if atom.is_node() || atom.atom_type == AtomType::QuoteLink {
        return Ok(h);
    }

    let max = space.config().max_execution_depth;
    if depth >= max {
        return Err(Error::ExecutionError(format!(
            "maximum execution depth {max} exceeded while substituting into {}",
            atom.atom_type
        )));
    }

    // A nested scope hides the variables it rebinds.
    let narrowed;
    let map = if atom.atom_type.is_a(AtomType::ScopeLink) {
        match explicit_decl(space, &atom)? {
            Some((inner, _)) => {
                narrowed = map
                    .iter()
                    .filter(|(var, _)| !inner.vars.contains(*var))
                    .map(|(k, v)| (*k, *v))
                    .collect::<HashMap<_, _>>();
                &narrowed
            }
            None => return Ok(h),
        }
    } else {
        map
    };

    let outgoing = atom
        .outgoing()
        .iter()
        .map(|member| replace(space, *member, map, depth + 1))
        .collect::<Result<Vec<_>>>()?;
    if outgoing.as_slice() == atom.outgoing() {
        return Ok(h);
    }
    space.add_link(atom.atom_type, &outgoing)
}
