//! Atomspace export: Atomese s-expressions and a JSON snapshot.
//!
//! ```text
//! AtomSpace → export_atomese() → ;; header + root atoms as s-expressions
//!           → export_json()    → { space, name, generated_at, atoms: [...] }
//! ```
//!
//! Only root atoms (atoms no link holds) are written by `export_atomese`;
//! everything else appears nested inside them.

use std::fmt::Write as _;
use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::atom::escape;
use crate::model::{Atom, AtomKind, Handle, SpaceId};
use crate::storage::StorageBackend;
use crate::{AtomSpace, Result};

const INDENT: &str = "  ";

/// Render `handle` and everything below it. Links put one member per
/// line; non-default truth values follow the type name.
pub fn render_atom<B: StorageBackend>(space: &AtomSpace<B>, handle: Handle) -> Result<String> {
    let mut out = String::new();
    let mut stack = vec![Step::Open { handle, depth: 0 }];

    // Explicit work stack: link nesting depth is unbounded.
    while let Some(step) = stack.pop() {
        let (handle, depth) = match step {
            Step::Close => {
                out.push(')');
                continue;
            }
            Step::Open { handle, depth } => (handle, depth),
        };
        if depth > 0 {
            out.push('\n');
            out.push_str(&INDENT.repeat(depth));
        }

        let atom = space.atom(handle)?;
        let tv = if atom.tv.is_default() { String::new() } else { format!(" {}", atom.tv) };
        match &atom.kind {
            AtomKind::Node { name } => {
                let _ = write!(out, "({} \"{}\"{tv})", atom.atom_type, escape(name));
            }
            AtomKind::Link { outgoing } => {
                let _ = write!(out, "({}{tv}", atom.atom_type);
                stack.push(Step::Close);
                stack.extend(
                    outgoing
                        .iter()
                        .rev()
                        .map(|member| Step::Open { handle: *member, depth: depth + 1 }),
                );
            }
        }
    }
    Ok(out)
}

enum Step {
    Open { handle: Handle, depth: usize },
    Close,
}

/// Write every root atom as Atomese, preceded by a `;;` header.
pub fn export_atomese<B: StorageBackend>(space: &AtomSpace<B>, writer: &mut dyn Write) -> Result<()> {
    let atoms = sorted_atoms(space)?;
    let nodes = atoms.iter().filter(|a| a.is_node()).count();

    writeln!(writer, ";; atomspace-rs Atomese export")?;
    if let Some(name) = &space.config().name {
        writeln!(writer, ";; Space: {name}")?;
    }
    writeln!(writer, ";; Generated: {}", Utc::now().to_rfc3339())?;
    writeln!(writer, ";; Nodes: {nodes}")?;
    writeln!(writer, ";; Links: {}", atoms.len() - nodes)?;
    writeln!(writer)?;

    for atom in &atoms {
        if space.incoming(atom.handle)?.is_empty() {
            writeln!(writer, "{}", render_atom(space, atom.handle)?)?;
        }
    }
    Ok(())
}

/// Serialized form written by [`export_json`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub space: SpaceId,
    pub name: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub atoms: Vec<Atom>,
}

pub fn snapshot<B: StorageBackend>(space: &AtomSpace<B>) -> Result<Snapshot> {
    Ok(Snapshot {
        space: space.id(),
        name: space.config().name.clone(),
        generated_at: Utc::now(),
        atoms: sorted_atoms(space)?,
    })
}

/// Write a pretty-printed JSON snapshot of every atom.
pub fn export_json<B: StorageBackend>(space: &AtomSpace<B>, writer: &mut dyn Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, &snapshot(space)?)?;
    writeln!(writer)?;
    Ok(())
}

fn sorted_atoms<B: StorageBackend>(space: &AtomSpace<B>) -> Result<Vec<Atom>> {
    let mut atoms = space.backend().all_atoms()?;
    atoms.sort_by_key(|a| a.handle);
    Ok(atoms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AtomType, TruthValue};
    use crate::SpaceConfig;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_nested() {
        let space = AtomSpace::new();
        let a = space.add_node(AtomType::ConceptNode, "atom1").unwrap();
        let gpn = space.add_node(AtomType::GroundedPredicateNode, "py:foobar").unwrap();
        let list = space.add_link(AtomType::ListLink, &[a, a]).unwrap();
        let eval = space.add_link(AtomType::EvaluationLink, &[gpn, list]).unwrap();

        assert_eq!(
            render_atom(&space, eval).unwrap(),
            "(EvaluationLink\n  (GroundedPredicateNode \"py:foobar\")\n  (ListLink\n    (ConceptNode \"atom1\")\n    (ConceptNode \"atom1\")))"
        );
    }

    #[test]
    fn test_render_truth_and_escapes() {
        let space = AtomSpace::new();
        let a = space.add_node(AtomType::ConceptNode, "say \"hi\"").unwrap();
        space.set_truth_value(a, TruthValue::new(0.5, 0.25)).unwrap();
        let t = space.add_link(AtomType::TrueLink, &[]).unwrap();

        assert_eq!(render_atom(&space, a).unwrap(), "(ConceptNode \"say \\\"hi\\\"\" (stv 0.5 0.25))");
        assert_eq!(render_atom(&space, t).unwrap(), "(TrueLink)");
    }

    #[test]
    fn test_render_deep_chain() {
        let space = AtomSpace::new();
        let mut top = space.add_node(AtomType::ConceptNode, "leaf").unwrap();
        for _ in 0..5_000 {
            top = space.add_link(AtomType::ListLink, &[top]).unwrap();
        }

        let text = render_atom(&space, top).unwrap();
        assert!(text.starts_with("(ListLink\n  (ListLink\n"));
        assert!(text.ends_with(&format!("(ConceptNode \"leaf\"){}", ")".repeat(5_000))));
        assert_eq!(text.lines().count(), 5_001);
    }

    #[test]
    fn test_export_atomese_roots_only() {
        let space = AtomSpace::with_config(SpaceConfig::named("kb")).unwrap();
        let cat = space.add_node(AtomType::ConceptNode, "cat").unwrap();
        let animal = space.add_node(AtomType::ConceptNode, "animal").unwrap();
        space.add_link(AtomType::InheritanceLink, &[cat, animal]).unwrap();
        space.add_node(AtomType::ConceptNode, "loner").unwrap();

        let mut buf = Vec::new();
        export_atomese(&space, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.starts_with(";; atomspace-rs Atomese export\n;; Space: kb\n"));
        assert!(text.contains(";; Nodes: 3\n;; Links: 1\n"));
        assert!(text.contains("(InheritanceLink\n  (ConceptNode \"cat\")\n  (ConceptNode \"animal\"))\n"));
        assert!(text.contains("(ConceptNode \"loner\")\n"));
        assert_eq!(text.matches("(ConceptNode \"cat\")").count(), 1);
    }

    #[test]
    fn test_export_json_snapshot() {
        let space = AtomSpace::new();
        let a = space.add_node(AtomType::ConceptNode, "a").unwrap();
        space.add_link(AtomType::ListLink, &[a]).unwrap();

        let mut buf = Vec::new();
        export_json(&space, &mut buf).unwrap();
        let snap: Snapshot = serde_json::from_slice(&buf).unwrap();

        assert_eq!(snap.space, space.id());
        assert_eq!(snap.atoms.len(), 2);
        assert_eq!(snap.atoms[0].name(), Some("a"));
        assert_eq!(snap.atoms[1].outgoing(), &[a]);
    }
}
