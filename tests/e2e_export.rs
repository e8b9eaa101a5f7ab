//! End-to-end tests for Atomese and JSON export.

use atomspace::export::{export_atomese, export_json, Snapshot};
use atomspace::{AtomKind, AtomSpace, AtomType, SpaceConfig, TruthValue};

fn build(space: &AtomSpace) {
    let atom1 = space.add_node(AtomType::ConceptNode, "atom1").unwrap();
    let gpn = space.add_node(AtomType::GroundedPredicateNode, "py:foobar").unwrap();
    space.add_link(AtomType::EvaluationLink, &[gpn, atom1, atom1, atom1]).unwrap();
    let tv = space.add_node(AtomType::PredicateNode, "weighted").unwrap();
    space.set_truth_value(tv, TruthValue::new(0.8, 0.5)).unwrap();
}

// ============================================================================
// 1. Atomese
// ============================================================================

#[test]
fn test_atomese_export() {
    let space = AtomSpace::with_config(SpaceConfig::named("exceptions")).unwrap();
    build(&space);

    let mut out = Vec::new();
    export_atomese(&space, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    let header: Vec<&str> = text.lines().take_while(|l| l.starts_with(";;")).collect();
    assert_eq!(header[0], ";; atomspace-rs Atomese export");
    assert_eq!(header[1], ";; Space: exceptions");
    assert!(header[2].starts_with(";; Generated: "));
    assert_eq!(&header[3..], &[";; Nodes: 3", ";; Links: 1"]);

    assert!(text.contains(
        "(EvaluationLink\n  (GroundedPredicateNode \"py:foobar\")\n  (ConceptNode \"atom1\")\n  (ConceptNode \"atom1\")\n  (ConceptNode \"atom1\"))"
    ));
    assert!(text.contains("(PredicateNode \"weighted\" (stv 0.8 0.5))"));
}

#[test]
fn test_atom_to_string_matches_export() {
    let space = AtomSpace::new();
    let a = space.add_node(AtomType::ConceptNode, "a").unwrap();
    let list = space.add_link(AtomType::ListLink, &[a]).unwrap();

    let mut out = Vec::new();
    export_atomese(&space, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains(&space.atom_to_string(list).unwrap()));
}

// ============================================================================
// 2. JSON
// ============================================================================

#[test]
fn test_json_snapshot() {
    let space = AtomSpace::with_config(SpaceConfig::named("kb")).unwrap();
    build(&space);

    let mut out = Vec::new();
    export_json(&space, &mut out).unwrap();
    let snap: Snapshot = serde_json::from_slice(&out).unwrap();

    assert_eq!(snap.name.as_deref(), Some("kb"));
    assert_eq!(snap.atoms.len(), space.atom_count().unwrap());

    let eval = snap
        .atoms
        .iter()
        .find(|a| a.atom_type == AtomType::EvaluationLink)
        .unwrap();
    assert!(matches!(&eval.kind, AtomKind::Link { outgoing } if outgoing.len() == 4));

    let weighted = snap.atoms.iter().find(|a| a.name() == Some("weighted")).unwrap();
    assert_eq!(weighted.tv, TruthValue::new(0.8, 0.5));
}

#[test]
fn test_export_of_empty_space() {
    let space = AtomSpace::new();
    let mut out = Vec::new();
    export_atomese(&space, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains(";; Nodes: 0\n;; Links: 0\n"));
    assert!(text.lines().all(|l| l.is_empty() || l.starts_with(";;")));
}
