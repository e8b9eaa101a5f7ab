//! Atom types and their inheritance hierarchy.
//!
//! The hierarchy is single-inheritance: every type except `Atom` has
//! exactly one parent. `is_a` walks the parent chain.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Every atom type known to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AtomType {
    Atom,

    // Nodes
    Node,
    ConceptNode,
    PredicateNode,
    GroundedPredicateNode,
    SchemaNode,
    GroundedSchemaNode,
    VariableNode,
    GlobNode,
    NumberNode,
    TypeNode,

    // Link roots
    Link,
    OrderedLink,
    UnorderedLink,
    ScopeLink,

    // Ordered links
    ListLink,
    EvaluationLink,
    ExecutionOutputLink,
    PutLink,
    VariableList,
    TypedVariableLink,
    InheritanceLink,
    MemberLink,
    NotLink,
    QuoteLink,
    UnquoteLink,
    MinusLink,
    DivideLink,
    GreaterThanLink,
    TrueLink,
    FalseLink,

    // Unordered links
    SetLink,
    AndLink,
    OrLink,
    PlusLink,
    TimesLink,
    EqualLink,

    // Scope links
    LambdaLink,
    GetLink,
    BindLink,
}

impl AtomType {
    /// All types, in declaration order.
    pub const ALL: &'static [AtomType] = &[
        AtomType::Atom,
        AtomType::Node,
        AtomType::ConceptNode,
        AtomType::PredicateNode,
        AtomType::GroundedPredicateNode,
        AtomType::SchemaNode,
        AtomType::GroundedSchemaNode,
        AtomType::VariableNode,
        AtomType::GlobNode,
        AtomType::NumberNode,
        AtomType::TypeNode,
        AtomType::Link,
        AtomType::OrderedLink,
        AtomType::UnorderedLink,
        AtomType::ScopeLink,
        AtomType::ListLink,
        AtomType::EvaluationLink,
        AtomType::ExecutionOutputLink,
        AtomType::PutLink,
        AtomType::VariableList,
        AtomType::TypedVariableLink,
        AtomType::InheritanceLink,
        AtomType::MemberLink,
        AtomType::NotLink,
        AtomType::QuoteLink,
        AtomType::UnquoteLink,
        AtomType::MinusLink,
        AtomType::DivideLink,
        AtomType::GreaterThanLink,
        AtomType::TrueLink,
        AtomType::FalseLink,
        AtomType::SetLink,
        AtomType::AndLink,
        AtomType::OrLink,
        AtomType::PlusLink,
        AtomType::TimesLink,
        AtomType::EqualLink,
        AtomType::LambdaLink,
        AtomType::GetLink,
        AtomType::BindLink,
    ];

    /// Direct parent in the hierarchy. `Atom` has none.
    pub fn parent(self) -> Option<AtomType> {
        use AtomType::*;
        let parent = match self {
            Atom => return None,
            Node | Link => Atom,
            ConceptNode | PredicateNode | SchemaNode | VariableNode | GlobNode
            | NumberNode | TypeNode => Node,
            GroundedPredicateNode => PredicateNode,
            GroundedSchemaNode => SchemaNode,
            OrderedLink | UnorderedLink | ScopeLink => Link,
            ListLink | EvaluationLink | ExecutionOutputLink | PutLink | VariableList
            | TypedVariableLink | InheritanceLink | MemberLink | NotLink | QuoteLink
            | UnquoteLink | MinusLink | DivideLink | GreaterThanLink | TrueLink
            | FalseLink => OrderedLink,
            SetLink | AndLink | OrLink | PlusLink | TimesLink | EqualLink => UnorderedLink,
            LambdaLink | GetLink | BindLink => ScopeLink,
        };
        Some(parent)
    }

    /// True if `self` is `other` or inherits from it.
    pub fn is_a(self, other: AtomType) -> bool {
        let mut t = Some(self);
        while let Some(cur) = t {
            if cur == other {
                return true;
            }
            t = cur.parent();
        }
        false
    }

    pub fn is_node(self) -> bool {
        self.is_a(AtomType::Node)
    }

    pub fn is_link(self) -> bool {
        self.is_a(AtomType::Link)
    }

    /// Abstract types cannot be instantiated.
    pub fn is_abstract(self) -> bool {
        matches!(
            self,
            AtomType::Atom
                | AtomType::Node
                | AtomType::Link
                | AtomType::OrderedLink
                | AtomType::UnorderedLink
                | AtomType::ScopeLink
        )
    }

    /// Links whose outgoing order carries no meaning. Interned in sorted order.
    pub fn is_unordered(self) -> bool {
        self.is_a(AtomType::UnorderedLink)
    }

    /// Types that `execute` reduces to something other than themselves.
    pub fn is_executable(self) -> bool {
        matches!(
            self,
            AtomType::ExecutionOutputLink
                | AtomType::PutLink
                | AtomType::PlusLink
                | AtomType::TimesLink
                | AtomType::MinusLink
                | AtomType::DivideLink
        )
    }

    /// Types that `evaluate` computes a truth value for.
    pub fn is_evaluatable(self) -> bool {
        matches!(
            self,
            AtomType::EvaluationLink
                | AtomType::NotLink
                | AtomType::AndLink
                | AtomType::OrLink
                | AtomType::TrueLink
                | AtomType::FalseLink
                | AtomType::GreaterThanLink
                | AtomType::EqualLink
        )
    }

    /// Subtypes of `self`, including `self`.
    pub fn subtypes(self) -> impl Iterator<Item = AtomType> {
        Self::ALL.iter().copied().filter(move |t| t.is_a(self))
    }

    pub fn name(self) -> &'static str {
        use AtomType::*;
        match self {
            Atom => "Atom",
            Node => "Node",
            ConceptNode => "ConceptNode",
            PredicateNode => "PredicateNode",
            GroundedPredicateNode => "GroundedPredicateNode",
            SchemaNode => "SchemaNode",
            GroundedSchemaNode => "GroundedSchemaNode",
            VariableNode => "VariableNode",
            GlobNode => "GlobNode",
            NumberNode => "NumberNode",
            TypeNode => "TypeNode",
            Link => "Link",
            OrderedLink => "OrderedLink",
            UnorderedLink => "UnorderedLink",
            ScopeLink => "ScopeLink",
            ListLink => "ListLink",
            EvaluationLink => "EvaluationLink",
            ExecutionOutputLink => "ExecutionOutputLink",
            PutLink => "PutLink",
            VariableList => "VariableList",
            TypedVariableLink => "TypedVariableLink",
            InheritanceLink => "InheritanceLink",
            MemberLink => "MemberLink",
            NotLink => "NotLink",
            QuoteLink => "QuoteLink",
            UnquoteLink => "UnquoteLink",
            MinusLink => "MinusLink",
            DivideLink => "DivideLink",
            GreaterThanLink => "GreaterThanLink",
            TrueLink => "TrueLink",
            FalseLink => "FalseLink",
            SetLink => "SetLink",
            AndLink => "AndLink",
            OrLink => "OrLink",
            PlusLink => "PlusLink",
            TimesLink => "TimesLink",
            EqualLink => "EqualLink",
            LambdaLink => "LambdaLink",
            GetLink => "GetLink",
            BindLink => "BindLink",
        }
    }
}

impl fmt::Display for AtomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AtomType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.name() == s)
            .ok_or_else(|| Error::Validation(format!("Expecting a known atom type name, got '{s}'")))
    }
}
