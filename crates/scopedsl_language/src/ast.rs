//! Abstract Syntax Tree for scope expressions.
//!
//! A parsed scope is an immutable tree of [`ScopeExpr`] nodes. Definitions are
//! shared behind `Arc` by the engine's registry, so nothing here is mutated
//! after parsing.

use std::fmt;
use std::sync::Arc;

use crate::filter::Filter;
use crate::span::Span;

/// Where a term's candidates come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceRef {
    /// `actor`: the acting entity.
    Actor,
    /// `location`: the actor's location.
    Location,
    /// `self`: alias for the acting entity.
    SelfRef,
    /// `none`: the empty set.
    Nothing,
    /// `entities(ns:comp)` / `entities(!ns:comp)`
    Entities {
        /// Component id to test.
        component: String,
        /// True for `!`: entities lacking the component.
        negated: bool,
    },
    /// Reference to another registered scope (`ns:name`).
    Scope(String),
}

impl SourceRef {
    /// Returns the referenced scope id, if this is a scope reference.
    #[must_use]
    pub fn scope_id(&self) -> Option<&str> {
        match self {
            Self::Scope(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Actor => f.write_str("actor"),
            Self::Location => f.write_str("location"),
            Self::SelfRef => f.write_str("self"),
            Self::Nothing => f.write_str("none"),
            Self::Entities { component, negated } => {
                let bang = if *negated { "!" } else { "" };
                write!(f, "entities({bang}{component})")
            }
            Self::Scope(id) => f.write_str(id),
        }
    }
}

/// Node discriminant, used to dispatch to resolvers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKind {
    /// [`Node::Source`]
    Source,
    /// [`Node::Filter`]
    Filter,
    /// [`Node::Union`]
    Union,
    /// [`Node::PropertyAccess`]
    PropertyAccess,
    /// [`Node::ArrayIterate`]
    ArrayIterate,
}

impl NodeKind {
    /// All node kinds.
    pub const ALL: [Self; 5] = [
        Self::Source,
        Self::Filter,
        Self::Union,
        Self::PropertyAccess,
        Self::ArrayIterate,
    ];
}

/// The shape of a node.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// A built-in source or scope reference.
    Source(SourceRef),
    /// `child[{json-logic}]`
    Filter {
        /// The filtered expression.
        child: Box<ScopeExpr>,
        /// The compiled filter.
        filter: Arc<Filter>,
    },
    /// `a + b | c`, flattened.
    Union(Vec<ScopeExpr>),
    /// `child.seg.seg...`, consecutive segments collapsed.
    PropertyAccess {
        /// The expression being accessed.
        child: Box<ScopeExpr>,
        /// Path segments, in order.
        path: Vec<String>,
    },
    /// `child[]`
    ArrayIterate(Box<ScopeExpr>),
}

/// A scope expression node with its source span.
#[derive(Clone, Debug, PartialEq)]
pub struct ScopeExpr {
    /// The node.
    pub node: Node,
    /// Source location.
    pub span: Span,
}

impl ScopeExpr {
    /// Creates a new node.
    #[must_use]
    pub const fn new(node: Node, span: Span) -> Self {
        Self { node, span }
    }

    /// Creates a source node.
    #[must_use]
    pub const fn source(source: SourceRef, span: Span) -> Self {
        Self::new(Node::Source(source), span)
    }

    /// Returns the node kind.
    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        match self.node {
            Node::Source(_) => NodeKind::Source,
            Node::Filter { .. } => NodeKind::Filter,
            Node::Union(_) => NodeKind::Union,
            Node::PropertyAccess { .. } => NodeKind::PropertyAccess,
            Node::ArrayIterate(_) => NodeKind::ArrayIterate,
        }
    }

    /// Returns the direct children of this node.
    #[must_use]
    pub fn children(&self) -> Vec<&ScopeExpr> {
        match &self.node {
            Node::Source(_) => Vec::new(),
            Node::Filter { child, .. }
            | Node::PropertyAccess { child, .. }
            | Node::ArrayIterate(child) => vec![child.as_ref()],
            Node::Union(members) => members.iter().collect(),
        }
    }

    /// Returns every scope id referenced anywhere in this expression.
    ///
    /// Order follows source order; duplicates are kept.
    #[must_use]
    pub fn references(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        self.collect_references(&mut refs);
        refs
    }

    fn collect_references<'a>(&'a self, refs: &mut Vec<&'a str>) {
        if let Node::Source(SourceRef::Scope(id)) = &self.node {
            refs.push(id);
        }
        for child in self.children() {
            child.collect_references(refs);
        }
    }

    /// Returns the number of nodes in this expression.
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self
            .children()
            .into_iter()
            .map(ScopeExpr::node_count)
            .sum::<usize>()
    }
}

/// Canonical source form. Re-parsing it yields an equal tree (spans aside).
impl fmt::Display for ScopeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.node {
            Node::Source(source) => write!(f, "{source}"),
            Node::Filter { child, filter } => write!(f, "{child}[{filter}]"),
            Node::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" + ")?;
                    }
                    write!(f, "{member}")?;
                }
                Ok(())
            }
            Node::PropertyAccess { child, path } => {
                write!(f, "{child}")?;
                for segment in path {
                    write!(f, ".{segment}")?;
                }
                Ok(())
            }
            Node::ArrayIterate(child) => write!(f, "{child}[]"),
        }
    }
}

/// A named scope: `id := expr`.
#[derive(Clone, Debug, PartialEq)]
pub struct ScopeDefinition {
    /// Namespaced scope id.
    pub id: String,
    /// The parsed expression.
    pub expr: ScopeExpr,
    /// Span of the whole definition.
    pub span: Span,
}

impl fmt::Display for ScopeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} := {}", self.id, self.expr)
    }
}
