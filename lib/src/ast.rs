//! The parsed form of a template.
//!
//! A [`Document`] owns a tree of [`Node`]s. Nodes own their children and
//! never point back at their parents; walkers that need ancestry track it on
//! their own stack. The tree only ever grows: parsing builds it, escaping
//! rewrites text and appends escaping calls, and execution only reads it.

use std::fmt;

use crate::error::Result;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Kind {
    Root,
    /// Literal text, written verbatim.
    Text,
    /// `{{ ... }}`: one or more commands whose final value is written.
    Action,
    /// One `|`-separated segment of an action.
    Command,
    /// `.Name`: a member of the data object.
    Field,
    /// `Name`: a built-in helper or a member of the data object.
    Identifier,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: Kind,
    /// Literal text, or a field or identifier name. Empty for all other kinds.
    pub value: String,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(kind: Kind, value: impl Into<String>) -> Self {
        Node { kind, value: value.into(), children: vec![] }
    }

    pub fn root() -> Self {
        Node::new(Kind::Root, "")
    }

    pub fn text(text: impl Into<String>) -> Self {
        Node::new(Kind::Text, text)
    }

    pub fn action() -> Self {
        Node::new(Kind::Action, "")
    }

    pub fn command() -> Self {
        Node::new(Kind::Command, "")
    }

    pub fn field(name: impl Into<String>) -> Self {
        Node::new(Kind::Field, name)
    }

    pub fn identifier(name: impl Into<String>) -> Self {
        Node::new(Kind::Identifier, name)
    }

    /// Appends `child` and returns `self`.
    pub fn with(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn push(&mut self, child: Node) {
        self.children.push(child);
    }

    /// The number of nodes in this subtree, including `self`.
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(Node::len).sum::<usize>()
    }

    /// Walks this subtree depth first, calling `enter` before a node's
    /// children and `leave` after them. Stops at the first error.
    pub fn walk<V: Visitor + ?Sized>(&self, visitor: &mut V) -> Result<()> {
        visitor.enter(self)?;
        for child in &self.children {
            child.walk(visitor)?;
        }

        visitor.leave(self)
    }

    /// Like [`Node::walk()`], but `visitor` may modify nodes as it goes. The
    /// children walked are the ones present after `enter` returns.
    pub fn walk_mut<V: VisitorMut + ?Sized>(&mut self, visitor: &mut V) -> Result<()> {
        visitor.enter(self)?;
        for child in &mut self.children {
            child.walk_mut(visitor)?;
        }

        visitor.leave(self)
    }
}

/// Reconstructs template source: `{{.A | B}}` for an action, text verbatim.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            Kind::Root => self.children.iter().try_for_each(|c| fmt::Display::fmt(c, f)),
            Kind::Text | Kind::Field | Kind::Identifier => f.write_str(&self.value),
            Kind::Action => {
                f.write_str("{{")?;
                for (i, command) in self.children.iter().enumerate() {
                    if i > 0 { f.write_str(" | ")?; }
                    fmt::Display::fmt(command, f)?;
                }

                f.write_str("}}")
            }
            Kind::Command => {
                for (i, term) in self.children.iter().enumerate() {
                    if i > 0 { f.write_str(" ")?; }
                    fmt::Display::fmt(term, f)?;
                }

                Ok(())
            }
        }
    }
}

pub trait Visitor {
    fn enter(&mut self, node: &Node) -> Result<()>;

    fn leave(&mut self, node: &Node) -> Result<()>;
}

pub trait VisitorMut {
    fn enter(&mut self, node: &mut Node) -> Result<()>;

    fn leave(&mut self, node: &mut Node) -> Result<()>;
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub name: String,
    pub root: Node,
    pub(crate) escaped: bool,
}

impl Document {
    pub fn new(name: impl Into<String>, root: Node) -> Self {
        Document { name: name.into(), root, escaped: false }
    }

    /// Whether this document has been through [`escape()`](crate::escape()).
    pub fn is_escaped(&self) -> bool {
        self.escaped
    }
}
