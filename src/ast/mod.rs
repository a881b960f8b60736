//! Arena-backed syntax trees.
//!
//! A [`SyntaxTree`] owns a flat vector of [`Node`]s addressed by [`NodeId`].
//! Children are stored as index lists and every node records its parent, so
//! walks never need recursion: all traversals in this crate keep an explicit
//! stack of ids. [`NodeRef`] is the borrowed `(tree, id)` handle the matcher
//! and analyser pass around; it is `Copy` and compares by identity.
//!
//! Trees are never edited in place once built. Structural edits
//! ([`SyntaxTree::splice_child`], [`SyntaxTree::graft`]) produce fresh trees,
//! which is what lets a host swap a whole file in one step.

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// CORE TYPES
// ============================================================================

/// Byte range in the text a node was parsed from. Synthesized nodes carry
/// the default (empty) span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// Index of a node inside its [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Node kinds of the snippet language.
///
/// Child layouts (optional children in brackets):
///
/// | kind | children |
/// |---|---|
/// | `Class` | `Modifiers, Identifier, [Extends], [Implements], member*` |
/// | `Method` | `Modifiers, TypeElement, Identifier, ParameterList, [CodeBlock]` |
/// | `Field`, `LocalVariable` | `Modifiers, TypeElement, Identifier, [initializer]` |
/// | `Parameter` | `Modifiers, TypeElement, Identifier` |
/// | `MethodCall` | `Reference (callee), ArgumentList` |
/// | `Reference` | `[qualifier], Identifier` |
/// | `New` | `TypeElement, ArgumentList, [AnonymousClass]` |
/// | `TypeElement` | `Identifier+, [TypeArguments]` (text holds array dims or `?`) |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    // declarations
    CompilationUnit,
    SnippetFile,
    Package,
    Import,
    Class,
    AnonymousClass,
    Extends,
    Implements,
    Field,
    Method,
    ParameterList,
    Parameter,
    Modifiers,
    TypeElement,
    TypeArguments,
    // statements
    CodeBlock,
    LocalVariable,
    ExpressionStatement,
    If,
    Return,
    Switch,
    Case,
    Break,
    Empty,
    // expressions
    Assignment,
    Conditional,
    Binary,
    Prefix,
    TypeCast,
    Parenthesized,
    MethodCall,
    ArgumentList,
    Reference,
    New,
    ClassLiteral,
    This,
    Super,
    Literal,
    Identifier,
}

impl NodeKind {
    /// Kinds that denote a value-producing expression.
    pub fn is_expression(self) -> bool {
        matches!(
            self,
            NodeKind::Assignment
                | NodeKind::Conditional
                | NodeKind::Binary
                | NodeKind::Prefix
                | NodeKind::TypeCast
                | NodeKind::Parenthesized
                | NodeKind::MethodCall
                | NodeKind::Reference
                | NodeKind::New
                | NodeKind::ClassLiteral
                | NodeKind::This
                | NodeKind::Super
                | NodeKind::Literal
        )
    }

    pub fn is_statement(self) -> bool {
        matches!(
            self,
            NodeKind::CodeBlock
                | NodeKind::LocalVariable
                | NodeKind::ExpressionStatement
                | NodeKind::If
                | NodeKind::Return
                | NodeKind::Switch
                | NodeKind::Break
                | NodeKind::Empty
                | NodeKind::Class
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    pub text: Option<String>,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    pub span: Span,
}

/// An arena of nodes with a distinguished root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
    root: NodeId,
}

// ============================================================================
// TREE CONSTRUCTION
// ============================================================================

impl SyntaxTree {
    /// Creates a tree holding a single root node.
    pub fn new(kind: NodeKind, text: Option<String>, span: Span) -> Self {
        let root = Node {
            kind,
            text,
            children: Vec::new(),
            parent: None,
            span,
        };
        SyntaxTree {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    /// An arena without nodes; the caller must [`set_root`](Self::set_root)
    /// before handing it out.
    pub(crate) fn detached() -> Self {
        SyntaxTree {
            nodes: Vec::new(),
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn root_ref(&self) -> NodeRef<'_> {
        self.node(self.root)
    }

    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { tree: self, id }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocates a detached node. Attach it with [`SyntaxTree::push_child`].
    pub fn alloc(&mut self, kind: NodeKind, text: Option<String>, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            text,
            children: Vec::new(),
            parent: None,
            span,
        });
        id
    }

    pub(crate) fn set_text(&mut self, id: NodeId, text: &str) {
        self.nodes[id.index()].text = Some(text.to_string());
    }

    pub fn push_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
    }

    /// Allocates a node and attaches it under `parent` in one step.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
        text: Option<String>,
        span: Span,
    ) -> NodeId {
        let id = self.alloc(kind, text, span);
        self.push_child(parent, id);
        id
    }

    /// Makes a detached node the root. Nodes unreachable from the new root stay
    /// in the arena but are never visited.
    pub fn set_root(&mut self, id: NodeId) {
        self.nodes[id.index()].parent = None;
        self.root = id;
    }

    /// Deep-copies `source` (from any tree) into this arena and returns the
    /// detached copy.
    pub fn graft(&mut self, source: NodeRef<'_>) -> NodeId {
        self.graft_with(source, &mut |_| None)
    }

    /// Deep-copies `source`, asking `replace` about every visited node first.
    /// When it answers `Some(other)`, `other` is copied in place of the node
    /// and `replace` is not consulted inside it.
    pub fn graft_with<'s>(
        &mut self,
        source: NodeRef<'s>,
        replace: &mut dyn FnMut(NodeRef<'s>) -> Option<NodeRef<'s>>,
    ) -> NodeId {
        let (start, substituted) = match replace(source) {
            Some(node) => (node, true),
            None => (source, false),
        };
        let top = self.copy_node(start);
        let mut stack: Vec<(NodeRef<'s>, NodeId, bool)> = Vec::new();
        for child in start.children().rev() {
            stack.push((child, top, substituted));
        }
        while let Some((node, parent, inside_substitute)) = stack.pop() {
            let (node, substituted) = if inside_substitute {
                (node, true)
            } else {
                match replace(node) {
                    Some(other) => (other, true),
                    None => (node, false),
                }
            };
            let copy = self.copy_node(node);
            self.push_child(parent, copy);
            for child in node.children().rev() {
                stack.push((child, copy, substituted));
            }
        }
        top
    }

    fn copy_node(&mut self, node: NodeRef<'_>) -> NodeId {
        self.alloc(node.kind(), node.text().map(str::to_string), node.span())
    }

    /// Returns a fresh tree whose root is a deep copy of `node`.
    pub fn subtree(node: NodeRef<'_>) -> SyntaxTree {
        let mut tree = SyntaxTree::detached();
        let root = tree.graft(node);
        tree.set_root(root);
        tree
    }

    /// Returns a fresh copy of this tree where `insert` has been copied in as a
    /// child of `parent` at position `index` (clamped to the child count).
    pub fn splice_child(&self, parent: NodeId, index: usize, insert: NodeRef<'_>) -> SyntaxTree {
        let mut fresh = SyntaxTree::detached();
        fresh.nodes.reserve(self.nodes.len() + insert.tree.len());
        let root = fresh.copy_node(self.root_ref());
        fresh.set_root(root);
        let mut stack: Vec<(NodeId, NodeId)> = Vec::new();
        stack.push((self.root, root));
        while let Some((old, new)) = stack.pop() {
            let old_children = &self.nodes[old.index()].children;
            let mut copies = Vec::with_capacity(old_children.len() + 1);
            for (position, &child) in old_children.iter().enumerate() {
                if old == parent && position == index {
                    copies.push((None, fresh.graft(insert)));
                }
                copies.push((Some(child), fresh.copy_node(self.node(child))));
            }
            if old == parent && index >= old_children.len() {
                copies.push((None, fresh.graft(insert)));
            }
            for (source, copy) in copies.iter().rev() {
                if let Some(source) = source {
                    stack.push((*source, *copy));
                }
            }
            for (_, copy) in copies {
                fresh.push_child(new, copy);
            }
        }
        fresh
    }
}

// ============================================================================
// NODE HANDLES
// ============================================================================

/// A borrowed handle to one node of a tree.
#[derive(Clone, Copy)]
pub struct NodeRef<'t> {
    tree: &'t SyntaxTree,
    id: NodeId,
}

impl<'t> NodeRef<'t> {
    pub fn id(self) -> NodeId {
        self.id
    }

    pub fn tree(self) -> &'t SyntaxTree {
        self.tree
    }

    fn data(self) -> &'t Node {
        &self.tree.nodes[self.id.index()]
    }

    pub fn kind(self) -> NodeKind {
        self.data().kind
    }

    pub fn text(self) -> Option<&'t str> {
        self.data().text.as_deref()
    }

    pub fn span(self) -> Span {
        self.data().span
    }

    pub fn parent(self) -> Option<NodeRef<'t>> {
        self.data().parent.map(|id| self.tree.node(id))
    }

    pub fn child_count(self) -> usize {
        self.data().children.len()
    }

    pub fn children(self) -> impl DoubleEndedIterator<Item = NodeRef<'t>> + ExactSizeIterator {
        let tree = self.tree;
        self.data().children.iter().map(move |&id| tree.node(id))
    }

    pub fn child(self, index: usize) -> Option<NodeRef<'t>> {
        self.data().children.get(index).map(|&id| self.tree.node(id))
    }

    pub fn first_child(self) -> Option<NodeRef<'t>> {
        self.child(0)
    }

    pub fn last_child(self) -> Option<NodeRef<'t>> {
        self.data().children.last().map(|&id| self.tree.node(id))
    }

    pub fn find_child(self, kind: NodeKind) -> Option<NodeRef<'t>> {
        self.children().find(|c| c.kind() == kind)
    }

    /// The declared name of a class, method, field, variable or parameter, or
    /// the name segment of a reference.
    pub fn name(self) -> Option<&'t str> {
        match self.kind() {
            NodeKind::Identifier => self.text(),
            NodeKind::Class
            | NodeKind::Method
            | NodeKind::Field
            | NodeKind::LocalVariable
            | NodeKind::Parameter
            | NodeKind::Reference => self.find_child(NodeKind::Identifier)?.text(),
            _ => None,
        }
    }

    /// Nearest ancestor (excluding self) of the given kind.
    pub fn ancestor(self, kind: NodeKind) -> Option<NodeRef<'t>> {
        let mut current = self.parent();
        while let Some(node) = current {
            if node.kind() == kind {
                return Some(node);
            }
            current = node.parent();
        }
        None
    }

    /// Pre-order iterator over this node and all of its descendants.
    pub fn descendants(self) -> Descendants<'t> {
        Descendants { stack: vec![self] }
    }

    /// Structural equality: same kinds, texts and child structure.
    pub fn same_structure(self, other: NodeRef<'_>) -> bool {
        let mut stack = vec![(self, other)];
        while let Some((a, b)) = stack.pop() {
            if a.kind() != b.kind() || a.text() != b.text() || a.child_count() != b.child_count() {
                return false;
            }
            stack.extend(a.children().zip(b.children()));
        }
        true
    }

    /// Compact single-line source text of the subtree.
    pub fn print(self) -> String {
        crate::syntax::printer::print_compact(self)
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for NodeRef<'_> {}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}#{}", self.kind(), self.id.0)?;
        if let Some(text) = self.text() {
            write!(f, "({text})")?;
        }
        Ok(())
    }
}

impl fmt::Display for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.print())
    }
}

pub struct Descendants<'t> {
    stack: Vec<NodeRef<'t>>,
}

impl<'t> Iterator for Descendants<'t> {
    type Item = NodeRef<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().rev());
        Some(node)
    }
}
