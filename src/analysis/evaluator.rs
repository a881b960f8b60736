//! Static evaluation of branch conditions.
//!
//! The analyser prunes `if` branches that cannot run for a given screen. A
//! [`StaticEvaluator`] answers `Some(true)`, `Some(false)` or `None` for a
//! condition; `None` keeps both branches.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::{
    ast::{NodeId, NodeKind, NodeRef},
    macros::StandardMacros,
};

pub trait StaticEvaluator {
    fn evaluate(&self, condition: NodeRef<'_>) -> Option<bool>;
}

/// Knows nothing; every condition is undecided.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnknownEvaluator;

impl StaticEvaluator for UnknownEvaluator {
    fn evaluate(&self, _condition: NodeRef<'_>) -> Option<bool> {
        None
    }
}

/// Abstract value of an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Unknown,
    Null,
    /// A non-null object of unknown identity.
    Present,
    Bool(bool),
    /// Any other literal, by its source text.
    Literal(String),
}

impl Value {
    fn from_literal(text: &str) -> Self {
        match text {
            "null" => Value::Null,
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::Literal(text.to_string()),
        }
    }

    fn presence(present: bool) -> Self {
        if present {
            Value::Present
        } else {
            Value::Null
        }
    }

    /// `==` over the lattice; two present objects are not comparable.
    fn equals(&self, other: &Value) -> Option<bool> {
        match (self, other) {
            (Value::Unknown, _) | (_, Value::Unknown) => None,
            (Value::Present, Value::Present) => None,
            (Value::Null, Value::Null) => Some(true),
            (Value::Null, _) | (_, Value::Null) => Some(false),
            (a, b) => Some(a == b),
        }
    }
}

/// Evaluates conditions against a screen's layout and the values its fields
/// and locals are known to hold.
#[derive(Debug, Clone)]
pub struct LayoutEvaluator<'m> {
    macros: &'m StandardMacros,
    ids: BTreeSet<String>,
    tags: BTreeSet<String>,
    fields: BTreeMap<String, Value>,
    locals: BTreeMap<String, Value>,
}

// ============================================================================
// PUBLIC API
// ============================================================================

impl<'m> LayoutEvaluator<'m> {
    pub fn new(macros: &'m StandardMacros, ids: BTreeSet<String>, tags: BTreeSet<String>) -> Self {
        LayoutEvaluator {
            macros,
            ids,
            tags,
            fields: BTreeMap::new(),
            locals: BTreeMap::new(),
        }
    }

    pub fn with_fields(mut self, fields: BTreeMap<String, Value>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_locals(mut self, locals: BTreeMap<String, Value>) -> Self {
        self.locals = locals;
        self
    }

    /// Abstract value of `expression`. Children are evaluated first, with an
    /// explicit post-order stack.
    pub fn value(&self, expression: NodeRef<'_>) -> Value {
        let mut values: HashMap<NodeId, Value> = HashMap::new();
        let mut stack = vec![(expression, false)];
        while let Some((node, expanded)) = stack.pop() {
            if let Some(value) = self.leaf_value(node) {
                values.insert(node.id(), value);
                continue;
            }
            if !expanded {
                stack.push((node, true));
                stack.extend(node.children().map(|c| (c, false)));
                continue;
            }
            let child = |index: usize| {
                node.child(index)
                    .and_then(|c| values.get(&c.id()))
                    .cloned()
                    .unwrap_or(Value::Unknown)
            };
            let value = match (node.kind(), node.text()) {
                (NodeKind::Parenthesized, _) => child(0),
                (NodeKind::TypeCast, _) => child(1),
                (NodeKind::Prefix, Some("!")) => match child(0) {
                    Value::Bool(b) => Value::Bool(!b),
                    _ => Value::Unknown,
                },
                (NodeKind::Binary, Some(op @ ("==" | "!="))) => match child(0).equals(&child(1)) {
                    Some(equal) => Value::Bool(equal == (op == "==")),
                    None => Value::Unknown,
                },
                _ => Value::Unknown,
            };
            values.insert(node.id(), value);
        }
        values.remove(&expression.id()).unwrap_or(Value::Unknown)
    }
}

impl StaticEvaluator for LayoutEvaluator<'_> {
    fn evaluate(&self, condition: NodeRef<'_>) -> Option<bool> {
        match self.value(condition) {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }
}

// ============================================================================
// INTERNAL HELPERS
// ============================================================================

impl LayoutEvaluator<'_> {
    /// Values decided without looking at children: literals, view and
    /// fragment lookups, and variable references.
    fn leaf_value(&self, node: NodeRef<'_>) -> Option<Value> {
        match node.kind() {
            NodeKind::Literal => return Some(Value::from_literal(node.text().unwrap_or_default())),
            NodeKind::Reference => return Some(self.variable(node)),
            NodeKind::MethodCall => {}
            NodeKind::Parenthesized | NodeKind::TypeCast | NodeKind::Prefix | NodeKind::Binary => {
                return None
            }
            _ => return Some(Value::Unknown),
        }

        let by_id = self
            .macros
            .find_view_by_id1
            .match_node(node)
            .or_else(|| self.macros.find_view_by_id2.match_node(node));
        if let Some(bindings) = by_id {
            let id = bindings.get("$id").and_then(|n| n.text())?;
            return Some(Value::presence(self.ids.contains(id)));
        }
        if let Some(bindings) = self.macros.find_fragment_by_tag.match_node(node) {
            let tag = bindings.get("$tag").map(|n| n.print())?;
            return Some(match unquote(&tag) {
                Some(tag) => Value::presence(self.tags.contains(tag)),
                None => Value::Unknown,
            });
        }
        Some(Value::Unknown)
    }

    /// Locals shadow fields; `this.x` only names a field.
    fn variable(&self, reference: NodeRef<'_>) -> Value {
        let Some(name) = reference.name() else {
            return Value::Unknown;
        };
        let lookup = match reference.child_count() {
            1 => self.locals.get(name).or_else(|| self.fields.get(name)),
            2 if reference.first_child().map(|q| q.kind()) == Some(NodeKind::This) => {
                self.fields.get(name)
            }
            _ => None,
        };
        lookup.cloned().unwrap_or(Value::Unknown)
    }
}

fn unquote(text: &str) -> Option<&str> {
    text.strip_prefix('"')?.strip_suffix('"')
}
