//! Structural unification of a template against a candidate subtree.
//!
//! The walk is pre-order and left to right over an explicit stack of
//! `(pattern, candidate)` pairs. For each pair, in order:
//!
//! 1. a pattern variable (identifier or single-segment reference) binds the
//!    candidate, whatever its kind;
//! 2. `q.$()` binds `q` to the candidate when the candidate is a call;
//! 3. identifiers compare by text, or through the parameter alias table;
//! 4. otherwise kinds must agree and children are paired positionally; when
//!    either side runs out the remaining children are ignored.
//!
//! Method pairs (including anonymous-class methods) first align their formal
//! parameter names so `onClick(View view)` matches `onClick(View v)`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{bindings::NodeBindings, template::Template};
use crate::ast::{NodeKind, NodeRef};

/// How a variable that occurs more than once in a template is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingMode {
    /// Every occurrence rebinds; the last one visited wins.
    #[default]
    Lenient,
    /// Every occurrence must bind a structurally equal subtree.
    Strict,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Unifier {
    mode: BindingMode,
}

impl Unifier {
    pub fn new(mode: BindingMode) -> Self {
        Unifier { mode }
    }

    pub fn mode(&self) -> BindingMode {
        self.mode
    }

    /// Matches `template` against `candidate`. Returns `None` on mismatch.
    pub fn unify<'t>(&self, template: &Template, candidate: NodeRef<'t>) -> Option<NodeBindings<'t>> {
        let mut state = Unification {
            template,
            mode: self.mode,
            bindings: NodeBindings::new(),
            aliases: HashMap::new(),
        };
        let mut stack = vec![(template.body(), candidate)];

        while let Some((pattern, node)) = stack.pop() {
            if let Some(variable) = pattern_variable(template, pattern) {
                state.bind(variable, node)?;
                continue;
            }
            if let Some(variable) = any_call_variable(template, pattern) {
                if node.kind() != NodeKind::MethodCall {
                    return None;
                }
                state.bind(variable, node)?;
                continue;
            }
            if pattern.kind() == NodeKind::Identifier {
                if node.kind() != NodeKind::Identifier || !state.same_name(pattern, node) {
                    return None;
                }
                continue;
            }
            if pattern.kind() != node.kind() {
                return None;
            }
            if pattern.kind() == NodeKind::Method {
                state.align_parameters(pattern, node);
            }
            let pairs: Vec<_> = pattern.children().zip(node.children()).collect();
            stack.extend(pairs.into_iter().rev());
        }

        let complete = template.parameters().iter().all(|p| state.bindings.contains(p));
        complete.then_some(state.bindings)
    }
}

struct Unification<'a, 't> {
    template: &'a Template,
    mode: BindingMode,
    bindings: NodeBindings<'t>,
    aliases: HashMap<&'a str, &'t str>,
}

impl<'a, 't> Unification<'a, 't> {
    fn bind(&mut self, variable: &str, node: NodeRef<'t>) -> Option<()> {
        let previous = self.bindings.insert(variable, node);
        match (self.mode, previous) {
            (BindingMode::Strict, Some(previous)) if !previous.same_structure(node) => None,
            _ => Some(()),
        }
    }

    fn same_name(&self, pattern: NodeRef<'a>, node: NodeRef<'t>) -> bool {
        let (Some(expected), Some(actual)) = (pattern.text(), node.text()) else {
            return false;
        };
        expected == actual || self.aliases.get(expected) == Some(&actual)
    }

    fn align_parameters(&mut self, pattern: NodeRef<'a>, node: NodeRef<'t>) {
        let (Some(expected), Some(actual)) = (
            pattern.find_child(NodeKind::ParameterList),
            node.find_child(NodeKind::ParameterList),
        ) else {
            return;
        };
        for (p, n) in expected.children().zip(actual.children()) {
            if let (Some(from), Some(to)) = (p.name(), n.name()) {
                if from != to && !self.template.is_variable(from) {
                    self.aliases.insert(from, to);
                }
            }
        }
    }
}

// ============================================================================
// PATTERN SHAPES (shared with instantiation)
// ============================================================================

/// The variable a pattern node stands for, if any.
pub(crate) fn pattern_variable<'a>(template: &Template, node: NodeRef<'a>) -> Option<&'a str> {
    let name = match node.kind() {
        NodeKind::Identifier => node.text()?,
        NodeKind::Reference if node.child_count() == 1 => {
            let only = node.first_child()?;
            if only.kind() != NodeKind::Identifier {
                return None;
            }
            only.text()?
        }
        _ => return None,
    };
    template.is_variable(name).then_some(name)
}

/// For `q.$()`, the variable `q`.
pub(crate) fn any_call_variable<'a>(template: &Template, node: NodeRef<'a>) -> Option<&'a str> {
    if node.kind() != NodeKind::MethodCall {
        return None;
    }
    let callee = node.first_child()?;
    if callee.kind() != NodeKind::Reference || callee.child_count() != 2 {
        return None;
    }
    if callee.last_child()?.text() != Some("$") {
        return None;
    }
    let qualifier = callee.first_child()?;
    pattern_variable(template, qualifier)
}
