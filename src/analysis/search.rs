//! Searching a subtree for macro matches.

use super::evaluator::{StaticEvaluator, UnknownEvaluator};
use crate::{
    ast::{NodeKind, NodeRef},
    macros::{MultiMatch, NodeBindings},
};

enum Visit<'t> {
    Enter(NodeRef<'t>),
    Leave(NodeRef<'t>),
}

/// Walks `root` in post-order and offers every expression node, and every
/// node of the template root's kind, to `matcher`. For `if` statements the
/// condition is walked first; the then-branch is skipped when `evaluator`
/// decides the condition is false, the else-branch when it is true.
pub fn search<'t>(
    root: NodeRef<'t>,
    evaluator: &dyn StaticEvaluator,
    matcher: &MultiMatch,
    on_match: &mut dyn FnMut(NodeBindings<'t>),
) {
    let pattern_kind = matcher.template().body().kind();
    let mut stack = vec![Visit::Enter(root)];
    while let Some(visit) = stack.pop() {
        match visit {
            Visit::Enter(node) => {
                stack.push(Visit::Leave(node));
                if node.kind() == NodeKind::If {
                    push_live_branches(node, evaluator, &mut stack);
                } else {
                    stack.extend(node.children().rev().map(Visit::Enter));
                }
            }
            Visit::Leave(node) => {
                if !node.kind().is_expression() && node.kind() != pattern_kind {
                    continue;
                }
                if let Some(bindings) = matcher.match_node(node) {
                    on_match(bindings);
                }
            }
        }
    }
}

/// Collects every match, in visit order.
pub fn search_all<'t>(
    root: NodeRef<'t>,
    evaluator: &dyn StaticEvaluator,
    matcher: &MultiMatch,
) -> Vec<NodeBindings<'t>> {
    let mut found = Vec::new();
    search(root, evaluator, matcher, &mut |b| found.push(b));
    found
}

/// The single match under `root`, or `None` when there are zero or several.
pub fn match_unique<'t>(root: NodeRef<'t>, matcher: &MultiMatch) -> Option<NodeBindings<'t>> {
    let mut found = search_all(root, &UnknownEvaluator, matcher);
    if found.len() != 1 {
        return None;
    }
    found.pop()
}

fn push_live_branches<'t>(
    node: NodeRef<'t>,
    evaluator: &dyn StaticEvaluator,
    stack: &mut Vec<Visit<'t>>,
) {
    let Some(condition) = node.child(0) else {
        return;
    };
    let decided = evaluator.evaluate(condition);
    if decided != Some(true) {
        if let Some(otherwise) = node.child(2) {
            stack.push(Visit::Enter(otherwise));
        }
    }
    if decided != Some(false) {
        if let Some(then) = node.child(1) {
            stack.push(Visit::Enter(then));
        }
    }
    stack.push(Visit::Enter(condition));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ast::NodeRef,
        macros::{BindingMode, MultiMatch, Template},
        syntax::parse_statement,
    };

    struct Always(bool);

    impl StaticEvaluator for Always {
        fn evaluate(&self, _condition: NodeRef<'_>) -> Option<bool> {
            Some(self.0)
        }
    }

    fn start() -> MultiMatch {
        let t = Template::parse("void go(Object $c) { start($c); }").unwrap();
        MultiMatch::new(t, BindingMode::Lenient)
    }

    fn started(evaluator: &dyn StaticEvaluator, source: &str) -> Vec<String> {
        let tree = parse_statement(source).unwrap();
        search_all(tree.root_ref(), evaluator, &start())
            .into_iter()
            .filter_map(|b| b.get("$c").map(|n| n.print()))
            .collect()
    }

    const BRANCHY: &str = "{ if (cond) { start(a); } else { start(b); } start(c); }";

    #[test]
    fn unknown_conditions_walk_both_branches() {
        assert_eq!(started(&UnknownEvaluator, BRANCHY), vec!["a", "b", "c"]);
    }

    #[test]
    fn decided_conditions_prune() {
        assert_eq!(started(&Always(true), BRANCHY), vec!["a", "c"]);
        assert_eq!(started(&Always(false), BRANCHY), vec!["b", "c"]);
    }

    #[test]
    fn matches_are_post_order() {
        assert_eq!(started(&UnknownEvaluator, "start(start(inner));"), vec!["inner", "start(inner)"]);
    }

    #[test]
    fn unique_match_requires_exactly_one() {
        let tree = parse_statement("{ start(a); start(b); }").unwrap();
        assert!(match_unique(tree.root_ref(), &start()).is_none());
        let tree = parse_statement("{ start(a); }").unwrap();
        assert!(match_unique(tree.root_ref(), &start()).is_some());
    }
}
