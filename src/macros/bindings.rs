//! Variable bindings produced by unification and consumed by instantiation.

use im::OrdMap;

use crate::ast::NodeRef;

/// `variable → value` plus one level of named sub-bindings (one per
/// sub-macro slot). Maps are ordered, so iteration is deterministic.
#[derive(Debug, Clone, PartialEq)]
pub struct Bindings<V: Clone> {
    vars: OrdMap<String, V>,
    sub: OrdMap<String, Bindings<V>>,
}

/// Bindings into a candidate tree, as produced by matching.
pub type NodeBindings<'t> = Bindings<NodeRef<'t>>;

/// Bindings to replacement text, as consumed by textual instantiation.
pub type TextBindings = Bindings<String>;

impl<V: Clone> Default for Bindings<V> {
    fn default() -> Self {
        Bindings {
            vars: OrdMap::new(),
            sub: OrdMap::new(),
        }
    }
}

impl<V: Clone> Bindings<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&V> {
        self.vars.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Binds `name`, returning the value it replaced.
    pub fn insert(&mut self, name: impl Into<String>, value: V) -> Option<V> {
        self.vars.insert(name.into(), value)
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, value: V) -> Self {
        self.insert(name, value);
        self
    }

    pub fn sub(&self, slot: &str) -> Option<&Bindings<V>> {
        self.sub.get(slot)
    }

    pub fn insert_sub(&mut self, slot: impl Into<String>, bindings: Bindings<V>) {
        self.sub.insert(slot.into(), bindings);
    }

    pub fn with_sub(mut self, slot: impl Into<String>, bindings: Bindings<V>) -> Self {
        self.insert_sub(slot, bindings);
        self
    }

    pub fn vars(&self) -> impl Iterator<Item = (&str, &V)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn subs(&self) -> impl Iterator<Item = (&str, &Bindings<V>)> {
        self.sub.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty() && self.sub.is_empty()
    }

    pub fn map<W: Clone>(&self, f: &impl Fn(&V) -> W) -> Bindings<W> {
        Bindings {
            vars: self.vars.iter().map(|(k, v)| (k.clone(), f(v))).collect(),
            sub: self.sub.iter().map(|(k, b)| (k.clone(), b.map(f))).collect(),
        }
    }
}

impl NodeBindings<'_> {
    /// Printed source text of every bound node.
    pub fn to_text(&self) -> TextBindings {
        self.map(&|node: &NodeRef<'_>| node.print())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_write_wins_and_reports_previous() {
        let mut b = TextBindings::new();
        assert_eq!(b.insert("$x", "a".to_string()), None);
        assert_eq!(b.insert("$x", "b".to_string()), Some("a".to_string()));
        assert_eq!(b.get("$x").map(String::as_str), Some("b"));
    }

    #[test]
    fn iteration_is_sorted_by_name() {
        let b = TextBindings::new()
            .with("zeta", "1".into())
            .with("$a", "2".into())
            .with_sub("$f", TextBindings::new().with("context", "this".into()));
        let names: Vec<_> = b.vars().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["$a", "zeta"]);
        assert_eq!(b.sub("$f").and_then(|s| s.get("context")).map(String::as_str), Some("this"));
    }
}
