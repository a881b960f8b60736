//! Hierarchical matching: one macro plus named sub-macros.
//!
//! A sub-macro slot names a variable of the outer macro. After the outer
//! macro matches, the subtree bound to each slot must itself match the slot's
//! sub-macro. The result is the outer bindings with one sub-binding per slot.

use super::{
    bindings::{NodeBindings, TextBindings},
    instantiate::instantiate_text,
    template::Template,
    unifier::{BindingMode, Unifier},
};
use crate::{nav_err, ast::NodeRef, NavError};

#[derive(Debug, Clone)]
pub struct MultiMatch {
    name: String,
    template: Template,
    sub_macros: Vec<(String, Template)>,
    unifier: Unifier,
}

impl MultiMatch {
    pub fn new(template: Template, mode: BindingMode) -> Self {
        MultiMatch {
            name: template.name().to_string(),
            template,
            sub_macros: Vec::new(),
            unifier: Unifier::new(mode),
        }
    }

    /// Renames the matcher; composite macros are catalogued under their own name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_sub_macro(mut self, slot: impl Into<String>, template: Template) -> Self {
        self.sub_macros.push((slot.into(), template));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn sub_macros(&self) -> impl Iterator<Item = (&str, &Template)> {
        self.sub_macros.iter().map(|(slot, t)| (slot.as_str(), t))
    }

    /// Unifies the outer macro, then every sub-macro against its slot's
    /// binding. An unbound slot or a failed sub-match fails the whole match.
    pub fn match_node<'t>(&self, candidate: NodeRef<'t>) -> Option<NodeBindings<'t>> {
        let mut bindings = self.unifier.unify(&self.template, candidate)?;
        for (slot, template) in &self.sub_macros {
            let bound = *bindings.get(slot)?;
            let sub = self.unifier.unify(template, bound)?;
            bindings.insert_sub(slot.clone(), sub);
        }
        Some(bindings)
    }

    /// Instantiates each sub-macro with its sub-bindings, binds the text to
    /// the slot, then instantiates the outer macro.
    pub fn instantiate_text(&self, bindings: &TextBindings) -> Result<String, NavError> {
        let mut outer = bindings.clone();
        for (slot, template) in &self.sub_macros {
            let Some(sub) = bindings.sub(slot) else {
                return Err(nav_err!(
                    Instantiation,
                    "'{}' needs bindings for sub-macro slot '{}'",
                    self.name,
                    slot
                ));
            };
            outer.insert(slot.clone(), instantiate_text(template, sub)?);
        }
        instantiate_text(&self.template, &outer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_expression;

    fn menu_macro() -> MultiMatch {
        let outer = Template::parse(
            "void click(MenuItem $menuItem, Void $f) { $menuItem.setOnMenuItemClickListener($f.$()); }",
        )
        .unwrap();
        let item = Template::parse("void getMenuItem(Menu $menu, int $id) { $menu.findItem($id); }").unwrap();
        let launch = Template::parse(
            "void launch(Context context, Class activityClass) { context.startActivity(new Intent(context, activityClass)); }",
        )
        .unwrap();
        MultiMatch::new(outer, BindingMode::Lenient)
            .named("menuLaunch")
            .with_sub_macro("$menuItem", item)
            .with_sub_macro("$f", launch)
    }

    #[test]
    fn sub_macros_must_all_match() {
        let m = menu_macro();
        let hit = parse_expression(
            "menu.findItem(R.id.action).setOnMenuItemClickListener(startActivity(new Intent(this, B.class)))",
        )
        .unwrap();
        let b = m.match_node(hit.root_ref()).unwrap();
        assert_eq!(b.sub("$menuItem").unwrap().get("$id").unwrap().print(), "R.id.action");
        assert_eq!(b.sub("$f").unwrap().get("activityClass").unwrap().print(), "B.class");

        let miss = parse_expression("item.setOnMenuItemClickListener(startActivity(i))").unwrap();
        assert!(m.match_node(miss.root_ref()).is_none());
    }

    #[test]
    fn failed_outer_match_fails_everything() {
        let m = menu_macro();
        let tree = parse_expression("menu.clear()").unwrap();
        assert!(m.match_node(tree.root_ref()).is_none());
    }

    #[test]
    fn textual_instantiation_nests_sub_macros() {
        let m = menu_macro();
        let b = TextBindings::new()
            .with_sub(
                "$menuItem",
                TextBindings::new()
                    .with("$menu", "menu".into())
                    .with("$id", "R.id.action".into()),
            )
            .with_sub(
                "$f",
                TextBindings::new()
                    .with("context", "Main.this".into())
                    .with("activityClass", "Second.class".into()),
            );
        assert_eq!(
            m.instantiate_text(&b).unwrap(),
            "menu.findItem(R.id.action).setOnMenuItemClickListener(Main.this.startActivity(new Intent(Main.this, Second.class)))"
        );
    }

    #[test]
    fn missing_slot_bindings_are_reported() {
        let err = menu_macro().instantiate_text(&TextBindings::new()).unwrap_err();
        assert!(err.to_string().contains("$menuItem"));
    }
}
