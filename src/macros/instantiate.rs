//! Template instantiation: node splicing and textual substitution.

use super::{
    bindings::{NodeBindings, TextBindings},
    template::Template,
    unifier::{any_call_variable, pattern_variable},
};
use crate::{ast::SyntaxTree, nav_err, NavError};

/// Marker left behind by `q.$()` once `q` is replaced by a whole call.
const ANY_CALL_MARKER: &str = ".$()";

/// Deep-copies the template body into a fresh tree, splicing a copy of the
/// bound subtree wherever a variable occurs. `q.$()` is replaced as a whole
/// by the call bound to `q`.
pub fn instantiate(template: &Template, bindings: &NodeBindings<'_>) -> Result<SyntaxTree, NavError> {
    require_all(template, |name| bindings.contains(name))?;

    let mut tree = SyntaxTree::detached();
    let root = tree.graft_with(template.body(), &mut |node| {
        let variable =
            any_call_variable(template, node).or_else(|| pattern_variable(template, node))?;
        bindings.get(variable).copied()
    });
    tree.set_root(root);
    Ok(tree)
}

/// Prints the template body, drops the `.$()` markers, then substitutes the
/// bound text for each variable in a single left-to-right scan.
///
/// Only whole identifiers are replaced, longest name first where names
/// share a prefix. Substituted text is never scanned again, so a value that
/// happens to contain a variable name comes through unchanged.
///
/// # Examples
///
/// ```rust
/// use navmacro::macros::{instantiate_text, Template, TextBindings};
/// let t = Template::parse("void m(Object $menu, Object $id) { $menu.findItem($id); }").unwrap();
/// let b = TextBindings::new()
///     .with("$menu", "menu".to_string())
///     .with("$id", "R.id.action".to_string());
/// assert_eq!(instantiate_text(&t, &b).unwrap(), "menu.findItem(R.id.action)");
/// ```
pub fn instantiate_text(template: &Template, bindings: &TextBindings) -> Result<String, NavError> {
    require_all(template, |name| bindings.contains(name))?;

    let mut keys: Vec<(&str, &str)> = bindings
        .vars()
        .filter(|(k, _)| !k.is_empty())
        .map(|(k, v)| (k, v.as_str()))
        .collect();
    keys.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(b.0)));

    let text = template.text().replace(ANY_CALL_MARKER, "");
    Ok(substitute_identifiers(&text, &keys))
}

fn substitute_identifiers(text: &str, keys: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut previous: Option<char> = None;
    while let Some(c) = rest.chars().next() {
        if !previous.is_some_and(is_identifier_char) {
            let hit = keys.iter().find(|(key, _)| {
                rest.starts_with(key) && !rest[key.len()..].chars().next().is_some_and(is_identifier_char)
            });
            if let Some((key, value)) = hit {
                out.push_str(value);
                previous = key.chars().last();
                rest = &rest[key.len()..];
                continue;
            }
        }
        out.push(c);
        previous = Some(c);
        rest = &rest[c.len_utf8()..];
    }
    out
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn require_all(template: &Template, bound: impl Fn(&str) -> bool) -> Result<(), NavError> {
    let missing: Vec<&str> = template
        .parameters()
        .iter()
        .map(String::as_str)
        .filter(|p| !bound(p))
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    Err(nav_err!(
        Instantiation,
        "macro '{}' is missing bindings for: {}",
        template.name(),
        missing.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{macros::Unifier, syntax::parse_expression};

    #[test]
    fn instantiate_of_unify_reproduces_the_candidate() {
        let t = Template::parse(
            "void launch(Context context, Class activityClass) { context.startActivity(new Intent(context, activityClass)); }",
        )
        .unwrap();
        let candidate = parse_expression("Main.this.startActivity(new Intent(Main.this, Second.class))").unwrap();
        let bindings = Unifier::default().unify(&t, candidate.root_ref()).unwrap();
        let tree = instantiate(&t, &bindings).unwrap();
        assert!(tree.root_ref().same_structure(candidate.root_ref()));
    }

    #[test]
    fn any_call_is_replaced_whole() {
        let t = Template::parse("void m(Object $v, Void $f) { $v.post($f.$()); }").unwrap();
        let view = parse_expression("button").unwrap();
        let call = parse_expression("finish()").unwrap();
        let bindings = NodeBindings::new()
            .with("$v", view.root_ref())
            .with("$f", call.root_ref());
        let tree = instantiate(&t, &bindings).unwrap();
        assert_eq!(tree.root_ref().print(), "button.post(finish())");
    }

    #[test]
    fn missing_bindings_are_an_error() {
        let t = Template::parse("void m(Object $a, Object $b) { f($a, $b); }").unwrap();
        let err = instantiate_text(&t, &TextBindings::new().with("$a", "1".into())).unwrap_err();
        assert!(matches!(err, NavError::Instantiation { .. }));
        assert!(err.to_string().contains("$b"));
    }

    #[test]
    fn longest_keys_are_replaced_first() {
        let t = Template::parse("void m(Object $menu, Object $menuItem) { $menuItem.set($menu); }").unwrap();
        let b = TextBindings::new()
            .with("$menu", "m".into())
            .with("$menuItem", "item".into());
        assert_eq!(instantiate_text(&t, &b).unwrap(), "item.set(m)");
    }

    #[test]
    fn any_call_markers_are_removed() {
        let t = Template::parse("void m(Void $f) { $f.$(); }").unwrap();
        let b = TextBindings::new().with("$f", "startActivity(i)".into());
        assert_eq!(instantiate_text(&t, &b).unwrap(), "startActivity(i)");
    }

    #[test]
    fn substituted_text_is_not_rescanned() {
        let t = Template::parse("void m(Object $a) { f($a); }").unwrap();
        let b = TextBindings::new().with("$a", "$a.next".into());
        assert_eq!(instantiate_text(&t, &b).unwrap(), "f($a.next)");
    }

    #[test]
    fn only_whole_identifiers_are_replaced() {
        let t = Template::parse(
            "void launch(Context context, Class activityClass) { context.startActivity(new Intent(context, activityClass)); }",
        )
        .unwrap();
        let b = TextBindings::new()
            .with("context", "Main.this".into())
            .with("activityClass", "com.context.contextual.Settings.class".into());
        assert_eq!(
            instantiate_text(&t, &b).unwrap(),
            "Main.this.startActivity(new Intent(Main.this, com.context.contextual.Settings.class))"
        );

        let t = Template::parse("void m(Object id) { find(id, idle, hidden); }").unwrap();
        let b = TextBindings::new().with("id", "7".into());
        assert_eq!(instantiate_text(&t, &b).unwrap(), "find(7, idle, hidden)");
    }
}
