//! Macro templates compiled from snippet methods.
//!
//! A snippet is a method declaration whose parameter list names the pattern
//! variables and whose body holds exactly one statement:
//!
//! ```text
//! void createIntent(Context context, Class activityClass) {
//!     new Intent(context, activityClass);
//! }
//! ```
//!
//! The pattern tree is that statement's expression (or the statement itself
//! when it is not an expression statement). Names starting with `$` are
//! pattern variables whether or not they are declared.

use std::collections::HashSet;

use crate::{
    ast::{NodeId, NodeKind, NodeRef, SyntaxTree},
    syntax, NavError,
};

/// An immutable pattern: ordered parameter names plus a pattern tree.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    parameters: Vec<String>,
    tree: SyntaxTree,
    body: NodeId,
}

impl Template {
    /// Compiles a parsed snippet method. The method is copied, so the source
    /// tree may be dropped afterwards.
    pub fn from_snippet(method: NodeRef<'_>) -> Result<Self, NavError> {
        let name = method.name().unwrap_or("<anonymous>").to_string();
        if method.kind() != NodeKind::Method {
            return Err(NavError::template(
                name,
                format!("expected a method declaration, found {:?}", method.kind()),
            ));
        }

        let tree = SyntaxTree::subtree(method);
        let root = tree.root_ref();

        let mut parameters = Vec::new();
        let mut seen = HashSet::new();
        if let Some(list) = root.find_child(NodeKind::ParameterList) {
            for parameter in list.children() {
                let Some(param) = parameter.name() else {
                    continue;
                };
                if !seen.insert(param) {
                    return Err(NavError::template(
                        &name,
                        format!("duplicate parameter name '{param}'"),
                    ));
                }
                parameters.push(param.to_string());
            }
        }

        let Some(block) = root.find_child(NodeKind::CodeBlock) else {
            return Err(NavError::template(&name, "snippet has no body"));
        };
        if block.child_count() != 1 {
            return Err(NavError::template(
                &name,
                format!(
                    "snippet body must hold exactly one statement, found {}",
                    block.child_count()
                ),
            ));
        }
        let Some(statement) = block.first_child() else {
            return Err(NavError::template(&name, "snippet has an empty body"));
        };
        let body = match statement.kind() {
            NodeKind::ExpressionStatement => statement.first_child().unwrap_or(statement),
            _ => statement,
        };

        for param in &parameters {
            let occurs = body
                .descendants()
                .any(|n| n.kind() == NodeKind::Identifier && n.text() == Some(param.as_str()));
            if !occurs {
                return Err(NavError::template(
                    &name,
                    format!("parameter '{param}' does not occur in the body"),
                ));
            }
        }

        let body = body.id();
        Ok(Template {
            name,
            parameters,
            tree,
            body,
        })
    }

    /// Parses and compiles a single snippet method.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use navmacro::macros::Template;
    /// let t = Template::parse("void m(Object $v) { $v.setVisibility(0); }").unwrap();
    /// assert_eq!(t.parameters(), ["$v"]);
    /// assert_eq!(t.text(), "$v.setVisibility(0)");
    /// ```
    pub fn parse(text: &str) -> Result<Self, NavError> {
        let tree = syntax::parse_method(text)?;
        Self::from_snippet(tree.root_ref())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn is_parameter(&self, name: &str) -> bool {
        self.parameters.iter().any(|p| p == name)
    }

    /// True when `name` acts as a pattern variable in this template.
    pub fn is_variable(&self, name: &str) -> bool {
        name != "$" && (name.starts_with('$') || self.is_parameter(name))
    }

    /// Root of the pattern tree.
    pub fn body(&self) -> NodeRef<'_> {
        self.tree.node(self.body)
    }

    /// The whole snippet method the template was compiled from.
    pub fn method(&self) -> NodeRef<'_> {
        self.tree.root_ref()
    }

    /// Printed pattern tree, used for textual instantiation.
    pub fn text(&self) -> String {
        self.body().print()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expression_statement_bodies_unwrap_to_expression() {
        let t = Template::parse("void createIntent(Context context, Class activityClass) { new Intent(context, activityClass); }").unwrap();
        assert_eq!(t.name(), "createIntent");
        assert_eq!(t.parameters(), ["context", "activityClass"]);
        assert_eq!(t.body().kind(), NodeKind::New);
    }

    #[test]
    fn statement_bodies_keep_the_statement() {
        let t = Template::parse("void define(Class $Type) { class $Type implements Runnable { public void run() {} } }")
            .unwrap();
        assert_eq!(t.body().kind(), NodeKind::Class);
    }

    #[test]
    fn rejects_empty_and_multi_statement_bodies() {
        let empty = Template::parse("void m() {}").unwrap_err();
        assert!(empty.to_string().contains("exactly one statement, found 0"));
        let two = Template::parse("void m(Object a) { a(); a(); }").unwrap_err();
        assert!(two.to_string().contains("found 2"));
    }

    #[test]
    fn rejects_duplicate_and_unused_parameters() {
        let dup = Template::parse("void m(Object a, Object a) { a(); }").unwrap_err();
        assert!(dup.to_string().contains("duplicate parameter name 'a'"));
        let unused = Template::parse("void m(Object a, Object b) { a(); }").unwrap_err();
        assert!(unused.to_string().contains("'b' does not occur"));
    }

    #[test]
    fn parameters_missing_from_the_body_fail_construction() {
        let err = Template::parse("void launch(Context context, Class activityClass) { new Intent(context, Second.class); }")
            .unwrap_err();
        match err {
            NavError::Template { name, message } => {
                assert_eq!(name, "launch");
                assert_eq!(message, "parameter 'activityClass' does not occur in the body");
            }
            other => panic!("expected a template error, got {other:?}"),
        }
    }

    #[test]
    fn dollar_names_are_variables_without_declaration() {
        let t = Template::parse("void m(Object x) { x.inflate($id); }").unwrap();
        assert!(t.is_variable("$id"));
        assert!(t.is_variable("x"));
        assert!(!t.is_variable("inflate"));
        assert!(!t.is_variable("$"));
    }
}
