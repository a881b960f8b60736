//! # Project collaborator
//!
//! The analyser and the generator never touch files directly. They see a
//! project through two traits:
//!
//! - [`ProjectIndex`]: read-only access to the manifest, parsed classes,
//!   name resolution and layouts.
//! - [`ProjectHost`]: an index that also accepts whole-file edits.
//!
//! [`SourceSet`] is the in-memory implementation used by the CLI and the
//! tests; [`loader`] fills one from a project directory.

pub mod layout;
pub mod loader;
pub mod manifest;
pub mod source_set;

use std::collections::BTreeSet;

pub use layout::{FragmentDecl, ViewElement};
pub use loader::{load_project, read_descriptor, save_project, LoadedProject, ProjectDescriptor};
pub use manifest::{ActivityDecl, IntentFilter, Manifest};
pub use source_set::{SourceFile, SourceSet};

use crate::{
    ast::{NodeId, NodeKind, NodeRef, SyntaxTree},
    syntax, NavError,
};

// ============================================================================
// TRAITS
// ============================================================================

pub trait ProjectIndex {
    fn manifest(&self) -> &Manifest;

    /// Looks a class up by fully qualified name (`pkg.Outer.Inner` for
    /// nested classes).
    fn find_class(&self, qualified_name: &str) -> Option<ClassRef<'_>>;

    /// Resolves a simple or dotted type name as written inside `context`.
    fn resolve_class_name(&self, context: ClassRef<'_>, name: &str) -> Option<String>;

    fn layout(&self, name: &str) -> Option<&ViewElement>;

    /// Whether the application theme shows an action bar.
    fn window_action_bar(&self) -> bool {
        true
    }

    fn superclass<'a>(&'a self, class: ClassRef<'a>) -> Option<ClassRef<'a>> {
        let name = class.extends_name()?;
        let qualified = self.resolve_class_name(class, &name)?;
        self.find_class(&qualified)
    }

    /// `class` followed by its superclasses found in the project, stopping
    /// at the first class outside it or at a cycle.
    fn superclass_chain<'a>(&'a self, class: ClassRef<'a>) -> Vec<ClassRef<'a>> {
        let mut seen = BTreeSet::new();
        let mut chain = Vec::new();
        let mut current = Some(class);
        while let Some(class) = current {
            if !seen.insert(class.qualified_name().to_string()) {
                break;
            }
            chain.push(class);
            current = self.superclass(class);
        }
        chain
    }

    /// Whether `class` or one of its ancestors extends a type with the given
    /// simple name. Framework base classes are outside the project, so the
    /// last `extends` clause of the chain is what decides.
    fn inherits_from(&self, class: ClassRef<'_>, simple_name: &str) -> bool {
        self.superclass_chain(class).iter().any(|c| {
            c.extends_name()
                .is_some_and(|name| simple_type_name(&name) == simple_name)
        })
    }
}

/// A whole-file replacement.
#[derive(Debug, Clone)]
pub struct SourceEdit {
    /// Human-readable description, used in logs.
    pub label: String,
    pub path: String,
    pub tree: SyntaxTree,
}

pub trait ProjectHost: ProjectIndex {
    /// Replaces the tree of an existing file.
    fn commit(&mut self, edit: SourceEdit) -> Result<(), NavError>;

    /// Printed source of a file, reflecting committed edits.
    fn file_text(&self, path: &str) -> Option<String>;
}

// ============================================================================
// CLASS HANDLES
// ============================================================================

/// A class declaration inside a parsed source file.
#[derive(Clone, Copy)]
pub struct ClassRef<'a> {
    file: &'a SourceFile,
    id: NodeId,
    qualified_name: &'a str,
}

impl<'a> ClassRef<'a> {
    pub(crate) fn new(file: &'a SourceFile, id: NodeId, qualified_name: &'a str) -> Self {
        ClassRef {
            file,
            id,
            qualified_name,
        }
    }

    pub fn node(self) -> NodeRef<'a> {
        self.file.tree().node(self.id)
    }

    pub fn file(self) -> &'a SourceFile {
        self.file
    }

    pub fn name(self) -> &'a str {
        self.node().name().unwrap_or_default()
    }

    pub fn qualified_name(self) -> &'a str {
        self.qualified_name
    }

    /// The `extends` type as written, without type arguments.
    pub fn extends_name(self) -> Option<String> {
        let extends = self.node().find_child(NodeKind::Extends)?;
        let ty = extends.find_child(NodeKind::TypeElement)?;
        Some(type_name(ty))
    }

    pub fn methods(self) -> impl Iterator<Item = NodeRef<'a>> {
        self.node()
            .children()
            .filter(|c| c.kind() == NodeKind::Method)
    }

    pub fn fields(self) -> impl Iterator<Item = NodeRef<'a>> {
        self.node().children().filter(|c| c.kind() == NodeKind::Field)
    }

    pub fn find_method(self, signature: &MethodSignature) -> Option<NodeRef<'a>> {
        self.methods().find(|m| signature.matches(*m))
    }

    pub fn find_method_by_name(self, name: &str, arity: usize) -> Option<NodeRef<'a>> {
        self.methods().find(|m| {
            m.name() == Some(name)
                && m.find_child(NodeKind::ParameterList)
                    .is_some_and(|p| p.child_count() == arity)
        })
    }
}

impl PartialEq for ClassRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.qualified_name == other.qualified_name
    }
}

impl std::fmt::Debug for ClassRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ClassRef({})", self.qualified_name)
    }
}

// ============================================================================
// METHOD SIGNATURES
// ============================================================================

/// A method name plus simple parameter type names. Return types and
/// modifiers do not take part in matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub name: String,
    pub parameter_types: Vec<String>,
}

impl MethodSignature {
    /// Parses a header such as `void onCreate(Bundle b)`.
    pub fn parse(text: &str) -> Result<Self, NavError> {
        let tree = syntax::parse_signature(text)?;
        let method = tree.root_ref();
        let name = method.name().unwrap_or_default().to_string();
        Ok(MethodSignature {
            name,
            parameter_types: parameter_types(method),
        })
    }

    pub fn matches(&self, method: NodeRef<'_>) -> bool {
        method.kind() == NodeKind::Method
            && method.name() == Some(self.name.as_str())
            && parameter_types(method) == self.parameter_types
    }
}

impl std::fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.parameter_types.join(", "))
    }
}

fn parameter_types(method: NodeRef<'_>) -> Vec<String> {
    let Some(list) = method.find_child(NodeKind::ParameterList) else {
        return Vec::new();
    };
    list.children()
        .filter_map(|p| p.find_child(NodeKind::TypeElement))
        .map(|ty| simple_type_name(&type_name(ty)).to_string())
        .collect()
}

/// Dotted name of a type element, without type arguments or array dims.
pub fn type_name(ty: NodeRef<'_>) -> String {
    ty.children()
        .filter(|c| c.kind() == NodeKind::Identifier)
        .filter_map(|c| c.text())
        .collect::<Vec<_>>()
        .join(".")
}

/// `android.app.Activity` -> `Activity`.
pub fn simple_type_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_method;

    #[test]
    fn signatures_ignore_return_type_and_parameter_names() {
        let signature = MethodSignature::parse("void onCreate(Bundle b)").unwrap();
        let tree = parse_method(
            "protected boolean onCreate(android.os.Bundle savedInstanceState) { return true; }",
        )
        .unwrap();
        assert!(signature.matches(tree.root_ref()));
        assert_eq!(signature.to_string(), "onCreate(Bundle)");
    }

    #[test]
    fn signatures_compare_arity_and_types() {
        let signature = MethodSignature::parse("void onViewCreated(View v, Bundle b)").unwrap();
        let tree = parse_method("void onViewCreated(View v) {}").unwrap();
        assert!(!signature.matches(tree.root_ref()));
    }
}
