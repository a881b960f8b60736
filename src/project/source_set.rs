//! In-memory project: parsed sources, a class index, layouts and a manifest.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use super::{ClassRef, Manifest, ProjectHost, ProjectIndex, SourceEdit, ViewElement};
use crate::{
    ast::{NodeId, NodeKind, NodeRef, SyntaxTree},
    nav_err, syntax, NavError,
};

/// One parsed source file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    path: String,
    tree: SyntaxTree,
    package: Option<String>,
    imports: Vec<String>,
}

impl SourceFile {
    pub fn parse(path: impl Into<String>, text: &str) -> Result<Self, NavError> {
        let path = path.into();
        let tree = syntax::parse_compilation_unit(text, &path)?;
        Ok(Self::from_tree(path, tree))
    }

    fn from_tree(path: String, tree: SyntaxTree) -> Self {
        let root = tree.root_ref();
        let package = root
            .find_child(NodeKind::Package)
            .and_then(|p| p.text())
            .map(str::to_string);
        let imports = root
            .children()
            .filter(|c| c.kind() == NodeKind::Import)
            .filter_map(|c| c.text())
            .map(str::to_string)
            .collect();
        SourceFile {
            path,
            tree,
            package,
            imports,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    pub fn imports(&self) -> &[String] {
        &self.imports
    }

    /// Member classes, top-level first, paired with their dotted name
    /// relative to the package (`Outer.Inner`).
    fn declared_classes(&self) -> Vec<(String, NodeId)> {
        let mut out = Vec::new();
        let mut stack: Vec<(NodeRef<'_>, String)> = self
            .tree
            .root_ref()
            .children()
            .rev()
            .filter(|c| c.kind() == NodeKind::Class)
            .map(|c| (c, c.name().unwrap_or_default().to_string()))
            .collect();
        while let Some((class, name)) = stack.pop() {
            for inner in class
                .children()
                .rev()
                .filter(|c| c.kind() == NodeKind::Class)
            {
                let inner_name = format!("{name}.{}", inner.name().unwrap_or_default());
                stack.push((inner, inner_name));
            }
            out.push((name, class.id()));
        }
        out
    }

    fn qualify(&self, relative: &str) -> String {
        match &self.package {
            Some(package) => format!("{package}.{relative}"),
            None => relative.to_string(),
        }
    }
}

/// The in-memory [`ProjectHost`].
#[derive(Debug, Clone, Default)]
pub struct SourceSet {
    manifest: Manifest,
    files: Vec<SourceFile>,
    /// Qualified class name -> (file index, class node).
    classes: BTreeMap<String, (usize, NodeId)>,
    layouts: BTreeMap<String, ViewElement>,
    window_action_bar: bool,
    edited: BTreeSet<String>,
}

// ============================================================================
// PUBLIC API
// ============================================================================

impl SourceSet {
    pub fn new(manifest: Manifest) -> Self {
        SourceSet {
            manifest,
            window_action_bar: true,
            ..Default::default()
        }
    }

    /// Parses and indexes a source file. Re-adding a path replaces it.
    pub fn add_source(&mut self, path: impl Into<String>, text: &str) -> Result<(), NavError> {
        let file = SourceFile::parse(path, text)?;
        self.insert_file(file);
        Ok(())
    }

    pub fn with_source(mut self, path: impl Into<String>, text: &str) -> Result<Self, NavError> {
        self.add_source(path, text)?;
        Ok(self)
    }

    pub fn add_layout(&mut self, name: impl Into<String>, root: ViewElement) {
        self.layouts.insert(name.into(), root);
    }

    pub fn with_layout(mut self, name: impl Into<String>, root: ViewElement) -> Self {
        self.add_layout(name, root);
        self
    }

    pub fn set_window_action_bar(&mut self, enabled: bool) {
        self.window_action_bar = enabled;
    }

    pub fn files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.iter()
    }

    pub fn file(&self, path: &str) -> Option<&SourceFile> {
        self.files.iter().find(|f| f.path == path)
    }

    /// Qualified names of every indexed class.
    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    /// Paths changed through [`ProjectHost::commit`].
    pub fn edited_files(&self) -> impl Iterator<Item = &str> {
        self.edited.iter().map(String::as_str)
    }
}

// ============================================================================
// INDEXING
// ============================================================================

impl SourceSet {
    fn insert_file(&mut self, file: SourceFile) {
        let index = match self.files.iter().position(|f| f.path == file.path) {
            Some(index) => {
                self.files[index] = file;
                index
            }
            None => {
                self.files.push(file);
                self.files.len() - 1
            }
        };
        self.classes.retain(|_, (i, _)| *i != index);
        let file = &self.files[index];
        for (relative, id) in file.declared_classes() {
            let qualified = file.qualify(&relative);
            debug!(class = %qualified, path = file.path(), "indexed class");
            self.classes.insert(qualified, (index, id));
        }
    }

    fn class_ref(&self, qualified: &str) -> Option<ClassRef<'_>> {
        let (name, (index, id)) = self.classes.get_key_value(qualified)?;
        Some(ClassRef::new(&self.files[*index], *id, name))
    }

    /// Resolution order: qualified name, inner class of an enclosing class,
    /// class of the same file, explicit import, same package, wildcard
    /// import, then an explicit import pointing outside the project.
    fn resolve(&self, context: ClassRef<'_>, name: &str) -> Option<String> {
        if self.classes.contains_key(name) {
            return Some(name.to_string());
        }
        let (head, rest) = match name.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (name, None),
        };
        let extend = |base: String| match rest {
            Some(rest) => format!("{base}.{rest}"),
            None => base,
        };

        let file = context.file();
        let top_level = file.package().map_or(0, |p| p.len() + 1);
        let mut enclosing = Some(context.qualified_name());
        while let Some(outer) = enclosing.filter(|o| o.len() > top_level) {
            let candidate = extend(format!("{outer}.{head}"));
            if self.classes.contains_key(&candidate) {
                return Some(candidate);
            }
            enclosing = outer.rsplit_once('.').map(|(parent, _)| parent);
        }

        let same_file = extend(file.qualify(head));
        if self.classes.contains_key(&same_file) {
            return Some(same_file);
        }

        let explicit = file
            .imports()
            .iter()
            .find(|i| !i.ends_with(".*") && i.rsplit('.').next() == Some(head));
        if let Some(import) = explicit {
            let candidate = extend(import.clone());
            if self.classes.contains_key(&candidate) {
                return Some(candidate);
            }
        }

        if let Some(package) = file.package() {
            let candidate = extend(format!("{package}.{head}"));
            if self.classes.contains_key(&candidate) {
                return Some(candidate);
            }
        }

        for import in file.imports().iter().filter(|i| i.ends_with(".*")) {
            let candidate = extend(format!("{}.{head}", import.trim_end_matches(".*")));
            if self.classes.contains_key(&candidate) {
                return Some(candidate);
            }
        }

        explicit.map(|import| extend(import.clone()))
    }
}

impl ProjectIndex for SourceSet {
    fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    fn find_class(&self, qualified_name: &str) -> Option<ClassRef<'_>> {
        self.class_ref(qualified_name)
    }

    fn resolve_class_name(&self, context: ClassRef<'_>, name: &str) -> Option<String> {
        self.resolve(context, name)
    }

    fn layout(&self, name: &str) -> Option<&ViewElement> {
        self.layouts.get(name)
    }

    fn window_action_bar(&self) -> bool {
        self.window_action_bar
    }
}

impl ProjectHost for SourceSet {
    fn commit(&mut self, edit: SourceEdit) -> Result<(), NavError> {
        if !self.files.iter().any(|f| f.path == edit.path) {
            return Err(nav_err!(Project, "cannot edit unknown file '{}'", edit.path));
        }
        if edit.tree.root_ref().kind() != NodeKind::CompilationUnit {
            return Err(nav_err!(
                Project,
                "edit '{}' does not replace a whole file",
                edit.label
            ));
        }
        info!(path = %edit.path, label = %edit.label, "committed source edit");
        self.edited.insert(edit.path.clone());
        self.insert_file(SourceFile::from_tree(edit.path, edit.tree));
        Ok(())
    }

    fn file_text(&self, path: &str) -> Option<String> {
        self.file(path)
            .map(|f| syntax::print_source(f.tree().root_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAIN: &str = r#"
        package com.example;

        import android.app.Activity;
        import com.example.util.*;

        public class Main extends Activity {
            static class Holder {}
            void go() {}
        }
    "#;

    const HELPER: &str = r#"
        package com.example.util;

        public class Helper {}
    "#;

    const SECOND: &str = r#"
        package com.example;

        public class Second extends Main {}
    "#;

    fn project() -> SourceSet {
        SourceSet::new(Manifest::new("com.example"))
            .with_source("src/Main.java", MAIN)
            .and_then(|s| s.with_source("src/util/Helper.java", HELPER))
            .and_then(|s| s.with_source("src/Second.java", SECOND))
            .unwrap()
    }

    #[test]
    fn indexes_nested_classes() {
        let project = project();
        let names: Vec<_> = project.class_names().collect();
        assert_eq!(
            names,
            vec![
                "com.example.Main",
                "com.example.Main.Holder",
                "com.example.Second",
                "com.example.util.Helper"
            ]
        );
    }

    #[test]
    fn resolves_in_documented_order() {
        let project = project();
        let main = project.find_class("com.example.Main").unwrap();
        assert_eq!(
            project.resolve_class_name(main, "Holder").as_deref(),
            Some("com.example.Main.Holder")
        );
        assert_eq!(
            project.resolve_class_name(main, "Second").as_deref(),
            Some("com.example.Second")
        );
        assert_eq!(
            project.resolve_class_name(main, "Helper").as_deref(),
            Some("com.example.util.Helper")
        );
        assert_eq!(
            project.resolve_class_name(main, "Activity").as_deref(),
            Some("android.app.Activity")
        );
        assert_eq!(project.resolve_class_name(main, "Missing"), None);
    }

    #[test]
    fn superclass_chain_stops_outside_the_project() {
        let project = project();
        let second = project.find_class("com.example.Second").unwrap();
        let chain: Vec<_> = project
            .superclass_chain(second)
            .into_iter()
            .map(|c| c.qualified_name().to_string())
            .collect();
        assert_eq!(chain, vec!["com.example.Second", "com.example.Main"]);
        assert!(project.inherits_from(second, "Activity"));
        assert!(!project.inherits_from(second, "ListActivity"));
    }

    #[test]
    fn commit_replaces_and_reindexes() {
        let mut project = project();
        let tree = syntax::parse_compilation_unit(
            "package com.example; public class Second extends Main { void added() {} }",
            "src/Second.java",
        )
        .unwrap();
        project
            .commit(SourceEdit {
                label: "add method".into(),
                path: "src/Second.java".into(),
                tree,
            })
            .unwrap();
        let second = project.find_class("com.example.Second").unwrap();
        assert!(second.find_method_by_name("added", 0).is_some());
        assert_eq!(project.edited_files().collect::<Vec<_>>(), vec!["src/Second.java"]);
    }

    #[test]
    fn commit_rejects_unknown_files() {
        let mut project = project();
        let tree = syntax::parse_compilation_unit("class X {}", "X.java").unwrap();
        let err = project
            .commit(SourceEdit {
                label: "new".into(),
                path: "src/X.java".into(),
                tree,
            })
            .unwrap_err();
        assert!(matches!(err, NavError::Project { .. }));
    }
}
