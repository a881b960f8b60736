//! # Code synthesis
//!
//! [`CodeGenerator`] turns a navigation transition into source code in the
//! owning activity. Two transitions are supported:
//!
//! - menu item -> activity: a listener installed in `onPrepareOptionsMenu`,
//!   written through the menu-item composite macro so the analyser finds it
//!   again;
//! - activity -> menu: a menu inflation in `onCreateOptionsMenu`.
//!
//! The statement goes before the last statement of the method; a missing
//! method is created. Each call builds a fresh file tree and hands it to the
//! host in a single [`ProjectHost::commit`]. Calls are not idempotent.

use tracing::{debug, info};

use crate::{
    analysis::{ON_CREATE_OPTIONS_MENU, ON_PREPARE_OPTIONS_MENU},
    ast::{NodeKind, NodeRef},
    macros::TextBindings,
    model::{State, Transition},
    nav_err,
    project::{simple_type_name, ClassRef, MethodSignature, ProjectHost, SourceEdit},
    session::Session,
    syntax, NavError,
};

/// Parameter name used when the menu method has to be created.
const DEFAULT_MENU_PARAMETER: &str = "menu";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisOutcome {
    Inserted {
        /// Project path of the edited file.
        path: String,
        /// The inserted statement.
        statement: String,
    },
    /// The transition's state pair has no code idiom.
    Unsupported,
}

pub struct CodeGenerator<'a> {
    session: &'a Session,
    host: &'a mut dyn ProjectHost,
    on_create_options_menu: MethodSignature,
    on_prepare_options_menu: MethodSignature,
}

/// What a transition asks for, borrowed from the transition.
#[derive(Debug, Clone, Copy)]
enum Insertion<'t> {
    MenuItemLaunch {
        owner: &'t str,
        menu_item: &'t str,
        target: &'t str,
    },
    MenuInflation {
        owner: &'t str,
        menu: &'t str,
    },
}

impl<'t> Insertion<'t> {
    fn of(transition: &'t Transition) -> Result<Option<Self>, NavError> {
        match (&transition.source.state, &transition.destination.state) {
            (State::Menu(menu), State::Activity(target)) => {
                let Some(menu_item) = transition.source.view_name.as_deref() else {
                    return Err(nav_err!(
                        Synthesis,
                        "transition from menu '{}' does not name a menu item",
                        menu.name
                    ));
                };
                Ok(Some(Insertion::MenuItemLaunch {
                    owner: &menu.owner,
                    menu_item,
                    target: &target.class_name,
                }))
            }
            (State::Activity(activity), State::Menu(menu)) => Ok(Some(Insertion::MenuInflation {
                owner: &activity.class_name,
                menu: &menu.name,
            })),
            _ => Ok(None),
        }
    }

    fn owner(self) -> &'t str {
        match self {
            Insertion::MenuItemLaunch { owner, .. } | Insertion::MenuInflation { owner, .. } => owner,
        }
    }
}

struct PreparedEdit {
    edit: SourceEdit,
    statement: String,
}

// ============================================================================
// PUBLIC API
// ============================================================================

impl<'a> CodeGenerator<'a> {
    pub fn new(session: &'a Session, host: &'a mut dyn ProjectHost) -> Result<Self, NavError> {
        Ok(CodeGenerator {
            session,
            host,
            on_create_options_menu: MethodSignature::parse(ON_CREATE_OPTIONS_MENU)?,
            on_prepare_options_menu: MethodSignature::parse(ON_PREPARE_OPTIONS_MENU)?,
        })
    }

    /// Writes the code for `transition` into the owning activity.
    pub fn implement_transition(&mut self, transition: &Transition) -> Result<SynthesisOutcome, NavError> {
        let Some(prepared) = self.prepare(transition)? else {
            debug!(
                from = transition.source.state.identifier(),
                to = transition.destination.state.identifier(),
                "no code idiom for this transition"
            );
            return Ok(SynthesisOutcome::Unsupported);
        };
        let PreparedEdit { edit, statement } = prepared;
        let path = edit.path.clone();
        self.host.commit(edit)?;
        info!(path = %path, statement = %statement, "transition implemented");
        Ok(SynthesisOutcome::Inserted { path, statement })
    }

    /// The statement [`implement_transition`](Self::implement_transition)
    /// would insert, without touching the project.
    pub fn preview_transition(&self, transition: &Transition) -> Result<Option<String>, NavError> {
        Ok(self.prepare(transition)?.map(|p| p.statement))
    }
}

// ============================================================================
// INTERNAL HELPERS
// ============================================================================

impl CodeGenerator<'_> {
    fn prepare(&self, transition: &Transition) -> Result<Option<PreparedEdit>, NavError> {
        let Some(insertion) = Insertion::of(transition)? else {
            return Ok(None);
        };
        let host: &dyn ProjectHost = &*self.host;
        let owner_name = insertion.owner();
        let Some(owner) = host.find_class(owner_name) else {
            return Err(nav_err!(Synthesis, "class '{}' not found", owner_name));
        };

        let (signature, header) = match insertion {
            Insertion::MenuItemLaunch { .. } => (&self.on_prepare_options_menu, ON_PREPARE_OPTIONS_MENU),
            Insertion::MenuInflation { .. } => (&self.on_create_options_menu, ON_CREATE_OPTIONS_MENU),
        };
        let method = owner.find_method(signature);
        let menu_parameter = method
            .and_then(first_parameter_name)
            .unwrap_or(DEFAULT_MENU_PARAMETER);

        let expression = match insertion {
            Insertion::MenuItemLaunch {
                menu_item, target, ..
            } => self.menu_item_launch(host, owner, menu_parameter, menu_item, target)?,
            Insertion::MenuInflation { menu, .. } => {
                format!("getMenuInflater().inflate(R.menu.{menu}, {menu_parameter})")
            }
        };
        let statement = format!("{expression};");

        let file = owner.file();
        let tree = match method {
            Some(method) => {
                let Some(body) = method.find_child(NodeKind::CodeBlock) else {
                    return Err(nav_err!(
                        Synthesis,
                        "'{}' in '{}' has no body",
                        signature,
                        owner_name
                    ));
                };
                let parsed = syntax::parse_statement(&statement)?;
                let index = body.child_count().saturating_sub(1);
                file.tree().splice_child(body.id(), index, parsed.root_ref())
            }
            None => {
                let text = format!("@Override\npublic {header} {{\n{statement}\nreturn true;\n}}");
                let parsed = syntax::parse_method(&text)?;
                let class = owner.node();
                file.tree()
                    .splice_child(class.id(), class.child_count(), parsed.root_ref())
            }
        };

        Ok(Some(PreparedEdit {
            edit: SourceEdit {
                label: format!("{} in {}", signature, owner_name),
                path: file.path().to_string(),
                tree,
            },
            statement,
        }))
    }

    /// Instantiates the menu-item composite: `$menuItem` as a `findItem`
    /// lookup, `$f` as the activity launch.
    fn menu_item_launch(
        &self,
        host: &dyn ProjectHost,
        owner: ClassRef<'_>,
        menu_parameter: &str,
        menu_item: &str,
        target: &str,
    ) -> Result<String, NavError> {
        let item = TextBindings::new()
            .with("$menu", menu_parameter.to_string())
            .with("$id", format!("R.id.{menu_item}"));
        let launch = TextBindings::new()
            .with("context", format!("{}.this", owner.name()))
            .with("activityClass", format!("{}.class", class_reference(host, owner, target)));
        let bindings = TextBindings::new()
            .with("$consume", "true".to_string())
            .with_sub("$menuItem", item)
            .with_sub("$f", launch);
        self.session.macros().menu_item_launch.instantiate_text(&bindings)
    }
}

/// The simple name when it resolves back to `target` from `owner`,
/// otherwise the qualified name.
fn class_reference(host: &dyn ProjectHost, owner: ClassRef<'_>, target: &str) -> String {
    let simple = simple_type_name(target);
    match host.resolve_class_name(owner, simple) {
        Some(resolved) if resolved == target => simple.to_string(),
        _ => target.to_string(),
    }
}

fn first_parameter_name(method: NodeRef<'_>) -> Option<&str> {
    method.find_child(NodeKind::ParameterList)?.first_child()?.name()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::EngineConfig,
        model::Locator,
        project::{Manifest, ProjectIndex, SourceSet},
    };

    const MAIN: &str = r#"
        package com.example;

        public class Main extends Activity {
            @Override
            public boolean onCreateOptionsMenu(Menu m) {
                return true;
            }
        }
    "#;

    fn project() -> SourceSet {
        SourceSet::new(Manifest::new("com.example"))
            .with_source("src/Main.java", MAIN)
            .and_then(|s| s.with_source("src/Second.java", "package com.example; class Second {}"))
            .unwrap()
    }

    fn inflation(menu: &str) -> Transition {
        Transition::click(
            Locator::of(State::activity("com.example.Main")),
            Locator::of(State::menu(menu, "com.example.Main")),
        )
    }

    fn count(project: &SourceSet, needle: &str) -> usize {
        project
            .file_text("src/Main.java")
            .unwrap()
            .matches(needle)
            .count()
    }

    #[test]
    fn menu_inflation_uses_the_existing_parameter() {
        let session = Session::new(EngineConfig::default()).unwrap();
        let mut project = project();
        let mut generator = CodeGenerator::new(&session, &mut project).unwrap();
        let outcome = generator.implement_transition(&inflation("foo")).unwrap();
        assert_eq!(
            outcome,
            SynthesisOutcome::Inserted {
                path: "src/Main.java".into(),
                statement: "getMenuInflater().inflate(R.menu.foo, m);".into(),
            }
        );
        let text = project.file_text("src/Main.java").unwrap();
        let inflate = text.find("R.menu.foo").unwrap();
        let ret = text.find("return true").unwrap();
        assert!(inflate < ret);
    }

    #[test]
    fn repeated_calls_duplicate() {
        let session = Session::new(EngineConfig::default()).unwrap();
        let mut project = project();
        {
            let mut generator = CodeGenerator::new(&session, &mut project).unwrap();
            generator.implement_transition(&inflation("foo")).unwrap();
            generator.implement_transition(&inflation("foo")).unwrap();
        }
        assert_eq!(count(&project, "R.menu.foo"), 2);
    }

    #[test]
    fn menu_item_launch_creates_the_method() {
        let session = Session::new(EngineConfig::default()).unwrap();
        let mut project = project();
        let transition = Transition::click(
            Locator::with_view(State::menu("main", "com.example.Main"), "action"),
            Locator::of(State::activity("com.example.Second")),
        );
        let outcome = CodeGenerator::new(&session, &mut project)
            .unwrap()
            .implement_transition(&transition)
            .unwrap();
        assert!(matches!(outcome, SynthesisOutcome::Inserted { .. }));
        let main = project.find_class("com.example.Main").unwrap();
        let prepare = MethodSignature::parse(ON_PREPARE_OPTIONS_MENU).unwrap();
        assert!(main.find_method(&prepare).is_some());
        assert_eq!(count(&project, "menu.findItem(R.id.action)"), 1);
        assert_eq!(count(&project, "new Intent(Main.this, Second.class)"), 1);
    }

    #[test]
    fn menu_items_need_a_view_name() {
        let session = Session::new(EngineConfig::default()).unwrap();
        let mut project = project();
        let transition = Transition::click(
            Locator::of(State::menu("main", "com.example.Main")),
            Locator::of(State::activity("com.example.Second")),
        );
        let err = CodeGenerator::new(&session, &mut project)
            .unwrap()
            .implement_transition(&transition)
            .unwrap_err();
        assert!(matches!(err, NavError::Synthesis { .. }));
    }

    #[test]
    fn other_pairs_are_unsupported_and_previews_do_not_edit() {
        let session = Session::new(EngineConfig::default()).unwrap();
        let mut project = project();
        let activity_to_activity = Transition::click(
            Locator::with_view(State::activity("com.example.Main"), "go"),
            Locator::of(State::activity("com.example.Second")),
        );
        let mut generator = CodeGenerator::new(&session, &mut project).unwrap();
        assert_eq!(
            generator.implement_transition(&activity_to_activity).unwrap(),
            SynthesisOutcome::Unsupported
        );
        let preview = generator.preview_transition(&inflation("bar")).unwrap();
        assert_eq!(preview.as_deref(), Some("getMenuInflater().inflate(R.menu.bar, m);"));
        drop(generator);
        assert_eq!(project.edited_files().count(), 0);
    }
}
