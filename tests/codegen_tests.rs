mod common;

use common::*;
use navmacro::{
    codegen::{CodeGenerator, SynthesisOutcome},
    model::{Locator, State, Transition},
    project::{load_project, save_project, ProjectHost},
    NavError,
};

fn inflate_foo() -> Transition {
    Transition::click(
        Locator::of(State::activity(qualified("Main"))),
        Locator::of(State::menu("foo", qualified("Main"))),
    )
}

#[test]
fn menu_inflation_is_inserted_once_per_call() {
    let session = session();
    let mut project = project(MENU_TO_SECOND, &["Second"]);

    let outcome = CodeGenerator::new(&session, &mut project)
        .unwrap()
        .implement_transition(&inflate_foo())
        .unwrap();
    assert!(matches!(outcome, SynthesisOutcome::Inserted { .. }));
    let text = project.file_text("src/Main.java").unwrap();
    assert_eq!(text.matches("R.menu.foo").count(), 1);
    assert_eq!(text.matches("R.menu.main").count(), 1);

    CodeGenerator::new(&session, &mut project)
        .unwrap()
        .implement_transition(&inflate_foo())
        .unwrap();
    let text = project.file_text("src/Main.java").unwrap();
    assert_eq!(text.matches("R.menu.foo").count(), 2);
}

#[test]
fn synthesized_menu_items_are_rediscovered() {
    let session = session();
    let mut project = project("", &["Second"]);

    let menu = State::menu("main", qualified("Main"));
    let to_menu = Transition::click(
        Locator::of(State::activity(qualified("Main"))),
        Locator::of(menu.clone()),
    );
    let item_launch = Transition::click(
        Locator::with_view(menu, "action"),
        Locator::of(State::activity(qualified("Second"))),
    );
    {
        let mut generator = CodeGenerator::new(&session, &mut project).unwrap();
        generator.implement_transition(&to_menu).unwrap();
        generator.implement_transition(&item_launch).unwrap();
    }

    let (model, _) = derive(&session, &project);
    assert!(model.contains_transition(&to_menu));
    assert!(model.contains_transition(&item_launch));
}

#[test]
fn targets_outside_the_package_are_qualified() {
    let session = session();
    let mut project = project("", &[]);
    project
        .add_source(
            "src/Settings.java",
            "package com.example.settings; public class Settings extends Activity {}",
        )
        .unwrap();
    let transition = Transition::click(
        Locator::with_view(State::menu("main", qualified("Main")), "settings"),
        Locator::of(State::activity("com.example.settings.Settings")),
    );
    let preview = CodeGenerator::new(&session, &mut project)
        .unwrap()
        .preview_transition(&transition)
        .unwrap()
        .unwrap();
    assert!(preview.contains("new Intent(Main.this, com.example.settings.Settings.class)"));
    assert!(preview.contains("menu.findItem(R.id.settings)"));
    assert_eq!(project.edited_files().count(), 0);
}

#[test]
fn target_packages_naming_macro_parameters_survive() {
    let session = session();
    let mut project = project("", &[]);
    project
        .add_source(
            "src/Settings.java",
            "package com.context.contextual; public class Settings extends Activity {}",
        )
        .unwrap();
    let transition = Transition::click(
        Locator::with_view(State::menu("main", qualified("Main")), "settings"),
        Locator::of(State::activity("com.context.contextual.Settings")),
    );
    let preview = CodeGenerator::new(&session, &mut project)
        .unwrap()
        .preview_transition(&transition)
        .unwrap()
        .unwrap();
    assert!(preview.contains("Main.this.startActivity(new Intent(Main.this, com.context.contextual.Settings.class))"));
    assert!(!preview.contains("com.Main.this"));
}

#[test]
fn unknown_owners_are_synthesis_errors() {
    let session = session();
    let mut project = project("", &[]);
    let transition = Transition::click(
        Locator::of(State::activity(qualified("Ghost"))),
        Locator::of(State::menu("foo", qualified("Ghost"))),
    );
    let err = CodeGenerator::new(&session, &mut project)
        .unwrap()
        .implement_transition(&transition)
        .unwrap_err();
    assert!(matches!(err, NavError::Synthesis { .. }));
}

#[test]
fn saved_edits_survive_a_reload() {
    let dir = tempfile::tempdir().unwrap();
    write_click_project(dir.path());
    let session = session();

    let mut loaded = load_project(dir.path()).unwrap();
    CodeGenerator::new(&session, &mut loaded.sources)
        .unwrap()
        .implement_transition(&inflate_foo())
        .unwrap();
    let written = save_project(&loaded).unwrap();
    assert_eq!(written, vec![dir.path().join("src/com/example/Main.java")]);

    let reloaded = load_project(dir.path()).unwrap();
    let (model, _) = derive(&session, &reloaded.sources);
    assert!(model.contains_transition(&inflate_foo()));
    assert!(model.contains_state(&State::activity(qualified("Second"))));
}
