//! Shared fixtures: small projects built in memory or written to a temp dir.

#![allow(dead_code)]

use std::{fs, path::Path};

use navmacro::{
    analysis::{Analyser, DiscoveryReport},
    config::EngineConfig,
    model::NavigationModel,
    project::{ActivityDecl, Manifest, SourceSet, ViewElement},
    session::Session,
};

pub const PACKAGE: &str = "com.example";

pub fn session() -> Session {
    Session::new(EngineConfig::default()).unwrap()
}

/// `com.example.<name>`.
pub fn qualified(name: &str) -> String {
    format!("{PACKAGE}.{name}")
}

/// A class in `com.example` with the given members.
pub fn class_source(name: &str, extends: &str, members: &str) -> String {
    format!(
        r#"package com.example;

import android.app.Activity;

public class {name} extends {extends} {{
{members}
}}
"#
    )
}

/// Manifest with `Main` as the launcher and the other names declared.
pub fn manifest(others: &[&str]) -> Manifest {
    others.iter().fold(
        Manifest::new(PACKAGE).with_activity(ActivityDecl::launcher(".Main")),
        |m, name| m.with_activity(ActivityDecl::new(format!(".{name}"))),
    )
}

/// `Main` with `main_members`, plus plain activities for each of `others`.
pub fn project(main_members: &str, others: &[&str]) -> SourceSet {
    let mut sources = SourceSet::new(manifest(others));
    sources
        .add_source("src/Main.java", &class_source("Main", "Activity", main_members))
        .unwrap();
    for name in others {
        sources
            .add_source(format!("src/{name}.java"), &class_source(name, "Activity", ""))
            .unwrap();
    }
    sources
}

pub fn button_layout(id: &str) -> ViewElement {
    ViewElement::new("LinearLayout")
        .with_child(ViewElement::new("Button").with_attribute("android:id", format!("@+id/{id}")))
}

pub fn derive(session: &Session, project: &SourceSet) -> (NavigationModel, DiscoveryReport) {
    let mut model = NavigationModel::new();
    let report = Analyser::new(session, project)
        .unwrap()
        .derive_all_states_and_transitions(&mut model);
    (model, report)
}

pub const CLICK_TO_SECOND: &str = r#"
    @Override
    protected void onCreate(Bundle savedInstanceState) {
        super.onCreate(savedInstanceState);
        setContentView(R.layout.main);
        findViewById(R.id.go).setOnClickListener(new View.OnClickListener() {
            @Override
            public void onClick(View view) {
                startActivity(new Intent(Main.this, Second.class));
            }
        });
    }
"#;

pub const MENU_TO_SECOND: &str = r#"
    @Override
    public boolean onCreateOptionsMenu(Menu menu) {
        getMenuInflater().inflate(R.menu.main, menu);
        return true;
    }

    @Override
    public boolean onPrepareOptionsMenu(Menu menu) {
        menu.findItem(R.id.action).setOnMenuItemClickListener(new MenuItem.OnMenuItemClickListener() {
            @Override
            public boolean onMenuItemClick(MenuItem item) {
                startActivity(new Intent(Main.this, Second.class));
                return true;
            }
        });
        return true;
    }
"#;

/// Writes `navmacro.yaml` and the given `src/` files under `dir`.
pub fn write_project(dir: &Path, descriptor: &str, files: &[(&str, &str)]) {
    fs::write(dir.join("navmacro.yaml"), descriptor).unwrap();
    for (path, text) in files {
        let path = dir.join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }
}

pub const DESCRIPTOR: &str = r#"manifest:
  package: com.example
  activities:
    - name: .Main
      intent-filters:
        - actions: [android.intent.action.MAIN]
          categories: [android.intent.category.LAUNCHER]
    - name: .Second
layouts:
  main:
    tag: LinearLayout
    children:
      - tag: Button
        attributes: { "android:id": "@+id/go" }
"#;

/// A Scenario B project on disk: `Main` launches `Second` from `R.id.go`.
pub fn write_click_project(dir: &Path) {
    write_project(
        dir,
        DESCRIPTOR,
        &[
            (
                "src/com/example/Main.java",
                &class_source("Main", "Activity", CLICK_TO_SECOND),
            ),
            (
                "src/com/example/Second.java",
                &class_source("Second", "Activity", ""),
            ),
        ],
    );
}
