mod common;

use common::*;
use navmacro::{
    config::EngineConfig,
    macros::BindingMode,
    model::{Locator, State, Transition},
    project::{ActivityDecl, Manifest, SourceSet, ViewElement},
    session::Session,
};

fn activity(name: &str) -> State {
    State::activity(qualified(name))
}

fn click_from(view: &str, to: &str) -> Transition {
    Transition::click(
        Locator::with_view(activity("Main"), view),
        Locator::of(activity(to)),
    )
}

#[test]
fn launcher_without_code_is_a_single_state() {
    let project = project("", &[]);
    let (model, report) = derive(&session(), &project);
    assert_eq!(model.states().collect::<Vec<_>>(), vec![&activity("Main")]);
    assert_eq!(model.transitions().count(), 0);
    assert_eq!(report.generations, 1);
    assert_eq!(report.visited, 1);
}

#[test]
fn click_listener_launch() {
    let project = project(CLICK_TO_SECOND, &["Second"]).with_layout("main", button_layout("go"));
    let (model, report) = derive(&session(), &project);
    assert!(model.contains_transition(&click_from("go", "Second")));
    assert!(model.contains_state(&activity("Second")));
    assert_eq!(model.transitions().count(), 1);
    assert_eq!(report.visited, 2);
}

#[test]
fn options_menu_launch() {
    let project = project(MENU_TO_SECOND, &["Second"]);
    let (model, _) = derive(&session(), &project);

    let menu = State::menu("main", qualified("Main"));
    assert!(model.contains_transition(&Transition::click(
        Locator::of(activity("Main")),
        Locator::of(menu.clone()),
    )));
    assert!(model.contains_transition(&Transition::click(
        Locator::with_view(menu.clone(), "action"),
        Locator::of(activity("Second")),
    )));
    match model.find_state(&menu) {
        Some(State::Menu(found)) => assert_eq!(found.owner, qualified("Main")),
        other => panic!("menu state missing: {other:?}"),
    }
}

#[test]
fn no_action_bar_means_no_menus() {
    let mut project = project(MENU_TO_SECOND, &["Second"]);
    project.set_window_action_bar(false);
    let (model, _) = derive(&session(), &project);
    assert_eq!(model.transitions().count(), 0);
}

#[test]
fn strict_binding_rejects_inconsistent_repeats() {
    // `startActivity(...)` binds `context` to the callee name and then to
    // `Main.this`; only lenient matching accepts that.
    let project = project(MENU_TO_SECOND, &["Second"]);
    let strict = Session::new(EngineConfig::default().with_binding_mode(BindingMode::Strict)).unwrap();

    let (lenient_model, _) = derive(&session(), &project);
    let (strict_model, _) = derive(&strict, &project);
    let item_launch = Transition::click(
        Locator::with_view(State::menu("main", qualified("Main")), "action"),
        Locator::of(activity("Second")),
    );
    assert!(lenient_model.contains_transition(&item_launch));
    assert!(!strict_model.contains_transition(&item_launch));
}

#[test]
fn discovery_is_idempotent_and_visits_each_class_once() {
    // Main -> Second -> Main: the cycle must not revisit Main.
    let mut project = SourceSet::new(manifest(&["Second"]));
    project
        .add_source("src/Main.java", &class_source("Main", "Activity", CLICK_TO_SECOND))
        .unwrap();
    let back = CLICK_TO_SECOND
        .replace("Second.class", "Main.class")
        .replace("Main.this", "Second.this");
    project
        .add_source("src/Second.java", &class_source("Second", "Activity", &back))
        .unwrap();
    project.add_layout("main", button_layout("go"));

    let session = session();
    let (first, report) = derive(&session, &project);
    let (second, _) = derive(&session, &project);
    assert_eq!(first, second);
    assert_eq!(report.visited, 2);
    assert_eq!(report.generations, 2);
    assert!(first.contains_transition(&Transition::click(
        Locator::with_view(activity("Second"), "go"),
        Locator::of(activity("Main")),
    )));
}

#[test]
fn empty_layouts_and_missing_classes_are_skipped() {
    let blank = r#"
        protected void onCreate(Bundle b) {
            setContentView(R.layout.blank);
        }
    "#;
    let project = project(blank, &[]).with_layout("blank", ViewElement::new("Space"));
    let (model, report) = derive(&session(), &project);
    assert_eq!(model.states().count(), 0);
    assert_eq!(report.skipped, 1);

    let missing = SourceSet::new(Manifest::new(PACKAGE).with_activity(ActivityDecl::launcher(".Ghost")));
    let (model, report) = derive(&session(), &missing);
    assert!(model.contains_state(&activity("Ghost")));
    assert_eq!(report.skipped, 1);
}

#[test]
fn unresolvable_targets_contribute_nothing() {
    let members = CLICK_TO_SECOND.replace("Second.class", "Nowhere.class");
    let project = project(&members, &[]).with_layout("main", button_layout("go"));
    let (model, _) = derive(&session(), &project);
    assert_eq!(model.transitions().count(), 0);
}

const GUARDED_CLICK: &str = r#"
    @Override
    protected void onCreate(Bundle savedInstanceState) {
        setContentView(R.layout.main);
        if (findViewById(R.id.detail) != null) {
            findViewById(R.id.go).setOnClickListener(new View.OnClickListener() {
                @Override
                public void onClick(View view) {
                    startActivity(new Intent(Main.this, Detail.class));
                }
            });
        } else {
            findViewById(R.id.go).setOnClickListener(new View.OnClickListener() {
                @Override
                public void onClick(View view) {
                    startActivity(new Intent(Main.this, Second.class));
                }
            });
        }
    }
"#;

#[test]
fn click_listeners_in_dead_branches_are_pruned() {
    let narrow = project(GUARDED_CLICK, &["Second", "Detail"]).with_layout("main", button_layout("go"));
    let (model, _) = derive(&session(), &narrow);
    assert!(model.contains_transition(&click_from("go", "Second")));
    assert!(!model.contains_transition(&click_from("go", "Detail")));
    assert!(!model.contains_state(&activity("Detail")));

    let wide = project(GUARDED_CLICK, &["Second", "Detail"]).with_layout(
        "main",
        button_layout("go")
            .with_child(ViewElement::new("FrameLayout").with_attribute("android:id", "@+id/detail")),
    );
    let (model, _) = derive(&session(), &wide);
    assert!(model.contains_transition(&click_from("go", "Detail")));
    assert!(!model.contains_transition(&click_from("go", "Second")));
}

#[test]
fn list_activity_item_clicks() {
    let members = r#"
        @Override
        protected void onListItemClick(ListView l, View v, int position, long id) {
            startActivity(new Intent(this, Second.class));
        }
    "#;
    let mut project = SourceSet::new(manifest(&["Second"]));
    project
        .add_source("src/Main.java", &class_source("Main", "ListActivity", members))
        .unwrap();
    project
        .add_source("src/Second.java", &class_source("Second", "Activity", ""))
        .unwrap();
    let (model, _) = derive(&session(), &project);
    assert!(model.contains_transition(&click_from("list", "Second")));
}

#[test]
fn inherited_layouts_and_handlers() {
    let base = r#"
        protected void onCreate(Bundle b) {
            setContentView(R.layout.main);
        }
    "#;
    let main = r#"
        public boolean onCreateOptionsMenu(Menu menu) {
            getMenuInflater().inflate(R.menu.main, menu);
            return true;
        }
    "#;
    let base_prepare = format!(
        "{base}\n{}",
        r#"
        public boolean onPrepareOptionsMenu(Menu menu) {
            menu.findItem(R.id.help).setOnMenuItemClickListener(new MenuItem.OnMenuItemClickListener() {
                public boolean onMenuItemClick(MenuItem item) {
                    Base.this.startActivity(new Intent(Base.this, Second.class));
                    return true;
                }
            });
            return true;
        }
        "#
    );
    let mut project = SourceSet::new(manifest(&["Second"]));
    project
        .add_source("src/Base.java", &class_source("Base", "Activity", &base_prepare))
        .unwrap();
    project
        .add_source("src/Main.java", &class_source("Main", "Base", main))
        .unwrap();
    project
        .add_source("src/Second.java", &class_source("Second", "Activity", ""))
        .unwrap();
    project.add_layout("main", ViewElement::new("Space"));

    // Main inherits Base's empty layout.
    let (model, _) = derive(&session(), &project);
    assert_eq!(model.states().count(), 0);

    project.add_layout("main", button_layout("go"));
    let (model, _) = derive(&session(), &project);
    assert!(model.contains_transition(&Transition::click(
        Locator::with_view(State::menu("main", qualified("Main")), "help"),
        Locator::of(activity("Second")),
    )));

    let only_own = Session::new(EngineConfig {
        menu_search_superclasses: false,
        ..EngineConfig::default()
    })
    .unwrap();
    let (model, _) = derive(&only_own, &project);
    assert_eq!(model.transitions().count(), 1);
}

// ============================================================================
// FRAGMENTS
// ============================================================================

const HOST: &str = r#"
    private boolean mTwoPane;

    @Override
    protected void onCreate(Bundle savedInstanceState) {
        super.onCreate(savedInstanceState);
        setContentView(R.layout.main);
        mTwoPane = findViewById(R.id.detail_container) != null;
    }

    public void onItemSelected(String id) {
        if (mTwoPane) {
            getFragmentManager().beginTransaction().commit();
        } else {
            startActivity(new Intent(this, Detail.class));
        }
    }
"#;

const LIST_FRAGMENT: &str = r#"
    @Override
    public void onListItemClick(ListView listView, View view, int position, long id) {
        super.onListItemClick(listView, view, position, id);
        mCallbacks.onItemSelected(String.valueOf(id));
    }
"#;

fn fragment_project(host: &str, layout: ViewElement) -> SourceSet {
    let mut project = SourceSet::new(manifest(&["Detail"]));
    project
        .add_source("src/Main.java", &class_source("Main", "Activity", host))
        .unwrap();
    project
        .add_source(
            "src/ItemListFragment.java",
            &class_source("ItemListFragment", "ListFragment", LIST_FRAGMENT),
        )
        .unwrap();
    project
        .add_source("src/Detail.java", &class_source("Detail", "Activity", ""))
        .unwrap();
    project.add_layout("main", layout);
    project
}

fn list_fragment() -> ViewElement {
    ViewElement::new("fragment")
        .with_attribute("android:name", ".ItemListFragment")
        .with_attribute("android:tag", "items")
}

fn master_detail() -> Transition {
    Transition::click(
        Locator::with_view(activity("Main"), "list")
            .in_fragment(Some(qualified("ItemListFragment"))),
        Locator::of(activity("Detail")),
    )
}

#[test]
fn single_pane_master_detail_launches_the_detail_activity() {
    let layout = ViewElement::new("LinearLayout").with_child(list_fragment());
    let (model, _) = derive(&session(), &fragment_project(HOST, layout));
    assert!(model.contains_transition(&master_detail()));
    assert!(model.contains_state(&activity("Detail")));
}

#[test]
fn two_pane_layouts_prune_the_launch() {
    let layout = ViewElement::new("LinearLayout")
        .with_child(list_fragment())
        .with_child(ViewElement::new("FrameLayout").with_attribute("android:id", "@+id/detail_container"));
    let (model, _) = derive(&session(), &fragment_project(HOST, layout));
    assert!(!model.contains_transition(&master_detail()));
    assert!(!model.contains_state(&activity("Detail")));
}

#[test]
fn fragment_tags_prune_the_launch() {
    let host = r#"
        protected void onCreate(Bundle b) {
            setContentView(R.layout.main);
        }

        public void onItemSelected(String id) {
            if (getFragmentManager().findFragmentByTag("detail") == null) {
                startActivity(new Intent(this, Detail.class));
            }
        }
    "#;
    let single = ViewElement::new("LinearLayout").with_child(list_fragment());
    let (model, _) = derive(&session(), &fragment_project(host, single.clone()));
    assert!(model.contains_transition(&master_detail()));

    let dual = single.with_child(
        ViewElement::new("fragment")
            .with_attribute("android:name", ".DetailFragment")
            .with_attribute("android:tag", "detail"),
    );
    let (model, _) = derive(&session(), &fragment_project(host, dual));
    assert!(!model.contains_transition(&master_detail()));
}
