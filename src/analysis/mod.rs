//! # Navigation discovery
//!
//! [`Analyser`] derives a [`NavigationModel`] from a project snapshot. It
//! starts from the launcher activities and works through generations of
//! newly reached activities until no new ones appear. For every screen it
//! looks for the handful of idioms the bundled macros describe: menu
//! inflation, menu-item handlers, click and item-click listeners, list item
//! clicks and the master/detail callback.
//!
//! Menu and list handlers are located without branch knowledge. Listener
//! registrations in the screen's lifecycle methods, and the launches inside
//! every handler, prune `if` branches with a [`LayoutEvaluator`] built for
//! the screen.
//!
//! Missing classes and methods never fail a pass; they are logged and the
//! affected branch contributes nothing.

pub mod evaluator;
pub mod search;

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, info};

pub use evaluator::{LayoutEvaluator, StaticEvaluator, UnknownEvaluator, Value};
pub use search::{match_unique, search, search_all};

use crate::{
    ast::{NodeKind, NodeRef},
    macros::{NodeBindings, StandardMacros},
    model::{Locator, NavigationModel, State, Transition},
    project::{type_name, ClassRef, MethodSignature, ProjectIndex, ViewElement},
    session::Session,
    NavError,
};

/// View name recorded for list item clicks.
pub const LIST_VIEW_ID: &str = "list";

pub const ON_CREATE: &str = "void onCreate(Bundle b)";
pub const ACTIVITY_ON_CREATE_VIEW: &str =
    "void onCreateView(View parent, String name, Context context, AttributeSet attrs)";
pub const FRAGMENT_ON_CREATE_VIEW: &str =
    "View onCreateView(LayoutInflater li, ViewGroup vg, Bundle b)";
pub const ON_VIEW_CREATED: &str = "void onViewCreated(View v, Bundle b)";
pub const ON_CREATE_OPTIONS_MENU: &str = "boolean onCreateOptionsMenu(Menu menu)";
pub const ON_PREPARE_OPTIONS_MENU: &str = "boolean onPrepareOptionsMenu(Menu menu)";
pub const ON_OPTIONS_ITEM_SELECTED: &str = "boolean onOptionsItemSelected(MenuItem item)";
pub const ON_LIST_ITEM_CLICK: &str =
    "void onListItemClick(ListView l, View v, int position, long id)";

/// How many local-variable initializers a view lookup may follow.
const MAX_VIEW_HOPS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScreenKind {
    Activity,
    Fragment,
}

struct Signatures {
    on_create: MethodSignature,
    activity_on_create_view: MethodSignature,
    fragment_on_create_view: MethodSignature,
    on_view_created: MethodSignature,
    on_create_options_menu: MethodSignature,
    on_prepare_options_menu: MethodSignature,
    on_options_item_selected: MethodSignature,
    on_list_item_click: MethodSignature,
}

impl Signatures {
    fn parse() -> Result<Self, NavError> {
        Ok(Signatures {
            on_create: MethodSignature::parse(ON_CREATE)?,
            activity_on_create_view: MethodSignature::parse(ACTIVITY_ON_CREATE_VIEW)?,
            fragment_on_create_view: MethodSignature::parse(FRAGMENT_ON_CREATE_VIEW)?,
            on_view_created: MethodSignature::parse(ON_VIEW_CREATED)?,
            on_create_options_menu: MethodSignature::parse(ON_CREATE_OPTIONS_MENU)?,
            on_prepare_options_menu: MethodSignature::parse(ON_PREPARE_OPTIONS_MENU)?,
            on_options_item_selected: MethodSignature::parse(ON_OPTIONS_ITEM_SELECTED)?,
            on_list_item_click: MethodSignature::parse(ON_LIST_ITEM_CLICK)?,
        })
    }
}

/// Counters for one discovery pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiscoveryReport {
    /// Worklist generations processed.
    pub generations: usize,
    /// Activities examined; each at most once.
    pub visited: usize,
    /// Activities left out: empty layouts and classes missing from the project.
    pub skipped: usize,
}

/// Activities and menus reached during one worklist generation.
#[derive(Debug, Default)]
struct MiniModel {
    activities: BTreeSet<String>,
    menus: BTreeSet<String>,
}

/// Where discovered transitions go.
struct Sink<'m> {
    model: &'m mut NavigationModel,
    next: MiniModel,
}

impl Sink<'_> {
    fn add(&mut self, transition: Transition) {
        if let State::Activity(target) = &transition.destination.state {
            self.next.activities.insert(target.class_name.clone());
        }
        if let State::Menu(menu) = &transition.destination.state {
            self.next.menus.insert(menu.name.clone());
        }
        debug!(
            from = transition.source.state.identifier(),
            view = transition.source.view_name.as_deref().unwrap_or("-"),
            to = transition.destination.state.identifier(),
            "transition"
        );
        self.model.add_transition(transition);
    }
}

pub struct Analyser<'a> {
    session: &'a Session,
    project: &'a dyn ProjectIndex,
    signatures: Signatures,
}

// ============================================================================
// PUBLIC API
// ============================================================================

impl<'a> Analyser<'a> {
    pub fn new(session: &'a Session, project: &'a dyn ProjectIndex) -> Result<Self, NavError> {
        Ok(Analyser {
            session,
            project,
            signatures: Signatures::parse()?,
        })
    }

    /// Clears `model` and fills it with every state and transition reachable
    /// from the launcher activities.
    pub fn derive_all_states_and_transitions(&self, model: &mut NavigationModel) -> DiscoveryReport {
        model.clear();
        let mut report = DiscoveryReport::default();
        let mut done: BTreeSet<String> = BTreeSet::new();
        let mut to_do = self.project.manifest().launcher_activities();
        info!(launchers = to_do.len(), "navigation discovery started");

        while !to_do.is_empty() {
            report.generations += 1;
            let mut sink = Sink {
                model: &mut *model,
                next: MiniModel::default(),
            };
            for class_name in &to_do {
                report.visited += 1;
                if !self.visit_activity(class_name, &mut sink) {
                    report.skipped += 1;
                }
            }
            debug!(
                generation = report.generations,
                activities = sink.next.activities.len(),
                menus = sink.next.menus.len(),
                "generation finished"
            );
            done.extend(to_do);
            to_do = sink
                .next
                .activities
                .into_iter()
                .filter(|name| !done.contains(name))
                .collect();
        }

        info!(
            states = model.states().count(),
            transitions = model.transitions().count(),
            generations = report.generations,
            "navigation discovery finished"
        );
        report
    }
}

// ============================================================================
// SCREENS
// ============================================================================

impl<'a> Analyser<'a> {
    fn macros(&self) -> &'a StandardMacros {
        self.session.macros()
    }

    /// Returns false when the activity was skipped.
    fn visit_activity(&self, class_name: &str, sink: &mut Sink<'_>) -> bool {
        let class = self.project.find_class(class_name);
        let layout = class.and_then(|c| self.layout_of(c, ScreenKind::Activity));
        if layout.is_some_and(|l| l.tag == self.session.config().empty_layout_tag) {
            debug!(class = class_name, "skipping activity with an empty layout");
            return false;
        }

        sink.model.add_state(State::activity(class_name));
        if !self.derive_transitions(class_name, None, sink) {
            return false;
        }

        for fragment in layout.map(ViewElement::fragments).unwrap_or_default() {
            let Some(fragment_name) = self.project.manifest().qualify(&fragment.class_name) else {
                continue;
            };
            self.derive_transitions(class_name, Some(&fragment_name), sink);
        }
        true
    }

    /// Derives the transitions of an activity, or of a fragment hosted by
    /// it. Returns false when a class is missing.
    fn derive_transitions(&self, activity_name: &str, fragment: Option<&str>, sink: &mut Sink<'_>) -> bool {
        let Some(activity) = self.project.find_class(activity_name) else {
            info!(class = activity_name, "activity class not found");
            return false;
        };
        let (screen, kind) = match fragment {
            None => (activity, ScreenKind::Activity),
            Some(name) => {
                let Some(class) = self.project.find_class(name) else {
                    info!(class = name, "fragment class not found");
                    return false;
                };
                (class, ScreenKind::Fragment)
            }
        };

        let evaluator = self.evaluator_for(activity, screen, kind);
        let locate = |view_name: Option<String>| Locator {
            state: State::activity(activity_name),
            fragment: fragment.map(str::to_string),
            view_name,
        };
        let macros = self.macros();

        if kind == ScreenKind::Activity && self.project.window_action_bar() {
            self.derive_menus(activity, &evaluator, sink);
        }

        let signatures = match kind {
            ScreenKind::Activity => [&self.signatures.on_create, &self.signatures.activity_on_create_view],
            ScreenKind::Fragment => [&self.signatures.on_create, &self.signatures.on_view_created],
        };
        for signature in signatures {
            let Some(body) = method_body(screen, signature) else {
                continue;
            };
            for bindings in search_all(body, &evaluator, &macros.install_click_and_call) {
                let view = bindings.get("$view").and_then(|v| self.view_id(*v));
                self.derive_intents(bindings.get("$f").copied(), &evaluator, screen, locate(view), sink);
            }
            for bindings in search_all(body, &evaluator, &macros.install_item_click_and_call) {
                let source = locate(Some(LIST_VIEW_ID.to_string()));
                self.derive_intents(bindings.get("$f").copied(), &evaluator, screen, source, sink);
            }
        }

        let list_base = match kind {
            ScreenKind::Activity => "ListActivity",
            ScreenKind::Fragment => "ListFragment",
        };
        if !self.project.inherits_from(screen, list_base) {
            return true;
        }
        let Some(body) = method_body(screen, &self.signatures.on_list_item_click) else {
            return true;
        };
        let source = locate(Some(LIST_VIEW_ID.to_string()));
        self.derive_intents(Some(body), &UnknownEvaluator, screen, source.clone(), sink);
        if kind == ScreenKind::Fragment {
            self.derive_master_detail(activity, body, source, sink);
        }
        true
    }

    /// Menu inflation, then item handlers for every inflated menu.
    fn derive_menus(&self, activity: ClassRef<'a>, evaluator: &LayoutEvaluator<'a>, sink: &mut Sink<'_>) {
        let macros = self.macros();
        let Some(body) = method_body(activity, &self.signatures.on_create_options_menu) else {
            return;
        };
        let owner = activity.qualified_name();
        for bindings in search_all(body, &UnknownEvaluator, &macros.inflate_menu) {
            let Some(menu_name) = bindings.get("id").and_then(|n| last_segment(*n)) else {
                continue;
            };
            let menu = State::menu(menu_name, owner);
            sink.add(Transition::click(
                Locator::of(State::activity(owner)),
                Locator::of(menu.clone()),
            ));

            let classes = if self.session.config().menu_search_superclasses {
                self.project.superclass_chain(activity)
            } else {
                vec![activity]
            };
            for class in classes {
                if let Some(body) = method_body(class, &self.signatures.on_prepare_options_menu) {
                    for bindings in search_all(body, &UnknownEvaluator, &macros.menu_item_launch) {
                        let item = bindings
                            .get("$menuItem")
                            .and_then(|item| macros.find_menu_item.match_node(*item))
                            .and_then(|found| found.get("$id").and_then(|n| last_segment(*n)))
                            .map(str::to_string);
                        let source = Locator {
                            view_name: item,
                            ..Locator::of(menu.clone())
                        };
                        self.derive_intents(bindings.get("$f").copied(), evaluator, class, source, sink);
                    }
                }
                if let Some(body) = method_body(class, &self.signatures.on_options_item_selected) {
                    self.derive_intents(Some(body), &UnknownEvaluator, class, Locator::of(menu.clone()), sink);
                }
            }
        }
    }

    /// Master/detail: a list fragment forwards item clicks to a callback the
    /// host activity implements; the activity's implementation launches the
    /// detail screen.
    fn derive_master_detail(
        &self,
        activity: ClassRef<'a>,
        on_list_item_click: NodeRef<'a>,
        source: Locator,
        sink: &mut Sink<'_>,
    ) {
        let macros = self.macros();
        let evaluator = self.evaluator_for(activity, activity, ScreenKind::Activity);
        for bindings in search_all(on_list_item_click, &UnknownEvaluator, &macros.any_call) {
            let Some(call) = bindings.get("f").copied() else {
                continue;
            };
            let Some(callee) = call.first_child() else {
                continue;
            };
            if callee.first_child().map(|q| q.kind()) == Some(NodeKind::Super) {
                continue;
            }
            let (Some(name), Some(arguments)) = (callee.name(), call.child(1)) else {
                continue;
            };
            let Some(implementation) = activity.find_method_by_name(name, arguments.child_count()) else {
                debug!(method = name, activity = activity.qualified_name(), "callback not implemented by host");
                continue;
            };
            let body = implementation.find_child(NodeKind::CodeBlock);
            self.derive_intents(body, &evaluator, activity, source.clone(), sink);
        }
    }

    /// Searches `root` for intent constructions and records a transition from
    /// `source` to each resolvable target activity.
    fn derive_intents(
        &self,
        root: Option<NodeRef<'a>>,
        evaluator: &dyn StaticEvaluator,
        context: ClassRef<'a>,
        source: Locator,
        sink: &mut Sink<'_>,
    ) {
        let Some(root) = root else {
            return;
        };
        for bindings in search_all(root, evaluator, &self.macros().create_intent) {
            let Some(target) = self.intent_target(&bindings, context) else {
                continue;
            };
            sink.add(Transition::click(
                source.clone(),
                Locator::of(State::activity(target)),
            ));
        }
    }

    /// `new Intent(ctx, Target.class)` names `Target`, resolved from `context`.
    fn intent_target(&self, bindings: &NodeBindings<'a>, context: ClassRef<'a>) -> Option<String> {
        let class = bindings.get("activityClass")?;
        if class.kind() != NodeKind::ClassLiteral {
            debug!(argument = %class.print(), "intent target is not a class literal");
            return None;
        }
        let name = type_name(class.find_child(NodeKind::TypeElement)?);
        let resolved = self.project.resolve_class_name(context, &name);
        if resolved.is_none() {
            info!(class = %name, context = context.qualified_name(), "intent target not resolvable");
        }
        resolved
    }
}

// ============================================================================
// LAYOUTS AND EVALUATORS
// ============================================================================

impl<'a> Analyser<'a> {
    /// The layout set by the class or its nearest superclass that sets one.
    /// A method must contain exactly one layout call to count.
    fn layout_of(&self, class: ClassRef<'a>, kind: ScreenKind) -> Option<&'a ViewElement> {
        let macros = self.macros();
        let (signature, matcher) = match kind {
            ScreenKind::Activity => (&self.signatures.on_create, &macros.set_content_view),
            ScreenKind::Fragment => (&self.signatures.fragment_on_create_view, &macros.inflate_layout),
        };
        for class in self.project.superclass_chain(class) {
            let Some(body) = method_body(class, signature) else {
                continue;
            };
            let Some(bindings) = match_unique(body, matcher) else {
                continue;
            };
            let Some(name) = bindings.get("$id").and_then(|n| last_segment(*n)) else {
                continue;
            };
            let layout = self.project.layout(name);
            if layout.is_none() {
                debug!(layout = name, class = class.qualified_name(), "layout not found");
            }
            return layout;
        }
        None
    }

    /// Ids come from the screen's own layout, tags from the host activity's.
    fn evaluator_for(&self, activity: ClassRef<'a>, screen: ClassRef<'a>, kind: ScreenKind) -> LayoutEvaluator<'a> {
        let host_layout = self.layout_of(activity, ScreenKind::Activity);
        let screen_layout = match kind {
            ScreenKind::Activity => host_layout,
            ScreenKind::Fragment => self.layout_of(screen, ScreenKind::Fragment),
        };
        let ids = screen_layout.map(ViewElement::ids).unwrap_or_default();
        let tags = host_layout.map(ViewElement::tags).unwrap_or_default();

        let plain = LayoutEvaluator::new(self.macros(), ids, tags);
        let fields = self.field_values(screen, &plain);
        let with_fields = plain.with_fields(fields);
        let locals = self.local_values(screen, &with_fields);
        with_fields.with_locals(locals)
    }

    /// Field values assigned in `onCreate`.
    fn field_values(&self, class: ClassRef<'a>, evaluator: &LayoutEvaluator<'a>) -> BTreeMap<String, Value> {
        let mut values = BTreeMap::new();
        let Some(body) = method_body(class, &self.signatures.on_create) else {
            return values;
        };
        let fields: BTreeSet<&str> = class.fields().filter_map(|f| f.name()).collect();
        for bindings in search_all(body, evaluator, &self.macros().assign) {
            let (Some(lhs), Some(rhs)) = (bindings.get("$lhs"), bindings.get("$rhs")) else {
                continue;
            };
            let plain_assignment = lhs.parent().and_then(|p| p.text()) == Some("=");
            let names_field = lhs.kind() == NodeKind::Reference
                && (lhs.child_count() == 1
                    || lhs.first_child().map(|q| q.kind()) == Some(NodeKind::This));
            let Some(name) = lhs.name().filter(|n| fields.contains(n)) else {
                continue;
            };
            if plain_assignment && names_field {
                values.insert(name.to_string(), evaluator.value(*rhs));
            }
        }
        values
    }

    /// Local variable values from initializers in `onViewCreated`.
    fn local_values(&self, class: ClassRef<'a>, evaluator: &LayoutEvaluator<'a>) -> BTreeMap<String, Value> {
        let Some(body) = method_body(class, &self.signatures.on_view_created) else {
            return BTreeMap::new();
        };
        body.descendants()
            .filter(|n| n.kind() == NodeKind::LocalVariable)
            .filter_map(|local| {
                let initializer = local.child(3)?;
                Some((local.name()?.to_string(), evaluator.value(initializer)))
            })
            .collect()
    }

    /// Recovers the view id from a listener's receiver: a `findViewById`
    /// call, possibly cast or parenthesized, possibly stored in a local.
    fn view_id(&self, view: NodeRef<'a>) -> Option<String> {
        let macros = self.macros();
        let mut current = view;
        for _ in 0..MAX_VIEW_HOPS {
            current = strip_casts(current);
            let found = macros
                .find_view_by_id1
                .match_node(current)
                .or_else(|| macros.find_view_by_id2.match_node(current));
            if let Some(bindings) = found {
                return bindings
                    .get("$id")
                    .and_then(|n| last_segment(*n))
                    .map(str::to_string);
            }
            current = local_initializer(current)?;
        }
        None
    }
}

// ============================================================================
// INTERNAL HELPERS
// ============================================================================

fn method_body<'a>(class: ClassRef<'a>, signature: &MethodSignature) -> Option<NodeRef<'a>> {
    class.find_method(signature)?.find_child(NodeKind::CodeBlock)
}

/// `R.menu.main` and `main` both name `main`.
fn last_segment(node: NodeRef<'_>) -> Option<&str> {
    match node.kind() {
        NodeKind::Identifier => node.text(),
        NodeKind::Reference => node.name(),
        _ => None,
    }
}

fn strip_casts(mut node: NodeRef<'_>) -> NodeRef<'_> {
    loop {
        let inner = match node.kind() {
            NodeKind::TypeCast => node.last_child(),
            NodeKind::Parenthesized => node.first_child(),
            _ => None,
        };
        match inner {
            Some(inner) => node = inner,
            None => return node,
        }
    }
}

/// For a simple name, the initializer of the local variable it names in the
/// enclosing method.
fn local_initializer(reference: NodeRef<'_>) -> Option<NodeRef<'_>> {
    if reference.kind() != NodeKind::Reference || reference.child_count() != 1 {
        return None;
    }
    let name = reference.name()?;
    let method = reference.ancestor(NodeKind::Method)?;
    method
        .descendants()
        .filter(|n| n.kind() == NodeKind::LocalVariable && n.name() == Some(name))
        .find_map(|local| local.child(3))
}
