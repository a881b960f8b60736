//! Navigation model: screens, menus and the transitions between them.

use std::{
    cmp::Ordering,
    collections::BTreeSet,
    hash::{Hash, Hasher},
};

use serde::{Deserialize, Serialize};

/// Gesture recorded for every discovered transition.
pub const CLICK: &str = "click";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActivityState {
    pub class_name: String,
}

/// A menu, identified by its resource name. `owner` is the activity class
/// that inflates it and does not take part in equality or ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuState {
    pub name: String,
    pub owner: String,
}

impl PartialEq for MenuState {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for MenuState {}

impl Hash for MenuState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl PartialOrd for MenuState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MenuState {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum State {
    Activity(ActivityState),
    Menu(MenuState),
}

impl State {
    pub fn activity(class_name: impl Into<String>) -> Self {
        State::Activity(ActivityState {
            class_name: class_name.into(),
        })
    }

    pub fn menu(name: impl Into<String>, owner: impl Into<String>) -> Self {
        State::Menu(MenuState {
            name: name.into(),
            owner: owner.into(),
        })
    }

    /// Class name for activities, resource name for menus.
    pub fn identifier(&self) -> &str {
        match self {
            State::Activity(a) => &a.class_name,
            State::Menu(m) => &m.name,
        }
    }
}

/// A point in the UI: a state, optionally narrowed to a hosted fragment and
/// to a named view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Locator {
    pub state: State,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_name: Option<String>,
}

impl Locator {
    pub fn of(state: State) -> Self {
        Locator {
            state,
            fragment: None,
            view_name: None,
        }
    }

    pub fn with_view(state: State, view_name: impl Into<String>) -> Self {
        Locator {
            view_name: Some(view_name.into()),
            ..Locator::of(state)
        }
    }

    pub fn in_fragment(mut self, fragment: Option<String>) -> Self {
        self.fragment = fragment;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Transition {
    pub gesture: String,
    pub source: Locator,
    pub destination: Locator,
}

impl Transition {
    pub fn new(gesture: impl Into<String>, source: Locator, destination: Locator) -> Self {
        Transition {
            gesture: gesture.into(),
            source,
            destination,
        }
    }

    pub fn click(source: Locator, destination: Locator) -> Self {
        Transition::new(CLICK, source, destination)
    }
}

/// States and transitions; duplicates collapse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationModel {
    states: BTreeSet<State>,
    transitions: BTreeSet<Transition>,
}

impl NavigationModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the state was already present.
    pub fn add_state(&mut self, state: State) -> bool {
        self.states.insert(state)
    }

    /// Adds the transition and both endpoint states.
    pub fn add_transition(&mut self, transition: Transition) -> bool {
        self.states.insert(transition.source.state.clone());
        self.states.insert(transition.destination.state.clone());
        self.transitions.insert(transition)
    }

    pub fn clear(&mut self) {
        self.states.clear();
        self.transitions.clear();
    }

    pub fn states(&self) -> impl Iterator<Item = &State> {
        self.states.iter()
    }

    pub fn transitions(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.iter()
    }

    pub fn contains_state(&self, state: &State) -> bool {
        self.states.contains(state)
    }

    pub fn contains_transition(&self, transition: &Transition) -> bool {
        self.transitions.contains(transition)
    }

    /// The stored copy of a state, which for menus carries the owner.
    pub fn find_state(&self, probe: &State) -> Option<&State> {
        self.states.get(probe)
    }

    pub fn transitions_from<'m>(&'m self, state: &'m State) -> impl Iterator<Item = &'m Transition> {
        self.transitions.iter().filter(move |t| &t.source.state == state)
    }
}
