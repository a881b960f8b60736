//! Application manifest: package name and declared activities.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const ACTION_MAIN: &str = "android.intent.action.MAIN";
pub const CATEGORY_LAUNCHER: &str = "android.intent.category.LAUNCHER";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Manifest {
    #[serde(default)]
    pub package: Option<String>,
    #[serde(default)]
    pub activities: Vec<ActivityDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ActivityDecl {
    pub name: String,
    #[serde(default)]
    pub intent_filters: Vec<IntentFilter>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IntentFilter {
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
}

impl ActivityDecl {
    pub fn new(name: impl Into<String>) -> Self {
        ActivityDecl {
            name: name.into(),
            intent_filters: Vec::new(),
        }
    }

    /// Declares the MAIN/LAUNCHER filter that makes an activity an entry point.
    pub fn launcher(name: impl Into<String>) -> Self {
        ActivityDecl {
            name: name.into(),
            intent_filters: vec![IntentFilter {
                actions: vec![ACTION_MAIN.to_string()],
                categories: vec![CATEGORY_LAUNCHER.to_string()],
            }],
        }
    }
}

impl Manifest {
    pub fn new(package: impl Into<String>) -> Self {
        Manifest {
            package: Some(package.into()),
            activities: Vec::new(),
        }
    }

    pub fn with_activity(mut self, activity: ActivityDecl) -> Self {
        self.activities.push(activity);
        self
    }

    /// Fully qualifies a manifest class name. Names starting with `.` (or
    /// without any dot) are relative to the package; with no package they
    /// cannot be qualified.
    pub fn qualify(&self, name: &str) -> Option<String> {
        let relative = name.starts_with('.') || !name.contains('.');
        if !relative {
            return Some(name.to_string());
        }
        let Some(package) = &self.package else {
            warn!(name, "relative class name in a manifest without a package");
            return None;
        };
        let name = name.trim_start_matches('.');
        Some(format!("{package}.{name}"))
    }

    /// Qualified names of every declared activity.
    pub fn declared_activities(&self) -> BTreeSet<String> {
        self.activities
            .iter()
            .filter_map(|a| self.qualify(&a.name))
            .collect()
    }

    fn filter_targets(&self, accepts: impl Fn(&IntentFilter) -> bool) -> BTreeSet<String> {
        self.activities
            .iter()
            .filter(|a| a.intent_filters.iter().any(&accepts))
            .filter_map(|a| self.qualify(&a.name))
            .collect()
    }

    /// Entry points: declared activities that are both a MAIN action target
    /// and a LAUNCHER category target.
    pub fn launcher_activities(&self) -> BTreeSet<String> {
        let main = self.filter_targets(|f| f.actions.iter().any(|a| a == ACTION_MAIN));
        let launcher =
            self.filter_targets(|f| f.categories.iter().any(|c| c == CATEGORY_LAUNCHER));
        self.declared_activities()
            .into_iter()
            .filter(|name| main.contains(name) && launcher.contains(name))
            .collect()
    }
}
