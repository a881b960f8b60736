//! Layout view trees.

use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const ATTR_ID: &str = "android:id";
pub const ATTR_TAG: &str = "android:tag";
pub const ATTR_NAME: &str = "android:name";
pub const ATTR_CLASS: &str = "class";
pub const FRAGMENT_TAG: &str = "fragment";

static ID_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^@(?:\+id|id|android:id)/(.+)$").expect("id reference pattern"));

/// One element of a layout: tag, attributes and child elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewElement {
    pub tag: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub children: Vec<ViewElement>,
}

/// A `<fragment>` declaration inside a layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentDecl {
    pub class_name: String,
    pub tag: Option<String>,
}

impl ViewElement {
    pub fn new(tag: impl Into<String>) -> Self {
        ViewElement {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: ViewElement) -> Self {
        self.children.push(child);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// This element and all descendants, pre-order.
    pub fn elements(&self) -> Vec<&ViewElement> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(element) = stack.pop() {
            out.push(element);
            stack.extend(element.children.iter().rev());
        }
        out
    }

    /// Declared view ids with their reference prefix removed.
    pub fn ids(&self) -> BTreeSet<String> {
        self.elements()
            .into_iter()
            .filter_map(|e| e.attribute(ATTR_ID))
            .filter_map(id_name)
            .collect()
    }

    pub fn tags(&self) -> BTreeSet<String> {
        self.elements()
            .into_iter()
            .filter_map(|e| e.attribute(ATTR_TAG))
            .map(str::to_string)
            .collect()
    }

    pub fn fragments(&self) -> Vec<FragmentDecl> {
        self.elements()
            .into_iter()
            .filter(|e| e.tag == FRAGMENT_TAG)
            .filter_map(|e| {
                let class_name = e.attribute(ATTR_NAME).or_else(|| e.attribute(ATTR_CLASS))?;
                Some(FragmentDecl {
                    class_name: class_name.to_string(),
                    tag: e.attribute(ATTR_TAG).map(str::to_string),
                })
            })
            .collect()
    }
}

/// `@+id/go`, `@id/go` and `@android:id/list` name `go`, `go` and `list`.
pub fn id_name(value: &str) -> Option<String> {
    if let Some(captures) = ID_REFERENCE.captures(value) {
        return captures.get(1).map(|m| m.as_str().to_string());
    }
    match value.split_once('/') {
        Some((prefix, name)) => {
            warn!(value, prefix, "unrecognized view id prefix");
            Some(name.to_string())
        }
        None => Some(value.to_string()),
    }
}
