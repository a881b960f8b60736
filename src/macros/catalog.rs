//! The bundled macro catalog.
//!
//! Macro resources are snippet files compiled into the binary. Loading parses
//! every resource, compiles each method into a [`Template`] keyed by its
//! method name, wires the composite macros and exposes the ones the analyser
//! and generator rely on through [`StandardMacros`]. Any failure aborts the
//! load; there is no partially loaded catalog.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::{
    multimatch::MultiMatch,
    template::Template,
    unifier::BindingMode,
};
use crate::{nav_err, syntax, NavError};

/// Bundled resources as `(file name, contents)`.
pub const BUNDLED_RESOURCES: &[(&str, &str)] = &[
    (
        "intents.snippet",
        include_str!("../../resources/macros/intents.snippet"),
    ),
    (
        "listeners.snippet",
        include_str!("../../resources/macros/listeners.snippet"),
    ),
    (
        "menus.snippet",
        include_str!("../../resources/macros/menus.snippet"),
    ),
    (
        "views.snippet",
        include_str!("../../resources/macros/views.snippet"),
    ),
];

/// Catalog name of the menu-item composite: `installMenuItemClick` whose
/// `$menuItem` is a `getMenuItem` and whose `$f` is a `launchActivity`.
pub const MENU_ITEM_LAUNCH: &str = "installMenuItemOnGetMenuItemAndLaunchActivity";

/// The macros the engine itself depends on.
#[derive(Debug, Clone)]
pub struct StandardMacros {
    pub create_intent: MultiMatch,
    pub launch_activity: MultiMatch,
    pub install_click_and_call: MultiMatch,
    pub install_item_click_and_call: MultiMatch,
    pub install_menu_item_click: MultiMatch,
    pub get_menu_item: MultiMatch,
    pub find_menu_item: MultiMatch,
    pub find_view_by_id1: MultiMatch,
    pub find_view_by_id2: MultiMatch,
    pub find_fragment_by_tag: MultiMatch,
    pub inflate_menu: MultiMatch,
    pub set_content_view: MultiMatch,
    pub inflate_layout: MultiMatch,
    pub assign: MultiMatch,
    pub any_call: MultiMatch,
    pub define_inner_class_to_launch_activity: MultiMatch,
    pub menu_item_launch: MultiMatch,
}

impl StandardMacros {
    fn collect(macros: &BTreeMap<String, MultiMatch>) -> Result<Self, NavError> {
        let get = |name: &str| {
            macros
                .get(name)
                .cloned()
                .ok_or_else(|| nav_err!(Catalog, "required macro '{}' is missing", name))
        };
        Ok(StandardMacros {
            create_intent: get("createIntent")?,
            launch_activity: get("launchActivity")?,
            install_click_and_call: get("installClickAndCall")?,
            install_item_click_and_call: get("installItemClickAndCall")?,
            install_menu_item_click: get("installMenuItemClick")?,
            get_menu_item: get("getMenuItem")?,
            find_menu_item: get("findMenuItem")?,
            find_view_by_id1: get("findViewById1")?,
            find_view_by_id2: get("findViewById2")?,
            find_fragment_by_tag: get("findFragmentByTag")?,
            inflate_menu: get("inflateMenu")?,
            set_content_view: get("setContentView")?,
            inflate_layout: get("inflateLayout")?,
            assign: get("assign")?,
            any_call: get("anyCall")?,
            define_inner_class_to_launch_activity: get("defineInnerClassToLaunchActivity")?,
            menu_item_launch: get(MENU_ITEM_LAUNCH)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct MacroCatalog {
    version: String,
    mode: BindingMode,
    macros: BTreeMap<String, MultiMatch>,
    standard: StandardMacros,
}

// ============================================================================
// PUBLIC API
// ============================================================================

impl MacroCatalog {
    /// Loads the bundled resources.
    pub fn load(mode: BindingMode) -> Result<Self, NavError> {
        Self::from_resources(BUNDLED_RESOURCES, mode)
    }

    /// Loads an explicit resource set. The set must define every macro named
    /// in [`StandardMacros`].
    pub fn from_resources(resources: &[(&str, &str)], mode: BindingMode) -> Result<Self, NavError> {
        let mut hasher = Sha256::new();
        let mut templates: BTreeMap<String, Template> = BTreeMap::new();

        for (resource, text) in resources {
            hasher.update(resource.as_bytes());
            hasher.update([0u8]);
            hasher.update(text.as_bytes());
            hasher.update([0u8]);

            let tree = syntax::parse_snippets(text, resource)?;
            for method in tree.root_ref().children() {
                let template = Template::from_snippet(method)?;
                if templates.contains_key(template.name()) {
                    return Err(nav_err!(
                        Catalog,
                        "duplicate macro '{}' in {}",
                        template.name(),
                        resource
                    ));
                }
                debug!(name = template.name(), resource, "compiled macro");
                templates.insert(template.name().to_string(), template);
            }
        }

        let version = format!("{:x}", hasher.finalize());
        let mut macros: BTreeMap<String, MultiMatch> = templates
            .into_iter()
            .map(|(name, template)| (name, MultiMatch::new(template, mode)))
            .collect();
        let composite = compose_menu_item_launch(&macros, mode)?;
        macros.insert(MENU_ITEM_LAUNCH.to_string(), composite);

        let standard = StandardMacros::collect(&macros)?;
        info!(
            version = &version[..12],
            macros = macros.len(),
            "macro catalog loaded"
        );
        Ok(MacroCatalog {
            version,
            mode,
            macros,
            standard,
        })
    }

    /// Hex SHA-256 over resource names and contents.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn binding_mode(&self) -> BindingMode {
        self.mode
    }

    pub fn standard(&self) -> &StandardMacros {
        &self.standard
    }

    pub fn get(&self, name: &str) -> Option<&MultiMatch> {
        self.macros.get(name)
    }

    /// All macros in name order.
    pub fn iter(&self) -> impl Iterator<Item = &MultiMatch> {
        self.macros.values()
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }

    /// Compiles an ad-hoc snippet with the catalog's binding mode.
    pub fn compile(&self, snippet: &str) -> Result<MultiMatch, NavError> {
        Ok(MultiMatch::new(Template::parse(snippet)?, self.mode))
    }
}

// ============================================================================
// INTERNAL HELPERS
// ============================================================================

fn compose_menu_item_launch(
    macros: &BTreeMap<String, MultiMatch>,
    mode: BindingMode,
) -> Result<MultiMatch, NavError> {
    let template = |name: &str| {
        macros
            .get(name)
            .map(|m| m.template().clone())
            .ok_or_else(|| nav_err!(Catalog, "composite '{}' needs macro '{}'", MENU_ITEM_LAUNCH, name))
    };
    Ok(MultiMatch::new(template("installMenuItemClick")?, mode)
        .named(MENU_ITEM_LAUNCH)
        .with_sub_macro("$menuItem", template("getMenuItem")?)
        .with_sub_macro("$f", template("launchActivity")?))
}
