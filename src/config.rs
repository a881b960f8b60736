//! Engine configuration.
//!
//! Read from the `engine:` section of a project's `navmacro.yaml`; every
//! field is optional. CLI flags override individual fields.

use serde::{Deserialize, Serialize};

use crate::{macros::BindingMode, NavError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct EngineConfig {
    /// How repeated pattern variables bind.
    pub binding_mode: BindingMode,
    /// `tracing-subscriber` filter directive used by the CLI.
    pub log_filter: String,
    /// Whether menu-item searches also visit the activity's superclasses.
    pub menu_search_superclasses: bool,
    /// Layout root tag marking a screen without content.
    pub empty_layout_tag: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            binding_mode: BindingMode::Lenient,
            log_filter: "warn".to_string(),
            menu_search_superclasses: true,
            empty_layout_tag: "Space".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, NavError> {
        serde_yaml::from_str(text)
            .map_err(|e| NavError::config("invalid engine configuration", Some(e)))
    }

    pub fn with_binding_mode(mut self, mode: BindingMode) -> Self {
        self.binding_mode = mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = EngineConfig::from_yaml_str("binding-mode: strict\n").unwrap();
        assert_eq!(config.binding_mode, BindingMode::Strict);
        assert_eq!(config.empty_layout_tag, "Space");
        assert!(config.menu_search_superclasses);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = EngineConfig::from_yaml_str("binding_mode: strict\n").unwrap_err();
        assert!(matches!(err, NavError::Config { .. }));
    }
}
