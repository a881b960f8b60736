//! Analysis session: the compiled macro catalog plus configuration.
//!
//! A session is built once and borrowed by every analyser and generator that
//! works on the same project. Building it compiles the catalog, so a session
//! that exists is a session whose macros are all valid.

use crate::{
    config::EngineConfig,
    macros::{MacroCatalog, StandardMacros},
    NavError,
};

#[derive(Debug, Clone)]
pub struct Session {
    config: EngineConfig,
    catalog: MacroCatalog,
}

impl Session {
    pub fn new(config: EngineConfig) -> Result<Self, NavError> {
        let catalog = MacroCatalog::load(config.binding_mode)?;
        Ok(Session { config, catalog })
    }

    pub fn with_defaults() -> Result<Self, NavError> {
        Self::new(EngineConfig::default())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &MacroCatalog {
        &self.catalog
    }

    /// Shorthand for `catalog().standard()`.
    pub fn macros(&self) -> &StandardMacros {
        self.catalog.standard()
    }
}
