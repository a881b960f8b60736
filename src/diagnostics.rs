//! Unified diagnostics for the navmacro engine.
//!
//! Every fallible operation in the crate returns [`NavError`]. The type derives
//! `miette::Diagnostic`, so the CLI can render it with source snippets and
//! labelled spans via `miette::Report`.
//!
//! # Error Construction
//!
//! - Use [`nav_err!`](crate::nav_err) for message-only variants:
//!   `nav_err!(Synthesis, "no class named '{}'", name)`
//! - Use [`NavError::parse`] when a source text and a byte span are at hand.
//! - Construct `Template`, `Config` and `Io` variants directly; they carry
//!   structured fields.

use std::{path::Path, sync::Arc};

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::ast::Span;

/// The single error type of the crate.
#[derive(Error, Diagnostic, Debug)]
pub enum NavError {
    #[error("Parse error: {message}")]
    #[diagnostic(code(navmacro::parse))]
    Parse {
        message: String,
        #[source_code]
        src: Arc<NamedSource<String>>,
        #[label("here")]
        span: SourceSpan,
        #[help]
        help: Option<String>,
    },

    #[error("Template error in '{name}': {message}")]
    #[diagnostic(code(navmacro::template))]
    Template { name: String, message: String },

    #[error("Macro catalog error: {message}")]
    #[diagnostic(
        code(navmacro::catalog),
        help("the bundled macro resources failed to compile; the catalog is unusable")
    )]
    Catalog { message: String },

    #[error("Instantiation error: {message}")]
    #[diagnostic(code(navmacro::instantiate))]
    Instantiation { message: String },

    #[error("Synthesis error: {message}")]
    #[diagnostic(code(navmacro::synthesis))]
    Synthesis { message: String },

    #[error("Project error: {message}")]
    #[diagnostic(code(navmacro::project))]
    Project { message: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(navmacro::config))]
    Config {
        message: String,
        #[source]
        source: Option<serde_yaml::Error>,
    },

    #[error("I/O error on '{path}': {source}")]
    #[diagnostic(code(navmacro::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl NavError {
    /// Builds a parse error pointing at `span` inside `source`.
    pub fn parse(
        message: impl Into<String>,
        name: &str,
        source: &str,
        span: Span,
        help: Option<String>,
    ) -> Self {
        NavError::Parse {
            message: message.into(),
            src: Arc::new(NamedSource::new(name, source.to_string())),
            span: to_source_span(span),
            help,
        }
    }

    pub fn io(path: &Path, source: std::io::Error) -> Self {
        NavError::Io {
            path: path.display().to_string(),
            source,
        }
    }

    pub fn config(message: impl Into<String>, source: Option<serde_yaml::Error>) -> Self {
        NavError::Config {
            message: message.into(),
            source,
        }
    }

    pub fn template(name: impl Into<String>, message: impl Into<String>) -> Self {
        NavError::Template {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Converts a crate span into a miette span.
pub fn to_source_span(span: Span) -> SourceSpan {
    let len = span.end.saturating_sub(span.start);
    SourceSpan::new(span.start.into(), len)
}

/// Builds a message-only [`NavError`] variant.
///
/// # Examples
///
/// ```rust
/// use navmacro::nav_err;
/// let err = nav_err!(Synthesis, "no class named '{}'", "com.example.Main");
/// assert!(matches!(err, navmacro::NavError::Synthesis { .. }));
/// assert!(err.to_string().contains("com.example.Main"));
/// ```
#[macro_export]
macro_rules! nav_err {
    ($variant:ident, $msg:expr) => {
        $crate::NavError::$variant {
            message: $msg.to_string(),
        }
    };
    ($variant:ident, $fmt:expr, $($arg:expr),+ $(,)?) => {
        $crate::NavError::$variant {
            message: format!($fmt, $($arg),+),
        }
    };
}
