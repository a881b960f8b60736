//! # navmacro
//!
//! Structural macros over a small Java-like snippet language, and the two
//! tools built on them: an analyser that derives a screen navigation graph
//! from a project, and a code generator that writes navigation code back.
//!
//! - [`macros`]: templates, unification, composite matches, instantiation
//!   and the bundled catalog.
//! - [`analysis`]: worklist discovery over reachable activities.
//! - [`codegen`]: transition synthesis into source trees.
//! - [`project`]: the project snapshot the two tools work against.

pub use crate::diagnostics::NavError;

pub mod analysis;
pub mod ast;
pub mod cli;
pub mod codegen;
pub mod config;
pub mod diagnostics;
pub mod macros;
pub mod model;
pub mod project;
pub mod session;
pub mod syntax;
