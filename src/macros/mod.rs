//! # Macro unification and instantiation
//!
//! Macros are snippet methods whose single statement is a pattern over the
//! syntax tree. The pipeline has four layers, each depending only on the ones
//! before it:
//!
//! - [`template`]: compiles a snippet into a [`Template`].
//! - [`unifier`]: matches a template against a candidate subtree, producing
//!   [`Bindings`].
//! - [`multimatch`]: a template plus named sub-templates, matched together.
//! - [`instantiate`]: turns a template and bindings back into a tree or text.
//!
//! [`catalog`] loads the bundled macro resources into a [`MacroCatalog`].

pub mod bindings;
pub mod catalog;
pub mod instantiate;
pub mod multimatch;
pub mod template;
pub mod unifier;

pub use bindings::{Bindings, NodeBindings, TextBindings};
pub use catalog::{MacroCatalog, StandardMacros, MENU_ITEM_LAUNCH};
pub use instantiate::{instantiate, instantiate_text};
pub use multimatch::MultiMatch;
pub use template::Template;
pub use unifier::{BindingMode, Unifier};
