//! Snippet language front end: grammar, tree builder and printer.

pub mod parser;
pub mod printer;

pub use parser::{
    parse_compilation_unit, parse_expression, parse_method, parse_signature, parse_snippets,
    parse_statement,
};
pub use printer::{print_compact, print_source};
