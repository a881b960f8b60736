//! Command-line arguments and subcommands for the navmacro CLI.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "navmacro",
    version,
    about = "Navigation-graph discovery and code synthesis by structural macro matching."
)]
pub struct NavArgs {
    /// Log filter directive, e.g. `info` or `navmacro::analysis=debug`.
    /// Overrides `RUST_LOG` and the project's `engine.log-filter`.
    #[arg(long, global = true, value_name = "FILTER")]
    pub log: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Derive the navigation model of a project and print it.
    Derive {
        /// Project directory containing `navmacro.yaml`.
        #[arg(required = true)]
        dir: PathBuf,
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
        /// Require repeated pattern variables to bind equal subtrees.
        #[arg(long)]
        strict: bool,
    },
    /// List the bundled macro catalog.
    Macros {
        /// Print each macro's parameters and body.
        #[arg(long, short)]
        verbose: bool,
    },
    /// Run an ad-hoc macro over a source file and print the bindings.
    Match {
        /// File holding one snippet method.
        #[arg(required = true)]
        snippet: PathBuf,
        /// Source file to search.
        #[arg(required = true)]
        file: PathBuf,
        #[arg(long)]
        strict: bool,
    },
    /// Synthesize the code for one transition.
    Implement {
        #[arg(required = true)]
        dir: PathBuf,
        /// Source state: `activity:<class>` or `menu:<name>`.
        #[arg(long, required = true)]
        from: String,
        /// Destination state: `activity:<class>` or `menu:<name>`.
        #[arg(long, required = true)]
        to: String,
        /// View (menu item id) on the source state.
        #[arg(long)]
        view: Option<String>,
        /// Save the edited files instead of only printing the diff.
        #[arg(long)]
        write: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Yaml,
}
