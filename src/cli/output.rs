//! User-facing output for the CLI: serialized models, catalog listings,
//! match reports and colored diffs.

use std::io::{self, IsTerminal, Write};

use difference::{Changeset, Difference};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use super::args::Format;
use crate::{
    analysis::DiscoveryReport,
    macros::{MacroCatalog, NodeBindings},
    model::NavigationModel,
    nav_err, NavError,
};

// ============================================================================
// CORE OUTPUT FUNCTIONS
// ============================================================================

/// Serializes the model to stdout.
pub fn print_model(model: &NavigationModel, format: Format) -> Result<(), NavError> {
    let text = match format {
        Format::Json => serde_json::to_string_pretty(model)
            .map_err(|e| nav_err!(Project, "cannot serialize model: {}", e))?,
        Format::Yaml => serde_yaml::to_string(model)
            .map_err(|e| nav_err!(Project, "cannot serialize model: {}", e))?,
    };
    println!("{}", text.trim_end());
    Ok(())
}

/// One summary line on stderr, so stdout stays machine-readable.
pub fn print_report(report: &DiscoveryReport, model: &NavigationModel) {
    let mut stderr = stderr();
    let _ = stderr.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true));
    let _ = write!(stderr, "discovered");
    let _ = stderr.reset();
    let _ = writeln!(
        stderr,
        " {} states, {} transitions ({} generations, {} visited, {} skipped)",
        model.states().count(),
        model.transitions().count(),
        report.generations,
        report.visited,
        report.skipped
    );
}

pub fn print_catalog(catalog: &MacroCatalog, verbose: bool) {
    let mut stdout = stdout();
    println!("catalog version {}", catalog.version());
    for entry in catalog.iter() {
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true));
        print!("{}", entry.name());
        let _ = stdout.reset();
        println!("({})", entry.template().parameters().join(", "));
        for (slot, template) in entry.sub_macros() {
            println!("  {} <- {}", slot, template.name());
        }
        if verbose {
            println!("  {}", entry.template().text());
        }
    }
}

/// Prints each match and its bindings, one indented line per variable.
pub fn print_matches(matches: &[NodeBindings<'_>]) {
    let mut stdout = stdout();
    for (i, bindings) in matches.iter().enumerate() {
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true));
        println!("match {}", i + 1);
        let _ = stdout.reset();
        print_bindings(bindings, "");
    }
    println!("{} match(es)", matches.len());
}

/// Prints a line diff of one file with `+`/`-` markers.
pub fn print_file_diff(path: &str, before: &str, after: &str) {
    let mut stdout = stdout();
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true));
    println!("--- {path}");
    println!("+++ {path}");
    let _ = stdout.reset();
    let changeset = Changeset::new(before, after, "\n");
    print_diff(&mut stdout, &changeset.diffs);
    let _ = stdout.reset();
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

/// Colors only when the stream is a terminal.
fn color_choice(terminal: bool) -> ColorChoice {
    if terminal {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

fn stdout() -> StandardStream {
    StandardStream::stdout(color_choice(io::stdout().is_terminal()))
}

fn stderr() -> StandardStream {
    StandardStream::stderr(color_choice(io::stderr().is_terminal()))
}

fn print_bindings(bindings: &NodeBindings<'_>, prefix: &str) {
    for (name, node) in bindings.vars() {
        println!("  {}{} = {}", prefix, name, node.print());
    }
    for (slot, sub) in bindings.subs() {
        print_bindings(sub, &format!("{prefix}{slot}."));
    }
}

fn print_diff(stdout: &mut StandardStream, diffs: &[Difference]) {
    for diff in diffs {
        match diff {
            Difference::Same(ref x) => {
                let _ = stdout.reset();
                for line in x.lines() {
                    println!(" {}", line);
                }
            }
            Difference::Add(ref x) => {
                let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)));
                for line in x.lines() {
                    println!("+{}", line);
                }
            }
            Difference::Rem(ref x) => {
                let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)));
                for line in x.lines() {
                    println!("-{}", line);
                }
            }
        }
    }
}
