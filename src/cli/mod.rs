//! The navmacro command-line interface.
//!
//! Parses arguments, sets up logging, dispatches to a handler and renders any
//! error as a miette report before exiting with status 1.

use std::{fs, path::Path, process};

use clap::Parser;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing_subscriber::EnvFilter;

use crate::{
    analysis::{search_all, Analyser, UnknownEvaluator},
    cli::args::{Command, Format, NavArgs},
    codegen::{CodeGenerator, SynthesisOutcome},
    config::EngineConfig,
    macros::BindingMode,
    model::{Locator, NavigationModel, State, Transition},
    nav_err,
    project::{load_project, read_descriptor, save_project, LoadedProject, ProjectHost, ProjectIndex},
    session::Session,
    syntax, NavError,
};

pub mod args;
pub mod output;

/// `activity:<class>` or `menu:<name>`.
static STATE_ARG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(activity|menu):([A-Za-z_$][\w$.]*)$").expect("state argument pattern"));

/// The main entry point for the CLI.
pub fn run() {
    let args = NavArgs::parse();
    init_tracing(&args);

    let result = match args.command {
        Command::Derive { dir, format, strict } => handle_derive(&dir, format, strict),
        Command::Macros { verbose } => handle_macros(verbose),
        Command::Match {
            snippet,
            file,
            strict,
        } => handle_match(&snippet, &file, strict),
        Command::Implement {
            dir,
            from,
            to,
            view,
            write,
        } => handle_implement(&dir, &from, &to, view, write),
    };

    if let Err(e) = result {
        eprintln!("{:?}", miette::Report::new(e));
        process::exit(1);
    }
}

// ============================================================================
// COMMAND HANDLERS
// ============================================================================

fn handle_derive(dir: &Path, format: Format, strict: bool) -> Result<(), NavError> {
    let project = load_project(dir)?;
    let session = Session::new(engine_config(&project, strict))?;
    let mut model = NavigationModel::new();
    let report = Analyser::new(&session, &project.sources)?.derive_all_states_and_transitions(&mut model);
    output::print_model(&model, format)?;
    output::print_report(&report, &model);
    Ok(())
}

fn handle_macros(verbose: bool) -> Result<(), NavError> {
    let session = Session::with_defaults()?;
    output::print_catalog(session.catalog(), verbose);
    Ok(())
}

fn handle_match(snippet: &Path, file: &Path, strict: bool) -> Result<(), NavError> {
    let snippet_text = fs::read_to_string(snippet).map_err(|e| NavError::io(snippet, e))?;
    let source = fs::read_to_string(file).map_err(|e| NavError::io(file, e))?;
    let config = EngineConfig::default().with_binding_mode(binding_mode(strict));
    let session = Session::new(config)?;
    let matcher = session.catalog().compile(&snippet_text)?;
    let tree = syntax::parse_compilation_unit(&source, &file.display().to_string())?;
    let matches = search_all(tree.root_ref(), &UnknownEvaluator, &matcher);
    output::print_matches(&matches);
    Ok(())
}

fn handle_implement(
    dir: &Path,
    from: &str,
    to: &str,
    view: Option<String>,
    write: bool,
) -> Result<(), NavError> {
    let mut project = load_project(dir)?;
    let session = Session::new(project.config.clone())?;

    let mut model = NavigationModel::new();
    Analyser::new(&session, &project.sources)?.derive_all_states_and_transitions(&mut model);
    let source = state_arg(from, &project, &model, None)?;
    let owner = match &source {
        State::Activity(activity) => Some(activity.class_name.as_str()),
        State::Menu(_) => None,
    };
    let destination = state_arg(to, &project, &model, owner)?;
    let source = match view {
        Some(view) => Locator::with_view(source, view),
        None => Locator::of(source),
    };
    let transition = Transition::click(source, Locator::of(destination));

    let original = project.sources.clone();
    let outcome = CodeGenerator::new(&session, &mut project.sources)?.implement_transition(&transition)?;
    let SynthesisOutcome::Inserted { path, .. } = outcome else {
        println!("nothing to implement for {} -> {}", from, to);
        return Ok(());
    };

    let before = original.file_text(&path).unwrap_or_default();
    let after = project.sources.file_text(&path).unwrap_or_default();
    output::print_file_diff(&path, &before, &after);
    if write {
        for written in save_project(&project)? {
            println!("wrote {}", written.display());
        }
    }
    Ok(())
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

/// `--log`, then `RUST_LOG`, then the project's `engine.log-filter`, then
/// the default filter.
fn init_tracing(args: &NavArgs) {
    let project_filter = || {
        let dir = match &args.command {
            Command::Derive { dir, .. } | Command::Implement { dir, .. } => dir,
            _ => return None,
        };
        read_descriptor(dir).ok().map(|d| d.engine.log_filter)
    };
    let filter = match &args.log {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(project_filter().unwrap_or_else(|| EngineConfig::default().log_filter))
        }),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn binding_mode(strict: bool) -> BindingMode {
    if strict {
        BindingMode::Strict
    } else {
        BindingMode::Lenient
    }
}

fn engine_config(project: &LoadedProject, strict: bool) -> EngineConfig {
    if strict {
        project.config.clone().with_binding_mode(BindingMode::Strict)
    } else {
        project.config.clone()
    }
}

/// Parses a `kind:name` state argument. Activity names are qualified with
/// the manifest package. Menus take their owner from the derived model, or
/// from `owner` when the menu is not inflated yet.
fn state_arg(
    arg: &str,
    project: &LoadedProject,
    model: &NavigationModel,
    owner: Option<&str>,
) -> Result<State, NavError> {
    let Some(captures) = STATE_ARG.captures(arg) else {
        return Err(NavError::config(
            format!("invalid state '{arg}': expected activity:<class> or menu:<name>"),
            None,
        ));
    };
    let name = &captures[2];
    if &captures[1] == "activity" {
        let qualified = project
            .sources
            .manifest()
            .qualify(name)
            .unwrap_or_else(|| name.to_string());
        return Ok(State::activity(qualified));
    }
    match (model.find_state(&State::menu(name, "")), owner) {
        (Some(state), _) => Ok(state.clone()),
        (None, Some(owner)) => Ok(State::menu(name, owner)),
        (None, None) => Err(nav_err!(
            Project,
            "menu '{}' is not inflated by any reachable activity",
            name
        )),
    }
}
