//! Command dispatch for the `deftree` binary

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use crate::application::{hash, ApplicationResult, Document};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{NodeId, Tree};
use crate::tree_traits::TreeDisplay;

pub fn execute(cli: &Cli) -> CliResult<()> {
    let project_dir = match &cli.project_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().map_err(|e| {
            CliError::InvalidArgs(format!("cannot determine current directory: {e}"))
        })?,
    };

    match &cli.command {
        Some(Commands::Dump { file }) => cmd_dump(file),
        Some(Commands::Validate { path }) => {
            let settings = Settings::load(Some(&project_dir))?;
            cmd_validate(path, &settings)
        }
        Some(Commands::Tree { file, attributes }) => cmd_tree(file, *attributes),
        Some(Commands::Get {
            file,
            attribute,
            element,
        }) => cmd_get(file, attribute, element.as_deref()),
        Some(Commands::Set {
            file,
            attribute,
            value,
            element,
            output,
        }) => cmd_set(file, attribute, value, element.as_deref(), output.as_deref()),
        Some(Commands::Config { command }) => cmd_config(command, &project_dir),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            generate(*shell, &mut cmd, "deftree", &mut io::stdout());
            Ok(())
        }
        None => {
            let mut cmd = Cli::command();
            cmd.print_help()
                .map_err(|e| CliError::InvalidArgs(e.to_string()))?;
            Ok(())
        }
    }
}

#[instrument]
fn cmd_dump(file: &Path) -> CliResult<()> {
    Document::parse(file)?.dump()?;
    Ok(())
}

#[instrument(skip(settings))]
fn cmd_validate(path: &Path, settings: &Settings) -> CliResult<()> {
    if !path.exists() {
        return Err(CliError::InvalidArgs(format!(
            "path does not exist: {}",
            path.display()
        )));
    }

    let files = collect_files(path, settings);
    if files.is_empty() {
        output::warning(&format!("no matching files under {}", path.display()));
        return Ok(());
    }

    let mut failed = 0;
    for file in &files {
        match round_trips(file) {
            Ok(true) => output::success(&file.display()),
            Ok(false) => {
                failed += 1;
                output::failure(&format!("{}: output differs from input", file.display()));
            }
            Err(e) => {
                failed += 1;
                output::failure(&e);
            }
        }
    }

    if failed > 0 {
        return Err(CliError::ValidationFailed {
            failed,
            total: files.len(),
        });
    }
    Ok(())
}

/// A single file as given, or every wanted file below a directory.
fn collect_files(path: &Path, settings: &Settings) -> Vec<PathBuf> {
    if path.is_file() {
        return vec![path.to_path_buf()];
    }

    WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !entry.file_name().to_str().is_some_and(|name| settings.skips_dir(name))
        })
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("skipping unreadable entry: {e}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && settings.wants_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect()
}

fn round_trips(file: &Path) -> ApplicationResult<bool> {
    let document = Document::parse(file)?;
    let text = document.serialize()?;
    debug!(path = %file.display(), "validating round trip");
    hash::validate(&text, &file.to_string_lossy())
}

#[instrument]
fn cmd_tree(file: &Path, attributes: bool) -> CliResult<()> {
    let document = Document::parse(file)?;
    let rendered = document.tree().to_termtree(document.root(), attributes)?;
    output::header(&file.display());
    output::info(&rendered);
    Ok(())
}

/// Attributes named `attribute`, optionally only those under an element named `element`.
fn matching_attributes(tree: &Tree, attribute: &str, element: Option<&str>) -> Vec<NodeId> {
    tree.iter_attributes(tree.root(), Some(attribute))
        .filter(|&id| match element {
            None => true,
            Some(element) => tree
                .parent(id)
                .and_then(|parent| tree.name(parent).ok())
                .is_some_and(|name| name == element),
        })
        .collect()
}

/// Slash separated element names from below the root down to `node`.
fn node_path(tree: &Tree, node: NodeId) -> String {
    let mut names: Vec<&str> = tree
        .ancestors(node)
        .filter(|&id| id != tree.root())
        .filter_map(|id| tree.name(id).ok())
        .collect();
    names.reverse();
    names.extend(tree.name(node).ok());
    names.join("/")
}

#[instrument]
fn cmd_get(file: &Path, attribute: &str, element: Option<&str>) -> CliResult<()> {
    let document = Document::parse(file)?;
    let tree = document.tree();
    let matches = matching_attributes(tree, attribute, element);
    if matches.is_empty() {
        return Err(CliError::NoMatch(attribute.to_string()));
    }
    for id in matches {
        output::info(&format!("{}: {}", node_path(tree, id), tree.value(id)?));
    }
    Ok(())
}

#[instrument]
fn cmd_set(
    file: &Path,
    attribute: &str,
    value: &str,
    element: Option<&str>,
    output_path: Option<&Path>,
) -> CliResult<()> {
    let mut document = Document::parse(file)?;
    let matches = matching_attributes(document.tree(), attribute, element);
    if matches.is_empty() {
        return Err(CliError::NoMatch(attribute.to_string()));
    }

    let tree = document.tree_mut();
    for &id in &matches {
        tree.set_value(id, value)?;
    }
    document.write(output_path)?;

    let target = output_path.unwrap_or(file);
    output::success(&format!(
        "updated {} attribute(s) in {}",
        matches.len(),
        target.display()
    ));
    Ok(())
}

fn cmd_config(command: &ConfigCommands, project_dir: &Path) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(Some(project_dir))?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Template => {
            output::info(&Settings::template());
        }
        ConfigCommands::Path => {
            output::header("Config files");
            match global_config_path() {
                Some(path) => print_config_path("global", &path),
                None => output::detail("global: (no config directory)"),
            }
            print_config_path("local", &local_config_path(project_dir));
        }
    }
    Ok(())
}

fn print_config_path(label: &str, path: &Path) {
    if path.exists() {
        output::success_detail(&format!("{label}: {}", path.display()));
    } else {
        output::detail(&format!("{label}: {} (not found)", path.display()));
    }
}
