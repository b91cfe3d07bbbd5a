//! Command dispatch

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use tracing::{debug, instrument};

use crate::application::ApplicationError;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

/// Run the parsed command line.
pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let settings = load_settings(cli)?;
    match &cli.command {
        None => cmd_format(cli, settings, None),
        Some(Commands::Format { file }) => cmd_format(cli, settings, file.as_deref()),
        Some(Commands::Expr { notation, tree }) => cmd_expr(settings, notation, *tree),
        Some(Commands::Config { command }) => cmd_config(cli, &settings, command),
        Some(Commands::Completion { shell }) => cmd_completion(*shell),
    }
}

/// Layered settings with command line flags applied last.
pub fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load_file(path)?,
        None => Settings::load(Some(project_dir(cli)?.as_path()))?,
    };

    if cli.no_color {
        settings.colored = false;
    }
    if cli.show_types {
        settings.hide_types = false;
    }
    if let Some(max_lines) = cli.max_lines {
        settings.max_excerpt_lines = max_lines;
    }
    debug!(?settings, "effective settings");
    Ok(settings)
}

fn project_dir(cli: &Cli) -> CliResult<PathBuf> {
    match &cli.project_dir {
        Some(dir) => Ok(dir.clone()),
        None => std::env::current_dir()
            .map_err(|e| CliError::from(InfraError::io("determine current directory", e))),
    }
}

#[instrument(skip(cli, settings))]
fn cmd_format(cli: &Cli, mut settings: Settings, file: Option<&Path>) -> CliResult<()> {
    if !colored::control::SHOULD_COLORIZE.should_colorize() {
        settings.colored = false;
    }

    let mut container = ServiceContainer::new(settings);
    if let Some(dir) = &cli.project_dir {
        container = container.with_source_root(dir);
    }
    let formatter = container.formatter()?;

    let stdout = io::stdout();
    let summary = match file {
        Some(path) => {
            let input = File::open(path).map_err(|source| CliError::NoInput {
                path: path.to_path_buf(),
                source,
            })?;
            formatter.format_stream(BufReader::new(input), stdout.lock())?
        }
        None => formatter.format_stream(io::stdin().lock(), stdout.lock())?,
    };

    if summary.has_errors() {
        return Err(CliError::CompilerErrors(summary.errors));
    }
    Ok(())
}

#[instrument(skip(settings))]
fn cmd_expr(settings: Settings, notation: &str, tree: bool) -> CliResult<()> {
    let service = ServiceContainer::new(settings).expressions()?;

    if tree {
        let rewritten = service.tree(notation).map_err(ApplicationError::from)?;
        output::info(&rewritten.to_tree_string());
    } else {
        let pretty = service.prettify(notation).map_err(ApplicationError::from)?;
        output::info(&pretty);
    }
    Ok(())
}

fn cmd_config(cli: &Cli, settings: &Settings, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => output::info(&settings.to_toml()?),
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::action("global", &describe_path(&path)),
                None => output::warning("no home directory, global config disabled"),
            }
            match &cli.config {
                Some(path) => output::action("explicit", &describe_path(path)),
                None => output::action("local", &describe_path(&local_config_path(&project_dir(cli)?))),
            }
        }
        ConfigCommands::Template => output::info(&Settings::template()),
    }
    Ok(())
}

fn describe_path(path: &Path) -> String {
    if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (not found)", path.display())
    }
}

fn cmd_completion(shell: Shell) -> CliResult<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}
