//! Command-line interface for the devcontainer tool.
//! Provides argument parsing and help text formatting using clap.

use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments structure.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "devcontainer: compose dev container definitions from templates and snippets",
    long_about = None
)]
pub struct Args {
    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Work with devcontainer templates
    #[command(subcommand)]
    Template(TemplateCommand),

    /// Work with devcontainer snippets
    #[command(subcommand)]
    Snippet(SnippetCommand),

    /// Show or write the tool configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
pub enum TemplateCommand {
    /// List available templates
    List {
        /// Also show where each template lives
        #[arg(long)]
        paths: bool,
    },

    /// Copy a template into the project's .devcontainer folder
    Add {
        /// Name of the template
        #[arg(value_name = "NAME")]
        name: String,

        /// Name for the new definition (defaults to the project folder name)
        #[arg(long, value_name = "NAME")]
        devcontainer_name: Option<String>,

        /// Project folder to add the definition to
        #[arg(long, value_name = "DIR", default_value = ".")]
        project_folder: PathBuf,
    },

    /// Symlink a template into the project's .devcontainer folder
    AddLink {
        /// Name of the template
        #[arg(value_name = "NAME")]
        name: String,

        /// Project folder to add the definition to
        #[arg(long, value_name = "DIR", default_value = ".")]
        project_folder: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum SnippetCommand {
    /// List available snippets
    List {
        /// Also show where each snippet lives
        #[arg(long)]
        paths: bool,
    },

    /// Add a snippet to the project's definition
    Add {
        /// Name of the snippet
        #[arg(value_name = "NAME")]
        name: String,

        /// Project folder holding the definition
        #[arg(long, value_name = "DIR", default_value = ".")]
        project_folder: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Write the effective configuration to the configuration file
    Write,
}

/// Parses command line arguments and returns the Args structure.
///
/// # Exits
/// * With status code 1 after printing help if a subcommand or argument is missing
/// * With clap's default error handling for other argument errors
pub fn get_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::MissingRequiredArgument
            | ErrorKind::MissingSubcommand
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                let _ = Args::command()
                    .help_template(
                        r#"{about-section}
{usage-heading} {usage}

{all-args}
{after-help}
"#,
                    )
                    .print_help();
                std::process::exit(1);
            }
            _ => e.exit(),
        },
    }
}
