//! Entry point of the devcontainer tool.
//! Parses the command line, loads the configuration once and dispatches to
//! discovery and composition.

use devcontainer::{
    cli::{get_args, Args, Command, ConfigCommand, SnippetCommand, TemplateCommand},
    compose::Composer,
    config::{config_path, Config},
    discovery::Discovery,
    error::{default_error_handler, Result},
};

/// Main application entry point.
fn main() {
    let args = get_args();

    // Logger configuration
    env_logger::Builder::new()
        .filter_level(if args.verbose {
            log::LevelFilter::Trace
        } else {
            log::LevelFilter::Off
        })
        .init();

    if let Err(err) = run(args) {
        default_error_handler(err);
    }
}

fn run(args: Args) -> Result<()> {
    let config = Config::load()?;
    match args.command {
        Command::Template(command) => run_template(&config, command),
        Command::Snippet(command) => run_snippet(&config, command),
        Command::Config(command) => run_config(&config, command),
    }
}

fn print_listing<'a, I>(rows: I, paths: bool)
where
    I: IntoIterator<Item = (&'a str, std::path::Display<'a>)>,
{
    if paths {
        println!("NAME\tPATH");
    }
    for (name, path) in rows {
        if paths {
            println!("{name}\t{path}");
        } else {
            println!("{name}");
        }
    }
}

fn run_template(config: &Config, command: TemplateCommand) -> Result<()> {
    match command {
        TemplateCommand::List { paths } => {
            let templates = Discovery::new(config).templates()?;
            print_listing(templates.iter().map(|t| (t.name.as_str(), t.path.display())), paths);
        }
        TemplateCommand::Add { name, devcontainer_name, project_folder } => {
            let target = Composer::new(config).instantiate_template(
                &name,
                &project_folder,
                devcontainer_name.as_deref(),
            )?;
            println!("Added template '{}' in '{}'.", name, target.display());
        }
        TemplateCommand::AddLink { name, project_folder } => {
            let target = Composer::new(config).link_template(&name, &project_folder)?;
            println!("Linked template '{}' in '{}'.", name, target.display());
        }
    }
    Ok(())
}

fn run_snippet(config: &Config, command: SnippetCommand) -> Result<()> {
    match command {
        SnippetCommand::List { paths } => {
            let snippets = Discovery::new(config).snippets()?;
            print_listing(snippets.iter().map(|s| (s.name.as_str(), s.path.display())), paths);
        }
        SnippetCommand::Add { name, project_folder } => {
            Composer::new(config).apply_snippet(&name, &project_folder)?;
            println!("Added snippet '{}' to '{}'.", name, project_folder.display());
        }
    }
    Ok(())
}

fn run_config(config: &Config, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => println!("{}", config.to_pretty_json()?),
        ConfigCommand::Write => {
            let path = config_path()?;
            config.save_to(&path)?;
            println!("Configuration written to '{}'.", path.display());
        }
    }
    Ok(())
}
