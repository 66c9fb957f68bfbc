//! Tool configuration: where templates and snippets are searched for.
//!
//! The configuration is loaded once at start-up and handed by reference to
//! whatever needs it. The file may carry `//` comments and trailing commas.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use log::debug;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::constants::{CONFIG_ENV_VAR, CONFIG_FILE, CONFIG_FOLDER};
use crate::document::Document;
use crate::error::{Error, Result};
use crate::files::write_file;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Folders searched for templates, highest priority first.
    pub template_paths: Vec<String>,
    /// Folders searched for snippets, highest priority first.
    pub snippet_paths: Vec<String>,
    /// Not read by the tool; kept so existing configuration files round-trip.
    pub experimental: bool,
}

/// Location of the configuration file.
///
/// `DEVCONTAINER_CLI_CONFIG` overrides the default of
/// `~/.devcontainer-cli/devcontainer-cli.json`.
pub fn config_path() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR).filter(|path| !path.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    let home = dirs::home_dir()
        .ok_or_else(|| Error::ConfigError("Could not determine the home directory".to_string()))?;
    Ok(home.join(CONFIG_FOLDER).join(CONFIG_FILE))
}

static ENV_REFERENCE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)").ok()
});

/// Expands `$VAR` and `${VAR}` from the environment and a leading `~/`.
///
/// Unset variables expand to nothing.
pub fn expand_path(path: &str) -> Result<PathBuf> {
    let pattern = ENV_REFERENCE
        .as_ref()
        .ok_or_else(|| Error::ConfigError("Invalid environment reference pattern".to_string()))?;
    let expanded = pattern.replace_all(path, |caps: &Captures| {
        let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        std::env::var(name).unwrap_or_default()
    });

    match expanded.strip_prefix("~/") {
        Some(rest) => {
            let home = dirs::home_dir().ok_or_else(|| {
                Error::ConfigError("Could not determine the home directory".to_string())
            })?;
            Ok(home.join(rest))
        }
        None => Ok(PathBuf::from(&*expanded)),
    }
}

fn expand_paths(paths: &[String]) -> Result<Vec<PathBuf>> {
    paths.iter().map(|path| expand_path(path)).collect()
}

impl Config {
    pub fn new(template_paths: Vec<String>, snippet_paths: Vec<String>) -> Self {
        Self { template_paths, snippet_paths, experimental: false }
    }

    /// Loads the configuration from [`config_path`].
    pub fn load() -> Result<Self> {
        Self::load_from(config_path()?)
    }

    /// Loads the configuration at `path`; a missing file gives the default.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No configuration at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        debug!("Loading configuration from {}", path.display());
        let text = std::fs::read_to_string(path).map_err(Error::IoError)?;
        Self::parse(&text, &path.display().to_string())
    }

    pub fn parse(text: &str, source_name: &str) -> Result<Self> {
        let value = Document::parse_named(text, source_name)?.to_json()?;
        serde_json::from_value(value)
            .map_err(|e| Error::ConfigError(format!("Invalid configuration in {source_name}: {e}")))
    }

    pub fn to_pretty_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::ConfigError(e.to_string()))
    }

    /// Writes the configuration to `path`, creating its folder.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        debug!("Writing configuration to {}", path.display());
        write_file(path, &(self.to_pretty_json()? + "\n"))
    }

    /// Template search paths with environment references expanded.
    pub fn template_search_paths(&self) -> Result<Vec<PathBuf>> {
        expand_paths(&self.template_paths)
    }

    /// Snippet search paths with environment references expanded.
    pub fn snippet_search_paths(&self) -> Result<Vec<PathBuf>> {
        expand_paths(&self.snippet_paths)
    }
}
