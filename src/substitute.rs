//! Placeholder substitution in files written into a definition.
//!
//! Values come from the target manifest as it is at the time of writing, so
//! callers build a fresh [`SubstitutionContext`] before every write.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use log::debug;
use regex::{Captures, Regex};
use walkdir::WalkDir;

use crate::constants::{HOME_TOKEN, NAME_TOKEN, ROOT_USER, USER_NAME_TOKEN};
use crate::document::Document;
use crate::error::{Error, Result};
use crate::manifest::{read_name, read_remote_user};

/// Values for the three substitution tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionContext {
    pub name: String,
    pub user_name: String,
    pub home_folder: String,
}

impl SubstitutionContext {
    /// Builds a context, deriving the home folder from `user_name`.
    pub fn new<S: Into<String>, U: Into<String>>(name: S, user_name: U) -> Self {
        let user_name = user_name.into();
        let home_folder = home_folder(&user_name);
        Self { name: name.into(), user_name, home_folder }
    }

    /// Reads the name and remote user from a manifest; an unset or empty
    /// `remoteUser` means root.
    pub fn from_manifest(manifest: &Document) -> Self {
        let user_name =
            read_remote_user(manifest).filter(|user| !user.is_empty()).unwrap_or(ROOT_USER.into());
        Self::new(read_name(manifest).unwrap_or_default(), user_name)
    }

    pub fn from_manifest_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::from_manifest(&Document::load(path)?))
    }
}

/// `/root` for the root account, `/home/<user>` otherwise.
pub fn home_folder(user_name: &str) -> String {
    if user_name == ROOT_USER {
        "/root".to_string()
    } else {
        format!("/home/{user_name}")
    }
}

static TOKEN_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    let tokens = [NAME_TOKEN, USER_NAME_TOKEN, HOME_TOKEN].map(regex::escape);
    Regex::new(&tokens.join("|")).ok()
});

/// Replaces every substitution token in `text` in a single pass, so values
/// that look like tokens are written as they are.
pub fn substitute(text: &str, context: &SubstitutionContext) -> String {
    let Some(pattern) = TOKEN_PATTERN.as_ref() else {
        return text.to_string();
    };
    pattern
        .replace_all(text, |caps: &Captures| match &caps[0] {
            NAME_TOKEN => context.name.clone(),
            USER_NAME_TOKEN => context.user_name.clone(),
            _ => context.home_folder.clone(),
        })
        .into_owned()
}

/// Substitutes tokens in a file, rewriting it only when something changed.
///
/// Files that are not valid UTF-8 are left alone.
pub fn substitute_file<P: AsRef<Path>>(path: P, context: &SubstitutionContext) -> Result<()> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(Error::IoError)?;
    let Ok(text) = String::from_utf8(bytes) else {
        debug!("Skipping substitution in binary file '{}'", path.display());
        return Ok(());
    };
    let substituted = substitute(&text, context);
    if substituted != text {
        debug!("Substituted values in '{}'", path.display());
        fs::write(path, substituted).map_err(Error::IoError)?;
    }
    Ok(())
}

/// Substitutes tokens in every file below `folder`.
pub fn substitute_tree<P: AsRef<Path>>(folder: P, context: &SubstitutionContext) -> Result<()> {
    for entry in WalkDir::new(folder.as_ref()) {
        let entry = entry?;
        if entry.file_type().is_file() {
            substitute_file(entry.path(), context)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn context() -> SubstitutionContext {
        SubstitutionContext {
            name: "demo".to_string(),
            user_name: "dcuser".to_string(),
            home_folder: "/home/dcuser".to_string(),
        }
    }

    #[test]
    fn test_substitutes_user_name() {
        assert_eq!(substitute("ENV U=__DEVCONTAINER_USER_NAME__", &context()), "ENV U=dcuser");
    }

    #[test]
    fn test_substitutes_all_tokens_and_leaves_unknown() {
        let text = "__DEVCONTAINER_NAME__ __DEVCONTAINER_HOME__/x __DEVCONTAINER_OTHER__";
        assert_eq!(substitute(text, &context()), "demo /home/dcuser/x __DEVCONTAINER_OTHER__");
    }

    #[test]
    fn test_values_are_not_substituted_again() {
        let context = SubstitutionContext::new("__DEVCONTAINER_USER_NAME__", "vscode");
        assert_eq!(
            substitute("NAME=__DEVCONTAINER_NAME__ USER=__DEVCONTAINER_USER_NAME__", &context),
            "NAME=__DEVCONTAINER_USER_NAME__ USER=vscode"
        );

        let context = SubstitutionContext::new("n", "__DEVCONTAINER_HOME__");
        assert_eq!(
            substitute("__DEVCONTAINER_USER_NAME__:__DEVCONTAINER_HOME__", &context),
            "__DEVCONTAINER_HOME__:/home/__DEVCONTAINER_HOME__"
        );
    }

    #[test]
    fn test_home_folder() {
        assert_eq!(SubstitutionContext::new("n", "root").home_folder, "/root");
        assert_eq!(SubstitutionContext::new("n", "vscode").home_folder, "/home/vscode");
    }

    #[test]
    fn test_context_defaults_to_root() {
        let manifest = Document::parse(r#"{"name": "x", "remoteUser": ""}"#).unwrap();
        assert_eq!(SubstitutionContext::from_manifest(&manifest), SubstitutionContext::new("x", "root"));

        let manifest = Document::parse(r#"{"remoteUser": "vscode"}"#).unwrap();
        assert_eq!(
            SubstitutionContext::from_manifest(&manifest),
            SubstitutionContext::new("", "vscode")
        );
    }

    #[test]
    fn test_substitute_tree_skips_binary_files() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("scripts");
        fs::create_dir(&nested).unwrap();
        fs::write(nested.join("a.sh"), "echo __DEVCONTAINER_NAME__").unwrap();
        fs::write(temp_dir.path().join("blob"), [0xff_u8, 0xfe, 0x00]).unwrap();

        substitute_tree(temp_dir.path(), &context()).unwrap();

        assert_eq!(fs::read_to_string(nested.join("a.sh")).unwrap(), "echo demo");
        assert_eq!(fs::read(temp_dir.path().join("blob")).unwrap(), vec![0xff, 0xfe, 0x00]);
    }
}
