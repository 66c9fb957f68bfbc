//! Creating definitions from templates and layering snippets onto them.
//!
//! Every write is followed by a substitution pass using values read from the
//! project manifest at that moment. Snippet actions are applied one at a time
//! and nothing is rolled back when a later action fails.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::config::Config;
use crate::constants::{
    BUILD_SCRIPT_FILE, DEFINITION_FOLDER, MANIFEST_FILE, SCRIPTS_FOLDER, SNIPPET_MANIFEST_FILE,
};
use crate::discovery::{Discovery, SnippetDescriptor, SnippetKind, TemplateDescriptor};
use crate::dockerfile::{copy_and_run_block, insert_snippet_into_file};
use crate::error::{Error, Result};
use crate::files::{copy_file, copy_tree, link_tree, make_executable, write_file};
use crate::manifest::{find_manifest, set_name_in_file};
use crate::merge::merge_files;
use crate::snippet::{SnippetAction, SnippetContent, SnippetManifest};
use crate::substitute::{substitute_file, substitute_tree, SubstitutionContext};

/// Applies templates and snippets found through a [`Config`].
pub struct Composer<'a> {
    discovery: Discovery<'a>,
}

impl<'a> Composer<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { discovery: Discovery::new(config) }
    }

    /// Copies the named template into `project_folder`.
    ///
    /// See [`instantiate_template`].
    pub fn instantiate_template<P: AsRef<Path>>(
        &self,
        template_name: &str,
        project_folder: P,
        name: Option<&str>,
    ) -> Result<PathBuf> {
        let template = self.discovery.template(template_name)?;
        instantiate_template(&template, project_folder, name)
    }

    /// Links the named template into `project_folder`.
    ///
    /// See [`link_template`].
    pub fn link_template<P: AsRef<Path>>(&self, template_name: &str, project_folder: P) -> Result<PathBuf> {
        let template = self.discovery.template(template_name)?;
        link_template(&template, project_folder)
    }

    /// Applies the named snippet to the definition in `project_folder`.
    pub fn apply_snippet<P: AsRef<Path>>(&self, snippet_name: &str, project_folder: P) -> Result<()> {
        let snippet = self.discovery.snippet(snippet_name)?;
        apply_snippet(&snippet, project_folder)
    }
}

fn definition_folder(project_folder: &Path) -> Result<PathBuf> {
    let target = project_folder.join(DEFINITION_FOLDER);
    if target.exists() {
        return Err(Error::ConflictError { path: target.display().to_string() });
    }
    Ok(target)
}

/// Name of the project folder itself, resolving `.` and friends.
fn project_name(project_folder: &Path) -> Result<String> {
    let absolute = fs::canonicalize(project_folder).map_err(Error::IoError)?;
    absolute
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            Error::NotFoundError(format!("No folder name for '{}'", project_folder.display()))
        })
}

/// Copies a template into `<project_folder>/.devcontainer`, names it and
/// substitutes tokens in every copied file.
///
/// The name defaults to the project folder's name.
///
/// # Errors
/// * `Error::ConflictError` if the project already has a definition folder
pub fn instantiate_template<P: AsRef<Path>>(
    template: &TemplateDescriptor,
    project_folder: P,
    name: Option<&str>,
) -> Result<PathBuf> {
    let project_folder = project_folder.as_ref();
    let target = definition_folder(project_folder)?;
    let name = match name {
        Some(name) => name.to_string(),
        None => project_name(project_folder)?,
    };

    info!("Copying template '{}' to '{}'", template.name, target.display());
    copy_tree(&template.path, &target)?;

    let manifest = target.join(MANIFEST_FILE);
    set_name_in_file(&manifest, &name)?;
    let context = SubstitutionContext::from_manifest_file(&manifest)?;
    substitute_tree(&target, &context)?;
    Ok(target)
}

/// Symlinks a template's files into `<project_folder>/.devcontainer` and
/// keeps them out of version control with a `.gitignore`.
///
/// Linked files are shared with the template, so they are neither renamed
/// nor substituted.
///
/// # Errors
/// * `Error::ConflictError` if the project already has a definition folder
/// * `Error::UnsupportedError` on platforms without symlinks
pub fn link_template<P: AsRef<Path>>(template: &TemplateDescriptor, project_folder: P) -> Result<PathBuf> {
    let target = definition_folder(project_folder.as_ref())?;
    info!("Linking template '{}' to '{}'", template.name, target.display());
    link_tree(&template.path, &target)?;
    let gitignore = target.join(".gitignore");
    if gitignore.symlink_metadata().is_ok() {
        fs::remove_file(&gitignore).map_err(Error::IoError)?;
    }
    write_file(gitignore, "*\n")?;
    Ok(target)
}

/// Applies a snippet to the definition in `project_folder`.
///
/// Single file snippets are copied and run from the build script. Folder
/// snippets run their actions in order; a failing action leaves the writes
/// of earlier actions in place.
pub fn apply_snippet<P: AsRef<Path>>(snippet: &SnippetDescriptor, project_folder: P) -> Result<()> {
    let project_folder = project_folder.as_ref();
    info!("Adding snippet '{}' to '{}'", snippet.name, project_folder.display());
    match snippet.kind {
        SnippetKind::SingleFile => copy_and_run(project_folder, &snippet.name, &snippet.path),
        SnippetKind::Folder => {
            let manifest = SnippetManifest::load(snippet.path.join(SNIPPET_MANIFEST_FILE))?;
            for action in &manifest.actions {
                apply_action(project_folder, snippet, action)?;
            }
            Ok(())
        }
    }
}

fn apply_action(project_folder: &Path, snippet: &SnippetDescriptor, action: &SnippetAction) -> Result<()> {
    debug!("Running {action:?} from snippet '{}'", snippet.name);
    match action {
        SnippetAction::MergeManifest { source, target } => {
            let target = project_folder.join(target);
            let merged = merge_files(&target, snippet.path.join(source))?;
            write_file(&target, &merged.to_string())?;
            substitute_file(&target, &current_context(project_folder)?)
        }
        SnippetAction::CopyAndRun { source } => {
            copy_and_run(project_folder, &snippet.name, &snippet.path.join(source))
        }
        SnippetAction::InsertBuildSnippet(content) => {
            let content = match content {
                SnippetContent::Inline(text) => text.clone(),
                SnippetContent::File(path) => {
                    fs::read_to_string(snippet.path.join(path)).map_err(Error::IoError)?
                }
            };
            let build_script = project_folder.join(DEFINITION_FOLDER).join(BUILD_SCRIPT_FILE);
            insert_snippet_into_file(&build_script, &content)?;
            substitute_file(&build_script, &current_context(project_folder)?)
        }
        SnippetAction::Unknown(kind) => Err(Error::UnsupportedError(format!(
            "snippet action type '{kind}' in snippet '{}'",
            snippet.name
        ))),
    }
}

/// Copies `script` into the definition's scripts folder and adds a block
/// running it to the build script.
fn copy_and_run(project_folder: &Path, snippet_name: &str, script: &Path) -> Result<()> {
    let file_name = script
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| Error::NotFoundError(format!("No file name in '{}'", script.display())))?;
    let definition = project_folder.join(DEFINITION_FOLDER);
    let copied = definition.join(SCRIPTS_FOLDER).join(file_name);
    let build_script = definition.join(BUILD_SCRIPT_FILE);

    copy_file(script, &copied)?;
    make_executable(&copied)?;
    insert_snippet_into_file(&build_script, &copy_and_run_block(snippet_name, file_name))?;

    let context = current_context(project_folder)?;
    substitute_file(&copied, &context)?;
    substitute_file(&build_script, &context)
}

fn current_context(project_folder: &Path) -> Result<SubstitutionContext> {
    SubstitutionContext::from_manifest_file(find_manifest(project_folder)?)
}
