use std::fs;
use std::path::{Path, PathBuf};

use devcontainer::compose::{apply_snippet, instantiate_template, link_template, Composer};
use devcontainer::config::Config;
use devcontainer::discovery::{SnippetDescriptor, SnippetKind, TemplateDescriptor};
use devcontainer::document::Document;
use devcontainer::error::Error;
use tempfile::TempDir;

/// A template folder with a manifest and a build script.
fn make_template(root: &Path, manifest: &str, dockerfile: &str) -> TemplateDescriptor {
    let path = root.join("template").join(".devcontainer");
    fs::create_dir_all(&path).unwrap();
    fs::write(path.join("devcontainer.json"), manifest).unwrap();
    fs::write(path.join("Dockerfile"), dockerfile).unwrap();
    TemplateDescriptor { name: "template".to_string(), path }
}

fn make_project(root: &Path) -> PathBuf {
    let project = root.join("project");
    fs::create_dir_all(&project).unwrap();
    project
}

fn single_file_snippet(root: &Path, name: &str, content: &str) -> SnippetDescriptor {
    let path = root.join(format!("{name}.sh"));
    fs::write(&path, content).unwrap();
    SnippetDescriptor { name: name.to_string(), kind: SnippetKind::SingleFile, path }
}

fn folder_snippet(root: &Path, name: &str, files: &[(&str, &str)]) -> SnippetDescriptor {
    let path = root.join(name);
    fs::create_dir_all(&path).unwrap();
    for (file, content) in files {
        fs::write(path.join(file), content).unwrap();
    }
    SnippetDescriptor { name: name.to_string(), kind: SnippetKind::Folder, path }
}

fn read(path: impl AsRef<Path>) -> String {
    fs::read_to_string(path).unwrap()
}

#[test_log::test]
fn test_template_then_single_file_snippet() {
    let temp_dir = TempDir::new().unwrap();
    let template = make_template(temp_dir.path(), "{\"name\":\"x\"}", "RUN echo hi");
    let project = make_project(temp_dir.path());

    let target = instantiate_template(&template, &project, Some("NewName")).unwrap();
    assert_eq!(target, project.join(".devcontainer"));
    assert_eq!(read(target.join("devcontainer.json")), "{\"name\":\"NewName\"}");

    let snippet = single_file_snippet(temp_dir.path(), "setup", "# dummy");
    apply_snippet(&snippet, &project).unwrap();

    assert_eq!(
        read(target.join("Dockerfile")),
        "RUN echo hi\n\n# setup\nCOPY scripts/setup.sh /tmp/\nRUN /tmp/setup.sh\n"
    );
    assert_eq!(read(target.join("scripts").join("setup.sh")), "# dummy");
}

#[test]
fn test_template_copies_every_file() {
    let temp_dir = TempDir::new().unwrap();
    let template = make_template(temp_dir.path(), "{\"name\": \"x\"}", "FROM debian\n");
    let extra = template.path.join("library-scripts");
    fs::create_dir_all(&extra).unwrap();
    fs::write(extra.join("common.sh"), "echo common\n").unwrap();
    let project = make_project(temp_dir.path());

    let target = instantiate_template(&template, &project, None).unwrap();

    assert!(!dir_diff::is_different(&extra, target.join("library-scripts")).unwrap());
    assert_eq!(read(target.join("devcontainer.json")), "{\"name\": \"project\"}");
}

#[test]
fn test_template_substitutes_name_and_user() {
    let temp_dir = TempDir::new().unwrap();
    let manifest = "{\n\t\"name\": \"x\",\n\t// the user\n\t\"remoteUser\": \"vscode\",\n\t\"workspaceFolder\": \"__DEVCONTAINER_HOME__/src\"\n}";
    let template = make_template(
        temp_dir.path(),
        manifest,
        "FROM debian\nLABEL name=__DEVCONTAINER_NAME__\nUSER __DEVCONTAINER_USER_NAME__\n",
    );
    let project = make_project(temp_dir.path());

    let target = instantiate_template(&template, &project, Some("demo")).unwrap();

    assert_eq!(
        read(target.join("Dockerfile")),
        "FROM debian\nLABEL name=demo\nUSER vscode\n"
    );
    assert_eq!(
        read(target.join("devcontainer.json")),
        "{\n\t\"name\": \"demo\",\n\t// the user\n\t\"remoteUser\": \"vscode\",\n\t\"workspaceFolder\": \"/home/vscode/src\"\n}"
    );
}

#[test]
fn test_existing_definition_folder_is_a_conflict() {
    let temp_dir = TempDir::new().unwrap();
    let template = make_template(temp_dir.path(), "{}", "");
    let project = make_project(temp_dir.path());
    fs::create_dir_all(project.join(".devcontainer")).unwrap();

    let err = instantiate_template(&template, &project, None).unwrap_err();
    assert!(matches!(err, Error::ConflictError { .. }));
    let err = link_template(&template, &project).unwrap_err();
    assert!(matches!(err, Error::ConflictError { .. }));
}

#[cfg(unix)]
#[test]
fn test_link_template() {
    let temp_dir = TempDir::new().unwrap();
    let template = make_template(temp_dir.path(), "{\"name\": \"__DEVCONTAINER_NAME__\"}", "FROM x");
    let project = make_project(temp_dir.path());

    let target = link_template(&template, &project).unwrap();

    let manifest = target.join("devcontainer.json");
    assert!(fs::symlink_metadata(&manifest).unwrap().file_type().is_symlink());
    assert_eq!(read(&manifest), "{\"name\": \"__DEVCONTAINER_NAME__\"}");
    assert_eq!(read(target.join(".gitignore")), "*\n");
}

#[test]
fn test_snippets_stack_above_marker() {
    let temp_dir = TempDir::new().unwrap();
    let template = make_template(
        temp_dir.path(),
        "{}",
        "FROM debian\n# __DEVCONTAINER_SNIPPET_INSERT__\nUSER vscode\n",
    );
    let project = make_project(temp_dir.path());
    instantiate_template(&template, &project, Some("demo")).unwrap();

    apply_snippet(&single_file_snippet(temp_dir.path(), "first", ""), &project).unwrap();
    apply_snippet(&single_file_snippet(temp_dir.path(), "second", ""), &project).unwrap();

    assert_eq!(
        read(project.join(".devcontainer").join("Dockerfile")),
        "FROM debian\n\
         # first\nCOPY scripts/first.sh /tmp/\nRUN /tmp/first.sh\n\n\
         # second\nCOPY scripts/second.sh /tmp/\nRUN /tmp/second.sh\n\n\
         # __DEVCONTAINER_SNIPPET_INSERT__\nUSER vscode\n"
    );
}

#[test]
fn test_folder_snippet_runs_actions_in_order() {
    let temp_dir = TempDir::new().unwrap();
    let template = make_template(
        temp_dir.path(),
        "{\n\t\"name\": \"x\",\n\t// extensions\n\t\"extensions\": [\n\t\t\"golang.Go\"\n\t]\n}",
        "FROM golang\n",
    );
    let project = make_project(temp_dir.path());
    instantiate_template(&template, &project, Some("demo")).unwrap();

    let snippet = folder_snippet(
        temp_dir.path(),
        "docker",
        &[
            (
                "snippet.json",
                r#"{
                    "actions": [
                        {"type": "mergeJSON", "source": "devcontainer.json", "target": ".devcontainer/devcontainer.json"},
                        {"type": "copyAndRun", "source": "install-docker.sh"},
                        {"type": "dockerfileSnippet", "content": "ENV DOCKER_USER=__DEVCONTAINER_USER_NAME__"},
                        {"type": "dockerfileSnippet", "contentPath": "Dockerfile.snippet"},
                    ]
                }"#,
            ),
            (
                "devcontainer.json",
                "{\n\t\"remoteUser\": \"dev\",\n\t\"extensions\": [\n\t\t\"ms-azuretools.vscode-docker\"\n\t]\n}",
            ),
            ("install-docker.sh", "echo installing for __DEVCONTAINER_NAME__\n"),
            ("Dockerfile.snippet", "ENV HOME_DIR=__DEVCONTAINER_HOME__\n"),
        ],
    );

    apply_snippet(&snippet, &project).unwrap();

    let definition = project.join(".devcontainer");
    assert_eq!(
        read(definition.join("devcontainer.json")),
        "{\n\t\"name\": \"demo\",\n\t// extensions\n\t\"extensions\": [\n\t\t\"golang.Go\",\n\t\t\"ms-azuretools.vscode-docker\"\n\t],\n\t\"remoteUser\": \"dev\"\n}"
    );
    assert_eq!(
        read(definition.join("scripts").join("install-docker.sh")),
        "echo installing for demo\n"
    );
    assert_eq!(
        read(definition.join("Dockerfile")),
        "FROM golang\n\n\
         # docker\nCOPY scripts/install-docker.sh /tmp/\nRUN /tmp/install-docker.sh\n\n\
         ENV DOCKER_USER=dev\n\n\
         ENV HOME_DIR=/home/dev\n"
    );
}

#[test]
fn test_failed_action_keeps_earlier_writes() {
    let temp_dir = TempDir::new().unwrap();
    let template = make_template(temp_dir.path(), "{\"name\": \"x\"}", "FROM debian\n");
    let project = make_project(temp_dir.path());
    instantiate_template(&template, &project, None).unwrap();

    let snippet = folder_snippet(
        temp_dir.path(),
        "partial",
        &[
            (
                "snippet.json",
                r#"{"actions": [
                    {"type": "dockerfileSnippet", "content": "ENV A=1"},
                    {"type": "dockerfileSnippet", "contentPath": "missing.snippet"}
                ]}"#,
            ),
        ],
    );

    let err = apply_snippet(&snippet, &project).unwrap_err();

    assert!(matches!(err, Error::IoError(_)));
    assert_eq!(read(project.join(".devcontainer").join("Dockerfile")), "FROM debian\n\nENV A=1\n");
}

#[test]
fn test_unknown_action_stops_remaining_actions() {
    let temp_dir = TempDir::new().unwrap();
    let template = make_template(temp_dir.path(), "{}", "FROM debian\n");
    let project = make_project(temp_dir.path());
    instantiate_template(&template, &project, None).unwrap();

    let snippet = folder_snippet(
        temp_dir.path(),
        "odd",
        &[(
            "snippet.json",
            r#"{"actions": [
                {"type": "dockerfileSnippet", "content": "ENV A=1"},
                {"type": "bogus"},
                {"type": "dockerfileSnippet", "content": "ENV B=2"}
            ]}"#,
        )],
    );

    let err = apply_snippet(&snippet, &project).unwrap_err();

    assert!(matches!(err, Error::UnsupportedError(_)));
    assert!(err.to_string().contains("'bogus'"));
    assert_eq!(read(project.join(".devcontainer").join("Dockerfile")), "FROM debian\n\nENV A=1\n");
}

#[test]
fn test_composer_resolves_names_from_config() {
    let temp_dir = TempDir::new().unwrap();
    let templates = temp_dir.path().join("templates");
    let snippets = temp_dir.path().join("snippets");
    make_template(&templates, "{\"name\": \"x\"}", "FROM debian\n");
    fs::create_dir_all(&snippets).unwrap();
    single_file_snippet(&snippets, "setup", "# dummy");
    let project = make_project(temp_dir.path());
    let config = Config::new(
        vec![templates.display().to_string()],
        vec![snippets.display().to_string()],
    );
    let composer = Composer::new(&config);

    composer.instantiate_template("template", &project, None).unwrap();
    composer.apply_snippet("setup", &project).unwrap();

    let manifest = Document::load(project.join(".devcontainer").join("devcontainer.json")).unwrap();
    assert_eq!(manifest.to_json().unwrap(), serde_json::json!({"name": "project"}));
    assert!(project.join(".devcontainer").join("scripts").join("setup.sh").is_file());
    assert!(matches!(
        composer.apply_snippet("missing", &project),
        Err(Error::NotFoundError(_))
    ));
    assert!(matches!(
        composer.instantiate_template("missing", &project, None),
        Err(Error::NotFoundError(_))
    ));
}
