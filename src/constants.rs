//! Common constants used throughout the devcontainer tool.

/// Folder holding a project's definition
pub const DEFINITION_FOLDER: &str = ".devcontainer";

/// Manifest file name inside a definition folder
pub const MANIFEST_FILE: &str = "devcontainer.json";

/// Manifest placed directly in the project folder when there is no definition folder
pub const ROOT_MANIFEST_FILE: &str = ".devcontainer.json";

/// Build script file name inside a definition folder
pub const BUILD_SCRIPT_FILE: &str = "Dockerfile";

/// Manifest describing the actions of a folder snippet
pub const SNIPPET_MANIFEST_FILE: &str = "snippet.json";

/// Subfolder of the definition folder that receives snippet scripts
pub const SCRIPTS_FOLDER: &str = "scripts";

/// Extension of single file snippets
pub const SNIPPET_SCRIPT_EXTENSION: &str = "sh";

/// Build script line marking where snippet content is stacked
pub const SNIPPET_INSERT_MARKER: &str = "__DEVCONTAINER_SNIPPET_INSERT__";

/// Replaced with the manifest's `name`
pub const NAME_TOKEN: &str = "__DEVCONTAINER_NAME__";

/// Replaced with the manifest's `remoteUser`
pub const USER_NAME_TOKEN: &str = "__DEVCONTAINER_USER_NAME__";

/// Replaced with the home folder of the remote user
pub const HOME_TOKEN: &str = "__DEVCONTAINER_HOME__";

/// Account assumed when `remoteUser` is not set
pub const ROOT_USER: &str = "root";

/// Directory under the user's home holding the tool configuration
pub const CONFIG_FOLDER: &str = ".devcontainer-cli";

/// Tool configuration file name
pub const CONFIG_FILE: &str = "devcontainer-cli.json";

/// Environment variable overriding the configuration file location
pub const CONFIG_ENV_VAR: &str = "DEVCONTAINER_CLI_CONFIG";
