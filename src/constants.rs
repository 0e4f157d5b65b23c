// src/constants.rs

/// The default name of the chain configuration file, looked up in the current directory.
pub const DEFAULT_CONFIG_FILENAME: &str = "chain_config.toml";

/// Environment variable holding a comma-separated list of configuration files or directories.
pub const CONFIG_ENV_VAR: &str = "CHAIN_CONFIG_FILE_NAME";

/// The name of the application directory inside the user's config dir (`~/.config/cmdchain`).
pub const APP_CONFIG_DIR: &str = "cmdchain";

/// Separator between the catalog id and the chain id in a chain reference.
pub const CHAIN_REF_SEPARATOR: char = '/';

/// Separator between entries of a configuration path list.
pub const CONFIG_PATH_SEPARATOR: char = ',';

// --- Context keys owned by the engine (always namespaced per catalog/chain) ---

/// Cursor of the currently executing step.
pub const EXECUTION_INDEX_KEY: &str = "executionIndex";

/// Index of the `LoopStart` step of the active loop.
pub const LOOP_FIRST_COMMAND_INDEX_KEY: &str = "loopFirstCommandIndex";

/// Current value of the loop variable.
pub const LOOP_INDEX_VAR_KEY: &str = "indexVar";

/// Inclusive upper bound of the loop variable.
pub const LOOP_INDEX_END_KEY: &str = "indexEnd";

/// Flag present while a loop is active.
pub const IN_LOOP_KEY: &str = "inLoop";
