// src/core/paths.rs

use crate::constants::{APP_CONFIG_DIR, CONFIG_ENV_VAR, CONFIG_PATH_SEPARATOR, DEFAULT_CONFIG_FILENAME};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Errors raised while locating configuration files.
#[derive(Error, Debug)]
pub enum PathError {
    /// `~` or a `$VAR` in a path could not be expanded.
    #[error("Could not expand path '{template}': {reason}")]
    Expansion {
        /// The path as written.
        template: String,
        /// What the expander reported.
        reason: String,
    },
    /// A configured path does not exist.
    #[error("Configuration path '{path}' does not exist.")]
    NotFound {
        /// The expanded path.
        path: String,
    },
    /// A path could not be made absolute.
    #[error("Could not resolve '{path}': {source}")]
    Canonicalize {
        /// The expanded path.
        path: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// A directory could not be scanned.
    #[error("Could not read directory '{path}': {source}")]
    Walk {
        /// The directory being scanned.
        path: String,
        /// The walker error.
        #[source]
        source: walkdir::Error,
    },
    /// None of the default locations holds a configuration.
    #[error(
        "No chain configuration found. Pass --config, set {env_var}, or create '{default_file}'."
    )]
    NoConfigFound {
        /// The environment variable that was checked.
        env_var: &'static str,
        /// The default file name that was looked for.
        default_file: &'static str,
    },
}

/// Returns the per-user configuration directory (`~/.config/cmdchain` on Linux), if the
/// platform has one. Unlike the working-directory default, it is never created.
pub fn get_app_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_CONFIG_DIR))
}

/// Expands `~` and `$VAR` / `${VAR}` in a path.
pub fn expand_path(template: &str) -> Result<PathBuf, PathError> {
    let expanded = shellexpand::full(template.trim()).map_err(|e| PathError::Expansion {
        template: template.to_string(),
        reason: e.to_string(),
    })?;
    Ok(PathBuf::from(expanded.into_owned()))
}

/// Splits a comma-separated path list, expands every entry and checks it exists.
///
/// Empty entries (as in `"a.toml,,b.toml"`) are skipped.
pub fn resolve_path_list(list: &str) -> Result<Vec<PathBuf>, PathError> {
    list.split(CONFIG_PATH_SEPARATOR)
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let path = expand_path(entry)?;
            if !path.exists() {
                return Err(PathError::NotFound {
                    path: path.display().to_string(),
                });
            }
            dunce::canonicalize(&path).map_err(|e| PathError::Canonicalize {
                path: path.display().to_string(),
                source: e,
            })
        })
        .collect()
}

/// Decides where the configuration comes from.
///
/// Priority: the explicit list (e.g. `--config`), then the `CHAIN_CONFIG_FILE_NAME`
/// environment variable, then `./chain_config.toml`, then the same file in the user's
/// configuration directory.
pub fn resolve_config_sources(explicit: Option<&str>) -> Result<Vec<PathBuf>, PathError> {
    if let Some(list) = explicit {
        log::debug!("Using configuration from the command line: {}", list);
        return resolve_path_list(list);
    }

    if let Ok(list) = std::env::var(CONFIG_ENV_VAR)
        && !list.trim().is_empty()
    {
        log::debug!("Using configuration from ${}: {}", CONFIG_ENV_VAR, list);
        return resolve_path_list(&list);
    }

    let local = PathBuf::from(DEFAULT_CONFIG_FILENAME);
    if local.is_file() {
        log::debug!("Using configuration from the working directory.");
        return resolve_path_list(DEFAULT_CONFIG_FILENAME);
    }

    if let Some(user_file) = get_app_config_dir().map(|dir| dir.join(DEFAULT_CONFIG_FILENAME))
        && user_file.is_file()
    {
        log::debug!("Using configuration from {}", user_file.display());
        return Ok(vec![user_file]);
    }

    Err(PathError::NoConfigFound {
        env_var: CONFIG_ENV_VAR,
        default_file: DEFAULT_CONFIG_FILENAME,
    })
}

/// Expands a directory into the `*.toml` / `*.json` files below it, sorted by path.
/// A file path is returned as is.
pub fn collect_config_files(path: &Path) -> Result<Vec<PathBuf>, PathError> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry.map_err(|e| PathError::Walk {
            path: path.display().to_string(),
            source: e,
        })?;
        if entry.file_type().is_file() && is_config_file(entry.path()) {
            files.push(entry.into_path());
        }
    }
    log::debug!("Found {} configuration file(s) in {}", files.len(), path.display());
    Ok(files)
}

fn is_config_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("toml") | Some("json")
    )
}
