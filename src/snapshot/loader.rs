//! Snapshot loading from the environment and `models/*.json`
//!
//! Proxy keys come from `PORTUS_KEY_<APP>` variables. Each JSON file under
//! `<config_path>/models/` defines one alias named after its file stem.
//! `${VAR}` placeholders are substituted before parsing. Every problem is
//! collected so startup can report them all at once.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use thiserror::Error;
use tracing::debug;

use super::{AliasConfig, ConfigError, ConfigSnapshot, Identity};

/// Prefix of environment variables holding proxy keys
pub const PROXY_KEY_PREFIX: &str = "PORTUS_KEY_";

static ENV_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([^}]+)\}").expect("placeholder pattern is valid")
});

/// Problems found while building the snapshot
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read models directory {}: {source}", .path.display())]
    ReadDir { path: PathBuf, source: io::Error },

    #[error("failed to read model config {}: {source}", .path.display())]
    ReadFile { path: PathBuf, source: io::Error },

    #[error("failed to parse model config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("no proxy keys configured: at least one PORTUS_KEY_* environment variable is required")]
    NoProxyKeys,

    #[error("no model configurations found in {}", .0.display())]
    NoModels(PathBuf),

    #[error("missing environment variable: {name} (referenced in: {})", .files.join(", "))]
    MissingEnvVar { name: String, files: Vec<String> },

    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

/// Build and validate a snapshot from `config_path` and `vars`
pub fn load_snapshot(
    config_path: &Path,
    vars: &HashMap<String, String>,
) -> Result<ConfigSnapshot, Vec<LoadError>> {
    let mut errors = Vec::new();

    let credentials = proxy_keys(vars);
    if credentials.is_empty() {
        errors.push(LoadError::NoProxyKeys);
    }

    let models_dir = config_path.join("models");
    let mut aliases = BTreeMap::new();
    let mut missing_vars: BTreeMap<String, Vec<String>> = BTreeMap::new();

    match model_files(&models_dir) {
        Ok(files) => {
            for path in files {
                let Some(alias) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string)
                else {
                    continue;
                };

                let raw = match fs::read_to_string(&path) {
                    Ok(raw) => raw,
                    Err(source) => {
                        errors.push(LoadError::ReadFile { path, source });
                        continue;
                    }
                };

                for name in unresolved_placeholders(&raw, vars) {
                    missing_vars
                        .entry(name)
                        .or_default()
                        .push(format!("{alias}.json"));
                }

                match AliasConfig::from_json(&expand_env_vars(&raw, vars)) {
                    Ok(config) => {
                        debug!(alias = %alias, path = %path.display(), "Loaded model alias");
                        aliases.insert(alias, config);
                    }
                    Err(source) => errors.push(LoadError::Parse { path, source }),
                }
            }
        }
        Err(err) => errors.push(err),
    }

    if aliases.is_empty() && errors.iter().all(|e| !matches!(e, LoadError::Parse { .. })) {
        errors.push(LoadError::NoModels(config_path.to_path_buf()));
    }

    errors.extend(
        missing_vars
            .into_iter()
            .map(|(name, files)| LoadError::MissingEnvVar { name, files }),
    );

    let snapshot = ConfigSnapshot::new(aliases, credentials);
    errors.extend(snapshot.validate().into_iter().map(LoadError::from));

    if errors.is_empty() {
        Ok(snapshot)
    } else {
        Err(errors)
    }
}

/// Collect `PORTUS_KEY_<APP>=<key>` pairs as credential → identity
pub fn proxy_keys(vars: &HashMap<String, String>) -> HashMap<String, Identity> {
    vars.iter()
        .filter_map(|(name, value)| {
            let application = name.strip_prefix(PROXY_KEY_PREFIX)?;
            if application.is_empty() || value.is_empty() {
                return None;
            }
            Some((value.clone(), Identity::new(application)))
        })
        .collect()
}

/// Replace `${VAR}` placeholders, JSON-escaping substituted values
///
/// Unset variables become empty strings; [`unresolved_placeholders`] reports them.
pub fn expand_env_vars(content: &str, vars: &HashMap<String, String>) -> String {
    ENV_PLACEHOLDER
        .replace_all(content, |caps: &Captures<'_>| {
            let value = vars.get(&caps[1]).map(String::as_str).unwrap_or_default();
            json_escape(value)
        })
        .into_owned()
}

/// Placeholder names in `content` that have no non-empty value in `vars`
pub fn unresolved_placeholders(content: &str, vars: &HashMap<String, String>) -> Vec<String> {
    let mut names: Vec<String> = ENV_PLACEHOLDER
        .captures_iter(content)
        .map(|caps| caps[1].to_string())
        .filter(|name| vars.get(name).map_or(true, String::is_empty))
        .collect();
    names.sort();
    names.dedup();
    names
}

fn json_escape(value: &str) -> String {
    let quoted = serde_json::Value::from(value).to_string();
    quoted[1..quoted.len() - 1].to_string()
}

fn model_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(LoadError::ReadDir {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    Ok(files)
}
