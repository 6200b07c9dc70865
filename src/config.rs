//! Run-time options for docs-versioning.
//!
//! Options come from three places, later ones winning:
//! built-in defaults → config files and environment ([`Config::load`]) →
//! the parsed command line ([`Config::apply_options`]).

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Project-level config file, looked up in the project root
pub const PROJECT_CONFIG_FILE: &str = ".docs-versioning.toml";

/// Prefix of environment variables mapped onto [`Config`] fields
pub const ENV_PREFIX: &str = "DOCS_VERSIONING";

/// The configuration and shared state of one run.
#[derive(Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Scratch space for state shared between otherwise unrelated steps
    #[serde(skip)]
    pub program_state: HashMap<String, Value>,

    pub build: bool,
    pub greatest_tag: bool,
    pub invert: bool,
    pub no_colors: bool,
    pub recent_tag: bool,
    pub verbose: bool,

    pub chdir: Option<String>,
    pub destination: Option<String>,
    pub dst_branch: Option<String>,
    pub git_root: Option<String>,
    pub priority: Option<String>,
    pub rel_dst: Option<String>,
    pub rel_source: Option<String>,
    pub root_ref: Option<String>,

    #[serde(deserialize_with = "list_or_csv")]
    pub grm_exclude: Option<Vec<String>>,
    #[serde(deserialize_with = "list_or_csv")]
    pub overflow: Option<Vec<String>>,
    #[serde(deserialize_with = "list_or_csv")]
    pub sort: Option<Vec<String>>,
}

impl Config {
    /// Every field name an option key may resolve to
    pub const FIELDS: [&'static str; 18] = [
        "program_state",
        "build",
        "greatest_tag",
        "invert",
        "no_colors",
        "recent_tag",
        "verbose",
        "chdir",
        "destination",
        "dst_branch",
        "git_root",
        "priority",
        "rel_dst",
        "rel_source",
        "root_ref",
        "grm_exclude",
        "overflow",
        "sort",
    ];

    /// Load configuration with hierarchy: defaults → project → user → env
    pub fn load(project_root: Option<&Path>) -> ConfigResult<Self> {
        Self::load_from(&ConfigSources::discover(project_root))
    }

    /// Load configuration from explicitly chosen sources.
    ///
    /// Keys that name no field are rejected in every layer.
    pub fn load_from(sources: &ConfigSources) -> ConfigResult<Self> {
        use ::config::{Environment, File, FileFormat};

        let mut builder = ::config::Config::builder();

        // 1. Built-in defaults
        builder = builder.add_source(
            File::from_str(include_str!("../default_config.toml"), FileFormat::Toml)
                .required(false),
        );

        // 2. Project-specific config (.docs-versioning.toml in project root)
        if let Some(root) = &sources.project_root {
            let project_config = root.join(PROJECT_CONFIG_FILE);
            if project_config.exists() {
                tracing::debug!("Reading project config {:?}", project_config);
                builder = builder.add_source(File::from(project_config).required(false));
            }
        }

        // 3. User config (~/.config/docs-versioning/config.toml)
        if let Some(user_config) = &sources.user_config {
            if user_config.exists() {
                tracing::debug!("Reading user config {:?}", user_config);
                builder = builder.add_source(File::from(user_config.clone()).required(false));
            }
        }

        // 4. Environment variables (DOCS_VERSIONING_ROOT_REF=...), kept as
        // strings; list fields are split on ',' when deserialized
        builder = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).source(sources.env.clone()));

        let config = builder
            .build()
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Build a config from a parsed command line, on top of the defaults.
    pub fn from_options<I, K>(options: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let mut config = Self::default();
        config.apply_options(options)?;
        Ok(config)
    }

    /// Copy parsed command-line values onto this config.
    ///
    /// Every key must name a field (see [`option_field_name`]) and no two
    /// keys may name the same one. Nothing is changed if any entry is
    /// rejected.
    pub fn apply_options<I, K>(&mut self, options: I) -> ConfigResult<()>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let mut seen: HashMap<String, String> = HashMap::new();
        let mut next = self.clone();

        for (key, value) in options {
            let key = key.as_ref();
            let field = option_field_name(key);

            if !Self::FIELDS.contains(&field.as_str()) {
                return Err(ConfigError::UnknownOption {
                    key: key.to_string(),
                    field,
                });
            }
            if let Some(previous) = seen.get(&field) {
                return Err(ConfigError::DuplicateOption {
                    key: key.to_string(),
                    previous: previous.clone(),
                    field,
                });
            }

            next.set_field(key, &field, value)?;
            seen.insert(field, key.to_string());
        }

        *self = next;
        Ok(())
    }

    /// Use `project_root` as `git_root` unless one was configured
    pub fn resolve_git_root(&mut self, project_root: Option<&Path>) {
        if self.git_root.is_none() {
            self.git_root = project_root.map(|p| p.display().to_string());
        }
    }

    fn set_field(&mut self, key: &str, field: &str, value: Value) -> ConfigResult<()> {
        match field {
            "program_state" => self.program_state = state(key, value)?,

            "build" => self.build = flag(key, value)?,
            "greatest_tag" => self.greatest_tag = flag(key, value)?,
            "invert" => self.invert = flag(key, value)?,
            "no_colors" => self.no_colors = flag(key, value)?,
            "recent_tag" => self.recent_tag = flag(key, value)?,
            "verbose" => self.verbose = flag(key, value)?,

            "chdir" => self.chdir = text(key, value)?,
            "destination" => self.destination = text(key, value)?,
            "dst_branch" => self.dst_branch = text(key, value)?,
            "git_root" => self.git_root = text(key, value)?,
            "priority" => self.priority = text(key, value)?,
            "rel_dst" => self.rel_dst = text(key, value)?,
            "rel_source" => self.rel_source = text(key, value)?,
            "root_ref" => self.root_ref = text(key, value)?,

            "grm_exclude" => self.grm_exclude = list(key, value)?,
            "overflow" => self.overflow = list(key, value)?,
            "sort" => self.sort = list(key, value)?,

            _ => {
                return Err(ConfigError::UnknownOption {
                    key: key.to_string(),
                    field: field.to_string(),
                })
            }
        }
        Ok(())
    }
}

/// Only the fields worth seeing in a log line.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("verbose", &self.verbose)
            .field("root_ref", &self.root_ref)
            .field("overflow", &self.overflow)
            .finish()
    }
}

/// Map a command-line option key to the config field it sets.
///
/// `--dst-branch` becomes `dst_branch`; keys without the `--` prefix
/// (positional arguments, commands) are only lower-cased.
pub fn option_field_name(key: &str) -> String {
    match key.strip_prefix("--") {
        Some(name) => name.replace('-', "_").to_lowercase(),
        None => key.to_lowercase(),
    }
}

/// Where [`Config::load_from`] reads its layers from
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Directory holding `.docs-versioning.toml`
    pub project_root: Option<PathBuf>,
    /// Per-user config file
    pub user_config: Option<PathBuf>,
    /// Environment to read `DOCS_VERSIONING_*` from; `None` means the
    /// process environment
    pub env: Option<::config::Map<String, String>>,
}

impl ConfigSources {
    /// The project root given, the platform user config file, and the
    /// process environment
    pub fn discover(project_root: Option<&Path>) -> Self {
        let user_config = directories::ProjectDirs::from("", "", "docs-versioning")
            .map(|dirs| dirs.config_dir().join("config.toml"));

        Self {
            project_root: project_root.map(Path::to_path_buf),
            user_config,
            env: None,
        }
    }
}

/// Walk up from `start` to the first directory containing `.git`
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

/// Accept a list of strings, or one comma-separated string as environment
/// variables provide
fn list_or_csv<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ListOrCsv {
        List(Vec<String>),
        Csv(String),
    }

    Ok(
        Option::<ListOrCsv>::deserialize(deserializer)?.map(|value| match value {
            ListOrCsv::List(items) => items,
            ListOrCsv::Csv(text) if text.is_empty() => Vec::new(),
            ListOrCsv::Csv(text) => text.split(',').map(str::to_string).collect(),
        }),
    )
}

fn flag(key: &str, value: Value) -> ConfigResult<bool> {
    match value {
        Value::Bool(b) => Ok(b),
        _ => Err(invalid(key, "a boolean")),
    }
}

fn text(key: &str, value: Value) -> ConfigResult<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        _ => Err(invalid(key, "a string or null")),
    }
}

fn list(key: &str, value: Value) -> ConfigResult<Option<Vec<String>>> {
    match value {
        Value::Null => Ok(None),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                _ => Err(invalid(key, "a list of strings or null")),
            })
            .collect::<ConfigResult<Vec<_>>>()
            .map(Some),
        _ => Err(invalid(key, "a list of strings or null")),
    }
}

fn state(key: &str, value: Value) -> ConfigResult<HashMap<String, Value>> {
    match value {
        Value::Object(map) => Ok(map.into_iter().collect()),
        _ => Err(invalid(key, "an object")),
    }
}

fn invalid(key: &str, expected: &'static str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        expected,
    }
}
