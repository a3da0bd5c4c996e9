//! Configuration management for the harness.
//!
//! Configuration sources and precedence (highest wins):
//! 1. CLI overrides
//! 2. Environment variables (`CONFORMANCE_*`, plus the fixture selector)
//! 3. Project config (`conformance.yaml` in the harness root)
//! 4. Defaults
//!
//! Environment variables are read here and nowhere else. The core receives
//! the fixture override as an explicit field of [`HarnessConfig`].

use crate::error::{ConformanceError, Result};
use crate::mask::MaskTable;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Project config file name, looked up in the harness root.
pub const CONFIG_FILE: &str = "conformance.yaml";
/// Default name of the fixture-selector environment variable.
pub const DEFAULT_SELECTOR_ENV: &str = "CONFORMANCE_FIXTURE";
/// Environment variable pointing the oracle at the directory to write into.
pub const OUTPUT_DIR_ENV: &str = "CONFORMANCE_OUTPUT_DIR";
/// Environment variable naming the golden summary report the oracle writes.
pub const GOLDEN_JSON_ENV: &str = "CONFORMANCE_GOLDEN_JSON";
/// Environment variable naming the golden message stream the oracle writes.
pub const GOLDEN_MESSAGES_ENV: &str = "CONFORMANCE_GOLDEN_MESSAGES";

const DEFAULT_FEATURES_ROOT: &str = "features";
const DEFAULT_LOG_DIR: &str = "target/conformance-logs";
const DEFAULT_TOLERATED_EXIT_CODES: &[i32] = &[1];
const DEFAULT_MAX_DIFF_ENTRIES: usize = 20;

/// One source of configuration. Unset fields defer to lower layers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    #[serde(default)]
    pub features_root: Option<PathBuf>,
    #[serde(default)]
    pub selector_env: Option<String>,
    #[serde(default)]
    pub command: Option<Vec<String>>,
    #[serde(default)]
    pub oracle_command: Option<Vec<String>>,
    #[serde(default)]
    pub exclude: Option<BTreeSet<String>>,
    #[serde(default)]
    pub tolerated_exit_codes: Option<Vec<i32>>,
    #[serde(default)]
    pub expected_failure_pattern: Option<String>,
    #[serde(default)]
    pub mask: Option<MaskTable>,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    #[serde(default)]
    pub max_diff_entries: Option<usize>,
    /// Single-fixture override. Only settable from the environment or CLI.
    #[serde(skip)]
    pub fixture: Option<String>,
}

macro_rules! merge_fields {
    ($dst:expr, $src:expr, $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = &$src.$field {
                $dst.$field = Some(value.clone());
            }
        )+
    };
}

impl ConfigLayer {
    /// Merge another layer on top of this one (higher precedence wins).
    pub fn merge_from(&mut self, other: &Self) {
        merge_fields!(
            self,
            other,
            features_root,
            selector_env,
            command,
            oracle_command,
            exclude,
            tolerated_exit_codes,
            expected_failure_pattern,
            mask,
            log_dir,
            max_diff_entries,
            fixture,
        );
    }

    /// Merge multiple layers in precedence order (lowest to highest).
    #[must_use]
    pub fn merge_layers(layers: &[Self]) -> Self {
        let mut merged = Self::default();
        for layer in layers {
            merged.merge_from(layer);
        }
        merged
    }

    /// Build a layer from a YAML file path. Missing files return empty config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(err.into()),
        };
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&contents)
            .map_err(|e| ConformanceError::Config(format!("{}: {e}", path.display())))
    }

    /// Build a layer from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(|key| env::var(key).ok())
    }

    /// Build a layer from an arbitrary variable lookup.
    ///
    /// `CONFORMANCE_COMMAND` and `CONFORMANCE_ORACLE_COMMAND` are split on
    /// whitespace; `CONFORMANCE_EXCLUDE` and `CONFORMANCE_TOLERATED_EXIT_CODES`
    /// are comma-separated.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable cannot be parsed.
    pub fn from_env_with<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut layer = Self {
            features_root: get("CONFORMANCE_FEATURES_ROOT").map(PathBuf::from),
            selector_env: get("CONFORMANCE_SELECTOR_ENV").map(|v| v.trim().to_string()),
            command: get("CONFORMANCE_COMMAND").map(|v| split_command(&v)),
            oracle_command: get("CONFORMANCE_ORACLE_COMMAND").map(|v| split_command(&v)),
            exclude: get("CONFORMANCE_EXCLUDE").map(|v| split_list(&v).collect()),
            expected_failure_pattern: get("CONFORMANCE_EXPECTED_FAILURE_PATTERN"),
            log_dir: get("CONFORMANCE_LOG_DIR").map(PathBuf::from),
            ..Self::default()
        };

        if let Some(value) = get("CONFORMANCE_TOLERATED_EXIT_CODES") {
            let codes = split_list(&value)
                .map(|code| {
                    code.parse::<i32>().map_err(|_| {
                        ConformanceError::Config(format!(
                            "CONFORMANCE_TOLERATED_EXIT_CODES: '{code}' is not an exit code"
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            layer.tolerated_exit_codes = Some(codes);
        }
        if let Some(value) = get("CONFORMANCE_MAX_DIFF_ENTRIES") {
            let parsed = value.trim().parse::<usize>().map_err(|_| {
                ConformanceError::Config(format!(
                    "CONFORMANCE_MAX_DIFF_ENTRIES: '{value}' is not a number"
                ))
            })?;
            layer.max_diff_entries = Some(parsed);
        }

        Ok(layer)
    }
}

fn split_command(value: &str) -> Vec<String> {
    value.split_whitespace().map(str::to_string).collect()
}

fn split_list(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// CLI overrides for config loading (optional).
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub features_root: Option<PathBuf>,
    pub fixture: Option<String>,
    pub log_dir: Option<PathBuf>,
}

impl CliOverrides {
    #[must_use]
    pub fn as_layer(&self) -> ConfigLayer {
        ConfigLayer {
            features_root: self.features_root.clone(),
            fixture: self.fixture.clone(),
            log_dir: self.log_dir.clone(),
            ..ConfigLayer::default()
        }
    }
}

/// Default config layer (lowest precedence).
#[must_use]
pub fn default_config_layer() -> ConfigLayer {
    ConfigLayer {
        features_root: Some(PathBuf::from(DEFAULT_FEATURES_ROOT)),
        selector_env: Some(DEFAULT_SELECTOR_ENV.to_string()),
        command: Some(Vec::new()),
        oracle_command: None,
        exclude: Some(BTreeSet::new()),
        tolerated_exit_codes: Some(DEFAULT_TOLERATED_EXIT_CODES.to_vec()),
        expected_failure_pattern: None,
        mask: Some(MaskTable::standard()),
        log_dir: Some(PathBuf::from(DEFAULT_LOG_DIR)),
        max_diff_entries: Some(DEFAULT_MAX_DIFF_ENTRIES),
        fixture: None,
    }
}

/// Fully resolved harness configuration.
#[derive(Debug, Clone, Serialize)]
pub struct HarnessConfig {
    /// Harness root; relative paths below are resolved against it.
    pub root: PathBuf,
    pub features_root: PathBuf,
    pub selector_env: String,
    pub command: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oracle_command: Option<Vec<String>>,
    pub exclude: BTreeSet<String>,
    pub tolerated_exit_codes: Vec<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_failure_pattern: Option<String>,
    pub mask: MaskTable,
    pub log_dir: PathBuf,
    pub max_diff_entries: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixture_override: Option<String>,
}

impl HarnessConfig {
    /// Resolve a merged layer against the harness root, filling defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConformanceError::Config`] for invalid values.
    pub fn resolve(root: &Path, layer: &ConfigLayer) -> Result<Self> {
        let merged = ConfigLayer::merge_layers(&[default_config_layer(), layer.clone()]);

        let selector_env = merged
            .selector_env
            .unwrap_or_else(|| DEFAULT_SELECTOR_ENV.to_string());
        if selector_env.is_empty() || selector_env.contains('=') || selector_env.contains('\0') {
            return Err(ConformanceError::Config(format!(
                "selector_env '{selector_env}' is not a valid environment variable name"
            )));
        }

        if let Some(pattern) = &merged.expected_failure_pattern {
            Regex::new(pattern).map_err(|e| {
                ConformanceError::Config(format!("expected_failure_pattern: {e}"))
            })?;
        }

        let max_diff_entries = merged.max_diff_entries.unwrap_or(DEFAULT_MAX_DIFF_ENTRIES);
        if max_diff_entries == 0 {
            return Err(ConformanceError::Config(
                "max_diff_entries must be at least 1".to_string(),
            ));
        }

        let oracle_command = merged.oracle_command.filter(|argv| !argv.is_empty());

        Ok(Self {
            root: root.to_path_buf(),
            features_root: root.join(
                merged
                    .features_root
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_FEATURES_ROOT)),
            ),
            selector_env,
            command: merged.command.unwrap_or_default(),
            oracle_command,
            exclude: merged.exclude.unwrap_or_default(),
            tolerated_exit_codes: merged
                .tolerated_exit_codes
                .unwrap_or_else(|| DEFAULT_TOLERATED_EXIT_CODES.to_vec()),
            expected_failure_pattern: merged.expected_failure_pattern,
            mask: merged.mask.unwrap_or_else(MaskTable::standard),
            log_dir: root.join(
                merged
                    .log_dir
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR)),
            ),
            max_diff_entries,
            fixture_override: merged
                .fixture
                .map(|f| f.trim().to_string())
                .filter(|f| !f.is_empty()),
        })
    }
}

/// Load project config (`conformance.yaml` in the harness root).
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(root: &Path) -> Result<ConfigLayer> {
    ConfigLayer::from_yaml(&root.join(CONFIG_FILE))
}

/// Load configuration with the standard precedence order, reading the
/// process environment.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or parsed, or a value
/// is invalid.
pub fn load_config(root: &Path, cli: &CliOverrides) -> Result<HarnessConfig> {
    load_config_with_env(root, cli, |key| env::var(key).ok())
}

/// [`load_config`] with an explicit environment lookup.
///
/// The fixture override is read from the variable named by the resolved
/// `selector_env`, so a project that renames the selector also renames the
/// override.
///
/// # Errors
///
/// See [`load_config`].
pub fn load_config_with_env<F>(root: &Path, cli: &CliOverrides, lookup: F) -> Result<HarnessConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let project = load_project_config(root)?;
    let mut env_layer = ConfigLayer::from_env_with(&lookup)?;
    let cli_layer = cli.as_layer();

    let selector = ConfigLayer::merge_layers(&[
        default_config_layer(),
        project.clone(),
        env_layer.clone(),
    ])
    .selector_env
    .unwrap_or_else(|| DEFAULT_SELECTOR_ENV.to_string());
    env_layer.fixture = lookup(&selector).filter(|v| !v.trim().is_empty());

    let merged = ConfigLayer::merge_layers(&[project, env_layer, cli_layer]);
    let config = HarnessConfig::resolve(root, &merged)?;
    debug!(
        root = %config.root.display(),
        features_root = %config.features_root.display(),
        fixture_override = ?config.fixture_override,
        "configuration loaded"
    );
    Ok(config)
}
