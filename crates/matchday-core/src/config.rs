// Configuration loading and parsing (league.toml).

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::scoring::ScoringTable;
use crate::team::DEFAULT_SUB_LIMIT;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub league: LeagueConfig,
    pub scoring: ScoringTable,
    pub data_paths: DataPaths,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueConfig {
    pub name: String,
    #[serde(default)]
    pub season: u32,
    /// Season cap on transfers outside the freeze window.
    #[serde(default = "default_sub_limit")]
    pub sub_limit: u32,
}

fn default_sub_limit() -> u32 {
    DEFAULT_SUB_LIMIT
}

/// CSV inputs, relative to the working directory unless absolute.
#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    #[serde(default = "default_squads_path")]
    pub squads: String,
    #[serde(default = "default_stats_path")]
    pub stats: String,
}

fn default_squads_path() -> String {
    "data/squads.csv".into()
}

fn default_stats_path() -> String {
    "data/stats.csv".into()
}

impl Default for DataPaths {
    fn default() -> Self {
        DataPaths {
            squads: default_squads_path(),
            stats: default_stats_path(),
        }
    }
}

// Raw file layout.
#[derive(Debug, Deserialize)]
struct LeagueFile {
    league: LeagueConfig,
    #[serde(default)]
    scoring: ScoringTable,
    #[serde(default)]
    data_paths: DataPaths,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/league.toml` relative to `base_dir`.
///
/// Does not copy defaults. Prefer `load_config()` which does.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    load_config_file(&base_dir.join("config").join("league.toml"))
}

/// Load and validate an explicit league file.
pub fn load_config_file(path: &Path) -> Result<Config, ConfigError> {
    let text = read_file(path)?;
    let file: LeagueFile = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config = Config {
        league: file.league,
        scoring: file.scoring,
        data_paths: file.data_paths,
    };

    validate(&config)?;

    Ok(config)
}

/// Bootstrap a project directory for first use.
///
/// Copies every league file in `defaults/` that `config/` lacks (skipping
/// `*.example` templates) and creates the `data/` directory the default
/// CSV paths point into. Returns the config files that were copied.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if config_dir.exists() {
            return Ok(vec![]);
        }
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "neither defaults/ nor config/ directory found in {}; \
                 run from the project root or pass --config",
                base_dir.display()
            ),
        });
    }

    let copy_err = |message: String| ConfigError::DefaultsCopyError { message };

    std::fs::create_dir_all(&config_dir)
        .map_err(|e| copy_err(format!("failed to create config directory: {e}")))?;

    let mut templates = Vec::new();
    for entry in std::fs::read_dir(&defaults_dir)
        .map_err(|e| copy_err(format!("failed to read defaults directory: {e}")))?
    {
        let path = entry
            .map_err(|e| copy_err(format!("failed to read defaults entry: {e}")))?
            .path();
        let is_template = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(".example"));
        if path.is_file() && !is_template {
            templates.push(path);
        }
    }
    templates.sort();

    let mut copied = Vec::new();
    for source in templates {
        let Some(file_name) = source.file_name() else {
            continue;
        };
        let target = config_dir.join(file_name);
        if copy_if_missing(&source, &target)? {
            info!("created {} from defaults", target.display());
            copied.push(target);
        }
    }

    let data_dir = base_dir.join("data");
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)
            .map_err(|e| copy_err(format!("failed to create data directory: {e}")))?;
        info!(
            "created {}; put squads.csv and stats.csv there or set [data_paths]",
            data_dir.display()
        );
    }

    Ok(copied)
}

/// Write `source` to `target` unless `target` already exists. Never
/// overwrites a league file the user has edited.
fn copy_if_missing(source: &Path, target: &Path) -> Result<bool, ConfigError> {
    let mut dest = match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)
    {
        Ok(dest) => dest,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => {
            return Err(ConfigError::DefaultsCopyError {
                message: format!("failed to create {}: {e}", target.display()),
            })
        }
    };
    let content = std::fs::read(source).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read {}: {e}", source.display()),
    })?;
    std::io::Write::write_all(&mut dest, &content).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to write {}: {e}", target.display()),
    })?;
    Ok(true)
}

/// Per-user league file, e.g. `~/.config/matchday/league.toml` on Linux.
pub fn user_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "matchday").map(|dirs| dirs.config_dir().join("league.toml"))
}

/// Load config relative to the current working directory, copying defaults
/// first. Outside a project directory the per-user file is used if present.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;

    if !cwd.join("config").exists() && !cwd.join("defaults").exists() {
        if let Some(path) = user_config_path().filter(|p| p.exists()) {
            info!("using user config {}", path.display());
            return load_config_file(&path);
        }
    }

    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.league.name.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "league.name".into(),
            message: "must not be empty".into(),
        });
    }

    if config.league.sub_limit == 0 {
        return Err(ConfigError::ValidationError {
            field: "league.sub_limit".into(),
            message: "must be greater than 0".into(),
        });
    }

    let paths = [
        ("data_paths.squads", &config.data_paths.squads),
        ("data_paths.stats", &config.data_paths.stats),
    ];
    for (name, value) in paths {
        if value.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must not be empty".into(),
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
