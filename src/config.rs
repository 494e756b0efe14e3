//! Application configuration
//!
//! Loaded from `<data_dir>/config.toml`. Every field is optional in the
//! file and merged over built-in defaults. The publish repository (and
//! with it, the credentials git uses to push) is configured here, out of
//! band of the record and the generated artifacts.
//!
//! ```toml
//! [publish]
//! repo-dir = "/home/me/goals-site"
//! remote = "origin"
//! branch = "gh-pages"
//! ```

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::util::paths;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the SQLite record database
    pub db_path: PathBuf,
    /// Directory the built site is swapped into
    pub site_dir: PathBuf,
    /// Staging directory for in-progress builds
    pub staging_dir: PathBuf,
    /// Publish target; None disables the transport step
    pub publish: Option<PublishConfig>,
}

/// Where and how the built site is pushed
#[derive(Debug, Clone)]
pub struct PublishConfig {
    /// Git repository whose hosting branch receives the site
    pub repo_dir: PathBuf,
    /// Remote to push to
    pub remote: String,
    /// Hosting branch name
    pub branch: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct TomlConfig {
    db_path: Option<PathBuf>,
    site_dir: Option<PathBuf>,
    publish: Option<TomlPublishConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct TomlPublishConfig {
    repo_dir: Option<PathBuf>,
    remote: Option<String>,
    branch: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: paths::database_path(),
            site_dir: paths::site_dir(),
            staging_dir: paths::data_dir().join("site.new"),
            publish: None,
        }
    }
}

impl Config {
    /// Load configuration from the default location, falling back to
    /// defaults when the file doesn't exist.
    pub fn load() -> Self {
        Self::load_from(&paths::config_path())
    }

    /// Load configuration from a specific file path.
    ///
    /// A missing file yields the defaults; a malformed file is reported
    /// and otherwise treated the same way so a typo never bricks the CLI.
    pub fn load_from(path: &Path) -> Self {
        let mut config = Config::default();

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(_) => return config,
        };

        let parsed: TomlConfig = match toml::from_str(&contents) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring malformed config");
                return config;
            }
        };

        if let Some(db_path) = parsed.db_path {
            config.db_path = db_path;
        }
        if let Some(site_dir) = parsed.site_dir {
            config.staging_dir = site_dir.with_extension("new");
            config.site_dir = site_dir;
        }
        if let Some(publish) = parsed.publish {
            if let Some(repo_dir) = publish.repo_dir {
                config.publish = Some(PublishConfig {
                    repo_dir,
                    remote: publish.remote.unwrap_or_else(|| "origin".to_string()),
                    branch: publish.branch.unwrap_or_else(|| "gh-pages".to_string()),
                });
            } else {
                tracing::warn!("[publish] section without repo-dir; transport disabled");
            }
        }

        config
    }
}
