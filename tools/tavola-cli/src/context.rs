//! CLI execution context.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context as _, Result};
use tavola_cache::{Cache, SessionId};
use tavola_commerce::cart::CartStore;
use tavola_commerce::storage::SessionCartStorage;
use tavola_data::ApiClient;
use tracing::debug;

use crate::config::{CliConfig, CONFIG_NAMES};
use crate::output::Output;

/// Execution context for CLI commands.
pub struct Context {
    pub config: CliConfig,
    pub output: Output,
    pub cwd: PathBuf,
    /// File the config was read from, if any.
    pub config_path: Option<PathBuf>,
}

impl Context {
    /// Load context from config file, applying `env` overrides.
    pub fn load(config_path: Option<&str>, env: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (config, config_path) = match config_path {
            Some(path) => (CliConfig::load(path)?, Some(PathBuf::from(path))),
            None => match Self::find_config(&cwd) {
                Some(path) => (CliConfig::load(&path.to_string_lossy())?, Some(path)),
                None => (CliConfig::default(), None),
            },
        };

        let config = match env {
            Some(env) => config.for_environment(env)?,
            None => config,
        };

        Ok(Self {
            config,
            output,
            cwd,
            config_path,
        })
    }

    /// Find config file in directory tree.
    fn find_config(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            for name in &CONFIG_NAMES {
                let candidate = current.join(name);
                if candidate.exists() {
                    return Some(candidate);
                }
            }

            if !current.pop() {
                return None;
            }
        }
    }

    /// HTTP client for the configured API.
    pub fn client(&self) -> Result<ApiClient> {
        let mut client = ApiClient::new(&self.config.api.base_url)
            .with_context(|| format!("Invalid api.base_url: {}", self.config.api.base_url))?;
        if let Some(ms) = self.config.api.timeout_ms {
            client = client.with_timeout(Duration::from_millis(ms));
        }
        Ok(client)
    }

    /// Directory of the session cache.
    pub fn session_dir(&self) -> PathBuf {
        match self.config.session.dir {
            Some(ref dir) => self.resolve_path(dir),
            None => dirs_path().join("tavola").join("session"),
        }
    }

    /// Open the persisted cart of the configured session.
    pub fn cart_store(&self) -> Result<CartStore<SessionCartStorage>> {
        let dir = self.session_dir();
        debug!(dir = %dir.display(), session = %self.config.session.id, "opening cart");
        let cache = Cache::open_dir(&dir)
            .with_context(|| format!("Failed to open session cache: {}", dir.display()))?;
        let storage = SessionCartStorage::new(cache, SessionId::new(self.config.session.id.clone()));
        CartStore::open(storage).context("Failed to load cart")
    }

    /// Resolve a path relative to the working directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        if PathBuf::from(path).is_absolute() {
            PathBuf::from(path)
        } else {
            self.cwd.join(path)
        }
    }
}

/// Get the platform-specific data directory.
fn dirs_path() -> PathBuf {
    if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".local").join("share")
    } else {
        PathBuf::from("/tmp")
    }
}
