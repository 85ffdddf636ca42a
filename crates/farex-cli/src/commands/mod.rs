//! CLI subcommands.

pub mod ingest;
pub mod process;
pub mod report;
pub mod sync;

use std::path::PathBuf;

use anyhow::Context as _;
use farex_core::{FarexConfig, JsonStore, Pipeline};

/// Resolved configuration shared by every subcommand.
pub struct Context {
    pub config: FarexConfig,
}

impl Context {
    /// Load the config file (or defaults) and apply flag overrides.
    ///
    /// Without an explicit config, the store snapshot and media root live
    /// under the user data directory.
    pub fn new(
        config_path: Option<&str>,
        state: Option<PathBuf>,
        media_root: Option<PathBuf>,
    ) -> anyhow::Result<Self> {
        let mut config = match config_path {
            Some(path) => FarexConfig::from_file(std::path::Path::new(path))
                .with_context(|| format!("failed to load config from {path}"))?,
            None => {
                let base = dirs::data_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("farex");
                let mut config = FarexConfig::default();
                config.storage.state_path = base.join("farex.json");
                config.storage.media_root = base.join("media");
                config
            }
        };

        if let Some(state) = state {
            config.storage.state_path = state;
        }
        if let Some(media_root) = media_root {
            config.storage.media_root = media_root;
        }

        Ok(Self { config })
    }

    /// Open the store and build a pipeline over it.
    pub fn pipeline(&self) -> anyhow::Result<Pipeline<JsonStore>> {
        let store = JsonStore::open(&self.config.storage.state_path)?;
        Ok(Pipeline::new(&self.config, store)?)
    }
}
