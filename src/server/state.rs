//! Server state and configuration.

use std::path::PathBuf;
use std::time::Instant;

use crate::error::CardpressError;
use crate::render::AssetLoader;
use crate::store::Store;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080")
    pub listen_addr: String,
    /// Directory holding `templates.json` and `users.json`
    pub data_dir: PathBuf,
    /// Directory that asset-path image sources resolve against
    pub asset_dir: Option<PathBuf>,
}

/// Application state shared across handlers.
pub struct AppState {
    pub config: ServerConfig,
    pub store: Store,
    pub assets: AssetLoader,
    pub started: Instant,
}

impl AppState {
    /// Open the store and build the HTTP asset loader.
    pub async fn open(config: ServerConfig) -> Result<Self, CardpressError> {
        let store = Store::open(&config.data_dir).await?;
        let assets = AssetLoader::http(config.asset_dir.clone())?;
        Ok(Self::new(config, store, assets))
    }

    pub fn new(config: ServerConfig, store: Store, assets: AssetLoader) -> Self {
        Self {
            config,
            store,
            assets,
            started: Instant::now(),
        }
    }
}
