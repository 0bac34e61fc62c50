//! Storage setup and initialization

use anyhow::{Context, Result};
use filegate_core::Config;
use filegate_storage::{create_storage, Storage};
use std::sync::Arc;

pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    tracing::info!(root = %config.storage_root().display(), "Initializing storage...");
    let storage = create_storage(config)
        .await
        .context("Failed to initialize storage")?;
    tracing::info!(
        backend = %storage.backend_type(),
        "Storage initialized successfully"
    );
    Ok(storage)
}
