use std::path::Path;

use parley_entities::services::StaticCatalog;
use tracing::{info, warn};


pub fn read_catalog(path: &Path) -> Result<StaticCatalog, anyhow::Error> {
    let content = std::fs::read_to_string(path)?;
    let catalog = serde_yaml::from_str::<StaticCatalog>(&content)?;
    info!("Loaded {} events and {} cases from {}", catalog.events.len(), catalog.cases.len(), path.display());
    Ok(catalog)
}

/// Reads the catalog, or starts with an empty one if the file does not exist.
pub fn read_catalog_or_empty(path: &Path) -> Result<StaticCatalog, anyhow::Error> {
    if !path.exists() {
        warn!("No catalog at {}, serving without events", path.display());
        return Ok(StaticCatalog::default());
    }
    read_catalog(path)
}
