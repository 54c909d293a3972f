//! Dataset import command handler

use std::path::Path;

use anyhow::Context;

use crate::config::Config;
use crate::db::{Dataset, Store};

pub async fn cmd_import(config: &Config, path: &str) -> anyhow::Result<()> {
    let import_path = Path::new(path);

    if !import_path.is_file() {
        println!("File does not exist: {path}");
        return Ok(());
    }

    let content = tokio::fs::read_to_string(import_path)
        .await
        .with_context(|| format!("Failed to read dataset: {path}"))?;
    let dataset: Dataset = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse dataset: {path}"))?;

    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;
    let summary = store.import_dataset(&dataset).await?;

    println!(
        "✓ Imported {} architects, {} buildings and {} credits",
        summary.architects, summary.buildings, summary.links
    );
    println!("Run 'pocketnavi cache clear' if cached results should reflect the new data.");
    Ok(())
}
