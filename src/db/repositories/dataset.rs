use std::collections::HashMap;

use anyhow::{Context, Result, bail};
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::architect::{ArchitectRepository, NewArchitect};
use super::building::{BuildingRepository, NewBuilding};

/// Catalogue document accepted by `import`.
///
/// ```json
/// { "architects": [{ "slug": "tadao-ando", "name_ja": "安藤忠雄" }],
///   "buildings": [{ "uid": "b1", "slug": "church-of-the-light",
///                   "title": "光の教会", "architects": ["tadao-ando"] }] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub architects: Vec<NewArchitect>,
    #[serde(default)]
    pub buildings: Vec<DatasetBuilding>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetBuilding {
    #[serde(flatten)]
    pub building: NewBuilding,
    /// Architect slugs in display order.
    #[serde(default)]
    pub architects: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub architects: usize,
    pub buildings: usize,
    pub links: usize,
}

pub struct DatasetRepository {
    conn: DatabaseConnection,
}

impl DatasetRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Inserts the whole dataset in one transaction. Unknown architect slugs
    /// abort the import.
    pub async fn import(&self, dataset: &Dataset) -> Result<ImportSummary> {
        let txn = self.conn.begin().await?;
        let mut summary = ImportSummary::default();

        let mut ids_by_slug: HashMap<&str, i32> = HashMap::new();
        for architect in &dataset.architects {
            let id = ArchitectRepository::insert_with(&txn, architect)
                .await
                .with_context(|| format!("failed to insert architect '{}'", architect.slug))?;
            ids_by_slug.insert(&architect.slug, id);
            summary.architects += 1;
        }

        for entry in &dataset.buildings {
            let building_id = BuildingRepository::insert_with(&txn, &entry.building)
                .await
                .with_context(|| format!("failed to insert building '{}'", entry.building.slug))?;
            summary.buildings += 1;

            for (order, slug) in entry.architects.iter().enumerate() {
                let Some(architect_id) = ids_by_slug.get(slug.as_str()) else {
                    bail!(
                        "building '{}' references unknown architect '{slug}'",
                        entry.building.slug
                    );
                };
                let order = i32::try_from(order).context("architect list too long")?;
                ArchitectRepository::link_with(&txn, building_id, *architect_id, order).await?;
                summary.links += 1;
            }
        }

        txn.commit().await?;

        info!(
            architects = summary.architects,
            buildings = summary.buildings,
            links = summary.links,
            "Dataset imported"
        );
        Ok(summary)
    }
}
