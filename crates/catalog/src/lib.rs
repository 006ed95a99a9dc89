use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::RwLock;
use tripit_core::DestinationRecord;

#[derive(Debug, Clone)]
pub struct CatalogStats {
    pub destinations_loaded: usize,
}

/// In-memory read-through cache over the destination dataset.
///
/// Readers take a cheap snapshot; `reload` swaps the whole dataset at once.
#[derive(Clone)]
pub struct DestinationCatalog {
    source: Option<PathBuf>,
    records: Arc<RwLock<Arc<Vec<DestinationRecord>>>>,
}

impl DestinationCatalog {
    /// Loads the dataset at `path`. A missing or unreadable file leaves the
    /// catalog empty instead of failing startup.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let records = match load_records(&path) {
            Ok(records) => {
                tracing::info!(
                    path = %path.display(),
                    destinations = records.len(),
                    "destination catalog loaded"
                );
                records
            }
            Err(err) => {
                tracing::error!(
                    path = %path.display(),
                    error = %format!("{err:#}"),
                    "destination catalog unavailable"
                );
                Vec::new()
            }
        };

        Self {
            source: Some(path),
            records: Arc::new(RwLock::new(Arc::new(records))),
        }
    }

    pub fn from_records(records: Vec<DestinationRecord>) -> Self {
        Self {
            source: None,
            records: Arc::new(RwLock::new(Arc::new(normalize(records)))),
        }
    }

    pub fn get_all(&self) -> Arc<Vec<DestinationRecord>> {
        self.records.read().clone()
    }

    pub fn get_by_id(&self, id: &str) -> Option<DestinationRecord> {
        self.records
            .read()
            .iter()
            .find(|record| record.id == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Re-reads the source file. On error the previous dataset stays in place.
    pub fn reload(&self) -> Result<usize> {
        let Some(path) = &self.source else {
            return Ok(self.len());
        };

        let records = load_records(path)?;
        let count = records.len();
        *self.records.write() = Arc::new(records);
        tracing::info!(
            path = %path.display(),
            destinations = count,
            "destination catalog reloaded"
        );
        Ok(count)
    }

    pub fn stats(&self) -> CatalogStats {
        CatalogStats {
            destinations_loaded: self.len(),
        }
    }
}

fn load_records(path: &Path) -> Result<Vec<DestinationRecord>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed reading destination catalog: {}", path.display()))?;
    let records = serde_json::from_str::<Vec<DestinationRecord>>(&raw)
        .with_context(|| format!("invalid destination catalog json: {}", path.display()))?;
    Ok(normalize(records))
}

fn normalize(records: Vec<DestinationRecord>) -> Vec<DestinationRecord> {
    records
        .into_iter()
        .map(|mut record| {
            record.tags = lowercase_labels(record.tags);
            record.best_for = lowercase_labels(record.best_for);
            record
        })
        .collect()
}

fn lowercase_labels(labels: Vec<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(labels.len());
    for label in labels {
        let label = label.trim().to_lowercase();
        if !label.is_empty() && !out.contains(&label) {
            out.push(label);
        }
    }
    out
}
