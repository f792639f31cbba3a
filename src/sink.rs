//! Persistence of extracted records
//!
//! The importer hands a sink one batch per product type. A batch is stored
//! entirely or not at all; a failed batch never affects the other products.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

use crate::types::{ProductRecord, ProductType};

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("batch rejected: {0}")]
    Rejected(String),
}

/// All records of one product from one commit
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RecordBatch<'a> {
    pub run_id: Uuid,
    pub institution: &'a str,
    pub product: ProductType,
    pub records: &'a [ProductRecord],
}

/// Destination of committed records
pub trait RecordSink {
    /// Store a whole batch atomically, returning the number of records stored
    fn persist_batch(&mut self, batch: &RecordBatch<'_>) -> Result<usize, SinkError>;
}

/// Keeps committed records in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    stored: BTreeMap<ProductType, Vec<ProductRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self, product: ProductType) -> &[ProductRecord] {
        self.stored.get(&product).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn total(&self) -> usize {
        self.stored.values().map(Vec::len).sum()
    }
}

impl RecordSink for MemorySink {
    fn persist_batch(&mut self, batch: &RecordBatch<'_>) -> Result<usize, SinkError> {
        if let Some(stray) = batch.records.iter().find(|r| r.product() != batch.product) {
            return Err(SinkError::Rejected(format!(
                "{} record in a {} batch",
                stray.product(),
                batch.product
            )));
        }
        self.stored
            .entry(batch.product)
            .or_default()
            .extend_from_slice(batch.records);
        Ok(batch.records.len())
    }
}

/// Writes each batch to `<dir>/<product>.json`, replacing any previous file
#[derive(Debug, Clone)]
pub struct JsonDirSink {
    dir: PathBuf,
}

impl JsonDirSink {
    /// Create the sink, creating `dir` if needed
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self, SinkError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn path_for(&self, product: ProductType) -> PathBuf {
        self.dir.join(format!("{}.json", product.key()))
    }
}

impl RecordSink for JsonDirSink {
    fn persist_batch(&mut self, batch: &RecordBatch<'_>) -> Result<usize, SinkError> {
        let target = self.path_for(batch.product);
        let staging = target.with_extension("json.tmp");

        let content = serde_json::to_string_pretty(batch)?;
        // same-directory rename replaces the target atomically
        let written = fs::write(&staging, content).and_then(|()| fs::rename(&staging, &target));
        if let Err(e) = written {
            let _ = fs::remove_file(&staging);
            return Err(e.into());
        }

        tracing::debug!(path = %target.display(), records = batch.records.len(), "batch written");
        Ok(batch.records.len())
    }
}
