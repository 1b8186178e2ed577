// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use thiserror::Error;

use crate::{ChangeRecord, DatasetEntry, DatasetId, EngineError, Row, RowFields, RowId};

/// Contract of the remote store holding the datasets.
///
/// Calls block until the store answers. Implementations never retry on their
/// own; the engine maps their errors onto [`crate::EngineError`].
pub trait SyncClient {
    /// Datasets, newest `created_at` first.
    fn list_datasets(&mut self) -> Result<Vec<DatasetEntry>>;

    /// Every row of the dataset, ordered by ascending id.
    fn fetch_rows(&mut self, dataset: &DatasetId) -> Result<Vec<Row>>;

    /// Inserts one row; the store assigns the id.
    fn add_row(&mut self, dataset: &DatasetId, fields: &RowFields) -> Result<Row>;

    /// Applies each record's changed fields to the row with the same id.
    /// A record for an id the store does not have fails with [`RowNotFound`].
    fn batch_upsert(&mut self, dataset: &DatasetId, changes: &[ChangeRecord]) -> Result<()>;

    /// Deletes by id and returns the ids actually removed. Empty input is a
    /// no-op.
    fn delete_rows(&mut self, dataset: &DatasetId, ids: &[RowId]) -> Result<Vec<RowId>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("row {id} not found in dataset {dataset} -- reload the dataset and retry")]
pub struct RowNotFound {
    pub dataset: DatasetId,
    pub id: RowId,
}

/// Dataset listing for the picker, newest first even if the store returns
/// another order.
pub fn list_datasets(client: &mut dyn SyncClient) -> Result<Vec<DatasetEntry>, EngineError> {
    let mut entries = client.list_datasets().map_err(EngineError::Fetch)?;
    entries.sort_by(|left, right| right.created_at.cmp(&left.created_at));
    Ok(entries)
}
