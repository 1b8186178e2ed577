// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use tracing::debug;

use crate::{
    ChangeRecord, DatasetId, EngineError, Field, Row, RowId, SyncClient, clone_rows, diff_rows,
};

/// Working copy and last-synced baseline of one dataset's rows.
///
/// Only `set_field` and `revert` touch the working copy, and only
/// `replace` and `commit_snapshot` touch the baseline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowStore {
    working: Vec<Row>,
    original: Vec<Row>,
}

impl RowStore {
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let mut store = Self::default();
        store.replace(rows);
        store
    }

    /// Full fetch of `dataset`, replacing both copies.
    pub fn load(
        &mut self,
        client: &mut dyn SyncClient,
        dataset: &DatasetId,
    ) -> Result<&[Row], EngineError> {
        let rows = client.fetch_rows(dataset).map_err(EngineError::Fetch)?;
        debug!(dataset = %dataset, rows = rows.len(), "fetched dataset");
        self.replace(rows);
        Ok(&self.working)
    }

    /// Installs a freshly fetched row set as both working copy and baseline.
    /// Rows are ordered by ascending id regardless of the order received.
    pub fn replace(&mut self, mut rows: Vec<Row>) {
        rows.sort_by_key(|row| row.id);
        self.original = clone_rows(&rows);
        self.working = rows;
    }

    pub fn working(&self) -> &[Row] {
        &self.working
    }

    pub fn original(&self) -> &[Row] {
        &self.original
    }

    pub fn len(&self) -> usize {
        self.working.len()
    }

    pub fn is_empty(&self) -> bool {
        self.working.is_empty()
    }

    pub fn position(&self, id: RowId) -> Option<usize> {
        self.working.iter().position(|row| row.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = RowId> + '_ {
        self.working.iter().map(|row| row.id)
    }

    pub fn set_field(
        &mut self,
        row_index: usize,
        field: Field,
        value: Option<String>,
    ) -> Result<(), EngineError> {
        let len = self.working.len();
        let row = self
            .working
            .get_mut(row_index)
            .ok_or(EngineError::RowOutOfRange {
                index: row_index,
                len,
            })?;
        row.set(field, value);
        Ok(())
    }

    pub fn revert(&mut self) {
        self.working = clone_rows(&self.original);
    }

    pub fn commit_snapshot(&mut self) {
        self.original = clone_rows(&self.working);
    }

    pub fn pending_changes(&self) -> Vec<ChangeRecord> {
        diff_rows(&self.working, &self.original)
    }

    pub fn is_dirty(&self) -> bool {
        self.working != self.original
    }
}
