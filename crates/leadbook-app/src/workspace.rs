// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::anyhow;
use time::Date;
use tracing::{debug, info, warn};

use crate::columns::{ColumnDescriptor, RenderedCell, format_day, render_cell};
use crate::{
    DatasetId, EditCommand, EditController, EditEvent, EditMode, EngineError, Field, NewRowInput,
    PageView, Row, RowId, RowStore, Selection, SyncClient, TableView,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolbarState {
    pub selected: usize,
    pub can_delete: bool,
    pub can_deselect: bool,
}

/// Everything behind one displayed dataset: rows, view state, selection and
/// edit mode. All mutations run on the caller's thread; only the
/// [`SyncClient`] calls leave the process.
#[derive(Debug, Clone)]
pub struct Workspace {
    dataset: DatasetId,
    store: RowStore,
    view: TableView,
    selection: Selection,
    editor: EditController,
    status_line: Option<String>,
}

impl Workspace {
    pub fn open(
        client: &mut dyn SyncClient,
        dataset: DatasetId,
        view: TableView,
    ) -> Result<Self, EngineError> {
        let mut store = RowStore::default();
        store.load(client, &dataset)?;
        Ok(Self {
            dataset,
            store,
            view,
            selection: Selection::default(),
            editor: EditController::default(),
            status_line: None,
        })
    }

    pub fn dataset(&self) -> &DatasetId {
        &self.dataset
    }

    pub fn rows(&self) -> &[Row] {
        self.store.working()
    }

    pub fn store(&self) -> &RowStore {
        &self.store
    }

    pub fn view(&self) -> &TableView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut TableView {
        &mut self.view
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn mode(&self) -> EditMode {
        self.editor.mode()
    }

    pub fn status_line(&self) -> Option<&str> {
        self.status_line.as_deref()
    }

    pub fn clear_status(&mut self) {
        self.status_line = None;
    }

    /// Full refetch. Replaces both row copies and prunes the selection.
    /// Refused while unsaved edits exist.
    pub fn reload(&mut self, client: &mut dyn SyncClient) -> Result<(), EngineError> {
        self.ensure_clean()?;
        let result = self.store.load(client, &self.dataset).map(|_| ());
        if let Err(error) = &result {
            self.notify(error.to_string());
            return result;
        }
        let dropped = self.selection.reconcile(self.store.ids());
        if dropped > 0 {
            debug!(dataset = %self.dataset, dropped, "pruned selection after reload");
        }
        result
    }

    pub fn page(&mut self) -> PageView {
        self.view.page(self.store.working())
    }

    pub fn next_page(&mut self) {
        let total = self.view.ordered(self.store.working()).len();
        self.view.pagination.next(total);
    }

    pub fn previous_page(&mut self) {
        let total = self.view.ordered(self.store.working()).len();
        self.view.pagination.previous(total);
    }

    pub fn render_cell(&self, row_index: usize, column: &ColumnDescriptor) -> Option<RenderedCell> {
        let row = self.store.working().get(row_index)?;
        Some(render_cell(column, row.get(column.field), self.editor.mode()))
    }

    pub fn dispatch(
        &mut self,
        client: &mut dyn SyncClient,
        command: EditCommand,
    ) -> Result<Vec<EditEvent>, EngineError> {
        match self
            .editor
            .dispatch(command, &self.dataset, &mut self.store, client)
        {
            Ok(events) => {
                if let Some(message) = events.iter().rev().find_map(EditEvent::status_message) {
                    self.notify(message);
                }
                Ok(events)
            }
            Err(error) => {
                self.notify(error.to_string());
                Err(error)
            }
        }
    }

    pub fn set_field(
        &mut self,
        row_index: usize,
        field: Field,
        value: Option<String>,
    ) -> Result<(), EngineError> {
        if !self.editor.is_editing() {
            return Err(EngineError::EditModeRequired);
        }
        self.store.set_field(row_index, field, value)
    }

    pub fn set_field_by_id(
        &mut self,
        id: RowId,
        field: Field,
        value: Option<String>,
    ) -> Result<(), EngineError> {
        let index = self
            .store
            .position(id)
            .ok_or(EngineError::UnknownRow(id))?;
        self.set_field(index, field, value)
    }

    /// Date editor: always writes a concrete `YYYY-MM-DD` day.
    pub fn set_date(&mut self, row_index: usize, date: Date) -> Result<(), EngineError> {
        self.set_field(row_index, Field::Date, Some(format_day(date)))
    }

    pub fn toggle_selected(&mut self, id: RowId) {
        self.selection.toggle(id);
    }

    /// Selects exactly the rows on the current page.
    pub fn select_visible(&mut self) {
        let page = self.page();
        let rows = self.store.working();
        self.selection
            .select_all(page.rows.iter().map(|index| rows[*index].id));
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn toolbar(&self) -> ToolbarState {
        let selected = self.selection.len();
        ToolbarState {
            selected,
            can_delete: selected > 0,
            can_deselect: selected > 0,
        }
    }

    /// Validates and inserts a new row, then refetches the dataset. On
    /// success the form is reset.
    pub fn add_row(
        &mut self,
        client: &mut dyn SyncClient,
        input: &mut NewRowInput,
    ) -> Result<Row, EngineError> {
        if let Err(error) = input.validate() {
            let error = EngineError::Validation(error);
            self.notify(error.to_string());
            return Err(error);
        }
        self.ensure_clean()?;

        let row = match client.add_row(&self.dataset, &input.to_fields()) {
            Ok(row) => row,
            Err(error) => {
                warn!(dataset = %self.dataset, "add row failed");
                let error = EngineError::Mutation(error);
                self.notify(error.to_string());
                return Err(error);
            }
        };
        info!(dataset = %self.dataset, id = %row.id, "row added");
        input.reset();

        self.reload(client)?;
        self.notify("row added".to_owned());
        Ok(row)
    }

    /// Deletes every selected row, then refetches. An empty selection makes
    /// no network call.
    pub fn delete_selected(
        &mut self,
        client: &mut dyn SyncClient,
    ) -> Result<Vec<RowId>, EngineError> {
        let ids = self.selection.ids();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.ensure_clean()?;

        let deleted = match client.delete_rows(&self.dataset, &ids) {
            Ok(deleted) => deleted,
            Err(error) => {
                warn!(dataset = %self.dataset, rows = ids.len(), "delete failed");
                let error = EngineError::Mutation(error);
                self.notify(error.to_string());
                return Err(error);
            }
        };
        info!(dataset = %self.dataset, rows = deleted.len(), "rows deleted");

        self.reload(client)?;
        self.notify(match deleted.len() {
            1 => "deleted 1 row".to_owned(),
            count => format!("deleted {count} rows"),
        });
        Ok(deleted)
    }

    /// Add, delete and reload refetch the whole dataset, which would silently
    /// drop unsaved cell edits.
    fn ensure_clean(&mut self) -> Result<(), EngineError> {
        if !self.store.is_dirty() {
            return Ok(());
        }
        let error = EngineError::Mutation(anyhow!(
            "unsaved edits pending -- save or cancel them first"
        ));
        self.notify(error.to_string());
        Err(error)
    }

    fn notify(&mut self, message: String) {
        self.status_line = Some(message);
    }
}
