// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use tracing::{debug, info, warn};

use crate::{ChangeRecord, DatasetId, EngineError, RowStore, SyncClient};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EditMode {
    #[default]
    NotEditing,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditCommand {
    StartEdit,
    Save,
    /// Discarding edits is destructive; without `confirmed` the controller
    /// only asks for confirmation.
    Cancel { confirmed: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditEvent {
    ModeChanged(EditMode),
    Saved(Vec<ChangeRecord>),
    NothingToSave,
    EditsDiscarded,
    CancelNeedsConfirmation,
}

impl EditEvent {
    pub fn status_message(&self) -> Option<String> {
        match self {
            Self::ModeChanged(EditMode::Editing) => Some("editing".to_owned()),
            Self::ModeChanged(EditMode::NotEditing) => None,
            Self::Saved(changes) => Some(match changes.len() {
                1 => "saved 1 row".to_owned(),
                count => format!("saved {count} rows"),
            }),
            Self::NothingToSave => Some("nothing to save".to_owned()),
            Self::EditsDiscarded => Some("edits discarded".to_owned()),
            Self::CancelNeedsConfirmation => {
                Some("discard all unsaved edits? confirm to cancel".to_owned())
            }
        }
    }
}

/// Edit-mode state machine for the displayed dataset.
///
/// `NotEditing --StartEdit--> Editing`, `Editing --Save--> NotEditing` once
/// the change-set is stored, `Editing --Cancel{confirmed}--> NotEditing`
/// after reverting. Commands that do not apply to the current mode are
/// ignored and produce no events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditController {
    mode: EditMode,
}

impl EditController {
    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn is_editing(&self) -> bool {
        self.mode == EditMode::Editing
    }

    pub fn dispatch(
        &mut self,
        command: EditCommand,
        dataset: &DatasetId,
        store: &mut RowStore,
        client: &mut dyn SyncClient,
    ) -> Result<Vec<EditEvent>, EngineError> {
        match (self.mode, command) {
            (EditMode::NotEditing, EditCommand::StartEdit) => {
                self.mode = EditMode::Editing;
                Ok(vec![EditEvent::ModeChanged(self.mode)])
            }
            (EditMode::Editing, EditCommand::Save) => self.save(dataset, store, client),
            (EditMode::Editing, EditCommand::Cancel { confirmed: false }) => {
                Ok(vec![EditEvent::CancelNeedsConfirmation])
            }
            (EditMode::Editing, EditCommand::Cancel { confirmed: true }) => {
                store.revert();
                self.mode = EditMode::NotEditing;
                debug!(dataset = %dataset, "edits discarded");
                Ok(vec![
                    EditEvent::EditsDiscarded,
                    EditEvent::ModeChanged(self.mode),
                ])
            }
            (mode, command) => {
                debug!(?mode, ?command, "command ignored in current mode");
                Ok(Vec::new())
            }
        }
    }

    fn save(
        &mut self,
        dataset: &DatasetId,
        store: &mut RowStore,
        client: &mut dyn SyncClient,
    ) -> Result<Vec<EditEvent>, EngineError> {
        let changes = store.pending_changes();
        if changes.is_empty() {
            self.mode = EditMode::NotEditing;
            return Ok(vec![
                EditEvent::NothingToSave,
                EditEvent::ModeChanged(self.mode),
            ]);
        }

        if let Err(error) = client.batch_upsert(dataset, &changes) {
            warn!(
                dataset = %dataset,
                rows = changes.len(),
                "batch save failed; staying in edit mode"
            );
            return Err(EngineError::Save(error));
        }

        store.commit_snapshot();
        self.mode = EditMode::NotEditing;
        info!(dataset = %dataset, rows = changes.len(), "saved edits");
        Ok(vec![
            EditEvent::Saved(changes),
            EditEvent::ModeChanged(self.mode),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::{EditCommand, EditController, EditEvent, EditMode};
    use crate::{
        ChangeRecord, DatasetEntry, DatasetId, Field, Row, RowFields, RowId, RowStore, SyncClient,
    };
    use anyhow::{Result, bail};

    #[derive(Default)]
    struct StubClient {
        fail_upserts: bool,
        upserts: Vec<Vec<ChangeRecord>>,
    }

    impl SyncClient for StubClient {
        fn list_datasets(&mut self) -> Result<Vec<DatasetEntry>> {
            Ok(Vec::new())
        }

        fn fetch_rows(&mut self, _dataset: &DatasetId) -> Result<Vec<Row>> {
            Ok(Vec::new())
        }

        fn add_row(&mut self, _dataset: &DatasetId, fields: &RowFields) -> Result<Row> {
            Ok(Row::new(RowId::new(1), fields.clone()))
        }

        fn batch_upsert(&mut self, _dataset: &DatasetId, changes: &[ChangeRecord]) -> Result<()> {
            if self.fail_upserts {
                bail!("store unavailable");
            }
            self.upserts.push(changes.to_vec());
            Ok(())
        }

        fn delete_rows(&mut self, _dataset: &DatasetId, ids: &[RowId]) -> Result<Vec<RowId>> {
            Ok(ids.to_vec())
        }
    }

    fn dataset() -> DatasetId {
        DatasetId::parse("leads_test").expect("valid dataset id")
    }

    fn store() -> RowStore {
        RowStore::from_rows(vec![Row::new(
            RowId::new(1),
            RowFields {
                deal_stage: Some("Interest".to_owned()),
                ..RowFields::default()
            },
        )])
    }

    #[test]
    fn start_edit_has_no_side_effects() -> Result<()> {
        let mut controller = EditController::default();
        let mut store = store();
        let mut client = StubClient::default();

        let events =
            controller.dispatch(EditCommand::StartEdit, &dataset(), &mut store, &mut client)?;
        assert_eq!(events, vec![EditEvent::ModeChanged(EditMode::Editing)]);
        assert!(client.upserts.is_empty());
        assert!(!store.is_dirty());
        Ok(())
    }

    #[test]
    fn empty_save_skips_network_call() -> Result<()> {
        let mut controller = EditController::default();
        let mut store = store();
        let mut client = StubClient::default();
        controller.dispatch(EditCommand::StartEdit, &dataset(), &mut store, &mut client)?;

        let events = controller.dispatch(EditCommand::Save, &dataset(), &mut store, &mut client)?;
        assert_eq!(
            events,
            vec![
                EditEvent::NothingToSave,
                EditEvent::ModeChanged(EditMode::NotEditing)
            ]
        );
        assert!(client.upserts.is_empty());
        Ok(())
    }

    #[test]
    fn failed_save_keeps_edit_mode_and_working_copy() -> Result<()> {
        let mut controller = EditController::default();
        let mut store = store();
        let mut client = StubClient {
            fail_upserts: true,
            ..StubClient::default()
        };
        controller.dispatch(EditCommand::StartEdit, &dataset(), &mut store, &mut client)?;
        store.set_field(0, Field::DealStage, Some("Closed Won".to_owned()))?;

        let error = controller
            .dispatch(EditCommand::Save, &dataset(), &mut store, &mut client)
            .expect_err("save should fail");
        assert_eq!(error.kind(), "save");
        assert_eq!(controller.mode(), EditMode::Editing);
        assert_eq!(store.working()[0].get(Field::DealStage), Some("Closed Won"));
        assert_eq!(store.original()[0].get(Field::DealStage), Some("Interest"));
        Ok(())
    }

    #[test]
    fn unconfirmed_cancel_only_asks() -> Result<()> {
        let mut controller = EditController::default();
        let mut store = store();
        let mut client = StubClient::default();
        controller.dispatch(EditCommand::StartEdit, &dataset(), &mut store, &mut client)?;
        store.set_field(0, Field::Company, Some("Acme".to_owned()))?;

        let events = controller.dispatch(
            EditCommand::Cancel { confirmed: false },
            &dataset(),
            &mut store,
            &mut client,
        )?;
        assert_eq!(events, vec![EditEvent::CancelNeedsConfirmation]);
        assert!(controller.is_editing());
        assert!(store.is_dirty());

        controller.dispatch(
            EditCommand::Cancel { confirmed: true },
            &dataset(),
            &mut store,
            &mut client,
        )?;
        assert!(!controller.is_editing());
        assert!(!store.is_dirty());
        Ok(())
    }

    #[test]
    fn save_outside_edit_mode_is_ignored() -> Result<()> {
        let mut controller = EditController::default();
        let mut store = store();
        let mut client = StubClient::default();
        let events = controller.dispatch(EditCommand::Save, &dataset(), &mut store, &mut client)?;
        assert!(events.is_empty());
        assert_eq!(controller.mode(), EditMode::NotEditing);
        Ok(())
    }

    #[test]
    fn saved_status_is_pluralized() {
        assert_eq!(
            EditEvent::Saved(Vec::new()).status_message().as_deref(),
            Some("saved 0 rows")
        );
        assert_eq!(
            EditEvent::ModeChanged(EditMode::NotEditing).status_message(),
            None
        );
    }
}
