// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use leadbook_app::{
    DatasetId, EditCommand, EditEvent, EditMode, EngineError, Field, NewRowInput, RowId,
    TableView, Workspace, list_datasets,
};
use leadbook_testkit::{Call, LeadFaker, MemoryRemote, Operation, lead};
use serde_json::json;
use time::{Date, Duration, Month, OffsetDateTime};

fn dataset() -> DatasetId {
    DatasetId::parse("leads_q2").expect("valid dataset id")
}

fn two_leads() -> Result<MemoryRemote> {
    MemoryRemote::new().with_dataset(
        "leads_q2",
        vec![
            lead(1, Some("2024-03-01"), Some("Interest"), Some("Acme")),
            lead(2, Some("2024-03-02"), Some("New Lead"), Some("Initech")),
        ],
    )
}

fn open(remote: &mut MemoryRemote) -> Result<Workspace> {
    Ok(Workspace::open(remote, dataset(), TableView::default())?)
}

fn new_lead() -> NewRowInput {
    NewRowInput {
        date: "2024-06-01".to_owned(),
        deal_stage: "Qualified".to_owned(),
        company: "Globex".to_owned(),
        ..NewRowInput::default()
    }
}

#[test]
fn save_sends_only_the_changed_field() -> Result<()> {
    let mut remote = two_leads()?;
    let mut workspace = open(&mut remote)?;
    assert_eq!(workspace.rows().len(), 2);

    workspace.dispatch(&mut remote, EditCommand::StartEdit)?;
    workspace.set_field(0, Field::DealStage, Some("Closed Won".to_owned()))?;
    let events = workspace.dispatch(&mut remote, EditCommand::Save)?;

    assert_eq!(events.last(), Some(&EditEvent::ModeChanged(EditMode::NotEditing)));
    let upserts = remote.upserts();
    assert_eq!(upserts.len(), 1);
    assert_eq!(
        serde_json::to_value(upserts[0])?,
        json!([{ "id": 1, "deal_stage": "Closed Won" }])
    );
    assert_eq!(workspace.store().original(), workspace.store().working());
    assert!(!workspace.store().is_dirty());
    assert_eq!(workspace.status_line(), Some("saved 1 row"));
    assert_eq!(
        remote.rows(&dataset())[0].get(Field::DealStage),
        Some("Closed Won")
    );
    Ok(())
}

#[test]
fn edits_require_edit_mode() -> Result<()> {
    let mut remote = two_leads()?;
    let mut workspace = open(&mut remote)?;

    let error = workspace
        .set_field(0, Field::Company, Some("Hooli".to_owned()))
        .expect_err("edit outside edit mode should fail");
    assert!(matches!(error, EngineError::EditModeRequired));
    assert_eq!(workspace.rows()[0].get(Field::Company), Some("Acme"));
    Ok(())
}

#[test]
fn failed_save_keeps_edits_and_edit_mode() -> Result<()> {
    let mut remote = two_leads()?;
    let mut workspace = open(&mut remote)?;
    workspace.dispatch(&mut remote, EditCommand::StartEdit)?;
    workspace.set_field_by_id(RowId::new(2), Field::Company, None)?;

    remote.fail(Operation::Upsert);
    let error = workspace
        .dispatch(&mut remote, EditCommand::Save)
        .expect_err("save should fail");
    assert_eq!(error.kind(), "save");
    assert_eq!(workspace.mode(), EditMode::Editing);
    assert_eq!(workspace.rows()[1].get(Field::Company), None);
    assert!(
        workspace
            .status_line()
            .is_some_and(|line| line.starts_with("save failed"))
    );

    remote.recover(Operation::Upsert);
    workspace.dispatch(&mut remote, EditCommand::Save)?;
    assert_eq!(workspace.mode(), EditMode::NotEditing);
    assert_eq!(remote.rows(&dataset())[1].get(Field::Company), None);
    Ok(())
}

#[test]
fn confirmed_cancel_restores_loaded_rows() -> Result<()> {
    let mut remote = two_leads()?;
    let mut workspace = open(&mut remote)?;
    let loaded = workspace.rows().to_vec();

    workspace.dispatch(&mut remote, EditCommand::StartEdit)?;
    workspace.set_field(0, Field::Company, Some(String::new()))?;
    workspace.set_date(
        1,
        Date::from_calendar_date(2025, Month::January, 9).expect("valid date"),
    )?;
    assert_eq!(workspace.rows()[1].get(Field::Date), Some("2025-01-09"));

    workspace.dispatch(&mut remote, EditCommand::Cancel { confirmed: false })?;
    assert!(workspace.store().is_dirty());
    workspace.dispatch(&mut remote, EditCommand::Cancel { confirmed: true })?;

    assert_eq!(workspace.rows(), loaded.as_slice());
    assert_eq!(workspace.mode(), EditMode::NotEditing);
    assert!(remote.upserts().is_empty());
    Ok(())
}

#[test]
fn invalid_add_never_reaches_the_store() -> Result<()> {
    let mut remote = two_leads()?;
    let mut workspace = open(&mut remote)?;
    remote.clear_calls();

    let mut input = NewRowInput {
        date: String::new(),
        ..new_lead()
    };
    let error = workspace
        .add_row(&mut remote, &mut input)
        .expect_err("missing date should fail");
    assert_eq!(error.kind(), "validation");
    assert!(remote.calls().is_empty());
    assert_eq!(input.company, "Globex");
    Ok(())
}

#[test]
fn add_refetches_and_resets_form() -> Result<()> {
    let mut remote = two_leads()?;
    let mut workspace = open(&mut remote)?;
    remote.clear_calls();

    let mut input = new_lead();
    let row = workspace.add_row(&mut remote, &mut input)?;

    assert_eq!(row.id, RowId::new(3));
    assert_eq!(input, NewRowInput::default());
    assert_eq!(workspace.rows().len(), 3);
    assert_eq!(workspace.rows()[2].get(Field::Company), Some("Globex"));
    assert_eq!(workspace.rows()[2].get(Field::LeadOwner), None);
    assert!(matches!(remote.calls(), [Call::AddRow(..), Call::FetchRows(_)]));
    assert_eq!(workspace.status_line(), Some("row added"));
    Ok(())
}

#[test]
fn add_is_refused_while_edits_are_pending() -> Result<()> {
    let mut remote = two_leads()?;
    let mut workspace = open(&mut remote)?;
    workspace.dispatch(&mut remote, EditCommand::StartEdit)?;
    workspace.set_field(0, Field::Source, Some("Referral".to_owned()))?;
    remote.clear_calls();

    let error = workspace
        .add_row(&mut remote, &mut new_lead())
        .expect_err("dirty workspace should refuse add");
    assert_eq!(error.kind(), "mutation");
    assert!(remote.calls().is_empty());
    assert_eq!(workspace.rows()[0].get(Field::Source), Some("Referral"));
    Ok(())
}

#[test]
fn failed_add_leaves_rows_and_form_unchanged() -> Result<()> {
    let mut remote = two_leads()?;
    let mut workspace = open(&mut remote)?;
    remote.fail(Operation::Add);

    let mut input = new_lead();
    let error = workspace
        .add_row(&mut remote, &mut input)
        .expect_err("add should fail");
    assert_eq!(error.kind(), "mutation");
    assert_eq!(input, new_lead());
    assert_eq!(workspace.rows().len(), 2);
    Ok(())
}

#[test]
fn delete_clears_deleted_ids_from_selection() -> Result<()> {
    let mut remote = two_leads()?;
    let mut workspace = open(&mut remote)?;

    workspace.toggle_selected(RowId::new(2));
    assert!(workspace.toolbar().can_delete);
    let deleted = workspace.delete_selected(&mut remote)?;

    assert_eq!(deleted, vec![RowId::new(2)]);
    assert_eq!(workspace.rows().len(), 1);
    assert!(workspace.selection().is_empty());
    assert!(!workspace.toolbar().can_delete);
    assert_eq!(workspace.status_line(), Some("deleted 1 row"));
    Ok(())
}

#[test]
fn delete_with_empty_selection_makes_no_call() -> Result<()> {
    let mut remote = two_leads()?;
    let mut workspace = open(&mut remote)?;
    remote.clear_calls();

    assert!(workspace.delete_selected(&mut remote)?.is_empty());
    assert!(remote.calls().is_empty());
    Ok(())
}

#[test]
fn failed_delete_keeps_rows_and_selection() -> Result<()> {
    let mut remote = two_leads()?;
    let mut workspace = open(&mut remote)?;
    workspace.toggle_selected(RowId::new(1));
    remote.fail(Operation::Delete);

    let error = workspace
        .delete_selected(&mut remote)
        .expect_err("delete should fail");
    assert_eq!(error.kind(), "mutation");
    assert_eq!(workspace.rows().len(), 2);
    assert!(workspace.selection().contains(RowId::new(1)));
    Ok(())
}

#[test]
fn reload_prunes_rows_removed_elsewhere() -> Result<()> {
    let mut remote = two_leads()?;
    let mut workspace = open(&mut remote)?;
    workspace.toggle_selected(RowId::new(1));
    workspace.toggle_selected(RowId::new(2));

    assert!(remote.remove_row(&dataset(), RowId::new(1)));
    workspace.reload(&mut remote)?;

    assert_eq!(workspace.selection().ids(), vec![RowId::new(2)]);
    Ok(())
}

#[test]
fn failed_reload_keeps_previous_rows() -> Result<()> {
    let mut remote = two_leads()?;
    let mut workspace = open(&mut remote)?;
    remote.fail(Operation::Fetch);

    let error = workspace
        .reload(&mut remote)
        .expect_err("reload should fail");
    assert_eq!(error.kind(), "fetch");
    assert_eq!(workspace.rows().len(), 2);
    Ok(())
}

#[test]
fn reload_is_refused_while_edits_are_unsaved() -> Result<()> {
    let mut remote = two_leads()?;
    let mut workspace = open(&mut remote)?;
    workspace.dispatch(&mut remote, EditCommand::StartEdit)?;
    workspace.set_field(0, Field::Company, Some("Hooli".to_owned()))?;
    remote.clear_calls();

    let error = workspace
        .reload(&mut remote)
        .expect_err("reload should refuse dirty edits");
    assert_eq!(error.kind(), "mutation");
    assert!(remote.calls().is_empty());
    assert_eq!(workspace.mode(), EditMode::Editing);
    assert_eq!(workspace.rows()[0].get(Field::Company), Some("Hooli"));
    assert!(workspace.store().is_dirty());

    workspace.dispatch(&mut remote, EditCommand::Save)?;
    workspace.reload(&mut remote)?;
    assert_eq!(workspace.rows()[0].get(Field::Company), Some("Hooli"));
    Ok(())
}

#[test]
fn select_visible_takes_only_the_current_page() -> Result<()> {
    let rows = LeadFaker::new(3).rows(30);
    let mut remote = MemoryRemote::new().with_dataset("leads_q2", rows)?;
    let mut workspace = Workspace::open(&mut remote, dataset(), TableView::with_page_size(10))?;

    workspace.toggle_selected(RowId::new(30));
    workspace.next_page();
    workspace.select_visible();

    let expected: Vec<RowId> = (11..=20).map(RowId::new).collect();
    assert_eq!(workspace.selection().ids(), expected);
    assert_eq!(workspace.toolbar().selected, 10);
    Ok(())
}

#[test]
fn filtered_page_renders_editable_cells_only_in_edit_mode() -> Result<()> {
    let mut remote = two_leads()?;
    let mut workspace = open(&mut remote)?;
    workspace.view_mut().filters.toggle_stage("new lead");

    let page = workspace.page();
    assert_eq!(page.filtered_count, 1);
    let column = leadbook_app::columns::descriptor(Field::Date);
    let cell = workspace
        .render_cell(page.rows[0], column)
        .expect("row exists");
    assert_eq!(cell.text, "03/02/2024");
    assert!(!cell.editable);

    workspace.dispatch(&mut remote, EditCommand::StartEdit)?;
    let cell = workspace
        .render_cell(page.rows[0], column)
        .expect("row exists");
    assert!(cell.editable);
    Ok(())
}

#[test]
fn dataset_listing_is_newest_first() -> Result<()> {
    let base = OffsetDateTime::from_unix_timestamp(1_700_000_000)?;
    let mut remote = MemoryRemote::new();
    remote.insert_dataset("leads_old", "old.csv", base, Vec::new())?;
    remote.insert_dataset("leads_new", "new.csv", base + Duration::days(2), Vec::new())?;
    remote.insert_dataset("leads_mid", "mid.csv", base + Duration::days(1), Vec::new())?;

    let labels: Vec<String> = list_datasets(&mut remote)?
        .into_iter()
        .map(|entry| entry.label)
        .collect();
    assert_eq!(labels, vec!["new.csv", "mid.csv", "old.csv"]);

    remote.fail(Operation::List);
    let error = list_datasets(&mut remote).expect_err("listing should fail");
    assert_eq!(error.kind(), "fetch");
    Ok(())
}
