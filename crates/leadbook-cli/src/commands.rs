// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, Color, Table};
use leadbook_app::filter::parse_bound;
use leadbook_app::{
    COLUMNS, ColumnFilter, DatasetId, DateBound, DealStage, EditCommand, EditEvent, Field,
    NewRowInput, RowId, SortDirection, SyncClient, TableView, Workspace, list_datasets,
};
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewOptions {
    pub search: Option<String>,
    pub stages: Vec<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub sort: Option<String>,
    /// One-based; out-of-range pages clamp to the last page.
    pub page: Option<usize>,
    pub page_size: usize,
}

/// One cell edit from `--set ID:FIELD=VALUE` or `--clear ID:FIELD`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellEdit {
    pub id: RowId,
    pub field: Field,
    pub value: Option<String>,
}

impl CellEdit {
    pub fn parse_set(raw: &str) -> Result<Self> {
        let (target, value) = raw
            .split_once('=')
            .ok_or_else(|| anyhow!("edit {raw:?} is missing '='; use ID:FIELD=VALUE"))?;
        let (id, field) = parse_target(target)?;
        Ok(Self {
            id,
            field,
            value: Some(value.to_owned()),
        })
    }

    pub fn parse_clear(raw: &str) -> Result<Self> {
        let (id, field) = parse_target(raw)?;
        Ok(Self {
            id,
            field,
            value: None,
        })
    }
}

fn parse_target(raw: &str) -> Result<(RowId, Field)> {
    let (id, field) = raw
        .split_once(':')
        .ok_or_else(|| anyhow!("edit target {raw:?} is missing ':'; use ID:FIELD"))?;
    let id: i64 = id
        .trim()
        .parse()
        .with_context(|| format!("row id {id:?} is not a number"))?;
    Ok((RowId::new(id), parse_field(field)?))
}

fn parse_field(raw: &str) -> Result<Field> {
    Field::parse(raw.trim()).ok_or_else(|| {
        let known = Field::ALL
            .iter()
            .map(|field| field.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        anyhow!("unknown field {raw:?}; use one of: {known}")
    })
}

fn parse_sort(raw: &str) -> Result<(Field, SortDirection)> {
    let (field, direction) = match raw.split_once(':') {
        Some((field, "asc")) => (field, SortDirection::Asc),
        Some((field, "desc")) => (field, SortDirection::Desc),
        Some((_, other)) => bail!("sort direction {other:?} must be asc or desc"),
        None => (raw, SortDirection::Asc),
    };
    Ok((parse_field(field)?, direction))
}

pub fn datasets(client: &mut dyn SyncClient) -> Result<Table> {
    let entries = list_datasets(client)?;
    let mut table = styled_table(&["Dataset", "Id", "Created"]);
    for entry in entries {
        table.add_row(vec![
            Cell::new(entry.label),
            Cell::new(entry.dataset_id),
            Cell::new(entry.created_at.date()),
        ]);
    }
    Ok(table)
}

pub fn stages() -> Table {
    let mut table = styled_table(&["Stage", "Color"]);
    for stage in DealStage::ALL {
        table.add_row(vec![
            Cell::new(stage.name()).fg(terminal_color(stage.color())),
            Cell::new(stage.color()),
        ]);
    }
    table
}

pub fn view(
    client: &mut dyn SyncClient,
    dataset: DatasetId,
    options: &ViewOptions,
) -> Result<String> {
    let mut view = TableView::with_page_size(options.page_size);
    if let Some(search) = &options.search {
        view.filters.set_global_text(search.as_str());
    }
    if !options.stages.is_empty() {
        let stages = options.stages.iter().cloned().collect();
        view.filters
            .set_column_filter(Field::DealStage, ColumnFilter::OneOf(stages));
    }
    if let Some(from) = &options.from {
        view.filters
            .set_date_bound(DateBound::Start, parse_bound(from)?);
    }
    if let Some(to) = &options.to {
        view.filters.set_date_bound(DateBound::End, parse_bound(to)?);
    }
    if let Some(sort) = &options.sort {
        let (field, direction) = parse_sort(sort)?;
        view.sort.cycle(field);
        if direction == SortDirection::Desc {
            view.sort.cycle(field);
        }
    }

    let mut workspace = Workspace::open(client, dataset, view)?;
    if let Some(page) = options.page {
        let total = workspace.view().ordered(workspace.rows()).len();
        workspace
            .view_mut()
            .pagination
            .go_to(page.saturating_sub(1), total);
    }
    let page = workspace.page();

    let mut headers = vec!["Id"];
    headers.extend(COLUMNS.iter().map(|column| column.header()));
    let mut table = styled_table(&headers);
    for &index in &page.rows {
        let mut cells = vec![Cell::new(workspace.rows()[index].id)];
        for column in &COLUMNS {
            let Some(rendered) = workspace.render_cell(index, column) else {
                continue;
            };
            let mut cell = Cell::new(rendered.text);
            if let Some(color) = rendered.color {
                cell = cell.fg(terminal_color(color));
            }
            cells.push(cell);
        }
        table.add_row(cells);
    }

    if page.filtered_count == 0 {
        return Ok(format!("{table}\nno matching rows"));
    }
    Ok(format!(
        "{table}\nPage {} of {} ({} matching rows)",
        page.page_index + 1,
        page.page_count,
        page.filtered_count
    ))
}

pub fn edit(client: &mut dyn SyncClient, dataset: DatasetId, edits: &[CellEdit]) -> Result<String> {
    let mut workspace = Workspace::open(client, dataset, TableView::default())?;
    workspace.dispatch(client, EditCommand::StartEdit)?;

    for edit in edits {
        let applied = if edit.field == Field::Date {
            apply_date(&mut workspace, edit)
        } else {
            workspace
                .set_field_by_id(edit.id, edit.field, edit.value.clone())
                .map_err(anyhow::Error::from)
        };
        if let Err(error) = applied {
            workspace.dispatch(client, EditCommand::Cancel { confirmed: true })?;
            return Err(error.context(format!("edit {}:{}", edit.id, edit.field.as_str())));
        }
    }

    let events = workspace.dispatch(client, EditCommand::Save)?;
    let mut table = styled_table(&["Id", "Field", "New value"]);
    let mut sent = 0;
    for event in &events {
        if let EditEvent::Saved(changes) = event {
            sent = changes.len();
            for change in changes {
                for (field, value) in &change.changed {
                    table.add_row(vec![
                        Cell::new(change.id),
                        Cell::new(field.as_str()),
                        Cell::new(value.as_deref().unwrap_or("null")),
                    ]);
                }
            }
        }
    }
    let status = workspace.status_line().unwrap_or_default().to_owned();
    if sent == 0 {
        return Ok(status);
    }
    Ok(format!("{table}\n{status}"))
}

fn apply_date(workspace: &mut Workspace, edit: &CellEdit) -> Result<()> {
    let date = edit
        .value
        .as_deref()
        .map(parse_bound)
        .transpose()?
        .flatten()
        .ok_or_else(|| anyhow!("dates cannot be cleared; pick a date as YYYY-MM-DD"))?;
    let index = workspace
        .store()
        .position(edit.id)
        .ok_or_else(|| anyhow!("row {} is not in this dataset", edit.id))?;
    workspace.set_date(index, date)?;
    Ok(())
}

pub fn add(
    client: &mut dyn SyncClient,
    dataset: DatasetId,
    mut input: NewRowInput,
) -> Result<String> {
    let mut workspace = Workspace::open(client, dataset, TableView::default())?;
    let row = workspace.add_row(client, &mut input)?;
    info!(id = %row.id, "added row from command line");
    Ok(format!(
        "added row {} ({} rows now)",
        row.id,
        workspace.rows().len()
    ))
}

pub fn delete(client: &mut dyn SyncClient, dataset: DatasetId, ids: &[RowId]) -> Result<String> {
    let mut workspace = Workspace::open(client, dataset, TableView::default())?;
    for id in ids {
        if workspace.store().position(*id).is_none() {
            bail!("row {id} is not in this dataset -- run `leadbook view` to see row ids");
        }
        if !workspace.selection().contains(*id) {
            workspace.toggle_selected(*id);
        }
    }
    workspace.delete_selected(client)?;
    Ok(workspace.status_line().unwrap_or_default().to_owned())
}

fn styled_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_header(headers.iter().map(|label| {
            Cell::new(label)
                .fg(Color::Cyan)
                .add_attribute(Attribute::Bold)
        }));
    table
}

/// Maps a palette token such as `green.600` to the nearest terminal color.
fn terminal_color(token: &str) -> Color {
    match token.split('.').next().unwrap_or_default() {
        "green" => Color::Green,
        "red" => Color::Red,
        "blue" => Color::Blue,
        "yellow" => Color::Yellow,
        "pink" => Color::Magenta,
        _ => Color::Grey,
    }
}
