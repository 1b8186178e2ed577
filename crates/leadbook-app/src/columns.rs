// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::Date;

use crate::filter::parse_day;
use crate::{DealStage, EditMode, Field};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Date,
    Status,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub field: Field,
    pub kind: ColumnKind,
    pub sortable: bool,
}

impl ColumnDescriptor {
    pub const fn header(&self) -> &'static str {
        self.field.label()
    }
}

pub const COLUMNS: [ColumnDescriptor; 8] = [
    column(Field::Date, ColumnKind::Date),
    column(Field::LeadOwner, ColumnKind::Text),
    column(Field::Source, ColumnKind::Text),
    column(Field::DealStage, ColumnKind::Status),
    column(Field::AccountId, ColumnKind::Text),
    column(Field::FirstName, ColumnKind::Text),
    column(Field::LastName, ColumnKind::Text),
    column(Field::Company, ColumnKind::Text),
];

const fn column(field: Field, kind: ColumnKind) -> ColumnDescriptor {
    ColumnDescriptor {
        field,
        kind,
        sortable: true,
    }
}

pub fn descriptor(field: Field) -> &'static ColumnDescriptor {
    let index = Field::ALL
        .iter()
        .position(|candidate| *candidate == field)
        .unwrap_or_default();
    &COLUMNS[index]
}

/// Display form of one cell, independent of any rendering toolkit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCell {
    pub text: String,
    /// Badge color for status cells.
    pub color: Option<&'static str>,
    /// Whether the cell offers an editor in the current mode.
    pub editable: bool,
}

/// Single dispatch point from a column descriptor and raw value to what a
/// view shows. Dates display as `MM/DD/YYYY`; status values carry the stage
/// color, or the default color for names outside the known stages.
pub fn render_cell(column: &ColumnDescriptor, value: Option<&str>, mode: EditMode) -> RenderedCell {
    let editable = mode == EditMode::Editing;
    match column.kind {
        ColumnKind::Date => RenderedCell {
            text: value.map(display_date).unwrap_or_default(),
            color: None,
            editable,
        },
        ColumnKind::Status => {
            let raw = value.unwrap_or_default();
            let color = DealStage::parse(raw)
                .map(DealStage::color)
                .unwrap_or(DealStage::DEFAULT_COLOR);
            RenderedCell {
                text: raw.to_owned(),
                color: Some(color),
                editable,
            }
        }
        ColumnKind::Text => RenderedCell {
            text: value.unwrap_or_default().to_owned(),
            color: None,
            editable,
        },
    }
}

fn display_date(raw: &str) -> String {
    match parse_day(raw) {
        Some(date) => format!(
            "{:02}/{:02}/{:04}",
            u8::from(date.month()),
            date.day(),
            date.year()
        ),
        None => raw.to_owned(),
    }
}

/// Storage form written by the date editor.
pub fn format_day(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Choices offered by the status cell editor as `(label, stored value)`.
/// "None" stores the empty string rather than null.
pub fn stage_choices() -> impl Iterator<Item = (&'static str, &'static str)> {
    std::iter::once(("None", "")).chain(
        DealStage::ALL
            .into_iter()
            .map(|stage| (stage.name(), stage.name())),
    )
}
