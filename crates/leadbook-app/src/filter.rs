// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::{BTreeMap, BTreeSet};
use time::Date;
use time::macros::format_description;

use crate::columns::{ColumnKind, descriptor};
use crate::{Field, Row};

/// Inclusive day range; an unset bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<Date>,
    pub end: Option<Date>,
}

impl DateRange {
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// A value without a parseable date fails as soon as either bound is set.
    pub fn contains(&self, value: Option<&str>) -> bool {
        if self.is_unbounded() {
            return true;
        }
        let Some(day) = value.and_then(parse_day) else {
            return false;
        };
        self.start.is_none_or(|start| day >= start) && self.end.is_none_or(|end| day <= end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    Start,
    End,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnFilter {
    DateRange(DateRange),
    /// Passes values equal (ignoring case) to any member.
    OneOf(BTreeSet<String>),
}

impl ColumnFilter {
    fn is_empty(&self) -> bool {
        match self {
            Self::DateRange(range) => range.is_unbounded(),
            Self::OneOf(values) => values.is_empty(),
        }
    }

    fn matches(&self, field: Field, value: Option<&str>) -> bool {
        match (descriptor(field).kind, self) {
            (ColumnKind::Date, Self::DateRange(range)) => range.contains(value),
            (ColumnKind::Status, Self::OneOf(values)) => {
                values.is_empty() || {
                    let value = value.unwrap_or_default().to_lowercase();
                    values
                        .iter()
                        .any(|candidate| candidate.to_lowercase() == value)
                }
            }
            _ => true,
        }
    }
}

/// Global text filter plus per-column filters.
///
/// Evaluation is two ordered passes: the global text pass first, then the
/// column filters over whatever survived it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    global_text: String,
    columns: BTreeMap<Field, ColumnFilter>,
}

impl FilterState {
    pub fn global_text(&self) -> &str {
        &self.global_text
    }

    pub fn set_global_text(&mut self, text: impl Into<String>) {
        self.global_text = text.into();
    }

    pub fn column_filter(&self, field: Field) -> Option<&ColumnFilter> {
        self.columns.get(&field)
    }

    /// Installs a column filter; an empty filter removes the entry instead.
    pub fn set_column_filter(&mut self, field: Field, filter: ColumnFilter) {
        if filter.is_empty() {
            self.columns.remove(&field);
        } else {
            self.columns.insert(field, filter);
        }
    }

    pub fn clear_column_filter(&mut self, field: Field) {
        self.columns.remove(&field);
    }

    pub fn date_range(&self) -> DateRange {
        match self.columns.get(&Field::Date) {
            Some(ColumnFilter::DateRange(range)) => *range,
            _ => DateRange::default(),
        }
    }

    pub fn set_date_bound(&mut self, bound: DateBound, value: Option<Date>) {
        let mut range = self.date_range();
        match bound {
            DateBound::Start => range.start = value,
            DateBound::End => range.end = value,
        }
        self.set_column_filter(Field::Date, ColumnFilter::DateRange(range));
    }

    pub fn stages(&self) -> BTreeSet<String> {
        match self.columns.get(&Field::DealStage) {
            Some(ColumnFilter::OneOf(values)) => values.clone(),
            _ => BTreeSet::new(),
        }
    }

    /// Adds the stage to the stage filter, or removes it when already present.
    pub fn toggle_stage(&mut self, name: &str) {
        let mut stages = self.stages();
        if !stages.remove(name) {
            stages.insert(name.to_owned());
        }
        self.set_column_filter(Field::DealStage, ColumnFilter::OneOf(stages));
    }

    pub fn is_active(&self) -> bool {
        !self.global_text.is_empty() || !self.columns.is_empty()
    }

    pub fn clear(&mut self) {
        self.global_text.clear();
        self.columns.clear();
    }

    /// Indices into `rows` of the rows passing both passes, in input order.
    pub fn apply(&self, rows: &[Row]) -> Vec<usize> {
        let text_matches: Vec<usize> = (0..rows.len())
            .filter(|index| self.passes_global_text(&rows[*index]))
            .collect();

        text_matches
            .into_iter()
            .filter(|index| self.passes_column_filters(&rows[*index]))
            .collect()
    }

    pub fn passes_global_text(&self, row: &Row) -> bool {
        if self.global_text.is_empty() {
            return true;
        }
        let needle = self.global_text.to_lowercase();
        Field::ALL
            .into_iter()
            .filter(|field| field.globally_searchable())
            .any(|field| {
                row.get(field)
                    .unwrap_or_default()
                    .to_lowercase()
                    .contains(&needle)
            })
    }

    pub fn passes_column_filters(&self, row: &Row) -> bool {
        self.columns
            .iter()
            .all(|(field, filter)| filter.matches(*field, row.get(*field)))
    }
}

/// Parses the calendar day of a stored date, ignoring any time suffix
/// (`2024-01-02T10:00:00` reads as 2024-01-02).
pub fn parse_day(raw: &str) -> Option<Date> {
    let day = raw.trim().get(..10)?;
    Date::parse(day, format_description!("[year]-[month]-[day]")).ok()
}

/// Parses a user-supplied filter bound; empty input means unset.
pub fn parse_bound(raw: &str) -> anyhow::Result<Option<Date>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    parse_day(trimmed)
        .filter(|_| trimmed.len() == 10)
        .map(Some)
        .ok_or_else(|| anyhow::anyhow!("invalid date {trimmed:?}; use YYYY-MM-DD"))
}
