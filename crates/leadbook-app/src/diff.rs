// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};

use crate::{Field, Row, RowId};

/// Minimal description of one row's edits: the id plus only the fields whose
/// value changed. Serializes flat, e.g. `{"id": 3, "deal_stage": "Closed Won"}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub id: RowId,
    pub changed: BTreeMap<Field, Option<String>>,
}

impl ChangeRecord {
    pub fn apply_to(&self, row: &mut Row) {
        for (field, value) in &self.changed {
            row.set(*field, value.clone());
        }
    }
}

impl Serialize for ChangeRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.changed.len() + 1))?;
        map.serialize_entry("id", &self.id)?;
        for (field, value) in &self.changed {
            map.serialize_entry(field.as_str(), value)?;
        }
        map.end()
    }
}

/// Computes the field-level delta between the working copy and the baseline.
///
/// Rows are paired by id, so a reordered working copy diffs the same as an
/// ordered one. Values compare strictly: `None` and `Some("")` differ. A
/// working row with no baseline counterpart reports every field. Output
/// follows working-copy order; an empty result means there is nothing to save.
pub fn diff_rows(working: &[Row], original: &[Row]) -> Vec<ChangeRecord> {
    let baseline: HashMap<RowId, &Row> = original.iter().map(|row| (row.id, row)).collect();

    working
        .iter()
        .filter_map(|row| {
            let before = baseline.get(&row.id);
            let changed: BTreeMap<Field, Option<String>> = Field::ALL
                .into_iter()
                .filter(|field| before.is_none_or(|before| before.get(*field) != row.get(*field)))
                .map(|field| (field, row.get(field).map(str::to_owned)))
                .collect();
            (!changed.is_empty()).then_some(ChangeRecord {
                id: row.id,
                changed,
            })
        })
        .collect()
}
