// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use leadbook_app::{
    ChangeRecord, DatasetEntry, DatasetId, DealStage, Row, RowFields, RowId, RowNotFound,
    SyncClient,
};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use time::{Date, Duration, Month, OffsetDateTime};

const FIRST_NAMES: [&str; 16] = [
    "Ava", "Ben", "Chloe", "Diego", "Elena", "Farah", "Gabe", "Hana", "Isaac", "Jade", "Kofi",
    "Lena", "Marco", "Nina", "Omar", "Priya",
];
const LAST_NAMES: [&str; 14] = [
    "Alvarez", "Brooks", "Chen", "Dubois", "Evans", "Fischer", "Garcia", "Haddad", "Ito",
    "Johnson", "Kowalski", "Larsen", "Moreau", "Nakamura",
];
const COMPANIES: [&str; 12] = [
    "Acme Logistics",
    "Brightline Health",
    "Cobalt Analytics",
    "Driftwood Foods",
    "Evergreen Energy",
    "Foxglove Media",
    "Granite Capital",
    "Harborview Labs",
    "Ironbark Mining",
    "Juniper Retail",
    "Keystone Freight",
    "Lumen Robotics",
];
const LEAD_OWNERS: [&str; 5] = ["Sam Ortiz", "Riley Park", "Jordan Lee", "Casey Wu", "Morgan Hale"];
const SOURCES: [&str; 6] = [
    "Website",
    "Referral",
    "Trade Show",
    "Cold Call",
    "LinkedIn",
    "Webinar",
];
const REFERENCE_YEAR: i32 = 2024;

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn chance(&mut self, percent: u64) -> bool {
        self.next_u64() % 100 < percent
    }
}

/// Seeded generator for realistic lead rows. The same seed always yields the
/// same rows.
#[derive(Debug, Clone)]
pub struct LeadFaker {
    rng: DeterministicRng,
}

impl LeadFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    /// One lead. Optional columns are occasionally null so filters and sorts
    /// see missing values.
    pub fn lead(&mut self) -> RowFields {
        let stage = DealStage::ALL[self.rng.int_n(DealStage::ALL.len())];
        let date = self.day_in_year(REFERENCE_YEAR);
        RowFields {
            date: Some(format!(
                "{:04}-{:02}-{:02}",
                date.year(),
                u8::from(date.month()),
                date.day()
            )),
            lead_owner: self.maybe(&LEAD_OWNERS),
            source: self.maybe(&SOURCES),
            deal_stage: Some(stage.name().to_owned()),
            account_id: Some(format!("ACC-{:05}", self.rng.int_n(100_000))),
            first_name: Some(self.pick(&FIRST_NAMES).to_owned()),
            last_name: Some(self.pick(&LAST_NAMES).to_owned()),
            company: self.maybe(&COMPANIES),
        }
    }

    /// `count` rows with ids `1..=count`.
    pub fn rows(&mut self, count: usize) -> Vec<Row> {
        (1..=count)
            .map(|id| Row::new(RowId::new(id as i64), self.lead()))
            .collect()
    }

    pub fn day_in_year(&mut self, year: i32) -> Date {
        let start = Date::from_calendar_date(year, Month::January, 1).expect("valid calendar date");
        let offset = self.rng.int_n(365) as i64;
        start + Duration::days(offset)
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn maybe(&mut self, items: &[&str]) -> Option<String> {
        if self.rng.chance(10) {
            return None;
        }
        Some(self.pick(items).to_owned())
    }
}

/// Shorthand for a row where only the listed fields are set.
pub fn lead(id: i64, date: Option<&str>, stage: Option<&str>, company: Option<&str>) -> Row {
    Row::new(
        RowId::new(id),
        RowFields {
            date: date.map(str::to_owned),
            deal_stage: stage.map(str::to_owned),
            company: company.map(str::to_owned),
            ..RowFields::default()
        },
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Operation {
    List,
    Fetch,
    Add,
    Upsert,
    Delete,
}

/// One call received by [`MemoryRemote`], in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListDatasets,
    FetchRows(DatasetId),
    AddRow(DatasetId, RowFields),
    BatchUpsert(DatasetId, Vec<ChangeRecord>),
    DeleteRows(DatasetId, Vec<RowId>),
}

#[derive(Debug, Clone)]
struct MemoryDataset {
    entry: DatasetEntry,
    rows: BTreeMap<RowId, RowFields>,
}

/// In-process remote store. Records every call and can be told to fail
/// specific operations.
#[derive(Debug, Clone, Default)]
pub struct MemoryRemote {
    datasets: BTreeMap<DatasetId, MemoryDataset>,
    calls: Vec<Call>,
    failing: BTreeSet<Operation>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dataset(mut self, id: &str, rows: Vec<Row>) -> Result<Self> {
        let created_at = OffsetDateTime::from_unix_timestamp(fixture_timestamp())
            .context("fixture timestamp")?
            + Duration::minutes(self.datasets.len() as i64);
        self.insert_dataset(id, id, created_at, rows)?;
        Ok(self)
    }

    pub fn insert_dataset(
        &mut self,
        id: &str,
        label: &str,
        created_at: OffsetDateTime,
        rows: Vec<Row>,
    ) -> Result<DatasetId> {
        let dataset_id = DatasetId::parse(id)?;
        let rows = rows.into_iter().map(|row| (row.id, row.fields)).collect();
        self.datasets.insert(
            dataset_id.clone(),
            MemoryDataset {
                entry: DatasetEntry {
                    label: label.to_owned(),
                    dataset_id: dataset_id.clone(),
                    created_at,
                },
                rows,
            },
        );
        Ok(dataset_id)
    }

    pub fn fail(&mut self, operation: Operation) {
        self.failing.insert(operation);
    }

    pub fn recover(&mut self, operation: Operation) {
        self.failing.remove(&operation);
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Every batch upsert payload received so far.
    pub fn upserts(&self) -> Vec<&[ChangeRecord]> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::BatchUpsert(_, changes) => Some(changes.as_slice()),
                _ => None,
            })
            .collect()
    }

    /// Server-side rows of a dataset, ordered by id.
    pub fn rows(&self, dataset: &DatasetId) -> Vec<Row> {
        self.datasets
            .get(dataset)
            .map(|stored| {
                stored
                    .rows
                    .iter()
                    .map(|(id, fields)| Row::new(*id, fields.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Changes a row behind the client's back, as another user would.
    pub fn remove_row(&mut self, dataset: &DatasetId, id: RowId) -> bool {
        self.datasets
            .get_mut(dataset)
            .is_some_and(|stored| stored.rows.remove(&id).is_some())
    }

    fn check(&self, operation: Operation) -> Result<()> {
        if self.failing.contains(&operation) {
            bail!("simulated {operation:?} failure");
        }
        Ok(())
    }

    fn dataset_mut(&mut self, dataset: &DatasetId) -> Result<&mut MemoryDataset> {
        self.datasets
            .get_mut(dataset)
            .ok_or_else(|| anyhow!("dataset {dataset} does not exist"))
    }
}

impl SyncClient for MemoryRemote {
    fn list_datasets(&mut self) -> Result<Vec<DatasetEntry>> {
        self.calls.push(Call::ListDatasets);
        self.check(Operation::List)?;
        Ok(self
            .datasets
            .values()
            .map(|stored| stored.entry.clone())
            .collect())
    }

    fn fetch_rows(&mut self, dataset: &DatasetId) -> Result<Vec<Row>> {
        self.calls.push(Call::FetchRows(dataset.clone()));
        self.check(Operation::Fetch)?;
        self.dataset_mut(dataset)?;
        Ok(self.rows(dataset))
    }

    fn add_row(&mut self, dataset: &DatasetId, fields: &RowFields) -> Result<Row> {
        self.calls
            .push(Call::AddRow(dataset.clone(), fields.clone()));
        self.check(Operation::Add)?;
        let stored = self.dataset_mut(dataset)?;
        let next = stored
            .rows
            .keys()
            .next_back()
            .map_or(1, |last| last.get() + 1);
        let id = RowId::new(next);
        stored.rows.insert(id, fields.clone());
        Ok(Row::new(id, fields.clone()))
    }

    fn batch_upsert(&mut self, dataset: &DatasetId, changes: &[ChangeRecord]) -> Result<()> {
        self.calls
            .push(Call::BatchUpsert(dataset.clone(), changes.to_vec()));
        self.check(Operation::Upsert)?;
        let stored = self.dataset_mut(dataset)?;
        if let Some(missing) = changes
            .iter()
            .find(|change| !stored.rows.contains_key(&change.id))
        {
            return Err(RowNotFound {
                dataset: dataset.clone(),
                id: missing.id,
            }
            .into());
        }
        for change in changes {
            if let Some(fields) = stored.rows.get_mut(&change.id) {
                for (field, value) in &change.changed {
                    fields.set(*field, value.clone());
                }
            }
        }
        Ok(())
    }

    fn delete_rows(&mut self, dataset: &DatasetId, ids: &[RowId]) -> Result<Vec<RowId>> {
        self.calls
            .push(Call::DeleteRows(dataset.clone(), ids.to_vec()));
        self.check(Operation::Delete)?;
        let stored = self.dataset_mut(dataset)?;
        Ok(ids
            .iter()
            .copied()
            .filter(|id| stored.rows.remove(id).is_some())
            .collect())
    }
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("leadbook.db");
    Ok((dir, db_path))
}

pub fn fixture_datetime() -> &'static str {
    "2026-02-19T12:34:56Z"
}

fn fixture_timestamp() -> i64 {
    1_771_504_496
}
