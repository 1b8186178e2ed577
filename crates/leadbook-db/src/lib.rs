// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use leadbook_app::{
    ChangeRecord, DatasetEntry, DatasetId, Field, Row, RowFields, RowId, RowNotFound, SyncClient,
};
use rusqlite::{Connection, OptionalExtension, ToSql, params, params_from_iter};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::debug;

pub const APP_NAME: &str = "leadbook";

const DATASETS_COLUMNS: [&str; 4] = ["id", "label", "table_name", "created_at"];

const DEMO_LABEL: &str = "demo_leads.csv";
const DEMO_LEADS: [[&str; 8]; 12] = [
    ["2024-01-08", "Sam Ortiz", "Website", "New Lead", "ACC-10001", "Ava", "Alvarez", "Acme Logistics"],
    ["2024-01-15", "Riley Park", "Referral", "Contacted", "ACC-10002", "Ben", "Brooks", "Brightline Health"],
    ["2024-01-22", "Jordan Lee", "Trade Show", "Qualified", "ACC-10003", "Chloe", "Chen", "Cobalt Analytics"],
    ["2024-02-02", "Casey Wu", "Cold Call", "Proposal Sent", "ACC-10004", "Diego", "Dubois", "Driftwood Foods"],
    ["2024-02-19", "Sam Ortiz", "LinkedIn", "Negotiation", "ACC-10005", "Elena", "Evans", "Evergreen Energy"],
    ["2024-03-04", "Morgan Hale", "Webinar", "Closed Won", "ACC-10006", "Farah", "Fischer", "Foxglove Media"],
    ["2024-03-11", "Riley Park", "Website", "Closed Lost", "ACC-10007", "Gabe", "Garcia", "Granite Capital"],
    ["2024-03-27", "Jordan Lee", "Referral", "On Hold", "ACC-10008", "Hana", "Haddad", "Harborview Labs"],
    ["2024-04-09", "Casey Wu", "Trade Show", "In Progress", "ACC-10009", "Isaac", "Ito", "Ironbark Mining"],
    ["2024-04-23", "Morgan Hale", "Cold Call", "Disqualified", "ACC-10010", "Jade", "Johnson", "Juniper Retail"],
    ["2024-05-06", "Sam Ortiz", "LinkedIn", "Re-engagement", "ACC-10011", "Kofi", "Kowalski", "Keystone Freight"],
    ["2024-05-20", "Riley Park", "Webinar", "New Lead", "ACC-10012", "Lena", "Larsen", "Lumen Robotics"],
];

/// SQLite-backed dataset store. Each dataset is its own table; the
/// `datasets` table registers them for the picker.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    pub fn bootstrap(&self) -> Result<()> {
        if table_exists(&self.conn, "datasets")? {
            validate_columns(&self.conn, "datasets", &DATASETS_COLUMNS)?;
        }
        self.conn
            .execute_batch(include_str!("sql/schema.sql"))
            .context("create schema")?;
        Ok(())
    }

    /// Registers a new, empty dataset named after the uploaded file.
    pub fn create_dataset(&self, label: &str) -> Result<DatasetId> {
        self.create_dataset_at(label, OffsetDateTime::now_utc())
    }

    pub fn create_dataset_at(&self, label: &str, created_at: OffsetDateTime) -> Result<DatasetId> {
        if label.trim().is_empty() {
            bail!("dataset label must not be empty");
        }
        let mut millis = created_at.unix_timestamp_nanos() / 1_000_000;
        let dataset = loop {
            let candidate = DatasetId::for_upload(label, millis);
            if !table_exists(&self.conn, candidate.as_str())? {
                break candidate;
            }
            millis += 1;
        };

        let timestamp = created_at
            .format(&Rfc3339)
            .context("format dataset timestamp")?;
        self.conn
            .execute_batch(&create_table_sql(&dataset))
            .with_context(|| format!("create table for dataset {dataset}"))?;
        self.conn
            .execute(
                "INSERT INTO datasets (label, table_name, created_at) VALUES (?, ?, ?)",
                params![label, dataset.as_str(), timestamp],
            )
            .with_context(|| format!("register dataset {dataset}"))?;
        debug!(%dataset, "created dataset");
        Ok(dataset)
    }

    /// Bulk insert, ids assigned in input order.
    pub fn insert_rows(&mut self, dataset: &DatasetId, rows: &[RowFields]) -> Result<usize> {
        self.require_dataset(dataset)?;
        let sql = insert_sql(dataset);
        let tx = self.conn.transaction().context("begin insert")?;
        {
            let mut statement = tx.prepare(&sql).context("prepare insert")?;
            for fields in rows {
                statement
                    .execute(params_from_iter(field_params(fields)))
                    .with_context(|| format!("insert row into {dataset}"))?;
            }
        }
        tx.commit().context("commit insert")?;
        Ok(rows.len())
    }

    /// Creates a small, fixed dataset for trying the tool out.
    pub fn seed_demo_data(&mut self) -> Result<DatasetId> {
        let dataset = self.create_dataset(DEMO_LABEL)?;
        let rows: Vec<RowFields> = DEMO_LEADS.iter().map(demo_fields).collect();
        self.insert_rows(&dataset, &rows)?;
        Ok(dataset)
    }

    pub fn dataset_exists(&self, dataset: &DatasetId) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM datasets WHERE table_name = ?",
                params![dataset.as_str()],
                |row| row.get(0),
            )
            .optional()
            .context("look up dataset")?;
        Ok(found.is_some())
    }

    fn require_dataset(&self, dataset: &DatasetId) -> Result<()> {
        if !self.dataset_exists(dataset)? {
            bail!("dataset {dataset} does not exist -- run `leadbook datasets` to list them");
        }
        Ok(())
    }
}

impl SyncClient for Store {
    fn list_datasets(&mut self) -> Result<Vec<DatasetEntry>> {
        let mut statement = self
            .conn
            .prepare(
                "
                SELECT label, table_name, created_at
                FROM datasets
                ORDER BY created_at DESC, id DESC
                ",
            )
            .context("prepare dataset listing")?;
        let raw = statement
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .context("list datasets")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("read dataset rows")?;

        raw.into_iter()
            .map(|(label, table_name, created_at)| {
                Ok(DatasetEntry {
                    label,
                    dataset_id: DatasetId::parse(&table_name)?,
                    created_at: OffsetDateTime::parse(&created_at, &Rfc3339)
                        .with_context(|| format!("parse created_at {created_at:?}"))?,
                })
            })
            .collect()
    }

    fn fetch_rows(&mut self, dataset: &DatasetId) -> Result<Vec<Row>> {
        self.require_dataset(dataset)?;
        let sql = format!(
            "SELECT id, {} FROM \"{}\" ORDER BY id ASC",
            column_list(),
            dataset.as_str()
        );
        let mut statement = self.conn.prepare(&sql).context("prepare fetch")?;
        let rows = statement
            .query_map([], |row| {
                let mut fields = RowFields::default();
                for (index, field) in Field::ALL.into_iter().enumerate() {
                    fields.set(field, row.get(index + 1)?);
                }
                Ok(Row::new(RowId::new(row.get(0)?), fields))
            })
            .with_context(|| format!("fetch rows of {dataset}"))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .with_context(|| format!("read rows of {dataset}"))?;
        debug!(%dataset, rows = rows.len(), "read dataset table");
        Ok(rows)
    }

    fn add_row(&mut self, dataset: &DatasetId, fields: &RowFields) -> Result<Row> {
        self.require_dataset(dataset)?;
        self.conn
            .execute(&insert_sql(dataset), params_from_iter(field_params(fields)))
            .with_context(|| format!("insert row into {dataset}"))?;
        let id = RowId::new(self.conn.last_insert_rowid());
        Ok(Row::new(id, fields.clone()))
    }

    fn batch_upsert(&mut self, dataset: &DatasetId, changes: &[ChangeRecord]) -> Result<()> {
        self.require_dataset(dataset)?;
        let tx = self.conn.transaction().context("begin batch update")?;
        for change in changes {
            let affected = if change.changed.is_empty() {
                tx.query_row(
                    &format!("SELECT COUNT(*) FROM \"{}\" WHERE id = ?", dataset.as_str()),
                    params![change.id.get()],
                    |row| row.get::<_, i64>(0),
                )
                .context("check row exists")? as usize
            } else {
                let assignments = change
                    .changed
                    .keys()
                    .map(|field| format!("{} = ?", field.as_str()))
                    .collect::<Vec<_>>()
                    .join(", ");
                let sql = format!(
                    "UPDATE \"{}\" SET {assignments} WHERE id = ?",
                    dataset.as_str()
                );
                let id = change.id.get();
                let mut values: Vec<&dyn ToSql> = change
                    .changed
                    .values()
                    .map(|value| value as &dyn ToSql)
                    .collect();
                values.push(&id);
                tx.execute(&sql, values.as_slice())
                    .with_context(|| format!("update row {} of {dataset}", change.id))?
            };
            if affected == 0 {
                // Dropping the transaction rolls back earlier records.
                return Err(RowNotFound {
                    dataset: dataset.clone(),
                    id: change.id,
                }
                .into());
            }
        }
        tx.commit().context("commit batch update")?;
        debug!(%dataset, rows = changes.len(), "applied batch update");
        Ok(())
    }

    fn delete_rows(&mut self, dataset: &DatasetId, ids: &[RowId]) -> Result<Vec<RowId>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.require_dataset(dataset)?;
        let sql = format!("DELETE FROM \"{}\" WHERE id = ?", dataset.as_str());
        let tx = self.conn.transaction().context("begin delete")?;
        let mut deleted = Vec::with_capacity(ids.len());
        for id in ids {
            let affected = tx
                .execute(&sql, params![id.get()])
                .with_context(|| format!("delete row {id} of {dataset}"))?;
            if affected > 0 {
                deleted.push(*id);
            }
        }
        tx.commit().context("commit delete")?;
        Ok(deleted)
    }
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os("LEADBOOK_DB_PATH") {
        return Ok(PathBuf::from(override_path));
    }

    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set LEADBOOK_DB_PATH to a writable database path")
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir.join("leadbook.db"))
}

pub fn validate_db_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("database path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "database path {path:?} looks like a URI ({scheme}://); use [backend] kind = \"rest\" for remote stores"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("database path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    if path.contains('?') {
        bail!(
            "database path {path:?} contains '?'; remove query parameters and use a plain file path"
        );
    }

    Ok(())
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
            params![table],
            |row| row.get(0),
        )
        .with_context(|| format!("check table {table}"))?;
    Ok(count > 0)
}

fn validate_columns(conn: &Connection, table: &str, required: &[&str]) -> Result<()> {
    let mut statement = conn
        .prepare(&format!("PRAGMA table_info(\"{table}\")"))
        .with_context(|| format!("inspect table {table}"))?;
    let present = statement
        .query_map([], |row| row.get::<_, String>(1))
        .with_context(|| format!("read columns of {table}"))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .with_context(|| format!("read columns of {table}"))?;
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|column| !present.iter().any(|name| name == column))
        .collect();
    if !missing.is_empty() {
        bail!(
            "table `{table}` is missing required columns: {}; use a leadbook-compatible database",
            missing.join(", ")
        );
    }
    Ok(())
}

fn column_list() -> String {
    Field::ALL
        .iter()
        .map(|field| field.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn create_table_sql(dataset: &DatasetId) -> String {
    let columns = Field::ALL
        .iter()
        .map(|field| format!("  {} TEXT", field.as_str()))
        .collect::<Vec<_>>()
        .join(",\n");
    format!(
        "CREATE TABLE \"{}\" (\n  id INTEGER PRIMARY KEY AUTOINCREMENT,\n{columns}\n);",
        dataset.as_str()
    )
}

fn insert_sql(dataset: &DatasetId) -> String {
    let placeholders = vec!["?"; Field::ALL.len()].join(", ");
    format!(
        "INSERT INTO \"{}\" ({}) VALUES ({placeholders})",
        dataset.as_str(),
        column_list()
    )
}

fn field_params(fields: &RowFields) -> Vec<Option<&str>> {
    Field::ALL.iter().map(|field| fields.get(*field)).collect()
}

fn demo_fields(values: &[&str; 8]) -> RowFields {
    let mut fields = RowFields::default();
    for (field, value) in Field::ALL.into_iter().zip(values) {
        fields.set(field, Some((*value).to_owned()));
    }
    fields
}
