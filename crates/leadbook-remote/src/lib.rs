// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use leadbook_app::{
    ChangeRecord, DatasetEntry, DatasetId, Row, RowFields, RowId, RowNotFound, SyncClient,
};
use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use time::OffsetDateTime;
use tracing::debug;
use url::Url;

pub const DATASETS_TABLE: &str = "master_uploads";

/// Blocking client for a PostgREST endpoint (`<base_url>/rest/v1/<table>`)
/// holding one table per dataset plus the `master_uploads` registry.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    rest_root: Url,
    api_key: String,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("backend.base_url must not be empty");
        }
        let rest_root = Url::parse(&format!("{base_url}/rest/v1/"))
            .with_context(|| format!("backend.base_url {base_url:?} is not a valid URL"))?;
        if !matches!(rest_root.scheme(), "http" | "https") {
            bail!(
                "backend.base_url {base_url:?} must use http or https, got {}",
                rest_root.scheme()
            );
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            rest_root,
            api_key: api_key.trim().to_owned(),
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Cheapest authenticated round trip; used by `--check`.
    pub fn ping(&self) -> Result<()> {
        let mut url = self.table_url(DATASETS_TABLE)?;
        url.query_pairs_mut()
            .append_pair("select", "id")
            .append_pair("limit", "1");
        let _: Vec<serde_json::Value> = self.send_json(Method::GET, url, None, false)?;
        Ok(())
    }

    fn table_url(&self, table: &str) -> Result<Url> {
        self.rest_root
            .join(table)
            .with_context(|| format!("build URL for table {table}"))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let mut request = self.http.request(method, url);
        if !self.api_key.is_empty() {
            request = request
                .header("apikey", &self.api_key)
                .bearer_auth(&self.api_key);
        }
        request
    }

    fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<&serde_json::Value>,
        want_representation: bool,
    ) -> Result<T> {
        let path = url.path().to_owned();
        let mut request = self.request(method.clone(), url);
        if want_representation {
            request = request.header("Prefer", "return=representation");
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response: Response = request
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;
        let status = response.status();
        debug!(%method, %path, status = status.as_u16(), "rest call");
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }
        response
            .json()
            .with_context(|| format!("decode response of {method} {path}"))
    }
}

impl SyncClient for Client {
    fn list_datasets(&mut self) -> Result<Vec<DatasetEntry>> {
        let mut url = self.table_url(DATASETS_TABLE)?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("order", "created_at.desc");
        let uploads: Vec<UploadRecord> = self.send_json(Method::GET, url, None, false)?;
        uploads.into_iter().map(UploadRecord::into_entry).collect()
    }

    fn fetch_rows(&mut self, dataset: &DatasetId) -> Result<Vec<Row>> {
        let mut url = self.table_url(dataset.as_str())?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("order", "id.asc");
        self.send_json(Method::GET, url, None, false)
            .with_context(|| format!("fetch rows of {dataset}"))
    }

    fn add_row(&mut self, dataset: &DatasetId, fields: &RowFields) -> Result<Row> {
        let url = self.table_url(dataset.as_str())?;
        let body = serde_json::to_value(fields).context("encode new row")?;
        let inserted: Vec<Row> = self
            .send_json(Method::POST, url, Some(&body), true)
            .with_context(|| format!("insert row into {dataset}"))?;
        inserted
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("insert into {dataset} returned no row"))
    }

    fn batch_upsert(&mut self, dataset: &DatasetId, changes: &[ChangeRecord]) -> Result<()> {
        // PostgREST has no multi-row partial update; each record is its own
        // PATCH, so a failure part-way leaves earlier records applied.
        for change in changes {
            let mut url = self.table_url(dataset.as_str())?;
            url.query_pairs_mut()
                .append_pair("id", &format!("eq.{}", change.id));
            let body = serde_json::Value::Object(
                change
                    .changed
                    .iter()
                    .map(|(field, value)| {
                        (
                            field.as_str().to_owned(),
                            value
                                .as_deref()
                                .map_or(serde_json::Value::Null, serde_json::Value::from),
                        )
                    })
                    .collect(),
            );
            let updated: Vec<serde_json::Value> = self
                .send_json(Method::PATCH, url, Some(&body), true)
                .with_context(|| format!("update row {} of {dataset}", change.id))?;
            if updated.is_empty() {
                return Err(RowNotFound {
                    dataset: dataset.clone(),
                    id: change.id,
                }
                .into());
            }
        }
        Ok(())
    }

    fn delete_rows(&mut self, dataset: &DatasetId, ids: &[RowId]) -> Result<Vec<RowId>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let list = ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let mut url = self.table_url(dataset.as_str())?;
        url.query_pairs_mut()
            .append_pair("id", &format!("in.({list})"))
            .append_pair("select", "id");
        let deleted: Vec<IdRecord> = self
            .send_json(Method::DELETE, url, None, true)
            .with_context(|| format!("delete rows of {dataset}"))?;
        Ok(deleted.into_iter().map(|record| record.id).collect())
    }
}

#[derive(Debug, Deserialize)]
struct UploadRecord {
    filename: String,
    table_name: String,
    created_at: String,
}

impl UploadRecord {
    fn into_entry(self) -> Result<DatasetEntry> {
        let created_at = parse_timestamp(&self.created_at)?;
        Ok(DatasetEntry {
            label: self.filename,
            dataset_id: DatasetId::parse(&self.table_name)?,
            created_at,
        })
    }
}

#[derive(Debug, Deserialize)]
struct IdRecord {
    id: RowId,
}

#[derive(Debug, Deserialize)]
struct PostgrestError {
    message: Option<String>,
    hint: Option<String>,
}

fn parse_timestamp(raw: &str) -> Result<OffsetDateTime> {
    use time::format_description::well_known::Rfc3339;
    use time::macros::format_description;

    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(value);
    }
    // Postgres may send a bare `+00` offset.
    OffsetDateTime::parse(
        raw,
        &format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]][offset_hour sign:mandatory]"
        ),
    )
    .with_context(|| format!("parse created_at {raw:?}"))
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    anyhow!(
        "cannot reach {} -- check [backend].base_url and your network ({} )",
        base_url,
        error
    )
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<PostgrestError>(body)
        && let Some(message) = parsed.message
        && !message.is_empty()
    {
        return match parsed.hint {
            Some(hint) if !hint.is_empty() => {
                anyhow!("server error ({}): {message} ({hint})", status.as_u16())
            }
            _ => anyhow!("server error ({}): {message}", status.as_u16()),
        };
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return anyhow!(
            "server rejected credentials ({}) -- set [backend].api_key or LEADBOOK_API_KEY",
            status.as_u16()
        );
    }

    if body.len() < 100 && !body.contains('{') {
        return anyhow!("server error ({}): {}", status.as_u16(), body);
    }

    anyhow!("server returned {}", status.as_u16())
}
