// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_VERSION: i64 = 1;
const DEFAULT_TIMEOUT: &str = "10s";
const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Sqlite,
    Rest,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub backend: Backend,
    #[serde(default)]
    pub view: View,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            backend: Backend::default(),
            view: View::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Backend {
    pub kind: Option<BackendKind>,
    pub db_path: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct View {
    pub page_size: Option<i64>,
}

impl Default for View {
    fn default() -> Self {
        Self {
            page_size: Some(leadbook_app::DEFAULT_PAGE_SIZE as i64),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Log {
    pub filter: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("LEADBOOK_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set LEADBOOK_CONFIG_PATH to the config file")
        })?;

        let app_dir = config_root.join(leadbook_db::APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and put values under [backend], [view], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(db_path) = &self.backend.db_path {
            leadbook_db::validate_db_path(db_path)?;
        }

        if self.backend_kind() == BackendKind::Rest
            && self
                .backend
                .base_url
                .as_deref()
                .is_none_or(|url| url.trim().is_empty())
        {
            bail!(
                "backend.base_url in {} is required when kind = \"rest\"",
                path.display()
            );
        }

        if let Some(timeout) = &self.backend.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "backend.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(page_size) = self.view.page_size
            && page_size <= 0
        {
            bail!(
                "view.page_size in {} must be positive, got {}",
                path.display(),
                page_size
            );
        }

        Ok(())
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind.unwrap_or_default()
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.backend.db_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => leadbook_db::default_db_path(),
        }
    }

    pub fn base_url(&self) -> Result<&str> {
        self.backend
            .base_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .filter(|url| !url.is_empty())
            .ok_or_else(|| anyhow!("backend.base_url is not set; add it under [backend]"))
    }

    /// Config value first, then `LEADBOOK_API_KEY`. An empty key sends no
    /// credentials.
    pub fn api_key(&self) -> String {
        if let Some(key) = &self.backend.api_key {
            return key.clone();
        }
        env::var("LEADBOOK_API_KEY").unwrap_or_default()
    }

    pub fn timeout(&self) -> Result<Duration> {
        parse_duration(self.backend.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn page_size(&self) -> usize {
        self.view
            .page_size
            .and_then(|size| usize::try_from(size).ok())
            .unwrap_or(leadbook_app::DEFAULT_PAGE_SIZE)
    }

    /// `LEADBOOK_LOG` wins over `[log].filter` so one run can be made
    /// verbose without editing the file.
    pub fn log_filter(&self) -> String {
        if let Ok(filter) = env::var("LEADBOOK_LOG")
            && !filter.trim().is_empty()
        {
            return filter;
        }
        self.log
            .filter
            .clone()
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_owned())
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# leadbook config\n# Place this file at: {}\n\nversion = 1\n\n[backend]\n# \"sqlite\" (local file) or \"rest\" (PostgREST endpoint)\nkind = \"sqlite\"\n# Optional. Default is platform data dir (for example ~/.local/share/leadbook/leadbook.db)\n# db_path = \"/absolute/path/to/leadbook.db\"\n# base_url = \"https://project.example.co\"\n# api_key = \"\" # or set LEADBOOK_API_KEY\ntimeout = \"{}\"\n\n[view]\npage_size = {}\n\n[log]\n# tracing filter directives; LEADBOOK_LOG overrides\nfilter = \"{}\"\n",
            path.display(),
            DEFAULT_TIMEOUT,
            leadbook_app::DEFAULT_PAGE_SIZE,
            DEFAULT_LOG_FILTER,
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        let secs = mins
            .checked_mul(60)
            .ok_or_else(|| anyhow!("invalid timeout duration {raw:?}; value is too large"))?;
        return Ok(Duration::from_secs(secs));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 10s)")
}
