// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use leadbook_app::{DatasetId, SyncClient};
use leadbook_db::Store;
use tracing::debug;

use crate::config::{BackendKind, Config};

/// Dataset argument that names the seeded dataset under `--demo`.
pub const DEMO_DATASET: &str = "demo";

/// The store every command talks to, picked from `[backend]`.
pub enum Backend {
    Sqlite {
        store: Store,
        demo: Option<DatasetId>,
    },
    Rest(leadbook_remote::Client),
}

impl Backend {
    pub fn open(config: &Config, demo: bool) -> Result<Self> {
        if demo {
            let mut store = Store::open_memory()?;
            store.bootstrap()?;
            let dataset = store.seed_demo_data()?;
            debug!(%dataset, "seeded in-memory demo store");
            return Ok(Self::Sqlite {
                store,
                demo: Some(dataset),
            });
        }

        match config.backend_kind() {
            BackendKind::Sqlite => {
                let db_path = config.db_path()?;
                let store = Store::open(&db_path).with_context(|| {
                    format!(
                        "open database {} -- if this path is wrong, set [backend].db_path or LEADBOOK_DB_PATH",
                        db_path.display()
                    )
                })?;
                store.bootstrap()?;
                debug!(path = %db_path.display(), "opened sqlite backend");
                Ok(Self::Sqlite { store, demo: None })
            }
            BackendKind::Rest => {
                let client = leadbook_remote::Client::new(
                    config.base_url()?,
                    &config.api_key(),
                    config.timeout()?,
                )
                .context("invalid [backend] config; fix base_url/timeout values")?;
                debug!(base_url = client.base_url(), "using rest backend");
                Ok(Self::Rest(client))
            }
        }
    }

    pub fn client(&mut self) -> &mut dyn SyncClient {
        match self {
            Self::Sqlite { store, .. } => store,
            Self::Rest(client) => client,
        }
    }

    /// Resolves a dataset argument; `demo` maps to the seeded dataset.
    pub fn dataset(&self, raw: &str) -> Result<DatasetId> {
        if let Self::Sqlite {
            demo: Some(dataset),
            ..
        } = self
            && raw == DEMO_DATASET
        {
            return Ok(dataset.clone());
        }
        DatasetId::parse(raw)
    }

    /// One round trip to prove the backend answers.
    pub fn check(&mut self) -> Result<()> {
        match self {
            Self::Sqlite { store, .. } => store.list_datasets().map(|_| ()),
            Self::Rest(client) => client.ping(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Backend, DEMO_DATASET};
    use crate::config::Config;
    use anyhow::Result;

    #[test]
    fn demo_backend_resolves_demo_alias() -> Result<()> {
        let mut backend = Backend::open(&Config::default(), true)?;
        let dataset = backend.dataset(DEMO_DATASET)?;
        assert!(dataset.as_str().starts_with("leads_demo_leads_csv_"));
        assert_eq!(backend.client().fetch_rows(&dataset)?.len(), 12);
        backend.check()?;
        Ok(())
    }

    #[test]
    fn dataset_argument_is_validated() -> Result<()> {
        let backend = Backend::open(&Config::default(), true)?;
        assert!(backend.dataset("leads; drop").is_err());
        assert_eq!(backend.dataset("leads_q2")?.as_str(), "leads_q2");
        Ok(())
    }
}
