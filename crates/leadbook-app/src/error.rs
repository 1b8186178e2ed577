// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use thiserror::Error;

use crate::RowId;

/// Failures surfaced to the user by the dataset workflow. None of them are
/// fatal; the triggering action can always be re-issued.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Loading or listing datasets failed.
    #[error("load failed: {0:#}")]
    Fetch(anyhow::Error),

    /// Batch save failed; edit mode and the working copy are kept.
    #[error("save failed: {0:#} -- retry the save or cancel your edits")]
    Save(anyhow::Error),

    /// Add or delete failed; nothing was refetched.
    #[error("update failed: {0:#}")]
    Mutation(anyhow::Error),

    /// Add-row input rejected before any network call.
    #[error("{0:#}")]
    Validation(anyhow::Error),

    #[error("cells can only be changed in edit mode -- start editing and retry")]
    EditModeRequired,

    #[error("row {index} is out of range ({len} rows loaded)")]
    RowOutOfRange { index: usize, len: usize },

    #[error("row {0} is not loaded -- reload the dataset and retry")]
    UnknownRow(RowId),
}

impl EngineError {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Fetch(_) => "fetch",
            Self::Save(_) => "save",
            Self::Mutation(_) => "mutation",
            Self::Validation(_) => "validation",
            Self::EditModeRequired | Self::RowOutOfRange { .. } | Self::UnknownRow(_) => "usage",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::EngineError;
    use anyhow::anyhow;

    #[test]
    fn messages_include_backend_context_chain() {
        let error = EngineError::Save(anyhow!("connection refused").context("upsert row 3"));
        let message = error.to_string();
        assert!(message.contains("upsert row 3"));
        assert!(message.contains("connection refused"));
        assert!(message.contains("cancel"));
        assert_eq!(error.kind(), "save");
    }
}
