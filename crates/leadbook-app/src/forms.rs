// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};

use crate::RowFields;

/// Add-row form as typed by the user. Every input starts empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewRowInput {
    pub date: String,
    pub lead_owner: String,
    pub source: String,
    pub deal_stage: String,
    pub account_id: String,
    pub first_name: String,
    pub last_name: String,
    pub company: String,
}

impl NewRowInput {
    /// Date and deal stage are the only required inputs. Inline cell edits
    /// never go through this check.
    pub fn validate(&self) -> Result<()> {
        match (
            self.date.trim().is_empty(),
            self.deal_stage.trim().is_empty(),
        ) {
            (true, true) => bail!("date and deal stage are required -- fill both and retry"),
            (true, false) => bail!("date is required -- pick a date and retry"),
            (false, true) => bail!("deal stage is required -- choose a stage and retry"),
            (false, false) => Ok(()),
        }
    }

    /// Row payload for insertion; blank optional inputs become null.
    pub fn to_fields(&self) -> RowFields {
        RowFields {
            date: non_blank(&self.date),
            lead_owner: non_blank(&self.lead_owner),
            source: non_blank(&self.source),
            deal_stage: non_blank(&self.deal_stage),
            account_id: non_blank(&self.account_id),
            first_name: non_blank(&self.first_name),
            last_name: non_blank(&self.last_name),
            company: non_blank(&self.company),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

#[cfg(test)]
mod tests {
    use super::NewRowInput;

    fn filled() -> NewRowInput {
        NewRowInput {
            date: "2024-05-01".to_owned(),
            deal_stage: "New Lead".to_owned(),
            company: "  Initech ".to_owned(),
            ..NewRowInput::default()
        }
    }

    #[test]
    fn validation_requires_date_and_stage() {
        assert!(filled().validate().is_ok());

        let missing_date = NewRowInput {
            date: "   ".to_owned(),
            ..filled()
        };
        let message = missing_date
            .validate()
            .expect_err("blank date should fail")
            .to_string();
        assert!(message.contains("date is required"));

        let missing_stage = NewRowInput {
            deal_stage: String::new(),
            ..filled()
        };
        assert!(missing_stage.validate().is_err());
        assert!(NewRowInput::default().validate().is_err());
    }

    #[test]
    fn blank_optional_inputs_become_null() {
        let fields = filled().to_fields();
        assert_eq!(fields.company.as_deref(), Some("Initech"));
        assert_eq!(fields.lead_owner, None);
        assert_eq!(fields.date.as_deref(), Some("2024-05-01"));
    }

    #[test]
    fn reset_clears_every_input() {
        let mut input = filled();
        input.reset();
        assert_eq!(input, NewRowInput::default());
    }
}
