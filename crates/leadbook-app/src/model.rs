// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::ids::*;

/// One of the eight canonical lead columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Date,
    LeadOwner,
    Source,
    DealStage,
    AccountId,
    FirstName,
    LastName,
    Company,
}

impl Field {
    pub const ALL: [Self; 8] = [
        Self::Date,
        Self::LeadOwner,
        Self::Source,
        Self::DealStage,
        Self::AccountId,
        Self::FirstName,
        Self::LastName,
        Self::Company,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::LeadOwner => "lead_owner",
            Self::Source => "source",
            Self::DealStage => "deal_stage",
            Self::AccountId => "account_id",
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::Company => "company",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "date" => Some(Self::Date),
            "lead_owner" => Some(Self::LeadOwner),
            "source" => Some(Self::Source),
            "deal_stage" => Some(Self::DealStage),
            "account_id" => Some(Self::AccountId),
            "first_name" => Some(Self::FirstName),
            "last_name" => Some(Self::LastName),
            "company" => Some(Self::Company),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Date => "Date",
            Self::LeadOwner => "Lead Owner",
            Self::Source => "Source",
            Self::DealStage => "Deal Stage",
            Self::AccountId => "Account ID",
            Self::FirstName => "First Name",
            Self::LastName => "Last Name",
            Self::Company => "Company",
        }
    }

    /// Whether the global text filter looks at this column. Dates are excluded.
    pub const fn globally_searchable(self) -> bool {
        !matches!(self, Self::Date)
    }
}

/// The fixed field set of a lead, without its id. Used for inserts and as the
/// payload of a row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFields {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub lead_owner: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub deal_stage: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
}

impl RowFields {
    pub fn get(&self, field: Field) -> Option<&str> {
        self.slot(field).as_deref()
    }

    pub fn set(&mut self, field: Field, value: Option<String>) {
        *self.slot_mut(field) = value;
    }

    fn slot(&self, field: Field) -> &Option<String> {
        match field {
            Field::Date => &self.date,
            Field::LeadOwner => &self.lead_owner,
            Field::Source => &self.source,
            Field::DealStage => &self.deal_stage,
            Field::AccountId => &self.account_id,
            Field::FirstName => &self.first_name,
            Field::LastName => &self.last_name,
            Field::Company => &self.company,
        }
    }

    fn slot_mut(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Date => &mut self.date,
            Field::LeadOwner => &mut self.lead_owner,
            Field::Source => &mut self.source,
            Field::DealStage => &mut self.deal_stage,
            Field::AccountId => &mut self.account_id,
            Field::FirstName => &mut self.first_name,
            Field::LastName => &mut self.last_name,
            Field::Company => &mut self.company,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub id: RowId,
    #[serde(flatten)]
    pub fields: RowFields,
}

impl Row {
    pub fn new(id: RowId, fields: RowFields) -> Self {
        Self { id, fields }
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.fields.get(field)
    }

    pub fn set(&mut self, field: Field, value: Option<String>) {
        self.fields.set(field, value);
    }
}

/// Field-by-field copy of a row set, used for the working copy and the
/// last-synced baseline. Every slot of the fixed row shape is copied
/// explicitly so the two copies never share storage.
pub fn clone_rows(rows: &[Row]) -> Vec<Row> {
    rows.iter()
        .map(|row| {
            let mut fields = RowFields::default();
            for field in Field::ALL {
                fields.set(field, row.get(field).map(str::to_owned));
            }
            Row::new(row.id, fields)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DealStage {
    NewLead,
    InProgress,
    Contacted,
    OnHold,
    ProposalSent,
    Negotiation,
    Qualified,
    ClosedWon,
    ClosedLost,
    Disqualified,
    ReEngagement,
}

impl DealStage {
    pub const ALL: [Self; 11] = [
        Self::NewLead,
        Self::InProgress,
        Self::Contacted,
        Self::OnHold,
        Self::ProposalSent,
        Self::Negotiation,
        Self::Qualified,
        Self::ClosedWon,
        Self::ClosedLost,
        Self::Disqualified,
        Self::ReEngagement,
    ];

    pub const DEFAULT_COLOR: &'static str = "gray.500";

    pub const fn name(self) -> &'static str {
        match self {
            Self::NewLead => "New Lead",
            Self::InProgress => "In Progress",
            Self::Contacted => "Contacted",
            Self::OnHold => "On Hold",
            Self::ProposalSent => "Proposal Sent",
            Self::Negotiation => "Negotiation",
            Self::Qualified => "Qualified",
            Self::ClosedWon => "Closed Won",
            Self::ClosedLost => "Closed Lost",
            Self::Disqualified => "Disqualified",
            Self::ReEngagement => "Re-engagement",
        }
    }

    pub const fn color(self) -> &'static str {
        match self {
            Self::NewLead => "yellow.300",
            Self::InProgress => "yellow.500",
            Self::Contacted => "blue.100",
            Self::OnHold => "blue.200",
            Self::ProposalSent => "blue.300",
            Self::Negotiation => "blue.600",
            Self::Qualified => "green.200",
            Self::ClosedWon => "green.600",
            Self::ClosedLost => "red.600",
            Self::Disqualified => "red.600",
            Self::ReEngagement => "pink.300",
        }
    }

    /// Exact-name lookup; stage values are a soft constraint so unknown
    /// names are not an error.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|stage| stage.name() == value)
    }
}

/// One entry of the dataset listing: an uploaded file and the table it was
/// loaded into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetEntry {
    pub label: String,
    pub dataset_id: DatasetId,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}
