// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeSet;

use crate::RowId;

/// Selected row ids. Independent of filter, sort and page; only
/// [`Selection::reconcile`] prunes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<RowId>,
}

impl Selection {
    pub fn toggle(&mut self, id: RowId) {
        if !self.ids.remove(&id) {
            self.ids.insert(id);
        }
    }

    /// Replaces the selection with exactly the currently visible ids.
    pub fn select_all(&mut self, visible: impl IntoIterator<Item = RowId>) {
        self.ids = visible.into_iter().collect();
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Drops ids missing from a freshly loaded dataset. Returns how many
    /// were dropped.
    pub fn reconcile(&mut self, valid: impl IntoIterator<Item = RowId>) -> usize {
        let valid: BTreeSet<RowId> = valid.into_iter().collect();
        let before = self.ids.len();
        self.ids.retain(|id| valid.contains(id));
        before - self.ids.len()
    }

    pub fn contains(&self, id: RowId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> Vec<RowId> {
        self.ids.iter().copied().collect()
    }
}
