// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{Field, FilterState, Row, SortDirection};

pub const DEFAULT_PAGE_SIZE: usize = 25;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortState {
    column: Option<(Field, SortDirection)>,
}

impl SortState {
    pub fn column(&self) -> Option<(Field, SortDirection)> {
        self.column
    }

    pub fn direction_for(&self, field: Field) -> Option<SortDirection> {
        self.column
            .and_then(|(sorted, direction)| (sorted == field).then_some(direction))
    }

    /// Header click: unsorted -> ascending -> descending -> unsorted. Clicking
    /// a different column starts that column at ascending.
    pub fn cycle(&mut self, field: Field) {
        self.column = match self.direction_for(field) {
            None => Some((field, SortDirection::Asc)),
            Some(SortDirection::Asc) => Some((field, SortDirection::Desc)),
            Some(SortDirection::Desc) => None,
        };
    }

    pub fn clear(&mut self) {
        self.column = None;
    }

    /// Reorders `indices` in place. Text compares case-insensitively, then by
    /// raw value; nulls order before any value; ties keep their incoming (id)
    /// order.
    pub fn sort(&self, rows: &[Row], indices: &mut [usize]) {
        let Some((field, direction)) = self.column else {
            return;
        };
        indices.sort_by(|left, right| {
            let ordering =
                sort_key(rows[*left].get(field)).cmp(&sort_key(rows[*right].get(field)));
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }
}

fn sort_key(value: Option<&str>) -> Option<(String, &str)> {
    value.map(|value| (value.to_lowercase(), value))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page_size: usize,
    page_index: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Pagination {
    /// A zero page size is treated as one row per page.
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            page_index: 0,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn page_count(&self, total: usize) -> usize {
        total.div_ceil(self.page_size)
    }

    /// Moves to `index`, clamped to `[0, page_count - 1]`.
    pub fn go_to(&mut self, index: usize, total: usize) {
        let last = self.page_count(total).saturating_sub(1);
        self.page_index = index.min(last);
    }

    pub fn next(&mut self, total: usize) {
        self.go_to(self.page_index.saturating_add(1), total);
    }

    pub fn previous(&mut self, total: usize) {
        self.go_to(self.page_index.saturating_sub(1), total);
    }

    pub fn can_next(&self, total: usize) -> bool {
        self.page_index + 1 < self.page_count(total)
    }

    pub fn can_previous(&self) -> bool {
        self.page_index > 0
    }

    pub fn clamp(&mut self, total: usize) {
        self.go_to(self.page_index, total);
    }

    fn slice<'a>(&self, ordered: &'a [usize]) -> &'a [usize] {
        let start = (self.page_index * self.page_size).min(ordered.len());
        let end = (start + self.page_size).min(ordered.len());
        &ordered[start..end]
    }
}

/// One computed page of the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    /// Indices into the working rows, in display order.
    pub rows: Vec<usize>,
    pub page_index: usize,
    pub page_count: usize,
    pub filtered_count: usize,
}

/// Filter, sort and page state of the dataset table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableView {
    pub filters: FilterState,
    pub sort: SortState,
    pub pagination: Pagination,
}

impl TableView {
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            pagination: Pagination::new(page_size),
            ..Self::default()
        }
    }

    /// Filtered and sorted indices of every matching row.
    pub fn ordered(&self, rows: &[Row]) -> Vec<usize> {
        let mut indices = self.filters.apply(rows);
        self.sort.sort(rows, &mut indices);
        indices
    }

    /// Computes the current page, first clamping the page index into the
    /// range left by the current filters.
    pub fn page(&mut self, rows: &[Row]) -> PageView {
        let ordered = self.ordered(rows);
        self.pagination.clamp(ordered.len());
        PageView {
            rows: self.pagination.slice(&ordered).to_vec(),
            page_index: self.pagination.page_index(),
            page_count: self.pagination.page_count(ordered.len()),
            filtered_count: ordered.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Pagination, SortState, TableView};
    use crate::{Field, Row, RowFields, RowId, SortDirection};

    fn rows(companies: &[Option<&str>]) -> Vec<Row> {
        companies
            .iter()
            .enumerate()
            .map(|(index, company)| {
                Row::new(
                    RowId::new(index as i64 + 1),
                    RowFields {
                        company: company.map(str::to_owned),
                        ..RowFields::default()
                    },
                )
            })
            .collect()
    }

    #[test]
    fn sort_cycles_through_three_states() {
        let mut sort = SortState::default();
        sort.cycle(Field::Company);
        assert_eq!(sort.column(), Some((Field::Company, SortDirection::Asc)));
        sort.cycle(Field::Company);
        assert_eq!(sort.column(), Some((Field::Company, SortDirection::Desc)));
        sort.cycle(Field::Company);
        assert_eq!(sort.column(), None);
    }

    #[test]
    fn switching_columns_restarts_at_ascending() {
        let mut sort = SortState::default();
        sort.cycle(Field::Company);
        sort.cycle(Field::Company);
        sort.cycle(Field::Source);
        assert_eq!(sort.column(), Some((Field::Source, SortDirection::Asc)));
        assert_eq!(sort.direction_for(Field::Company), None);
    }

    #[test]
    fn sort_orders_values_with_nulls_first() {
        let data = rows(&[Some("b"), None, Some("a"), Some("b")]);
        let mut view = TableView::default();
        view.sort.cycle(Field::Company);
        assert_eq!(view.ordered(&data), vec![1, 2, 0, 3]);

        view.sort.cycle(Field::Company);
        assert_eq!(view.ordered(&data), vec![0, 3, 2, 1]);
    }

    #[test]
    fn sort_ignores_case_and_breaks_ties_on_raw_value() {
        let data = rows(&[Some("beta"), Some("Zeta"), Some("alpha"), Some("Alpha")]);
        let mut view = TableView::default();
        view.sort.cycle(Field::Company);
        assert_eq!(view.ordered(&data), vec![3, 2, 0, 1]);

        view.sort.cycle(Field::Company);
        assert_eq!(view.ordered(&data), vec![1, 0, 2, 3]);
    }

    #[test]
    fn page_count_rounds_up() {
        let pagination = Pagination::new(25);
        assert_eq!(pagination.page_count(0), 0);
        assert_eq!(pagination.page_count(25), 1);
        assert_eq!(pagination.page_count(26), 2);
    }

    #[test]
    fn navigation_is_clamped() {
        let mut pagination = Pagination::new(10);
        pagination.previous(35);
        assert_eq!(pagination.page_index(), 0);
        assert!(!pagination.can_previous());

        pagination.go_to(99, 35);
        assert_eq!(pagination.page_index(), 3);
        assert!(!pagination.can_next(35));

        pagination.next(35);
        assert_eq!(pagination.page_index(), 3);
    }

    #[test]
    fn narrowing_filter_clamps_current_page() {
        let companies: Vec<Option<&str>> = (0..30)
            .map(|index| Some(if index < 3 { "Acme" } else { "Other" }))
            .collect();
        let data = rows(&companies);
        let mut view = TableView::with_page_size(10);
        view.pagination.go_to(2, data.len());

        view.filters.set_global_text("acme");
        let page = view.page(&data);
        assert_eq!(page.page_index, 0);
        assert_eq!(page.page_count, 1);
        assert_eq!(page.filtered_count, 3);
        assert_eq!(page.rows, vec![0, 1, 2]);
    }

    #[test]
    fn page_slices_sorted_rows() {
        let companies: Vec<Option<&str>> = vec![Some("e"), Some("d"), Some("c"), Some("b"), Some("a")];
        let data = rows(&companies);
        let mut view = TableView::with_page_size(2);
        view.sort.cycle(Field::Company);
        view.pagination.go_to(1, data.len());

        let page = view.page(&data);
        assert_eq!(page.rows, vec![2, 1]);
        assert_eq!(page.page_count, 3);
    }
}
