// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod columns;
pub mod diff;
pub mod error;
pub mod filter;
pub mod forms;
pub mod ids;
pub mod model;
pub mod selection;
pub mod state;
pub mod store;
pub mod sync;
pub mod view;
pub mod workspace;

pub use columns::{COLUMNS, ColumnDescriptor, ColumnKind, RenderedCell, render_cell, stage_choices};
pub use diff::*;
pub use error::*;
pub use filter::{ColumnFilter, DateBound, DateRange, FilterState};
pub use forms::*;
pub use ids::*;
pub use model::*;
pub use selection::*;
pub use state::*;
pub use store::*;
pub use sync::*;
pub use view::*;
pub use workspace::*;
