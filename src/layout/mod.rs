//! Geometric layout reconstruction.
//!
//! Turns the decoder's positioned text runs into rows and ordered column
//! zones, then assigns every run to exactly one column.

mod assign;
mod rows;
mod run;
mod zones;

pub use assign::{AmountFilter, ColumnAssigner};
pub use rows::{Row, RowGrouper};
pub use run::{merge_pages, PageContent, TextRun};
pub use zones::{
    kmeans_1d, natural_gaps, optimal_k, Alignment, ColumnZone, ContentKind, ZoneModel, ZoneSource,
    ZoneSpec, NA_PLACEHOLDER,
};
