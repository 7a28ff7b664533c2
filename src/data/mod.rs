/// Data layer: core types, loading, filtering, summaries and export.
///
/// Architecture:
/// ```text
///      assets .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset (memoized, once per process)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  FilterCriteria → FilteredDataset (indices)
///   └──────────┘
///        │
///        ├───────────────┐
///        ▼               ▼
///   ┌──────────┐    ┌──────────┐
///   │ summary   │    │  export   │  FilteredDataset → .csv
///   └──────────┘    └──────────┘
///   counts, means, cross-tabs, timelines
/// ```

pub mod error;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod summary;

#[cfg(test)]
pub(crate) mod fixtures;
