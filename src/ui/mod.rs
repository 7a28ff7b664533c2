pub mod panels;
pub mod plot;
pub mod table;

/// Shown in place of any chart or table whose view is empty.
pub const NO_DATA: &str = "No data available for the selected filters.";
