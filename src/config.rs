use std::path::PathBuf;

use clap::Parser;

use crate::data::summary::Granularity;

pub const DEFAULT_DATA_FILE: &str = "assets_expanded_yes_no.csv";

/// Explore water asset survey records: filter by region, type, status and
/// survey date, and review aggregate statistics.
#[derive(Debug, Clone, Parser)]
#[command(name = "water-assets-explorer", version)]
pub struct Settings {
    /// CSV file with the asset records
    #[arg(short, long, env = "WATER_ASSETS_DATA", default_value = DEFAULT_DATA_FILE)]
    pub data: PathBuf,

    /// Initial bucket size of the "assets over time" chart
    #[arg(short, long, value_enum, default_value_t = Granularity::Month)]
    pub granularity: Granularity,
}
