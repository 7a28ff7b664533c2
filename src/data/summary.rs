use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};

use super::model::{Category, FilteredDataset, IndexField};

// ---------------------------------------------------------------------------
// Scalar summaries
// ---------------------------------------------------------------------------

/// Number of records in the view.
pub fn count(fd: &FilteredDataset<'_>) -> usize {
    fd.len()
}

/// Total surface in hectares; missing areas count as zero.
pub fn sum_area(fd: &FilteredDataset<'_>) -> f64 {
    fd.records().filter_map(|r| r.area_ha).sum()
}

/// Arithmetic mean of an index over its non-missing values.
///
/// `None` when no record carries a value, which keeps "no data" apart from
/// a genuine mean of 0.0.
pub fn mean(fd: &FilteredDataset<'_>, field: IndexField) -> Option<f64> {
    let (sum, n) = fd
        .records()
        .filter_map(|r| r.index(field))
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Headline numbers for the KPI cards.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Kpis {
    pub total_assets: usize,
    pub total_area_ha: f64,
    pub mean_ndvi: Option<f64>,
    pub mean_ndwi: Option<f64>,
}

pub fn kpis(fd: &FilteredDataset<'_>) -> Kpis {
    Kpis {
        total_assets: count(fd),
        total_area_ha: sum_area(fd),
        mean_ndvi: mean(fd, IndexField::Ndvi),
        mean_ndwi: mean(fd, IndexField::Ndwi),
    }
}

// ---------------------------------------------------------------------------
// Group-by
// ---------------------------------------------------------------------------

/// Record count per distinct value, by count descending then value ascending.
pub fn group_counts(fd: &FilteredDataset<'_>, category: Category) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for rec in fd.records() {
        *counts.entry(rec.category(category)).or_default() += 1;
    }

    let mut groups: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(value, n)| (value.to_string(), n))
        .collect();
    // BTreeMap yields values ascending and the sort is stable.
    groups.sort_by(|a, b| b.1.cmp(&a.1));
    groups
}

/// The `n` largest groups of [`group_counts`].
pub fn top_n_by_group(fd: &FilteredDataset<'_>, category: Category, n: usize) -> Vec<(String, usize)> {
    let mut groups = group_counts(fd, category);
    groups.truncate(n);
    groups
}

// ---------------------------------------------------------------------------
// Cross-tabulation
// ---------------------------------------------------------------------------

/// Count matrix over the distinct values of two categorical columns.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossTab {
    pub row_field: Category,
    pub col_field: Category,
    /// Distinct row values, ascending.
    pub rows: Vec<String>,
    /// Distinct column values, ascending.
    pub columns: Vec<String>,
    /// `counts[r][c]`, zero where no record matches.
    pub counts: Vec<Vec<usize>>,
}

impl CrossTab {
    /// True when the source view had no records.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Count at (`row`, `col`); zero for values that were never observed.
    pub fn get(&self, row: &str, col: &str) -> usize {
        let r = self.rows.iter().position(|v| v == row);
        let c = self.columns.iter().position(|v| v == col);
        match (r, c) {
            (Some(r), Some(c)) => self.counts[r][c],
            _ => 0,
        }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn max_count(&self) -> usize {
        self.counts.iter().flatten().copied().max().unwrap_or(0)
    }
}

pub fn cross_tab(fd: &FilteredDataset<'_>, row_field: Category, col_field: Category) -> CrossTab {
    let mut cells: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    let mut rows: BTreeMap<&str, usize> = BTreeMap::new();
    let mut columns: BTreeMap<&str, usize> = BTreeMap::new();

    for rec in fd.records() {
        let key = (rec.category(row_field), rec.category(col_field));
        *cells.entry(key).or_default() += 1;
        rows.insert(key.0, 0);
        columns.insert(key.1, 0);
    }

    // Assign positions in sorted order.
    for (pos, slot) in rows.values_mut().enumerate() {
        *slot = pos;
    }
    for (pos, slot) in columns.values_mut().enumerate() {
        *slot = pos;
    }

    let mut counts = vec![vec![0; columns.len()]; rows.len()];
    for ((row, col), n) in &cells {
        counts[rows[row]][columns[col]] = *n;
    }

    CrossTab {
        row_field,
        col_field,
        rows: rows.keys().map(|v| v.to_string()).collect(),
        columns: columns.keys().map(|v| v.to_string()).collect(),
        counts,
    }
}

// ---------------------------------------------------------------------------
// Time buckets
// ---------------------------------------------------------------------------

/// Calendar bucket size for survey-date timelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Granularity {
    Month,
    Quarter,
    Year,
}

impl Granularity {
    pub const ALL: [Granularity; 3] = [Granularity::Month, Granularity::Quarter, Granularity::Year];

    pub fn label(self) -> &'static str {
        match self {
            Granularity::Month => "Monthly",
            Granularity::Quarter => "Quarterly",
            Granularity::Year => "Yearly",
        }
    }

    /// Length of one bucket in months.
    fn months(self) -> i32 {
        match self {
            Granularity::Month => 1,
            Granularity::Quarter => 3,
            Granularity::Year => 12,
        }
    }

    /// Months since year 0 of the first month of the bucket holding `date`.
    fn bucket_of(self, date: NaiveDate) -> i32 {
        let month0 = date.month0() as i32;
        date.year() * 12 + month0 - month0 % self.months()
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn bucket_start(bucket: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(bucket.div_euclid(12), bucket.rem_euclid(12) as u32 + 1, 1)
}

/// Record count per calendar bucket of `last_survey_date`, chronological.
///
/// Every bucket between the first and the last populated one is present;
/// empty buckets in between carry a zero count so the timeline is
/// contiguous.
pub fn time_bucket_counts(fd: &FilteredDataset<'_>, granularity: Granularity) -> Vec<(NaiveDate, usize)> {
    let mut buckets: BTreeMap<i32, usize> = BTreeMap::new();
    for rec in fd.records() {
        *buckets.entry(granularity.bucket_of(rec.last_survey_date)).or_default() += 1;
    }

    let (Some(&first), Some(&last)) = (buckets.keys().next(), buckets.keys().next_back()) else {
        return Vec::new();
    };

    (first..=last)
        .step_by(granularity.months() as usize)
        .filter_map(|bucket| {
            let start = bucket_start(bucket)?;
            Some((start, buckets.get(&bucket).copied().unwrap_or(0)))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Scatter series
// ---------------------------------------------------------------------------

/// NDVI/NDWI points of one category value.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterSeries {
    pub label: String,
    /// `[ndvi, ndwi]` pairs.
    pub points: Vec<[f64; 2]>,
    /// Dataset index of the record behind each point.
    pub records: Vec<usize>,
}

impl ScatterSeries {
    /// Dataset index of the point closest to `(ndvi, ndwi)`.
    pub fn nearest(&self, ndvi: f64, ndwi: f64) -> Option<usize> {
        self.points
            .iter()
            .zip(&self.records)
            .map(|([x, y], &idx)| ((x - ndvi).powi(2) + (y - ndwi).powi(2), idx))
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, idx)| idx)
    }
}

/// NDVI vs NDWI points grouped by `category`, series sorted by label.
/// Records missing either index are left out.
pub fn scatter_series(fd: &FilteredDataset<'_>, category: Category) -> Vec<ScatterSeries> {
    let mut series: BTreeMap<&str, ScatterSeries> = BTreeMap::new();
    for (&idx, rec) in fd.indices().iter().zip(fd.records()) {
        if let (Some(ndvi), Some(ndwi)) = (rec.ndvi, rec.ndwi) {
            let label = rec.category(category);
            let entry = series.entry(label).or_insert_with(|| ScatterSeries {
                label: label.to_string(),
                points: Vec::new(),
                records: Vec::new(),
            });
            entry.points.push([ndvi, ndwi]);
            entry.records.push(idx);
        }
    }
    series.into_values().collect()
}
