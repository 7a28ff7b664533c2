use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDate;
use csv::StringRecord;

// ---------------------------------------------------------------------------
// Field selectors
// ---------------------------------------------------------------------------

/// Categorical columns that can be grouped, cross-tabulated or filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    State,
    District,
    AssetType,
    Status,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::State,
        Category::District,
        Category::AssetType,
        Category::Status,
    ];

    /// Column name in the source file.
    pub fn column(self) -> &'static str {
        match self {
            Category::State => "state",
            Category::District => "district",
            Category::AssetType => "asset_type",
            Category::Status => "status",
        }
    }

    /// Human readable label for headers and axes.
    pub fn label(self) -> &'static str {
        match self {
            Category::State => "State",
            Category::District => "District",
            Category::AssetType => "Asset Type",
            Category::Status => "Status",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Remote-sensing index columns (NDVI / NDWI).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexField {
    Ndvi,
    Ndwi,
}

impl IndexField {
    pub fn label(self) -> &'static str {
        match self {
            IndexField::Ndvi => "NDVI",
            IndexField::Ndwi => "NDWI",
        }
    }
}

/// Line terminator of the source file, reused on export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineEnding {
    #[default]
    Lf,
    Crlf,
}

impl LineEnding {
    /// Ending of the first line in `head`; `Lf` when no line break is seen.
    pub fn detect(head: &[u8]) -> Self {
        match head.iter().position(|&b| b == b'\n') {
            Some(i) if i > 0 && head[i - 1] == b'\r' => LineEnding::Crlf,
            _ => LineEnding::Lf,
        }
    }

    pub fn terminator(self) -> csv::Terminator {
        match self {
            LineEnding::Lf => csv::Terminator::Any(b'\n'),
            LineEnding::Crlf => csv::Terminator::CRLF,
        }
    }
}

// ---------------------------------------------------------------------------
// AssetRecord – one row of the asset table
// ---------------------------------------------------------------------------

/// A single surveyed water asset.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetRecord {
    pub asset_name: String,
    pub state: String,
    pub district: String,
    pub asset_type: String,
    pub status: String,
    pub last_survey_date: NaiveDate,
    /// Surface in hectares; `None` when missing or unparsable.
    pub area_ha: Option<f64>,
    pub ndvi: Option<f64>,
    pub ndwi: Option<f64>,
    /// The source row exactly as read, in header order. Export writes these
    /// cells back so pass-through columns survive untouched.
    pub cells: StringRecord,
}

impl AssetRecord {
    /// Value of a categorical column.
    pub fn category(&self, category: Category) -> &str {
        match category {
            Category::State => &self.state,
            Category::District => &self.district,
            Category::AssetType => &self.asset_type,
            Category::Status => &self.status,
        }
    }

    /// Value of an index column, `None` when missing.
    pub fn index(&self, field: IndexField) -> Option<f64> {
        match field {
            IndexField::Ndvi => self.ndvi,
            IndexField::Ndwi => self.ndwi,
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed dataset with pre-computed value indices for the controls.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// Header row of the source file, including pass-through columns.
    pub headers: StringRecord,
    /// All records in file order.
    pub records: Vec<AssetRecord>,
    pub line_ending: LineEnding,
    /// For each categorical column the sorted set of distinct values.
    distinct: BTreeMap<Category, BTreeSet<String>>,
    /// state → districts observed with that state.
    districts_by_state: BTreeMap<String, BTreeSet<String>>,
}

impl Dataset {
    /// Build value indices from the loaded records.
    pub fn new(headers: StringRecord, records: Vec<AssetRecord>) -> Self {
        let mut distinct: BTreeMap<Category, BTreeSet<String>> = Category::ALL
            .iter()
            .map(|c| (*c, BTreeSet::new()))
            .collect();
        let mut districts_by_state: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for rec in &records {
            for (category, values) in distinct.iter_mut() {
                let value = rec.category(*category);
                if !values.contains(value) {
                    values.insert(value.to_string());
                }
            }
            districts_by_state
                .entry(rec.state.clone())
                .or_default()
                .insert(rec.district.clone());
        }

        Dataset {
            headers,
            records,
            line_ending: LineEnding::default(),
            distinct,
            districts_by_state,
        }
    }

    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sorted distinct values of a categorical column.
    pub fn distinct(&self, category: Category) -> impl Iterator<Item = &str> + '_ {
        self.distinct
            .get(&category)
            .into_iter()
            .flat_map(|values| values.iter().map(String::as_str))
    }

    /// Whether `value` occurs in the given column.
    pub fn contains(&self, category: Category, value: &str) -> bool {
        self.distinct
            .get(&category)
            .is_some_and(|values| values.contains(value))
    }

    /// Sorted districts recorded under `state`.
    pub fn districts_of(&self, state: &str) -> impl Iterator<Item = &str> + '_ {
        self.districts_by_state
            .get(state)
            .into_iter()
            .flat_map(|values| values.iter().map(String::as_str))
    }

    /// Earliest and latest survey date, `None` for an empty dataset.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.records.first()?.last_survey_date;
        Some(self.records.iter().fold((first, first), |(lo, hi), rec| {
            (lo.min(rec.last_survey_date), hi.max(rec.last_survey_date))
        }))
    }

    /// A view containing every record.
    pub fn view(&self) -> FilteredDataset<'_> {
        FilteredDataset::new(self, (0..self.len()).collect())
    }
}

// ---------------------------------------------------------------------------
// FilteredDataset – a derived subset of a Dataset
// ---------------------------------------------------------------------------

/// Indices of the records of `dataset` that passed a filter, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredDataset<'a> {
    dataset: &'a Dataset,
    indices: Vec<usize>,
}

impl<'a> FilteredDataset<'a> {
    pub(crate) fn new(dataset: &'a Dataset, indices: Vec<usize>) -> Self {
        FilteredDataset { dataset, indices }
    }

    /// The dataset this view was derived from.
    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Matching records in file order.
    pub fn records(&self) -> impl Iterator<Item = &'a AssetRecord> + '_ {
        let dataset: &'a Dataset = self.dataset;
        let records = &dataset.records;
        self.indices.iter().map(move |&i| &records[i])
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}
