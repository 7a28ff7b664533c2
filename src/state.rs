use std::collections::BTreeSet;
use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;

use crate::color::ColorMap;
use crate::data::export;
use crate::data::filter::{self, DateRange, FilterCriteria};
use crate::data::model::{Category, Dataset, FilteredDataset};
use crate::data::summary::{self, CrossTab, Granularity, Kpis, ScatterSeries};

/// Number of bars in the "top states" chart.
pub const TOP_STATES: usize = 10;

// ---------------------------------------------------------------------------
// Dashboard – every summary the central panel renders
// ---------------------------------------------------------------------------

/// Chart-ready summaries of the current view. Rebuilt on every filter change.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub kpis: Kpis,
    pub asset_types: Vec<(String, usize)>,
    pub statuses: Vec<(String, usize)>,
    pub timeline: Vec<(NaiveDate, usize)>,
    pub scatter: Vec<ScatterSeries>,
    pub top_states: Vec<(String, usize)>,
    pub heatmap: CrossTab,
}

impl Dashboard {
    pub fn compute(view: &FilteredDataset<'_>, granularity: Granularity) -> Self {
        Dashboard {
            kpis: summary::kpis(view),
            asset_types: summary::group_counts(view, Category::AssetType),
            statuses: summary::group_counts(view, Category::Status),
            timeline: summary::time_bucket_counts(view, granularity),
            scatter: summary::scatter_series(view, Category::AssetType),
            top_states: summary::top_n_by_group(view, Category::State, TOP_STATES),
            heatmap: summary::cross_tab(view, Category::State, Category::AssetType),
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded dataset (None when the load failed).
    pub dataset: Option<&'static Dataset>,

    /// Current filter selections.
    pub criteria: FilterCriteria,

    /// Records passing the current filters (cached).
    pub view: Option<FilteredDataset<'static>>,

    /// Summaries of `view` (cached).
    pub dashboard: Option<Dashboard>,

    /// Bucket size of the timeline chart.
    pub granularity: Granularity,

    /// Stable colours per asset type.
    pub asset_type_colors: ColorMap,

    /// Stable colours per status.
    pub status_colors: ColorMap,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(granularity: Granularity) -> Self {
        Self {
            dataset: None,
            criteria: FilterCriteria::default(),
            view: None,
            dashboard: None,
            granularity,
            asset_type_colors: ColorMap::new(std::iter::empty()),
            status_colors: ColorMap::new(std::iter::empty()),
            status_message: None,
        }
    }

    /// Ingest the loaded dataset, initialise filters and colours.
    pub fn set_dataset(&mut self, dataset: &'static Dataset) {
        self.asset_type_colors = ColorMap::new(dataset.distinct(Category::AssetType));
        self.status_colors = ColorMap::new(dataset.distinct(Category::Status));
        self.dataset = Some(dataset);
        self.status_message = None;
        self.reset_filters();
    }

    /// Recompute the view and its summaries after a filter change.
    pub fn refilter(&mut self) {
        let Some(ds) = self.dataset else {
            return;
        };
        let view = filter::apply(ds, &self.criteria);
        log::debug!("{} of {} records match {:?}", view.len(), ds.len(), self.criteria);
        self.dashboard = Some(Dashboard::compute(&view, self.granularity));
        self.view = Some(view);
    }

    /// Clear every selection.
    pub fn reset_filters(&mut self) {
        self.criteria = FilterCriteria::default();
        self.refilter();
    }

    /// Districts selectable under the current state.
    pub fn district_options(&self) -> Vec<String> {
        match self.dataset {
            Some(ds) => filter::district_options(ds, self.criteria.state.as_deref()),
            None => Vec::new(),
        }
    }

    /// Change the state; a district outside the new state is unset.
    pub fn set_state(&mut self, state: Option<String>) {
        self.criteria.state = state;
        if let Some(district) = &self.criteria.district {
            if !self.district_options().contains(district) {
                self.criteria.district = None;
            }
        }
        self.refilter();
    }

    pub fn set_district(&mut self, district: Option<String>) {
        self.criteria.district = district;
        self.refilter();
    }

    /// Add or remove one value of a multi-valued filter.
    pub fn toggle(&mut self, category: Category, value: &str) {
        let Some(selected) = self.selection_mut(category) else {
            return;
        };
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
        self.refilter();
    }

    /// Drop every selected value of a multi-valued filter ("All").
    pub fn select_all(&mut self, category: Category) {
        if let Some(selected) = self.selection_mut(category) {
            selected.clear();
            self.refilter();
        }
    }

    fn selection_mut(&mut self, category: Category) -> Option<&mut BTreeSet<String>> {
        match category {
            Category::AssetType => Some(&mut self.criteria.asset_types),
            Category::Status => Some(&mut self.criteria.statuses),
            Category::State | Category::District => None,
        }
    }

    pub fn set_date_range(&mut self, range: DateRange) {
        self.criteria.date_range = range;
        self.refilter();
    }

    pub fn set_granularity(&mut self, granularity: Granularity) {
        self.granularity = granularity;
        self.refilter();
    }

    /// Write the current view to `path`.
    pub fn export_to(&self, path: &Path) -> Result<()> {
        let Some(view) = &self.view else {
            anyhow::bail!("no dataset loaded");
        };
        export::save(view, path)
    }

    pub fn visible_count(&self) -> usize {
        self.view.as_ref().map_or(0, FilteredDataset::len)
    }
}
