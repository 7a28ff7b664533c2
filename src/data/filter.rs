use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::model::{AssetRecord, Category, Dataset, FilteredDataset};

// ---------------------------------------------------------------------------
// Filter criteria
// ---------------------------------------------------------------------------

/// Inclusive survey-date window. Only applied when both bounds are set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Both bounds, or `None` while the range is incomplete.
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.start?, self.end?))
    }
}

/// User selections in the filter panel.
///
/// "All" is never stored as a value: an unconstrained single-valued field is
/// `None`, an unconstrained multi-valued field is the empty set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub state: Option<String>,
    /// Only meaningful together with `state`.
    pub district: Option<String>,
    pub asset_types: BTreeSet<String>,
    pub statuses: BTreeSet<String>,
    pub date_range: DateRange,
}

impl FilterCriteria {
    /// Whether every dimension is unconstrained.
    pub fn is_unconstrained(&self) -> bool {
        self.state.is_none()
            && self.district.is_none()
            && self.asset_types.is_empty()
            && self.statuses.is_empty()
            && self.date_range.bounds().is_none()
    }

    /// Drop selections that do not occur in `dataset`.
    ///
    /// * a state that never occurs is dropped;
    /// * a district is dropped unless it belongs to the (kept) state;
    /// * asset types / statuses that never occur are removed from their
    ///   set, which leaves the dimension unconstrained once nothing remains.
    pub fn resolve(&self, dataset: &Dataset) -> FilterCriteria {
        let state = self
            .state
            .clone()
            .filter(|s| keep(dataset.contains(Category::State, s), Category::State, s));

        let district = match &state {
            Some(state) => self.district.clone().filter(|d| {
                keep(
                    dataset.districts_of(state).any(|known| known == d.as_str()),
                    Category::District,
                    d,
                )
            }),
            None => None,
        };

        let known = |category: Category, values: &BTreeSet<String>| -> BTreeSet<String> {
            values
                .iter()
                .filter(|v| keep(dataset.contains(category, v), category, v))
                .cloned()
                .collect()
        };

        FilterCriteria {
            state,
            district,
            asset_types: known(Category::AssetType, &self.asset_types),
            statuses: known(Category::Status, &self.statuses),
            date_range: self.date_range,
        }
    }

    /// Whether `record` passes every active criterion. Criteria are used as
    /// given; call [`FilterCriteria::resolve`] first.
    pub fn matches(&self, record: &AssetRecord) -> bool {
        if let Some(state) = &self.state {
            if record.state != *state {
                return false;
            }
        }
        if let Some(district) = &self.district {
            if record.district != *district {
                return false;
            }
        }
        if !self.asset_types.is_empty() && !self.asset_types.contains(&record.asset_type) {
            return false;
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&record.status) {
            return false;
        }
        if let Some((start, end)) = self.date_range.bounds() {
            if record.last_survey_date < start || record.last_survey_date > end {
                return false;
            }
        }
        true
    }
}

fn keep(present: bool, category: Category, value: &str) -> bool {
    if !present {
        log::warn!("Ignoring {category} filter {value:?}: not present in the dataset");
    }
    present
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Return the records of `dataset` that pass all active criteria.
///
/// Criteria are resolved against `dataset` first, so selections that name
/// values absent from the data never constrain anything. An empty result is
/// a valid outcome.
pub fn apply<'a>(dataset: &'a Dataset, criteria: &FilterCriteria) -> FilteredDataset<'a> {
    dataset.view().refine(criteria)
}

impl<'a> FilteredDataset<'a> {
    /// Narrow this view further. Resolution always uses the full source
    /// dataset, which makes filtering idempotent.
    pub fn refine(&self, criteria: &FilterCriteria) -> FilteredDataset<'a> {
        let dataset = self.dataset();
        let resolved = criteria.resolve(dataset);
        let indices = self
            .indices()
            .iter()
            .copied()
            .filter(|&i| resolved.matches(&dataset.records[i]))
            .collect();
        FilteredDataset::new(dataset, indices)
    }
}

/// Districts selectable once `state` is chosen; empty when no state is.
pub fn district_options(dataset: &Dataset, state: Option<&str>) -> Vec<String> {
    match state {
        Some(state) => dataset.districts_of(state).map(str::to_string).collect(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::scenario;
    use crate::data::loader::read_csv;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn names(fd: &FilteredDataset<'_>) -> Vec<String> {
        fd.records().map(|r| r.asset_name.clone()).collect()
    }

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn unconstrained_criteria_is_identity() {
        let ds = scenario();
        let criteria = FilterCriteria::default();
        assert!(criteria.is_unconstrained());

        let fd = apply(&ds, &criteria);
        assert_eq!(fd.indices(), &[0, 1, 2]);
        assert_eq!(fd, ds.view());
    }

    #[test]
    fn state_filter() {
        let ds = scenario();
        let fd = apply(
            &ds,
            &FilterCriteria {
                state: Some("A".into()),
                ..Default::default()
            },
        );
        assert_eq!(names(&fd), ["Well 1", "Pond 1"]);
    }

    #[test]
    fn asset_type_filter_spans_states() {
        let ds = scenario();
        let fd = apply(
            &ds,
            &FilterCriteria {
                asset_types: set(&["well"]),
                ..Default::default()
            },
        );
        let states: Vec<&str> = fd.records().map(|r| r.state.as_str()).collect();
        assert_eq!(states, ["A", "B"]);
    }

    #[test]
    fn multi_valued_criteria_are_or_within_and_across() {
        let ds = scenario();
        let fd = apply(
            &ds,
            &FilterCriteria {
                asset_types: set(&["well", "pond"]),
                statuses: set(&["active"]),
                ..Default::default()
            },
        );
        assert_eq!(names(&fd), ["Well 1", "Well 2"]);
    }

    #[test]
    fn date_range_is_inclusive() {
        let ds = scenario();
        let january = FilterCriteria {
            date_range: DateRange::new(date(2023, 1, 1), date(2023, 1, 31)),
            ..Default::default()
        };
        assert_eq!(names(&apply(&ds, &january)), ["Well 1", "Well 2"]);

        let exact = FilterCriteria {
            date_range: DateRange::new(date(2023, 1, 15), date(2023, 1, 20)),
            ..Default::default()
        };
        assert_eq!(names(&apply(&ds, &exact)), ["Well 1", "Well 2"]);
    }

    #[test]
    fn half_open_date_range_is_ignored() {
        let ds = scenario();
        let criteria = FilterCriteria {
            date_range: DateRange {
                start: Some(date(2023, 2, 1)),
                end: None,
            },
            ..Default::default()
        };
        assert!(criteria.is_unconstrained());
        assert_eq!(apply(&ds, &criteria).len(), 3);
    }

    #[test]
    fn inverted_date_range_matches_nothing() {
        let ds = scenario();
        let criteria = FilterCriteria {
            date_range: DateRange::new(date(2023, 2, 1), date(2023, 1, 1)),
            ..Default::default()
        };
        assert!(apply(&ds, &criteria).is_empty());
    }

    #[test]
    fn no_match_is_empty_not_error() {
        let ds = scenario();
        let fd = apply(
            &ds,
            &FilterCriteria {
                state: Some("B".into()),
                statuses: set(&["inactive"]),
                ..Default::default()
            },
        );
        assert!(fd.is_empty());
    }

    #[test]
    fn filtering_is_idempotent() {
        let ds = scenario();
        let cases = [
            FilterCriteria::default(),
            FilterCriteria {
                state: Some("A".into()),
                district: Some("Z".into()),
                ..Default::default()
            },
            FilterCriteria {
                asset_types: set(&["well", "ghost"]),
                date_range: DateRange::new(date(2023, 1, 16), date(2023, 12, 31)),
                ..Default::default()
            },
            FilterCriteria {
                state: Some("B".into()),
                statuses: set(&["inactive"]),
                ..Default::default()
            },
        ];
        for criteria in &cases {
            let once = apply(&ds, criteria);
            let twice = once.refine(criteria);
            assert_eq!(once, twice, "{criteria:?}");
        }
    }

    #[test]
    fn filtering_never_mutates_dataset() {
        let ds = scenario();
        let before = ds.clone();
        let _ = apply(
            &ds,
            &FilterCriteria {
                state: Some("A".into()),
                ..Default::default()
            },
        );
        assert_eq!(ds, before);
    }

    #[test]
    fn district_options_follow_state() {
        let ds = scenario();
        assert_eq!(district_options(&ds, Some("A")), ["X", "Y"]);
        assert_eq!(district_options(&ds, Some("B")), ["Z"]);
        assert!(district_options(&ds, None).is_empty());
        assert!(district_options(&ds, Some("nowhere")).is_empty());
    }

    #[test]
    fn stale_district_is_treated_as_unset() {
        let ds = scenario();
        // District "X" was picked under state A, then the state changed to B.
        let criteria = FilterCriteria {
            state: Some("B".into()),
            district: Some("X".into()),
            ..Default::default()
        };
        let resolved = criteria.resolve(&ds);
        assert_eq!(resolved.district, None);
        assert_eq!(names(&apply(&ds, &criteria)), ["Well 2"]);
    }

    #[test]
    fn district_without_state_is_ignored() {
        let ds = scenario();
        let criteria = FilterCriteria {
            district: Some("X".into()),
            ..Default::default()
        };
        assert_eq!(apply(&ds, &criteria).len(), 3);
    }

    #[test]
    fn valid_district_narrows_state() {
        let ds = scenario();
        let criteria = FilterCriteria {
            state: Some("A".into()),
            district: Some("Y".into()),
            ..Default::default()
        };
        assert_eq!(names(&apply(&ds, &criteria)), ["Pond 1"]);
    }

    #[test]
    fn absent_values_do_not_constrain() {
        let ds = scenario();
        let criteria = FilterCriteria {
            state: Some("Atlantis".into()),
            asset_types: set(&["reservoir"]),
            statuses: set(&["active", "decommissioned"]),
            ..Default::default()
        };
        let resolved = criteria.resolve(&ds);
        assert_eq!(resolved.state, None);
        assert!(resolved.asset_types.is_empty());
        assert_eq!(resolved.statuses, set(&["active"]));
        assert_eq!(names(&apply(&ds, &criteria)), ["Well 1", "Well 2"]);
    }

    #[test]
    fn asset_type_literally_named_all_is_filterable() {
        let csv = "asset_name,state,district,asset_type,status,last_survey_date,area_ha,ndvi,ndwi\n\
                   a,A,X,All,active,2023-01-01,1,0.1,0.1\n\
                   b,A,X,well,active,2023-01-02,1,0.1,0.1\n";
        let ds = read_csv(csv.as_bytes()).unwrap();
        let fd = apply(
            &ds,
            &FilterCriteria {
                asset_types: set(&["All"]),
                ..Default::default()
            },
        );
        assert_eq!(names(&fd), ["a"]);
    }
}
