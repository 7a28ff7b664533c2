use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::StringRecord;
use once_cell::sync::OnceCell;

use super::error::DataFormatError;
use super::model::{AssetRecord, Dataset, LineEnding};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

static DATASET: OnceCell<Dataset> = OnceCell::new();

/// Load the asset table, once per process.
///
/// The first successful call reads and parses `path`; every later call
/// returns the same dataset without touching the filesystem, whatever path
/// it is given. A failed load leaves the cache empty so the caller can
/// report the error.
pub fn load(path: &Path) -> Result<&'static Dataset, DataFormatError> {
    DATASET.get_or_try_init(|| {
        let dataset = read_file(path)?;
        log::info!(
            "Loaded {} asset records from {} (columns: {:?})",
            dataset.len(),
            path.display(),
            dataset.headers.iter().collect::<Vec<_>>()
        );
        Ok(dataset)
    })
}

/// Read and parse a CSV file without caching.
pub fn read_file(path: &Path) -> Result<Dataset, DataFormatError> {
    let file = File::open(path).map_err(|source| DataFormatError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_csv(file)
}

/// Parse an asset table from any CSV source.
///
/// Expected layout: a header row containing at least
/// `asset_name, state, district, asset_type, status, last_survey_date,
/// area_ha, ndvi, ndwi` in any order. Other columns are kept verbatim.
///
/// A single unparsable `last_survey_date` rejects the whole load. Missing or
/// unparsable `area_ha`, `ndvi` and `ndwi` cells become `None`.
pub fn read_csv<R: Read>(source: R) -> Result<Dataset, DataFormatError> {
    let mut source = BufReader::new(source);
    let line_ending = LineEnding::detect(source.fill_buf().map_err(csv::Error::from)?);

    let mut reader = csv::Reader::from_reader(source);
    let headers = reader.headers()?.clone();
    let columns = ColumnIndex::locate(&headers)?;

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let cells = result?;
        records.push(columns.parse_row(cells, row_no + 1)?);
    }

    Ok(Dataset::new(headers, records).with_line_ending(line_ending))
}

// ---------------------------------------------------------------------------
// Column lookup
// ---------------------------------------------------------------------------

struct ColumnIndex {
    asset_name: usize,
    state: usize,
    district: usize,
    asset_type: usize,
    status: usize,
    last_survey_date: usize,
    area_ha: usize,
    ndvi: usize,
    ndwi: usize,
}

impl ColumnIndex {
    fn locate(headers: &StringRecord) -> Result<Self, DataFormatError> {
        let find = |name: &'static str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or(DataFormatError::MissingColumn(name))
        };

        Ok(ColumnIndex {
            asset_name: find("asset_name")?,
            state: find("state")?,
            district: find("district")?,
            asset_type: find("asset_type")?,
            status: find("status")?,
            last_survey_date: find("last_survey_date")?,
            area_ha: find("area_ha")?,
            ndvi: find("ndvi")?,
            ndwi: find("ndwi")?,
        })
    }

    fn parse_row(&self, cells: StringRecord, row: usize) -> Result<AssetRecord, DataFormatError> {
        let text = |idx: usize| cells.get(idx).unwrap_or("").to_string();

        let raw_date = cells.get(self.last_survey_date).unwrap_or("");
        let last_survey_date = parse_date(raw_date).ok_or_else(|| DataFormatError::InvalidDate {
            row,
            value: raw_date.to_string(),
        })?;

        Ok(AssetRecord {
            asset_name: text(self.asset_name),
            state: text(self.state),
            district: text(self.district),
            asset_type: text(self.asset_type),
            status: text(self.status),
            last_survey_date,
            area_ha: parse_measure(cells.get(self.area_ha)).filter(|v| *v >= 0.0),
            ndvi: parse_measure(cells.get(self.ndvi)),
            ndwi: parse_measure(cells.get(self.ndwi)),
            cells,
        })
    }
}

// ---------------------------------------------------------------------------
// Cell parsers
// ---------------------------------------------------------------------------

// Slash dates with the year last are read month first.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y%m%d",
    "%m/%d/%Y",
    "%d %b %Y",
    "%b %d, %Y",
    "%b %d %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parse a survey date. Timestamps are truncated to their calendar day.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

/// Parse a numeric cell; empty, non-numeric and non-finite values are missing.
fn parse_measure(cell: Option<&str>) -> Option<f64> {
    let s = cell?.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::{scenario, SCENARIO_CSV};

    #[test]
    fn parses_scenario_rows() {
        let ds = scenario();
        assert_eq!(ds.len(), 3);

        let first = &ds.records[0];
        assert_eq!(first.asset_name, "Well 1");
        assert_eq!(first.state, "A");
        assert_eq!(first.district, "X");
        assert_eq!(first.asset_type, "well");
        assert_eq!(first.status, "active");
        assert_eq!(
            first.last_survey_date,
            NaiveDate::from_ymd_opt(2023, 1, 15).unwrap()
        );
        assert_eq!(first.area_ha, Some(2.0));
        assert_eq!(first.ndvi, Some(0.5));
        assert_eq!(first.ndwi, Some(0.1));

        assert_eq!(ds.records[2].ndvi, None);
    }

    #[test]
    fn keeps_pass_through_columns() {
        let ds = scenario();
        assert_eq!(ds.headers.get(9), Some("surveyor"));
        assert_eq!(ds.records[1].cells.get(9), Some("bob"));
    }

    #[test]
    fn accepts_common_date_spellings() {
        let expected = NaiveDate::from_ymd_opt(2023, 3, 7).unwrap();
        for s in [
            "2023-03-07",
            "2023/03/07",
            "2023-03-07 13:45:00",
            "2023-03-07T13:45:00",
            "2023-03-07T13:45:00.250",
            "2023-03-07T13:45:00+05:30",
            "2023-03-07T13:45",
            "2023-03-07 13:45",
            "20230307",
            "03/07/2023",
            "7 Mar 2023",
            "07 March 2023",
            "Mar 7, 2023",
            " 2023-03-07 ",
        ] {
            assert_eq!(parse_date(s), Some(expected), "{s}");
        }
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("13/07/2023"), None);
        assert_eq!(parse_date("2023-02-30"), None);
        assert_eq!(parse_date("2023-03-07T25:00"), None);
    }

    #[test]
    fn minutes_only_timestamps_load() {
        let csv = "asset_name,state,district,asset_type,status,last_survey_date,area_ha,ndvi,ndwi\n\
                   a,A,X,well,active,2023-01-15T10:30,1,0.1,0.1\n\
                   b,A,X,well,active,15 Jan 2023,1,0.1,0.1\n";
        let ds = read_csv(csv.as_bytes()).unwrap();
        let expected = NaiveDate::from_ymd_opt(2023, 1, 15).unwrap();
        assert!(ds.records.iter().all(|r| r.last_survey_date == expected));
    }

    #[test]
    fn detects_source_line_ending() {
        assert_eq!(scenario().line_ending, LineEnding::Lf);
        let crlf = SCENARIO_CSV.replace('\n', "\r\n");
        let ds = read_csv(crlf.as_bytes()).unwrap();
        assert_eq!(ds.line_ending, LineEnding::Crlf);
        assert_eq!(ds.records[0].cells.get(9), Some("alice"));
    }

    #[test]
    fn bad_date_rejects_whole_load() {
        let csv = "asset_name,state,district,asset_type,status,last_survey_date,area_ha,ndvi,ndwi\n\
                   a,A,X,well,active,2023-01-01,1,0.1,0.1\n\
                   b,A,X,well,active,not-a-date,1,0.1,0.1\n";
        match read_csv(csv.as_bytes()) {
            Err(DataFormatError::InvalidDate { row, value }) => {
                assert_eq!(row, 2);
                assert_eq!(value, "not-a-date");
            }
            other => panic!("expected InvalidDate, got {other:?}"),
        }
    }

    #[test]
    fn missing_required_column_is_rejected() {
        let csv = "asset_name,state,district,asset_type,status,area_ha,ndvi,ndwi\n\
                   a,A,X,well,active,1,0.1,0.1\n";
        assert!(matches!(
            read_csv(csv.as_bytes()),
            Err(DataFormatError::MissingColumn("last_survey_date"))
        ));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let csv = format!("{SCENARIO_CSV}short,row\n");
        assert!(matches!(
            read_csv(csv.as_bytes()),
            Err(DataFormatError::Csv(_))
        ));
    }

    #[test]
    fn unreadable_file_is_reported() {
        let err = read_file(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, DataFormatError::Io { .. }));
        assert!(err.to_string().contains("/definitely/not/here.csv"));
    }

    #[test]
    fn bad_measures_become_missing() {
        let csv = "asset_name,state,district,asset_type,status,last_survey_date,area_ha,ndvi,ndwi\n\
                   a,A,X,well,active,2023-01-01,n/a,NaN,\n\
                   b,A,X,well,active,2023-01-01,-4,inf,0.25\n";
        let ds = read_csv(csv.as_bytes()).unwrap();
        assert_eq!(ds.records[0].area_ha, None);
        assert_eq!(ds.records[0].ndvi, None);
        assert_eq!(ds.records[0].ndwi, None);
        assert_eq!(ds.records[1].area_ha, None);
        assert_eq!(ds.records[1].ndvi, None);
        assert_eq!(ds.records[1].ndwi, Some(0.25));
    }

    #[test]
    fn header_only_file_is_an_empty_dataset() {
        let csv = "asset_name,state,district,asset_type,status,last_survey_date,area_ha,ndvi,ndwi\n";
        let ds = read_csv(csv.as_bytes()).unwrap();
        assert!(ds.is_empty());
        assert_eq!(ds.date_bounds(), None);
    }

    #[test]
    fn cached_load_reads_once() {
        let path = std::env::temp_dir().join(format!(
            "water-assets-cache-{}.csv",
            std::process::id()
        ));
        std::fs::write(&path, SCENARIO_CSV).unwrap();

        let first = load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        let second = load(&path).unwrap();

        assert!(std::ptr::eq(first, second));
        assert_eq!(second.len(), 3);
    }
}
