use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use super::model::FilteredDataset;

/// Default file name offered by the export dialog.
pub const DEFAULT_EXPORT_NAME: &str = "filtered_water_assets.csv";

/// Write the header row and the original cells of every record in the view.
///
/// Output uses the source schema, so it loads back with
/// [`super::loader::read_csv`]. Cells are re-quoted only where CSV requires
/// it and lines end the way they did in the source file.
pub fn write_csv<W: Write>(fd: &FilteredDataset<'_>, sink: W) -> Result<(), csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(fd.dataset().line_ending.terminator())
        .from_writer(sink);
    writer.write_record(&fd.dataset().headers)?;
    for rec in fd.records() {
        writer.write_record(&rec.cells)?;
    }
    writer.flush()?;
    Ok(())
}

/// The view serialized as CSV bytes.
pub fn to_csv_bytes(fd: &FilteredDataset<'_>) -> Result<Vec<u8>, csv::Error> {
    let mut buf = Vec::new();
    write_csv(fd, &mut buf)?;
    Ok(buf)
}

/// Save the view to `path`.
pub fn save(fd: &FilteredDataset<'_>, path: &Path) -> Result<()> {
    let bytes = to_csv_bytes(fd).context("serializing filtered records")?;
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
    log::info!("Exported {} records to {}", fd.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{apply, FilterCriteria};
    use crate::data::fixtures::{scenario, SCENARIO_CSV};
    use crate::data::loader::read_csv;

    #[test]
    fn unfiltered_export_reproduces_source() {
        let ds = scenario();
        let fd = apply(&ds, &FilterCriteria::default());
        let bytes = to_csv_bytes(&fd).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), SCENARIO_CSV);
    }

    #[test]
    fn crlf_source_exports_with_crlf() {
        let source = SCENARIO_CSV.replace('\n', "\r\n");
        let ds = read_csv(source.as_bytes()).unwrap();
        let bytes = to_csv_bytes(&apply(&ds, &FilterCriteria::default())).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), source);
    }

    #[test]
    fn filtered_export_reloads_field_for_field() {
        let ds = scenario();
        let fd = apply(
            &ds,
            &FilterCriteria {
                asset_types: ["well".to_string()].into(),
                ..Default::default()
            },
        );
        let reloaded = read_csv(to_csv_bytes(&fd).unwrap().as_slice()).unwrap();

        assert_eq!(reloaded.headers, ds.headers);
        let original: Vec<_> = fd.records().cloned().collect();
        assert_eq!(reloaded.records, original);
        assert_eq!(reloaded.records[1].cells.get(9), Some("carol, jr"));
    }

    #[test]
    fn empty_view_exports_header_only() {
        let ds = scenario();
        let fd = apply(
            &ds,
            &FilterCriteria {
                state: Some("B".into()),
                statuses: ["inactive".to_string()].into(),
                ..Default::default()
            },
        );
        let text = String::from_utf8(to_csv_bytes(&fd).unwrap()).unwrap();
        assert_eq!(
            text,
            "asset_name,state,district,asset_type,status,last_survey_date,area_ha,ndvi,ndwi,surveyor\n"
        );
        assert!(read_csv(text.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn save_writes_file() {
        let ds = scenario();
        let path = std::env::temp_dir().join(format!(
            "water-assets-export-{}.csv",
            std::process::id()
        ));
        save(&ds.view(), &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(written, SCENARIO_CSV);
    }
}
