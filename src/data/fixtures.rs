use super::loader::read_csv;
use super::model::Dataset;

/// Three-record survey used across the data-layer tests, with one
/// pass-through column and a missing NDVI on the last row.
pub const SCENARIO_CSV: &str = "\
asset_name,state,district,asset_type,status,last_survey_date,area_ha,ndvi,ndwi,surveyor
Well 1,A,X,well,active,2023-01-15,2.0,0.5,0.1,alice
Pond 1,A,Y,pond,inactive,2023-02-10,3.0,0.6,0.2,bob
Well 2,B,Z,well,active,2023-01-20,1.0,,0.3,\"carol, jr\"
";

pub fn scenario() -> Dataset {
    read_csv(SCENARIO_CSV.as_bytes()).unwrap()
}
