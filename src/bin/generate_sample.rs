use anyhow::{Context, Result};
use serde::Serialize;

/// One output row, in the column order of the asset table.
#[derive(Serialize)]
struct SampleAsset {
    asset_name: String,
    state: &'static str,
    district: &'static str,
    asset_type: &'static str,
    status: &'static str,
    last_survey_date: String,
    area_ha: Option<f64>,
    ndvi: Option<f64>,
    ndwi: Option<f64>,
    survey_agency: &'static str,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    fn pick<T: Copy>(&mut self, items: &[T]) -> T {
        items[(self.next_u64() % items.len() as u64) as usize]
    }
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    let regions: [(&str, &[&str]); 4] = [
        ("Maharashtra", &["Pune", "Nashik", "Satara"]),
        ("Rajasthan", &["Jaipur", "Udaipur"]),
        ("Karnataka", &["Dharwad", "Tumkur", "Kolar"]),
        ("Telangana", &["Medak", "Nalgonda"]),
    ];
    // (asset type, typical area range in ha, ndwi bias)
    let asset_types: [(&str, (f64, f64), f64); 5] = [
        ("pond", (0.2, 4.0), 0.25),
        ("well", (0.01, 0.1), 0.05),
        ("check dam", (0.5, 8.0), 0.15),
        ("farm pond", (0.05, 1.0), 0.2),
        ("percolation tank", (1.0, 12.0), 0.3),
    ];
    let statuses = ["active", "active", "active", "inactive", "under repair"];
    let agencies = ["Yes", "No"];

    let start = chrono::NaiveDate::from_ymd_opt(2022, 1, 1).context("invalid start date")?;
    let span_days = 730;

    let output_path = "sample_assets.csv";
    let mut writer = csv::Writer::from_path(output_path).context("creating output file")?;

    let n_assets = 400;
    for i in 0..n_assets {
        let (state, districts) = rng.pick(&regions);
        let (asset_type, (area_lo, area_hi), ndwi_bias) = rng.pick(&asset_types);
        let survey = start + chrono::Days::new(rng.next_u64() % span_days);

        // About 3% of the index readings are missing, as in real surveys.
        let ndvi = (rng.next_f64() > 0.03).then(|| round3(rng.uniform(-0.1, 0.8)));
        let ndwi = (rng.next_f64() > 0.03).then(|| round3(rng.uniform(-0.3, 0.3) + ndwi_bias));

        writer
            .serialize(SampleAsset {
                asset_name: format!("{} {:03}", asset_type, i + 1),
                state,
                district: rng.pick(districts),
                asset_type,
                status: rng.pick(&statuses),
                last_survey_date: survey.format("%Y-%m-%d").to_string(),
                area_ha: Some(round3(rng.uniform(area_lo, area_hi))),
                ndvi,
                ndwi,
                survey_agency: rng.pick(&agencies),
            })
            .with_context(|| format!("writing row {i}"))?;
    }
    writer.flush().context("flushing output file")?;

    println!("Wrote {n_assets} water assets to {output_path}");
    println!("Open it with: cargo run -- --data {output_path}");
    Ok(())
}
