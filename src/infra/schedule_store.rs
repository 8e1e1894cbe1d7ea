// ============================================================
// Layer 6 — Schedule Store
// ============================================================
// Reads a hand-designed hourglass schedule from a JSON file, e.g.
//
//   {
//     "input_extent": [64, 64, 3],
//     "conv_stages": [
//       { "kernel": [5, 5, 3], "filters": 3, "padding": "valid", "activation": "relu" }
//     ],
//     "pool_stages": [ { "kernel": [8, 8, 1], "stride": 1 } ],
//     "output_filters": 64
//   }
//
// The schedule is planned right after loading so a bad file is
// reported with its shape error instead of failing mid-training.

use anyhow::{Context, Result};
use std::{fs, path::Path};

use crate::ml::model::HourglassConfig;

pub fn load_schedule(path: impl AsRef<Path>) -> Result<HourglassConfig> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)
        .with_context(|| format!("Cannot read schedule '{}'", path.display()))?;
    let config: HourglassConfig = serde_json::from_str(&json)
        .with_context(|| format!("Malformed schedule '{}'", path.display()))?;

    let plan = config.plan()
        .with_context(|| format!("Schedule '{}' is not a valid hourglass", path.display()))?;
    tracing::info!(
        "Loaded schedule '{}': {} stages, output {:?}",
        path.display(), plan.num_stages(), plan.output
    );
    Ok(config)
}
