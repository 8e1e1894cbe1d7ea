// ============================================================
// Layer 4 — Synthetic Volume Source
// ============================================================
// Generates labelled volumes filled with uniform noise in [0, 1).
// This stands in for a real data source so the whole pipeline
// can be trained end to end.
//
// The generator is seeded, so two sources built with the same
// seed hand back identical samples.

use anyhow::Result;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::domain::{sample::VolumeSample, traits::SampleSource};

#[derive(Debug, Clone)]
pub struct SyntheticSource {
    count:          usize,
    feature_extent: [usize; 3],
    label_extent:   [usize; 3],
    seed:           u64,
}

impl SyntheticSource {
    pub fn new(count: usize, feature_extent: [usize; 3], label_extent: [usize; 3], seed: u64) -> Self {
        Self { count, feature_extent, label_extent, seed }
    }
}

impl SampleSource for SyntheticSource {
    fn load_all(&self) -> Result<Vec<VolumeSample>> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let feature_len: usize = self.feature_extent.iter().product();
        let label_len:   usize = self.label_extent.iter().product();

        let samples = (0..self.count)
            .map(|_| {
                let features = (0..feature_len).map(|_| rng.gen::<f32>()).collect();
                let labels   = (0..label_len).map(|_| rng.gen::<f32>()).collect();
                VolumeSample::new(self.feature_extent, features, self.label_extent, labels)
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            "Generated {} synthetic samples: features {:?}, labels {:?}",
            samples.len(), self.feature_extent, self.label_extent
        );
        Ok(samples)
    }
}
