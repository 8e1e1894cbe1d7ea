use burn::data::dataset::Dataset;

use crate::domain::sample::VolumeSample;

/// In-memory collection of labelled volumes for Burn's DataLoader.
pub struct VolumeDataset {
    samples: Vec<VolumeSample>,
}

impl VolumeDataset {
    pub fn new(samples: Vec<VolumeSample>) -> Self { Self { samples } }

    pub fn sample_count(&self) -> usize { self.samples.len() }
}

impl Dataset<VolumeSample> for VolumeDataset {
    fn get(&self, index: usize) -> Option<VolumeSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
