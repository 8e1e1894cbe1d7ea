// ============================================================
// Layer 3 — Volume Sample
// ============================================================
// One labelled training example: an input volume and the voxel
// volume the network should predict for it. Values are stored
// flat in row-major (x, y, z) order, the same order the batcher
// uses when it stacks samples into tensors.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeSample {
    /// Input extent (x, y, depth).
    pub feature_extent: [usize; 3],
    pub features:       Vec<f32>,

    /// Label extent (x, y, output filters).
    pub label_extent: [usize; 3],
    pub labels:       Vec<f32>,
}

impl VolumeSample {
    /// Build a sample, checking the flat buffers match their extents.
    pub fn new(
        feature_extent: [usize; 3],
        features:       Vec<f32>,
        label_extent:   [usize; 3],
        labels:         Vec<f32>,
    ) -> Result<Self> {
        let expected = feature_extent.iter().product::<usize>();
        ensure!(
            features.len() == expected,
            "features have {} values, extent {:?} needs {}",
            features.len(), feature_extent, expected
        );
        let expected = label_extent.iter().product::<usize>();
        ensure!(
            labels.len() == expected,
            "labels have {} values, extent {:?} needs {}",
            labels.len(), label_extent, expected
        );
        Ok(Self { feature_extent, features, label_extent, labels })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_wrong_feature_length() {
        let result = VolumeSample::new([2, 2, 3], vec![0.0; 11], [2, 2, 2], vec![0.0; 8]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_wrong_label_length() {
        let result = VolumeSample::new([2, 2, 3], vec![0.0; 12], [2, 2, 2], vec![0.0; 9]);
        assert!(result.is_err());
    }

    #[test]
    fn test_accepts_matching_buffers() {
        let sample = VolumeSample::new([2, 2, 3], vec![0.5; 12], [2, 2, 2], vec![1.0; 8]).unwrap();
        assert_eq!(sample.features.len(), 12);
        assert_eq!(sample.labels.len(), 8);
    }
}
