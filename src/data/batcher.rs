// ============================================================
// Layer 4 — Volume Batcher
// ============================================================
// Implements Burn's Batcher trait: stacks N samples into
//
//   features: [N, x, y, depth]
//   labels:   [N, x, y, filters]
//
// Each sample already stores its values flat in (x, y, z)
// order, so stacking is a concatenation followed by one
// TensorData with the batch shape.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::domain::sample::VolumeSample;

/// A batch of volumes ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct VolumeBatch<B: Backend> {
    pub features: Tensor<B, 4>,
    pub labels:   Tensor<B, 4>,
}

#[derive(Clone, Debug, Default)]
pub struct VolumeBatcher;

impl VolumeBatcher {
    pub fn new() -> Self {
        Self
    }
}

impl<B: Backend> Batcher<B, VolumeSample, VolumeBatch<B>> for VolumeBatcher {
    fn batch(&self, items: Vec<VolumeSample>, device: &B::Device) -> VolumeBatch<B> {
        let batch_size = items.len();
        // Samples from one source share extents.
        let [fx, fy, fz] = items[0].feature_extent;
        let [lx, ly, lz] = items[0].label_extent;

        let features: Vec<f32> = items.iter().flat_map(|s| s.features.iter().copied()).collect();
        let labels:   Vec<f32> = items.iter().flat_map(|s| s.labels.iter().copied()).collect();

        let features = Tensor::<B, 4>::from_data(
            TensorData::new(features, [batch_size, fx, fy, fz]),
            device,
        );
        let labels = Tensor::<B, 4>::from_data(
            TensorData::new(labels, [batch_size, lx, ly, lz]),
            device,
        );

        VolumeBatch { features, labels }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type B = NdArray;

    #[test]
    fn test_batch_shapes_and_order() {
        let device = Default::default();
        let first  = VolumeSample::new([1, 2, 3], vec![0.0; 6], [1, 2, 2], vec![0.0; 4]).unwrap();
        let second = VolumeSample::new([1, 2, 3], vec![1.0; 6], [1, 2, 2], vec![1.0; 4]).unwrap();

        let batch: VolumeBatch<B> = VolumeBatcher::new().batch(vec![first, second], &device);
        assert_eq!(batch.features.dims(), [2, 1, 2, 3]);
        assert_eq!(batch.labels.dims(), [2, 1, 2, 2]);

        // The second sample lands in batch row 1.
        let row: Vec<f32> = batch.features.slice([1..2, 0..1, 0..2, 0..3])
            .into_data().to_vec::<f32>().unwrap();
        assert!(row.iter().all(|v| *v == 1.0));
    }
}
