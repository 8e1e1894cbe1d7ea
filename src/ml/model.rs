use burn::{
    nn::{
        conv::{Conv3d, Conv3dConfig},
        pool::{MaxPool1d, MaxPool1dConfig, MaxPool2d, MaxPool2dConfig},
        PaddingConfig3d, Relu,
    },
    prelude::*,
};

use crate::domain::{
    geometry::{Activation, ConvStage, Padding, PoolStage},
    plan::{HourglassPlan, ShapeError},
};
use crate::ml::{
    ops::{fold_filters_into_depth, max_pool3d, upsample_nearest},
    residual::{Identity, ResidualFn},
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally, so do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct HourglassConfig {
    /// Input volume extent (x, y, depth).
    pub input_extent: [usize; 3],
    pub conv_stages:  Vec<ConvStage>,
    pub pool_stages:  Vec<PoolStage>,
    #[config(default = 200)]
    pub output_filters: usize,
}

impl HourglassConfig {
    /// The 200x200x3 → 200x200x200 schedule:
    /// records 200 → 125 → 50 → 4 with 4x4x3 kernels, three filters,
    /// and 73/73/44 pooling windows at stride one.
    pub fn default_schedule() -> Self {
        let conv = ConvStage::new([4, 4, 3], 3, Padding::Valid, Activation::Relu);
        Self::new(
            [200, 200, 3],
            vec![conv; 3],
            vec![
                PoolStage::new([73, 73, 1], 1),
                PoolStage::new([73, 73, 1], 1),
                PoolStage::new([44, 44, 1], 1),
            ],
        )
    }

    pub fn plan(&self) -> Result<HourglassPlan, ShapeError> {
        HourglassPlan::new(self.input_extent, &self.conv_stages, &self.pool_stages, self.output_filters)
    }

    /// Validate the schedule and build the network.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<Hourglass<B>, ShapeError> {
        let plan  = self.plan()?;
        let depth = self.input_extent[2];

        let stages = self.conv_stages.iter()
            .zip(&self.pool_stages)
            .zip(&plan.records)
            .map(|((conv, pool), input)| build_stage(conv, pool, input.channels, depth, device))
            .collect();

        let head = Conv3dConfig::new([plan.input().channels, self.output_filters], plan.head_kernel)
            .init(device);

        Ok(Hourglass { stages, head })
    }
}

fn build_stage<B: Backend>(
    conv:        &ConvStage,
    pool:        &PoolStage,
    in_channels: usize,
    depth:       usize,
    device:      &B::Device,
) -> EncoderStage<B> {
    let padding = match conv.padding {
        Padding::Valid => PaddingConfig3d::Valid,
        Padding::Same  => PaddingConfig3d::Same,
    };
    let conv_layer = Conv3dConfig::new([in_channels, conv.filters], conv.kernel)
        .with_padding(padding)
        .init(device);
    let activation = match conv.activation {
        Activation::Relu   => Some(Relu::new()),
        Activation::Linear => None,
    };
    let [px, py, pz] = pool.kernel;
    let pool_xy = MaxPool2dConfig::new([px, py])
        .with_strides([pool.stride, pool.stride])
        .init();
    let pool_z = MaxPool1dConfig::new(pz)
        .with_stride(pool.stride)
        .init();

    EncoderStage { conv: conv_layer, activation, pool_xy, pool_z, depth }
}

/// conv → activation → fold filters into depth → max pool
#[derive(Module, Debug)]
pub struct EncoderStage<B: Backend> {
    pub conv:       Conv3d<B>,
    pub activation: Option<Relu>,
    pub pool_xy:    MaxPool2d,
    pub pool_z:     MaxPool1d,
    pub depth:      usize,
}

impl<B: Backend> EncoderStage<B> {
    pub fn forward(&self, x: Tensor<B, 5>) -> Tensor<B, 5> {
        let x = self.conv.forward(x);
        let x = match &self.activation {
            Some(relu) => relu.forward(x),
            None       => x,
        };
        let x = fold_filters_into_depth(x, self.depth);
        max_pool3d(x, &self.pool_xy, &self.pool_z)
    }
}

/// A downsampled layer kept for the decoder, tagged with the index of
/// the record it is (0 = network input).
pub struct StageRecord<B: Backend> {
    pub index: usize,
    pub layer: Tensor<B, 5>,
}

impl<B: Backend> StageRecord<B> {
    pub fn new(index: usize, layer: Tensor<B, 5>) -> Self {
        Self { index, layer }
    }

    pub fn dims(&self) -> [usize; 5] {
        self.layer.dims()
    }
}

#[derive(Module, Debug)]
pub struct Hourglass<B: Backend> {
    pub stages: Vec<EncoderStage<B>>,
    pub head:   Conv3d<B>,
}

impl<B: Backend> Hourglass<B> {
    /// features: [batch, x, y, depth] → logits: [batch, x, y, filters]
    pub fn forward(&self, features: Tensor<B, 4>) -> Tensor<B, 4> {
        self.forward_with(features, &Identity)
    }

    /// Same as `forward`, transforming every encoder record with
    /// `residual` before it is added into the decoder.
    pub fn forward_with<R: ResidualFn<B>>(&self, features: Tensor<B, 4>, residual: &R) -> Tensor<B, 4> {
        let [batch, x, y, depth] = features.dims();
        let mut current = features.reshape([batch, 1, x, y, depth]);

        // Downsample: record i is the input of stage i.
        let mut records = Vec::with_capacity(self.stages.len());
        for (index, stage) in self.stages.iter().enumerate() {
            records.push(StageRecord::new(index, current.clone()));
            current = stage.forward(current);
        }

        // Upsample back through the records, innermost first.
        for record in records.into_iter().rev() {
            let target = record.dims();
            let [_, _, tx, ty, tz] = target;
            tracing::trace!("decoder: upsampling into record {} {:?}", record.index, target);
            let upsampled = upsample_nearest(current, [tx, ty, tz]);
            let skip = residual.apply(record.layer).reshape(target);
            current = upsampled + skip;
        }

        // [b, filters, x, y, 1] → [b, x, y, filters]
        let logits = self.head.forward(current);
        let [_, filters, _, _, _] = logits.dims();
        logits.reshape([batch, filters, x, y]).permute([0, 2, 3, 1])
    }

    pub fn num_stages(&self) -> usize {
        self.stages.len()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    type B = NdArray;

    pub(crate) fn small_config() -> HourglassConfig {
        let conv = ConvStage::new([3, 3, 3], 3, Padding::Valid, Activation::Relu);
        HourglassConfig::new(
            [12, 12, 3],
            vec![conv; 2],
            vec![PoolStage::new([3, 3, 1], 1); 2],
        )
        .with_output_filters(12)
    }

    #[test]
    fn test_default_schedule_forward_shape() {
        let device = Default::default();
        let model = HourglassConfig::default_schedule().init::<B>(&device).unwrap();
        assert_eq!(model.num_stages(), 3);

        let features = Tensor::<B, 4>::random([1, 200, 200, 3], Distribution::Default, &device);
        assert_eq!(model.forward(features).dims(), [1, 200, 200, 200]);
    }

    #[test]
    fn test_small_schedule_forward_shape_any_batch() {
        let device = Default::default();
        let model = small_config().init::<B>(&device).unwrap();
        for batch in [1, 3] {
            let features = Tensor::<B, 4>::random([batch, 12, 12, 3], Distribution::Default, &device);
            assert_eq!(model.forward(features).dims(), [batch, 12, 12, 12]);
        }
    }

    #[test]
    fn test_forward_matches_plan() {
        let device = Default::default();
        let config = small_config();
        let plan = config.plan().unwrap();
        let model = config.init::<B>(&device).unwrap();
        let features = Tensor::<B, 4>::zeros([2, 12, 12, 3], &device);
        assert_eq!(model.forward(features).dims(), plan.output_dims(2));
    }

    #[test]
    fn test_building_twice_gives_same_shapes() {
        let device = Default::default();
        let features = Tensor::<B, 4>::ones([2, 12, 12, 3], &device);
        let a = small_config().init::<B>(&device).unwrap().forward(features.clone());
        let b = small_config().init::<B>(&device).unwrap().forward(features);
        assert_eq!(a.dims(), b.dims());
    }

    #[test]
    fn test_custom_residual_changes_output() {
        let device = Default::default();
        let model = small_config().init::<B>(&device).unwrap();
        let features = Tensor::<B, 4>::ones([1, 12, 12, 3], &device);

        let with_identity = model.forward(features.clone());
        let zeroed = |layer: Tensor<B, 5>| layer.zeros_like();
        let without_skips = model.forward_with(features, &zeroed);

        assert_eq!(without_skips.dims(), with_identity.dims());
        let diff = (with_identity - without_skips).abs().sum().into_scalar();
        assert!(diff > 0.0);
    }

    #[test]
    fn test_bad_schedule_fails_before_building() {
        let device = Default::default();
        let mut config = HourglassConfig::default_schedule();
        config.pool_stages[2] = PoolStage::new([80, 80, 1], 1);
        assert!(matches!(
            config.init::<B>(&device),
            Err(ShapeError::PoolUnderflow { stage: 3, .. })
        ));
    }

    #[test]
    fn test_config_json_keeps_schedule() {
        let config = HourglassConfig::default_schedule();
        let json = serde_json::to_string(&config).unwrap();
        let back: HourglassConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.plan().unwrap(), config.plan().unwrap());
    }
}
