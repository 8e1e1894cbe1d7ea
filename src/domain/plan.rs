// ============================================================
// Layer 3 — Hourglass Shape Plan
// ============================================================
// Threads layer geometry through the encoder and decoder before
// any tensor exists, so a bad schedule is rejected up front.
//
// Record 0 is the input volume. Stage k (1-based) runs
//
//   conv  → fold filters back into the input depth → max pool
//
// and its pooled shape becomes record k. The decoder walks the
// records from the innermost one outwards: upsample to record
// j's extent, then add record j's layer. Records are matched by
// index, so the decoder never depends on how layers were stored.

use thiserror::Error;

use crate::domain::geometry::{layer_size, pooled_size, ConvStage, Padding, PoolStage, VolumeShape};

/// Schedule problems detected while planning the hourglass.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("layer schedule has {conv} stages but pool schedule has {pool}")]
    ScheduleLength { conv: usize, pool: usize },

    #[error("hourglass needs at least one stage")]
    EmptySchedule,

    #[error("input extent {extent:?} and output filters {filters} must be non-zero")]
    EmptyInput { extent: [usize; 3], filters: usize },

    #[error("stage {stage}: kernel {kernel:?} does not fit input {input}")]
    KernelTooLarge { stage: usize, kernel: [usize; 3], input: VolumeShape },

    #[error("stage {stage}: same padding needs odd kernels, got {kernel:?}")]
    EvenSameKernel { stage: usize, kernel: [usize; 3] },

    #[error("stage {stage}: conv stage needs at least one filter")]
    NoFilters { stage: usize },

    #[error("stage {stage}: {elements} values per position cannot fold into depth {depth}")]
    DepthFold { stage: usize, elements: usize, depth: usize },

    #[error("stage {stage}: pool {pool:?} with stride {stride} reduces {input} to nothing")]
    PoolUnderflow { stage: usize, pool: [usize; 3], stride: usize, input: VolumeShape },

    #[error("decoder at record {record}: upsampled {upsampled} cannot add residual {residual}")]
    ResidualMismatch { record: usize, upsampled: VolumeShape, residual: VolumeShape },
}

/// Shapes produced by one downsampling stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagePlan {
    /// 1-based stage index; equals the index of the record it produces.
    pub index:      usize,
    pub convolved:  VolumeShape,
    pub normalized: VolumeShape,
    pub pooled:     VolumeShape,
}

/// The full shape story of an hourglass for a given schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HourglassPlan {
    /// Record 0 is the input; record k is the pooled output of stage k.
    pub records:     Vec<VolumeShape>,
    pub stages:      Vec<StagePlan>,
    pub head_kernel: [usize; 3],
    /// Output extent without the batch axis: (x, y, filters).
    pub output:      [usize; 3],
}

impl HourglassPlan {
    pub fn new(
        input_extent:   [usize; 3],
        conv_stages:    &[ConvStage],
        pool_stages:    &[PoolStage],
        output_filters: usize,
    ) -> Result<Self, ShapeError> {
        if conv_stages.len() != pool_stages.len() {
            return Err(ShapeError::ScheduleLength {
                conv: conv_stages.len(),
                pool: pool_stages.len(),
            });
        }
        if conv_stages.is_empty() {
            return Err(ShapeError::EmptySchedule);
        }
        if input_extent.contains(&0) || output_filters == 0 {
            return Err(ShapeError::EmptyInput { extent: input_extent, filters: output_filters });
        }

        let depth = input_extent[2];
        let input = VolumeShape::new(1, input_extent[0], input_extent[1], depth);
        let mut records = vec![input];
        let mut stages  = Vec::with_capacity(conv_stages.len());

        for (i, (conv, pool)) in conv_stages.iter().zip(pool_stages).enumerate() {
            let index = i + 1;
            let previous = records[i];
            let stage = plan_stage(index, previous, depth, conv, pool)?;
            records.push(stage.pooled);
            stages.push(stage);
        }

        // Decoder: innermost record upsampled into each outer record in turn.
        let mut current = records[records.len() - 1];
        for record in (0..records.len() - 1).rev() {
            let target = records[record];
            let upsampled = VolumeShape::new(current.channels, target.x, target.y, target.z);
            if upsampled != target {
                return Err(ShapeError::ResidualMismatch { record, upsampled, residual: target });
            }
            current = target;
        }

        Ok(Self {
            records,
            stages,
            head_kernel: [1, 1, depth],
            output: [input.x, input.y, output_filters],
        })
    }

    pub fn num_stages(&self) -> usize {
        self.stages.len()
    }

    pub fn input(&self) -> VolumeShape {
        self.records[0]
    }

    /// Output tensor dims for a batch: [batch, x, y, filters].
    pub fn output_dims(&self, batch: usize) -> [usize; 4] {
        [batch, self.output[0], self.output[1], self.output[2]]
    }
}

fn plan_stage(
    index:    usize,
    previous: VolumeShape,
    depth:    usize,
    conv:     &ConvStage,
    pool:     &PoolStage,
) -> Result<StagePlan, ShapeError> {
    if conv.filters == 0 {
        return Err(ShapeError::NoFilters { stage: index });
    }
    if conv.padding == Padding::Same && conv.kernel.iter().any(|k| k % 2 == 0) {
        return Err(ShapeError::EvenSameKernel { stage: index, kernel: conv.kernel });
    }

    let [cx, cy, cz] = layer_size(previous.extent(), conv.kernel, conv.padding)
        .ok_or(ShapeError::KernelTooLarge { stage: index, kernel: conv.kernel, input: previous })?;
    let convolved = VolumeShape::new(conv.filters, cx, cy, cz);

    let elements = conv.filters * cz;
    if elements % depth != 0 {
        return Err(ShapeError::DepthFold { stage: index, elements, depth });
    }
    let normalized = VolumeShape::new(elements / depth, cx, cy, depth);

    let [px, py, pz] = pooled_size(normalized.extent(), pool.kernel, pool.stride)
        .ok_or(ShapeError::PoolUnderflow {
            stage:  index,
            pool:   pool.kernel,
            stride: pool.stride,
            input:  normalized,
        })?;
    let pooled = VolumeShape::new(normalized.channels, px, py, pz);

    tracing::debug!(
        "stage {}: {} -> conv {} -> fold {} -> pool {}",
        index, previous, convolved, normalized, pooled
    );

    Ok(StagePlan { index, convolved, normalized, pooled })
}
