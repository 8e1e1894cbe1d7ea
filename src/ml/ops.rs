// ============================================================
// Layer 5 — Volume Tensor Ops
// ============================================================
// Burn ships 1D/2D pooling and 2D interpolation. The hourglass
// needs both over (x, y, z) volumes laid out as
// [batch, channels, x, y, z], so the ops below fold the unused
// axes into the channel axis, run the 2D (or 1D) primitive, and
// unfold again.
//
// Max pooling and nearest-neighbour resizing are both separable
// per axis, so doing (x, y) first and z second gives the same
// result as a true 3D window.

use burn::{
    nn::pool::{MaxPool1d, MaxPool2d},
    prelude::*,
    tensor::{
        module::interpolate,
        ops::{InterpolateMode, InterpolateOptions},
    },
};

/// Regroup the filter axis of a convolution output so the depth axis
/// is `depth` again.
///
/// In channel-last order every (x, y) position holds `z * filters`
/// values ordered (z, filter); they are re-read as (depth, channel).
/// `z * filters` must be a multiple of `depth`.
pub fn fold_filters_into_depth<B: Backend>(x: Tensor<B, 5>, depth: usize) -> Tensor<B, 5> {
    let [batch, filters, dx, dy, dz] = x.dims();
    let channels = filters * dz / depth;
    x.permute([0, 2, 3, 4, 1])
        .reshape([batch, dx, dy, depth, channels])
        .permute([0, 4, 1, 2, 3])
}

/// Valid max pooling over (x, y, z).
///
/// `pool_xy` carries the x/y window and stride, `pool_z` the depth
/// window and stride.
pub fn max_pool3d<B: Backend>(x: Tensor<B, 5>, pool_xy: &MaxPool2d, pool_z: &MaxPool1d) -> Tensor<B, 5> {
    let [batch, channels, dx, dy, dz] = x.dims();

    // [b, c, x, y, z] -> [b, c*z, x, y]
    let planes = x
        .permute([0, 1, 4, 2, 3])
        .reshape([batch, channels * dz, dx, dy]);
    let planes = pool_xy.forward(planes);
    let [_, _, px, py] = planes.dims();

    // [b, c*z, x', y'] -> [b, c*x'*y', z]
    let columns = planes
        .reshape([batch, channels, dz, px, py])
        .permute([0, 1, 3, 4, 2])
        .reshape([batch, channels * px * py, dz]);
    let columns = pool_z.forward(columns);
    let [_, _, pz] = columns.dims();

    columns.reshape([batch, channels, px, py, pz])
}

/// Nearest-neighbour resize of a volume to `target` (x, y, z).
pub fn upsample_nearest<B: Backend>(x: Tensor<B, 5>, target: [usize; 3]) -> Tensor<B, 5> {
    let [batch, channels, dx, dy, dz] = x.dims();
    let [tx, ty, tz] = target;

    let x = if [dx, dy] == [tx, ty] {
        x
    } else {
        let planes = x
            .permute([0, 1, 4, 2, 3])
            .reshape([batch, channels * dz, dx, dy]);
        let planes = interpolate(planes, [tx, ty], nearest());
        planes
            .reshape([batch, channels, dz, tx, ty])
            .permute([0, 1, 3, 4, 2])
    };

    if dz == tz {
        return x;
    }

    // Depth as the height of a one-pixel-wide image.
    let columns = x.reshape([batch, channels * tx * ty, dz, 1]);
    let columns = interpolate(columns, [tz, 1], nearest());
    columns.reshape([batch, channels, tx, ty, tz])
}

fn nearest() -> InterpolateOptions {
    InterpolateOptions::new(InterpolateMode::Nearest)
}
