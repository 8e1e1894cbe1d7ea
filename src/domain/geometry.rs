// ============================================================
// Layer 3 — Volume Geometry
// ============================================================
// Plain shape types for the hourglass schedule plus the two
// kernel/layer size helpers used for manual schedule design.
//
// All extents here exclude the batch axis. A volume is laid
// out as (channels, x, y, z), matching burn's NCDHW tensors.

use serde::{Deserialize, Serialize};

/// Padding policy for a convolution stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Padding {
    /// No padding: each axis shrinks by `kernel - 1`.
    Valid,
    /// Zero padding that keeps the extent (odd kernels only).
    Same,
}

/// Activation applied after a convolution stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Relu,
    Linear,
}

/// One downsampling convolution: kernel over (x, y, z), filter count,
/// padding and activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvStage {
    pub kernel:     [usize; 3],
    pub filters:    usize,
    pub padding:    Padding,
    pub activation: Activation,
}

impl ConvStage {
    pub fn new(kernel: [usize; 3], filters: usize, padding: Padding, activation: Activation) -> Self {
        Self { kernel, filters, padding, activation }
    }
}

/// One max-pooling step: pool window over (x, y, z) and a stride
/// shared by all three axes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStage {
    pub kernel: [usize; 3],
    pub stride: usize,
}

impl PoolStage {
    pub fn new(kernel: [usize; 3], stride: usize) -> Self {
        Self { kernel, stride }
    }
}

/// Shape of a layer without its batch axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeShape {
    pub channels: usize,
    pub x:        usize,
    pub y:        usize,
    pub z:        usize,
}

impl VolumeShape {
    pub fn new(channels: usize, x: usize, y: usize, z: usize) -> Self {
        Self { channels, x, y, z }
    }

    /// Spatial extent (x, y, z).
    pub fn extent(&self) -> [usize; 3] {
        [self.x, self.y, self.z]
    }

    pub fn num_elements(&self) -> usize {
        self.channels * self.x * self.y * self.z
    }

    /// Full tensor dims for a given batch size: [batch, channels, x, y, z].
    pub fn dims(&self, batch: usize) -> [usize; 5] {
        [batch, self.channels, self.x, self.y, self.z]
    }
}

impl std::fmt::Display for VolumeShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}x{}x{}", self.channels, self.x, self.y, self.z)
    }
}

/// Kernel size that turns a `layer_in` plane into a `layer_out` plane.
///
/// Only the valid policy can derive a kernel (`in - out + 1` per axis).
/// Returns `None` when the output is larger than the input or when the
/// padding policy keeps the extent regardless of kernel size.
pub fn kernel_size(layer_in: [usize; 2], layer_out: [usize; 2], padding: Padding) -> Option<[usize; 2]> {
    match padding {
        Padding::Valid => Some([
            layer_in[0].checked_sub(layer_out[0])? + 1,
            layer_in[1].checked_sub(layer_out[1])? + 1,
        ]),
        Padding::Same => None,
    }
}

/// Extent produced by convolving `layer_in` with `kernel`.
///
/// Valid padding gives `in - kernel + 1` per axis and `None` when the
/// kernel does not fit. Same padding keeps the input extent.
pub fn layer_size(layer_in: [usize; 3], kernel: [usize; 3], padding: Padding) -> Option<[usize; 3]> {
    match padding {
        Padding::Valid => {
            let mut out = [0; 3];
            for axis in 0..3 {
                if kernel[axis] == 0 {
                    return None;
                }
                out[axis] = layer_in[axis].checked_sub(kernel[axis])? + 1;
            }
            Some(out)
        }
        Padding::Same => Some(layer_in),
    }
}

/// Extent produced by valid max pooling with a shared stride.
/// `None` when the window does not fit or the stride is zero.
pub fn pooled_size(layer_in: [usize; 3], pool: [usize; 3], stride: usize) -> Option<[usize; 3]> {
    if stride == 0 {
        return None;
    }
    let mut out = [0; 3];
    for axis in 0..3 {
        if pool[axis] == 0 {
            return None;
        }
        out[axis] = layer_in[axis].checked_sub(pool[axis])? / stride + 1;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_size_valid() {
        assert_eq!(kernel_size([200, 200], [125, 125], Padding::Valid), Some([76, 76]));
        assert_eq!(kernel_size([4, 4], [4, 4], Padding::Valid), Some([1, 1]));
    }

    #[test]
    fn test_kernel_size_rejects_growth() {
        assert_eq!(kernel_size([50, 50], [125, 125], Padding::Valid), None);
        assert_eq!(kernel_size([200, 200], [125, 125], Padding::Same), None);
    }

    #[test]
    fn test_layer_size_valid() {
        assert_eq!(layer_size([200, 200, 3], [4, 4, 3], Padding::Valid), Some([197, 197, 1]));
    }

    #[test]
    fn test_layer_size_underflow_and_same() {
        assert_eq!(layer_size([3, 3, 3], [4, 4, 3], Padding::Valid), None);
        assert_eq!(layer_size([3, 3, 3], [0, 1, 1], Padding::Valid), None);
        assert_eq!(layer_size([9, 9, 3], [3, 3, 3], Padding::Same), Some([9, 9, 3]));
    }

    #[test]
    fn test_pooled_size() {
        // The first stage of the default schedule: 197 -> 125 with a 73 window.
        assert_eq!(pooled_size([197, 197, 3], [73, 73, 1], 1), Some([125, 125, 3]));
        assert_eq!(pooled_size([10, 10, 3], [2, 2, 1], 2), Some([5, 5, 2]));
        assert_eq!(pooled_size([47, 47, 3], [73, 73, 1], 1), None);
        assert_eq!(pooled_size([47, 47, 3], [4, 4, 1], 0), None);
    }
}
