// ============================================================
// Layer 5 — Backend Selection
// ============================================================
// Training runs on Autodiff<Wgpu> by default; NdArray is the
// CPU fallback when no GPU adapter is available.

use serde::{Deserialize, Serialize};

pub type WgpuBackend      = burn::backend::Wgpu;
pub type WgpuTrainBackend = burn::backend::Autodiff<WgpuBackend>;

pub type CpuBackend      = burn::backend::NdArray;
pub type CpuTrainBackend = burn::backend::Autodiff<CpuBackend>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Wgpu,
    NdArray,
}
