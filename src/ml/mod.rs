// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn-specific model code lives here:
//
//   ops.rs        : 3D max pooling, nearest upsampling and the
//                   filter/depth fold, built from Burn's 1D/2D
//                   primitives
//   residual.rs   : transforms applied to skip connections
//   model.rs      : HourglassConfig and the Hourglass module
//   loss.rs       : sigmoid cross-entropy and accuracy
//   model_fn.rs   : predict / train / eval entry point
//   trainer.rs    : fixed-step SGD loop with checkpointing
//   evaluator.rs  : checkpoint reload, evaluation, prediction
//   backend.rs    : Wgpu / NdArray backend selection
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)

pub mod backend;

/// Volume-level tensor ops missing from Burn's module set
pub mod ops;

/// Skip-connection transforms
pub mod residual;

/// The hourglass encoder/decoder architecture
pub mod model;

/// Loss and accuracy
pub mod loss;

/// Three-mode model function
pub mod model_fn;

/// Fixed-step training loop
pub mod trainer;

/// Checkpoint-backed evaluation and prediction
pub mod evaluator;
