// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Filesystem concerns shared by the use cases:
//
//   checkpoint.rs     : model records (CompactRecorder) plus the
//                       TrainConfig JSON needed to rebuild the model
//   metrics.rs        : per-step loss CSV
//   schedule_store.rs : hand-written schedules loaded from JSON
//
// Reference: Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;

/// JSON schedule loading
pub mod schedule_store;
