// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from a sample source to tensor batches:
//
//   SyntheticSource   → uniform random volumes (SampleSource)
//       │
//       ▼
//   VolumeDataset     → implements Burn's Dataset trait
//       │
//       ▼
//   VolumeBatcher     → stacks samples into tensor batches
//       │
//       ▼
//   DataLoader        → feeds batches to the training loop
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Seeded uniform-noise volumes
pub mod synthetic;

/// Implements Burn's Dataset trait for volume samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
