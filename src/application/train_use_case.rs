// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates a training run in order:
//
//   Step 1: Plan the schedule            (Layer 3 - domain)
//   Step 2: Generate synthetic volumes   (Layer 4 - data)
//   Step 3: Build the Burn dataset       (Layer 4 - data)
//   Step 4: Save config                  (Layer 6 - infra)
//   Step 5: Run the training loop        (Layer 5 - ml)

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::data::{dataset::VolumeDataset, synthetic::SyntheticSource};
use crate::domain::traits::SampleSource;
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsLogger};
use crate::ml::{
    backend::BackendKind,
    model::HourglassConfig,
    trainer::{run_training, TrainReport},
};

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything a run needs. Saved next to the checkpoint so evaluation
// can rebuild the same network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub model_dir:     String,
    pub steps:         usize,
    pub batch_size:    usize,
    pub samples:       usize,
    pub learning_rate: f64,
    pub seed:          u64,
    pub log_every:     usize,
    pub backend:       BackendKind,
    pub model:         HourglassConfig,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            model_dir:     "hourglass_util/".to_string(),
            steps:         20_000,
            batch_size:    10,
            samples:       10,
            learning_rate: 0.001,
            seed:          42,
            log_every:     100,
            backend:       BackendKind::default(),
            model:         HourglassConfig::default_schedule(),
        }
    }
}

pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<TrainReport> {
        let cfg = &self.config;

        // ── Step 1: Plan the schedule ─────────────────────────────────────────
        // Rejects bad schedules before any data or weights exist.
        let plan = cfg.model.plan()?;
        for (stage, record) in plan.records.iter().enumerate() {
            tracing::info!("Record {}: {}", stage, record);
        }

        // ── Step 2: Generate synthetic volumes ────────────────────────────────
        let source  = SyntheticSource::new(cfg.samples, cfg.model.input_extent, plan.output, cfg.seed);
        let samples = source.load_all()?;
        tracing::info!("Generated {} training samples", samples.len());

        // ── Step 3: Build Burn dataset ────────────────────────────────────────
        let dataset = VolumeDataset::new(samples);

        // ── Step 4: Save config for evaluation ────────────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.model_dir);
        ckpt_manager.save_config(cfg)?;
        let metrics = MetricsLogger::new(&cfg.model_dir)?;

        // ── Step 5: Run training loop (Layer 5) ───────────────────────────────
        run_training(cfg, dataset, &ckpt_manager, &metrics)
    }
}
