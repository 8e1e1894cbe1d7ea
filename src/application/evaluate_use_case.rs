// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Reloads a trained hourglass from its model directory and
// scores it on fresh synthetic volumes (evaluate) or runs a
// single volume through it (predict).

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::application::train_use_case::TrainConfig;
use crate::data::{dataset::VolumeDataset, synthetic::SyntheticSource};
use crate::domain::traits::SampleSource;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{
    backend::BackendKind,
    evaluator::{run_evaluation, run_prediction, EvalReport, PredictionSummary},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalConfig {
    pub model_dir:  String,
    pub samples:    usize,
    pub batch_size: usize,
    pub seed:       u64,
    pub backend:    BackendKind,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            model_dir:  "hourglass_util/".to_string(),
            samples:    10,
            batch_size: 10,
            seed:       7,
            backend:    BackendKind::default(),
        }
    }
}

pub struct EvaluateUseCase {
    config:       EvalConfig,
    trained:      TrainConfig,
    ckpt_manager: CheckpointManager,
}

impl EvaluateUseCase {
    /// Reads the saved TrainConfig; fails if `train` has not run.
    pub fn new(config: EvalConfig) -> Result<Self> {
        let ckpt_manager = CheckpointManager::new(&config.model_dir);
        let trained = ckpt_manager.load_config()?;
        Ok(Self { config, trained, ckpt_manager })
    }

    pub fn evaluate(&self) -> Result<EvalReport> {
        let samples = self.source(self.config.samples)?.load_all()?;
        tracing::info!("Evaluating on {} synthetic samples", samples.len());
        run_evaluation(
            &self.trained.model,
            self.config.backend,
            VolumeDataset::new(samples),
            self.config.batch_size,
            &self.ckpt_manager,
        )
    }

    pub fn predict(&self) -> Result<PredictionSummary> {
        let mut samples = self.source(1)?.load_all()?;
        let sample = samples.remove(0);
        run_prediction(&self.trained.model, self.config.backend, &sample, &self.ckpt_manager)
    }

    fn source(&self, count: usize) -> Result<SyntheticSource> {
        let plan = self.trained.model.plan()?;
        Ok(SyntheticSource::new(count, self.trained.model.input_extent, plan.output, self.config.seed))
    }
}
