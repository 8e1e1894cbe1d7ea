// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores hourglass weights using Burn's CompactRecorder.
//
// What lives in the model directory:
//
//   hourglass_util/
//     model_step_20000.mpk.gz  ← parameters after the last step
//     latest_step.json         ← step number of the newest record
//     train_config.json        ← TrainConfig, including the schedule
//
// The schedule is saved separately because a record can only be
// loaded into a network with exactly the same stage layout.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::Hourglass;

/// Manages saving and loading of model checkpoints.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a new CheckpointManager.
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<String>) -> Self {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir).ok();
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save model weights after `step` optimiser steps to
    /// {dir}/model_step_{step}.mpk.gz and point latest_step.json at it.
    pub fn save_model<B: Backend>(&self, model: &Hourglass<B>, step: usize) -> Result<()> {
        // The recorder adds the extension
        let path = self.dir.join(format!("model_step_{step}"));

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| {
                format!("Failed to save checkpoint to '{}'", path.display())
            })?;

        let latest_path = self.dir.join("latest_step.json");
        fs::write(&latest_path, serde_json::to_string(&step)?)
            .with_context(|| "Failed to write latest_step.json")?;

        tracing::debug!("Saved checkpoint: step {}", step);
        Ok(())
    }

    /// Load weights from the newest record into `model`.
    /// The model must have been built from the saved schedule.
    pub fn load_model<B: Backend>(
        &self,
        model:  Hourglass<B>,
        device: &B::Device,
    ) -> Result<Hourglass<B>> {
        let step = self.latest_step()?;
        let path = self.dir.join(format!("model_step_{step}"));

        tracing::info!("Loading checkpoint from step {}", step);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display())
            })?;

        Ok(model.load_record(record))
    }

    /// Save the training configuration to JSON before training starts.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join("train_config.json");
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| {
                format!("Cannot write config to '{}'", path.display())
            })?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join("train_config.json");

        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!(
                    "Cannot read config from '{}'. \
                     Make sure you have run 'train' first.",
                    path.display()
                )
            })?;

        serde_json::from_str(&json)
            .with_context(|| format!("Malformed config in '{}'", path.display()))
    }

    fn latest_step(&self) -> Result<usize> {
        let path = self.dir.join("latest_step.json");

        let s = fs::read_to_string(&path)
            .with_context(|| {
                "Cannot find 'latest_step.json'. \
                 Have you run 'train' first?"
            })?;

        Ok(serde_json::from_str::<usize>(&s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::backend::{BackendKind, CpuBackend};
    use crate::ml::model::tests::small_config;

    #[test]
    fn test_config_survives_disk() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path().to_str().unwrap());
        let cfg = TrainConfig {
            steps:   7,
            backend: BackendKind::NdArray,
            model:   small_config(),
            ..TrainConfig::default()
        };

        ckpt.save_config(&cfg).unwrap();
        let loaded = ckpt.load_config().unwrap();
        assert_eq!(loaded.steps, 7);
        assert_eq!(loaded.backend, BackendKind::NdArray);
        assert_eq!(loaded.model.plan().unwrap(), cfg.model.plan().unwrap());
    }

    #[test]
    fn test_latest_step_points_at_newest_record() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path().to_str().unwrap());
        let model = small_config().init::<CpuBackend>(&Default::default()).unwrap();

        ckpt.save_model(&model, 2).unwrap();
        ckpt.save_model(&model, 9).unwrap();
        assert_eq!(ckpt.latest_step().unwrap(), 9);
        assert!(dir.path().join("model_step_9.mpk.gz").exists());
    }

    #[test]
    fn test_loading_before_training_fails() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path().to_str().unwrap());
        assert!(ckpt.load_config().is_err());

        let model = small_config().init::<CpuBackend>(&Default::default()).unwrap();
        assert!(ckpt.load_model(model, &Default::default()).is_err());
    }
}
