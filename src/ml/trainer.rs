// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Fixed-step SGD over a shuffled, endlessly repeated dataset:
//
//   loop until `steps` optimiser updates have run:
//     for batch in loader:
//       forward → sigmoid cross-entropy → backward → SGD step
//
// The loss of every step is appended to metrics.csv and the
// final parameters are written as one checkpoint record.

use anyhow::{ensure, Result};
use burn::{
    data::dataloader::DataLoaderBuilder,
    optim::{GradientsParams, Optimizer, SgdConfig},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::VolumeBatcher, dataset::VolumeDataset};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{MetricsLogger, StepMetrics},
};
use crate::ml::{
    backend::{BackendKind, CpuTrainBackend, WgpuTrainBackend},
    model::Hourglass,
    model_fn::{model_fn, Mode},
};

/// What a finished training run produced.
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub steps:  usize,
    /// Loss of every optimiser step, in order.
    pub losses: Vec<f64>,
}

impl TrainReport {
    pub fn final_loss(&self) -> Option<f64> {
        self.losses.last().copied()
    }
}

pub fn run_training(
    cfg:          &TrainConfig,
    dataset:      VolumeDataset,
    ckpt_manager: &CheckpointManager,
    metrics:      &MetricsLogger,
) -> Result<TrainReport> {
    match cfg.backend {
        BackendKind::Wgpu => {
            let device = burn::backend::wgpu::WgpuDevice::default();
            tracing::info!("Using WGPU device: {:?}", device);
            train_loop::<WgpuTrainBackend>(cfg, dataset, ckpt_manager, metrics, device)
        }
        BackendKind::NdArray => {
            let device = burn::backend::ndarray::NdArrayDevice::default();
            tracing::info!("Using NdArray device: {:?}", device);
            train_loop::<CpuTrainBackend>(cfg, dataset, ckpt_manager, metrics, device)
        }
    }
}

pub fn train_loop<B: AutodiffBackend>(
    cfg:          &TrainConfig,
    dataset:      VolumeDataset,
    ckpt_manager: &CheckpointManager,
    metrics:      &MetricsLogger,
    device:       B::Device,
) -> Result<TrainReport> {
    ensure!(dataset.sample_count() > 0, "training needs at least one sample");
    ensure!(cfg.batch_size > 0, "batch size must be at least 1");

    // ── Build model ───────────────────────────────────────────────────────────
    let mut model: Hourglass<B> = cfg.model.init(&device)?;
    tracing::info!(
        "Model ready: {} stages, output {:?}",
        model.num_stages(),
        cfg.model.plan()?.output
    );

    // ── Plain SGD at a fixed learning rate ────────────────────────────────────
    let mut optim = SgdConfig::new().init();

    let loader = DataLoaderBuilder::<B, _, _>::new(VolumeBatcher::new())
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(1)
        .set_device(device.clone())
        .build(dataset);

    let log_every = cfg.log_every.max(1);
    let mut losses = Vec::with_capacity(cfg.steps);

    // ── Step loop: the loader is restarted whenever it runs dry ───────────────
    'training: while losses.len() < cfg.steps {
        for batch in loader.iter() {
            let spec = model_fn(&model, batch.features, Some(batch.labels), Mode::Train)?;
            let loss = spec.into_loss()?;

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            if !loss_val.is_finite() {
                tracing::warn!("Non-finite loss {} at step {}", loss_val, losses.len() + 1);
            }

            // Backward pass + SGD update
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.learning_rate, model, grads);

            losses.push(loss_val);
            let step = losses.len();
            metrics.log(&StepMetrics::new(step, loss_val))?;

            if step % log_every == 0 || step == cfg.steps {
                tracing::info!("Step {:>6}/{} | loss={:.6}", step, cfg.steps, loss_val);
            }
            if step >= cfg.steps {
                break 'training;
            }
        }
    }

    let steps = losses.len();
    ckpt_manager.save_model(&model, steps)?;
    tracing::info!("Checkpoint saved for step {}", steps);

    Ok(TrainReport { steps, losses })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::synthetic::SyntheticSource;
    use crate::domain::traits::SampleSource;
    use crate::ml::model::tests::small_config;

    fn small_train_config(dir: &str, steps: usize) -> TrainConfig {
        TrainConfig {
            model_dir:  dir.to_string(),
            steps,
            batch_size: 2,
            samples:    3,
            backend:    BackendKind::NdArray,
            model:      small_config(),
            ..TrainConfig::default()
        }
    }

    fn small_dataset(cfg: &TrainConfig) -> VolumeDataset {
        let source = SyntheticSource::new(cfg.samples, [12, 12, 3], [12, 12, 12], cfg.seed);
        VolumeDataset::new(source.load_all().unwrap())
    }

    #[test]
    fn test_five_steps_give_finite_losses() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = small_train_config(dir.path().to_str().unwrap(), 5);
        let ckpt = CheckpointManager::new(&cfg.model_dir);
        let metrics = MetricsLogger::new(&cfg.model_dir).unwrap();

        let report = run_training(&cfg, small_dataset(&cfg), &ckpt, &metrics).unwrap();

        // Three samples at batch size two: the loader wraps around twice.
        assert_eq!(report.steps, 5);
        assert_eq!(report.losses.len(), 5);
        assert!(report.losses.iter().all(|l| l.is_finite()));
        assert!(dir.path().join("model_step_5.mpk.gz").exists());

        let csv = std::fs::read_to_string(metrics.csv_path()).unwrap();
        assert_eq!(csv.lines().count(), 6);
    }

    #[test]
    fn test_empty_dataset_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = small_train_config(dir.path().to_str().unwrap(), 1);
        let ckpt = CheckpointManager::new(&cfg.model_dir);
        let metrics = MetricsLogger::new(&cfg.model_dir).unwrap();

        let result = run_training(&cfg, VolumeDataset::new(Vec::new()), &ckpt, &metrics);
        assert!(result.is_err());
    }
}
