// ============================================================
// Layer 5 — Evaluator
// ============================================================
// Rebuilds the network from the saved schedule, loads the latest
// checkpoint record, and runs it in Eval or Predict mode on the
// inner (non-autodiff) backend.

use anyhow::{ensure, Context, Result};
use burn::{data::dataloader::DataLoaderBuilder, prelude::*, tensor::activation::sigmoid};

use crate::data::{batcher::VolumeBatcher, dataset::VolumeDataset};
use crate::domain::sample::VolumeSample;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{
    backend::{BackendKind, CpuBackend, WgpuBackend},
    model::{Hourglass, HourglassConfig},
    model_fn::{model_fn, Mode, ModelSpec},
};

/// Loss and accuracy averaged over every evaluation batch.
#[derive(Debug, Clone, Copy)]
pub struct EvalReport {
    pub loss:     f64,
    pub accuracy: f64,
    pub batches:  usize,
}

/// Shape and mean sigmoid probability of one prediction.
#[derive(Debug, Clone, Copy)]
pub struct PredictionSummary {
    pub dims:             [usize; 4],
    pub mean_probability: f64,
}

pub fn run_evaluation(
    model_cfg:    &HourglassConfig,
    backend:      BackendKind,
    dataset:      VolumeDataset,
    batch_size:   usize,
    ckpt_manager: &CheckpointManager,
) -> Result<EvalReport> {
    match backend {
        BackendKind::Wgpu => {
            let device = burn::backend::wgpu::WgpuDevice::default();
            let model = load_model::<WgpuBackend>(model_cfg, ckpt_manager, &device)?;
            evaluate(&model, dataset, batch_size, device)
        }
        BackendKind::NdArray => {
            let device = burn::backend::ndarray::NdArrayDevice::default();
            let model = load_model::<CpuBackend>(model_cfg, ckpt_manager, &device)?;
            evaluate(&model, dataset, batch_size, device)
        }
    }
}

pub fn run_prediction(
    model_cfg:    &HourglassConfig,
    backend:      BackendKind,
    sample:       &VolumeSample,
    ckpt_manager: &CheckpointManager,
) -> Result<PredictionSummary> {
    match backend {
        BackendKind::Wgpu => {
            let device = burn::backend::wgpu::WgpuDevice::default();
            let model = load_model::<WgpuBackend>(model_cfg, ckpt_manager, &device)?;
            predict(&model, sample, &device)
        }
        BackendKind::NdArray => {
            let device = burn::backend::ndarray::NdArrayDevice::default();
            let model = load_model::<CpuBackend>(model_cfg, ckpt_manager, &device)?;
            predict(&model, sample, &device)
        }
    }
}

pub fn load_model<B: Backend>(
    model_cfg:    &HourglassConfig,
    ckpt_manager: &CheckpointManager,
    device:       &B::Device,
) -> Result<Hourglass<B>> {
    let model = model_cfg.init::<B>(device)
        .context("Saved schedule no longer describes a valid hourglass")?;
    let model = ckpt_manager.load_model(model, device)?;
    tracing::info!("Model loaded from checkpoint");
    Ok(model)
}

pub fn evaluate<B: Backend>(
    model:      &Hourglass<B>,
    dataset:    VolumeDataset,
    batch_size: usize,
    device:     B::Device,
) -> Result<EvalReport> {
    ensure!(dataset.sample_count() > 0, "evaluation needs at least one sample");
    ensure!(batch_size > 0, "batch size must be at least 1");

    let loader = DataLoaderBuilder::<B, _, _>::new(VolumeBatcher::new())
        .batch_size(batch_size)
        .num_workers(1)
        .set_device(device)
        .build(dataset);

    let mut loss_sum     = 0.0f64;
    let mut accuracy_sum = 0.0f64;
    let mut batches      = 0usize;

    for batch in loader.iter() {
        if let ModelSpec::Eval { loss, accuracy, .. } =
            model_fn(model, batch.features, Some(batch.labels), Mode::Eval)?
        {
            loss_sum     += loss.into_scalar().elem::<f64>();
            accuracy_sum += accuracy;
            batches      += 1;
        }
    }

    let batches_f = batches.max(1) as f64;
    let report = EvalReport {
        loss:     loss_sum / batches_f,
        accuracy: accuracy_sum / batches_f,
        batches,
    };
    tracing::debug!("Evaluated {} batches: {:?}", batches, report);
    Ok(report)
}

pub fn predict<B: Backend>(
    model:  &Hourglass<B>,
    sample: &VolumeSample,
    device: &B::Device,
) -> Result<PredictionSummary> {
    let [x, y, z] = sample.feature_extent;
    let features = Tensor::<B, 4>::from_data(
        TensorData::new(sample.features.clone(), [1, x, y, z]),
        device,
    );

    let spec = model_fn(model, features, None, Mode::Predict)?;
    let predictions = spec.predictions().clone();
    let dims = predictions.dims();
    let mean_probability = sigmoid(predictions).mean().into_scalar().elem::<f64>();

    Ok(PredictionSummary { dims, mean_probability })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::synthetic::SyntheticSource;
    use crate::domain::traits::SampleSource;
    use crate::ml::model::tests::small_config;

    type B = CpuBackend;

    #[test]
    fn test_evaluate_averages_batches() {
        let device = Default::default();
        let model = small_config().init::<B>(&device).unwrap();
        let samples = SyntheticSource::new(3, [12, 12, 3], [12, 12, 12], 5).load_all().unwrap();

        let report = evaluate(&model, VolumeDataset::new(samples), 2, device).unwrap();
        assert_eq!(report.batches, 2);
        assert!(report.loss.is_finite());
        assert!((0.0..=1.0).contains(&report.accuracy));
    }

    #[test]
    fn test_predict_summary() {
        let device = Default::default();
        let model = small_config().init::<B>(&device).unwrap();
        let sample = SyntheticSource::new(1, [12, 12, 3], [12, 12, 12], 5).load_all().unwrap().remove(0);

        let summary = predict(&model, &sample, &device).unwrap();
        assert_eq!(summary.dims, [1, 12, 12, 12]);
        assert!((0.0..=1.0).contains(&summary.mean_probability));
    }

    #[test]
    fn test_reloaded_model_reproduces_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path().to_str().unwrap());
        let device = Default::default();
        let config = small_config();

        let trained = config.init::<B>(&device).unwrap();
        ckpt.save_model(&trained, 3).unwrap();
        let reloaded = load_model::<B>(&config, &ckpt, &device).unwrap();

        let features = Tensor::<B, 4>::ones([1, 12, 12, 3], &device);
        let a = trained.forward(features.clone());
        let b = reloaded.forward(features);
        // CompactRecorder stores half precision, so allow f16 rounding.
        let diff = (a - b).abs().max().into_scalar().elem::<f64>();
        assert!(diff < 0.05, "reloaded output drifted by {diff}");
    }
}
