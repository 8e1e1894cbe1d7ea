// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Three subcommands: `train`, `evaluate` and `predict`.
// Each Args struct converts into an application-layer config,
// so the application layer never sees clap types.

use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::application::{evaluate_use_case::EvalConfig, train_use_case::TrainConfig};
use crate::ml::backend::BackendKind;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the hourglass on synthetic volumes
    Train(TrainArgs),

    /// Score a trained checkpoint on fresh synthetic volumes
    Evaluate(EvalArgs),

    /// Run one synthetic volume through a trained checkpoint
    Predict(PredictArgs),
}

/// Tensor backend to run on
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum BackendArg {
    #[default]
    Wgpu,
    Ndarray,
}

impl From<BackendArg> for BackendKind {
    fn from(b: BackendArg) -> Self {
        match b {
            BackendArg::Wgpu    => BackendKind::Wgpu,
            BackendArg::Ndarray => BackendKind::NdArray,
        }
    }
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory for checkpoints, config and metrics
    #[arg(long, default_value = "hourglass_util/")]
    pub model_dir: String,

    /// Number of optimiser steps
    #[arg(long, default_value_t = 20_000)]
    pub steps: usize,

    /// Samples per batch
    #[arg(long, default_value_t = 10)]
    pub batch_size: usize,

    /// Number of synthetic training volumes
    #[arg(long, default_value_t = 10)]
    pub samples: usize,

    /// Fixed SGD learning rate
    #[arg(long, default_value_t = 0.001)]
    pub lr: f64,

    /// Seed for data generation and shuffling
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Log the loss every N steps
    #[arg(long, default_value_t = 100)]
    pub log_every: usize,

    #[arg(long, value_enum, default_value_t = BackendArg::Wgpu)]
    pub backend: BackendArg,

    /// JSON schedule to use instead of the built-in 200x200x3 one
    #[arg(long)]
    pub schedule: Option<PathBuf>,
}

/// Convert TrainArgs into a TrainConfig using the built-in schedule.
/// A --schedule file is applied by the caller after loading it.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            model_dir:     a.model_dir,
            steps:         a.steps,
            batch_size:    a.batch_size,
            samples:       a.samples,
            learning_rate: a.lr,
            seed:          a.seed,
            log_every:     a.log_every,
            backend:       a.backend.into(),
            ..TrainConfig::default()
        }
    }
}

#[derive(Args, Debug)]
pub struct EvalArgs {
    #[arg(long, default_value = "hourglass_util/")]
    pub model_dir: String,

    /// Number of synthetic evaluation volumes
    #[arg(long, default_value_t = 10)]
    pub samples: usize,

    #[arg(long, default_value_t = 10)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 7)]
    pub seed: u64,

    #[arg(long, value_enum, default_value_t = BackendArg::Wgpu)]
    pub backend: BackendArg,
}

impl From<EvalArgs> for EvalConfig {
    fn from(a: EvalArgs) -> Self {
        EvalConfig {
            model_dir:  a.model_dir,
            samples:    a.samples,
            batch_size: a.batch_size,
            seed:       a.seed,
            backend:    a.backend.into(),
        }
    }
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    #[arg(long, default_value = "hourglass_util/")]
    pub model_dir: String,

    #[arg(long, default_value_t = 7)]
    pub seed: u64,

    #[arg(long, value_enum, default_value_t = BackendArg::Wgpu)]
    pub backend: BackendArg,
}

impl From<PredictArgs> for EvalConfig {
    fn from(a: PredictArgs) -> Self {
        EvalConfig {
            model_dir: a.model_dir,
            samples:   1,
            seed:      a.seed,
            backend:   a.backend.into(),
            ..EvalConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_train_defaults_match_driver() {
        let cli = Cli::parse_from(["hourglass", "train"]);
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.model_dir, "hourglass_util/");
        assert_eq!(cfg.steps, 20_000);
        assert_eq!(cfg.batch_size, 10);
        assert_eq!(cfg.samples, 10);
        assert!((cfg.learning_rate - 0.001).abs() < 1e-12);
        assert_eq!(cfg.model.plan().unwrap().output, [200, 200, 200]);
    }

    #[test]
    fn test_backend_flag() {
        let cli = Cli::parse_from(["hourglass", "evaluate", "--backend", "ndarray", "--samples", "3"]);
        let Commands::Evaluate(args) = cli.command else { panic!("expected evaluate") };
        let cfg: EvalConfig = args.into();
        assert_eq!(cfg.backend, BackendKind::NdArray);
        assert_eq!(cfg.samples, 3);
    }
}
