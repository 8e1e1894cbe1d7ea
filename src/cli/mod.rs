// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and routes to the use cases.
// Printing results is the only work done here.

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvalArgs, PredictArgs, TrainArgs};

use crate::application::{
    evaluate_use_case::EvaluateUseCase,
    train_use_case::{TrainConfig, TrainUseCase},
};
use crate::infra::schedule_store::load_schedule;

#[derive(Parser, Debug)]
#[command(
    name = "hourglass",
    version = "0.1.0",
    about = "Train a 3D convolutional hourglass network on voxel volumes."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
            Commands::Predict(args)  => run_predict(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    tracing::info!("Starting training into: {}", args.model_dir);

    let schedule = args.schedule.clone();
    let mut config: TrainConfig = args.into();
    if let Some(path) = schedule {
        config.model = load_schedule(path)?;
    }

    let report = TrainUseCase::new(config).execute()?;
    match report.final_loss() {
        Some(loss) => println!("Training complete after {} steps. Final loss: {:.6}", report.steps, loss),
        None       => println!("Training complete. No steps were run."),
    }
    Ok(())
}

fn run_evaluate(args: EvalArgs) -> Result<()> {
    let report = EvaluateUseCase::new(args.into())?.evaluate()?;
    println!(
        "loss={:.6} | accuracy={:.2}% | batches={}",
        report.loss, report.accuracy * 100.0, report.batches
    );
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    let summary = EvaluateUseCase::new(args.into())?.predict()?;
    println!(
        "prediction shape={:?} | mean probability={:.6}",
        summary.dims, summary.mean_probability
    );
    Ok(())
}
