// ============================================================
// Layer 5 — Model Function
// ============================================================
// One entry point for the three ways the network is used:
//
//   Predict → logits only
//   Train   → logits + mean sigmoid cross-entropy
//   Eval    → logits + loss + accuracy
//
// The optimiser step lives in the trainer; this function only
// builds what each mode needs from a forward pass.

use anyhow::{anyhow, ensure, Result};
use burn::prelude::*;

use crate::ml::{
    loss::{accuracy, sigmoid_cross_entropy_with_logits},
    model::Hourglass,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Train,
    Eval,
    Predict,
}

pub enum ModelSpec<B: Backend> {
    Predict {
        predictions: Tensor<B, 4>,
    },
    Train {
        predictions: Tensor<B, 4>,
        loss:        Tensor<B, 1>,
    },
    Eval {
        predictions: Tensor<B, 4>,
        loss:        Tensor<B, 1>,
        accuracy:    f64,
    },
}

impl<B: Backend> ModelSpec<B> {
    pub fn predictions(&self) -> &Tensor<B, 4> {
        match self {
            Self::Predict { predictions }
            | Self::Train { predictions, .. }
            | Self::Eval { predictions, .. } => predictions,
        }
    }

    /// The scalar loss; predict specs carry none.
    pub fn into_loss(self) -> Result<Tensor<B, 1>> {
        match self {
            Self::Train { loss, .. } | Self::Eval { loss, .. } => Ok(loss),
            Self::Predict { .. } => Err(anyhow!("predict mode computes no loss")),
        }
    }
}

pub fn model_fn<B: Backend>(
    model:    &Hourglass<B>,
    features: Tensor<B, 4>,
    labels:   Option<Tensor<B, 4>>,
    mode:     Mode,
) -> Result<ModelSpec<B>> {
    let predictions = model.forward(features);
    if mode == Mode::Predict {
        return Ok(ModelSpec::Predict { predictions });
    }

    let labels = labels.ok_or_else(|| anyhow!("{mode:?} mode needs labels"))?;
    let expected = predictions.shape().num_elements();
    ensure!(
        labels.shape().num_elements() == expected,
        "labels {:?} cannot be reshaped to predictions {:?}",
        labels.dims(), predictions.dims()
    );
    let labels = labels.reshape(predictions.dims());
    let loss = sigmoid_cross_entropy_with_logits(predictions.clone(), labels.clone());

    Ok(match mode {
        Mode::Train => ModelSpec::Train { predictions, loss },
        _ => {
            let accuracy = accuracy(predictions.clone(), labels);
            ModelSpec::Eval { predictions, loss, accuracy }
        }
    })
}
