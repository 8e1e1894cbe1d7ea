// ============================================================
// Layer 5 — Residual Functions
// ============================================================
// The transform applied to an encoder record before it is added
// into the matching decoder stage. It must return a layer with
// the same shape it was given.

use burn::prelude::*;

/// A shape-preserving transform over a [batch, channels, x, y, z] layer.
pub trait ResidualFn<B: Backend> {
    fn apply(&self, layer: Tensor<B, 5>) -> Tensor<B, 5>;
}

/// Passes the encoder layer through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl<B: Backend> ResidualFn<B> for Identity {
    fn apply(&self, layer: Tensor<B, 5>) -> Tensor<B, 5> {
        layer
    }
}

impl<B: Backend, F> ResidualFn<B> for F
where
    F: Fn(Tensor<B, 5>) -> Tensor<B, 5>,
{
    fn apply(&self, layer: Tensor<B, 5>) -> Tensor<B, 5> {
        self(layer)
    }
}
