// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types for the hourglass: schedule stages, volume
// shapes, the shape plan, and labelled samples.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only structs, enums, pure functions and traits
//
// Everything here can be tested without a tensor backend.

// Schedule stages, volume shapes and the kernel/layer size helpers
pub mod geometry;

// Static shape plan for an encoder/decoder schedule
pub mod plan;

// A labelled input/output volume pair
pub mod sample;

// Core abstractions (traits) that other layers implement
pub mod traits;
