// ============================================================
// Layer 3 — Core Traits
// ============================================================
// The training driver takes its data from a SampleSource rather
// than from process-wide arrays, so the same use case can run on
// synthetic volumes today and on a real source later.

use anyhow::Result;

use crate::domain::sample::VolumeSample;

/// Anything that can produce labelled volume samples.
///
/// Implementations:
///   - SyntheticSource → uniform random volumes
pub trait SampleSource {
    /// Produce every sample this source holds.
    fn load_all(&self) -> Result<Vec<VolumeSample>>;
}
