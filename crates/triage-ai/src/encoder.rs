//! Shape contract for symptom text embedding backends.

/// Maps symptom strings to fixed-length dense vectors.
///
/// The pipeline depends only on this contract, not on which model produced
/// the vectors: backends can be swapped as long as [`dim`](Self::dim) stays
/// constant or both classifiers are retrained. Implementations must be
/// deterministic at inference time — the same text always yields the same
/// vector under fixed weights.
pub trait SymptomEncoder: Send {
    /// Output dimensionality `E` of every produced row.
    fn dim(&self) -> usize;

    /// Embed a batch of texts, one row of length [`dim`](Self::dim) per input
    /// text, in input order.
    ///
    /// Texts longer than the backend's maximum token length are truncated;
    /// the information loss is accepted, not signaled.
    fn embed_batch(&mut self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>>;
}
