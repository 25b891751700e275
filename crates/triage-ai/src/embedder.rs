//! ONNX Runtime embedding pipeline for clinical BERT models.
//!
//! Produces CLS-token embeddings from a Bio_ClinicalBERT-class encoder
//! (768 dimensions). The model directory must contain `model.onnx` and
//! `tokenizer.json`.

use std::path::Path;

use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::info;

use crate::encoder::SymptomEncoder;

/// Symptom phrases are short; 64 tokens covers them with margin. Longer
/// inputs are truncated, matching the tokenization used at training time.
const MAX_TOKENS: usize = 64;

/// Symptom embedding generator using ONNX Runtime.
///
/// Loads a clinical-domain BERT encoder and produces one CLS-token vector
/// per input text — the classification convention, rather than the
/// mean-pooled similarity-search convention.
pub struct Embedder {
    session: Session,
    tokenizer: Tokenizer,
    dim: usize,
}

impl Embedder {
    /// Load an embedding model from a directory containing `model.onnx` and
    /// `tokenizer.json`.
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        anyhow::ensure!(model_path.exists(), "model.onnx not found in {model_dir:?}");
        anyhow::ensure!(
            tokenizer_path.exists(),
            "tokenizer.json not found in {model_dir:?}"
        );

        let session = Session::builder()?.commit_from_file(&model_path)?;

        // Infer hidden size from the model output shape.
        let dim = infer_dim(session.outputs()[0].dtype()).unwrap_or(768);

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("load tokenizer: {e}"))?;

        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("set truncation: {e}"))?;

        // Pad all inputs in a batch to the same length.
        tokenizer.with_padding(Some(tokenizers::PaddingParams {
            ..Default::default()
        }));

        info!(dim, model = %model_path.display(), "loaded embedding model");
        Ok(Self {
            session,
            tokenizer,
            dim,
        })
    }

    /// Embedding dimensionality (768 for Bio_ClinicalBERT).
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Embed a batch of texts, returning one CLS vector per input.
    pub fn embed_batch(&mut self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let batch_size = texts.len();

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("tokenize: {e}"))?;

        let seq_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);

        // Build flat input tensors: [batch_size, seq_len].
        let mut input_ids = vec![0i64; batch_size * seq_len];
        let mut attention_mask = vec![0i64; batch_size * seq_len];
        let mut token_type_ids = vec![0i64; batch_size * seq_len];

        for (i, encoding) in encodings.iter().enumerate() {
            let offset = i * seq_len;
            for (j, &id) in encoding.get_ids().iter().enumerate() {
                input_ids[offset + j] = id as i64;
            }
            for (j, &mask) in encoding.get_attention_mask().iter().enumerate() {
                attention_mask[offset + j] = mask as i64;
            }
            for (j, &tid) in encoding.get_type_ids().iter().enumerate() {
                token_type_ids[offset + j] = tid as i64;
            }
        }

        let shape = [batch_size as i64, seq_len as i64];

        let ids_tensor = Tensor::from_array((shape, input_ids.into_boxed_slice()))?;
        let mask_tensor = Tensor::from_array((shape, attention_mask.into_boxed_slice()))?;
        let type_tensor = Tensor::from_array((shape, token_type_ids.into_boxed_slice()))?;

        let outputs = self.session.run(ort::inputs![
            "input_ids" => ids_tensor,
            "attention_mask" => mask_tensor,
            "token_type_ids" => type_tensor,
        ])?;

        // Token embeddings: [batch_size, seq_len, dim].
        let (output_shape, output_data) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: &[i64] = output_shape;
        anyhow::ensure!(
            dims.len() == 3 && dims[0] as usize == batch_size && dims[2] as usize == self.dim,
            "unexpected output shape: {dims:?}, expected [{batch_size}, {seq_len}, {}]",
            self.dim
        );

        let actual_seq_len = dims[1] as usize;

        // CLS pooling: the first token's hidden state represents the sequence.
        let mut embeddings = Vec::with_capacity(batch_size);
        for i in 0..batch_size {
            let offset = i * actual_seq_len * self.dim;
            embeddings.push(output_data[offset..offset + self.dim].to_vec());
        }

        Ok(embeddings)
    }
}

impl SymptomEncoder for Embedder {
    fn dim(&self) -> usize {
        self.dim()
    }

    fn embed_batch(&mut self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        Embedder::embed_batch(self, texts)
    }
}

/// Try to infer the embedding dimension from the ONNX model output type.
fn infer_dim(output_type: &ort::value::ValueType) -> Option<usize> {
    match output_type {
        ort::value::ValueType::Tensor { shape, .. } => {
            // Last dimension is the hidden size.
            shape
                .last()
                .and_then(|&d| if d > 0 { Some(d as usize) } else { None })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn model_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("models")
            .join("clinical-bert")
    }

    fn require_model() -> PathBuf {
        let dir = model_dir();
        if !dir.join("model.onnx").exists() {
            panic!(
                "Model not found. Export Bio_ClinicalBERT to ONNX and place \
                 model.onnx + tokenizer.json under models/clinical-bert/"
            );
        }
        dir
    }

    #[test]
    fn load_model() {
        let dir = require_model();
        let embedder = Embedder::load(&dir).unwrap();
        assert_eq!(embedder.dim(), 768);
    }

    #[test]
    fn embed_single_text() {
        let dir = require_model();
        let mut embedder = Embedder::load(&dir).unwrap();
        let rows = embedder
            .embed_batch(&["Severe chest pain radiating to left arm"])
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), 768);
    }

    #[test]
    fn embed_batch_row_per_text() {
        let dir = require_model();
        let mut embedder = Embedder::load(&dir).unwrap();
        let texts = &[
            "High fever and persistent cough",
            "Sudden loss of consciousness",
            "Joint pain in the left knee after a fall",
        ];
        let rows = embedder.embed_batch(texts).unwrap();
        assert_eq!(rows.len(), 3);
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.len(), 768, "text {i} has wrong dimension");
        }
    }

    #[test]
    fn embedding_is_deterministic() {
        let dir = require_model();
        let mut embedder = Embedder::load(&dir).unwrap();
        let a = embedder.embed_batch(&["persistent headache"]).unwrap();
        let b = embedder.embed_batch(&["persistent headache"]).unwrap();
        assert_eq!(a, b, "same text must embed to bit-identical vectors");
    }

    #[test]
    fn embed_empty_batch() {
        let dir = require_model();
        let mut embedder = Embedder::load(&dir).unwrap();
        let rows = embedder.embed_batch(&[]).unwrap();
        assert!(rows.is_empty());
    }
}
