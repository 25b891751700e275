//! Per-prediction feature attribution for tree-ensemble classifiers.
//!
//! The raw contribution output of a tree explainer arrives in one of three
//! historical layouts; [`RawContributions::for_class`] is the single
//! normalization point converting any of them into one canonical per-feature
//! slice, so the ranking logic below never sees shape differences.
//!
//! Ranking keeps only features that pushed *toward* the predicted class,
//! hides raw embedding dimensions from the human-facing explanation (they
//! still participate in the numeric decomposition), and truncates to `top_k`.

use std::cmp::Ordering;

use serde::Serialize;
use tracing::debug;

use triage_core::{FeatureSchema, FeatureVector, TriageError};

use crate::ensemble::Classifier;

/// Default number of contributors surfaced per explanation.
pub const DEFAULT_TOP_K: usize = 3;

/// Rendered when no positive named contributor survives filtering. An
/// explicit sentence, never an empty or ambiguous payload.
pub const NO_CONTRIBUTORS_SUMMARY: &str = "No significant positive contributing features.";

/// Raw contribution tensor in whichever layout the model family emitted.
#[derive(Debug, Clone)]
pub enum ContributionResult {
    /// One (samples × features) matrix per class — older multi-class
    /// convention; select the matrix at the predicted class.
    PerClassList(Vec<Vec<Vec<f32>>>),
    /// A single (samples × features) matrix — binary convention; used
    /// directly regardless of predicted class.
    Flat2D(Vec<Vec<f32>>),
    /// A (samples × features × classes) tensor — slice the last axis at the
    /// predicted class.
    Flat3D(Vec<Vec<Vec<f32>>>),
}

/// Contributions plus the per-class baseline (expected value).
///
/// For every class the additive decomposition holds:
/// `baseline + Σ contributions = raw model output`.
#[derive(Debug, Clone)]
pub struct RawContributions {
    pub result: ContributionResult,
    /// One entry per class for `PerClassList`/`Flat3D`; a single entry for
    /// the binary `Flat2D` convention.
    pub expected_value: Vec<f32>,
}

impl RawContributions {
    /// Normalize any layout into `(per-feature contributions, baseline)` for
    /// the predicted class. Sample index 0: the engine explains exactly one
    /// vector per call.
    pub fn for_class(&self, predicted_class: usize) -> Result<(Vec<f32>, f32), TriageError> {
        let malformed = |reason: String| TriageError::Artifact {
            path: "contribution result".into(),
            reason,
        };

        match &self.result {
            ContributionResult::PerClassList(per_class) => {
                let matrix = per_class.get(predicted_class).ok_or_else(|| {
                    malformed(format!(
                        "class {predicted_class} out of range for {} per-class arrays",
                        per_class.len()
                    ))
                })?;
                let row = matrix
                    .first()
                    .ok_or_else(|| malformed("empty sample dimension".into()))?;
                let baseline = *self
                    .expected_value
                    .get(predicted_class)
                    .ok_or_else(|| malformed("missing expected value for class".into()))?;
                Ok((row.clone(), baseline))
            }
            ContributionResult::Flat2D(matrix) => {
                let row = matrix
                    .first()
                    .ok_or_else(|| malformed("empty sample dimension".into()))?;
                let baseline = *self
                    .expected_value
                    .first()
                    .ok_or_else(|| malformed("missing expected value".into()))?;
                Ok((row.clone(), baseline))
            }
            ContributionResult::Flat3D(tensor) => {
                let sample = tensor
                    .first()
                    .ok_or_else(|| malformed("empty sample dimension".into()))?;
                let mut row = Vec::with_capacity(sample.len());
                for per_class in sample {
                    row.push(*per_class.get(predicted_class).ok_or_else(|| {
                        malformed(format!(
                            "class {predicted_class} out of range for {} classes",
                            per_class.len()
                        ))
                    })?);
                }
                let baseline = *self
                    .expected_value
                    .get(predicted_class)
                    .ok_or_else(|| malformed("missing expected value for class".into()))?;
                Ok((row, baseline))
            }
        }
    }
}

/// One surfaced contributor.
#[derive(Debug, Clone, Serialize)]
pub struct Attribution {
    pub feature: String,
    pub contribution: f32,
}

/// Ranked explanation for one prediction: top-k positive named contributors
/// plus the rendered sentence.
#[derive(Debug, Clone, Serialize)]
pub struct AttributionSet {
    pub contributors: Vec<Attribution>,
    pub summary: String,
}

impl AttributionSet {
    pub fn has_contributors(&self) -> bool {
        !self.contributors.is_empty()
    }
}

/// Explain one prediction of `model` on `vector`.
///
/// Fails with `AttributionUnavailable` when the model family does not
/// support exact tree attribution; a tree model with no positive
/// contributors instead yields an explicit empty-but-valid result.
pub fn explain(
    model: &dyn Classifier,
    vector: &FeatureVector,
    predicted_class: usize,
    feature_names: &[String],
    top_k: usize,
) -> Result<AttributionSet, TriageError> {
    let raw = model.contributions(vector)?;
    let (contrib, baseline) = raw.for_class(predicted_class)?;

    if contrib.len() != feature_names.len() {
        return Err(TriageError::DimensionMismatch {
            expected: feature_names.len(),
            actual: contrib.len(),
        });
    }

    debug!(
        model = model.model_id(),
        class = predicted_class,
        baseline,
        "normalized contributions"
    );

    // Descending by signed contribution; the sort is stable, so equal values
    // keep feature declaration order.
    let mut order: Vec<usize> = (0..contrib.len()).collect();
    order.sort_by(|&a, &b| {
        contrib[b]
            .partial_cmp(&contrib[a])
            .unwrap_or(Ordering::Equal)
    });

    let selected: Vec<usize> = order
        .into_iter()
        .filter(|&i| contrib[i] > 0.0)
        .filter(|&i| !FeatureSchema::is_embedding_feature(&feature_names[i]))
        .take(top_k)
        .collect();

    let summary = render_summary(&selected, vector, feature_names);
    let contributors = selected
        .into_iter()
        .map(|i| Attribution {
            feature: feature_names[i].clone(),
            contribution: contrib[i],
        })
        .collect();

    Ok(AttributionSet {
        contributors,
        summary,
    })
}

/// Render the explanation sentence, naming each contributor with its input
/// value, e.g. `Prediction influenced mainly by: Temperature (103), Age (72).`
fn render_summary(selected: &[usize], vector: &FeatureVector, feature_names: &[String]) -> String {
    if selected.is_empty() {
        return NO_CONTRIBUTORS_SUMMARY.to_string();
    }
    let parts: Vec<String> = selected
        .iter()
        .map(|&i| format!("{} ({})", feature_names[i], vector.values()[i]))
        .collect();
    format!("Prediction influenced mainly by: {}.", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_core::FeatureSchema;

    fn schema() -> FeatureSchema {
        FeatureSchema::v1(2)
    }

    fn names() -> Vec<String> {
        schema().feature_names()
    }

    fn vector() -> FeatureVector {
        FeatureVector::new(&schema(), vec![45.0, 0.0, 120.0, 75.0, 98.6, 0.0, 0.1, -0.2]).unwrap()
    }

    /// Tree-family stub returning a fixed contribution tensor.
    struct StubTreeModel {
        raw: RawContributions,
    }

    impl Classifier for StubTreeModel {
        fn model_id(&self) -> &str {
            "stub-tree"
        }
        fn schema_id(&self) -> &str {
            "triage.features.v1+e2"
        }
        fn n_classes(&self) -> usize {
            3
        }
        fn feature_count(&self) -> usize {
            8
        }
        fn labels(&self) -> &[String] {
            &[]
        }
        fn predict(&self, _: &FeatureVector) -> Result<usize, TriageError> {
            Ok(0)
        }
        fn predict_proba(&self, _: &FeatureVector) -> Result<Vec<f32>, TriageError> {
            Ok(vec![1.0, 0.0, 0.0])
        }
        fn contributions(&self, _: &FeatureVector) -> Result<RawContributions, TriageError> {
            Ok(self.raw.clone())
        }
    }

    /// Non-tree stub: inherits the default `contributions` body, which
    /// signals `AttributionUnavailable`.
    struct LinearStub;

    impl Classifier for LinearStub {
        fn model_id(&self) -> &str {
            "logistic-stub"
        }
        fn schema_id(&self) -> &str {
            "triage.features.v1+e2"
        }
        fn n_classes(&self) -> usize {
            3
        }
        fn feature_count(&self) -> usize {
            8
        }
        fn labels(&self) -> &[String] {
            &[]
        }
        fn predict(&self, _: &FeatureVector) -> Result<usize, TriageError> {
            Ok(1)
        }
        fn predict_proba(&self, _: &FeatureVector) -> Result<Vec<f32>, TriageError> {
            Ok(vec![0.2, 0.6, 0.2])
        }
    }

    fn per_class_stub(row: Vec<f32>) -> StubTreeModel {
        StubTreeModel {
            raw: RawContributions {
                result: ContributionResult::PerClassList(vec![
                    vec![row],
                    vec![vec![0.0; 8]],
                    vec![vec![0.0; 8]],
                ]),
                expected_value: vec![0.5, 0.3, 0.2],
            },
        }
    }

    #[test]
    fn ranks_descending_positive_only() {
        // Age 0.2, Blood_Pressure 0.5, Heart_Rate -0.4, Temperature 0.1.
        let model = per_class_stub(vec![0.2, 0.0, 0.5, -0.4, 0.1, 0.0, 0.0, 0.0]);
        let set = explain(&model, &vector(), 0, &names(), 5).unwrap();

        let got: Vec<&str> = set.contributors.iter().map(|a| a.feature.as_str()).collect();
        assert_eq!(got, vec!["Blood_Pressure", "Age", "Temperature"]);
        for pair in set.contributors.windows(2) {
            assert!(pair[0].contribution >= pair[1].contribution);
        }
        assert!(set.contributors.iter().all(|a| a.contribution > 0.0));
    }

    #[test]
    fn truncates_to_top_k() {
        let model = per_class_stub(vec![0.6, 0.5, 0.4, 0.3, 0.2, 0.1, 0.0, 0.0]);
        let set = explain(&model, &vector(), 0, &names(), 3).unwrap();
        assert_eq!(set.contributors.len(), 3);
        let got: Vec<&str> = set.contributors.iter().map(|a| a.feature.as_str()).collect();
        assert_eq!(got, vec!["Age", "Gender", "Blood_Pressure"]);
    }

    #[test]
    fn ties_break_by_declaration_order() {
        let model = per_class_stub(vec![0.3, 0.3, 0.3, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let set = explain(&model, &vector(), 0, &names(), 5).unwrap();
        let got: Vec<&str> = set.contributors.iter().map(|a| a.feature.as_str()).collect();
        assert_eq!(got, vec!["Age", "Gender", "Blood_Pressure"]);
    }

    #[test]
    fn embedding_dimensions_never_surface() {
        // The largest contributor is an embedding dimension.
        let model = per_class_stub(vec![0.2, 0.0, 0.0, 0.0, 0.0, 0.0, 0.9, 0.5]);
        let set = explain(&model, &vector(), 0, &names(), 5).unwrap();

        let got: Vec<&str> = set.contributors.iter().map(|a| a.feature.as_str()).collect();
        assert_eq!(got, vec!["Age"]);
        assert!(!set.summary.contains("symptom_emb"));
    }

    #[test]
    fn no_positive_contributors_is_explicit() {
        let model = per_class_stub(vec![-0.2, 0.0, -0.1, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let set = explain(&model, &vector(), 0, &names(), 3).unwrap();
        assert!(!set.has_contributors());
        assert_eq!(set.summary, NO_CONTRIBUTORS_SUMMARY);
    }

    #[test]
    fn only_embedding_contributors_is_also_explicit() {
        let model = per_class_stub(vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.9, 0.5]);
        let set = explain(&model, &vector(), 0, &names(), 3).unwrap();
        assert!(!set.has_contributors());
        assert_eq!(set.summary, NO_CONTRIBUTORS_SUMMARY);
    }

    #[test]
    fn summary_names_features_with_input_values() {
        let model = per_class_stub(vec![0.0, 0.0, 0.4, 0.0, 0.2, 0.0, 0.0, 0.0]);
        let set = explain(&model, &vector(), 0, &names(), 3).unwrap();
        assert_eq!(
            set.summary,
            "Prediction influenced mainly by: Blood_Pressure (120), Temperature (98.6)."
        );
    }

    #[test]
    fn non_tree_model_is_rejected_distinctly() {
        let err = explain(&LinearStub, &vector(), 1, &names(), 3).unwrap_err();
        assert_eq!(err.kind(), "attribution_unavailable");
        assert!(err.to_string().contains("logistic-stub"));
    }

    #[test]
    fn per_class_list_selects_predicted_class() {
        let raw = RawContributions {
            result: ContributionResult::PerClassList(vec![
                vec![vec![1.0, 0.0]],
                vec![vec![0.0, 2.0]],
            ]),
            expected_value: vec![0.1, 0.2],
        };
        assert_eq!(raw.for_class(0).unwrap(), (vec![1.0, 0.0], 0.1));
        assert_eq!(raw.for_class(1).unwrap(), (vec![0.0, 2.0], 0.2));
        assert!(raw.for_class(2).is_err());
    }

    #[test]
    fn flat2d_is_used_directly_for_either_class() {
        let raw = RawContributions {
            result: ContributionResult::Flat2D(vec![vec![0.3, -0.1]]),
            expected_value: vec![0.4],
        };
        assert_eq!(raw.for_class(0).unwrap(), (vec![0.3, -0.1], 0.4));
        assert_eq!(raw.for_class(1).unwrap(), (vec![0.3, -0.1], 0.4));
    }

    #[test]
    fn flat3d_slices_last_axis() {
        // 1 sample × 2 features × 3 classes.
        let raw = RawContributions {
            result: ContributionResult::Flat3D(vec![vec![
                vec![0.1, 0.2, 0.3],
                vec![0.4, 0.5, 0.6],
            ]]),
            expected_value: vec![1.0, 2.0, 3.0],
        };
        assert_eq!(raw.for_class(1).unwrap(), (vec![0.2, 0.5], 2.0));
        assert_eq!(raw.for_class(2).unwrap(), (vec![0.3, 0.6], 3.0));
    }

    #[test]
    fn contribution_length_must_match_feature_names() {
        let model = StubTreeModel {
            raw: RawContributions {
                result: ContributionResult::Flat2D(vec![vec![0.1, 0.2]]),
                expected_value: vec![0.0],
            },
        };
        let err = explain(&model, &vector(), 0, &names(), 3).unwrap_err();
        assert_eq!(err.kind(), "dimension_mismatch");
    }
}
