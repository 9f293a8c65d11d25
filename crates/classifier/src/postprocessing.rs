use crate::engine::RawScores;
use crate::error::{ClassifierError, Result};
use crate::labels::LabelSet;
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{MapAccess, Visitor},
    ser::SerializeMap,
};
use std::fmt;

/// Outcome of one classification. Serializes as
/// `{"predictedClass": .., "confidence": .., "allScores": {label: score, ..}}`
/// with `allScores` in label order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    predicted_class: String,
    confidence: f64,
    all_scores: ClassScores,
}

impl PredictionResult {
    pub fn predicted_class(&self) -> &str {
        &self.predicted_class
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// `(label, score)` pairs in label order.
    pub fn all_scores(&self) -> &[(String, f64)] {
        &self.all_scores.0
    }

    pub fn score(&self, label: &str) -> Option<f64> {
        self.all_scores
            .0
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, score)| *score)
    }
}

/// Ordered label → score mapping, (de)serialized as a JSON object.
#[derive(Debug, Clone, PartialEq)]
struct ClassScores(Vec<(String, f64)>);

impl Serialize for ClassScores {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, score) in &self.0 {
            map.serialize_entry(label, score)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ClassScores {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ClassScoresVisitor;

        impl<'de> Visitor<'de> for ClassScoresVisitor {
            type Value = ClassScores;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of class name to score")
            }

            fn visit_map<M: MapAccess<'de>>(
                self,
                mut access: M,
            ) -> std::result::Result<Self::Value, M::Error> {
                let mut scores = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(entry) = access.next_entry::<String, f64>()? {
                    scores.push(entry);
                }
                Ok(ClassScores(scores))
            }
        }

        deserializer.deserialize_map(ClassScoresVisitor)
    }
}

/// First index holding the maximum (left-to-right scan, ties keep the lowest index).
pub fn argmax(scores: &[f32]) -> Option<(usize, f32)> {
    let (&first, rest) = scores.split_first()?;

    Some(
        rest.iter()
            .enumerate()
            .fold((0, first), |(best_idx, best), (i, &score)| {
                if score > best {
                    (i + 1, score)
                } else {
                    (best_idx, best)
                }
            }),
    )
}

/// Pairs raw scores with labels and picks the top class. Scores are passed
/// through untouched (no softmax).
pub fn assemble(scores: &RawScores, labels: &LabelSet) -> Result<PredictionResult> {
    let scores = scores.as_slice();

    if scores.len() != labels.len() {
        return Err(ClassifierError::Inference(format!(
            "model produced {} scores for {} labels",
            scores.len(),
            labels.len()
        )));
    }

    let (best_idx, best) = argmax(scores)
        .ok_or_else(|| ClassifierError::Inference("model produced no scores".to_string()))?;

    let predicted_class = labels
        .get(best_idx)
        .ok_or_else(|| ClassifierError::Inference(format!("no label for index {}", best_idx)))?
        .to_string();

    let all_scores = labels
        .iter()
        .zip(scores)
        .map(|(label, &score)| (label.to_string(), f64::from(score)))
        .collect();

    Ok(PredictionResult {
        predicted_class,
        confidence: f64::from(best),
        all_scores: ClassScores(all_scores),
    })
}
