use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassScore {
    pub class_name: String,
    pub score: f64,
}

/// A prediction about to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewClassification {
    pub predicted_class: String,
    pub confidence: f64,
    pub image_name: Option<String>,
    pub scores: Vec<ClassScore>,
}

impl NewClassification {
    pub fn new<I>(
        predicted_class: impl Into<String>,
        confidence: f64,
        image_name: Option<String>,
        scores: I,
    ) -> Self
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        Self {
            predicted_class: predicted_class.into(),
            confidence,
            image_name,
            scores: scores
                .into_iter()
                .map(|(class_name, score)| ClassScore { class_name, score })
                .collect(),
        }
    }
}

/// A stored prediction with its per-class scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationRecord {
    pub id: u64,
    pub predicted_class: String,
    pub confidence: f64,
    pub image_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub scores: Vec<ClassScore>,
}
