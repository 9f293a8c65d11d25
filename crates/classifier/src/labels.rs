use crate::error::{ClassifierError, Result};
use std::{collections::HashSet, fs, path::Path, sync::Arc};

/// Ordered class names. Position `i` names output index `i` of the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
    labels: Arc<[String]>,
}

impl LabelSet {
    /// Builds a label set, rejecting empty sets and duplicate names.
    pub fn new<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();

        if labels.is_empty() {
            return Err(ClassifierError::Configuration(
                "label set contains no labels".to_string(),
            ));
        }

        let duplicate = {
            let mut seen = HashSet::with_capacity(labels.len());
            labels
                .iter()
                .find(|label| !seen.insert(label.as_str()))
                .cloned()
        };
        if let Some(duplicate) = duplicate {
            return Err(ClassifierError::Configuration(format!(
                "duplicate label '{}'",
                duplicate
            )));
        }

        Ok(Self {
            labels: labels.into(),
        })
    }

    /// One label per line; lines are trimmed and blank lines skipped.
    pub fn parse(contents: &str) -> Result<Self> {
        Self::new(
            contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty()),
        )
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            ClassifierError::Configuration(format!(
                "failed to read label file {}: {}",
                path.display(),
                e
            ))
        })?;

        let labels = Self::parse(&contents).map_err(|e| match e {
            ClassifierError::Configuration(msg) => {
                ClassifierError::Configuration(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;

        tracing::info!(path = %path.display(), labels = ?labels.as_slice(), "Labels loaded");
        Ok(labels)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.labels
    }
}
