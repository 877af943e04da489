// ============================================================
// Layer 3 — Labelled Example Types
// ============================================================
// The two kinds of raw training examples the pipeline consumes:
//
//   LabeledTextExample    — a symptom description with a triage label
//   LabeledTabularExample — one survey row with a treatment target
//
// Both are immutable once loaded. They are read from disk,
// vectorised once per training run and then dropped.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ─── TriageLabel ─────────────────────────────────────────────────────────────
/// Severity class of a symptom description.
///
/// The declaration order is the class order persisted in the
/// metadata (`["Urgent","Routine","Monitor"]`), so `index()` is
/// the label id the model is trained against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriageLabel {
    Urgent,
    Routine,
    Monitor,
}

impl TriageLabel {
    /// All labels in class-index order
    pub const ALL: [TriageLabel; 3] = [Self::Urgent, Self::Routine, Self::Monitor];

    /// Class index used as the training target
    pub fn index(self) -> usize {
        match self {
            Self::Urgent  => 0,
            Self::Routine => 1,
            Self::Monitor => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Urgent  => "Urgent",
            Self::Routine => "Routine",
            Self::Monitor => "Monitor",
        }
    }

    /// Parse the literal label used in the JSON dataset.
    /// Matching is exact — the dataset contract uses capitalised names.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.as_str() == raw)
    }

    /// Class names in index order, as written to metadata.json
    pub fn class_names() -> Vec<String> {
        Self::ALL.iter().map(|l| l.as_str().to_string()).collect()
    }
}

impl fmt::Display for TriageLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── LabeledTextExample ──────────────────────────────────────────────────────
/// One element of the triage dataset: `{"text": "...", "label": "Urgent"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledTextExample {
    pub text:  String,
    pub label: TriageLabel,
}

impl LabeledTextExample {
    pub fn new(text: impl Into<String>, label: TriageLabel) -> Self {
        Self { text: text.into(), label }
    }
}

// ─── LabeledTabularExample ───────────────────────────────────────────────────
/// One survey response after CSV parsing.
///
/// `features` keeps every column of the row keyed by header name,
/// including columns the pipeline does not use. Empty cells are kept
/// as empty strings; the encoder turns them into the `"NA"` sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledTabularExample {
    pub features: HashMap<String, String>,
    pub target:   bool,
}

impl LabeledTabularExample {
    pub fn new(features: HashMap<String, String>, target: bool) -> Self {
        Self { features, target }
    }

    /// Raw cell value for a column, `None` when the column is absent
    pub fn feature(&self, name: &str) -> Option<&str> {
        self.features.get(name).map(String::as_str)
    }

    /// Binary class index: 1 for a positive treatment answer, else 0
    pub fn target_index(&self) -> usize {
        usize::from(self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_indices_follow_class_order() {
        let names = TriageLabel::class_names();
        assert_eq!(names, vec!["Urgent", "Routine", "Monitor"]);
        for label in TriageLabel::ALL {
            assert_eq!(names[label.index()], label.as_str());
        }
    }

    #[test]
    fn test_parse_is_exact() {
        assert_eq!(TriageLabel::parse("Monitor"), Some(TriageLabel::Monitor));
        assert_eq!(TriageLabel::parse("monitor"), None);
        assert_eq!(TriageLabel::parse(""), None);
    }

    #[test]
    fn test_text_example_json_shape() {
        let ex: LabeledTextExample =
            serde_json::from_str(r#"{"text":"sharp chest pain","label":"Urgent"}"#).unwrap();
        assert_eq!(ex, LabeledTextExample::new("sharp chest pain", TriageLabel::Urgent));
    }
}
