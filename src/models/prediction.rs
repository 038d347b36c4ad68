use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Ripeness classes the remote grader can report. The complement derivation
/// in [`PredictionResult::from_top_label`] relies on this set having exactly
/// two members; a wider label set requires the service to report the full
/// distribution instead.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum RipenessClass {
    Ripe,
    Overripe,
}

impl RipenessClass {
    pub const ALL: [RipenessClass; 2] = [RipenessClass::Ripe, RipenessClass::Overripe];

    pub fn as_str(&self) -> &'static str {
        match self {
            RipenessClass::Ripe => "Ripe",
            RipenessClass::Overripe => "Overripe",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Ripe" => Some(RipenessClass::Ripe),
            "Overripe" => Some(RipenessClass::Overripe),
            _ => None,
        }
    }

    pub fn complement(&self) -> RipenessClass {
        match self {
            RipenessClass::Ripe => RipenessClass::Overripe,
            RipenessClass::Overripe => RipenessClass::Ripe,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub class: RipenessClass,
    /// Probability the service reported for `class`, in [0, 1].
    pub confidence: f64,
    /// Probability per label, covering the whole label set.
    pub all_probs: BTreeMap<RipenessClass, f64>,
}

impl PredictionResult {
    /// Builds a result from the single top class + confidence the service
    /// reports, assigning the remaining probability mass to the other label.
    pub fn from_top_label(class: RipenessClass, confidence: f64) -> Self {
        let mut all_probs = BTreeMap::new();
        all_probs.insert(class, confidence);
        all_probs.insert(class.complement(), 1.0 - confidence);

        Self {
            class,
            confidence,
            all_probs,
        }
    }

    pub fn probability_of(&self, class: RipenessClass) -> f64 {
        self.all_probs.get(&class).copied().unwrap_or(0.0)
    }
}
