use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The four fixed score accumulators tracked through a quiz session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Axis {
    #[serde(rename = "O")]
    Oiliness,
    #[serde(rename = "D")]
    Dryness,
    #[serde(rename = "S")]
    Sensitivity,
    #[serde(rename = "Normal")]
    Normal,
}

impl Axis {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::Oiliness,
            Self::Dryness,
            Self::Sensitivity,
            Self::Normal,
        ]
    }

    /// Key used in definition documents and request payloads.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Oiliness => "O",
            Self::Dryness => "D",
            Self::Sensitivity => "S",
            Self::Normal => "Normal",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Oiliness => "Oiliness",
            Self::Dryness => "Dryness",
            Self::Sensitivity => "Sensitivity",
            Self::Normal => "Normal",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Per-axis accumulators. Only ever increased.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScoreVector {
    #[serde(rename = "O", default)]
    pub oiliness: u32,
    #[serde(rename = "D", default)]
    pub dryness: u32,
    #[serde(rename = "S", default)]
    pub sensitivity: u32,
    #[serde(rename = "Normal", default)]
    pub normal: u32,
}

impl ScoreVector {
    pub const fn get(&self, axis: Axis) -> u32 {
        match axis {
            Axis::Oiliness => self.oiliness,
            Axis::Dryness => self.dryness,
            Axis::Sensitivity => self.sensitivity,
            Axis::Normal => self.normal,
        }
    }

    fn slot_mut(&mut self, axis: Axis) -> &mut u32 {
        match axis {
            Axis::Oiliness => &mut self.oiliness,
            Axis::Dryness => &mut self.dryness,
            Axis::Sensitivity => &mut self.sensitivity,
            Axis::Normal => &mut self.normal,
        }
    }

    /// Returns a copy with every delta in `delta` added to its axis.
    pub fn with_delta(mut self, delta: &ScoreDelta) -> Self {
        for (axis, amount) in delta.iter() {
            let slot = self.slot_mut(axis);
            *slot = slot.saturating_add(amount);
        }
        self
    }

    pub fn entries(&self) -> [(Axis, u32); 4] {
        Axis::ordered().map(|axis| (axis, self.get(axis)))
    }
}

/// Partial score vector carried by an answer option. Absent axes contribute zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreDelta(BTreeMap<Axis, u32>);

impl ScoreDelta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, axis: Axis, amount: u32) -> Self {
        self.0.insert(axis, amount);
        self
    }

    pub fn get(&self, axis: Axis) -> Option<u32> {
        self.0.get(&axis).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Axis, u32)> + '_ {
        self.0.iter().map(|(axis, amount)| (*axis, *amount))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Axis, u32)> for ScoreDelta {
    fn from_iter<T: IntoIterator<Item = (Axis, u32)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A selectable answer for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub text: String,
    #[serde(default, skip_serializing_if = "ScoreDelta::is_empty")]
    pub score: ScoreDelta,
    #[serde(
        rename = "flag_combination",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub combination: Option<bool>,
}

impl AnswerOption {
    pub fn new(text: impl Into<String>, score: ScoreDelta) -> Self {
        Self {
            text: text.into(),
            score,
            combination: None,
        }
    }

    pub fn with_combination(mut self, value: bool) -> Self {
        self.combination = Some(value);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: u32,
    #[serde(rename = "question")]
    pub prompt: String,
    pub options: Vec<AnswerOption>,
}

/// Classification key such as `OILY` or `OILY_DEHYDRATED`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryKey(pub String);

impl CategoryKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Display metadata for a resolved category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultCategory {
    pub type_name: String,
    pub aura_keyword: String,
    pub color: String,
    pub description: String,
}

/// Snapshot of one session's accumulated answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub scores: ScoreVector,
    pub combination: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one selected option. The flag is overwritten only when the option carries one.
    pub fn apply_answer(&self, option: &AnswerOption) -> Self {
        Self {
            scores: self.scores.with_delta(&option.score),
            combination: option.combination.unwrap_or(self.combination),
        }
    }
}
