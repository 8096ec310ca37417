use serde::{Deserialize, Serialize};

use super::classifier::ClassifierError;
use super::domain::{Axis, CategoryKey, SessionState};

/// Predicate half of a threshold rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleCondition {
    AxisAtLeast { axis: Axis, min: u32 },
    BothAtLeast {
        first: Axis,
        first_min: u32,
        second: Axis,
        second_min: u32,
    },
    CombinationFlag { expected: bool },
    Always,
}

impl RuleCondition {
    pub fn matches(&self, state: &SessionState) -> bool {
        match *self {
            RuleCondition::AxisAtLeast { axis, min } => state.scores.get(axis) >= min,
            RuleCondition::BothAtLeast {
                first,
                first_min,
                second,
                second_min,
            } => state.scores.get(first) >= first_min && state.scores.get(second) >= second_min,
            RuleCondition::CombinationFlag { expected } => state.combination == expected,
            RuleCondition::Always => true,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, RuleCondition::Always)
    }

    pub fn describe(&self) -> String {
        match self {
            RuleCondition::AxisAtLeast { axis, min } => format!("{axis} >= {min}"),
            RuleCondition::BothAtLeast {
                first,
                first_min,
                second,
                second_min,
            } => format!("{first} >= {first_min} and {second} >= {second_min}"),
            RuleCondition::CombinationFlag { expected } => {
                format!("combination flag is {expected}")
            }
            RuleCondition::Always => "fallback".to_string(),
        }
    }
}

/// One entry of the ordered priority list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdRule {
    pub category: CategoryKey,
    pub condition: RuleCondition,
}

impl ThresholdRule {
    pub fn new(category: impl Into<String>, condition: RuleCondition) -> Self {
        Self {
            category: CategoryKey::new(category),
            condition,
        }
    }

    pub fn axis(category: impl Into<String>, axis: Axis, min: u32) -> Self {
        Self::new(category, RuleCondition::AxisAtLeast { axis, min })
    }

    pub fn both(
        category: impl Into<String>,
        (first, first_min): (Axis, u32),
        (second, second_min): (Axis, u32),
    ) -> Self {
        Self::new(
            category,
            RuleCondition::BothAtLeast {
                first,
                first_min,
                second,
                second_min,
            },
        )
    }

    pub fn flag(category: impl Into<String>, expected: bool) -> Self {
        Self::new(category, RuleCondition::CombinationFlag { expected })
    }

    pub fn fallback(category: impl Into<String>) -> Self {
        Self::new(category, RuleCondition::Always)
    }
}

/// Returns the category of the first rule whose condition holds.
pub fn resolve_category(
    state: &SessionState,
    rules: &[ThresholdRule],
) -> Result<CategoryKey, ClassifierError> {
    rules
        .iter()
        .find(|rule| rule.condition.matches(state))
        .map(|rule| rule.category.clone())
        .ok_or(ClassifierError::NoMatchingCategory)
}
