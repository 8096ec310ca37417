use std::collections::{BTreeMap, HashSet};
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use super::domain::{AnswerOption, Axis, CategoryKey, Question, ResultCategory, ScoreDelta};
use super::rules::{RuleCondition, ThresholdRule};

/// Validated quiz content: questions, ordered threshold rules, and result metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizDefinition {
    questions: Vec<Question>,
    rules: Vec<ThresholdRule>,
    results: BTreeMap<CategoryKey, ResultCategory>,
}

impl QuizDefinition {
    pub fn new(
        questions: Vec<Question>,
        rules: Vec<ThresholdRule>,
        results: BTreeMap<CategoryKey, ResultCategory>,
    ) -> Result<Self, DefinitionError> {
        let definition = Self {
            questions,
            rules,
            results,
        };
        definition.validate()?;
        Ok(definition)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DefinitionError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DefinitionError> {
        let document: DefinitionDocument = serde_json::from_reader(reader)?;
        document.into_definition()
    }

    pub fn from_json_str(raw: &str) -> Result<Self, DefinitionError> {
        let document: DefinitionDocument = serde_json::from_str(raw)?;
        document.into_definition()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn rules(&self) -> &[ThresholdRule] {
        &self.rules
    }

    pub fn result(&self, category: &CategoryKey) -> Option<&ResultCategory> {
        self.results.get(category)
    }

    pub fn results(&self) -> &BTreeMap<CategoryKey, ResultCategory> {
        &self.results
    }

    /// Renders the definition back into the document layout accepted by [`Self::from_reader`].
    pub fn to_document(&self) -> Value {
        let mut thresholds = serde_json::Map::new();
        for rule in &self.rules {
            let entry = match rule.condition {
                RuleCondition::AxisAtLeast { axis, min } => {
                    serde_json::json!({ "variable": axis, "min": min })
                }
                RuleCondition::BothAtLeast {
                    first,
                    first_min,
                    second,
                    second_min,
                } => serde_json::json!({
                    "variable_1": first,
                    "min_1": first_min,
                    "variable_2": second,
                    "min_2": second_min,
                }),
                RuleCondition::CombinationFlag { expected } => {
                    serde_json::json!({ "flag_check": true, "value": expected })
                }
                RuleCondition::Always => continue,
            };
            thresholds.insert(rule.category.0.clone(), entry);
        }

        serde_json::json!({
            "questions": self.questions,
            "logic_rules": {
                "priority_order": self.rules.iter().map(|rule| &rule.category).collect::<Vec<_>>(),
                "thresholds": thresholds,
            },
            "results_mapping": self.results,
        })
    }

    fn validate(&self) -> Result<(), DefinitionError> {
        if self.questions.is_empty() {
            return Err(DefinitionError::NoQuestions);
        }
        if let Some(question) = self.questions.iter().find(|q| q.options.is_empty()) {
            return Err(DefinitionError::QuestionWithoutOptions { id: question.id });
        }

        if self.rules.is_empty() {
            return Err(DefinitionError::EmptyPriorityOrder);
        }

        let mut seen = HashSet::new();
        for rule in &self.rules {
            if !seen.insert(&rule.category) {
                return Err(DefinitionError::DuplicateCategory(rule.category.clone()));
            }
            if !self.results.contains_key(&rule.category) {
                return Err(DefinitionError::UnmappedCategory(rule.category.clone()));
            }
        }

        let last = self.rules.len() - 1;
        match self
            .rules
            .iter()
            .position(|rule| rule.condition.is_fallback())
        {
            None => Err(DefinitionError::MissingFallback),
            Some(index) if index != last => Err(DefinitionError::FallbackNotLast(
                self.rules[index].category.clone(),
            )),
            Some(_) => Ok(()),
        }
    }

    /// Built-in ten question quiz.
    pub fn standard() -> Self {
        Self {
            questions: standard_questions(),
            rules: standard_rules(),
            results: standard_results(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DefinitionError {
    #[error("failed to read quiz definition: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid quiz definition document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("quiz definition contains no questions")]
    NoQuestions,
    #[error("question {id} has no answer options")]
    QuestionWithoutOptions { id: u32 },
    #[error("priority order is empty")]
    EmptyPriorityOrder,
    #[error("category {0} appears more than once in the priority order")]
    DuplicateCategory(CategoryKey),
    #[error("category {0} has no entry in the results mapping")]
    UnmappedCategory(CategoryKey),
    #[error("threshold for {0} is not referenced by the priority order")]
    OrphanThreshold(CategoryKey),
    #[error("threshold for {key} is malformed: {reason}")]
    MalformedThreshold { key: CategoryKey, reason: String },
    #[error("priority order has no fallback category")]
    MissingFallback,
    #[error("fallback category {0} must be the last entry of the priority order")]
    FallbackNotLast(CategoryKey),
}

#[derive(Debug, Deserialize)]
struct DefinitionDocument {
    questions: Vec<Question>,
    logic_rules: LogicRules,
    results_mapping: BTreeMap<CategoryKey, ResultCategory>,
}

#[derive(Debug, Deserialize)]
struct LogicRules {
    priority_order: Vec<CategoryKey>,
    #[serde(default)]
    thresholds: BTreeMap<CategoryKey, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ThresholdEntry {
    Dual {
        variable_1: Axis,
        min_1: u32,
        variable_2: Axis,
        min_2: u32,
    },
    Single {
        variable: Axis,
        min: u32,
    },
    Flag {
        flag_check: bool,
        value: bool,
    },
}

impl DefinitionDocument {
    fn into_definition(self) -> Result<QuizDefinition, DefinitionError> {
        let DefinitionDocument {
            questions,
            logic_rules,
            results_mapping,
        } = self;
        let LogicRules {
            priority_order,
            mut thresholds,
        } = logic_rules;

        let mut rules = Vec::with_capacity(priority_order.len());
        for key in priority_order {
            let condition = match thresholds.remove(&key) {
                Some(raw) => threshold_condition(&key, raw)?,
                None => RuleCondition::Always,
            };
            rules.push(ThresholdRule {
                category: key,
                condition,
            });
        }

        if let Some(orphan) = thresholds.into_keys().next() {
            return Err(DefinitionError::OrphanThreshold(orphan));
        }

        QuizDefinition::new(questions, rules, results_mapping)
    }
}

fn threshold_condition(key: &CategoryKey, raw: Value) -> Result<RuleCondition, DefinitionError> {
    let entry: ThresholdEntry =
        serde_json::from_value(raw).map_err(|err| DefinitionError::MalformedThreshold {
            key: key.clone(),
            reason: err.to_string(),
        })?;

    match entry {
        ThresholdEntry::Dual {
            variable_1,
            min_1,
            variable_2,
            min_2,
        } => Ok(RuleCondition::BothAtLeast {
            first: variable_1,
            first_min: min_1,
            second: variable_2,
            second_min: min_2,
        }),
        ThresholdEntry::Single { variable, min } => Ok(RuleCondition::AxisAtLeast {
            axis: variable,
            min,
        }),
        ThresholdEntry::Flag {
            flag_check: true,
            value,
        } => Ok(RuleCondition::CombinationFlag { expected: value }),
        ThresholdEntry::Flag {
            flag_check: false, ..
        } => Err(DefinitionError::MalformedThreshold {
            key: key.clone(),
            reason: "flag_check is false, rule could never match".to_string(),
        }),
    }
}

fn option(text: &str, deltas: &[(Axis, u32)]) -> AnswerOption {
    AnswerOption::new(text, deltas.iter().copied().collect::<ScoreDelta>())
}

fn question(id: u32, prompt: &str, options: Vec<AnswerOption>) -> Question {
    Question {
        id,
        prompt: prompt.to_string(),
        options,
    }
}

fn standard_questions() -> Vec<Question> {
    use Axis::{Dryness as D, Normal as N, Oiliness as O, Sensitivity as S};

    vec![
        question(
            1,
            "An hour after washing your face with nothing applied, how does it feel?",
            vec![
                option("Tight and dry all over", &[(D, 2)]),
                option("Shiny in the T-zone, tight on the cheeks", &[(O, 1), (D, 1)])
                    .with_combination(true),
                option("Oily all over", &[(O, 2)]),
                option("Comfortable, nothing stands out", &[(N, 2)]),
            ],
        ),
        question(
            2,
            "How does your face look by midday?",
            vec![
                option("Shiny everywhere", &[(O, 2)]),
                option("Shiny only on the forehead and nose", &[(O, 1)]).with_combination(true),
                option("Dull or flaky", &[(D, 2)]),
                option("Much the same as in the morning", &[(N, 1)]),
            ],
        ),
        question(
            3,
            "How often do you get breakouts?",
            vec![
                option("Frequently, all over", &[(O, 2)]),
                option("Sometimes, mostly around the T-zone", &[(O, 1)]).with_combination(true),
                option("Mostly after trying a new product", &[(S, 2)]),
                option("Rarely", &[(N, 1)]),
            ],
        ),
        question(
            4,
            "How does your skin react to new products?",
            vec![
                option("Redness or stinging is common", &[(S, 3)]),
                option("Occasional mild irritation", &[(S, 1)]),
                option("It rarely reacts", &[(N, 1)]),
            ],
        ),
        question(
            5,
            "How visible are your pores?",
            vec![
                option("Large and visible across the face", &[(O, 2)]),
                option("Visible on the nose only", &[(O, 1)]).with_combination(true),
                option("Barely visible", &[(D, 1)]),
                option("Small and even", &[(N, 1)]),
            ],
        ),
        question(
            6,
            "What happens in cold, dry weather?",
            vec![
                option("Flaky and rough patches", &[(D, 2)]),
                option("Tight underneath but still oily on the surface", &[(O, 1), (D, 2)]),
                option("Itchy or red", &[(S, 2)]),
                option("Not much changes", &[(N, 1)]),
            ],
        ),
        question(
            7,
            "How does moisturizer feel after applying it?",
            vec![
                option("It disappears and I need more", &[(D, 2)]),
                option("Greasy and heavy", &[(O, 2)]),
                option("Oily on the T-zone but fine elsewhere", &[]).with_combination(true),
                option("Just right", &[(N, 1)]),
            ],
        ),
        question(
            8,
            "How does your skin respond to the sun?",
            vec![
                option("Burns and turns red easily", &[(S, 2)]),
                option("Tans with some redness", &[(S, 1)]),
                option("Rarely burns", &[(N, 1)]),
            ],
        ),
        question(
            9,
            "Do you notice tightness or fine lines around the eyes and mouth?",
            vec![
                option("Yes, most days", &[(D, 2)]),
                option("Sometimes", &[(D, 1)]),
                option("No", &[(N, 1)]),
            ],
        ),
        question(
            10,
            "How would you describe your skin overall?",
            vec![
                option("Oily", &[(O, 2)]),
                option("Dry", &[(D, 2)]),
                option("Sensitive", &[(S, 2)]),
                option("Different in different areas", &[]).with_combination(true),
                option("Balanced", &[(N, 2)]).with_combination(false),
            ],
        ),
    ]
}

fn standard_rules() -> Vec<ThresholdRule> {
    vec![
        ThresholdRule::axis("SENSITIVE", Axis::Sensitivity, 6),
        ThresholdRule::both(
            "OILY_DEHYDRATED",
            (Axis::Oiliness, 5),
            (Axis::Dryness, 5),
        ),
        ThresholdRule::axis("OILY", Axis::Oiliness, 8),
        ThresholdRule::axis("DRY", Axis::Dryness, 8),
        ThresholdRule::flag("COMBINATION", true),
        ThresholdRule::fallback("NORMAL"),
    ]
}

fn standard_results() -> BTreeMap<CategoryKey, ResultCategory> {
    let entries = [
        (
            "OILY",
            "Oily",
            "Vivid Orange",
            "#FF8A3D",
            "Active sebum production keeps your skin bright and resilient. Lightweight hydration and pore care keep the shine in balance.",
        ),
        (
            "DRY",
            "Dry",
            "Pale Yellow",
            "#F6E27F",
            "Your skin holds on to little oil and moisture. Rich, barrier-building care restores comfort and glow.",
        ),
        (
            "SENSITIVE",
            "Sensitive",
            "Dreamy Pink",
            "#F5A9C8",
            "Your skin reacts quickly to its surroundings. Minimal, calming formulas help it stay settled.",
        ),
        (
            "OILY_DEHYDRATED",
            "Oily Dehydrated",
            "Electric Blue",
            "#3D7BFF",
            "Shiny on the surface yet thirsty underneath. Deep, oil-free hydration brings the two back into balance.",
        ),
        (
            "COMBINATION",
            "Combination",
            "Mystic Purple",
            "#9B6BFF",
            "Different zones ask for different care. Balance the T-zone and comfort the cheeks.",
        ),
        (
            "NORMAL",
            "Normal",
            "Clear Green",
            "#6FD6A0",
            "Oil and moisture are well balanced. Gentle daily care keeps it that way.",
        ),
    ];

    entries
        .into_iter()
        .map(|(key, type_name, aura_keyword, color, description)| {
            (
                CategoryKey::new(key),
                ResultCategory {
                    type_name: type_name.to_string(),
                    aura_keyword: aura_keyword.to_string(),
                    color: color.to_string(),
                    description: description.to_string(),
                },
            )
        })
        .collect()
}
