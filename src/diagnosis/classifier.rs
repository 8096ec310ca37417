use serde::{Deserialize, Serialize};
use tracing::debug;

use super::definition::QuizDefinition;
use super::domain::{CategoryKey, Question, ResultCategory, ScoreVector, SessionState};
use super::rules::resolve_category;

/// Stateless classifier over a validated quiz definition.
#[derive(Debug, Clone)]
pub struct DiagnosisClassifier {
    definition: QuizDefinition,
}

impl DiagnosisClassifier {
    pub fn new(definition: QuizDefinition) -> Self {
        Self { definition }
    }

    pub fn standard() -> Self {
        Self::new(QuizDefinition::standard())
    }

    pub fn definition(&self) -> &QuizDefinition {
        &self.definition
    }

    pub fn question_count(&self) -> usize {
        self.definition.questions().len()
    }

    pub fn question(&self, index: usize) -> Result<&Question, ClassifierError> {
        self.definition
            .questions()
            .get(index)
            .ok_or(ClassifierError::QuestionOutOfRange { index })
    }

    /// Applies the option at `option_index` of question `question_index` to `state`.
    pub fn apply_answer(
        &self,
        state: &SessionState,
        question_index: usize,
        option_index: usize,
    ) -> Result<SessionState, ClassifierError> {
        let question = self.question(question_index)?;
        let option =
            question
                .options
                .get(option_index)
                .ok_or(ClassifierError::OptionOutOfRange {
                    question: question_index,
                    option: option_index,
                    available: question.options.len(),
                })?;
        Ok(state.apply_answer(option))
    }

    /// Resolves the final state against the priority list and attaches display metadata.
    pub fn resolve(&self, state: &SessionState) -> Result<Diagnosis, ClassifierError> {
        let category = resolve_category(state, self.definition.rules())?;
        let result = self
            .definition
            .result(&category)
            .cloned()
            .ok_or_else(|| ClassifierError::UnmappedCategory(category.clone()))?;

        debug!(
            category = %category,
            oiliness = state.scores.oiliness,
            dryness = state.scores.dryness,
            sensitivity = state.scores.sensitivity,
            normal = state.scores.normal,
            combination = state.combination,
            "diagnosis resolved"
        );

        Ok(Diagnosis {
            category,
            result,
            scores: state.scores,
            combination: state.combination,
        })
    }

    /// Classifies a complete answer sheet holding one option index per question.
    pub fn classify(&self, answers: &[usize]) -> Result<Diagnosis, ClassifierError> {
        let expected = self.question_count();
        if answers.len() != expected {
            return Err(ClassifierError::AnswerCountMismatch {
                expected,
                actual: answers.len(),
            });
        }

        let state = answers.iter().enumerate().try_fold(
            SessionState::new(),
            |state, (question_index, option_index)| {
                self.apply_answer(&state, question_index, *option_index)
            },
        )?;

        self.resolve(&state)
    }
}

/// Resolved classification for one completed quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub category: CategoryKey,
    pub result: ResultCategory,
    pub scores: ScoreVector,
    pub combination: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("no threshold rule matched the final scores")]
    NoMatchingCategory,
    #[error("category {0} has no result mapping")]
    UnmappedCategory(CategoryKey),
    #[error("expected {expected} answers, received {actual}")]
    AnswerCountMismatch { expected: usize, actual: usize },
    #[error("question {index} does not exist")]
    QuestionOutOfRange { index: usize },
    #[error("question {question} has {available} options, option {option} is out of range")]
    OptionOutOfRange {
        question: usize,
        option: usize,
        available: usize,
    },
}

impl ClassifierError {
    /// True when the error stems from the caller's answers rather than the definition.
    pub fn is_invalid_answer(&self) -> bool {
        matches!(
            self,
            ClassifierError::AnswerCountMismatch { .. }
                | ClassifierError::QuestionOutOfRange { .. }
                | ClassifierError::OptionOutOfRange { .. }
        )
    }
}
