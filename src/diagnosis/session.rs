use serde::{Deserialize, Serialize};

use super::classifier::{ClassifierError, Diagnosis, DiagnosisClassifier};
use super::domain::{CategoryKey, SessionState};
use super::recommendation::RecommendationStatus;

/// Identifier wrapper for quiz sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

/// Position of a session in the linear quiz flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum SessionProgress {
    NotStarted,
    Answering { question: usize },
    Resolved { category: CategoryKey },
}

impl SessionProgress {
    pub fn label(&self) -> &'static str {
        match self {
            SessionProgress::NotStarted => "not_started",
            SessionProgress::Answering { .. } => "answering",
            SessionProgress::Resolved { .. } => "resolved",
        }
    }
}

/// One respondent's pass through the quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSession {
    pub id: SessionId,
    pub state: SessionState,
    pub progress: SessionProgress,
    /// Set once the session resolves and the recommendation hand-off starts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<RecommendationStatus>,
}

/// Result of applying one answer to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    Next { question: usize },
    Resolved(Diagnosis),
}

impl QuizSession {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            state: SessionState::new(),
            progress: SessionProgress::NotStarted,
            recommendations: None,
        }
    }

    pub fn begin(&mut self) -> Result<(), SessionError> {
        match self.progress {
            SessionProgress::NotStarted => {
                self.progress = SessionProgress::Answering { question: 0 };
                Ok(())
            }
            SessionProgress::Answering { .. } => Err(SessionError::AlreadyStarted),
            SessionProgress::Resolved { .. } => Err(SessionError::AlreadyResolved),
        }
    }

    /// Applies the selected option to the current question and advances.
    ///
    /// The session is left untouched when the answer is rejected.
    pub fn answer(
        &mut self,
        classifier: &DiagnosisClassifier,
        option_index: usize,
    ) -> Result<AnswerOutcome, SessionError> {
        let question = match self.progress {
            SessionProgress::Answering { question } => question,
            SessionProgress::NotStarted => return Err(SessionError::NotStarted),
            SessionProgress::Resolved { .. } => return Err(SessionError::AlreadyResolved),
        };

        let next_state = classifier.apply_answer(&self.state, question, option_index)?;
        let next_question = question + 1;

        if next_question < classifier.question_count() {
            self.state = next_state;
            self.progress = SessionProgress::Answering {
                question: next_question,
            };
            return Ok(AnswerOutcome::Next {
                question: next_question,
            });
        }

        let diagnosis = classifier.resolve(&next_state)?;
        self.state = next_state;
        self.progress = SessionProgress::Resolved {
            category: diagnosis.category.clone(),
        };
        Ok(AnswerOutcome::Resolved(diagnosis))
    }

    /// Full reset: zeroed scores, cleared flag, back to the intro.
    pub fn restart(&mut self) {
        self.state = SessionState::new();
        self.progress = SessionProgress::NotStarted;
        self.recommendations = None;
    }

    pub fn current_question(&self) -> Option<usize> {
        match self.progress {
            SessionProgress::Answering { question } => Some(question),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.progress, SessionProgress::Resolved { .. })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session has not been started")]
    NotStarted,
    #[error("session is already in progress")]
    AlreadyStarted,
    #[error("session is already resolved")]
    AlreadyResolved,
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
}
