use serde::Serialize;

use super::classifier::DiagnosisClassifier;
use super::domain::{CategoryKey, Question, ResultCategory, ScoreVector};
use super::recommendation::RecommendationStatus;
use super::service::DiagnosisReport;
use super::session::{QuizSession, SessionId, SessionProgress};

#[derive(Debug, Clone, Serialize)]
pub struct OptionView {
    pub index: usize,
    pub text: String,
}

/// Question as presented to a respondent. Score deltas stay server side.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub index: usize,
    pub id: u32,
    pub prompt: String,
    pub options: Vec<OptionView>,
}

impl QuestionView {
    pub fn new(index: usize, question: &Question) -> Self {
        Self {
            index,
            id: question.id,
            prompt: question.prompt.clone(),
            options: question
                .options
                .iter()
                .enumerate()
                .map(|(index, option)| OptionView {
                    index,
                    text: option.text.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: SessionId,
    pub status: &'static str,
    pub total_questions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_question: Option<QuestionView>,
    pub scores: ScoreVector,
    pub combination: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<RecommendationStatus>,
}

impl SessionView {
    pub fn new(session: &QuizSession, classifier: &DiagnosisClassifier) -> Self {
        let current_question = session.current_question().and_then(|index| {
            classifier
                .question(index)
                .ok()
                .map(|question| QuestionView::new(index, question))
        });
        let category = match &session.progress {
            SessionProgress::Resolved { category } => Some(category.clone()),
            _ => None,
        };
        let result = category
            .as_ref()
            .and_then(|key| classifier.definition().result(key).cloned());

        Self {
            session_id: session.id.clone(),
            status: session.progress.label(),
            total_questions: classifier.question_count(),
            current_question,
            scores: session.state.scores,
            combination: session.state.combination,
            category,
            result,
            recommendations: session.recommendations.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerView {
    pub session: SessionView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<DiagnosisReport>,
}
