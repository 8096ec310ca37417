//! Skin diagnosis quiz: score accumulation, threshold resolution, and session hosting.

pub mod batch;
pub mod catalog;
pub mod classifier;
pub mod definition;
pub mod domain;
pub mod recommendation;
pub mod repository;
pub mod router;
pub mod rules;
pub mod service;
pub mod session;
pub mod views;

#[cfg(test)]
mod tests;

pub use batch::{classify_csv, write_csv, BatchError, BatchOutcome};
pub use catalog::{Product, ProductCatalog};
pub use classifier::{ClassifierError, Diagnosis, DiagnosisClassifier};
pub use definition::{DefinitionError, QuizDefinition};
pub use domain::{
    AnswerOption, Axis, CategoryKey, Question, ResultCategory, ScoreDelta, ScoreVector,
    SessionState,
};
pub use recommendation::{
    recommend_or_empty, CatalogRecommender, HttpRecommendationClient, RecommendationError,
    RecommendationRequest, RecommendationService, RecommendationStatus, RecommendedProduct,
};
pub use repository::{RepositoryError, SessionRepository};
pub use router::diagnosis_router;
pub use rules::{resolve_category, RuleCondition, ThresholdRule};
pub use service::{AnsweredSession, DiagnosisReport, DiagnosisService, DiagnosisServiceError};
pub use session::{AnswerOutcome, QuizSession, SessionError, SessionId, SessionProgress};
pub use views::{AnswerView, QuestionView, SessionView};
