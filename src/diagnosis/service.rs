use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::classifier::{ClassifierError, Diagnosis, DiagnosisClassifier};
use super::recommendation::{
    recommend_or_empty, RecommendationRequest, RecommendationService, RecommendationStatus,
    RecommendedProduct,
};
use super::repository::{RepositoryError, SessionRepository};
use super::session::{AnswerOutcome, QuizSession, SessionError, SessionId};

/// Service composing the classifier, session repository, and recommendation hook.
pub struct DiagnosisService<R, C> {
    classifier: Arc<DiagnosisClassifier>,
    repository: Arc<R>,
    recommendations: Arc<C>,
}

static SESSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_session_id() -> SessionId {
    let id = SESSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SessionId(format!("diag-{id:06}"))
}

/// Final diagnosis, available as soon as the last answer is applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosisReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    #[serde(flatten)]
    pub diagnosis: Diagnosis,
    pub resolved_at: DateTime<Utc>,
}

/// Session snapshot after an answer, with the report once the last answer lands.
#[derive(Debug, Clone, PartialEq)]
pub struct AnsweredSession {
    pub session: QuizSession,
    pub report: Option<DiagnosisReport>,
}

impl<R, C> DiagnosisService<R, C>
where
    R: SessionRepository + 'static,
    C: RecommendationService + 'static,
{
    pub fn new(
        classifier: Arc<DiagnosisClassifier>,
        repository: Arc<R>,
        recommendations: Arc<C>,
    ) -> Self {
        Self {
            classifier,
            repository,
            recommendations,
        }
    }

    pub fn classifier(&self) -> &DiagnosisClassifier {
        &self.classifier
    }

    /// Open a new session at the intro screen.
    pub fn create(&self) -> Result<QuizSession, DiagnosisServiceError> {
        let session = QuizSession::new(next_session_id());
        let stored = self.repository.insert(session)?;
        info!(session_id = %stored.id.0, "diagnosis session created");
        Ok(stored)
    }

    pub fn begin(&self, id: &SessionId) -> Result<QuizSession, DiagnosisServiceError> {
        let mut session = self.get(id)?;
        session.begin()?;
        self.repository.update(session.clone())?;
        Ok(session)
    }

    /// Apply one answer.
    ///
    /// On the last answer the resolved session is persisted with pending recommendations and
    /// returned right away. The recommendation call runs on a spawned task and stores its
    /// products on the session when it finishes.
    pub async fn answer(
        &self,
        id: &SessionId,
        option_index: usize,
    ) -> Result<AnsweredSession, DiagnosisServiceError> {
        let mut session = self.get(id)?;
        let outcome = session.answer(&self.classifier, option_index)?;

        let report = match outcome {
            AnswerOutcome::Next { .. } => {
                self.repository.update(session.clone())?;
                None
            }
            AnswerOutcome::Resolved(diagnosis) => {
                session.recommendations = Some(RecommendationStatus::Pending);
                self.repository.update(session.clone())?;
                info!(
                    session_id = %session.id.0,
                    category = %diagnosis.category,
                    "diagnosis session resolved"
                );
                self.dispatch_recommendations(
                    session.id.clone(),
                    RecommendationRequest::from_diagnosis(&diagnosis),
                );
                Some(DiagnosisReport {
                    session_id: Some(session.id.clone()),
                    diagnosis,
                    resolved_at: Utc::now(),
                })
            }
        };

        Ok(AnsweredSession { session, report })
    }

    pub fn restart(&self, id: &SessionId) -> Result<QuizSession, DiagnosisServiceError> {
        let mut session = self.get(id)?;
        session.restart();
        self.repository.update(session.clone())?;
        Ok(session)
    }

    pub fn get(&self, id: &SessionId) -> Result<QuizSession, DiagnosisServiceError> {
        let session = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(session)
    }

    /// Classify a complete answer sheet without storing a session or contacting the
    /// recommendation service.
    pub fn evaluate(&self, answers: &[usize]) -> Result<DiagnosisReport, DiagnosisServiceError> {
        let diagnosis = self.classifier.classify(answers)?;
        Ok(DiagnosisReport {
            session_id: None,
            diagnosis,
            resolved_at: Utc::now(),
        })
    }

    /// Asks the recommendation service for products matching `diagnosis`. Failures yield an
    /// empty list.
    pub async fn recommend(&self, diagnosis: &Diagnosis) -> Vec<RecommendedProduct> {
        let request = RecommendationRequest::from_diagnosis(diagnosis);
        recommend_or_empty(self.recommendations.as_ref(), &request).await
    }

    fn dispatch_recommendations(&self, id: SessionId, request: RecommendationRequest) {
        let repository = Arc::clone(&self.repository);
        let recommendations = Arc::clone(&self.recommendations);
        tokio::spawn(async move {
            let products = recommend_or_empty(recommendations.as_ref(), &request).await;
            store_recommendations(repository.as_ref(), &id, products);
        });
    }
}

fn store_recommendations<R: SessionRepository>(
    repository: &R,
    id: &SessionId,
    products: Vec<RecommendedProduct>,
) {
    let mut session = match repository.fetch(id) {
        Ok(Some(session)) => session,
        Ok(None) => {
            warn!(session_id = %id.0, "session vanished before recommendations arrived");
            return;
        }
        Err(err) => {
            warn!(session_id = %id.0, error = %err, "could not load session for recommendations");
            return;
        }
    };

    if session.recommendations != Some(RecommendationStatus::Pending) {
        debug!(session_id = %id.0, "session restarted, dropping recommendations");
        return;
    }

    let count = products.len();
    session.recommendations = Some(RecommendationStatus::Ready { products });
    match repository.update(session) {
        Ok(()) => debug!(session_id = %id.0, count, "recommendations stored"),
        Err(err) => {
            warn!(session_id = %id.0, error = %err, "could not store recommendations")
        }
    }
}

/// Error raised by the diagnosis service.
#[derive(Debug, thiserror::Error)]
pub enum DiagnosisServiceError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
