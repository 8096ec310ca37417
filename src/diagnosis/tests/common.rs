use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::{json, Value};

use crate::diagnosis::classifier::DiagnosisClassifier;
use crate::diagnosis::definition::QuizDefinition;
use crate::diagnosis::domain::{
    AnswerOption, Axis, CategoryKey, Question, ResultCategory, ScoreDelta,
};
use crate::diagnosis::recommendation::{
    RecommendationError, RecommendationRequest, RecommendationService, RecommendationStatus,
    RecommendedProduct,
};
use crate::diagnosis::repository::{RepositoryError, SessionRepository};
use crate::diagnosis::rules::ThresholdRule;
use crate::diagnosis::service::DiagnosisService;
use crate::diagnosis::session::{QuizSession, SessionId};

pub(super) fn delta(entries: &[(Axis, u32)]) -> ScoreDelta {
    entries.iter().copied().collect()
}

pub(super) fn result(key: &str) -> ResultCategory {
    ResultCategory {
        type_name: key.to_lowercase(),
        aura_keyword: format!("{key} aura"),
        color: "#ffffff".to_string(),
        description: format!("{key} description"),
    }
}

pub(super) fn results(keys: &[&str]) -> BTreeMap<CategoryKey, ResultCategory> {
    keys.iter()
        .map(|key| (CategoryKey::new(*key), result(key)))
        .collect()
}

/// Ten questions sharing the same three options:
/// 0 adds one oiliness point, 1 sets the combination flag, 2 contributes nothing.
pub(super) fn ten_question_definition(rules: Vec<ThresholdRule>) -> QuizDefinition {
    let questions = (1..=10)
        .map(|id| Question {
            id,
            prompt: format!("question {id}"),
            options: vec![
                AnswerOption::new("oily", delta(&[(Axis::Oiliness, 1)])),
                AnswerOption::new("mixed", ScoreDelta::new()).with_combination(true),
                AnswerOption::new("nothing", ScoreDelta::new()),
            ],
        })
        .collect();

    let keys: Vec<&str> = rules.iter().map(|rule| rule.category.as_str()).collect();
    let results = results(&keys);
    QuizDefinition::new(questions, rules, results).expect("test definition is valid")
}

pub(super) fn scenario_rules() -> Vec<ThresholdRule> {
    vec![
        ThresholdRule::axis("OILY", Axis::Oiliness, 8),
        ThresholdRule::flag("COMBINATION", true),
        ThresholdRule::fallback("NORMAL"),
    ]
}

pub(super) fn scenario_classifier() -> DiagnosisClassifier {
    DiagnosisClassifier::new(ten_question_definition(scenario_rules()))
}

pub(super) fn build_service() -> (
    DiagnosisService<MemoryRepository, RecordingRecommender>,
    Arc<MemoryRepository>,
    Arc<RecordingRecommender>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let recommender = Arc::new(RecordingRecommender::default());
    let service = DiagnosisService::new(
        Arc::new(scenario_classifier()),
        repository.clone(),
        recommender.clone(),
    );
    (service, repository, recommender)
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) sessions: Arc<Mutex<HashMap<SessionId, QuizSession>>>,
}

impl SessionRepository for MemoryRepository {
    fn insert(&self, session: QuizSession) -> Result<QuizSession, RepositoryError> {
        let mut guard = self.sessions.lock().expect("repository mutex poisoned");
        if guard.contains_key(&session.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    fn update(&self, session: QuizSession) -> Result<(), RepositoryError> {
        let mut guard = self.sessions.lock().expect("repository mutex poisoned");
        guard.insert(session.id.clone(), session);
        Ok(())
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<QuizSession>, RepositoryError> {
        let guard = self.sessions.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}

pub(super) struct UnavailableRepository;

impl SessionRepository for UnavailableRepository {
    fn insert(&self, _session: QuizSession) -> Result<QuizSession, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _session: QuizSession) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &SessionId) -> Result<Option<QuizSession>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default)]
pub(super) struct RecordingRecommender {
    requests: Mutex<Vec<RecommendationRequest>>,
}

impl RecordingRecommender {
    pub(super) fn requests(&self) -> Vec<RecommendationRequest> {
        self.requests
            .lock()
            .expect("recommender mutex poisoned")
            .clone()
    }
}

impl RecommendationService for RecordingRecommender {
    async fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> Result<Vec<RecommendedProduct>, RecommendationError> {
        self.requests
            .lock()
            .expect("recommender mutex poisoned")
            .push(request.clone());
        Ok(vec![RecommendedProduct::new(json!({
            "id": format!("prod-{}", request.result_type.to_lowercase()),
            "name": "Test Product",
            "price": 10_000,
        }))])
    }
}

pub(super) struct FailingRecommender;

impl RecommendationService for FailingRecommender {
    async fn recommend(
        &self,
        _request: &RecommendationRequest,
    ) -> Result<Vec<RecommendedProduct>, RecommendationError> {
        Err(RecommendationError::Unavailable("connection refused".to_string()))
    }
}

/// Never answers, like a recommendation service that hangs.
pub(super) struct StalledRecommender;

impl RecommendationService for StalledRecommender {
    async fn recommend(
        &self,
        _request: &RecommendationRequest,
    ) -> Result<Vec<RecommendedProduct>, RecommendationError> {
        std::future::pending().await
    }
}

/// Lets spawned recommendation tasks run until the session holds its products.
pub(super) async fn wait_for_recommendations<R, C>(
    service: &DiagnosisService<R, C>,
    id: &SessionId,
) -> Vec<RecommendedProduct>
where
    R: SessionRepository + 'static,
    C: RecommendationService + 'static,
{
    for _ in 0..100 {
        let session = service.get(id).expect("session stored");
        if let Some(RecommendationStatus::Ready { products }) = session.recommendations {
            return products;
        }
        tokio::task::yield_now().await;
    }
    panic!("recommendations never arrived for {}", id.0);
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
