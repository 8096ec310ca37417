use aura_diagnosis::config::{DiagnosisConfig, RecommendationConfig};
use aura_diagnosis::diagnosis::{
    CatalogRecommender, DefinitionError, DiagnosisClassifier, HttpRecommendationClient,
    QuizDefinition, QuizSession, RecommendationError, RecommendationRequest,
    RecommendationService, RecommendedProduct, RepositoryError, SessionId, SessionRepository,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemorySessionRepository {
    sessions: Arc<Mutex<HashMap<SessionId, QuizSession>>>,
}

impl InMemorySessionRepository {
    fn lock(&self) -> Result<MutexGuard<'_, HashMap<SessionId, QuizSession>>, RepositoryError> {
        self.sessions
            .lock()
            .map_err(|_| RepositoryError::Unavailable("session store lock poisoned".to_string()))
    }
}

impl SessionRepository for InMemorySessionRepository {
    fn insert(&self, session: QuizSession) -> Result<QuizSession, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.contains_key(&session.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    fn update(&self, session: QuizSession) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        if guard.contains_key(&session.id) {
            guard.insert(session.id.clone(), session);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<QuizSession>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard.get(id).cloned())
    }
}

/// Recommendation source chosen at startup: the remote product service or the bundled catalog.
#[derive(Debug, Clone)]
pub(crate) enum Recommender {
    Http(HttpRecommendationClient),
    Catalog(CatalogRecommender),
}

impl Recommender {
    pub(crate) fn from_config(config: &RecommendationConfig) -> Result<Self, RecommendationError> {
        match config.base_url.as_deref() {
            Some(base_url) => {
                let client =
                    HttpRecommendationClient::new(base_url, config.timeout(), config.limit)?;
                info!(endpoint = client.endpoint(), "using remote recommendation service");
                Ok(Self::Http(client))
            }
            None => {
                info!(limit = config.limit, "using bundled product catalog");
                Ok(Self::Catalog(CatalogRecommender::standard(config.limit)))
            }
        }
    }
}

impl RecommendationService for Recommender {
    async fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> Result<Vec<RecommendedProduct>, RecommendationError> {
        match self {
            Recommender::Http(client) => client.recommend(request).await,
            Recommender::Catalog(catalog) => catalog.recommend(request).await,
        }
    }
}

/// Loads the quiz from `path` when given, otherwise the built-in standard quiz.
pub(crate) fn load_classifier(path: Option<&Path>) -> Result<DiagnosisClassifier, DefinitionError> {
    match path {
        Some(path) => {
            let definition = QuizDefinition::from_path(path)?;
            info!(
                path = %path.display(),
                questions = definition.questions().len(),
                "loaded quiz definition"
            );
            Ok(DiagnosisClassifier::new(definition))
        }
        None => Ok(DiagnosisClassifier::standard()),
    }
}

/// A `--definition` flag takes precedence over `DIAGNOSIS_DEFINITION_PATH`.
pub(crate) fn resolve_classifier(
    flag: Option<&Path>,
    config: &DiagnosisConfig,
) -> Result<DiagnosisClassifier, DefinitionError> {
    load_classifier(flag.or(config.definition_path.as_deref()))
}
