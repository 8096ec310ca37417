use super::session::{QuizSession, SessionId};

/// Storage abstraction so the service module can be exercised in isolation.
pub trait SessionRepository: Send + Sync {
    fn insert(&self, session: QuizSession) -> Result<QuizSession, RepositoryError>;
    fn update(&self, session: QuizSession) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &SessionId) -> Result<Option<QuizSession>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("session already exists")]
    Conflict,
    #[error("session not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
