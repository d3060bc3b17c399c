//! The data-access boundary of the engine.

use std::future::Future;

use livepulse_core::{Session, SessionScope};

/// Loads monitored sessions, with their samples, for a scope.
///
/// Implementations return sessions in their natural processing order; the
/// aggregator uses that order for best-session tie-breaks. Missing numeric
/// metric values must already be mapped to `0`.
pub trait SessionReader: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn list_sessions(
        &self,
        scope: &SessionScope,
    ) -> impl Future<Output = Result<Vec<Session>, Self::Error>> + Send;
}

/// In-memory reader over a fixed set of sessions.
#[derive(Debug, Clone, Default)]
pub struct StaticSessionReader {
    sessions: Vec<Session>,
}

impl StaticSessionReader {
    #[must_use]
    pub fn new(sessions: Vec<Session>) -> Self {
        Self { sessions }
    }
}

impl SessionReader for StaticSessionReader {
    type Error = std::convert::Infallible;

    async fn list_sessions(&self, scope: &SessionScope) -> Result<Vec<Session>, Self::Error> {
        let sessions = match scope.username() {
            None => self.sessions.clone(),
            Some(username) => self
                .sessions
                .iter()
                .filter(|s| s.username == username)
                .cloned()
                .collect(),
        };
        Ok(sessions)
    }
}
