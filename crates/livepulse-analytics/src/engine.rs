//! Read, summarize and aggregate behind one injected [`SessionReader`].

use std::time::Duration;

use livepulse_core::{Session, SessionScope};

use crate::aggregate::{aggregate, AnalyticsSummary};
use crate::digest::{summarize_session, SessionDigest};
use crate::error::{AnalyticsError, NarrativeFailure};
use crate::narrative::{Narrative, NarrativeGenerator, NarrativeInput};
use crate::reader::SessionReader;
use crate::series::AccountSeries;

pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Stateless apart from the reader handle; every call recomputes from a
/// fresh read.
#[derive(Debug, Clone)]
pub struct AnalyticsEngine<R> {
    reader: R,
    read_timeout: Duration,
}

impl<R: SessionReader> AnalyticsEngine<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    async fn read(&self, scope: &SessionScope) -> Result<Vec<Session>, AnalyticsError> {
        match tokio::time::timeout(self.read_timeout, self.reader.list_sessions(scope)).await {
            Ok(Ok(sessions)) => {
                tracing::debug!(scope = %scope, sessions = sessions.len(), "sessions loaded");
                Ok(sessions)
            }
            Ok(Err(e)) => {
                tracing::warn!(scope = %scope, error = %e, "session read failed");
                Err(AnalyticsError::DataUnavailable {
                    scope: scope.clone(),
                    source: Box::new(e),
                })
            }
            Err(_) => {
                tracing::warn!(
                    scope = %scope,
                    timeout_secs = self.read_timeout.as_secs(),
                    "session read timed out"
                );
                Err(AnalyticsError::ReadTimeout {
                    scope: scope.clone(),
                    timeout_secs: self.read_timeout.as_secs(),
                })
            }
        }
    }

    async fn digests(&self, scope: &SessionScope) -> Result<Vec<SessionDigest>, AnalyticsError> {
        let sessions = self.read(scope).await?;
        Ok(sessions.iter().map(summarize_session).collect())
    }

    /// Global summary plus one insight per account, accounts in first-appearance order.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError`] if the read fails or times out. No partial
    /// summary is produced in that case.
    pub async fn summary(&self) -> Result<AnalyticsSummary, AnalyticsError> {
        let digests = self.digests(&SessionScope::All).await?;
        let summary = aggregate(&digests);
        tracing::info!(
            accounts = summary.global.total_accounts,
            sessions = summary.global.total_sessions,
            "analytics summary computed"
        );
        Ok(summary)
    }

    /// Per-session chart data for one account. An unknown account yields an
    /// empty series list.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError`] if the read fails or times out.
    pub async fn account_series(&self, username: &str) -> Result<AccountSeries, AnalyticsError> {
        let digests = self
            .digests(&SessionScope::Account(username.to_string()))
            .await?;
        Ok(AccountSeries::from_digests(username, &digests))
    }

    /// Natural-language report for one account.
    ///
    /// The generator is not called for an account without sessions.
    ///
    /// # Errors
    ///
    /// Returns [`NarrativeFailure::Data`] if the read fails and
    /// [`NarrativeFailure::Unavailable`] if the generator fails.
    pub async fn narrative<G: NarrativeGenerator>(
        &self,
        username: &str,
        generator: &G,
    ) -> Result<Narrative, NarrativeFailure<G::Error>> {
        let digests = self
            .digests(&SessionScope::Account(username.to_string()))
            .await?;
        if digests.is_empty() {
            return Ok(Narrative {
                username: username.to_string(),
                analysis: None,
                sessions_analyzed: 0,
            });
        }

        let input = NarrativeInput::from_digests(username, &digests);
        let analysis = generator.generate(&input).await.map_err(|e| {
            tracing::warn!(username, error = %e, "narrative generation failed");
            NarrativeFailure::Unavailable(e)
        })?;

        Ok(Narrative {
            username: username.to_string(),
            analysis: Some(analysis),
            sessions_analyzed: digests.len(),
        })
    }
}
