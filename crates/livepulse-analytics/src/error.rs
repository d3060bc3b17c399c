use livepulse_core::SessionScope;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failures of the analytics read path. Aggregation itself never fails.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// The session reader returned an error.
    #[error("session data unavailable for {scope}: {source}")]
    DataUnavailable {
        scope: SessionScope,
        #[source]
        source: BoxError,
    },

    /// The session reader did not answer within the configured timeout.
    #[error("session read for {scope} timed out after {timeout_secs}s")]
    ReadTimeout { scope: SessionScope, timeout_secs: u64 },
}

/// Why a narrative could not be produced.
#[derive(Debug, Error)]
pub enum NarrativeFailure<E: std::error::Error + 'static> {
    #[error(transparent)]
    Data(#[from] AnalyticsError),

    #[error("narrative generator unavailable: {0}")]
    Unavailable(#[source] E),
}
