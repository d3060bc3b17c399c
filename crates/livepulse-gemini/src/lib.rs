//! Narrative generation through the Gemini `generateContent` API.
//!
//! [`GeminiClient`] implements [`livepulse_analytics::NarrativeGenerator`]:
//! it renders an account's per-session summary into a prompt, sends it, and
//! returns the first candidate's text. Transient upstream failures are
//! retried with exponential back-off.

pub mod client;
pub mod error;
pub mod prompt;
pub(crate) mod retry;
pub mod types;

pub use client::GeminiClient;
pub use error::NarrativeError;
pub use prompt::build_prompt;
