//! Prompt text for the account narrative.

use livepulse_analytics::NarrativeInput;

use crate::error::NarrativeError;

/// Render the analyst prompt for `input`.
///
/// The per-session summary is embedded as pretty-printed JSON. The model is
/// asked to answer in Indonesian, the language of the dashboard's audience.
///
/// # Errors
///
/// Returns [`NarrativeError::Prompt`] if the summary cannot be serialized.
pub fn build_prompt(input: &NarrativeInput) -> Result<String, NarrativeError> {
    let data = input.sessions_json().map_err(NarrativeError::Prompt)?;
    let username = &input.username;
    Ok(format!(
        "Anda adalah analis live streaming TikTok.\n\
         Berdasarkan data historis beberapa sesi live untuk akun @{username}, \
         berikan analisis singkat dalam bahasa Indonesia.\n\
         \n\
         Data (JSON):\n\
         {data}\n\
         \n\
         Tolong berikan jawaban:\n\
         - Ringkasan performa akun secara umum (1 paragraf singkat).\n\
         - Pola yang terlihat dari score dan engagement/retention.\n\
         - 3 saran praktis dan spesifik untuk meningkatkan performa live berikutnya.\n\
         Gunakan bullet list yang rapi, maksimal 200-250 kata."
    ))
}
