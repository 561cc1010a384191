use serde::{Deserialize, Serialize};

use crate::calendar::DEFAULT_CALENDAR_BASE_URL;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_SPEECH_LANGUAGE: &str = "it-IT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub model: String,
    pub api_base_url: String,
    pub speech_language: String,
    pub calendar_base_url: String,

    // Secrets are stored outside this struct at rest.
    #[serde(default)]
    pub api_key_present: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.into(),
            api_base_url: DEFAULT_API_BASE_URL.into(),
            speech_language: DEFAULT_SPEECH_LANGUAGE.into(),
            calendar_base_url: DEFAULT_CALENDAR_BASE_URL.into(),
            api_key_present: false,
        }
    }
}
