use std::sync::Arc;

use anyhow::Context;
use medimente_core::config::AppConfig;
use medimente_engine::controller::ControllerConfig;
use medimente_engine::engine::MedimenteEngine;
use medimente_engine::traits::{AiGateway, FileSource, LinkOpener, Narrator};
use url::Url;

use crate::files::LocalFileSource;
use crate::gateway::GeminiGateway;

/// Build a runnable engine from config + the resolved API key.
///
/// This keeps the CLI thin.
pub fn build_engine_from_config(
    cfg: &AppConfig,
    api_key: String,
    narrator: Option<Arc<dyn Narrator>>,
    links: Arc<dyn LinkOpener>,
) -> anyhow::Result<MedimenteEngine> {
    let calendar_base = Url::parse(&cfg.calendar_base_url)
        .with_context(|| format!("invalid calendar_base_url: {}", cfg.calendar_base_url))?;

    let gateway: Arc<dyn AiGateway> = Arc::new(GeminiGateway::new(
        api_key,
        cfg.api_base_url.clone(),
        cfg.model.clone(),
    ));
    let files: Arc<dyn FileSource> = Arc::new(LocalFileSource::new());

    let controller_cfg = ControllerConfig {
        speech_supported: narrator.is_some(),
        speech_language: cfg.speech_language.clone(),
        calendar_base,
    };

    Ok(MedimenteEngine::new(
        controller_cfg,
        gateway,
        files,
        narrator,
        links,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::PrintLinkOpener;

    #[test]
    fn rejects_invalid_calendar_url() {
        let cfg = AppConfig {
            calendar_base_url: "not a url".into(),
            ..AppConfig::default()
        };
        let res = build_engine_from_config(
            &cfg,
            "k".into(),
            None,
            Arc::new(PrintLinkOpener::new(Vec::new())),
        );
        assert!(res.is_err());
    }

    #[test]
    fn speech_follows_narrator_presence() {
        let engine = build_engine_from_config(
            &AppConfig::default(),
            "k".into(),
            None,
            Arc::new(PrintLinkOpener::new(Vec::new())),
        )
        .unwrap();
        assert!(!engine.controller().narration_available());
    }
}
