use crate::controller::{Command, Controller, ControllerConfig, Event};
use crate::traits::{AiGateway, FileRef, FileSource, LinkOpener, Narrator, Playback};
use medimente_core::calendar::today_local;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

/// Runs the controller's commands against real collaborators.
///
/// Commands execute one at a time; each completion is fed back as an event
/// before the next command runs.
pub struct MedimenteEngine {
    controller: Controller,
    gateway: Arc<dyn AiGateway>,
    files: Arc<dyn FileSource>,
    narrator: Option<Arc<dyn Narrator>>,
    links: Arc<dyn LinkOpener>,
}

impl MedimenteEngine {
    pub fn new(
        mut cfg: ControllerConfig,
        gateway: Arc<dyn AiGateway>,
        files: Arc<dyn FileSource>,
        narrator: Option<Arc<dyn Narrator>>,
        links: Arc<dyn LinkOpener>,
    ) -> Self {
        cfg.speech_supported = cfg.speech_supported && narrator.is_some();
        Self {
            controller: Controller::new(cfg),
            gateway,
            files,
            narrator,
            links,
        }
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub async fn dispatch(&mut self, event: Event) {
        let mut queue: VecDeque<Command> = self.controller.handle(event).into();
        while let Some(cmd) = queue.pop_front() {
            if let Some(follow_up) = self.execute(cmd).await {
                for ev in follow_up {
                    queue.extend(self.controller.handle(ev));
                }
            }
        }
    }

    pub async fn set_text(&mut self, text: impl Into<String>) {
        self.dispatch(Event::TextEdited(text.into())).await;
    }

    pub async fn upload(&mut self, file: FileRef) {
        self.dispatch(Event::FileSelected(file)).await;
    }

    pub async fn generate(&mut self) {
        self.dispatch(Event::GeneratePressed).await;
    }

    pub async fn add_to_calendar(&mut self, index: usize) {
        let date = today_local();
        self.dispatch(Event::AddToCalendar { index, date }).await;
    }

    pub async fn toggle_narration(&mut self) {
        self.dispatch(Event::NarrationToggled).await;
    }

    async fn execute(&self, cmd: Command) -> Option<Vec<Event>> {
        match cmd {
            Command::ReadFile(file) => {
                let result = self
                    .files
                    .read_data_url(&file)
                    .await
                    .map_err(|e| format!("{e:#}"));
                Some(vec![Event::FileRead(result)])
            }
            Command::Transcribe(file) => {
                let t0 = Instant::now();
                let result = self.gateway.transcribe(&file).await;
                log::info!(
                    "transcription finished in {}ms (ok={})",
                    t0.elapsed().as_millis(),
                    result.is_ok()
                );
                Some(vec![Event::TranscriptionDone(result)])
            }
            Command::Structure { request_id, text } => {
                let t0 = Instant::now();
                let result = self.gateway.structure(&text).await;
                log::info!(
                    "structuring request {request_id} finished in {}ms (ok={})",
                    t0.elapsed().as_millis(),
                    result.is_ok()
                );
                Some(vec![Event::StructureDone { request_id, result }])
            }
            Command::OpenUrl(url) => {
                if let Err(e) = self.links.open(&url).await {
                    log::error!("failed to open calendar link: {e:#}");
                }
                None
            }
            Command::Speak { text, language } => {
                let narrator = self.narrator.as_ref()?;
                match narrator.speak(&text, &language).await {
                    Ok(Playback::Started) => Some(vec![Event::NarrationStarted]),
                    Ok(Playback::Finished) => {
                        Some(vec![Event::NarrationStarted, Event::NarrationEnded])
                    }
                    Err(e) => {
                        log::error!("narration failed: {e:#}");
                        Some(vec![Event::NarrationFailed])
                    }
                }
            }
            Command::CancelSpeech => {
                if let Some(narrator) = &self.narrator {
                    if let Err(e) = narrator.cancel().await {
                        log::warn!("failed to cancel narration: {e:#}");
                    }
                }
                None
            }
        }
    }
}
