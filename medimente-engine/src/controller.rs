use chrono::NaiveDate;
use medimente_core::calendar::{build_calendar_link_at, default_calendar_base};
use medimente_core::config::DEFAULT_SPEECH_LANGUAGE;
use medimente_core::types::{InteractionState, StructuredResult};
use medimente_core::upload::{InlineFile, parse_data_url};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, GatewayError};
use crate::traits::FileRef;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    pub speech_supported: bool,
    pub speech_language: String,
    pub calendar_base: Url,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            speech_supported: true,
            speech_language: DEFAULT_SPEECH_LANGUAGE.into(),
            calendar_base: default_calendar_base(),
        }
    }
}

/// Something that happened: a user action or the completion of a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    TextEdited(String),
    FileSelected(FileRef),
    FileRead(Result<String, String>),
    TranscriptionDone(Result<String, GatewayError>),
    GeneratePressed,
    StructureDone {
        request_id: u64,
        result: Result<StructuredResult, GatewayError>,
    },
    AddToCalendar {
        index: usize,
        date: NaiveDate,
    },
    NarrationToggled,
    NarrationStarted,
    NarrationEnded,
    NarrationFailed,
}

/// Side effects requested by the controller; the engine runs them.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ReadFile(FileRef),
    Transcribe(InlineFile),
    Structure { request_id: u64, text: String },
    OpenUrl(Url),
    Speak { text: String, language: String },
    CancelSpeech,
}

/// Snapshot of what the page shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    pub medical_text: String,
    pub state: InteractionState,
    pub output: Option<StructuredResult>,
    pub error: Option<String>,
    pub is_speaking: bool,
    pub is_processing_file: bool,
}

/// Owns all interaction state. Every mutation goes through [`Controller::handle`].
#[derive(Debug, Clone)]
pub struct Controller {
    cfg: ControllerConfig,
    medical_text: String,
    output: Option<StructuredResult>,
    state: InteractionState,
    error: Option<String>,
    is_speaking: bool,
    is_processing_file: bool,
    // Latest structuring request; completions with another id are stale.
    request_seq: u64,
}

impl Controller {
    pub fn new(cfg: ControllerConfig) -> Self {
        Self {
            cfg,
            medical_text: String::new(),
            output: None,
            state: InteractionState::Idle,
            error: None,
            is_speaking: false,
            is_processing_file: false,
            request_seq: 0,
        }
    }

    pub fn medical_text(&self) -> &str {
        &self.medical_text
    }

    pub fn output(&self) -> Option<&StructuredResult> {
        self.output.as_ref()
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_speaking(&self) -> bool {
        self.is_speaking
    }

    pub fn is_processing_file(&self) -> bool {
        self.is_processing_file
    }

    pub fn generate_enabled(&self) -> bool {
        self.state != InteractionState::Loading
    }

    pub fn upload_enabled(&self) -> bool {
        !self.is_processing_file
    }

    pub fn narration_available(&self) -> bool {
        self.cfg.speech_supported && self.story().is_some()
    }

    pub fn view(&self) -> ViewState {
        ViewState {
            medical_text: self.medical_text.clone(),
            state: self.state,
            output: self.output.clone(),
            error: self.error.clone(),
            is_speaking: self.is_speaking,
            is_processing_file: self.is_processing_file,
        }
    }

    pub fn handle(&mut self, event: Event) -> Vec<Command> {
        match event {
            Event::TextEdited(text) => {
                self.medical_text = text;
                vec![]
            }
            Event::FileSelected(file) => self.on_file_selected(file),
            Event::FileRead(result) => self.on_file_read(result),
            Event::TranscriptionDone(result) => {
                match result {
                    Ok(text) => self.medical_text = text,
                    Err(e) => {
                        log::error!("transcription failed ({}): {}", e.kind(), e.detail());
                        self.fail(AppError::from(e));
                    }
                }
                self.is_processing_file = false;
                vec![]
            }
            Event::GeneratePressed => self.on_generate(),
            Event::StructureDone { request_id, result } => {
                self.on_structure_done(request_id, result);
                vec![]
            }
            Event::AddToCalendar { index, date } => self.on_add_to_calendar(index, date),
            Event::NarrationToggled => self.on_narration_toggled(),
            Event::NarrationStarted => {
                self.is_speaking = true;
                vec![]
            }
            Event::NarrationEnded => {
                self.is_speaking = false;
                vec![]
            }
            Event::NarrationFailed => {
                self.is_speaking = false;
                self.fail(AppError::NarrationPlayback);
                vec![]
            }
        }
    }

    fn on_file_selected(&mut self, file: FileRef) -> Vec<Command> {
        if self.is_processing_file {
            log::warn!("file selected while another is being processed; ignoring");
            return vec![];
        }
        self.is_processing_file = true;
        self.error = None;
        vec![Command::ReadFile(file)]
    }

    fn on_file_read(&mut self, result: Result<String, String>) -> Vec<Command> {
        let data_url = match result {
            Ok(data_url) => data_url,
            Err(e) => {
                log::error!("error reading file: {e}");
                self.fail(AppError::FileRead);
                self.is_processing_file = false;
                return vec![];
            }
        };

        match parse_data_url(&data_url) {
            Ok(file) => vec![Command::Transcribe(file)],
            Err(e) => {
                self.fail(AppError::from(e));
                self.is_processing_file = false;
                vec![]
            }
        }
    }

    fn on_generate(&mut self) -> Vec<Command> {
        if self.state == InteractionState::Loading {
            return vec![];
        }

        self.error = None;
        self.output = None;

        let text = self.medical_text.trim();
        if text.is_empty() {
            self.fail(AppError::EmptyInput);
            self.state = InteractionState::Idle;
            return vec![];
        }

        self.state = InteractionState::Loading;
        self.request_seq += 1;
        vec![Command::Structure {
            request_id: self.request_seq,
            text: text.to_string(),
        }]
    }

    fn on_structure_done(
        &mut self,
        request_id: u64,
        result: Result<StructuredResult, GatewayError>,
    ) {
        if request_id != self.request_seq {
            log::warn!(
                "dropping stale structuring response {request_id} (latest is {})",
                self.request_seq
            );
            return;
        }

        match result {
            Ok(output) => {
                log::info!("reminder generated with {} entries", output.entries.len());
                self.output = Some(output);
                self.state = InteractionState::Success;
            }
            Err(e) => {
                log::error!("reminder generation failed ({}): {}", e.kind(), e.detail());
                self.fail(AppError::from(e));
                self.state = InteractionState::Error;
            }
        }
    }

    fn on_add_to_calendar(&mut self, index: usize, date: NaiveDate) -> Vec<Command> {
        let Some(entry) = self.output.as_ref().and_then(|o| o.entries.get(index)) else {
            log::warn!("no medication entry at index {index}");
            return vec![];
        };
        let url = build_calendar_link_at(&self.cfg.calendar_base, entry, date);
        vec![Command::OpenUrl(url)]
    }

    fn on_narration_toggled(&mut self) -> Vec<Command> {
        // Stopping never depends on the story still being on screen.
        if self.is_speaking {
            self.is_speaking = false;
            return vec![Command::CancelSpeech];
        }

        let story = match (self.cfg.speech_supported, self.story()) {
            (true, Some(story)) => story.to_string(),
            _ => {
                self.fail(AppError::NarrationUnavailable);
                return vec![];
            }
        };

        vec![Command::Speak {
            text: story,
            language: self.cfg.speech_language.clone(),
        }]
    }

    fn story(&self) -> Option<&str> {
        self.output
            .as_ref()
            .map(|o| o.gentle_story.as_str())
            .filter(|s| !s.trim().is_empty())
    }

    fn fail(&mut self, e: AppError) {
        self.error = Some(e.user_message());
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(ControllerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medimente_core::types::{AllowedMime, MedicationEntry};

    fn sample_result() -> StructuredResult {
        StructuredResult {
            summary_table: "| Farmaco |\n|---|\n| X |".into(),
            entries: vec![MedicationEntry::new("X", "5mg", "mattina", "pressione")],
            gentle_story: "C'era una volta...".into(),
        }
    }

    fn generate(c: &mut Controller, text: &str) -> u64 {
        c.handle(Event::TextEdited(text.into()));
        match c.handle(Event::GeneratePressed).as_slice() {
            [Command::Structure { request_id, .. }] => *request_id,
            other => panic!("expected a structure command, got {other:?}"),
        }
    }

    fn succeeded() -> Controller {
        let mut c = Controller::default();
        let id = generate(&mut c, "Cardioaspirina la mattina");
        c.handle(Event::StructureDone {
            request_id: id,
            result: Ok(sample_result()),
        });
        c
    }

    #[test]
    fn blank_input_never_reaches_gateway() {
        let mut c = Controller::default();
        c.handle(Event::TextEdited("   \n\t".into()));
        let cmds = c.handle(Event::GeneratePressed);

        assert!(cmds.is_empty());
        assert_eq!(c.state(), InteractionState::Idle);
        assert_eq!(c.error(), Some("Per favore, inserisci le istruzioni mediche."));
    }

    #[test]
    fn generate_sends_trimmed_text_and_enters_loading() {
        let mut c = Controller::default();
        c.handle(Event::TextEdited("  Eutirox 50 alle 7:00  ".into()));
        let cmds = c.handle(Event::GeneratePressed);

        assert_eq!(
            cmds,
            vec![Command::Structure {
                request_id: 1,
                text: "Eutirox 50 alle 7:00".into()
            }]
        );
        assert_eq!(c.state(), InteractionState::Loading);
        assert!(!c.generate_enabled());
        // A second press while loading is swallowed.
        assert!(c.handle(Event::GeneratePressed).is_empty());
    }

    #[test]
    fn success_stores_output() {
        let c = succeeded();
        assert_eq!(c.state(), InteractionState::Success);
        assert_eq!(c.output(), Some(&sample_result()));
        assert!(c.error().is_none());
        assert!(c.generate_enabled());
    }

    #[test]
    fn malformed_response_shows_error_without_output() {
        let mut c = Controller::default();
        let id = generate(&mut c, "qualcosa");
        c.handle(Event::StructureDone {
            request_id: id,
            result: Err(GatewayError::MalformedResponse("missing gentleStory".into())),
        });

        assert_eq!(c.state(), InteractionState::Error);
        assert!(c.output().is_none());
        assert_eq!(
            c.error(),
            Some("Errore: La risposta dell'LLM non è nel formato atteso. Riprova.")
        );
    }

    #[test]
    fn retry_clears_previous_output_and_error() {
        let mut c = succeeded();
        c.handle(Event::GeneratePressed);
        assert!(c.output().is_none());
        assert_eq!(c.state(), InteractionState::Loading);

        let mut c = Controller::default();
        let id = generate(&mut c, "x");
        c.handle(Event::StructureDone {
            request_id: id,
            result: Err(GatewayError::Transport("boom".into())),
        });
        assert!(c.error().is_some());
        c.handle(Event::GeneratePressed);
        assert!(c.error().is_none());
    }

    #[test]
    fn stale_structuring_response_is_dropped() {
        let mut c = Controller::default();
        let first = generate(&mut c, "primo");
        c.handle(Event::StructureDone {
            request_id: first,
            result: Err(GatewayError::Transport("x".into())),
        });
        let second = generate(&mut c, "secondo");
        assert!(second > first);

        c.handle(Event::StructureDone {
            request_id: first,
            result: Ok(sample_result()),
        });
        assert_eq!(c.state(), InteractionState::Loading);
        assert!(c.output().is_none());

        c.handle(Event::StructureDone {
            request_id: second,
            result: Ok(sample_result()),
        });
        assert_eq!(c.state(), InteractionState::Success);
    }

    #[test]
    fn upload_flow_populates_text_and_clears_flag() {
        let mut c = Controller::default();
        let cmds = c.handle(Event::FileSelected(FileRef::new("/tmp/ricetta.png")));
        assert_eq!(cmds, vec![Command::ReadFile(FileRef::new("/tmp/ricetta.png"))]);
        assert!(c.is_processing_file());
        assert!(!c.upload_enabled());

        let cmds = c.handle(Event::FileRead(Ok("data:image/png;base64,AAAA".into())));
        assert_eq!(
            cmds,
            vec![Command::Transcribe(InlineFile {
                mime_type: AllowedMime::ImagePng,
                base64_data: "AAAA".into()
            })]
        );
        assert!(c.is_processing_file());

        c.handle(Event::TranscriptionDone(Ok("Eutirox 50 mcg".into())));
        assert_eq!(c.medical_text(), "Eutirox 50 mcg");
        assert!(!c.is_processing_file());
    }

    #[test]
    fn processing_flag_clears_on_every_failure_path() {
        let mut c = Controller::default();
        c.handle(Event::FileSelected(FileRef::new("a.png")));
        c.handle(Event::FileRead(Err("permission denied".into())));
        assert!(!c.is_processing_file());
        assert_eq!(c.error(), Some("Impossibile leggere il file selezionato."));

        c.handle(Event::FileSelected(FileRef::new("a.png")));
        assert!(c.error().is_none());
        c.handle(Event::FileRead(Ok("garbage".into())));
        assert!(!c.is_processing_file());
        assert_eq!(c.error(), Some("Errore: Formato file non valido."));

        c.handle(Event::FileSelected(FileRef::new("a.png")));
        c.handle(Event::FileRead(Ok("data:image/png;base64,AAAA".into())));
        c.handle(Event::TranscriptionDone(Err(GatewayError::Extraction(
            "quota".into(),
        ))));
        assert!(!c.is_processing_file());
        assert!(c.error().unwrap().contains("quota"));
        assert_eq!(c.medical_text(), "");
    }

    #[test]
    fn second_file_is_ignored_while_processing() {
        let mut c = Controller::default();
        c.handle(Event::FileSelected(FileRef::new("a.png")));
        assert!(c.handle(Event::FileSelected(FileRef::new("b.png"))).is_empty());
    }

    #[test]
    fn add_to_calendar_opens_link_for_entry() {
        let mut c = succeeded();
        let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let cmds = c.handle(Event::AddToCalendar { index: 0, date });
        match cmds.as_slice() {
            [Command::OpenUrl(url)] => {
                let dates = url
                    .query_pairs()
                    .find(|(k, _)| k == "dates")
                    .map(|(_, v)| v.into_owned());
                assert_eq!(dates.as_deref(), Some("20240131T080000/20240131T081500"));
            }
            other => panic!("expected OpenUrl, got {other:?}"),
        }

        assert!(c.handle(Event::AddToCalendar { index: 5, date }).is_empty());
    }

    #[test]
    fn narration_without_story_is_a_noop_with_message() {
        let mut c = Controller::default();
        let cmds = c.handle(Event::NarrationToggled);
        assert!(cmds.is_empty());
        assert!(!c.is_speaking());
        assert_eq!(
            c.error(),
            Some("La sintesi vocale non è supportata o non c'è nessuna storia da raccontare.")
        );
    }

    #[test]
    fn narration_unsupported_is_a_noop() {
        let mut c = Controller::new(ControllerConfig {
            speech_supported: false,
            ..ControllerConfig::default()
        });
        let id = generate(&mut c, "x");
        c.handle(Event::StructureDone {
            request_id: id,
            result: Ok(sample_result()),
        });
        assert!(!c.narration_available());
        assert!(c.handle(Event::NarrationToggled).is_empty());
    }

    #[test]
    fn narration_toggles_between_speak_and_cancel() {
        let mut c = succeeded();
        let cmds = c.handle(Event::NarrationToggled);
        assert_eq!(
            cmds,
            vec![Command::Speak {
                text: "C'era una volta...".into(),
                language: "it-IT".into()
            }]
        );
        c.handle(Event::NarrationStarted);
        assert!(c.is_speaking());

        assert_eq!(c.handle(Event::NarrationToggled), vec![Command::CancelSpeech]);
        assert!(!c.is_speaking());
    }

    #[test]
    fn toggle_after_regenerate_still_stops_narration() {
        let mut c = succeeded();
        c.handle(Event::NarrationToggled);
        c.handle(Event::NarrationStarted);

        generate(&mut c, "nuove istruzioni");
        assert!(c.output().is_none());

        assert_eq!(c.handle(Event::NarrationToggled), vec![Command::CancelSpeech]);
        assert!(!c.is_speaking());
        assert_eq!(c.error(), None);
    }

    #[test]
    fn narration_failure_resets_flag_and_reports() {
        let mut c = succeeded();
        c.handle(Event::NarrationStarted);
        c.handle(Event::NarrationFailed);
        assert!(!c.is_speaking());
        assert_eq!(
            c.error(),
            Some("Si è verificato un errore durante la riproduzione vocale.")
        );
        // The result stays on screen.
        assert_eq!(c.state(), InteractionState::Success);
    }
}
