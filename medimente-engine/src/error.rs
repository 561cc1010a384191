use medimente_core::upload::UploadError;
use thiserror::Error;

/// Failures of the two remote calls.
///
/// Display strings are user-facing; the carried detail is for logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("Errore durante l'estrazione del testo dal file: {0}")]
    Extraction(String),

    #[error(
        "Impossibile leggere la risposta dell'LLM. Sembra che l'output non sia un JSON valido. Riprova."
    )]
    Decode(String),

    #[error("La risposta dell'LLM non è nel formato atteso. Riprova.")]
    MalformedResponse(String),

    #[error("Errore durante la comunicazione con l'API Gemini: {0}")]
    Transport(String),
}

impl GatewayError {
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::Extraction(_) => "extraction",
            GatewayError::Decode(_) => "decode",
            GatewayError::MalformedResponse(_) => "malformed_response",
            GatewayError::Transport(_) => "transport",
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            GatewayError::Extraction(d)
            | GatewayError::Decode(d)
            | GatewayError::MalformedResponse(d)
            | GatewayError::Transport(d) => d,
        }
    }
}

/// Everything the controller can turn into the on-screen message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("Per favore, inserisci le istruzioni mediche.")]
    EmptyInput,

    #[error("Impossibile leggere il file selezionato.")]
    FileRead,

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("La sintesi vocale non è supportata o non c'è nessuna storia da raccontare.")]
    NarrationUnavailable,

    #[error("Si è verificato un errore durante la riproduzione vocale.")]
    NarrationPlayback,
}

impl AppError {
    pub fn user_message(&self) -> String {
        match self {
            // Upload and gateway failures read as "Errore: <cause>".
            AppError::Upload(_) | AppError::Gateway(_) => format!("Errore: {self}"),
            _ => self.to_string(),
        }
    }
}
