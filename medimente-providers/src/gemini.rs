use crate::request::{Body, HttpRequest};
use medimente_core::upload::InlineFile;
use serde_json::{Value, json};

pub const TRANSCRIPTION_INSTRUCTION: &str = "Trascrivi il testo da questo file (immagine o PDF di una prescrizione medica scritta a mano). Restituisci solo il testo trascritto, senza alcuna formattazione o testo aggiuntivo.";

pub const STRUCTURING_SYSTEM_INSTRUCTION: &str = "Sei un assistente medico amichevole e gentile. Il tuo compito è prendere le istruzioni mediche grezze e trasformarle in un promemoria facile da capire e in una storiella delicata per aiutare a ricordare di prendere i farmaci. Devi fornire l'output nel formato JSON specificato.

1. `summaryTable`: Una tabella Markdown che riassume i farmaci, il dosaggio, l'orario importante e il motivo.
2. `structuredSummary`: Un array JSON di oggetti, ciascuno contenente 'farmaco', 'dosaggio', 'oraImportante' e 'motivo'.
3. `gentleStory`: Una breve storiella narrativa (massimo 100 parole) che incorpora i farmaci in modo gentile e creativo, adatta a persone anziane o bambini.

Assicurati che tutte le informazioni siano accurate e facili da capire. La storiella deve essere positiva e rassicurante.";

#[derive(Clone, PartialEq, Eq)]
pub struct GeminiConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

/// Response schema for the structuring call.
///
/// Field order mirrors what the model is asked to produce; it is metadata for
/// the model, not something the parser relies on.
pub fn structuring_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "summaryTable": {
                "type": "STRING",
                "description": "A markdown table summarizing medications, dosage, important time, and reason."
            },
            "structuredSummary": {
                "type": "ARRAY",
                "description": "An array of structured medication entries.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "farmaco": { "type": "STRING", "description": "Name of the medication." },
                        "dosaggio": { "type": "STRING", "description": "Dosage of the medication." },
                        "oraImportante": {
                            "type": "STRING",
                            "description": "Important time for medication (e.g., \"mattina\", \"alle 8\", \"dopo cena\")."
                        },
                        "motivo": { "type": "STRING", "description": "Reason for taking the medication." }
                    },
                    "required": ["farmaco", "dosaggio", "oraImportante", "motivo"],
                    "propertyOrdering": ["farmaco", "dosaggio", "oraImportante", "motivo"]
                }
            },
            "gentleStory": {
                "type": "STRING",
                "description": "A gentle, short narrative story (max 100 words) to help remember the medications, suitable for elderly or children."
            }
        },
        "required": ["summaryTable", "structuredSummary", "gentleStory"],
        "propertyOrdering": ["summaryTable", "structuredSummary", "gentleStory"]
    })
}

/// Transcription call: the file part first, then the fixed instruction.
pub fn build_transcription_request(cfg: &GeminiConfig, file: &InlineFile) -> HttpRequest {
    let payload = json!({
        "contents": [{
            "role": "user",
            "parts": [
                {
                    "inline_data": {
                        "mime_type": file.mime_type.as_str(),
                        "data": file.base64_data,
                    }
                },
                { "text": TRANSCRIPTION_INSTRUCTION },
            ]
        }]
    });

    generate_content_request(cfg, payload)
}

/// Structuring call: the user's text plus system instruction and JSON schema.
pub fn build_structuring_request(cfg: &GeminiConfig, medical_text: &str) -> HttpRequest {
    let payload = json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": medical_text }]
        }],
        "systemInstruction": {
            "parts": [{ "text": STRUCTURING_SYSTEM_INSTRUCTION }]
        },
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": structuring_response_schema(),
        }
    });

    generate_content_request(cfg, payload)
}

fn generate_content_request(cfg: &GeminiConfig, payload: Value) -> HttpRequest {
    let path = format!("/v1beta/models/{}:generateContent", cfg.model.trim());
    HttpRequest {
        method: "POST".into(),
        url: join_url(&cfg.base_url, &path),
        headers: vec![
            ("Content-Type".into(), "application/json".into()),
            ("x-goog-api-key".into(), cfg.api_key.clone()),
        ],
        body: Body::Json(payload.to_string()),
    }
}

fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{}/{}", base, path)
}
