use medimente_core::types::StructuredResult;
use medimente_core::upload::InlineFile;
use medimente_engine::error::GatewayError;
use medimente_providers::gemini::{
    GeminiConfig, build_structuring_request, build_transcription_request,
};
use medimente_providers::parse::{
    StructuredOutputError, parse_generate_content_text, parse_structured_result,
};

/// [`AiGateway`](medimente_engine::traits::AiGateway) backed by Gemini's
/// `generateContent` endpoint.
///
/// Holds only configuration; every call builds its own HTTP client.
#[derive(Clone)]
pub struct GeminiGateway {
    api_key: String,
    base_url: String,
    model: String,
}

impl std::fmt::Debug for GeminiGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiGateway")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl GeminiGateway {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    fn config(&self) -> GeminiConfig {
        GeminiConfig {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
        }
    }

    async fn generate_text(
        &self,
        req: &medimente_providers::request::HttpRequest,
    ) -> anyhow::Result<String> {
        if self.api_key.trim().is_empty() {
            return Err(anyhow::anyhow!("missing Gemini API key"));
        }

        let resp = medimente_providers::runtime::execute(req).await?;
        if !resp.is_success() {
            return Err(anyhow::anyhow!(
                "Gemini request failed: status={} body={}",
                resp.status,
                resp.body_lossy()
            ));
        }

        parse_generate_content_text(&resp.body)
    }
}

#[async_trait::async_trait]
impl medimente_engine::traits::AiGateway for GeminiGateway {
    async fn transcribe(&self, file: &InlineFile) -> Result<String, GatewayError> {
        if file.base64_data.is_empty() {
            return Err(GatewayError::Extraction("empty file".into()));
        }

        let req = build_transcription_request(&self.config(), file);
        self.generate_text(&req)
            .await
            .map_err(|e| GatewayError::Extraction(format!("{e:#}")))
    }

    async fn structure(&self, medical_text: &str) -> Result<StructuredResult, GatewayError> {
        let req = build_structuring_request(&self.config(), medical_text);
        let text = self
            .generate_text(&req)
            .await
            .map_err(|e| GatewayError::Transport(format!("{e:#}")))?;

        parse_structured_result(&text).map_err(|e| {
            log::warn!("unusable structured output: {e}");
            match e {
                StructuredOutputError::Decode(d) => GatewayError::Decode(d),
                StructuredOutputError::Malformed(d) => GatewayError::MalformedResponse(d),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medimente_core::types::AllowedMime;
    use medimente_engine::traits::AiGateway;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MODEL_PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

    fn envelope(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_raw(
            json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] }).to_string(),
            "application/json",
        )
    }

    async fn gateway_with(response: ResponseTemplate) -> (MockServer, GeminiGateway) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .and(header("x-goog-api-key", "k"))
            .respond_with(response)
            .mount(&server)
            .await;
        let gateway = GeminiGateway::new("k", server.uri(), "gemini-2.5-flash");
        (server, gateway)
    }

    fn png() -> InlineFile {
        InlineFile::from_bytes(AllowedMime::ImagePng, b"\x89PNG")
    }

    #[tokio::test]
    async fn transcribe_returns_raw_text() {
        let (_server, gw) = gateway_with(envelope("Lasix 25mg mattina")).await;
        assert_eq!(gw.transcribe(&png()).await.unwrap(), "Lasix 25mg mattina");
    }

    #[tokio::test]
    async fn transcribe_failure_is_extraction_error() {
        let (_server, gw) = gateway_with(ResponseTemplate::new(500)).await;
        let err = gw.transcribe(&png()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Extraction(ref d) if d.contains("status=500")));
    }

    #[tokio::test]
    async fn transcribe_rejects_empty_payload_without_network() {
        let gw = GeminiGateway::new("k", "http://127.0.0.1:9", "gemini-2.5-flash");
        let empty = InlineFile {
            mime_type: AllowedMime::ImageJpeg,
            base64_data: String::new(),
        };
        assert!(matches!(
            gw.transcribe(&empty).await,
            Err(GatewayError::Extraction(_))
        ));
    }

    #[tokio::test]
    async fn structure_returns_validated_result() {
        let body = json!({
            "summaryTable": "| Lasix |",
            "structuredSummary": [
                {"farmaco":"Lasix","dosaggio":"25mg","oraImportante":"mattina","motivo":"diuretico"}
            ],
            "gentleStory": "Ogni mattina..."
        });
        let (_server, gw) = gateway_with(envelope(&format!("\n{body}\n"))).await;
        let result = gw.structure("Lasix 25mg mattina").await.unwrap();
        assert_eq!(result.entries[0].reason, "diuretico");
        assert_eq!(result.gentle_story, "Ogni mattina...");
    }

    #[tokio::test]
    async fn structure_non_json_is_decode_error() {
        let (_server, gw) = gateway_with(envelope("Certo! Ecco la tabella")).await;
        assert!(matches!(
            gw.structure("x").await,
            Err(GatewayError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn structure_missing_story_is_malformed() {
        let body = json!({ "summaryTable": "| a |", "structuredSummary": [] });
        let (_server, gw) = gateway_with(envelope(&body.to_string())).await;
        assert!(matches!(
            gw.structure("x").await,
            Err(GatewayError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn structure_http_failure_is_transport_error() {
        let (_server, gw) = gateway_with(ResponseTemplate::new(429)).await;
        assert!(matches!(
            gw.structure("x").await,
            Err(GatewayError::Transport(ref d)) if d.contains("429")
        ));
    }

    #[tokio::test]
    async fn missing_key_fails_before_sending() {
        let gw = GeminiGateway::new(" ", "http://127.0.0.1:9", "gemini-2.5-flash");
        assert!(matches!(
            gw.structure("x").await,
            Err(GatewayError::Transport(ref d)) if d.contains("API key")
        ));
    }

    #[test]
    fn debug_redacts_key() {
        let gw = GeminiGateway::new("AIza-secret", "https://x", "m");
        assert!(!format!("{gw:?}").contains("AIza-secret"));
    }
}
