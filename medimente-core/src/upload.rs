use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::types::AllowedMime;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("Formato file non valido.")]
    FileFormat,

    #[error("Impossibile determinare il tipo MIME del file.")]
    MimeType,

    #[error("Tipo di file non supportato: {0}. Usa un'immagine JPEG, PNG, WEBP o un PDF.")]
    UnsupportedMimeType(String),
}

/// A validated file payload, ready for the transcription call.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineFile {
    pub mime_type: AllowedMime,
    pub base64_data: String,
}

impl std::fmt::Debug for InlineFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InlineFile")
            .field("mime_type", &self.mime_type)
            .field("base64_len", &self.base64_data.len())
            .finish()
    }
}

impl InlineFile {
    pub fn from_bytes(mime_type: AllowedMime, bytes: &[u8]) -> Self {
        Self {
            mime_type,
            base64_data: STANDARD.encode(bytes),
        }
    }
}

/// Encode raw file bytes as `data:<mime>;base64,<data>`.
pub fn to_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

/// Split a `data:` URL into a validated [`InlineFile`].
///
/// A missing header or payload is a format error; a header without a
/// `:<mime>;` section is a MIME error.
pub fn parse_data_url(data_url: &str) -> Result<InlineFile, UploadError> {
    let (header, data) = data_url.split_once(',').ok_or(UploadError::FileFormat)?;
    if header.is_empty() || data.is_empty() {
        return Err(UploadError::FileFormat);
    }

    let mime = header
        .split_once(':')
        .and_then(|(_, rest)| rest.split_once(';'))
        .map(|(mime, _)| mime.trim())
        .filter(|mime| !mime.is_empty())
        .ok_or(UploadError::MimeType)?;

    let mime_type =
        AllowedMime::parse(mime).ok_or_else(|| UploadError::UnsupportedMimeType(mime.into()))?;

    Ok(InlineFile {
        mime_type,
        base64_data: data.to_string(),
    })
}
