use serde::{Deserialize, Serialize};

/// One medication line extracted by the structuring call.
///
/// The model answers with Italian keys; the Rust side uses English names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationEntry {
    #[serde(rename = "farmaco")]
    pub medication: String,
    #[serde(rename = "dosaggio")]
    pub dosage: String,
    // Free text, e.g. "mattina", "alle 8", "dopo cena".
    #[serde(rename = "oraImportante")]
    pub important_time: String,
    #[serde(rename = "motivo")]
    pub reason: String,
}

impl MedicationEntry {
    pub fn new(
        medication: impl Into<String>,
        dosage: impl Into<String>,
        important_time: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            medication: medication.into(),
            dosage: dosage.into(),
            important_time: important_time.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredResult {
    /// Markdown table: medication, dosage, time, reason.
    #[serde(rename = "summaryTable")]
    pub summary_table: String,
    #[serde(rename = "structuredSummary")]
    pub entries: Vec<MedicationEntry>,
    #[serde(rename = "gentleStory")]
    pub gentle_story: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InteractionState {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

impl InteractionState {
    // Stable label for display; not derived from `Debug`.
    pub fn label(self) -> &'static str {
        match self {
            InteractionState::Idle => "idle",
            InteractionState::Loading => "loading",
            InteractionState::Success => "success",
            InteractionState::Error => "error",
        }
    }
}

/// MIME types accepted by the transcription call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AllowedMime {
    ImageJpeg,
    ImagePng,
    ImageWebp,
    ApplicationPdf,
}

impl AllowedMime {
    pub const ALL: [AllowedMime; 4] = [
        AllowedMime::ImageJpeg,
        AllowedMime::ImagePng,
        AllowedMime::ImageWebp,
        AllowedMime::ApplicationPdf,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AllowedMime::ImageJpeg => "image/jpeg",
            AllowedMime::ImagePng => "image/png",
            AllowedMime::ImageWebp => "image/webp",
            AllowedMime::ApplicationPdf => "application/pdf",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(value))
    }
}

impl std::fmt::Display for AllowedMime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
