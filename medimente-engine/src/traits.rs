use async_trait::async_trait;
use medimente_core::types::StructuredResult;
use medimente_core::upload::InlineFile;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::GatewayError;

/// A file the user picked for transcription.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileRef(pub PathBuf);

impl FileRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

/// The generative-AI capability behind both remote calls.
#[async_trait]
pub trait AiGateway: Send + Sync {
    /// Transcribe an image or PDF into plain text.
    async fn transcribe(&self, file: &InlineFile) -> Result<String, GatewayError>;

    /// Turn free-text instructions into table, entries and story.
    ///
    /// Callers reject blank input before getting here.
    async fn structure(&self, medical_text: &str) -> Result<StructuredResult, GatewayError>;
}

#[async_trait]
pub trait FileSource: Send + Sync {
    /// Read the file as `data:<mime>;base64,<payload>`.
    async fn read_data_url(&self, file: &FileRef) -> anyhow::Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playback {
    /// Playback is running; the frontend reports the end later.
    Started,
    /// The whole text was delivered before `speak` returned.
    Finished,
}

#[async_trait]
pub trait Narrator: Send + Sync {
    async fn speak(&self, text: &str, language: &str) -> anyhow::Result<Playback>;
    async fn cancel(&self) -> anyhow::Result<()>;
}

#[async_trait]
pub trait LinkOpener: Send + Sync {
    async fn open(&self, url: &Url) -> anyhow::Result<()>;
}
