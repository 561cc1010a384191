use anyhow::Context;
use medimente_core::upload::to_data_url;
use medimente_engine::traits::FileRef;

/// Reads prescription files from the local filesystem.
///
/// The MIME type comes from the file extension. Unknown extensions produce a
/// data URL without a type, which the controller reports as a MIME error.
#[derive(Debug, Clone, Default)]
pub struct LocalFileSource;

impl LocalFileSource {
    pub fn new() -> Self {
        Self
    }
}

pub fn guess_mime(file: &FileRef) -> Option<String> {
    mime_guess::from_path(file.path())
        .first()
        .map(|m| m.essence_str().to_string())
}

#[async_trait::async_trait]
impl medimente_engine::traits::FileSource for LocalFileSource {
    async fn read_data_url(&self, file: &FileRef) -> anyhow::Result<String> {
        let bytes = tokio::fs::read(file.path())
            .await
            .with_context(|| format!("read file: {}", file.path().display()))?;
        log::info!(
            "read {} bytes from {}",
            bytes.len(),
            file.path().display()
        );

        let mime = guess_mime(file).unwrap_or_default();
        Ok(to_data_url(&mime, &bytes))
    }
}
