use std::io::Write;
use std::sync::Mutex;

use anyhow::anyhow;
use medimente_engine::traits::Playback;
use url::Url;

/// Terminal stand-in for speech synthesis: prints the story.
pub struct ConsoleNarrator<W = std::io::Stdout> {
    out: Mutex<W>,
}

impl ConsoleNarrator {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> ConsoleNarrator<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }
}

#[async_trait::async_trait]
impl<W: Write + Send> medimente_engine::traits::Narrator for ConsoleNarrator<W> {
    async fn speak(&self, text: &str, language: &str) -> anyhow::Result<Playback> {
        let mut out = self.out.lock().map_err(|_| anyhow!("narrator poisoned"))?;
        writeln!(out, "[{language}] {text}")?;
        out.flush()?;
        Ok(Playback::Finished)
    }

    async fn cancel(&self) -> anyhow::Result<()> {
        // Printing is synchronous; nothing is ever in flight.
        Ok(())
    }
}

/// Prints calendar links instead of launching a browser.
pub struct PrintLinkOpener<W = std::io::Stdout> {
    out: Mutex<W>,
}

impl PrintLinkOpener {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> PrintLinkOpener<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }
}

#[async_trait::async_trait]
impl<W: Write + Send> medimente_engine::traits::LinkOpener for PrintLinkOpener<W> {
    async fn open(&self, url: &Url) -> anyhow::Result<()> {
        let mut out = self.out.lock().map_err(|_| anyhow!("link printer poisoned"))?;
        writeln!(out, "{url}")?;
        Ok(())
    }
}
