//! Text converter collaborators
//!
//! A converter turns raw document bytes into plain text. The production
//! implementation pipes the bytes through an external program; tests supply
//! their own in-process implementations.

use crate::extract::ExtractError;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Default time an external converter may run before it is killed
pub const DEFAULT_CONVERTER_TIMEOUT: Duration = Duration::from_secs(60);

/// Converts raw document bytes into plain text
#[async_trait]
pub trait TextConverter: Send + Sync {
    /// Converts `input` into plain text
    async fn convert(&self, input: &[u8]) -> Result<String, ExtractError>;
}

/// Converter backed by an external program reading stdin and writing stdout
///
/// A non-zero exit status is reported as [`ExtractError::ConverterFailed`]
/// together with whatever the program wrote to stderr. A program still
/// running after the timeout is killed and reported as
/// [`ExtractError::ConverterTimeout`].
#[derive(Debug, Clone)]
pub struct CommandConverter {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandConverter {
    /// Creates a converter running `program` with `args`
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            timeout: DEFAULT_CONVERTER_TIMEOUT,
        }
    }

    /// HTML to plain text through pandoc
    pub fn pandoc(program: impl Into<String>) -> Self {
        Self::new(
            program,
            ["--quiet", "--sandbox", "-f", "html", "-t", "plain"],
        )
    }

    /// PDF to plain text through poppler's pdftotext
    pub fn pdftotext(program: impl Into<String>) -> Self {
        Self::new(program, ["-", "-"])
    }

    /// Sets how long one conversion may run
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn io_error(&self, source: std::io::Error) -> ExtractError {
        ExtractError::ConverterIo {
            program: self.program.clone(),
            source,
        }
    }
}

#[async_trait]
impl TextConverter for CommandConverter {
    async fn convert(&self, input: &[u8]) -> Result<String, ExtractError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExtractError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let mut stdin = child.stdin.take().ok_or_else(|| {
            self.io_error(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "stdin unavailable",
            ))
        })?;

        // stdin is fed while stdout is drained; dropping it at the end sends EOF
        let feed = async move {
            let written = stdin.write_all(input).await;
            drop(stdin);
            written
        };
        let run = async move { tokio::join!(feed, child.wait_with_output()) };

        // On expiry the child is dropped with the future and killed
        let (written, output) = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| ExtractError::ConverterTimeout {
                program: self.program.clone(),
                timeout: self.timeout,
            })?;

        let output = output.map_err(|source| self.io_error(source))?;

        if !output.status.success() {
            return Err(ExtractError::ConverterFailed {
                program: self.program.clone(),
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        // The program exited cleanly, but if it stopped reading early the text is partial
        written.map_err(|source| self.io_error(source))?;

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
