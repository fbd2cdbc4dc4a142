use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::{ImageFormat, OcrEngine, OcrError};

/// Runs the `tesseract` binary as a child process: image on stdin, text on
/// stdout. The child is killed if the call times out or is cancelled.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    binary: String,
    lang: String,
    timeout: Duration,
}

impl TesseractCli {
    pub fn new(binary: impl Into<String>, lang: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            lang: lang.into(),
            timeout,
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(["stdin", "stdout", "-l", self.lang.as_str()])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    async fn run(&self, image: &[u8]) -> Result<String, OcrError> {
        let mut child = self.command().spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                OcrError::Unavailable(format!("'{}' not found on PATH", self.binary))
            } else {
                OcrError::Io(e)
            }
        })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| OcrError::Unavailable("child stdin not captured".into()))?;
        let input = image.to_vec();
        let writer = tokio::spawn(async move {
            stdin.write_all(&input).await?;
            stdin.shutdown().await
        });

        let output = child.wait_with_output().await?;
        if let Ok(Err(e)) = writer.await {
            // Usually a broken pipe after tesseract rejected the input; the
            // exit status below carries the real error.
            tracing::debug!("writing image to tesseract failed: {}", e);
        }

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(OcrError::Failed {
                status: output.status.code().unwrap_or(-1),
                stderr: stderr.lines().last().unwrap_or("unknown error").to_string(),
            })
        }
    }
}

#[async_trait]
impl OcrEngine for TesseractCli {
    async fn read_text(&self, image: &[u8]) -> Result<String, OcrError> {
        let format = ImageFormat::sniff(image).ok_or(OcrError::UnsupportedImage)?;
        tracing::debug!(?format, bytes = image.len(), "running tesseract");

        match tokio::time::timeout(self.timeout, self.run(image)).await {
            Ok(result) => result,
            Err(_) => Err(OcrError::Timeout(self.timeout.as_secs())),
        }
    }
}
