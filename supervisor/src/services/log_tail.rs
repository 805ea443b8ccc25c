//! Follow the backend log as it grows

use std::future::Future;
use std::io::SeekFrom;
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWrite, AsyncWriteExt};

use crate::error::{SupervisorError, SupervisorResult};
use shared::{ComponentId, component_debug};

/// `tail -n N -f` over the log sink
#[derive(Debug, Clone)]
pub struct LogFollower {
    path: PathBuf,
    poll_interval: Duration,
    initial_lines: usize,
}

impl LogFollower {
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);
    pub const DEFAULT_INITIAL_LINES: usize = 10;

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            initial_lines: Self::DEFAULT_INITIAL_LINES,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_initial_lines(mut self, initial_lines: usize) -> Self {
        self.initial_lines = initial_lines;
        self
    }

    /// Write the last lines, then stream appended bytes until `until`
    /// resolves. Returns the number of bytes written.
    pub async fn follow<W, F>(&self, out: &mut W, until: F) -> SupervisorResult<u64>
    where
        W: AsyncWrite + Unpin + Send,
        F: Future<Output = ()> + Send,
    {
        if !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            return Err(SupervisorError::LogNotFound { path: self.path.clone() });
        }

        let mut initial = Vec::new();
        File::open(&self.path).await?.read_to_end(&mut initial).await?;
        let mut position = initial.len() as u64;

        let head = last_lines(&initial, self.initial_lines);
        out.write_all(head).await?;
        out.flush().await?;
        let mut written = head.len() as u64;

        tokio::pin!(until);
        loop {
            tokio::select! {
                _ = &mut until => break,
                _ = tokio::time::sleep(self.poll_interval) => {
                    let chunk = self.read_from(&mut position).await?;
                    if !chunk.is_empty() {
                        out.write_all(&chunk).await?;
                        out.flush().await?;
                        written += chunk.len() as u64;
                    }
                }
            }
        }

        Ok(written)
    }

    /// Read everything past `position`, restarting from 0 after truncation
    async fn read_from(&self, position: &mut u64) -> SupervisorResult<Vec<u8>> {
        let len = match tokio::fs::metadata(&self.path).await {
            Ok(meta) => meta.len(),
            // Removed between polls; wait for it to come back
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        if len < *position {
            component_debug!(ComponentId::current(), "🔁 Log truncated, following from start");
            *position = 0;
        }
        if len == *position {
            return Ok(Vec::new());
        }

        let mut file = File::open(&self.path).await?;
        file.seek(SeekFrom::Start(*position)).await?;
        let mut chunk = Vec::new();
        file.read_to_end(&mut chunk).await?;
        *position += chunk.len() as u64;
        Ok(chunk)
    }
}

/// Slice holding the last `n` lines of `bytes` (a trailing newline does not
/// start a new line)
fn last_lines(bytes: &[u8], n: usize) -> &[u8] {
    if n == 0 || bytes.is_empty() {
        return &bytes[bytes.len()..];
    }

    let body = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    let mut seen = 0;
    for (idx, byte) in body.iter().enumerate().rev() {
        if *byte == b'\n' {
            seen += 1;
            if seen == n {
                return &bytes[idx + 1..];
            }
        }
    }
    bytes
}
