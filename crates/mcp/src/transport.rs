// Line-delimited JSON transport: one JSON document per line, in and out

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{trace, warn};

/// Reads lines from an input stream and writes lines to an output stream.
///
/// Generic over reader/writer so tests can drive it from memory.
pub struct LineTransport<R, W> {
    reader: BufReader<R>,
    writer: W,
}

impl<R, W> LineTransport<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer,
        }
    }

    /// Next line with surrounding whitespace trimmed, `None` at end of stream.
    ///
    /// Lines that are not valid UTF-8 are logged and skipped.
    pub async fn read_line(&mut self) -> std::io::Result<Option<String>> {
        loop {
            let mut buf = Vec::new();
            if self.reader.read_until(b'\n', &mut buf).await? == 0 {
                return Ok(None);
            }

            match String::from_utf8(buf) {
                Ok(line) => {
                    let trimmed = line.trim();
                    trace!(len = trimmed.len(), "read line");
                    return Ok(Some(trimmed.to_string()));
                }
                Err(e) => {
                    warn!(len = e.as_bytes().len(), "skipping line that is not valid UTF-8");
                }
            }
        }
    }

    /// Write one line and flush.
    pub async fn write_line(&mut self, message: &str) -> std::io::Result<()> {
        trace!(len = message.len(), "writing line");
        self.writer.write_all(message.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await
    }

    pub fn into_writer(self) -> W {
        self.writer
    }
}
