use std::io::Write;
use std::sync::Mutex;

use super::{Callback, ModelNewTokenInput};
use crate::error::{AgentError, Result};

/// Writes every streamed token to a sink as it arrives.
pub struct StreamWriterHandler<W: Write + Send> {
    writer: Mutex<W>,
}

impl StreamWriterHandler<std::io::Stdout> {
    /// Write tokens to standard output.
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> StreamWriterHandler<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Recover the sink.
    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

impl<W: Write + Send> Callback for StreamWriterHandler<W> {
    fn on_model_new_token(&self, input: ModelNewTokenInput<'_>) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| AgentError::Callback("stream writer lock poisoned".into()))?;
        writer.write_all(input.token.as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}

impl<W: Write + Send> std::fmt::Debug for StreamWriterHandler<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamWriterHandler").finish_non_exhaustive()
    }
}
