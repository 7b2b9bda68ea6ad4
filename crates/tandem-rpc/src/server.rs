//! The serve loop.
//!
//! One line in, one line out. A request is read only after the previous
//! response has been written and flushed.

use std::sync::Arc;

use serde_json::Value;
use tandem_decoding::GenerationUpdate;
use tandem_session::TranslationSession;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn};

use crate::errors::{ProtocolError, Result};
use crate::types::{Rejection, Request, Response, decode_line};

/// Lifecycle of a [`ProtocolServer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServerState {
    /// Loading models.
    Initializing,
    /// Waiting for the next line.
    Ready,
    /// Handling one request.
    Serving,
    /// Done; no further lines are read.
    Terminated,
}

/// How the serve loop ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitReason {
    /// A `shutdown` command was acknowledged.
    Shutdown,
    /// The input stream closed.
    EndOfInput,
    /// Initialization failed and was reported.
    InitFailed,
}

impl ExitReason {
    /// Process exit code for this outcome.
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Shutdown | Self::EndOfInput => 0,
            Self::InitFailed => 1,
        }
    }
}

/// A fatal initialization error, reported once as `init_failed`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InitFailure {
    /// Failing stage, e.g. `ModelLoad`.
    pub kind: String,
    /// Human-readable message.
    pub message: String,
}

impl InitFailure {
    /// Create a failure for `kind`.
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

/// Writes responses for lines read from an input stream.
pub struct ProtocolServer<W> {
    writer: W,
    state: ServerState,
}

impl<W: AsyncWrite + Unpin> ProtocolServer<W> {
    /// Create a server writing responses to `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            state: ServerState::Initializing,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ServerState {
        self.state
    }

    /// Consume the server and return its writer.
    pub fn into_writer(self) -> W {
        self.writer
    }

    /// Initialize with `init` on a blocking thread, then serve `reader`.
    pub async fn run<R, F>(&mut self, reader: R, init: F) -> Result<ExitReason>
    where
        R: AsyncBufRead + Unpin,
        F: FnOnce() -> std::result::Result<TranslationSession, InitFailure> + Send + 'static,
    {
        self.state = ServerState::Initializing;
        let failure = match tokio::task::spawn_blocking(init).await {
            Ok(Ok(session)) => return self.serve(reader, Arc::new(session)).await,
            Ok(Err(failure)) => failure,
            Err(e) => InitFailure::new("Panic", format!("initialization task failed: {e}")),
        };

        error!(kind = %failure.kind, error = %failure.message, "initialization failed");
        self.write(&Response::init_failed(failure.kind, failure.message))
            .await?;
        self.state = ServerState::Terminated;
        Ok(ExitReason::InitFailed)
    }

    /// Announce readiness and serve until shutdown or end of input.
    pub async fn serve<R>(&mut self, mut reader: R, session: Arc<TranslationSession>) -> Result<ExitReason>
    where
        R: AsyncBufRead + Unpin,
    {
        self.write(&Response::ready()).await?;
        self.state = ServerState::Ready;
        info!(aligner = session.has_aligner(), "server ready");

        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                debug!("input closed");
                self.state = ServerState::Terminated;
                return Ok(ExitReason::EndOfInput);
            }

            let response = match std::str::from_utf8(&buf) {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => {
                    self.state = ServerState::Serving;
                    match decode_line(line.trim()) {
                        Ok(Request::Shutdown) => {
                            info!("shutdown requested");
                            self.write(&Response::shutdown()).await?;
                            self.state = ServerState::Terminated;
                            return Ok(ExitReason::Shutdown);
                        }
                        Ok(Request::Translate {
                            text,
                            source_lang,
                            target_lang,
                            request_id,
                        }) => translate(&session, text, source_lang, target_lang, request_id).await,
                        Ok(Request::UpdateSettings { update, request_id }) => {
                            update_settings(&session, &update, request_id)
                        }
                        Err(rejection) => reject(rejection),
                    }
                }
                Err(e) => reject(Rejection::Malformed(ProtocolError::Malformed(e.to_string()))),
            };

            self.write(&response).await?;
            self.state = ServerState::Ready;
        }
    }

    async fn write(&mut self, response: &Response) -> Result<()> {
        let mut line = response.to_line()?;
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

fn reject(rejection: Rejection) -> Response {
    match rejection {
        Rejection::Malformed(error) => {
            warn!(%error, "malformed request line");
            Response::malformed(error.to_string())
        }
        Rejection::Invalid { request_id, error } => {
            warn!(%error, "invalid request");
            Response::failure(error.to_string(), request_id)
        }
    }
}

fn update_settings(
    session: &TranslationSession,
    update: &GenerationUpdate,
    request_id: Value,
) -> Response {
    match session.update_settings(update) {
        Ok(_) => Response::settings_updated(),
        Err(e) => {
            warn!(error = %e, "settings update rejected");
            Response::failure(e.to_string(), request_id)
        }
    }
}

async fn translate(
    session: &Arc<TranslationSession>,
    text: String,
    source_lang: Option<String>,
    target_lang: Option<String>,
    request_id: Value,
) -> Response {
    let languages = session.languages();
    let source = source_lang.unwrap_or_else(|| languages.default_source().to_string());
    let target = target_lang.unwrap_or_else(|| languages.default_target().to_string());

    let worker = Arc::clone(session);
    let result = tokio::task::spawn_blocking(move || {
        worker.translate_and_align(&text, &source, &target)
    })
    .await;

    match result {
        Ok(Ok(translation)) => {
            Response::translation(translation.text, translation.links, request_id)
        }
        Ok(Err(e)) => {
            warn!(error = %e, "translation failed");
            Response::failure(e.to_string(), request_id)
        }
        Err(e) => {
            error!(error = %e, "translation task failed");
            Response::failure(format!("translation task failed: {e}"), request_id)
        }
    }
}
