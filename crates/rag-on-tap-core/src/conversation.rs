//! Streaming transcript reducer.
//!
//! [`Conversation`] owns the transcript and the in-flight flag. A submission
//! opens an exchange and hands back a [`Submission`]; the caller runs
//! [`stream_reply`] somewhere (usually a spawned task) and feeds every
//! [`StreamEvent`] it emits back through [`Conversation::apply`]. The stream
//! task never touches the transcript itself.

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::client::{ChatBackend, ChatRequest};
use crate::decode::Utf8ChunkDecoder;
use crate::error::StreamError;
use crate::session::SessionId;
use crate::state::{ChatMessage, ReplySlot, Transcript};

/// Shown in place of a reply whose stream failed.
pub const APOLOGY: &str = "I'm sorry, I lost my connection to the cellar. Please try again.";

/// Shown when the user stopped a reply before any text arrived.
pub const STOPPED: &str = "*(stopped)*";

#[derive(Debug)]
pub enum StreamEvent {
    /// Everything received so far, not just the latest chunk.
    Progress { generation: u64, text: String },
    Finished { generation: u64, text: String },
    Failed { generation: u64, error: StreamError },
    Cancelled { generation: u64 },
}

impl StreamEvent {
    pub fn generation(&self) -> u64 {
        match self {
            StreamEvent::Progress { generation, .. }
            | StreamEvent::Finished { generation, .. }
            | StreamEvent::Failed { generation, .. }
            | StreamEvent::Cancelled { generation } => *generation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Empty,
    InFlight,
}

/// What the caller needs to run the reply stream.
#[derive(Debug)]
pub struct Submission {
    pub request: ChatRequest,
    pub cancel: CancellationToken,
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Accepted(Submission),
    Rejected(Rejection),
}

#[derive(Debug)]
struct Pending {
    slot: ReplySlot,
    cancel: CancellationToken,
}

#[derive(Debug)]
pub struct Conversation {
    transcript: Transcript,
    session_id: SessionId,
    pending: Option<Pending>,
    generation: u64,
}

impl Conversation {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            transcript: Transcript::new(),
            session_id,
            pending: None,
            generation: 0,
        }
    }

    pub fn turns(&self) -> &[ChatMessage] {
        self.transcript.turns()
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn is_streaming(&self) -> bool {
        self.pending.is_some()
    }

    /// Index of the reply that is still being written, if any.
    pub fn pending_index(&self) -> Option<usize> {
        self.pending.as_ref().map(|pending| pending.slot.index())
    }

    pub fn submit(&mut self, text: &str) -> SubmitOutcome {
        if text.trim().is_empty() {
            return SubmitOutcome::Rejected(Rejection::Empty);
        }
        if self.pending.is_some() {
            return SubmitOutcome::Rejected(Rejection::InFlight);
        }

        self.generation += 1;
        let slot = self.transcript.push_exchange(text, self.generation);
        let cancel = CancellationToken::new();
        self.pending = Some(Pending {
            slot,
            cancel: cancel.clone(),
        });

        tracing::info!(
            generation = self.generation,
            chars = text.chars().count(),
            "submitting message"
        );

        SubmitOutcome::Accepted(Submission {
            request: ChatRequest {
                message: text.to_string(),
                session_id: self.session_id.clone(),
                generation: self.generation,
            },
            cancel,
        })
    }

    /// Fold one stream event into the transcript. Returns true when the
    /// transcript changed and should be redrawn.
    pub fn apply(&mut self, event: StreamEvent) -> bool {
        let current = self.pending.as_ref().map(|pending| pending.slot.generation());
        if current != Some(event.generation()) {
            tracing::debug!(
                event_generation = event.generation(),
                ?current,
                "dropping stale stream event"
            );
            return false;
        }

        match event {
            StreamEvent::Progress { text, .. } => {
                if let Some(pending) = &self.pending {
                    self.transcript.set_reply(&pending.slot, text);
                }
            }
            StreamEvent::Finished { generation, text } => {
                if let Some(pending) = self.pending.take() {
                    tracing::info!(generation, chars = text.chars().count(), "reply finished");
                    self.transcript.set_reply(&pending.slot, text);
                }
            }
            StreamEvent::Failed { generation, error } => {
                if let Some(pending) = self.pending.take() {
                    tracing::error!(generation, %error, "reply stream failed");
                    self.transcript.set_reply(&pending.slot, APOLOGY);
                }
            }
            StreamEvent::Cancelled { generation } => {
                if let Some(pending) = self.pending.take() {
                    tracing::info!(generation, "reply stopped by user");
                    if self.transcript.reply(&pending.slot).is_some_and(str::is_empty) {
                        self.transcript.set_reply(&pending.slot, STOPPED);
                    }
                }
            }
        }
        true
    }

    /// Ask the in-flight stream to stop. The reply is finalized when the
    /// stream task reports back with [`StreamEvent::Cancelled`].
    pub fn cancel(&self) -> bool {
        match &self.pending {
            Some(pending) => {
                pending.cancel.cancel();
                true
            }
            None => false,
        }
    }
}

/// Open the reply stream for `request` and report its progress through
/// `emit` until it ends, fails or `cancel` fires.
pub async fn stream_reply<F>(
    backend: &dyn ChatBackend,
    request: ChatRequest,
    cancel: CancellationToken,
    mut emit: F,
) where
    F: FnMut(StreamEvent),
{
    let generation = request.generation;

    let opened = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            emit(StreamEvent::Cancelled { generation });
            return;
        }
        opened = backend.open_stream(&request) => opened,
    };

    let mut body = match opened {
        Ok(body) => body,
        Err(error) => {
            emit(StreamEvent::Failed { generation, error });
            return;
        }
    };

    tracing::debug!(generation, "reply stream opened");

    let mut decoder = Utf8ChunkDecoder::new();
    let mut text = String::new();

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                emit(StreamEvent::Cancelled { generation });
                return;
            }
            next = body.next() => next,
        };

        match next {
            Some(Ok(chunk)) => {
                let piece = decoder.decode(&chunk);
                if piece.is_empty() {
                    continue;
                }
                text.push_str(&piece);
                emit(StreamEvent::Progress {
                    generation,
                    text: text.clone(),
                });
            }
            Some(Err(error)) => {
                emit(StreamEvent::Failed { generation, error });
                return;
            }
            None => {
                text.push_str(&decoder.finish());
                emit(StreamEvent::Finished { generation, text });
                return;
            }
        }
    }
}
