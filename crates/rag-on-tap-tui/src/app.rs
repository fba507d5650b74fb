use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use ratatui::layout::Rect;
use rag_on_tap_core::{
    stream_reply, ChatBackend, Config, Conversation, Rejection, SessionId, StreamEvent,
    SubmitOutcome, WelcomeState,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::tui::AppEvent;

/// How long shutdown waits for a cancelled reply task to wind down.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendStatus {
    Checking,
    Online,
    Offline,
}

pub struct App {
    pub should_quit: bool,

    // Chat state
    pub conversation: Conversation,
    pub input: String,
    pub input_cursor: usize, // cursor position in input, in chars
    pub reply_task: Option<JoinHandle<()>>,

    // Transcript scrolling (updated during render)
    pub chat_scroll: u16,
    pub max_chat_scroll: u16,
    pub follow_bottom: bool,
    pub chat_area: Option<Rect>,

    // Animation state
    pub animation_frame: u8, // 0-2 for the typing indicator

    // First-run modal
    pub welcome: WelcomeState,
    pub config_path: Option<PathBuf>,

    // Header
    pub model_label: String,
    pub backend_status: BackendStatus,

    backend: Arc<dyn ChatBackend>,
    events: mpsc::UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(
        config: &Config,
        config_path: Option<PathBuf>,
        backend: Arc<dyn ChatBackend>,
        session_id: SessionId,
        events: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            should_quit: false,

            conversation: Conversation::new(session_id),
            input: String::new(),
            input_cursor: 0,
            reply_task: None,

            chat_scroll: 0,
            max_chat_scroll: 0,
            follow_bottom: true,
            chat_area: None,

            animation_frame: 0,

            welcome: config.welcome,
            config_path,

            model_label: config.model_label.clone(),
            backend_status: BackendStatus::Checking,

            backend,
            events,
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.conversation.is_streaming()
    }

    /// Send control is live only for non-blank input while idle.
    pub fn can_send(&self) -> bool {
        !self.input.trim().is_empty() && !self.is_streaming()
    }

    /// Submit the current input and start streaming the reply in the
    /// background. Returns false when the submission was rejected.
    pub fn submit(&mut self) -> bool {
        let submission = match self.conversation.submit(&self.input) {
            SubmitOutcome::Accepted(submission) => submission,
            SubmitOutcome::Rejected(Rejection::Empty) => return false,
            SubmitOutcome::Rejected(Rejection::InFlight) => {
                tracing::debug!("ignoring submit while a reply is streaming");
                return false;
            }
        };

        self.input.clear();
        self.input_cursor = 0;
        self.follow_bottom = true;

        let backend = Arc::clone(&self.backend);
        let tx = self.events.clone();
        self.reply_task = Some(tokio::spawn(async move {
            stream_reply(backend.as_ref(), submission.request, submission.cancel, |event| {
                let _ = tx.send(AppEvent::Stream(event));
            })
            .await;
        }));
        true
    }

    pub fn apply_stream_event(&mut self, event: StreamEvent) {
        if self.conversation.apply(event) {
            self.follow_bottom = true;
        }
        if !self.conversation.is_streaming() {
            self.reply_task = None;
            self.animation_frame = 0;
        }
    }

    pub fn stop_reply(&mut self) -> bool {
        self.conversation.cancel()
    }

    /// Probe the backend once so the header can show whether it is up.
    pub fn probe_health(&self) {
        let backend = Arc::clone(&self.backend);
        let tx = self.events.clone();
        tokio::spawn(async move {
            let status = match backend.health().await {
                Ok(()) => BackendStatus::Online,
                Err(err) => {
                    tracing::warn!(%err, "backend health check failed");
                    BackendStatus::Offline
                }
            };
            let _ = tx.send(AppEvent::Health(status));
        });
    }

    pub fn dismiss_welcome(&mut self) {
        if !self.welcome.is_open() {
            return;
        }
        self.welcome = self.welcome.dismiss();
        if let Some(path) = &self.config_path {
            if let Err(err) = Config::save_welcome(path, self.welcome) {
                tracing::warn!(%err, path = %path.display(), "could not persist welcome flag");
            }
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_streaming() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.follow_bottom = false;
        self.chat_scroll = self.chat_scroll.min(self.max_chat_scroll).saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines);
        if self.chat_scroll >= self.max_chat_scroll {
            self.chat_scroll = self.max_chat_scroll;
            self.follow_bottom = true;
        }
    }

    pub fn page_size(&self) -> u16 {
        self.chat_area
            .map(|area| (area.height / 2).max(1))
            .unwrap_or(10)
    }

    /// Cancel any reply in flight and give its task a moment to finish.
    pub async fn shutdown(&mut self) {
        self.conversation.cancel();
        if let Some(task) = self.reply_task.take() {
            if tokio::time::timeout(SHUTDOWN_GRACE, task).await.is_err() {
                tracing::warn!("reply task did not stop in time");
            }
        }
    }

    // Input editing helpers (cursor is a char index)

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.input, self.input_cursor);
        self.input.insert(byte_pos, c);
        self.input_cursor += 1;
    }

    pub fn delete_before_cursor(&mut self) {
        if self.input_cursor > 0 {
            self.input_cursor -= 1;
            let byte_pos = char_to_byte_index(&self.input, self.input_cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn delete_at_cursor(&mut self) {
        if self.input_cursor < self.input.chars().count() {
            let byte_pos = char_to_byte_index(&self.input, self.input_cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.input_cursor = self.input_cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.input.chars().count();
        self.input_cursor = (self.input_cursor + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.input_cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.input_cursor = self.input.chars().count();
    }

    /// (row, column) of the cursor inside the multi-line input.
    pub fn cursor_row_col(&self) -> (usize, usize) {
        let before: String = self.input.chars().take(self.input_cursor).collect();
        let row = before.matches('\n').count();
        let col = before.rsplit('\n').next().map(|l| l.chars().count()).unwrap_or(0);
        (row, col)
    }
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}
