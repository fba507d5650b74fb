pub mod client;
pub mod config;
pub mod conversation;
pub mod decode;
pub mod error;
pub mod session;
pub mod state;
pub mod welcome;

// Re-export main types for convenience
pub use client::{ByteStream, ChatBackend, ChatRequest, RagClient};
pub use config::Config;
pub use conversation::{
    stream_reply, Conversation, Rejection, StreamEvent, Submission, SubmitOutcome, APOLOGY, STOPPED,
};
pub use error::StreamError;
pub use session::{OsRandom, RandomSource, SessionId};
pub use state::{ChatMessage, ChatRole, Transcript, GREETING};
pub use welcome::WelcomeState;
