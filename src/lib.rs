//! Findora - conversational search front-end
//!
//! This library provides the pieces of the Findora assistant:
//! - Completion client for an OpenAI-compatible chat API (Groq by default)
//! - Persisted query history and topic suggestions
//! - Voice input (capture, phrase detection, STT) and spoken answers (TTS)
//! - A terminal front-end over an explicit session state
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  Terminal front-end                  │
//! │   prompt  │  :voice  │  :speak  │  :topics  │  ...  │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                     Session                          │
//! │   Completion  │  History  │  Recommender            │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                      Voice                           │
//! │   Listener (capture + STT)  │  SpeechController     │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod completion;
pub mod config;
pub mod error;
pub mod history;
pub mod recommend;
pub mod repl;
pub mod session;
pub mod setup;
pub mod voice;

pub use completion::{Completion, CompletionClient};
pub use config::Config;
pub use error::{Error, Result};
pub use history::{HistoryEntry, HistoryStore};
pub use recommend::{Recommendations, TOPIC_VOCABULARY, recommend};
pub use session::{Answer, DOWNLOAD_FILE_NAME, Session};
