pub mod backend;
pub mod classify;
pub mod config;
pub mod export;
pub mod protocol;
pub mod state;
pub mod telemetry;

pub use backend::{BackendDriver, BackendError, BackendKind, ChatBackend, HttpBackend, MockBackend};
pub use classify::{classify, Classified};
pub use config::{ClientSettings, ConfigError};
pub use export::{export_as_delimited_text, CsvExport};
pub use protocol::{ChatReply, ChatRequest, Payload, Record, RecordSet};
pub use state::{ChatMessage, ChatSession, ConversationSnapshot, MessageRole, SendError};
