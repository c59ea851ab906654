pub mod config;
pub mod error;
pub mod types;

pub use config::{ConversationConfig, CorpusConfig, GeneralConfig, QuillConfig};
pub use error::{QuillError, Result};
pub use types::*;
