//! Response protocol for a bilingual (English/Hebrew) language tutor.
//!
//! Takes the raw text a language model returns for one conversational turn,
//! splits it into display sections, decodes its learning blocks and renders
//! its markdown, with fallbacks at every step so a turn always yields a message.

pub mod assembler;
pub mod config;
pub mod error;
pub mod parsing;
pub mod session_io;
pub mod types {
    pub mod chat;
    pub mod provider;
    pub mod session;
}

pub use assembler::{assemble, assemble_response, ErrorClass};
pub use config::Config;
pub use error::{ProviderError, TurnError, TutorError};
pub use session_io::{JsonDirSessionStore, SessionStore};
pub use types::chat::{BlockType, ChatMessage, LearningBlock, ParsedSections};
