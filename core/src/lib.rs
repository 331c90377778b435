//! Synergy's provider-agnostic core: model registry, context stack,
//! conversation log, provider dispatcher, transport, and session I/O.

pub mod convo;
pub mod error;
pub mod models;
pub mod providers;
pub mod session;
pub mod stack;
pub mod transport;

pub use convo::{ConversationLog, ConversationTurn};
pub use error::SynergyError;
pub use models::{ModelRecord, ModelRegistry, Provider};
pub use providers::Dispatcher;
pub use session::{default_dump_filename, dump_xml, parse_dump, LoadedSession};
pub use stack::{AttachmentItem, ContextStack};
pub use transport::TransportConfig;
