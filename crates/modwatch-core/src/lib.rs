//! modwatch-core - Core library for modwatch
//!
//! Provides the keyword taxonomy, safety checker, moderation state store,
//! and event bus behind the HTTP and realtime layers.

pub mod checker;
pub mod error;
pub mod event;
pub mod store;
pub mod taxonomy;

pub use checker::{check_safety, ModerationResult};
pub use error::ModerationError;
pub use event::{ChannelEvent, EventBus, MessageResponse};
pub use store::{FlaggedMessage, FocusSnapshot, ModerationStore, StatsSnapshot};
pub use taxonomy::{all_keywords, categories};
