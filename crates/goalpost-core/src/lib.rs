//! # Goalpost Core Library
//!
//! Turns free-text reminder requests ("remind me to call John in 2 hours")
//! into structured, time-bounded goals. The CLI binary and any HTTP front
//! end are thin layers over this crate.
//!
//! ## Architecture
//!
//! - **Parser**: time-phrase resolution and reminder composition
//! - **Extraction**: pluggable task and entity extractors
//! - **Storage**: SQLite goal table and TOML configuration
//! - **Integrations**: Google Calendar sink and WhatsApp sender
//! - **API / Chat**: request routing and webhook glue over [`GoalService`]
//!
//! ## Key Components
//!
//! - [`TimeExpressionResolver`]: text + now -> offset, never fails
//! - [`ReminderComposer`]: text + now -> [`ParsedReminder`]
//! - [`GoalService`]: goal lifecycle over [`GoalDb`]
//! - [`Config`]: application configuration management

pub mod api;
pub mod chat;
pub mod error;
pub mod extraction;
pub mod goal;
pub mod integrations;
pub mod parser;
pub mod service;
pub mod storage;

pub use api::{handle_request, ApiRequest, ApiResponse};
pub use chat::{ChatHandler, IncomingMessage, REPHRASE_HINT};
pub use error::{
    ConfigError, CoreError, DatabaseError, ExtractionError, ParseError, ValidationError,
    WebhookError,
};
pub use extraction::{EntityExtractor, EntityMap, TaskExtractor};
pub use goal::{Goal, GoalDraft, GoalField};
pub use integrations::{CalendarEvent, CalendarSink, MessageSender};
pub use parser::{ParsedReminder, ReminderComposer, ReminderDefaults, TimeExpressionResolver};
pub use service::GoalService;
pub use storage::{Config, GoalDb};
