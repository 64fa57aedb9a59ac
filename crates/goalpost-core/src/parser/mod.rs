//! Natural-language reminder parsing.
//!
//! - [`TimeExpressionResolver`]: text + now -> offset, never fails
//! - [`ReminderComposer`]: text + now -> [`ParsedReminder`]

mod composer;
mod reminder;
pub mod time_expr;

pub use composer::{ReminderComposer, ReminderDefaults};
pub use reminder::{
    event_duration, ParsedReminder, DEFAULT_REMINDER_LEAD_MINUTES, DEFAULT_TIME_ZONE,
    EVENT_DURATION_MINUTES, TITLE_PREFIX,
};
pub use time_expr::{default_offset, TimeExpressionResolver, DEFAULT_OFFSET_MINUTES};
