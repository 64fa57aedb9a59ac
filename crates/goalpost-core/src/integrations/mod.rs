//! Outbound services: the calendar that mirrors goals and the chat channel
//! that carries confirmations.

pub mod google;
pub mod traits;
pub mod whatsapp;

pub use google::GoogleCalendar;
pub use traits::{CalendarEvent, CalendarSink, MessageSender};
pub use whatsapp::WhatsAppClient;
