pub mod events;
pub mod search;
pub mod service;

pub use service::CalendarEventsService;
