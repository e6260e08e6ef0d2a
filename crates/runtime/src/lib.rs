pub mod event_bus;
pub mod fetch_queue;

pub use event_bus::*;
pub use fetch_queue::*;
