//! Application services.

pub mod display_service;
pub mod request_handle;

pub use display_service::{DisplayPorts, DisplayService, DisplayServiceConfig};
pub use request_handle::{DisplayTicket, Progress, RequestHandle};
