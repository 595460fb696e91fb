//! Application layer with services, use cases and DTOs.

/// Data transfer objects.
pub mod dto;
/// Request dispatching and lifecycle tracking.
pub mod services;
/// Use case implementations.
pub mod use_cases;

pub use dto::{LoadReport, LoadStatus, ResolvedUri};
pub use services::{DisplayPorts, DisplayService, DisplayServiceConfig, DisplayTicket, Progress};
pub use use_cases::{LoadImagesUseCase, ResolveUriUseCase};
