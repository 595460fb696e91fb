//! Data transfer objects for the application layer.

mod uri_dto;

pub use uri_dto::{LoadReport, LoadStatus, ResolvedUri};
