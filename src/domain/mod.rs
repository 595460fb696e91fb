//! Domain layer with request entities, error types and port definitions.
//!
//! Nothing in this layer performs I/O on its own or logs; adapters in
//! [`crate::infrastructure`] do both.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;

pub use entities::{DisplayOutcome, DisplayRequest, DisplayRequestConfig, UriInfo};
pub use errors::{DisplayError, RequestError, SourceError, UriError};
pub use ports::{DataSource, DisplayListener, TargetBinding, UriModel};
