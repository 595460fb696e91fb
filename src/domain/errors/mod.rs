//! Domain error types.

mod display_error;
mod request_error;
mod source_error;
mod uri_error;

pub use display_error::DisplayError;
pub use request_error::{DeliveryError, RequestError};
pub use source_error::SourceError;
pub use uri_error::{RegistryError, UriError};
