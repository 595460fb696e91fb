//! Domain entity definitions.

mod download;
mod image;
mod outcome;
mod request;
mod uri_info;

pub use download::{DownloadPayload, DownloadResult};
pub use image::{ImageFrom, ImageSize, LoadedImage, MemoryCacheKey};
pub use outcome::{CancelCause, DisplayOutcome, RequestState};
pub use request::{
    DisplayOptions, DisplayRequest, DisplayRequestConfig, RequestId, RequestLevel, TargetId,
};
pub use uri_info::UriInfo;
