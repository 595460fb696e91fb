//! Report DTOs for resolved URIs and load outcomes.

use serde::Serialize;

use crate::domain::entities::{DisplayOutcome, ImageFrom, UriInfo};

/// Serializable view of a resolved URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedUri {
    /// The URI as given.
    pub uri: String,
    /// Model family.
    pub kind: String,
    /// URI without its scheme.
    pub content: String,
    /// Disk-cache key.
    pub disk_cache_key: String,
    /// Whether bytes come from the network.
    pub from_net: bool,
}

impl From<&UriInfo> for ResolvedUri {
    fn from(info: &UriInfo) -> Self {
        Self {
            uri: info.uri().to_string(),
            kind: info.kind().to_string(),
            content: info.content().to_string(),
            disk_cache_key: info.disk_cache_key().to_string(),
            from_net: info.is_from_net(),
        }
    }
}

/// Terminal status of one loaded URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    /// Image decoded.
    Completed,
    /// Loading failed.
    Failed,
    /// Request cancelled.
    Cancelled,
}

/// Serializable summary of one load.
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    /// The URI requested.
    pub uri: String,
    /// Terminal status.
    pub status: LoadStatus,
    /// Where the bytes came from, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<ImageFrom>,
    /// Decoded size as `WxH`, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    /// Failure or cancellation reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// File the image was written to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl LoadReport {
    /// Summarizes `outcome` for `uri`.
    #[must_use]
    pub fn new(uri: impl Into<String>, outcome: &DisplayOutcome) -> Self {
        let uri = uri.into();
        match outcome {
            DisplayOutcome::Completed(image) => Self {
                uri,
                status: LoadStatus::Completed,
                from: Some(image.from),
                size: Some(image.size().to_string()),
                reason: None,
                output: None,
            },
            DisplayOutcome::Failed(error) => Self {
                uri,
                status: LoadStatus::Failed,
                from: None,
                size: None,
                reason: Some(error.to_string()),
                output: None,
            },
            DisplayOutcome::Cancelled(cause) => Self {
                uri,
                status: LoadStatus::Cancelled,
                from: None,
                size: None,
                reason: Some(cause.to_string()),
                output: None,
            },
        }
    }
}

impl LoadReport {
    /// Report for a URI that never became a request.
    #[must_use]
    pub fn rejected(uri: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            status: LoadStatus::Failed,
            from: None,
            size: None,
            reason: Some(reason.into()),
            output: None,
        }
    }
}

impl std::fmt::Display for LoadReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            LoadStatus::Completed => {
                write!(f, "ok       {}", self.uri)?;
                if let (Some(from), Some(size)) = (self.from, &self.size) {
                    write!(f, " ({size} from {from})")?;
                }
                if let Some(output) = &self.output {
                    write!(f, " -> {output}")?;
                }
                Ok(())
            }
            LoadStatus::Failed => write!(
                f,
                "failed   {}: {}",
                self.uri,
                self.reason.as_deref().unwrap_or("unknown error")
            ),
            LoadStatus::Cancelled => write!(
                f,
                "skipped  {}: {}",
                self.uri,
                self.reason.as_deref().unwrap_or("cancelled")
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::CancelCause;
    use crate::infrastructure::uri::UriModelRegistry;

    #[test]
    fn test_resolved_uri_json() {
        let info = UriModelRegistry::with_defaults()
            .resolve("https://a.com/b.png")
            .unwrap();
        let json = serde_json::to_value(ResolvedUri::from(&info)).unwrap();
        assert_eq!(json["kind"], "network");
        assert_eq!(json["content"], "a.com/b.png");
        assert_eq!(json["from_net"], true);
    }

    #[test]
    fn test_cancelled_report() {
        let report = LoadReport::new(
            "asset://a.png",
            &DisplayOutcome::Cancelled(CancelCause::RequestLevelIsLocal),
        );
        assert_eq!(report.status, LoadStatus::Cancelled);
        assert!(report.to_string().starts_with("skipped  asset://a.png"));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "cancelled");
        assert!(json.get("from").is_none());
    }
}
