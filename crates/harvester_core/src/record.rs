use serde::{Deserialize, Serialize};

/// One harvested document as stored in the result file.
///
/// `categories` is owned by the downstream tagger; the harvester writes it
/// empty for new records and carries it through untouched for loaded ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestedRecord {
    pub id: String,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
}

impl HarvestedRecord {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            body: body.into(),
            url: url.into(),
            categories: Vec::new(),
        }
    }
}

/// Result of fetching one identifier's page, after retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// Decoded page content.
    Fetched(String),
    NotFound,
    /// Retries exhausted or a non-retryable failure; carries the last cause.
    TransientFailure(String),
}

/// What happened to one identifier once its page went through extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageResult {
    Extracted(HarvestedRecord),
    ExtractionFailed(String),
    NotFound,
    Failed(String),
}
