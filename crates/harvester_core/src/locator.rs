use crate::Identifier;

const PLACEHOLDER: &str = "{id}";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocatorError {
    #[error("locator template {0:?} has no {{id}} placeholder")]
    MissingPlaceholder(String),
    #[error("locator template {template:?} does not produce a valid url: {message}")]
    InvalidUrl { template: String, message: String },
}

/// Templated locator mapping an [`Identifier`] to the URL of its page,
/// e.g. `https://example.com/prompt/{id}.html`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocator {
    template: String,
}

impl SourceLocator {
    pub fn new(template: impl Into<String>) -> Result<Self, LocatorError> {
        let template = template.into();
        if !template.contains(PLACEHOLDER) {
            return Err(LocatorError::MissingPlaceholder(template));
        }
        let sample = template.replace(PLACEHOLDER, "0");
        url::Url::parse(&sample).map_err(|err| LocatorError::InvalidUrl {
            template: template.clone(),
            message: err.to_string(),
        })?;
        Ok(Self { template })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn url_for(&self, id: &Identifier) -> String {
        self.template.replace(PLACEHOLDER, &id.key())
    }
}
