use harvester_core::{HarvestedRecord, Identifier};
use scraper::{ElementRef, Html, Node, Selector};

use crate::text::{has_tag, inline_text, is_control, line_text};

/// Elements stripped from the generic container before taking its text.
const CONTAINER_STRIP_TAGS: &[&str] = &["script", "style", "input", "textarea", "select", "button"];
const BODY_STRIP_TAGS: &[&str] = &["script", "style", "noscript", "template"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorConfig {
    /// Container marker of a structured content block.
    pub section_selector: String,
    /// Label element inside a block.
    pub heading_selector: String,
    /// Page title marker; also excluded from block content.
    pub title_marker_selector: String,
    /// Broader container used when no structured block exists.
    pub container_selector: String,
    /// Bodies shorter than this many characters are rejected.
    pub min_body_chars: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            section_selector: ".box-bun".to_string(),
            heading_selector: "h2".to_string(),
            title_marker_selector: ".box-title".to_string(),
            container_selector: ".form-content".to_string(),
            min_body_chars: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid selector {selector:?}: {message}")]
pub struct SelectorError {
    pub selector: String,
    pub message: String,
}

fn parse_selector(raw: &str) -> Result<Selector, SelectorError> {
    Selector::parse(raw).map_err(|err| SelectorError {
        selector: raw.to_string(),
        message: err.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionFailure {
    #[error("No title found")]
    MissingTitle,
    #[error("No extractable content")]
    NoContent,
    #[error("Body too short ({chars} chars, minimum {min})")]
    BodyTooShort { chars: usize, min: usize },
}

/// One step of the body fallback chain.
pub trait SectionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Content sections found on the page, or `None` to defer to the next strategy.
    fn try_extract(&self, doc: &Html) -> Option<Vec<String>>;
}

/// Labelled content blocks: each block becomes `"[label]\ncontent"`.
pub struct StructuredSections {
    section: Selector,
    heading: Selector,
    title_marker: Selector,
}

impl StructuredSections {
    pub fn new(config: &ExtractorConfig) -> Result<Self, SelectorError> {
        Ok(Self {
            section: parse_selector(&config.section_selector)?,
            heading: parse_selector(&config.heading_selector)?,
            title_marker: parse_selector(&config.title_marker_selector)?,
        })
    }

    fn block_text(&self, block: ElementRef<'_>) -> Option<String> {
        let heading = block.select(&self.heading).next();
        let label = heading
            .map(|h| inline_text(h, &|_| false))
            .unwrap_or_default();
        let heading_id = heading.map(|h| h.id());

        let exclude = |el: ElementRef<'_>| {
            Some(el.id()) == heading_id || is_control(el) || self.title_marker.matches(&el)
        };

        // Textarea bodies are the template text itself, so they are kept.
        let parts: Vec<String> = block
            .children()
            .filter_map(|child| match child.value() {
                Node::Text(text) => {
                    let trimmed = text.trim();
                    (!trimmed.is_empty()).then(|| trimmed.to_string())
                }
                Node::Element(_) => {
                    let el = ElementRef::wrap(child)?;
                    if exclude(el) {
                        return None;
                    }
                    let text = inline_text(el, &exclude);
                    (!text.is_empty()).then_some(text)
                }
                _ => None,
            })
            .collect();
        let content = parts.join("\n");

        match (label.is_empty(), content.is_empty()) {
            (false, false) => Some(format!("[{label}]\n{content}")),
            (false, true) => Some(format!("[{label}]")),
            (true, false) => Some(content),
            (true, true) => None,
        }
    }
}

impl SectionStrategy for StructuredSections {
    fn name(&self) -> &'static str {
        "structured-sections"
    }

    fn try_extract(&self, doc: &Html) -> Option<Vec<String>> {
        let sections: Vec<String> = doc
            .select(&self.section)
            .filter_map(|block| self.block_text(block))
            .collect();
        (!sections.is_empty()).then_some(sections)
    }
}

/// Whole text of a known content container, one fragment per line.
pub struct ContainerText {
    container: Selector,
}

impl ContainerText {
    pub fn new(config: &ExtractorConfig) -> Result<Self, SelectorError> {
        Ok(Self {
            container: parse_selector(&config.container_selector)?,
        })
    }
}

impl SectionStrategy for ContainerText {
    fn name(&self) -> &'static str {
        "generic-container"
    }

    fn try_extract(&self, doc: &Html) -> Option<Vec<String>> {
        let container = doc.select(&self.container).next()?;
        let text = line_text(container, &|el| has_tag(el, CONTAINER_STRIP_TAGS));
        (!text.is_empty()).then(|| vec![text])
    }
}

/// Last resort: every line of text in `<body>`.
pub struct BodyText {
    body: Selector,
}

impl BodyText {
    pub fn new() -> Result<Self, SelectorError> {
        Ok(Self {
            body: parse_selector("body")?,
        })
    }
}

impl SectionStrategy for BodyText {
    fn name(&self) -> &'static str {
        "page-body"
    }

    fn try_extract(&self, doc: &Html) -> Option<Vec<String>> {
        let body = doc.select(&self.body).next()?;
        let text = line_text(body, &|el| has_tag(el, BODY_STRIP_TAGS));
        (!text.is_empty()).then(|| vec![text])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub record: HarvestedRecord,
    /// Name of the strategy that produced the body.
    pub strategy: &'static str,
}

/// Builds a [`HarvestedRecord`] from page HTML: title lookup plus an ordered
/// strategy chain for the body, first success wins.
pub struct RecordExtractor {
    title_selectors: Vec<Selector>,
    strategies: Vec<Box<dyn SectionStrategy>>,
    min_body_chars: usize,
}

impl RecordExtractor {
    pub fn new(config: &ExtractorConfig) -> Result<Self, SelectorError> {
        let title_selectors = vec![
            parse_selector(&config.title_marker_selector)?,
            parse_selector("title")?,
            parse_selector("h1")?,
        ];
        let strategies: Vec<Box<dyn SectionStrategy>> = vec![
            Box::new(StructuredSections::new(config)?),
            Box::new(ContainerText::new(config)?),
            Box::new(BodyText::new()?),
        ];
        Ok(Self::with_strategies(
            title_selectors,
            strategies,
            config.min_body_chars,
        ))
    }

    pub fn with_strategies(
        title_selectors: Vec<Selector>,
        strategies: Vec<Box<dyn SectionStrategy>>,
        min_body_chars: usize,
    ) -> Self {
        Self {
            title_selectors,
            strategies,
            min_body_chars,
        }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn extract(
        &self,
        html: &str,
        id: &Identifier,
        url: &str,
    ) -> Result<Extraction, ExtractionFailure> {
        let doc = Html::parse_document(html);
        let title = self
            .resolve_title(&doc)
            .ok_or(ExtractionFailure::MissingTitle)?;

        let (strategy, sections) = self
            .strategies
            .iter()
            .find_map(|strategy| {
                strategy
                    .try_extract(&doc)
                    .filter(|sections| !sections.is_empty())
                    .map(|sections| (strategy.name(), sections))
            })
            .ok_or(ExtractionFailure::NoContent)?;

        let body = sections.join("\n\n");
        let chars = body.chars().count();
        if chars < self.min_body_chars {
            return Err(ExtractionFailure::BodyTooShort {
                chars,
                min: self.min_body_chars,
            });
        }

        Ok(Extraction {
            record: HarvestedRecord::new(id.key(), title, body, url),
            strategy,
        })
    }

    fn resolve_title(&self, doc: &Html) -> Option<String> {
        self.title_selectors.iter().find_map(|selector| {
            doc.select(selector)
                .next()
                .map(|el| inline_text(el, &|_| false))
                .filter(|title| !title.is_empty())
        })
    }
}
