use harvester_core::Identifier;
use harvester_engine::{
    decode_forced, resolve_encoding, ExtractionFailure, ExtractorConfig, RecordExtractor,
    SectionStrategy,
};
use pretty_assertions::assert_eq;
use scraper::{Html, Selector};

const URL: &str = "https://example.com/prompt/001.html";

fn extractor() -> RecordExtractor {
    RecordExtractor::new(&ExtractorConfig::default()).unwrap()
}

fn id() -> Identifier {
    Identifier::new(1, 3)
}

#[test]
fn structured_sections_become_labelled_segments() {
    let html = r#"
    <html><head><title>Page Title</title></head><body>
    <div class="form-content">
      <div class="box-bun">
        <div class="box-title">Example</div>
        <h2>Intro</h2>
        Hello
        <button>Copy</button>
      </div>
    </div>
    </body></html>
    "#;
    let extraction = extractor().extract(html, &id(), URL).unwrap();
    assert_eq!(extraction.strategy, "structured-sections");
    assert_eq!(extraction.record.id, "001");
    assert_eq!(extraction.record.title, "Example");
    assert_eq!(extraction.record.body, "[Intro]\nHello");
    assert_eq!(extraction.record.url, URL);
    assert!(extraction.record.categories.is_empty());
}

#[test]
fn template_text_is_kept_and_controls_are_dropped() {
    let html = r#"
    <html><head><title>Templates</title></head><body>
    <div class="box-bun"><h2>Template</h2><label>Your role</label><input type="text" value="ignored"><textarea>You are a helpful assistant.</textarea><script>var a = 1;</script><select><option>A</option></select></div>
    <div class="box-bun"><h2>Notes</h2></div>
    <div class="box-bun"><p>Plain paragraph</p></div>
    </body></html>
    "#;
    let extraction = extractor().extract(html, &id(), URL).unwrap();
    assert_eq!(
        extraction.record.body,
        "[Template]\nYour role\nYou are a helpful assistant.\n\n[Notes]\n\nPlain paragraph"
    );
}

#[test]
fn structured_output_wins_over_generic_container() {
    let html = r#"
    <html><head><title>Both</title></head><body>
    <div class="form-content">
      <p>Container only text that must not be used</p>
      <div class="box-bun"><h2>Step</h2><p>Do the thing</p></div>
    </div>
    </body></html>
    "#;
    let extraction = extractor().extract(html, &id(), URL).unwrap();
    assert_eq!(extraction.strategy, "structured-sections");
    assert_eq!(extraction.record.body, "[Step]\nDo the thing");
}

#[test]
fn generic_container_used_when_no_blocks() {
    let html = r#"
    <html><head><title>Generic</title></head><body>
    <nav>Menu</nav>
    <div class="form-content"><p>First line</p><textarea>hidden template</textarea><script>x()</script><p>Second <b>line</b></p></div>
    </body></html>
    "#;
    let extraction = extractor().extract(html, &id(), URL).unwrap();
    assert_eq!(extraction.strategy, "generic-container");
    assert_eq!(extraction.record.body, "First line\nSecond\nline");
}

#[test]
fn page_body_is_last_resort() {
    let html = r#"<html><head><title>Bare</title></head><body><p>Only body text here</p><script>ignored()</script></body></html>"#;
    let extraction = extractor().extract(html, &id(), URL).unwrap();
    assert_eq!(extraction.strategy, "page-body");
    assert_eq!(extraction.record.body, "Only body text here");
}

#[test]
fn title_falls_back_to_document_title_then_heading() {
    let html = r#"<html><head><title>Doc Title</title></head><body><p>enough body text</p></body></html>"#;
    assert_eq!(
        extractor().extract(html, &id(), URL).unwrap().record.title,
        "Doc Title"
    );

    let html = r#"<html><head><title>   </title></head><body><h1>Heading Title</h1><p>enough body text</p></body></html>"#;
    assert_eq!(
        extractor().extract(html, &id(), URL).unwrap().record.title,
        "Heading Title"
    );
}

#[test]
fn missing_title_is_a_failure() {
    let html = r#"<html><body><p>some text that is long enough</p></body></html>"#;
    assert_eq!(
        extractor().extract(html, &id(), URL).unwrap_err(),
        ExtractionFailure::MissingTitle
    );
}

#[test]
fn short_body_is_rejected() {
    let html = r#"<html><head><title>T</title></head><body><p>tiny</p></body></html>"#;
    assert_eq!(
        extractor().extract(html, &id(), URL).unwrap_err(),
        ExtractionFailure::BodyTooShort { chars: 4, min: 10 }
    );
}

#[test]
fn body_length_counts_characters_not_bytes() {
    // Ten Japanese characters are thirty bytes but exactly the minimum.
    let html = r#"<html><head><title>T</title></head><body><p>日本語のプロンプト集</p></body></html>"#;
    let extraction = extractor().extract(html, &id(), URL).unwrap();
    assert_eq!(extraction.record.body, "日本語のプロンプト集");
}

#[test]
fn empty_page_has_no_content() {
    let html = r#"<html><head><title>T</title></head><body><script>only()</script></body></html>"#;
    assert_eq!(
        extractor().extract(html, &id(), URL).unwrap_err(),
        ExtractionFailure::NoContent
    );
}

struct Never;

impl SectionStrategy for Never {
    fn name(&self) -> &'static str {
        "never"
    }

    fn try_extract(&self, _doc: &Html) -> Option<Vec<String>> {
        None
    }
}

struct Fixed;

impl SectionStrategy for Fixed {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn try_extract(&self, _doc: &Html) -> Option<Vec<String>> {
        Some(vec!["first section".into(), "second section".into()])
    }
}

#[test]
fn custom_chain_takes_first_strategy_that_yields() {
    let extractor = RecordExtractor::with_strategies(
        vec![Selector::parse("title").unwrap()],
        vec![Box::new(Never), Box::new(Fixed)],
        10,
    );
    assert_eq!(extractor.strategy_names(), vec!["never", "fixed"]);

    let extraction = extractor
        .extract("<title>Custom</title>", &id(), URL)
        .unwrap();
    assert_eq!(extraction.strategy, "fixed");
    assert_eq!(extraction.record.body, "first section\n\nsecond section");
}

#[test]
fn invalid_selector_is_reported() {
    let config = ExtractorConfig {
        section_selector: "div[".to_string(),
        ..ExtractorConfig::default()
    };
    let err = RecordExtractor::new(&config).err().unwrap();
    assert_eq!(err.selector, "div[");
}

#[test]
fn decode_ignores_declared_charset_and_strips_bom() {
    let utf8 = resolve_encoding("UTF-8").unwrap();
    let decoded = decode_forced("\u{feff}プロンプト".as_bytes(), utf8);
    assert_eq!(decoded.html, "プロンプト");
    assert_eq!(decoded.encoding_label, "UTF-8");
    assert!(!decoded.had_errors);

    let lossy = decode_forced(b"caf\xe9", utf8);
    assert_eq!(lossy.html, "caf\u{fffd}");
    assert!(lossy.had_errors);

    assert!(resolve_encoding("klingon").is_err());
}
