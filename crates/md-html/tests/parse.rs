//! Parsing tests for md-html
//!
//! Malformed input, attribute handling and fragment insertion.

use md_html::{parse_document as parse, parse_into, HtmlParser};

// ============================================================================
// DOCUMENTS
// ============================================================================

#[test]
fn test_parse_only_whitespace() {
    let doc = parse("   \t\n\r\n   ").unwrap();
    assert!(doc.is_alive(doc.body()));
    assert_eq!(doc.tree().children(doc.body()).count(), 0);
}

#[test]
fn test_parse_unclosed_tags() {
    let doc = parse("<div><p><span>text").unwrap();
    let span = doc.query_selector(doc.root(), "div > p > span").unwrap();
    assert!(span.is_some());
}

#[test]
fn test_attributes_preserved() {
    let doc = parse(
        r#"<button data-md-dialog="target: #confirm; closeOnEscape: false" class="btn primary">Go</button>"#,
    )
    .unwrap();
    let button = doc.query_selector(doc.body(), "button").unwrap().unwrap();
    assert_eq!(
        doc.get_attr(button, "data-md-dialog"),
        Some("target: #confirm; closeOnEscape: false")
    );
    assert!(doc.has_class(button, "primary"));
}

#[test]
fn test_single_html_head_body() {
    let doc = parse("<!DOCTYPE html><html><head></head><body><main></main></body></html>").unwrap();
    assert_eq!(doc.query_selector_all(doc.root(), "body").unwrap().len(), 1);
    assert_eq!(doc.query_selector_all(doc.root(), "head").unwrap().len(), 1);
}

// ============================================================================
// FRAGMENTS
// ============================================================================

#[test]
fn test_append_html_returns_top_level_nodes() {
    let mut doc = parse("<ul id='list'><li class='item'>a</li></ul>").unwrap();
    let list = doc.get_element_by_id("list").unwrap();

    let inserted = parse_into(&mut doc, list, "<li class='item'>b</li><li class='item'>c</li>").unwrap();
    assert_eq!(inserted.len(), 2);
    assert_eq!(doc.query_selector_all(list, ".item").unwrap().len(), 3);
    assert_eq!(doc.tree().text_content(inserted[1]), "c");
}

#[test]
fn test_fragment_into_dead_parent_fails() {
    let mut doc = parse("<div id='gone'></div>").unwrap();
    let gone = doc.get_element_by_id("gone").unwrap();
    doc.dispose(gone);
    assert!(HtmlParser::new().parse_fragment(&mut doc, gone, "<p></p>").is_err());
}
