//! Edge case tests for stencil-html
//!
//! Rejected input, malformed markup and unusual constructs.

use stencil_html::{HtmlParser, HtmlSerializer, ParseError, parse, parse_fragment_in};

fn roundtrip(html: &str) -> String {
    HtmlSerializer::new().serialize_document(&parse(html).unwrap())
}

// ============================================================================
// REJECTED INPUT
// ============================================================================

#[test]
fn test_empty_input_is_not_markup() {
    assert!(matches!(parse(""), Err(ParseError::NotMarkup { .. })));
    assert!(matches!(parse("   \n\t "), Err(ParseError::NotMarkup { .. })));
}

#[test]
fn test_plain_text_is_not_markup() {
    let err = parse("Hello World").unwrap_err();
    assert!(err.to_string().contains("Hello World"));
}

#[test]
fn test_doctype_only_builds_document() {
    // A bare doctype still yields the implied html/head/body
    let doc = parse("<!DOCTYPE html>").unwrap();
    assert!(doc.is_html5());
    assert!(doc.body().is_some());
}

#[test]
fn test_malformed_report_has_listing() {
    let err = HtmlParser::new()
        .parse_with_url("<!-- a -->\n<!-- b -->", "broken.html")
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("broken.html"));
    assert!(message.contains("   2: <!-- b -->"));
}

#[test]
fn test_missing_file() {
    let err = HtmlParser::new()
        .parse_file(std::path::Path::new("/nonexistent/stencil/x.html"))
        .unwrap_err();
    assert!(matches!(err, ParseError::Io { .. }));
    assert!(err.to_string().contains("/nonexistent/stencil/x.html"));
}

// ============================================================================
// MALFORMED HTML
// ============================================================================

#[test]
fn test_unclosed_tags_recovered() {
    let doc = parse("<div><p><span>text").unwrap();
    let out = HtmlSerializer::new().serialize_document(&doc);
    assert_eq!(out, "<div><p><span>text</span></p></div>");
}

#[test]
fn test_leading_whitespace_allowed() {
    let doc = parse("\n\n   <p>x</p>").unwrap();
    assert_eq!(doc.root_elements().len(), 1);
}

#[test]
fn test_xml_declaration_before_markup() {
    let doc = parse("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<p>x</p>").unwrap();
    let out = HtmlSerializer::new().serialize_document(&doc);
    assert_eq!(out, "<p>x</p>");
}

#[test]
fn test_uppercase_tags_lowercased() {
    let doc = parse("<DIV ID=\"a\"><P>x</P></DIV>").unwrap();
    let out = HtmlSerializer::new().serialize_document(&doc);
    assert_eq!(out, r#"<div id="a"><p>x</p></div>"#);
}

#[test]
fn test_conditional_comment_preserved() {
    let doc = parse("<p>a</p><!--[if IE]><p>ie</p><![endif]-->").unwrap();
    let out = HtmlSerializer::new().serialize_document(&doc);
    assert!(out.contains("<!--[if IE]>"));
}

#[test]
fn test_empty_attribute_value() {
    let doc = parse("<input disabled>").unwrap();
    let out = HtmlSerializer::new().serialize_document(&doc);
    assert_eq!(out, "<input disabled />");
}

#[test]
fn test_diagnostics_report_lines() {
    let err = parse("<!-- a -->\n\n</div>").unwrap_err();
    let ParseError::Malformed { diagnostics, .. } = &err else {
        panic!("expected Malformed, got {err:?}");
    };
    assert!(diagnostics.iter().any(|d| d.line == 3));
    assert!(err.to_string().contains("line 3: "));
}

// ============================================================================
// MARKUP ODDITIES
// ============================================================================

#[test]
fn test_noscript_roundtrip() {
    assert_eq!(
        roundtrip(r#"<div><noscript><img src="x.gif"></noscript></div>"#),
        r#"<div><noscript><img src="x.gif" /></noscript></div>"#
    );
}

#[test]
fn test_template_element_roundtrip() {
    let html = r#"<div><template id="t"><p>inside</p></template></div>"#;
    assert_eq!(roundtrip(html), html);
}

#[test]
fn test_textarea_roundtrip() {
    let html = r#"<textarea name="t">a &lt;b&gt; &amp; c</textarea>"#;
    assert_eq!(roundtrip(html), html);
}

#[test]
fn test_raw_text_elements_not_escaped() {
    assert_eq!(roundtrip("<div><xmp><b>bold</b></xmp></div>"), "<div><xmp><b>bold</b></xmp></div>");
    assert_eq!(
        roundtrip("<div><noembed><b>x</b></noembed></div>"),
        "<div><noembed><b>x</b></noembed></div>"
    );
}

#[test]
fn test_table_rows_in_tbody_context() {
    let doc = parse_fragment_in("<tr><td>A</td></tr><tr><td>B</td></tr>", "tbody");
    let out = HtmlSerializer::new().serialize_document(&doc);
    assert_eq!(out, "<tr><td>A</td></tr><tr><td>B</td></tr>");
}

#[test]
fn test_cells_in_row_context() {
    let doc = parse_fragment_in("<td>1</td><td>2</td>", "tr");
    assert_eq!(doc.root_elements().len(), 2);
}

#[test]
fn test_options_in_select_context() {
    let doc = parse_fragment_in(r#"<option value="a">A</option><option>B</option>"#, "select");
    let out = HtmlSerializer::new().serialize_document(&doc);
    assert_eq!(out, r#"<option value="a">A</option><option>B</option>"#);
}
